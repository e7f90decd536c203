// evalpad: terminal editor shell for interactive evaluation

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use evalpad::config::Config;
use evalpad::document::Document;
use evalpad::eval::{BackgroundEvaluator, Calculator};
use evalpad::layout::Orientation;
use evalpad::logging::{self, LogLevel};
use evalpad::shell::{EditorShell, ShellOptions};
use evalpad::ui::App;

/// Edit and evaluate calculator scripts in the terminal
#[derive(Parser, Debug)]
#[command(name = "evalpad", version, about, long_about = None)]
struct Args {
    /// File to open (created on first save if it does not exist)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Config file (defaults to ~/.config/evalpad/config.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Append logs to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,

    /// Re-evaluate on every edit
    #[arg(long)]
    auto_evaluate: bool,

    /// Put the output pane below the input instead of beside it
    #[arg(long)]
    stacked: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref()).context("Failed to load config")?;
    if args.log_file.is_some() {
        config.log_file = args.log_file;
    }
    if let Some(level) = args.log_level {
        config.log_level = level;
    }
    if args.auto_evaluate {
        config.auto_evaluate = true;
    }
    if args.stacked {
        config.layout.orientation = Orientation::Stacked;
    }

    logging::init(config.log_file.as_deref(), config.log_level)
        .context("Failed to open log file")?;

    let document = match &args.file {
        Some(path) if path.exists() => Document::open(path)?,
        _ => Document::new(),
    };
    tracing::info!(name = document.name(), "starting evalpad");

    let (evaluator, events) = BackgroundEvaluator::new(Calculator::new());
    let options = ShellOptions {
        has_abort: config.layout.show_abort,
        auto_evaluate: config.auto_evaluate,
    };
    let mut shell = EditorShell::new(document, evaluator, options);
    // A file opened with auto-evaluate on is evaluated right away
    shell.request_auto_evaluation();
    let mut app = App::new(shell, events, &config).with_save_target(args.file.clone());

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "terminal loop failed");
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}
