//! Main TUI application state and event loop

use crate::config::Config;
use crate::eval::{EvaluationEvent, Evaluator};
use crate::layout::ShellLayout;
use crate::shell::{Delivery, EditorShell};
use crate::ui::cursor::Cursor;
use crate::ui::panes::{self, InputView};
use crossbeam::channel::Receiver;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{backend::Backend, Frame, Terminal};
use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Which pane receives navigation keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Input,
    Output,
}

impl FocusedPane {
    pub fn next(self, has_output: bool) -> Self {
        match self {
            FocusedPane::Input if has_output => FocusedPane::Output,
            _ => FocusedPane::Input,
        }
    }
}

/// The main application state
pub struct App<V: Evaluator> {
    pub shell: EditorShell<V>,

    /// Evaluation callbacks, drained on this (the UI) thread
    events: Receiver<EvaluationEvent>,

    pub layout: ShellLayout,
    tick_rate: Duration,

    /// Where Ctrl-S writes an untitled document
    save_target: Option<PathBuf>,

    pub cursor: Cursor,
    pub focused_pane: FocusedPane,
    pub input_scroll: usize,
    pub output_scroll: usize,

    /// Whether the app should quit
    pub should_quit: bool,

    /// Set by a first Ctrl-Q on a dirty document
    quit_armed: bool,
}

impl<V: Evaluator> App<V> {
    pub fn new(shell: EditorShell<V>, events: Receiver<EvaluationEvent>, config: &Config) -> Self {
        App {
            shell,
            events,
            layout: config.layout.clone(),
            tick_rate: config.tick_rate(),
            save_target: None,
            cursor: Cursor::default(),
            focused_pane: FocusedPane::Input,
            input_scroll: 0,
            output_scroll: 0,
            should_quit: false,
            quit_armed: false,
        }
    }

    /// Path used when saving a document that has none yet
    pub fn with_save_target(mut self, path: Option<PathBuf>) -> Self {
        self.save_target = path;
        self
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            self.drain_evaluation_events();
            terminal.draw(|f| self.draw(f))?;

            if self.should_quit {
                break;
            }

            if event::poll(self.tick_rate)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    /// Apply every pending evaluation callback. Returns how many changed the shell.
    pub fn drain_evaluation_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events.try_recv() {
            if self.shell.handle_event(event) == Delivery::Applied {
                applied += 1;
                self.output_scroll = 0;
            }
        }
        applied
    }

    /// Render the UI
    pub fn draw(&mut self, frame: &mut Frame) {
        let resolved = self.layout.resolve(frame.area());

        let document = self.shell.document();
        let title = format!(
            "{}{}",
            document.name(),
            if document.is_dirty() { "*" } else { "" }
        );
        let view = InputView {
            title: &title,
            text: document.text(),
            cursor: (self.focused_pane == FocusedPane::Input).then_some(self.cursor),
            margin: self.shell.margin_mark(),
        };
        panes::render_input_pane(frame, resolved.input, &view, &mut self.input_scroll);

        if let Some(output_area) = resolved.output {
            panes::render_output_pane(
                frame,
                output_area,
                self.shell.output(),
                self.focused_pane == FocusedPane::Output,
                &mut self.output_scroll,
            );
        }

        panes::render_control_strip(
            frame,
            resolved.controls,
            &self.layout.control_items(),
            self.shell.state(),
            self.shell.controls(),
            self.shell.status(),
        );
    }

    /// Handle keyboard events
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        if !(ctrl && matches!(key.code, KeyCode::Char('q'))) {
            self.quit_armed = false;
        }

        match key.code {
            KeyCode::Char('q') if ctrl => self.quit(),
            KeyCode::Char('s') if ctrl => self.save(),
            KeyCode::Char('r') if ctrl => self.evaluate(),
            KeyCode::F(5) => self.evaluate(),
            KeyCode::Char('c') if ctrl => self.abort(),
            KeyCode::Esc => self.abort(),
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next(self.layout.show_output);
            }
            _ => match self.focused_pane {
                FocusedPane::Input => self.edit(key),
                FocusedPane::Output => self.scroll_output(key.code),
            },
        }
    }

    fn evaluate(&mut self) {
        if let Err(err) = self.shell.submit_for_evaluation() {
            tracing::debug!(error = %err, "evaluate rejected");
            self.report_rejection(format!("Cannot evaluate: {}", err));
        }
    }

    fn abort(&mut self) {
        if let Err(err) = self.shell.request_abort() {
            tracing::debug!(error = %err, "abort rejected");
            self.report_rejection(format!("Cannot abort: {}", err));
        }
    }

    /// The in-progress label stays until the outstanding evaluation ends
    fn report_rejection(&mut self, message: String) {
        if !self.shell.state().is_busy() {
            self.shell.set_status(message);
        }
    }

    fn save(&mut self) {
        let target = match self.shell.document().path() {
            Some(_) => None,
            None => self.save_target.clone(),
        };
        match self.shell.save_document(target.as_deref()) {
            Ok(path) => self.shell.set_status(format!("Saved {}", path.display())),
            Err(err) => {
                tracing::warn!(error = %err, "save failed");
                self.shell.set_status(format!("Save failed: {}", err));
            }
        }
    }

    fn quit(&mut self) {
        if self.shell.document().is_dirty() && !self.quit_armed {
            self.quit_armed = true;
            self.shell
                .set_status("Unsaved changes; press Ctrl-Q again to quit");
            return;
        }
        // Cancels any outstanding evaluation
        self.shell.close();
        self.should_quit = true;
    }

    fn edit(&mut self, key: KeyEvent) {
        let text = self.shell.document().text();
        let edited = match key.code {
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(self.cursor.insert(text, c))
            }
            KeyCode::Enter => Some(self.cursor.insert(text, '\n')),
            KeyCode::Backspace => self.cursor.backspace(text),
            KeyCode::Delete => self.cursor.delete(text),
            KeyCode::Left => {
                self.cursor.move_left(text);
                None
            }
            KeyCode::Right => {
                self.cursor.move_right(text);
                None
            }
            KeyCode::Up => {
                self.cursor.move_up(text);
                None
            }
            KeyCode::Down => {
                self.cursor.move_down(text);
                None
            }
            KeyCode::Home => {
                self.cursor.move_home();
                None
            }
            KeyCode::End => {
                self.cursor.move_end(text);
                None
            }
            _ => None,
        };

        if let Some(new_text) = edited {
            self.shell.on_document_changed(new_text);
        }
    }

    fn scroll_output(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up => self.output_scroll = self.output_scroll.saturating_sub(1),
            KeyCode::Down => self.output_scroll = self.output_scroll.saturating_add(1),
            KeyCode::PageUp => self.output_scroll = self.output_scroll.saturating_sub(10),
            KeyCode::PageDown => self.output_scroll = self.output_scroll.saturating_add(10),
            KeyCode::Home => self.output_scroll = 0,
            _ => {}
        }
    }
}
