//! Control strip: status label, evaluate/abort buttons and key hints

use crate::layout::ControlItem;
use crate::shell::{Controls, ShellState};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Render the control strip at the bottom.
///
/// `items` decides which controls exist; `controls` decides which of them
/// are interactable.
pub fn render_control_strip(
    frame: &mut Frame,
    area: Rect,
    items: &[ControlItem],
    state: ShellState,
    controls: Controls,
    status: &str,
) {
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let strip_style = Style::default().bg(DEFAULT_THEME.current_line_bg);
    let sep_style = strip_style.fg(DEFAULT_THEME.comment);

    // Left side: state badge and status label
    let badge_bg = match state {
        ShellState::Idle => DEFAULT_THEME.primary,
        ShellState::Evaluating => DEFAULT_THEME.secondary,
        ShellState::Aborting => DEFAULT_THEME.error,
    };
    let mut left_spans = vec![Span::styled(
        format!(" {} ", state.to_string().to_uppercase()),
        Style::default()
            .bg(badge_bg)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
    )];
    if items.contains(&ControlItem::StatusLabel) {
        left_spans.push(Span::styled(" | ", sep_style));
        left_spans.push(Span::styled(
            format!(" {} ", status),
            strip_style.fg(DEFAULT_THEME.fg),
        ));
    }

    let left_paragraph = Paragraph::new(Line::from(left_spans))
        .style(strip_style)
        .alignment(Alignment::Left);
    frame.render_widget(left_paragraph, layout[0]);

    // Right side: buttons, then key hints
    let key_style = Style::default().bg(DEFAULT_THEME.comment).fg(Color::Black);
    let desc_style = strip_style.fg(DEFAULT_THEME.fg);

    let mut right_spans = Vec::new();
    for item in items {
        match item {
            ControlItem::StatusLabel => {}
            ControlItem::EvaluateButton => {
                right_spans.push(button(
                    " ▶ Evaluate ",
                    controls.evaluate_enabled,
                    DEFAULT_THEME.success,
                ));
                right_spans.push(Span::styled(" ", desc_style));
            }
            ControlItem::AbortButton => {
                let enabled = controls.abort_enabled.unwrap_or(false);
                right_spans.push(button(" ◼ Abort ", enabled, DEFAULT_THEME.error));
                right_spans.push(Span::styled(" ", desc_style));
            }
        }
    }

    let hints = [
        Span::styled("│", sep_style),
        Span::styled(" F5 ", key_style),
        Span::styled(" eval ", desc_style),
        Span::styled(" Esc ", key_style),
        Span::styled(" abort ", desc_style),
        Span::styled(" ^S ", key_style),
        Span::styled(" save ", desc_style),
        Span::styled(" ^Q ", key_style),
        Span::styled(" quit ", desc_style),
    ];

    // Buttons win over hints on narrow terminals
    let buttons_width: usize = right_spans.iter().map(Span::width).sum();
    let hints_width: usize = hints.iter().map(Span::width).sum();
    if buttons_width + hints_width <= layout[1].width as usize {
        right_spans.extend(hints);
    }

    let right_paragraph = Paragraph::new(Line::from(right_spans))
        .style(strip_style)
        .alignment(Alignment::Right);
    frame.render_widget(right_paragraph, layout[1]);
}

fn button(label: &'static str, enabled: bool, color: Color) -> Span<'static> {
    let style = if enabled {
        Style::default()
            .bg(color)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
            .bg(DEFAULT_THEME.current_line_bg)
            .fg(DEFAULT_THEME.comment)
            .add_modifier(Modifier::DIM)
    };
    Span::styled(label, style)
}
