//! Input surface rendering: gutter, margin mark, highlighting and cursor
//!
//! Each visible line is drawn as
//!
//! ```text
//!   12 ● x = 1 +
//!  ^^^^ ^ ^^^^^^^
//!  line  margin  content (highlighted, marked span underlaid, cursor reversed)
//! ```
//!
//! The margin shows `●` on the line carrying the shell's [`MarginMark`].

use crate::shell::MarginMark;
use crate::ui::cursor::Cursor;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// What the input pane needs to draw one frame
pub struct InputView<'a> {
    pub title: &'a str,
    pub text: &'a str,
    /// `None` when the pane is not focused
    pub cursor: Option<Cursor>,
    pub margin: Option<&'a MarginMark>,
}

/// Per-char styles for the calculator syntax
fn highlight_line(chars: &[char]) -> Vec<Style> {
    let mut styles = vec![Style::default().fg(DEFAULT_THEME.fg); chars.len()];
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        // Comment runs to end of line
        if c == '#' {
            for style in &mut styles[i..] {
                *style = Style::default().fg(DEFAULT_THEME.comment);
            }
            break;
        }

        if c.is_ascii_digit() {
            while i < chars.len() && chars[i].is_ascii_digit() {
                styles[i] = Style::default().fg(DEFAULT_THEME.number);
                i += 1;
            }
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            if chars.get(i) == Some(&'(') {
                for style in &mut styles[start..i] {
                    *style = Style::default().fg(DEFAULT_THEME.function);
                }
            }
            continue;
        }

        styles[i] = match c {
            '(' | ')' => Style::default().fg(DEFAULT_THEME.primary), // Brackets
            '+' | '-' | '*' | '/' | '%' | '=' => Style::default().fg(DEFAULT_THEME.secondary),
            _ => styles[i],
        };
        i += 1;
    }

    styles
}

/// Merge runs of equal style into spans
fn into_spans(chars: &[char], styles: &[Style]) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut run = String::new();
    let mut run_style = None;

    for (&ch, &style) in chars.iter().zip(styles) {
        if run_style != Some(style) {
            if let Some(prev) = run_style {
                spans.push(Span::styled(std::mem::take(&mut run), prev));
            }
            run_style = Some(style);
        }
        run.push(ch);
    }
    if let Some(style) = run_style {
        spans.push(Span::styled(run, style));
    }

    spans
}

/// Render the input surface. `scroll_offset` is adjusted to keep the cursor visible.
pub fn render_input_pane(
    frame: &mut Frame,
    area: Rect,
    view: &InputView,
    scroll_offset: &mut usize,
) {
    let is_focused = view.cursor.is_some();
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let block = Block::default()
        .title(format!(" {} ", view.title))
        .borders(Borders::ALL)
        .border_style(border_style);

    let lines: Vec<&str> = view.text.split('\n').collect();
    let visible_height = area.height.saturating_sub(2).max(1) as usize; // Account for borders

    if let Some(cursor) = view.cursor {
        if cursor.line < *scroll_offset {
            *scroll_offset = cursor.line;
        } else if cursor.line >= *scroll_offset + visible_height {
            *scroll_offset = cursor.line + 1 - visible_height;
        }
    }
    *scroll_offset = (*scroll_offset).min(lines.len().saturating_sub(1));

    let visible_lines: Vec<Line> = lines
        .iter()
        .enumerate()
        .skip(*scroll_offset)
        .take(visible_height)
        .map(|(idx, line)| {
            let line_num = idx + 1;
            let is_cursor_line = view.cursor.is_some_and(|c| c.line == idx);
            let mark = view.margin.filter(|m| m.line == line_num);

            let num_style = if mark.is_some() {
                Style::default()
                    .fg(DEFAULT_THEME.error)
                    .add_modifier(Modifier::BOLD)
            } else if is_cursor_line {
                Style::default()
                    .fg(DEFAULT_THEME.secondary)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(DEFAULT_THEME.comment)
            };
            let margin_span = match mark {
                Some(_) => Span::styled("● ", Style::default().fg(DEFAULT_THEME.error)),
                None => Span::raw("  "),
            };

            let mut chars: Vec<char> = line.chars().collect();
            let mut styles = highlight_line(&chars);

            // Room for a marker or cursor past the last char
            chars.push(' ');
            styles.push(Style::default());

            if is_cursor_line {
                for style in styles.iter_mut() {
                    *style = style.patch(Style::default().bg(DEFAULT_THEME.current_line_bg));
                }
            }

            if let Some(mark) = mark {
                let start = mark.column.min(chars.len() - 1);
                let end = (mark.column + mark.span.len().max(1)).min(chars.len());
                for style in &mut styles[start..end] {
                    *style = style
                        .bg(DEFAULT_THEME.error_mark_bg)
                        .add_modifier(Modifier::UNDERLINED);
                }
            }

            if let Some(cursor) = view.cursor.filter(|c| c.line == idx) {
                let col = cursor.column.min(chars.len() - 1);
                styles[col] = styles[col].add_modifier(Modifier::REVERSED);
            }

            let mut final_spans = vec![
                Span::styled(format!("{:4} ", line_num), num_style),
                margin_span,
            ];
            final_spans.extend(into_spans(&chars, &styles));
            Line::from(final_spans)
        })
        .collect();

    let paragraph = Paragraph::new(visible_lines).block(block);
    frame.render_widget(paragraph, area);
}
