//! Declarative description of the shell's screen layout.
//!
//! [`ShellLayout`] is plain data (and part of the config file): which panes
//! exist, how they are arranged and what sits in the control strip. The
//! terminal binding asks it to [`resolve`](ShellLayout::resolve) an area into
//! rectangles and draws whatever it is given; nothing about the shell's state
//! machine depends on it.
//!
//! ```text
//! side-by-side                      stacked
//! ┌──────────────┬─────────┐        ┌────────────────────────┐
//! │ input        │ output  │        │ input                  │
//! │              │         │        ├────────────────────────┤
//! │              │         │        │ output                 │
//! ├──────────────┴─────────┤        ├────────────────────────┤
//! │ status      [▶] [◼]    │        │ status      [▶] [◼]    │
//! └────────────────────────┘        └────────────────────────┘
//! ```

use crate::error::ConfigError;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use serde::{Deserialize, Serialize};

const CONTROL_STRIP_HEIGHT: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    #[default]
    SideBySide,
    Stacked,
}

/// Panes the layout can contain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Input,
    Output,
    ControlStrip,
}

/// Items of the control strip, left to right
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlItem {
    StatusLabel,
    EvaluateButton,
    AbortButton,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShellLayout {
    pub orientation: Orientation,
    /// Share of the pane area given to the input surface (10..=90)
    pub input_percent: u16,
    pub show_output: bool,
    pub show_abort: bool,
}

impl Default for ShellLayout {
    fn default() -> Self {
        ShellLayout {
            orientation: Orientation::SideBySide,
            input_percent: 60,
            show_output: true,
            show_abort: true,
        }
    }
}

/// Screen rectangles for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedLayout {
    pub input: Rect,
    pub output: Option<Rect>,
    pub controls: Rect,
}

impl ShellLayout {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(10..=90).contains(&self.input_percent) {
            return Err(ConfigError::Invalid(format!(
                "layout.input_percent must be between 10 and 90, got {}",
                self.input_percent
            )));
        }
        Ok(())
    }

    pub fn surfaces(&self) -> Vec<Surface> {
        let mut surfaces = vec![Surface::Input];
        if self.show_output {
            surfaces.push(Surface::Output);
        }
        surfaces.push(Surface::ControlStrip);
        surfaces
    }

    pub fn control_items(&self) -> Vec<ControlItem> {
        let mut items = vec![ControlItem::StatusLabel, ControlItem::EvaluateButton];
        if self.show_abort {
            items.push(ControlItem::AbortButton);
        }
        items
    }

    pub fn resolve(&self, area: Rect) -> ResolvedLayout {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(CONTROL_STRIP_HEIGHT)])
            .split(area);

        let pane_area = rows[0];
        let controls = rows[1];

        if !self.show_output {
            return ResolvedLayout {
                input: pane_area,
                output: None,
                controls,
            };
        }

        let direction = match self.orientation {
            Orientation::SideBySide => Direction::Horizontal,
            Orientation::Stacked => Direction::Vertical,
        };
        let input_percent = self.input_percent.clamp(10, 90);
        let panes = Layout::default()
            .direction(direction)
            .constraints([
                Constraint::Percentage(input_percent),
                Constraint::Percentage(100 - input_percent),
            ])
            .split(pane_area);

        ResolvedLayout {
            input: panes[0],
            output: Some(panes[1]),
            controls,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_by_side() {
        let layout = ShellLayout::default();
        let resolved = layout.resolve(Rect::new(0, 0, 100, 21));

        assert_eq!(resolved.controls, Rect::new(0, 20, 100, 1));
        assert_eq!(resolved.input, Rect::new(0, 0, 60, 20));
        assert_eq!(resolved.output, Some(Rect::new(60, 0, 40, 20)));
    }

    #[test]
    fn test_stacked() {
        let layout = ShellLayout {
            orientation: Orientation::Stacked,
            input_percent: 50,
            ..ShellLayout::default()
        };
        let resolved = layout.resolve(Rect::new(0, 0, 80, 21));

        assert_eq!(resolved.input, Rect::new(0, 0, 80, 10));
        assert_eq!(resolved.output, Some(Rect::new(0, 10, 80, 10)));
    }

    #[test]
    fn test_without_output_input_takes_everything() {
        let layout = ShellLayout {
            show_output: false,
            ..ShellLayout::default()
        };
        let resolved = layout.resolve(Rect::new(0, 0, 50, 10));

        assert_eq!(resolved.input, Rect::new(0, 0, 50, 9));
        assert_eq!(resolved.output, None);
        assert_eq!(layout.surfaces(), vec![Surface::Input, Surface::ControlStrip]);
    }

    #[test]
    fn test_control_items_follow_abort_flag() {
        let mut layout = ShellLayout::default();
        assert_eq!(
            layout.control_items(),
            vec![
                ControlItem::StatusLabel,
                ControlItem::EvaluateButton,
                ControlItem::AbortButton
            ]
        );
        layout.show_abort = false;
        assert!(!layout.control_items().contains(&ControlItem::AbortButton));
    }

    #[test]
    fn test_validate_percent() {
        let mut layout = ShellLayout::default();
        assert!(layout.validate().is_ok());
        layout.input_percent = 95;
        assert!(layout.validate().is_err());
    }
}
