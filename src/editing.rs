//! Edit commands and labeled control points for editors

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::WarpError;
use crate::geometry::{Point, CORNER_LABELS};
use crate::warp::WarpPerspective;

/// An edit applied to a warp's control points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EditCommand {
    RotateCw,
    RotateCcw,
    FlipHorizontal,
    FlipVertical,
    /// Select a control point (or clear the selection)
    Select(Option<usize>),
    /// Move the selected point by a normalized delta
    Nudge { dx: f32, dy: f32 },
    Reset,
}

impl EditCommand {
    /// Map a function key name to its command
    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_uppercase().as_str() {
            "F9" => Some(EditCommand::RotateCcw),
            "F10" => Some(EditCommand::RotateCw),
            "F11" => Some(EditCommand::FlipHorizontal),
            "F12" => Some(EditCommand::FlipVertical),
            _ => None,
        }
    }
}

impl fmt::Display for EditCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditCommand::RotateCw => write!(f, "rotate-cw"),
            EditCommand::RotateCcw => write!(f, "rotate-ccw"),
            EditCommand::FlipHorizontal => write!(f, "flip-horizontal"),
            EditCommand::FlipVertical => write!(f, "flip-vertical"),
            EditCommand::Select(Some(i)) => write!(f, "select={}", i),
            EditCommand::Select(None) => write!(f, "select=none"),
            EditCommand::Nudge { dx, dy } => write!(f, "nudge={},{}", dx, dy),
            EditCommand::Reset => write!(f, "reset"),
        }
    }
}

impl FromStr for EditCommand {
    type Err = WarpError;

    /// Parse `rotate-cw`, `rotate-ccw`, `flip-horizontal`, `flip-vertical`,
    /// `reset`, `select=N`, `select=none` or `nudge=DX,DY`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || WarpError::UnknownCommand(s.to_string());

        let (name, arg) = match s.split_once('=') {
            Some((name, arg)) => (name.trim(), Some(arg.trim())),
            None => (s.trim(), None),
        };

        match (name, arg) {
            ("rotate-cw", None) => Ok(EditCommand::RotateCw),
            ("rotate-ccw", None) => Ok(EditCommand::RotateCcw),
            ("flip-horizontal", None) => Ok(EditCommand::FlipHorizontal),
            ("flip-vertical", None) => Ok(EditCommand::FlipVertical),
            ("reset", None) => Ok(EditCommand::Reset),
            ("select", Some("none")) => Ok(EditCommand::Select(None)),
            ("select", Some(index)) => index
                .parse()
                .map(|i| EditCommand::Select(Some(i)))
                .map_err(|_| unknown()),
            ("nudge", Some(delta)) => {
                let (dx, dy) = delta.split_once(',').ok_or_else(unknown)?;
                let dx = dx.trim().parse().map_err(|_| unknown())?;
                let dy = dy.trim().parse().map_err(|_| unknown())?;
                Ok(EditCommand::Nudge { dx, dy })
            }
            _ => Err(unknown()),
        }
    }
}

impl WarpPerspective {
    /// Apply an edit command
    pub fn apply(&mut self, command: EditCommand) {
        match command {
            EditCommand::RotateCw => self.rotate_cw(),
            EditCommand::RotateCcw => self.rotate_ccw(),
            EditCommand::FlipHorizontal => self.flip_horizontal(),
            EditCommand::FlipVertical => self.flip_vertical(),
            EditCommand::Select(index) => self.select(index),
            EditCommand::Nudge { dx, dy } => {
                if !self.nudge_selected(dx, dy) {
                    tracing::warn!("Ignoring nudge: no control point selected");
                }
            }
            EditCommand::Reset => self.reset(),
        }
    }

    /// Handle a function key press. Keys are ignored outside edit mode.
    /// Returns true if the key was handled.
    pub fn handle_key(&mut self, key: &str) -> bool {
        if !self.is_edit_mode() {
            return false;
        }

        match EditCommand::from_key(key) {
            Some(command) => {
                tracing::debug!("Key {} -> {}", key, command);
                self.apply(command);
                true
            }
            None => false,
        }
    }
}

/// A labeled control point for editors and JSON output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControlPointView {
    pub id: usize,
    pub label: String,
    /// Normalized position
    pub x: f32,
    pub y: f32,
    /// Position in window pixels
    pub pixel: Point,
    pub selected: bool,
}

/// Get all control points as labeled points
pub fn control_point_views(warp: &WarpPerspective) -> Vec<ControlPointView> {
    let destination = warp.destination();

    warp.control_points()
        .points()
        .iter()
        .enumerate()
        .map(|(id, p)| ControlPointView {
            id,
            label: CORNER_LABELS[id].to_string(),
            x: p.x,
            y: p.y,
            pixel: destination[id],
            selected: warp.selected() == Some(id),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Quad;

    #[test]
    fn test_parse_commands() {
        assert_eq!("rotate-cw".parse::<EditCommand>(), Ok(EditCommand::RotateCw));
        assert_eq!("rotate-ccw".parse::<EditCommand>(), Ok(EditCommand::RotateCcw));
        assert_eq!("flip-horizontal".parse::<EditCommand>(), Ok(EditCommand::FlipHorizontal));
        assert_eq!("flip-vertical".parse::<EditCommand>(), Ok(EditCommand::FlipVertical));
        assert_eq!("reset".parse::<EditCommand>(), Ok(EditCommand::Reset));
        assert_eq!("select=2".parse::<EditCommand>(), Ok(EditCommand::Select(Some(2))));
        assert_eq!("select=none".parse::<EditCommand>(), Ok(EditCommand::Select(None)));
        assert_eq!(
            "nudge=0.5,-0.25".parse::<EditCommand>(),
            Ok(EditCommand::Nudge { dx: 0.5, dy: -0.25 })
        );
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(
            "spin".parse::<EditCommand>(),
            Err(WarpError::UnknownCommand("spin".to_string()))
        );
        assert!("nudge=1".parse::<EditCommand>().is_err());
        assert!("select=x".parse::<EditCommand>().is_err());
        assert!("rotate-cw=1".parse::<EditCommand>().is_err());
    }

    #[test]
    fn test_display_parses_back() {
        for command in [
            EditCommand::RotateCw,
            EditCommand::FlipVertical,
            EditCommand::Select(Some(3)),
            EditCommand::Nudge { dx: 0.1, dy: 0.2 },
        ] {
            assert_eq!(command.to_string().parse::<EditCommand>(), Ok(command));
        }
    }

    #[test]
    fn test_function_keys() {
        assert_eq!(EditCommand::from_key("F9"), Some(EditCommand::RotateCcw));
        assert_eq!(EditCommand::from_key("f10"), Some(EditCommand::RotateCw));
        assert_eq!(EditCommand::from_key("F11"), Some(EditCommand::FlipHorizontal));
        assert_eq!(EditCommand::from_key("F12"), Some(EditCommand::FlipVertical));
        assert_eq!(EditCommand::from_key("F1"), None);
    }

    #[test]
    fn test_keys_require_edit_mode() {
        let mut warp = WarpPerspective::default();
        assert!(!warp.handle_key("F10"));
        assert_eq!(*warp.control_points(), Quad::unit());

        warp.set_edit_mode(true);
        assert!(warp.handle_key("F10"));
        assert_eq!(*warp.control_points(), Quad::unit().rotated_cw());
        assert!(!warp.handle_key("Escape"));
    }

    #[test]
    fn test_apply_sequence() {
        let mut warp = WarpPerspective::default();
        warp.apply(EditCommand::Select(Some(0)));
        warp.apply(EditCommand::Nudge { dx: 0.1, dy: 0.2 });
        assert_eq!(warp.control_points()[0], Point::new(0.1, 0.2));

        warp.apply(EditCommand::Reset);
        assert_eq!(*warp.control_points(), Quad::unit());
    }

    #[test]
    fn test_control_point_views() {
        let mut warp = WarpPerspective::new(640, 480);
        warp.select(Some(2));

        let views = control_point_views(&warp);
        assert_eq!(views.len(), 4);
        assert_eq!(views[0].label, "Top Left");
        assert_eq!(views[2].pixel, Point::new(640.0, 480.0));
        assert!(views[2].selected);
        assert!(!views[0].selected);
    }
}
