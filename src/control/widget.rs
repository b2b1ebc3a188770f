//! Headless widget models
//!
//! Each model keeps the state a toolkit widget would hold and reports
//! whether a change happened, which is when a toolkit would emit its
//! "changed" signal.  [`Surface`] is the read-only snapshot handed to
//! whatever draws the mixer.

use crate::device::{display_to_wire, wire_to_display, DISPLAY_MAX};
use std::fmt;

/// A vertical level slider on the 0-100 display scale
///
/// The exact wire level is remembered next to the displayed one so a
/// value pushed by the device is written back unchanged.
#[derive(Clone, Debug, PartialEq)]
pub struct Slider {
    display: u8,
    wire: u8,
    step: u8,
}

impl Slider {
    pub fn new(step: u8) -> Self {
        Self {
            display: 0,
            wire: 0,
            step: step.max(1),
        }
    }

    pub fn display(&self) -> u8 {
        self.display
    }

    pub fn wire(&self) -> u8 {
        self.wire
    }

    pub fn step(&self) -> u8 {
        self.step
    }

    pub fn set_step(&mut self, step: u8) {
        self.step = step.max(1);
    }

    /// Move the knob, as a user drag does
    pub fn set_display(&mut self, display: u8) -> bool {
        let display = display.min(DISPLAY_MAX);
        let changed = display != self.display;
        self.display = display;
        self.wire = display_to_wire(display);
        changed
    }

    /// Load a device level
    pub fn set_wire(&mut self, wire: u8) -> bool {
        let display = wire_to_display(wire);
        let changed = display != self.display;
        self.display = display;
        self.wire = wire;
        changed
    }

    /// Copy another slider's position
    pub fn mirror(&mut self, other: &Slider) -> bool {
        let changed = other.display != self.display;
        self.display = other.display;
        self.wire = other.wire;
        changed
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Toggle {
    active: bool,
    visible: bool,
}

impl Toggle {
    pub fn new(visible: bool) -> Self {
        Self {
            active: false,
            visible,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn set_active(&mut self, active: bool) -> bool {
        let changed = active != self.active;
        self.active = active;
        changed
    }
}

/// Snapshot of what a control shows
#[derive(Clone, Debug, PartialEq)]
pub enum Surface {
    /// Labelled frame around a control
    Frame {
        icon: String,
        label: String,
        child: Box<Surface>,
    },
    Row(Vec<Surface>),
    Column(Vec<Surface>),
    Slider { value: u8, step: u8 },
    Toggle { label: &'static str, active: bool },
    Switch { active: bool },
    Radio { label: String, active: bool },
    Check { label: String, active: bool },
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, items: &[Surface], sep: &str) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(sep)?;
                }
                write!(f, "{}", item)?;
            }
            Ok(())
        }
        let mark = |b: bool| if b { "x" } else { " " };

        match self {
            Surface::Frame { label, child, .. } => write!(f, "{}: {}", label, child),
            Surface::Row(items) => join(f, items, "|"),
            Surface::Column(items) => join(f, items, " "),
            Surface::Slider { value, .. } => write!(f, "{:>3}%", value),
            Surface::Toggle { label, active } => write!(f, "[{}] {}", mark(*active), label),
            Surface::Switch { active } => write!(f, "({})", if *active { "muted" } else { "on" }),
            Surface::Radio { label, active } => write!(f, "({}) {}", mark(*active), label),
            Surface::Check { label, active } => write!(f, "[{}] {}", mark(*active), label),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slider_keeps_exact_wire_level() {
        let mut s = Slider::new(1);
        assert!(s.set_wire(151));
        assert_eq!(s.display(), 60);
        assert_eq!(s.wire(), 151);
        // same display, no change signal
        assert!(!s.set_wire(152));
        assert_eq!(s.wire(), 152);
    }

    #[test]
    fn slider_drag_converts_to_wire() {
        let mut s = Slider::new(0);
        assert_eq!(s.step(), 1);
        assert!(s.set_display(59));
        assert_eq!(s.wire(), 150);
        assert!(!s.set_display(59));
        s.set_display(250);
        assert_eq!(s.display(), DISPLAY_MAX);
    }

    #[test]
    fn toggle_reports_changes_only() {
        let mut t = Toggle::new(true);
        assert!(!t.set_active(false));
        assert!(t.set_active(true));
        assert!(t.is_active());
    }

    #[test]
    fn surface_renders_compactly() {
        let s = Surface::Frame {
            icon: "stock_volume".into(),
            label: "master".into(),
            child: Box::new(Surface::Column(vec![
                Surface::Row(vec![
                    Surface::Slider { value: 59, step: 1 },
                    Surface::Slider { value: 79, step: 1 },
                ]),
                Surface::Toggle {
                    label: "Bind",
                    active: false,
                },
            ])),
        };
        assert_eq!(s.to_string(), "master:  59%| 79% [ ] Bind");
    }
}
