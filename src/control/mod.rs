//! Typed controls wrapped around hardware mixer controls
//!
//! A control never talks to the device.  It holds widget state, accepts
//! configuration pushed by the mixer, and reports user edits through its
//! [`Helper`].

pub mod channels;
pub mod config;
pub mod mute;
pub mod radio;
pub mod set;
pub mod widget;

pub use channels::Channels;
pub use config::{Config, Key, Value};
pub use mute::Mute;
pub use radio::Radio;
pub use set::Set;
pub use widget::Surface;

use crate::error::ConfigError;
use async_std::channel::Sender;
use std::{fmt, str::FromStr};
use tracing::warn;

/// Identity of a control within its mixer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlHandle(pub usize);

/// Capability handed to each control to report user edits
///
/// Holds only the control's handle and a sending half, the mixer keeps
/// sole ownership of the control itself.
#[derive(Clone, Debug)]
pub struct Helper {
    handle: ControlHandle,
    tx: Sender<ControlHandle>,
}

impl Helper {
    pub fn new(handle: ControlHandle, tx: Sender<ControlHandle>) -> Self {
        Self { handle, tx }
    }

    pub fn handle(&self) -> ControlHandle {
        self.handle
    }

    /// Queue a write of this control's state
    pub fn changed(&self) {
        if let Err(e) = self.tx.try_send(self.handle) {
            warn!("Dropping change of {:?}: {}", self.handle, e);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControlType {
    Channels,
    Mute,
    Radio,
    Set,
}

/// Every control kind, in registry order
pub const REGISTRY: [ControlType; 4] = [
    ControlType::Channels,
    ControlType::Mute,
    ControlType::Radio,
    ControlType::Set,
];

impl ControlType {
    /// Stable type tag
    pub fn as_str(self) -> &'static str {
        match self {
            ControlType::Channels => "channels",
            ControlType::Mute => "mute",
            ControlType::Radio => "radio",
            ControlType::Set => "set",
        }
    }

    /// Human readable kind name
    pub fn name(self) -> &'static str {
        match self {
            ControlType::Channels => "Channels",
            ControlType::Mute => "Mute button",
            ControlType::Radio => "Radio buttons",
            ControlType::Set => "Set of values",
        }
    }
}

impl fmt::Display for ControlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ControlType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        REGISTRY
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownType(s.to_string()))
    }
}

#[derive(Debug)]
pub enum Control {
    Channels(Channels),
    Mute(Mute),
    Radio(Radio),
    Set(Set),
}

impl Control {
    pub fn new(kind: ControlType, helper: Helper, config: &Config) -> Result<Self, ConfigError> {
        Ok(match kind {
            ControlType::Channels => Control::Channels(Channels::new(helper, config)?),
            ControlType::Mute => Control::Mute(Mute::new(helper, config)?),
            ControlType::Radio => Control::Radio(Radio::new(helper, config)?),
            ControlType::Set => Control::Set(Set::new(helper, config)?),
        })
    }

    pub fn kind(&self) -> ControlType {
        match self {
            Control::Channels(_) => ControlType::Channels,
            Control::Mute(_) => ControlType::Mute,
            Control::Radio(_) => ControlType::Radio,
            Control::Set(_) => ControlType::Set,
        }
    }

    /// Read back the named properties, in order
    pub fn get(&self, keys: &[Key]) -> Result<Vec<Value>, ConfigError> {
        keys.iter()
            .map(|key| match self {
                Control::Channels(c) => c.get(*key),
                Control::Mute(c) => c.get(*key),
                Control::Radio(c) => c.get(*key),
                Control::Set(c) => c.get(*key),
            })
            .collect()
    }

    /// Read back a single property
    pub fn get_one(&self, key: Key) -> Result<Value, ConfigError> {
        self.get(&[key]).map(|mut v| v.remove(0))
    }

    /// Apply configuration without notifying the mixer
    pub fn set(&mut self, config: &Config) -> Result<(), ConfigError> {
        match self {
            Control::Channels(c) => c.set(config),
            Control::Mute(c) => c.set(config),
            Control::Radio(c) => c.set(config),
            Control::Set(c) => c.set(config),
        }
    }

    pub fn surface(&self) -> Surface {
        match self {
            Control::Channels(c) => c.surface(),
            Control::Mute(c) => c.surface(),
            Control::Radio(c) => c.surface(),
            Control::Set(c) => c.surface(),
        }
    }
}

/// A control as the mixer lays it out: identity, icon and caption
#[derive(Debug)]
pub struct MixerControl {
    id: String,
    icon: &'static str,
    name: String,
    control: Control,
}

impl MixerControl {
    pub fn new(
        id: String,
        name: &str,
        kind: ControlType,
        helper: Helper,
        config: &Config,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            icon: icon_for(name),
            id,
            name: name.to_string(),
            control: Control::new(kind, helper, config)?,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn icon(&self) -> &'static str {
        self.icon
    }

    pub fn kind(&self) -> ControlType {
        self.control.kind()
    }

    pub fn control(&self) -> &Control {
        &self.control
    }

    pub fn control_mut(&mut self) -> &mut Control {
        &mut self.control
    }

    pub fn get(&self, keys: &[Key]) -> Result<Vec<Value>, ConfigError> {
        self.control.get(keys)
    }

    pub fn set(&mut self, config: &Config) -> Result<(), ConfigError> {
        self.control.set(config)
    }

    pub fn surface(&self) -> Surface {
        Surface::Frame {
            icon: self.icon.to_string(),
            label: self.name.clone(),
            child: Box::new(self.control.surface()),
        }
    }
}

const ICONS: [(&str, &str); 13] = [
    ("beep", "audio-volume-high"),
    ("cd", "media-cdrom"),
    ("dacsel", "audio-card"),
    ("input", "stock_mic"),
    ("line", "stock_volume"),
    ("master", "audio-volume-high"),
    ("mic", "audio-input-microphone"),
    ("monitor", "utilities-system-monitor"),
    ("output", "audio-volume-high"),
    ("pcm", "audio-volume-high"),
    ("rec", "gtk-media-record"),
    ("source", "stock_line_in"),
    ("vol", "audio-volume-high"),
];

/// Pick an icon name by label prefix
pub fn icon_for(label: &str) -> &'static str {
    let lower = label.to_ascii_lowercase();
    ICONS
        .iter()
        .find(|(prefix, _)| lower.starts_with(prefix))
        .map(|(_, icon)| *icon)
        .unwrap_or_else(|| {
            if lower.ends_with(".mute") {
                "audio-volume-muted"
            } else if lower.contains("sel") {
                "multimedia"
            } else {
                "audio-volume-high"
            }
        })
}
