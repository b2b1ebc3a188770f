//! Device transport for the operating system mixer
//!
//! Two backends exist and are chosen when the crate is built: the
//! class-based NetBSD `audio(4)` interface and the flat OSS
//! `/dev/mixer` interface.  Both hand the orchestrator the same
//! [`Descriptor`] and [`ControlValue`] types, with levels on the
//! 0-255 wire scale.

pub mod netbsd;
pub mod oss;

use crate::error::MixerError;
use std::path::Path;

#[cfg(target_os = "netbsd")]
pub use netbsd::AudioMixer as PlatformTransport;
#[cfg(not(target_os = "netbsd"))]
pub use oss::OssMixer as PlatformTransport;

/// Default mixer device node
pub const DEFAULT_DEVICE: &str = "/dev/mixer";

/// Most channels a single Value control can carry
pub const MAX_CHANNELS: usize = 8;

/// Highest level on the wire scale
pub const WIRE_MAX: u8 = 255;

/// Highest level on the display scale
pub const DISPLAY_MAX: u8 = 100;

/// Convert a 0-255 wire level to the 0-100 display scale
///
/// Rounds up, so a non-zero hardware level never shows as zero.
pub fn wire_to_display(wire: u8) -> u8 {
    ((wire as u32 * DISPLAY_MAX as u32 + WIRE_MAX as u32 - 1) / WIRE_MAX as u32) as u8
}

/// Convert a 0-100 display level back to the 0-255 wire scale
pub fn display_to_wire(display: u8) -> u8 {
    let display = display.min(DISPLAY_MAX) as u32;
    (display * WIRE_MAX as u32 / DISPLAY_MAX as u32) as u8
}

/// Hardware class identifier, as reported by the device
pub type ClassId = i32;

/// One member of an Enum control
#[derive(Clone, Debug, PartialEq)]
pub struct EnumMember {
    pub label: String,
    pub ord: u32,
}

/// One member of a Set control
#[derive(Clone, Debug, PartialEq)]
pub struct SetMember {
    pub label: String,
    pub mask: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DescriptorKind {
    /// A grouping of other controls, never bound to a control itself
    Class,
    Enum(Vec<EnumMember>),
    Set(Vec<SetMember>),
    Value { channels: usize, delta: u8 },
}

/// Identifies one physical mixer control
#[derive(Clone, Debug, PartialEq)]
pub struct Descriptor {
    pub index: usize,
    pub class: ClassId,
    /// Short identifier, unique within the class
    pub name: String,
    pub label: String,
    pub kind: DescriptorKind,
}

impl Descriptor {
    pub fn is_class(&self) -> bool {
        self.kind == DescriptorKind::Class
    }
}

/// Per-channel levels of a Value control
#[derive(Clone, Debug, PartialEq)]
pub struct Level {
    pub channels: Vec<u8>,
    pub delta: u8,
}

impl Level {
    pub fn new(index: usize, channels: Vec<u8>, delta: u8) -> Result<Self, MixerError> {
        if channels.len() > MAX_CHANNELS {
            return Err(MixerError::TooManyChannels {
                index,
                count: channels.len(),
            });
        }
        Ok(Self {
            channels,
            delta: delta.max(1),
        })
    }

    /// Whether every channel currently sits at the same level
    pub fn is_uniform(&self) -> bool {
        self.channels.windows(2).all(|w| w[0] == w[1])
    }
}

/// Snapshot of a control's state, read fresh for every operation
#[derive(Clone, Debug, PartialEq)]
pub enum ControlValue {
    Level(Level),
    Ord(u32),
    Mask(u32),
}

/// Which device ordinal means "muted"
///
/// This is driver semantics and differs between the backends, so each
/// backend exports its own constant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MutePolarity {
    pub muted: u32,
    pub unmuted: u32,
}

impl MutePolarity {
    pub fn ordinal(self, muted: bool) -> u32 {
        if muted {
            self.muted
        } else {
            self.unmuted
        }
    }

    pub fn is_muted(self, ord: u32) -> bool {
        ord == self.muted
    }
}

/// Identification strings reported by the device
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Properties {
    pub name: String,
    pub version: String,
    pub device: String,
}

/// Result of probing one ordinal index
#[derive(Debug)]
pub enum Probe {
    Control(Descriptor),
    /// Nothing lives at this index, keep going
    Vacant,
    /// Past the last index
    End,
}

/// Thin wrapper around an opened mixer device
pub trait Transport {
    /// Open the device node read-write
    fn open(path: &Path) -> Result<Self, MixerError>
    where
        Self: Sized;

    /// Describe the control at `index`
    fn probe(&self, index: usize) -> Result<Probe, MixerError>;

    /// Read the current state of a control
    ///
    /// `channels` is the channel count from the descriptor, some drivers
    /// need it filled in before they will answer.
    fn read(&self, index: usize, channels: Option<usize>) -> Result<ControlValue, MixerError>;

    /// Replace the whole state of a control
    fn write(&mut self, index: usize, value: &ControlValue) -> Result<(), MixerError>;

    fn properties(&self) -> Result<Properties, MixerError>;

    fn mute_polarity(&self) -> MutePolarity;

    /// Whether the backend exposes hardware classes
    fn has_classes(&self) -> bool;

    /// Hardware class of the control at `index`, flat backends have none
    fn class_of(&self, index: usize) -> Result<Option<ClassId>, MixerError> {
        if !self.has_classes() {
            return Ok(None);
        }
        match self.probe(index)? {
            Probe::Control(d) => Ok(Some(d.class)),
            Probe::Vacant | Probe::End => Ok(None),
        }
    }

    /// Enumerate every control on the device
    fn descriptors(&self) -> Descriptors<'_, Self>
    where
        Self: Sized,
    {
        Descriptors {
            transport: self,
            index: 0,
            done: false,
        }
    }
}

/// Lazy enumeration of the device's controls
///
/// A failed probe on index 0 is reported as an error, any later
/// failure marks the end of the range.
pub struct Descriptors<'t, T> {
    transport: &'t T,
    index: usize,
    done: bool,
}

impl<'t, T: Transport> Iterator for Descriptors<'t, T> {
    type Item = Result<Descriptor, MixerError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let index = self.index;
            self.index += 1;
            match self.transport.probe(index) {
                Ok(Probe::Control(d)) => return Some(Ok(d)),
                Ok(Probe::Vacant) => continue,
                Ok(Probe::End) => self.done = true,
                Err(e) => {
                    self.done = true;
                    if index == 0 {
                        return Some(Err(e));
                    }
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_scale_rounds_up() {
        assert_eq!(wire_to_display(0), 0);
        assert_eq!(wire_to_display(1), 1);
        assert_eq!(wire_to_display(150), 59);
        assert_eq!(wire_to_display(200), 79);
        assert_eq!(wire_to_display(255), 100);
    }

    #[test]
    fn wire_round_trip_is_within_tolerance() {
        for v in 0..=255u8 {
            let d = wire_to_display(v);
            assert!(d <= DISPLAY_MAX);
            assert_eq!(d == 0, v == 0, "level {} displayed as {}", v, d);
            let back = display_to_wire(d);
            assert!(back >= v && back - v <= 2, "{} -> {} -> {}", v, d, back);
        }
    }

    #[test]
    fn display_round_trip_is_exact() {
        for d in 0..=DISPLAY_MAX {
            assert_eq!(wire_to_display(display_to_wire(d)), d);
        }
    }

    #[test]
    fn level_rejects_too_many_channels() {
        assert!(Level::new(3, vec![0; MAX_CHANNELS], 1).is_ok());
        match Level::new(3, vec![0; MAX_CHANNELS + 1], 1) {
            Err(MixerError::TooManyChannels { index: 3, count: 9 }) => (),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn level_delta_is_at_least_one() {
        let level = Level::new(0, vec![10, 10], 0).unwrap();
        assert_eq!(level.delta, 1);
        assert!(level.is_uniform());
    }

    #[test]
    fn polarity_maps_both_ways() {
        let p = MutePolarity {
            muted: 1,
            unmuted: 0,
        };
        assert_eq!(p.ordinal(true), 1);
        assert!(p.is_muted(1));
        assert!(!p.is_muted(0));
    }
}
