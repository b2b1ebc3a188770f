//! Class-based NetBSD `audio(4)` mixer backend
//!
//! Controls are enumerated with `AUDIO_MIXER_DEVINFO` and carry a
//! hardware class, a label and one of three kinds (enum, set, value).
//! Class entries themselves show up in the same index range.

use super::{
    oss::c_string, ControlValue, Descriptor, DescriptorKind, EnumMember, Level, MutePolarity,
    Probe, Properties, SetMember, Transport, MAX_CHANNELS,
};
use crate::error::MixerError;
use nix::{errno::Errno, libc};
use std::{
    fs::{File, OpenOptions},
    mem,
    os::unix::io::AsRawFd,
    path::Path,
};
use tracing::{debug, info};

/// Well known hardware class names
pub mod class {
    pub const INPUTS: &str = "inputs";
    pub const OUTPUTS: &str = "outputs";
    pub const RECORD: &str = "record";
    pub const MONITOR: &str = "monitor";
    pub const EQUALIZATION: &str = "equalization";
    pub const MODEM: &str = "modem";
    pub const MIX: &str = "mix";
}

/// The driver's enum members for a mute switch are `off` (0) and `on` (1)
pub const MUTE_POLARITY: MutePolarity = MutePolarity {
    muted: 1,
    unmuted: 0,
};

pub const MAX_AUDIO_DEV_LEN: usize = 16;
const MAX_MEMBERS: usize = 32;

pub const AUDIO_MIXER_CLASS: libc::c_int = 0;
pub const AUDIO_MIXER_ENUM: libc::c_int = 1;
pub const AUDIO_MIXER_SET: libc::c_int = 2;
pub const AUDIO_MIXER_VALUE: libc::c_int = 3;

#[repr(C)]
#[derive(Clone, Copy)]
pub struct MixerName {
    pub name: [libc::c_char; MAX_AUDIO_DEV_LEN],
    pub msg_id: libc::c_int,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct EnumEntry {
    pub label: MixerName,
    pub ord: libc::c_int,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct AudioMixerEnum {
    pub num_mem: libc::c_int,
    pub member: [EnumEntry; MAX_MEMBERS],
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct SetEntry {
    pub label: MixerName,
    pub mask: libc::c_int,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct AudioMixerSet {
    pub num_mem: libc::c_int,
    pub member: [SetEntry; MAX_MEMBERS],
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct AudioMixerValue {
    pub units: MixerName,
    pub num_channels: libc::c_int,
    pub delta: libc::c_int,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub union DevinfoUnion {
    pub e: AudioMixerEnum,
    pub s: AudioMixerSet,
    pub v: AudioMixerValue,
}

/// `mixer_devinfo_t`
#[repr(C)]
#[derive(Clone, Copy)]
pub struct MixerDevinfo {
    pub index: libc::c_int,
    pub label: MixerName,
    pub type_: libc::c_int,
    pub mixer_class: libc::c_int,
    pub next: libc::c_int,
    pub prev: libc::c_int,
    pub un: DevinfoUnion,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct MixerLevel {
    pub num_channels: libc::c_int,
    pub level: [u8; MAX_CHANNELS],
}

#[repr(C)]
#[derive(Clone, Copy)]
pub union CtrlUnion {
    pub ord: libc::c_int,
    pub mask: libc::c_int,
    pub value: MixerLevel,
}

/// `mixer_ctrl_t`
#[repr(C)]
#[derive(Clone, Copy)]
pub struct MixerCtrl {
    pub dev: libc::c_int,
    pub type_: libc::c_int,
    pub un: CtrlUnion,
}

/// `audio_device_t`
#[repr(C)]
pub struct AudioDevice {
    pub name: [libc::c_char; MAX_AUDIO_DEV_LEN],
    pub version: [libc::c_char; MAX_AUDIO_DEV_LEN],
    pub config: [libc::c_char; MAX_AUDIO_DEV_LEN],
}

nix::ioctl_readwrite!(audio_mixer_read, b'M', 0, MixerCtrl);
nix::ioctl_readwrite!(audio_mixer_write, b'M', 1, MixerCtrl);
nix::ioctl_readwrite!(audio_mixer_devinfo, b'M', 2, MixerDevinfo);
nix::ioctl_read!(audio_getdev, b'A', 27, AudioDevice);

impl MixerDevinfo {
    pub fn zeroed(index: usize) -> Self {
        let mut md: Self = unsafe { mem::zeroed() };
        md.index = index as libc::c_int;
        md
    }

    /// Decode the raw record into a descriptor
    pub fn to_descriptor(&self) -> Descriptor {
        let kind = match self.type_ {
            AUDIO_MIXER_ENUM => {
                let e = unsafe { &self.un.e };
                let n = (e.num_mem.max(0) as usize).min(MAX_MEMBERS);
                DescriptorKind::Enum(
                    e.member[..n]
                        .iter()
                        .map(|m| EnumMember {
                            label: c_string(&m.label.name),
                            ord: m.ord as u32,
                        })
                        .collect(),
                )
            }
            AUDIO_MIXER_SET => {
                let s = unsafe { &self.un.s };
                let n = (s.num_mem.max(0) as usize).min(MAX_MEMBERS);
                DescriptorKind::Set(
                    s.member[..n]
                        .iter()
                        .map(|m| SetMember {
                            label: c_string(&m.label.name),
                            mask: m.mask as u32,
                        })
                        .collect(),
                )
            }
            AUDIO_MIXER_VALUE => {
                let v = unsafe { &self.un.v };
                DescriptorKind::Value {
                    channels: v.num_channels.max(0) as usize,
                    delta: v.delta.clamp(1, 255) as u8,
                }
            }
            _ => DescriptorKind::Class,
        };
        let label = c_string(&self.label.name);
        Descriptor {
            index: self.index as usize,
            class: self.mixer_class,
            name: label.clone(),
            label,
            kind,
        }
    }
}

impl MixerCtrl {
    /// Build the request for reading a control of the given type
    pub fn request(index: usize, type_: libc::c_int, channels: Option<usize>) -> Self {
        let mut p: Self = unsafe { mem::zeroed() };
        p.dev = index as libc::c_int;
        p.type_ = type_;
        if let Some(n) = channels {
            // some drivers refuse to answer without the channel count
            p.un.value.num_channels = n.min(MAX_CHANNELS) as libc::c_int;
        }
        p
    }

    pub fn from_value(index: usize, value: &ControlValue) -> Self {
        let mut p: Self = unsafe { mem::zeroed() };
        p.dev = index as libc::c_int;
        match value {
            ControlValue::Level(level) => {
                p.type_ = AUDIO_MIXER_VALUE;
                let n = level.channels.len().min(MAX_CHANNELS);
                let mut raw = MixerLevel {
                    num_channels: n as libc::c_int,
                    level: [0; MAX_CHANNELS],
                };
                raw.level[..n].copy_from_slice(&level.channels[..n]);
                p.un.value = raw;
            }
            ControlValue::Ord(ord) => {
                p.type_ = AUDIO_MIXER_ENUM;
                p.un.ord = *ord as libc::c_int;
            }
            ControlValue::Mask(mask) => {
                p.type_ = AUDIO_MIXER_SET;
                p.un.mask = *mask as libc::c_int;
            }
        }
        p
    }

    pub fn to_value(&self, index: usize, delta: u8) -> Result<ControlValue, MixerError> {
        match self.type_ {
            AUDIO_MIXER_ENUM => Ok(ControlValue::Ord(unsafe { self.un.ord } as u32)),
            AUDIO_MIXER_SET => Ok(ControlValue::Mask(unsafe { self.un.mask } as u32)),
            _ => {
                let raw = unsafe { self.un.value };
                let count = raw.num_channels.max(0) as usize;
                if count > MAX_CHANNELS {
                    return Err(MixerError::TooManyChannels { index, count });
                }
                Level::new(index, raw.level[..count].to_vec(), delta).map(ControlValue::Level)
            }
        }
    }
}

pub struct AudioMixer {
    file: File,
}

impl AudioMixer {
    fn devinfo(&self, index: usize) -> Result<MixerDevinfo, Errno> {
        let mut md = MixerDevinfo::zeroed(index);
        unsafe { audio_mixer_devinfo(self.file.as_raw_fd(), &mut md) }?;
        Ok(md)
    }
}

impl Transport for AudioMixer {
    fn open(path: &Path) -> Result<Self, MixerError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| MixerError::DeviceUnavailable {
                path: path.to_path_buf(),
                source,
            })?;
        info!("Opened audio mixer {}", path.display());
        Ok(Self { file })
    }

    fn probe(&self, index: usize) -> Result<Probe, MixerError> {
        self.devinfo(index)
            .map(|md| Probe::Control(md.to_descriptor()))
            .map_err(|source| MixerError::Enumerate {
                op: "AUDIO_MIXER_DEVINFO",
                source,
            })
    }

    fn read(&self, index: usize, channels: Option<usize>) -> Result<ControlValue, MixerError> {
        let md = self.devinfo(index).map_err(|source| MixerError::ReadFailed {
            op: "AUDIO_MIXER_DEVINFO",
            index,
            source,
        })?;
        let (channels, delta) = match md.to_descriptor().kind {
            DescriptorKind::Value { channels: n, delta } => (Some(channels.unwrap_or(n)), delta),
            _ => (None, 1),
        };
        let mut p = MixerCtrl::request(index, md.type_, channels);
        unsafe { audio_mixer_read(self.file.as_raw_fd(), &mut p) }.map_err(|source| {
            MixerError::ReadFailed {
                op: "AUDIO_MIXER_READ",
                index,
                source,
            }
        })?;
        let value = p.to_value(index, delta)?;
        debug!("{}={:?}", c_string(&md.label.name), value);
        Ok(value)
    }

    fn write(&mut self, index: usize, value: &ControlValue) -> Result<(), MixerError> {
        let mut p = MixerCtrl::from_value(index, value);
        debug!("control {} <- {:?}", index, value);
        unsafe { audio_mixer_write(self.file.as_raw_fd(), &mut p) }
            .map(drop)
            .map_err(|source| MixerError::WriteFailed {
                op: "AUDIO_MIXER_WRITE",
                index,
                source,
            })
    }

    fn properties(&self) -> Result<Properties, MixerError> {
        let mut ad: AudioDevice = unsafe { mem::zeroed() };
        unsafe { audio_getdev(self.file.as_raw_fd(), &mut ad) }.map_err(|source| {
            MixerError::Properties {
                op: "AUDIO_GETDEV",
                source,
            }
        })?;
        Ok(Properties {
            name: c_string(&ad.name),
            version: c_string(&ad.version),
            device: c_string(&ad.config),
        })
    }

    fn mute_polarity(&self) -> MutePolarity {
        MUTE_POLARITY
    }

    fn has_classes(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> MixerName {
        let mut n = MixerName {
            name: [0; MAX_AUDIO_DEV_LEN],
            msg_id: 0,
        };
        for (dst, src) in n.name.iter_mut().zip(s.bytes()) {
            *dst = src as libc::c_char;
        }
        n
    }

    #[test]
    fn muted_is_ordinal_one() {
        assert_eq!(MUTE_POLARITY.ordinal(true), 1);
        assert_eq!(MUTE_POLARITY.ordinal(false), 0);
        assert!(!MUTE_POLARITY.is_muted(0));
    }

    #[test]
    fn decodes_value_devinfo() {
        let mut md = MixerDevinfo::zeroed(4);
        md.label = name("master");
        md.type_ = AUDIO_MIXER_VALUE;
        md.mixer_class = 7;
        md.un.v = AudioMixerValue {
            units: name("volume"),
            num_channels: 2,
            delta: 8,
        };
        let d = md.to_descriptor();
        assert_eq!(d.index, 4);
        assert_eq!(d.class, 7);
        assert_eq!(d.label, "master");
        assert_eq!(
            d.kind,
            DescriptorKind::Value {
                channels: 2,
                delta: 8
            }
        );
    }

    #[test]
    fn decodes_enum_members() {
        let mut md = MixerDevinfo::zeroed(5);
        md.label = name("master.mute");
        md.type_ = AUDIO_MIXER_ENUM;
        let mut e: AudioMixerEnum = unsafe { mem::zeroed() };
        e.num_mem = 2;
        e.member[0] = EnumEntry {
            label: name("off"),
            ord: 0,
        };
        e.member[1] = EnumEntry {
            label: name("on"),
            ord: 1,
        };
        md.un.e = e;
        match md.to_descriptor().kind {
            DescriptorKind::Enum(members) => {
                assert_eq!(members.len(), 2);
                assert_eq!(members[1].label, "on");
                assert_eq!(members[1].ord, 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn class_entries_are_classes() {
        let mut md = MixerDevinfo::zeroed(0);
        md.label = name(class::OUTPUTS);
        md.type_ = AUDIO_MIXER_CLASS;
        assert!(md.to_descriptor().is_class());
    }

    #[test]
    fn ctrl_round_trips_levels() {
        let level = Level::new(2, vec![10, 20, 30], 4).unwrap();
        let p = MixerCtrl::from_value(2, &ControlValue::Level(level.clone()));
        assert_eq!(p.type_, AUDIO_MIXER_VALUE);
        assert_eq!(p.to_value(2, 4).unwrap(), ControlValue::Level(level));
    }

    #[test]
    fn read_request_carries_channel_count() {
        let p = MixerCtrl::request(3, AUDIO_MIXER_VALUE, Some(12));
        assert_eq!(p.dev, 3);
        assert_eq!(unsafe { p.un.value.num_channels }, MAX_CHANNELS as libc::c_int);
    }

    #[test]
    fn ctrl_rejects_oversized_channel_count() {
        let mut p = MixerCtrl::request(1, AUDIO_MIXER_VALUE, None);
        p.un.value.num_channels = 9;
        assert!(matches!(
            p.to_value(1, 1),
            Err(MixerError::TooManyChannels { index: 1, count: 9 })
        ));
    }
}
