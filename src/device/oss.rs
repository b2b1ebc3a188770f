//! Flat OSS mixer backend
//!
//! Every control is a stereo level packed into one `int`: the low byte
//! holds the left channel, the next byte the right one, both as
//! percentages.  There are no classes, enums or sets.

use super::{
    display_to_wire, wire_to_display, ControlValue, Descriptor, DescriptorKind, Level,
    MutePolarity, Probe, Properties, Transport,
};
use crate::error::MixerError;
use nix::{errno::Errno, libc};
use std::{
    fs::{File, OpenOptions},
    mem,
    os::unix::io::AsRawFd,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// `SOUND_MIXER_NRDEVICES`
pub const NRDEVICES: usize = 25;

/// Short control names, used as identifiers
pub const NAMES: [&str; NRDEVICES] = [
    "vol", "bass", "treble", "synth", "pcm", "speaker", "line", "mic", "cd", "mix", "pcm2", "rec",
    "igain", "ogain", "line1", "line2", "line3", "dig1", "dig2", "dig3", "phin", "phout", "video",
    "radio", "monitor",
];

/// Human readable control labels
pub const LABELS: [&str; NRDEVICES] = [
    "Vol", "Bass", "Trebl", "Synth", "Pcm", "Spkr", "Line", "Mic", "CD", "Mix", "Pcm2", "Rec",
    "IGain", "OGain", "Line1", "Line2", "Line3", "Digital1", "Digital2", "Digital3", "PhoneIn",
    "PhoneOut", "Video", "Radio", "Monitor",
];

/// The flat driver reads 0 as the muted state
pub const MUTE_POLARITY: MutePolarity = MutePolarity {
    muted: 0,
    unmuted: 1,
};

/// Step between two adjacent percentages on the wire scale
pub const DELTA: u8 = 2;

/// Every flat control is a stereo pair
pub const CHANNELS: usize = 2;

const MIXER_MAGIC: u8 = b'M';
const READ_DEVMASK: u8 = 0xfe;
const MIXER_INFO: u8 = 101;
const GETVERSION: u8 = 118;

/// `struct mixer_info`
#[repr(C)]
pub struct MixerInfo {
    pub id: [libc::c_char; 16],
    pub name: [libc::c_char; 32],
    pub modify_counter: libc::c_int,
    pub fillers: [libc::c_int; 10],
}

nix::ioctl_read!(oss_mixer_info, MIXER_MAGIC, MIXER_INFO, MixerInfo);
nix::ioctl_read!(oss_get_version, MIXER_MAGIC, GETVERSION, libc::c_int);

/// Unpack a `MIXER_READ` word into wire-scale levels
pub fn unpack(word: i32) -> [u8; CHANNELS] {
    let pct = |v: i32| display_to_wire((v & 0xff).min(100) as u8);
    [pct(word), pct(word >> 8)]
}

/// Pack wire-scale levels into a `MIXER_WRITE` word
///
/// Missing channels repeat the first one, extra channels are dropped.
pub fn pack(channels: &[u8]) -> i32 {
    let left = channels.first().copied().unwrap_or(0);
    let right = channels.get(1).copied().unwrap_or(left);
    wire_to_display(left) as i32 | (wire_to_display(right) as i32) << 8
}

/// Encode a control value as a `MIXER_WRITE` word
///
/// Only levels exist on this backend.
pub fn encode(index: usize, value: &ControlValue) -> Result<i32, MixerError> {
    let found = match value {
        ControlValue::Level(level) => return Ok(pack(&level.channels)),
        ControlValue::Ord(_) => "ordinal",
        ControlValue::Mask(_) => "mask",
    };
    Err(MixerError::UnexpectedValue {
        index,
        expected: "level",
        found,
    })
}

/// Format the `OSS_GETVERSION` word
pub fn format_version(version: i32) -> String {
    format!("{}.{}", (version >> 16) & 0xffff, version & 0xffff)
}

pub(crate) fn c_string(raw: &[libc::c_char]) -> String {
    let bytes: Vec<u8> = raw
        .iter()
        .take_while(|c| **c != 0)
        .map(|c| *c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).trim_end().to_string()
}

pub struct OssMixer {
    file: File,
    path: PathBuf,
    devmask: i32,
}

impl OssMixer {
    fn mixer_read(&self, dev: u8) -> Result<i32, Errno> {
        let mut value: libc::c_int = 0;
        let res = unsafe {
            libc::ioctl(
                self.file.as_raw_fd(),
                nix::request_code_read!(MIXER_MAGIC, dev, mem::size_of::<libc::c_int>()) as _,
                &mut value,
            )
        };
        Errno::result(res).map(|_| value)
    }

    fn mixer_write(&self, dev: u8, mut value: i32) -> Result<(), Errno> {
        let res = unsafe {
            libc::ioctl(
                self.file.as_raw_fd(),
                nix::request_code_readwrite!(MIXER_MAGIC, dev, mem::size_of::<libc::c_int>()) as _,
                &mut value,
            )
        };
        Errno::result(res).map(drop)
    }
}

impl Transport for OssMixer {
    fn open(path: &Path) -> Result<Self, MixerError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| MixerError::DeviceUnavailable {
                path: path.to_path_buf(),
                source,
            })?;
        let mut this = Self {
            file,
            path: path.to_path_buf(),
            devmask: 0,
        };
        this.devmask = this
            .mixer_read(READ_DEVMASK)
            .map_err(|source| MixerError::Enumerate {
                op: "SOUND_MIXER_READ_DEVMASK",
                source,
            })?;
        info!("Opened OSS mixer {} (devmask {:#x})", path.display(), this.devmask);
        Ok(this)
    }

    fn probe(&self, index: usize) -> Result<Probe, MixerError> {
        if index >= NRDEVICES {
            return Ok(Probe::End);
        }
        if self.devmask & (1 << index) == 0 {
            return Ok(Probe::Vacant);
        }
        Ok(Probe::Control(Descriptor {
            index,
            class: 0,
            name: NAMES[index].to_string(),
            label: LABELS[index].to_string(),
            kind: DescriptorKind::Value {
                channels: CHANNELS,
                delta: DELTA,
            },
        }))
    }

    fn read(&self, index: usize, _channels: Option<usize>) -> Result<ControlValue, MixerError> {
        let word = self
            .mixer_read(index as u8)
            .map_err(|source| MixerError::ReadFailed {
                op: "MIXER_READ",
                index,
                source,
            })?;
        let level = Level::new(index, unpack(word).to_vec(), DELTA)?;
        debug!("{}={:?}", NAMES.get(index).unwrap_or(&"?"), level.channels);
        Ok(ControlValue::Level(level))
    }

    fn write(&mut self, index: usize, value: &ControlValue) -> Result<(), MixerError> {
        let word = encode(index, value)?;
        debug!("{} <- {:#06x}", NAMES.get(index).unwrap_or(&"?"), word);
        self.mixer_write(index as u8, word)
            .map_err(|source| MixerError::WriteFailed {
                op: "MIXER_WRITE",
                index,
                source,
            })
    }

    fn properties(&self) -> Result<Properties, MixerError> {
        let fd = self.file.as_raw_fd();
        let mut info: MixerInfo = unsafe { mem::zeroed() };
        unsafe { oss_mixer_info(fd, &mut info) }.map_err(|source| MixerError::Properties {
            op: "SOUND_MIXER_INFO",
            source,
        })?;
        let mut version: libc::c_int = 0;
        unsafe { oss_get_version(fd, &mut version) }.map_err(|source| MixerError::Properties {
            op: "OSS_GETVERSION",
            source,
        })?;
        Ok(Properties {
            name: c_string(&info.name),
            version: format_version(version),
            device: self.path.display().to_string(),
        })
    }

    fn mute_polarity(&self) -> MutePolarity {
        MUTE_POLARITY
    }

    fn has_classes(&self) -> bool {
        false
    }
}
