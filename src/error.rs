use nix::errno::Errno;
use std::{io, path::PathBuf};
use thiserror::Error;

use crate::control::config::Key;
use crate::control::ControlHandle;

#[derive(Debug, Error)]
pub enum MixerError {
    /// The mixer device could not be opened read-write
    #[error("{}: {source}", .path.display())]
    DeviceUnavailable { path: PathBuf, source: io::Error },

    /// Enumeration failed on the very first index
    #[error("{op}: {source}")]
    Enumerate { op: &'static str, source: Errno },

    #[error("{op} (control {index}): {source}")]
    ReadFailed {
        op: &'static str,
        index: usize,
        source: Errno,
    },

    #[error("{op} (control {index}): {source}")]
    WriteFailed {
        op: &'static str,
        index: usize,
        source: Errno,
    },

    #[error("{op}: {source}")]
    Properties { op: &'static str, source: Errno },

    #[error("control {index} reports {count} channels")]
    TooManyChannels { index: usize, count: usize },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no control is bound to handle {0:?}")]
    UnknownControl(ControlHandle),

    #[error("no control named \"{0}\"")]
    NoSuchControl(String),

    #[error("control {index} returned {found} where a {expected} was expected")]
    UnexpectedValue {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    /// Every control that failed during one pass, by device index
    #[error("{} control(s) failed", .0.len())]
    Partial(Vec<(usize, MixerError)>),
}

/// Errors raised by the control configuration protocol
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("unknown configuration key \"{0}\"")]
    UnknownKey(String),

    #[error("\"{key}\" is not supported by {kind} controls")]
    UnsupportedKey { kind: &'static str, key: Key },

    #[error("\"{key}\" expects a {expected} value")]
    TypeMismatch { key: Key, expected: &'static str },

    #[error("\"{key}\": position {index} is out of range ({len} members)")]
    OutOfRange { key: Key, index: usize, len: usize },

    #[error("no member carries ordinal {0}")]
    NoSuchOrdinal(u32),

    #[error("\"{0}\" is not available in the current state")]
    Unavailable(Key),

    #[error("unknown control type \"{0}\"")]
    UnknownType(String),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
