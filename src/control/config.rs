//! Configuration protocol between the mixer and its controls
//!
//! Options travel as an ordered list of `(Key, Value)` pairs.  The key
//! set is closed: string keys are parsed once at the boundary and
//! anything unrecognised is rejected there.

use crate::error::ConfigError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::{fmt, iter::FromIterator, str::FromStr};

static INDEXED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(value|label)(\d+)$").unwrap());

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// Level, ordinal or mask of the whole control
    Value,
    /// Per-position value: a channel level, a member ordinal or mask
    ValueN(usize),
    Bind,
    Mute,
    Channels,
    Members,
    Label(usize),
    Delta,
    ShowBind,
    ShowMute,
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Value => write!(f, "value"),
            Key::ValueN(n) => write!(f, "value{}", n),
            Key::Bind => write!(f, "bind"),
            Key::Mute => write!(f, "mute"),
            Key::Channels => write!(f, "channels"),
            Key::Members => write!(f, "members"),
            Key::Label(n) => write!(f, "label{}", n),
            Key::Delta => write!(f, "delta"),
            Key::ShowBind => write!(f, "show-bind"),
            Key::ShowMute => write!(f, "show-mute"),
        }
    }
}

impl FromStr for Key {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = match s {
            "value" => Key::Value,
            "bind" => Key::Bind,
            "mute" => Key::Mute,
            "channels" => Key::Channels,
            "members" => Key::Members,
            "delta" => Key::Delta,
            "show-bind" => Key::ShowBind,
            "show-mute" => Key::ShowMute,
            _ => {
                let caps = INDEXED
                    .captures(s)
                    .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))?;
                let n = caps[2]
                    .parse()
                    .map_err(|_| ConfigError::UnknownKey(s.to_string()))?;
                match &caps[1] {
                    "value" => Key::ValueN(n),
                    _ => Key::Label(n),
                }
            }
        };
        Ok(key)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Uint(u32),
    /// A level on the 0-255 wire scale
    Level(u8),
    Text(String),
}

impl Value {
    pub fn as_bool(&self, key: Key) -> Result<bool, ConfigError> {
        match self {
            Value::Bool(b) => Ok(*b),
            _ => Err(ConfigError::TypeMismatch {
                key,
                expected: "boolean",
            }),
        }
    }

    pub fn as_uint(&self, key: Key) -> Result<u32, ConfigError> {
        match self {
            Value::Uint(u) => Ok(*u),
            Value::Level(l) => Ok(*l as u32),
            _ => Err(ConfigError::TypeMismatch {
                key,
                expected: "unsigned",
            }),
        }
    }

    pub fn as_level(&self, key: Key) -> Result<u8, ConfigError> {
        match self {
            Value::Level(l) => Ok(*l),
            Value::Uint(u) if *u <= u8::MAX as u32 => Ok(*u as u8),
            _ => Err(ConfigError::TypeMismatch {
                key,
                expected: "level",
            }),
        }
    }

    pub fn as_text(&self, key: Key) -> Result<&str, ConfigError> {
        match self {
            Value::Text(s) => Ok(s),
            _ => Err(ConfigError::TypeMismatch {
                key,
                expected: "text",
            }),
        }
    }
}

/// An ordered set of options for a control
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Config {
    entries: Vec<(Key, Value)>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style push
    pub fn with(mut self, key: Key, value: Value) -> Self {
        self.push(key, value);
        self
    }

    pub fn push(&mut self, key: Key, value: Value) {
        self.entries.push((key, value));
    }

    /// Parse string keyed pairs, failing on the first unknown key
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        pairs
            .into_iter()
            .map(|(k, v)| k.parse::<Key>().map(|k| (k, v)))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Key, Value)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(Key, Value)> for Config {
    fn from_iter<I: IntoIterator<Item = (Key, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Check that position `index` exists among `len` members
pub(crate) fn in_range(key: Key, index: usize, len: usize) -> Result<usize, ConfigError> {
    if index < len {
        Ok(index)
    } else {
        Err(ConfigError::OutOfRange { key, index, len })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_indexed_keys() {
        assert_eq!("show-mute".parse::<Key>().unwrap(), Key::ShowMute);
        assert_eq!("value12".parse::<Key>().unwrap(), Key::ValueN(12));
        assert_eq!("label0".parse::<Key>().unwrap(), Key::Label(0));
    }

    #[test]
    fn unknown_keys_fail_closed() {
        for bad in &["vgroup", "value-1", "labelx", "Value", ""] {
            assert_eq!(
                bad.parse::<Key>(),
                Err(ConfigError::UnknownKey(bad.to_string()))
            );
        }
    }

    #[test]
    fn display_matches_parse() {
        for key in &[Key::ValueN(3), Key::Label(1), Key::ShowBind, Key::Delta] {
            assert_eq!(key.to_string().parse::<Key>().unwrap(), *key);
        }
    }

    #[test]
    fn from_pairs_keeps_order_and_rejects_unknown() {
        let cfg = Config::from_pairs(vec![
            ("bind", Value::Bool(false)),
            ("value1", Value::Level(9)),
        ])
        .unwrap();
        let keys: Vec<Key> = cfg.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![Key::Bind, Key::ValueN(1)]);

        let err = Config::from_pairs(vec![("bind", Value::Bool(true)), ("loud", Value::Bool(true))]);
        assert_eq!(err, Err(ConfigError::UnknownKey("loud".into())));
    }

    #[test]
    fn values_check_their_type() {
        assert_eq!(Value::Uint(200).as_level(Key::Value), Ok(200));
        assert!(Value::Uint(300).as_level(Key::Value).is_err());
        assert!(Value::Text("x".into()).as_bool(Key::Bind).is_err());
        assert_eq!(Value::Text("on".into()).as_text(Key::Label(1)), Ok("on"));
    }
}
