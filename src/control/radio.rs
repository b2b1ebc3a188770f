//! Mutually exclusive choice among labelled members
//!
//! Each member carries the device ordinal it stands for.  `value` is the
//! ordinal of the active member, `valueN` the ordinal of member N.

use super::{config::in_range, widget::Surface, Config, Helper, Key, Value};
use crate::error::ConfigError;

const KIND: &str = "radio";

#[derive(Clone, Debug, PartialEq)]
struct Member {
    label: String,
    ord: u32,
    active: bool,
}

impl Member {
    fn new(position: usize) -> Self {
        Self {
            label: String::new(),
            ord: position as u32,
            active: false,
        }
    }
}

#[derive(Debug)]
pub struct Radio {
    helper: Helper,
    members: Vec<Member>,
    suppress: bool,
}

impl Radio {
    pub fn new(helper: Helper, config: &Config) -> Result<Self, ConfigError> {
        let mut this = Self {
            helper,
            members: Vec::new(),
            suppress: false,
        };
        this.set(config)?;
        Ok(this)
    }

    /// Ordinal of the active member
    pub fn selected(&self) -> Option<u32> {
        self.members.iter().find(|m| m.active).map(|m| m.ord)
    }

    pub fn get(&self, key: Key) -> Result<Value, ConfigError> {
        match key {
            Key::Members => Ok(Value::Uint(self.members.len() as u32)),
            Key::Value => self
                .selected()
                .map(Value::Uint)
                .ok_or(ConfigError::Unavailable(key)),
            Key::ValueN(i) => {
                let i = in_range(key, i, self.members.len())?;
                Ok(Value::Uint(self.members[i].ord))
            }
            Key::Label(i) => {
                let i = in_range(key, i, self.members.len())?;
                Ok(Value::Text(self.members[i].label.clone()))
            }
            _ => Err(unsupported(key)),
        }
    }

    pub fn set(&mut self, config: &Config) -> Result<(), ConfigError> {
        self.validate(config)?;
        let quiet = std::mem::replace(&mut self.suppress, true);
        for (key, value) in config.iter() {
            match (*key, value) {
                (Key::Members, Value::Uint(n)) => {
                    let n = *n as usize;
                    let len = self.members.len();
                    self.members.extend((len..n).map(Member::new));
                    self.members.truncate(n);
                }
                (Key::Label(i), Value::Text(s)) => self.members[i].label = s.clone(),
                (Key::ValueN(i), v) => {
                    self.members[i].ord = v.as_uint(*key).unwrap_or(i as u32)
                }
                (Key::Value, v) => {
                    let ord = v.as_uint(*key).unwrap_or(0);
                    if let Some(pos) = self.members.iter().position(|m| m.ord == ord) {
                        self.activate(pos);
                    }
                }
                _ => (),
            }
        }
        self.suppress = quiet;
        Ok(())
    }

    fn validate(&self, config: &Config) -> Result<(), ConfigError> {
        let mut ords: Vec<u32> = self.members.iter().map(|m| m.ord).collect();
        for (key, value) in config.iter() {
            match *key {
                Key::Members => {
                    let n = match value {
                        Value::Uint(n) => *n as usize,
                        _ => {
                            return Err(ConfigError::TypeMismatch {
                                key: *key,
                                expected: "unsigned",
                            })
                        }
                    };
                    let len = ords.len();
                    ords.extend((len..n).map(|i| i as u32));
                    ords.truncate(n);
                }
                Key::Label(i) => {
                    in_range(*key, i, ords.len())?;
                    value.as_text(*key)?;
                }
                Key::ValueN(i) => {
                    let i = in_range(*key, i, ords.len())?;
                    ords[i] = value.as_uint(*key)?;
                }
                Key::Value => {
                    let ord = value.as_uint(*key)?;
                    if !ords.contains(&ord) {
                        return Err(ConfigError::NoSuchOrdinal(ord));
                    }
                }
                _ => return Err(unsupported(*key)),
            }
        }
        Ok(())
    }

    fn activate(&mut self, position: usize) {
        if self.members[position].active {
            return;
        }
        for (i, m) in self.members.iter_mut().enumerate() {
            m.active = i == position;
        }
        self.on_toggled();
    }

    fn on_toggled(&mut self) {
        if self.suppress {
            return;
        }
        self.helper.changed();
    }

    /// Click the member at `position`
    pub fn select(&mut self, position: usize) -> Result<(), ConfigError> {
        let position = in_range(Key::ValueN(position), position, self.members.len())?;
        self.activate(position);
        Ok(())
    }

    pub fn surface(&self) -> Surface {
        Surface::Column(
            self.members
                .iter()
                .map(|m| Surface::Radio {
                    label: m.label.clone(),
                    active: m.active,
                })
                .collect(),
        )
    }
}

fn unsupported(key: Key) -> ConfigError {
    ConfigError::UnsupportedKey { kind: KIND, key }
}
