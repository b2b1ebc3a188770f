//! Independent check boxes, each owning mask bits

use super::{config::in_range, widget::Surface, Config, Helper, Key, Value};
use crate::error::ConfigError;

const KIND: &str = "set";

#[derive(Clone, Debug, PartialEq)]
struct Member {
    label: String,
    mask: u32,
    active: bool,
}

#[derive(Debug)]
pub struct Set {
    helper: Helper,
    members: Vec<Member>,
    suppress: bool,
}

impl Set {
    pub fn new(helper: Helper, config: &Config) -> Result<Self, ConfigError> {
        let mut this = Self {
            helper,
            members: Vec::new(),
            suppress: false,
        };
        this.set(config)?;
        Ok(this)
    }

    /// OR of the active members' masks
    pub fn mask(&self) -> u32 {
        self.members
            .iter()
            .filter(|m| m.active)
            .fold(0, |acc, m| acc | m.mask)
    }

    pub fn get(&self, key: Key) -> Result<Value, ConfigError> {
        match key {
            Key::Members => Ok(Value::Uint(self.members.len() as u32)),
            Key::Value => Ok(Value::Uint(self.mask())),
            Key::ValueN(i) => {
                let i = in_range(key, i, self.members.len())?;
                Ok(Value::Uint(self.members[i].mask))
            }
            Key::Label(i) => {
                let i = in_range(key, i, self.members.len())?;
                Ok(Value::Text(self.members[i].label.clone()))
            }
            _ => Err(ConfigError::UnsupportedKey { kind: KIND, key }),
        }
    }

    pub fn set(&mut self, config: &Config) -> Result<(), ConfigError> {
        self.validate(config)?;
        let quiet = std::mem::replace(&mut self.suppress, true);
        for (key, value) in config.iter() {
            match (*key, value) {
                (Key::Members, v) => {
                    let n = v.as_uint(*key).unwrap_or(0) as usize;
                    let len = self.members.len();
                    self.members.extend((len..n).map(|i| Member {
                        label: String::new(),
                        mask: 1 << i,
                        active: false,
                    }));
                    self.members.truncate(n);
                }
                (Key::Label(i), Value::Text(s)) => self.members[i].label = s.clone(),
                (Key::ValueN(i), v) => self.members[i].mask = v.as_uint(*key).unwrap_or(0),
                (Key::Value, v) => {
                    let value = v.as_uint(*key).unwrap_or(0);
                    for i in 0..self.members.len() {
                        let mask = self.members[i].mask;
                        self.check(i, mask != 0 && value & mask == mask);
                    }
                }
                _ => (),
            }
        }
        self.suppress = quiet;
        Ok(())
    }

    fn validate(&self, config: &Config) -> Result<(), ConfigError> {
        let mut count = self.members.len();
        for (key, value) in config.iter() {
            match *key {
                Key::Members => {
                    let n = value.as_uint(*key)? as usize;
                    // one bit per member
                    if n > 32 {
                        return Err(ConfigError::OutOfRange {
                            key: *key,
                            index: n,
                            len: 33,
                        });
                    }
                    count = n;
                }
                Key::Label(i) => {
                    in_range(*key, i, count)?;
                    value.as_text(*key)?;
                }
                Key::ValueN(i) => {
                    in_range(*key, i, count)?;
                    value.as_uint(*key)?;
                }
                Key::Value => {
                    value.as_uint(*key)?;
                }
                _ => return Err(ConfigError::UnsupportedKey { kind: KIND, key: *key }),
            }
        }
        Ok(())
    }

    fn check(&mut self, position: usize, active: bool) {
        if self.members[position].active == active {
            return;
        }
        self.members[position].active = active;
        self.on_toggled();
    }

    fn on_toggled(&mut self) {
        if self.suppress {
            return;
        }
        self.helper.changed();
    }

    /// Tick or untick the member at `position`
    pub fn toggle(&mut self, position: usize, active: bool) -> Result<(), ConfigError> {
        let position = in_range(Key::ValueN(position), position, self.members.len())?;
        self.check(position, active);
        Ok(())
    }

    pub fn surface(&self) -> Surface {
        Surface::Row(
            self.members
                .iter()
                .map(|m| Surface::Check {
                    label: m.label.clone(),
                    active: m.active,
                })
                .collect(),
        )
    }
}
