//! Single mute switch

use super::{
    widget::{Surface, Toggle},
    Config, Helper, Key, Value,
};
use crate::error::ConfigError;

const KIND: &str = "mute";

#[derive(Debug)]
pub struct Mute {
    helper: Helper,
    switch: Toggle,
    suppress: bool,
}

impl Mute {
    pub fn new(helper: Helper, config: &Config) -> Result<Self, ConfigError> {
        let mut this = Self {
            helper,
            switch: Toggle::new(true),
            suppress: false,
        };
        this.set(config)?;
        Ok(this)
    }

    pub fn is_muted(&self) -> bool {
        self.switch.is_active()
    }

    pub fn get(&self, key: Key) -> Result<Value, ConfigError> {
        match key {
            Key::Value => Ok(Value::Bool(self.switch.is_active())),
            _ => Err(ConfigError::UnsupportedKey { kind: KIND, key }),
        }
    }

    pub fn set(&mut self, config: &Config) -> Result<(), ConfigError> {
        let mut muted = None;
        for (key, value) in config.iter() {
            match key {
                Key::Value => muted = Some(value.as_bool(*key)?),
                _ => return Err(ConfigError::UnsupportedKey { kind: KIND, key: *key }),
            }
        }
        if let Some(muted) = muted {
            let quiet = std::mem::replace(&mut self.suppress, true);
            if self.switch.set_active(muted) {
                self.on_toggled();
            }
            self.suppress = quiet;
        }
        Ok(())
    }

    fn on_toggled(&mut self) {
        if self.suppress {
            return;
        }
        self.helper.changed();
    }

    pub fn toggle(&mut self, muted: bool) {
        if self.switch.set_active(muted) {
            self.on_toggled();
        }
    }

    pub fn surface(&self) -> Surface {
        Surface::Switch {
            active: self.switch.is_active(),
        }
    }
}
