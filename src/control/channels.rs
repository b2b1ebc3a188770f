//! Multi-channel level control
//!
//! One slider per channel, an optional bind toggle keeping them level
//! and an optional mute switch.

use super::{
    config::in_range,
    widget::{Slider, Surface, Toggle},
    Config, Helper, Key, Value,
};
use crate::{device::MAX_CHANNELS, error::ConfigError};

const KIND: &str = "channels";

#[derive(Debug)]
pub struct Channels {
    helper: Helper,
    /// Slider step on the wire scale
    delta: u8,
    sliders: Vec<Slider>,
    bind: Toggle,
    mute: Toggle,
    /// Set while values are pushed programmatically
    suppress: bool,
}

impl Channels {
    pub fn new(helper: Helper, config: &Config) -> Result<Self, ConfigError> {
        let mut this = Self {
            helper,
            delta: 1,
            sliders: Vec::new(),
            bind: Toggle::new(false),
            mute: Toggle::new(false),
            suppress: false,
        };
        this.set(config)?;
        Ok(this)
    }

    pub fn channels(&self) -> usize {
        self.sliders.len()
    }

    pub fn slider(&self, channel: usize) -> Option<&Slider> {
        self.sliders.get(channel)
    }

    pub fn is_bound(&self) -> bool {
        self.bind.is_active()
    }

    pub fn is_muted(&self) -> bool {
        self.mute.is_active()
    }

    pub fn get(&self, key: Key) -> Result<Value, ConfigError> {
        match key {
            Key::Bind => Ok(Value::Bool(self.bind.is_active())),
            Key::Mute => Ok(Value::Bool(self.mute.is_active())),
            Key::Channels => Ok(Value::Uint(self.sliders.len() as u32)),
            Key::Delta => Ok(Value::Uint(self.delta as u32)),
            Key::ShowBind => Ok(Value::Bool(self.bind.is_visible())),
            Key::ShowMute => Ok(Value::Bool(self.mute.is_visible())),
            // a single level only makes sense while the channels move together
            Key::Value => match self.sliders.first() {
                Some(s) if self.bind.is_active() => Ok(Value::Level(s.wire())),
                _ => Err(ConfigError::Unavailable(key)),
            },
            Key::ValueN(i) => {
                let i = in_range(key, i, self.sliders.len())?;
                Ok(Value::Level(self.sliders[i].wire()))
            }
            _ => Err(unsupported(key)),
        }
    }

    pub fn set(&mut self, config: &Config) -> Result<(), ConfigError> {
        self.validate(config)?;
        let quiet = std::mem::replace(&mut self.suppress, true);
        for (key, value) in config.iter() {
            self.apply(*key, value);
        }
        self.suppress = quiet;
        Ok(())
    }

    fn validate(&self, config: &Config) -> Result<(), ConfigError> {
        let mut count = self.sliders.len();
        for (key, value) in config.iter() {
            match *key {
                Key::Bind | Key::Mute | Key::ShowBind | Key::ShowMute => {
                    value.as_bool(*key)?;
                }
                Key::Channels => {
                    let n = value.as_uint(*key)? as usize;
                    if n > MAX_CHANNELS {
                        return Err(ConfigError::OutOfRange {
                            key: *key,
                            index: n,
                            len: MAX_CHANNELS + 1,
                        });
                    }
                    count = n;
                }
                Key::Delta => {
                    value.as_level(*key)?;
                }
                Key::Value => {
                    value.as_level(*key)?;
                }
                Key::ValueN(i) => {
                    in_range(*key, i, count)?;
                    value.as_level(*key)?;
                }
                _ => return Err(unsupported(*key)),
            }
        }
        Ok(())
    }

    // only called on validated entries
    fn apply(&mut self, key: Key, value: &Value) {
        match (key, value) {
            (Key::Bind, Value::Bool(b)) => {
                self.bind.set_active(*b);
            }
            (Key::Mute, Value::Bool(b)) => {
                if self.mute.set_active(*b) {
                    self.on_mute_toggled();
                }
            }
            (Key::ShowBind, Value::Bool(b)) => self.bind.set_visible(*b),
            (Key::ShowMute, Value::Bool(b)) => self.mute.set_visible(*b),
            (Key::Channels, v) => {
                let n = v.as_uint(key).unwrap_or(0) as usize;
                let step = self.step();
                self.sliders.resize(n, Slider::new(step));
                self.bind.set_visible(n >= 2);
            }
            (Key::Delta, v) => {
                self.delta = v.as_level(key).unwrap_or(1).max(1);
                let step = self.step();
                self.sliders.iter_mut().for_each(|s| s.set_step(step));
            }
            (Key::Value, v) => {
                let level = v.as_level(key).unwrap_or(0);
                for i in 0..self.sliders.len() {
                    self.push_level(i, level);
                }
            }
            (Key::ValueN(i), v) => {
                let level = v.as_level(key).unwrap_or(0);
                self.push_level(i, level);
            }
            _ => (),
        }
    }

    /// Step of the sliders on the display scale
    fn step(&self) -> u8 {
        crate::device::wire_to_display(self.delta).max(1)
    }

    fn push_level(&mut self, channel: usize, wire: u8) {
        let quiet = std::mem::replace(&mut self.suppress, true);
        if self.sliders[channel].set_wire(wire) {
            self.on_changed(channel);
        }
        self.suppress = quiet;
    }

    /// A slider moved
    fn on_changed(&mut self, channel: usize) {
        if self.suppress {
            return;
        }
        self.suppress = true;
        if self.bind.is_active() {
            let source = self.sliders[channel].clone();
            for i in 0..self.sliders.len() {
                if i != channel && self.sliders[i].mirror(&source) {
                    self.on_changed(i);
                }
            }
        }
        self.helper.changed();
        self.suppress = false;
    }

    fn on_mute_toggled(&mut self) {
        if self.suppress {
            return;
        }
        self.helper.changed();
    }

    /// Drag one channel's slider to a display level
    pub fn slide(&mut self, channel: usize, display: u8) -> Result<(), ConfigError> {
        let channel = in_range(Key::ValueN(channel), channel, self.sliders.len())?;
        if self.sliders[channel].set_display(display) {
            self.on_changed(channel);
        }
        Ok(())
    }

    pub fn toggle_bind(&mut self, active: bool) {
        self.bind.set_active(active);
    }

    pub fn toggle_mute(&mut self, muted: bool) {
        if self.mute.set_active(muted) {
            self.on_mute_toggled();
        }
    }

    pub fn surface(&self) -> Surface {
        let sliders = self
            .sliders
            .iter()
            .map(|s| Surface::Slider {
                value: s.display(),
                step: s.step(),
            })
            .collect();
        let mut buttons = Vec::new();
        if self.bind.is_visible() {
            buttons.push(Surface::Toggle {
                label: "Bind",
                active: self.bind.is_active(),
            });
        }
        if self.mute.is_visible() {
            buttons.push(Surface::Switch {
                active: self.mute.is_active(),
            });
        }
        Surface::Column(vec![Surface::Row(sliders), Surface::Column(buttons)])
    }
}

fn unsupported(key: Key) -> ConfigError {
    ConfigError::UnsupportedKey { kind: KIND, key }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::tests::{drain, helper};

    fn stereo(left: u8, right: u8, bind: bool) -> Config {
        Config::new()
            .with(Key::Channels, Value::Uint(2))
            .with(Key::ValueN(0), Value::Level(left))
            .with(Key::ValueN(1), Value::Level(right))
            .with(Key::Bind, Value::Bool(bind))
    }

    fn levels(c: &Channels) -> Vec<u8> {
        (0..c.channels())
            .map(|i| c.slider(i).map(Slider::wire).unwrap_or_default())
            .collect()
    }

    #[test]
    fn init_loads_levels_without_notifying() {
        let (h, rx) = helper();
        let c = Channels::new(h, &stereo(100, 200, false)).unwrap();
        assert_eq!(levels(&c), vec![100, 200]);
        assert_eq!(c.slider(1).unwrap().display(), 79);
        assert_eq!(drain(&rx), 0);
    }

    #[test]
    fn bound_edit_moves_every_channel() {
        let (h, rx) = helper();
        let mut c = Channels::new(h, &stereo(100, 100, true)).unwrap();
        c.slide(0, 59).unwrap();
        assert_eq!(levels(&c), vec![150, 150]);
        assert_eq!(drain(&rx), 1);
    }

    #[test]
    fn unbound_edit_moves_one_channel() {
        let (h, rx) = helper();
        let mut c = Channels::new(h, &stereo(100, 100, true)).unwrap();
        c.set(&Config::new().with(Key::Bind, Value::Bool(false)))
            .unwrap();
        c.slide(1, 20).unwrap();
        assert_eq!(levels(&c), vec![100, 51]);
        assert_eq!(drain(&rx), 1);
    }

    #[test]
    fn pushed_levels_never_notify() {
        let (h, rx) = helper();
        let mut c = Channels::new(h, &stereo(0, 0, true)).unwrap();
        c.set(&stereo(30, 240, true)).unwrap();
        c.set(&Config::new().with(Key::Value, Value::Level(9)))
            .unwrap();
        c.set(&Config::new().with(Key::Mute, Value::Bool(true)))
            .unwrap();
        assert_eq!(levels(&c), vec![9, 9]);
        assert_eq!(drain(&rx), 0);
    }

    #[test]
    fn mute_switch_notifies_on_user_toggle() {
        let (h, rx) = helper();
        let mut c = Channels::new(h, &stereo(10, 10, true)).unwrap();
        c.toggle_mute(true);
        c.toggle_mute(true);
        assert!(c.is_muted());
        assert_eq!(drain(&rx), 1);
    }

    #[test]
    fn value_needs_bind() {
        let (h, _rx) = helper();
        let mut c = Channels::new(h, &stereo(10, 20, false)).unwrap();
        assert_eq!(c.get(Key::Value), Err(ConfigError::Unavailable(Key::Value)));
        c.toggle_bind(true);
        assert_eq!(c.get(Key::Value), Ok(Value::Level(10)));
        assert_eq!(c.get(Key::ValueN(1)), Ok(Value::Level(20)));
    }

    #[test]
    fn invalid_config_leaves_state_alone() {
        let (h, _rx) = helper();
        let mut c = Channels::new(h, &stereo(10, 20, false)).unwrap();
        let bad = Config::new()
            .with(Key::ValueN(0), Value::Level(99))
            .with(Key::ValueN(2), Value::Level(99));
        assert!(matches!(
            c.set(&bad),
            Err(ConfigError::OutOfRange { index: 2, len: 2, .. })
        ));
        assert_eq!(levels(&c), vec![10, 20]);

        let bad = Config::new().with(Key::Members, Value::Uint(1));
        assert_eq!(
            c.set(&bad),
            Err(ConfigError::UnsupportedKey {
                kind: "channels",
                key: Key::Members
            })
        );
    }

    #[test]
    fn bind_only_shows_for_several_channels() {
        let (h, _rx) = helper();
        let cfg = Config::new().with(Key::Channels, Value::Uint(1));
        let mut c = Channels::new(h, &cfg).unwrap();
        assert_eq!(c.get(Key::ShowBind), Ok(Value::Bool(false)));
        c.set(&Config::new().with(Key::Channels, Value::Uint(2)))
            .unwrap();
        assert_eq!(c.get(Key::ShowBind), Ok(Value::Bool(true)));
    }

    #[test]
    fn delta_sets_slider_step() {
        let (h, _rx) = helper();
        let cfg = Config::new()
            .with(Key::Delta, Value::Uint(8))
            .with(Key::Channels, Value::Uint(2));
        let c = Channels::new(h, &cfg).unwrap();
        assert_eq!(c.get(Key::Delta), Ok(Value::Uint(8)));
        assert_eq!(c.slider(1).unwrap().step(), 4);
    }
}
