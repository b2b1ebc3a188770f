use crate::{
    control::{Config, Value},
    device::netbsd::class,
    error::ConfigError,
    mixer::{Layout, REFRESH_INTERVAL},
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, env, ffi::OsString, path::PathBuf, time::Duration};

/// Environment variable overriding the mixer device
pub const DEVICE_ENV: &str = "MIXER_DEVICE";

/// mixer application settings tree
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Mixer device node, `/dev/mixer` when unset
    pub device: Option<PathBuf>,
    /// How class pages are arranged
    pub layout: Layout,
    /// Milliseconds between two device refreshes
    pub refresh_ms: u64,
    /// Class shown at startup, every class when unset
    pub view: Option<String>,
    /// Boolean options per control id, e.g. `"outputs.master": {"show-bind": false}`
    pub controls: BTreeMap<String, BTreeMap<String, bool>>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            device: None,
            layout: Layout::Horizontal,
            refresh_ms: REFRESH_INTERVAL.as_millis() as u64,
            view: Some(class::OUTPUTS.into()),
            controls: BTreeMap::new(),
        }
    }
}

impl AppSettings {
    /// The device to open, [`DEVICE_ENV`] wins over the stored path
    pub fn device(&self) -> Option<PathBuf> {
        self.device_or(env::var_os(DEVICE_ENV))
    }

    fn device_or(&self, env: Option<OsString>) -> Option<PathBuf> {
        env.filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| self.device.clone())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_ms.max(1))
    }

    /// Per control overrides, parsed through the configuration keys
    pub fn overrides(&self) -> impl Iterator<Item = (&str, Result<Config, ConfigError>)> {
        self.controls.iter().map(|(id, opts)| {
            let pairs = opts.iter().map(|(k, v)| (k.as_str(), Value::Bool(*v)));
            (id.as_str(), Config::from_pairs(pairs))
        })
    }
}
