//! mixer settings handling
//!
//! ## Application/ user settings
//!
//! - Which mixer device to open
//! - Page layout and the class shown at startup
//! - Refresh period
//! - Per control presentation options
//!
//! ## Usage
//!
//! First initialise the settings tree by calling
//! `Settings::init(...)`, giving it a path under which the
//! configuration is stored.  Afterwards you can access settings via
//! [`Settings::r()`](Settings::r()) and
//! [`Settings::w()`](Settings::w()).
//!
//! After applying changes to the settings, don't forget to call
//! [`sync()`](Settings::sync)!

mod app;
pub use app::{AppSettings, DEVICE_ENV};

use crate::error::SettingsError;
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use std::{
    fs::{self, File, OpenOptions},
    io::{Read, Write},
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

/// Create the required directories
pub fn scaffold() -> Option<ProjectDirs> {
    let dir = ProjectDirs::from("org", "defora", "mixer")?;
    let _ = fs::create_dir_all(dir.config_dir()); // init reports a missing dir on sync
    Some(dir)
}

/// Main settings tree
#[derive(Default, Debug)]
pub struct Settings {
    base: PathBuf,
    app: RwLock<AppSettings>,
}

impl Settings {
    /// Create a new settings tree from a config path
    pub fn init<'p>(path: impl Into<&'p Path>) -> Result<Arc<Settings>, SettingsError> {
        let base = path.into().to_path_buf();

        let this = Arc::new(Self {
            app: RwLock::new(load_path(base.join("app.json"))),
            base,
        });
        this.sync()?;
        Ok(this)
    }

    /// Sync any changes back to disk
    pub fn sync(self: &Arc<Self>) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(&self.app)?;
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.base.join("app.json"))
            .and_then(|mut f| f.write_all(json.as_bytes()))
            .map_err(Into::into)
    }

    /// Get read access to any stored setting
    pub fn r<'this>(self: &'this Arc<Self>) -> ReadSettings<'this> {
        ReadSettings { inner: self }
    }

    /// Wait to get exclusive write access to any settings
    pub fn w<'this>(self: &'this Arc<Self>) -> WriteSettings<'this> {
        WriteSettings { inner: self }
    }
}

fn load_path<T: Default + DeserializeOwned>(path: PathBuf) -> T {
    File::open(path)
        .and_then(|mut f| {
            let mut c = String::new();
            f.read_to_string(&mut c).map(|_| c)
        })
        .and_then(|s| serde_json::from_str(&s).map_err(Into::into))
        .unwrap_or_else(|_| T::default())
}

pub struct ReadSettings<'settings> {
    inner: &'settings Arc<Settings>,
}

impl<'s> ReadSettings<'s> {
    /// Get read access to the `app` settings
    pub fn app(self) -> RwLockReadGuard<'s, AppSettings> {
        self.inner.app.read().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct WriteSettings<'settings> {
    inner: &'settings Arc<Settings>,
}

impl<'s> WriteSettings<'s> {
    /// Get write access to the `app` settings
    pub fn app(self) -> RwLockWriteGuard<'s, AppSettings> {
        self.inner.app.write().unwrap_or_else(PoisonError::into_inner)
    }
}
