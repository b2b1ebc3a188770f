//! Mixer orchestrator
//!
//! Binds every hardware control to a typed control, keeps the controls
//! in step with the device and writes user edits back.  Everything runs
//! on one task: edits are queued by the controls' helpers and drained by
//! [`Mixer::process_pending`], device changes are pulled in by
//! [`Mixer::refresh`].

mod class;
mod timer;

pub use crate::control::ControlHandle;
pub use class::MixerClass;
pub use timer::{RefreshTimer, TimerHandle, REFRESH_INTERVAL};

use crate::{
    control::{Config, ControlType, Helper, Key, MixerControl, Surface, Value},
    device::{
        ControlValue, Descriptor, DescriptorKind, EnumMember, Level, Properties, Transport,
        DEFAULT_DEVICE,
    },
    error::MixerError,
};
use async_std::channel::{self, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::{fmt, path::Path, time::Duration};
use tracing::{debug, error, info, warn};

/// How class pages are arranged
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Layout {
    #[serde(rename = "horizontal")]
    Horizontal,
    #[serde(rename = "vertical")]
    Vertical,
    /// One tab per class, a single page visible at a time
    #[serde(rename = "tabbed")]
    Tabbed,
}

impl Default for Layout {
    fn default() -> Self {
        Layout::Horizontal
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Binding {
    Level {
        channels: usize,
        delta: u8,
        /// Device index of a paired `.mute` enum
        mute: Option<usize>,
    },
    Mute,
    Radio,
    Set,
}

#[derive(Debug)]
struct Managed {
    index: usize,
    binding: Binding,
    control: MixerControl,
}

pub struct Mixer<T> {
    device: String,
    transport: T,
    layout: Layout,
    /// Whether the device groups its controls into classes
    classed: bool,
    classes: Vec<MixerClass>,
    controls: Vec<Managed>,
    /// Active page of a tabbed layout
    current: usize,
    tx: Sender<ControlHandle>,
    rx: Receiver<ControlHandle>,
    timer: RefreshTimer,
}

impl<T: Transport> Mixer<T> {
    /// Open the device and bind all of its controls
    pub fn new(device: Option<&Path>, layout: Layout, interval: Duration) -> Result<Self, MixerError> {
        let path = device.unwrap_or_else(|| Path::new(DEFAULT_DEVICE));
        let transport = T::open(path)?;
        Self::with_transport(transport, &path.display().to_string(), layout, interval)
    }

    /// Bind the controls of an already opened device
    pub fn with_transport(
        transport: T,
        device: &str,
        layout: Layout,
        interval: Duration,
    ) -> Result<Self, MixerError> {
        let descriptors = transport.descriptors().collect::<Result<Vec<_>, _>>()?;
        let (tx, rx) = channel::unbounded();
        let mut this = Self {
            device: device.to_string(),
            classed: transport.has_classes(),
            transport,
            layout,
            classes: Vec::new(),
            controls: Vec::new(),
            current: 0,
            tx,
            rx,
            timer: RefreshTimer::new(interval),
        };

        if this.classed {
            this.classes = descriptors
                .iter()
                .filter(|d| d.is_class())
                .map(|d| MixerClass::new(d.class, &d.label))
                .collect();
        } else {
            this.classes.push(MixerClass::new(0, "all"));
        }

        let mut pos = 0;
        while pos < descriptors.len() {
            let d = &descriptors[pos];
            pos += 1;
            if d.is_class() {
                continue;
            }
            let class = match this.class_slot(d.class) {
                Some(c) => c,
                None => {
                    debug!("{}: no class {}, skipping", d.label, d.class);
                    continue;
                }
            };
            let mute = match d.kind {
                DescriptorKind::Value { .. } => mute_partner(d, descriptors.get(pos)),
                _ => None,
            };
            match this.bind(d, class, mute) {
                Ok(()) if mute.is_some() => pos += 1,
                Ok(()) => (),
                Err(e) => warn!("Skipping control {}: {}", d.label, e),
            }
        }

        info!(
            "Bound {} controls in {} classes on {}",
            this.controls.len(),
            this.classes.iter().filter(|c| c.is_populated()).count(),
            this.device
        );
        Ok(this)
    }

    fn class_slot(&self, class: i32) -> Option<usize> {
        if !self.classed {
            return Some(0);
        }
        self.classes.iter().position(|c| c.id() == class)
    }

    fn bind(
        &mut self,
        d: &Descriptor,
        class: usize,
        mute: Option<&Descriptor>,
    ) -> Result<(), MixerError> {
        let handle = ControlHandle(self.controls.len());
        let polarity = self.transport.mute_polarity();

        let (kind, binding, config) = match &d.kind {
            DescriptorKind::Class => return Ok(()),
            DescriptorKind::Value { channels, delta } => {
                let level = expect_level(d.index, self.transport.read(d.index, Some(*channels))?)?;
                let muted = mute.and_then(|m| {
                    let read = self.transport.read(m.index, None);
                    match read.and_then(|v| expect_ord(m.index, v)) {
                        Ok(ord) => Some((m.index, polarity.is_muted(ord))),
                        Err(e) => {
                            warn!("{}: dropping mute switch {}: {}", d.label, m.label, e);
                            None
                        }
                    }
                });
                let n = level.channels.len();
                let mut config = Config::new()
                    .with(Key::Delta, Value::Uint(*delta as u32))
                    .with(Key::Channels, Value::Uint(n as u32))
                    .with(Key::ShowMute, Value::Bool(muted.is_some()));
                for (i, v) in level.channels.iter().enumerate() {
                    config.push(Key::ValueN(i), Value::Level(*v));
                }
                if n >= 2 {
                    // forcing bind on diverged channels would level them
                    config.push(Key::Bind, Value::Bool(level.is_uniform()));
                }
                if let Some((_, m)) = muted {
                    config.push(Key::Mute, Value::Bool(m));
                }
                let binding = Binding::Level {
                    channels: n,
                    delta: *delta,
                    mute: muted.map(|(index, _)| index),
                };
                (ControlType::Channels, binding, config)
            }
            DescriptorKind::Enum(members) if is_switch(members) => {
                let ord = expect_ord(d.index, self.transport.read(d.index, None)?)?;
                let config = Config::new().with(Key::Value, Value::Bool(polarity.is_muted(ord)));
                (ControlType::Mute, Binding::Mute, config)
            }
            DescriptorKind::Enum(members) => {
                let ord = expect_ord(d.index, self.transport.read(d.index, None)?)?;
                let mut config = Config::new().with(Key::Members, Value::Uint(members.len() as u32));
                for (i, m) in members.iter().enumerate() {
                    config.push(Key::Label(i), Value::Text(m.label.clone()));
                    config.push(Key::ValueN(i), Value::Uint(m.ord));
                }
                config.push(Key::Value, Value::Uint(ord));
                (ControlType::Radio, Binding::Radio, config)
            }
            DescriptorKind::Set(members) => {
                let mask = expect_mask(d.index, self.transport.read(d.index, None)?)?;
                let mut config = Config::new().with(Key::Members, Value::Uint(members.len() as u32));
                for (i, m) in members.iter().enumerate() {
                    config.push(Key::Label(i), Value::Text(m.label.clone()));
                    config.push(Key::ValueN(i), Value::Uint(m.mask));
                }
                config.push(Key::Value, Value::Uint(mask));
                (ControlType::Set, Binding::Set, config)
            }
        };

        let id = if self.classed {
            format!("{}.{}", self.classes[class].label(), d.name)
        } else {
            d.name.clone()
        };
        let helper = Helper::new(handle, self.tx.clone());
        let control = MixerControl::new(id, &d.label, kind, helper, &config)?;
        debug!("Bound {} as a {} control", control.id(), kind);

        self.classes[class].push(handle);
        self.controls.push(Managed {
            index: d.index,
            binding,
            control,
        });
        Ok(())
    }

    /// Pull the current device state into every control
    ///
    /// A failing control keeps its last value and does not stop the
    /// others from updating.
    pub fn refresh(&mut self) -> Result<(), MixerError> {
        let mut failures = Vec::new();
        for slot in 0..self.controls.len() {
            if let Err(e) = self.refresh_one(slot) {
                let managed = &self.controls[slot];
                warn!("Refreshing {} failed: {}", managed.control.id(), e);
                failures.push((managed.index, e));
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(MixerError::Partial(failures))
        }
    }

    fn refresh_one(&mut self, slot: usize) -> Result<(), MixerError> {
        let polarity = self.transport.mute_polarity();
        let managed = &mut self.controls[slot];
        let index = managed.index;

        let config = match managed.binding {
            Binding::Level { channels, mute, .. } => {
                let level = expect_level(index, self.transport.read(index, Some(channels))?)?;
                let mut config = Config::new();
                for (i, v) in level.channels.iter().enumerate().take(channels) {
                    config.push(Key::ValueN(i), Value::Level(*v));
                }
                // someone else moved the channels apart
                if channels >= 2 && !level.is_uniform() {
                    config.push(Key::Bind, Value::Bool(false));
                }
                managed.control.set(&config)?;

                match mute {
                    Some(m) => {
                        let ord = expect_ord(m, self.transport.read(m, None)?)?;
                        Config::new().with(Key::Mute, Value::Bool(polarity.is_muted(ord)))
                    }
                    None => return Ok(()),
                }
            }
            Binding::Mute => {
                let ord = expect_ord(index, self.transport.read(index, None)?)?;
                Config::new().with(Key::Value, Value::Bool(polarity.is_muted(ord)))
            }
            Binding::Radio => {
                let ord = expect_ord(index, self.transport.read(index, None)?)?;
                Config::new().with(Key::Value, Value::Uint(ord))
            }
            Binding::Set => {
                let mask = expect_mask(index, self.transport.read(index, None)?)?;
                Config::new().with(Key::Value, Value::Uint(mask))
            }
        };
        managed.control.set(&config)?;
        Ok(())
    }

    /// Write a control's whole state to the device
    pub fn set(&mut self, handle: ControlHandle) -> Result<(), MixerError> {
        let polarity = self.transport.mute_polarity();
        let managed = self
            .controls
            .get(handle.0)
            .ok_or(MixerError::UnknownControl(handle))?;
        let control = managed.control.control();
        let index = managed.index;

        match managed.binding {
            Binding::Level {
                channels,
                delta,
                mute,
            } => {
                let keys: Vec<Key> = (0..channels).map(Key::ValueN).collect();
                let levels = control
                    .get(&keys)?
                    .iter()
                    .zip(&keys)
                    .map(|(v, k)| v.as_level(*k))
                    .collect::<Result<Vec<_>, _>>()?;
                let level = Level::new(index, levels, delta)?;
                self.transport.write(index, &ControlValue::Level(level))?;
                if let Some(m) = mute {
                    let muted = control.get_one(Key::Mute)?.as_bool(Key::Mute)?;
                    self.transport
                        .write(m, &ControlValue::Ord(polarity.ordinal(muted)))?;
                }
            }
            Binding::Mute => {
                let muted = control.get_one(Key::Value)?.as_bool(Key::Value)?;
                self.transport
                    .write(index, &ControlValue::Ord(polarity.ordinal(muted)))?;
            }
            Binding::Radio => {
                let ord = control.get_one(Key::Value)?.as_uint(Key::Value)?;
                self.transport.write(index, &ControlValue::Ord(ord))?;
            }
            Binding::Set => {
                let mask = control.get_one(Key::Value)?.as_uint(Key::Value)?;
                self.transport.write(index, &ControlValue::Mask(mask))?;
            }
        }
        Ok(())
    }

    /// Write every control edited since the last call
    ///
    /// Returns how many controls were written.
    pub fn process_pending(&mut self) -> Result<usize, MixerError> {
        let mut queued: Vec<ControlHandle> = Vec::new();
        while let Ok(handle) = self.rx.try_recv() {
            if !queued.contains(&handle) {
                queued.push(handle);
            }
        }

        let mut failures = Vec::new();
        for handle in &queued {
            if let Err(e) = self.set(*handle) {
                error!("Writing {:?} failed: {}", handle, e);
                let index = self.controls.get(handle.0).map_or(handle.0, |m| m.index);
                failures.push((index, e));
            }
        }
        if failures.is_empty() {
            Ok(queued.len())
        } else {
            Err(MixerError::Partial(failures))
        }
    }

    /// Refresh periodically until the timer is cancelled
    pub async fn run(&mut self) {
        info!(
            "Refreshing {} every {}ms",
            self.device,
            self.timer.interval().as_millis()
        );
        while self.timer.tick().await {
            if let Err(e) = self.process_pending() {
                error!("{}", e);
            }
            if let Err(e) = self.refresh() {
                warn!("{}", e);
            }
        }
        info!("Refresh timer stopped");
    }

    pub fn properties(&self) -> Result<Properties, MixerError> {
        self.transport.properties()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Apply presentation options to the control with the given id
    pub fn configure(&mut self, id: &str, config: &Config) -> Result<(), MixerError> {
        let handle = self
            .find(id)
            .ok_or_else(|| MixerError::NoSuchControl(id.to_string()))?;
        self.controls[handle.0].control.set(config)?;
        Ok(())
    }
}

impl<T> Mixer<T> {
    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn classes(&self) -> &[MixerClass] {
        &self.classes
    }

    pub fn handles(&self) -> impl Iterator<Item = ControlHandle> {
        (0..self.controls.len()).map(ControlHandle)
    }

    pub fn control(&self, handle: ControlHandle) -> Option<&MixerControl> {
        self.controls.get(handle.0).map(|m| &m.control)
    }

    pub fn control_mut(&mut self, handle: ControlHandle) -> Option<&mut MixerControl> {
        self.controls.get_mut(handle.0).map(|m| &mut m.control)
    }

    /// Device index a control is bound to
    pub fn index_of(&self, handle: ControlHandle) -> Option<usize> {
        self.controls.get(handle.0).map(|m| m.index)
    }

    pub fn find(&self, id: &str) -> Option<ControlHandle> {
        self.controls
            .iter()
            .position(|m| m.control.id() == id)
            .map(ControlHandle)
    }

    pub fn timer_handle(&self) -> TimerHandle {
        self.timer.handle()
    }

    /// Populated classes, in page order
    fn pages_mut(&mut self) -> impl Iterator<Item = &mut MixerClass> {
        self.classes.iter_mut().filter(|c| c.is_populated())
    }

    pub fn show_all(&mut self) {
        self.pages_mut().for_each(|c| c.set_visible(true));
    }

    /// Show only the named class, or every class for `None`
    ///
    /// A tabbed layout switches to that class' page instead.  Devices
    /// without classes always show their single page.
    pub fn show_class(&mut self, name: Option<&str>) {
        if !self.classed {
            return;
        }
        match (self.layout, name) {
            (Layout::Tabbed, Some(name)) => {
                let page = self.pages_mut().position(|c| c.label() == name);
                match page {
                    Some(page) => self.current = page,
                    None => debug!("No page for class {}", name),
                }
            }
            _ => self.pages_mut().for_each(|c| {
                let shown = name.map_or(true, |n| c.label() == n);
                c.set_visible(shown);
            }),
        }
    }

    /// Show only the page at `view`
    pub fn show_view(&mut self, view: usize) {
        let pages = self.pages_mut().count();
        if view >= pages {
            debug!("No view {} ({} pages)", view, pages);
            return;
        }
        if self.layout == Layout::Tabbed {
            self.current = view;
            return;
        }
        self.pages_mut()
            .enumerate()
            .for_each(|(i, c)| c.set_visible(i == view));
    }

    pub fn surface(&self) -> MixerSurface {
        let pages = self
            .classes
            .iter()
            .filter(|c| c.is_populated())
            .map(|c| Page {
                title: c.title(),
                visible: c.is_visible(),
                controls: c
                    .members()
                    .iter()
                    .filter_map(|h| self.control(*h))
                    .map(MixerControl::surface)
                    .collect(),
            })
            .collect();
        MixerSurface {
            layout: self.layout,
            current: if self.layout == Layout::Tabbed {
                Some(self.current)
            } else {
                None
            },
            pages,
        }
    }
}

impl<T> Drop for Mixer<T> {
    fn drop(&mut self) {
        self.timer.handle().cancel();
        self.controls.clear();
        info!("Closed mixer {}", self.device);
    }
}

/// One class page
#[derive(Clone, Debug, PartialEq)]
pub struct Page {
    pub title: String,
    pub visible: bool,
    pub controls: Vec<Surface>,
}

/// Snapshot of the whole mixer
#[derive(Clone, Debug, PartialEq)]
pub struct MixerSurface {
    pub layout: Layout,
    /// Shown page of a tabbed layout
    pub current: Option<usize>,
    pub pages: Vec<Page>,
}

impl MixerSurface {
    /// Pages currently on screen
    pub fn shown(&self) -> impl Iterator<Item = &Page> {
        let current = self.current;
        self.pages
            .iter()
            .enumerate()
            .filter(move |(i, p)| current.map_or(p.visible, |c| c == *i))
            .map(|(_, p)| p)
    }
}

impl fmt::Display for MixerSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for page in self.shown() {
            writeln!(f, "[{}]", page.title)?;
            for control in &page.controls {
                writeln!(f, "  {}", control)?;
            }
        }
        Ok(())
    }
}

/// The `<label>.mute` enum right after a Value control, if any
///
/// Drivers usually list a knob's mute switch next to it.  Nothing
/// guarantees the ordering, an unpaired switch becomes its own control.
fn mute_partner<'d>(value: &Descriptor, next: Option<&'d Descriptor>) -> Option<&'d Descriptor> {
    let next = next.filter(|n| n.index == value.index + 1)?;
    match &next.kind {
        DescriptorKind::Enum(_) => (),
        _ => return None,
    }
    let label = next.label.as_str();
    if label.len() >= 6 && label.starts_with(value.label.as_str()) && label.ends_with(".mute") {
        Some(next)
    } else {
        None
    }
}

/// An off/on enum
fn is_switch(members: &[EnumMember]) -> bool {
    members.len() == 2
        && members.iter().any(|m| m.label == "off")
        && members.iter().any(|m| m.label == "on")
}

fn shape(value: &ControlValue) -> &'static str {
    match value {
        ControlValue::Level(_) => "level",
        ControlValue::Ord(_) => "ordinal",
        ControlValue::Mask(_) => "mask",
    }
}

fn expect_level(index: usize, value: ControlValue) -> Result<Level, MixerError> {
    match value {
        ControlValue::Level(level) => Ok(level),
        other => Err(MixerError::UnexpectedValue {
            index,
            expected: "level",
            found: shape(&other),
        }),
    }
}

fn expect_ord(index: usize, value: ControlValue) -> Result<u32, MixerError> {
    match value {
        ControlValue::Ord(ord) => Ok(ord),
        other => Err(MixerError::UnexpectedValue {
            index,
            expected: "ordinal",
            found: shape(&other),
        }),
    }
}

fn expect_mask(index: usize, value: ControlValue) -> Result<u32, MixerError> {
    match value {
        ControlValue::Mask(mask) => Ok(mask),
        other => Err(MixerError::UnexpectedValue {
            index,
            expected: "mask",
            found: shape(&other),
        }),
    }
}
