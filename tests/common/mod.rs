#![allow(dead_code)]

use mixerctl::{
    control::{Channels, Control, ControlHandle, Key, Value},
    device::{
        netbsd, oss, ClassId, ControlValue, Descriptor, DescriptorKind, EnumMember, Level,
        MutePolarity, Probe, Properties, SetMember, Transport,
    },
    error::MixerError,
    mixer::{Layout, Mixer, REFRESH_INTERVAL},
};
use nix::errno::Errno;
use std::{
    cell::RefCell,
    collections::{BTreeMap, HashSet},
    io,
    path::Path,
    rc::Rc,
};

/// State shared between a test and the mixer it drives
#[derive(Default)]
pub struct StubDevice {
    pub descriptors: Vec<Descriptor>,
    pub values: BTreeMap<usize, ControlValue>,
    pub writes: Vec<(usize, ControlValue)>,
    pub reads: usize,
    pub failing: HashSet<usize>,
    pub broken: bool,
}

#[derive(Clone)]
pub struct StubTransport {
    device: Rc<RefCell<StubDevice>>,
    polarity: MutePolarity,
    classes: bool,
}

impl StubTransport {
    /// Behaves like the NetBSD backend
    pub fn classed() -> Self {
        Self {
            device: Default::default(),
            polarity: netbsd::MUTE_POLARITY,
            classes: true,
        }
    }

    /// Behaves like the OSS backend
    pub fn flat() -> Self {
        Self {
            device: Default::default(),
            polarity: oss::MUTE_POLARITY,
            classes: false,
        }
    }

    pub fn add(&self, descriptor: Descriptor, value: Option<ControlValue>) -> &Self {
        let mut dev = self.device.borrow_mut();
        if let Some(v) = value {
            dev.values.insert(descriptor.index, v);
        }
        dev.descriptors.push(descriptor);
        self
    }

    /// Change a value behind the mixer's back
    pub fn poke(&self, index: usize, value: ControlValue) {
        self.device.borrow_mut().values.insert(index, value);
    }

    pub fn value(&self, index: usize) -> Option<ControlValue> {
        self.device.borrow().values.get(&index).cloned()
    }

    pub fn fail(&self, index: usize) {
        self.device.borrow_mut().failing.insert(index);
    }

    pub fn heal(&self, index: usize) {
        self.device.borrow_mut().failing.remove(&index);
    }

    pub fn break_enumeration(&self) {
        self.device.borrow_mut().broken = true;
    }

    pub fn writes(&self) -> Vec<(usize, ControlValue)> {
        self.device.borrow().writes.clone()
    }

    pub fn clear_writes(&self) {
        self.device.borrow_mut().writes.clear();
    }

    pub fn reads(&self) -> usize {
        self.device.borrow().reads
    }
}

impl Transport for StubTransport {
    fn open(path: &Path) -> Result<Self, MixerError> {
        Err(MixerError::DeviceUnavailable {
            path: path.to_path_buf(),
            source: io::Error::from(io::ErrorKind::NotFound),
        })
    }

    fn probe(&self, index: usize) -> Result<Probe, MixerError> {
        let dev = self.device.borrow();
        let enumerate = |source| MixerError::Enumerate {
            op: "STUB_PROBE",
            source,
        };
        if dev.broken {
            return Err(enumerate(Errno::EIO));
        }
        if let Some(d) = dev.descriptors.iter().find(|d| d.index == index) {
            return Ok(Probe::Control(d.clone()));
        }
        let last = dev.descriptors.iter().map(|d| d.index).max().unwrap_or(0);
        match (index <= last, self.classes) {
            (true, _) => Ok(Probe::Vacant),
            // the class-based driver signals the end with an error
            (false, true) => Err(enumerate(Errno::ENXIO)),
            (false, false) => Ok(Probe::End),
        }
    }

    fn read(&self, index: usize, _channels: Option<usize>) -> Result<ControlValue, MixerError> {
        let mut dev = self.device.borrow_mut();
        dev.reads += 1;
        let failed = |source| MixerError::ReadFailed {
            op: "STUB_READ",
            index,
            source,
        };
        if dev.failing.contains(&index) {
            return Err(failed(Errno::EIO));
        }
        dev.values.get(&index).cloned().ok_or_else(|| failed(Errno::ENXIO))
    }

    fn write(&mut self, index: usize, value: &ControlValue) -> Result<(), MixerError> {
        let mut dev = self.device.borrow_mut();
        if dev.failing.contains(&index) {
            return Err(MixerError::WriteFailed {
                op: "STUB_WRITE",
                index,
                source: Errno::EIO,
            });
        }
        dev.writes.push((index, value.clone()));
        dev.values.insert(index, value.clone());
        Ok(())
    }

    fn properties(&self) -> Result<Properties, MixerError> {
        Ok(Properties {
            name: "stub".into(),
            version: "1.0".into(),
            device: "/dev/stub".into(),
        })
    }

    fn mute_polarity(&self) -> MutePolarity {
        self.polarity
    }

    fn has_classes(&self) -> bool {
        self.classes
    }
}

pub fn class(index: usize, label: &str) -> Descriptor {
    Descriptor {
        index,
        class: index as ClassId,
        name: label.into(),
        label: label.into(),
        kind: DescriptorKind::Class,
    }
}

pub fn value(index: usize, class: ClassId, label: &str, channels: usize) -> Descriptor {
    Descriptor {
        index,
        class,
        name: label.into(),
        label: label.into(),
        kind: DescriptorKind::Value { channels, delta: 1 },
    }
}

pub fn switch(index: usize, class: ClassId, label: &str) -> Descriptor {
    radio(index, class, label, &[("off", 0), ("on", 1)])
}

pub fn radio(index: usize, class: ClassId, label: &str, members: &[(&str, u32)]) -> Descriptor {
    Descriptor {
        index,
        class,
        name: label.into(),
        label: label.into(),
        kind: DescriptorKind::Enum(
            members
                .iter()
                .map(|(l, ord)| EnumMember {
                    label: l.to_string(),
                    ord: *ord,
                })
                .collect(),
        ),
    }
}

pub fn set(index: usize, class: ClassId, label: &str, members: &[(&str, u32)]) -> Descriptor {
    Descriptor {
        index,
        class,
        name: label.into(),
        label: label.into(),
        kind: DescriptorKind::Set(
            members
                .iter()
                .map(|(l, mask)| SetMember {
                    label: l.to_string(),
                    mask: *mask,
                })
                .collect(),
        ),
    }
}

pub fn level(channels: &[u8]) -> ControlValue {
    ControlValue::Level(Level {
        channels: channels.to_vec(),
        delta: 1,
    })
}

pub fn mixer(t: &StubTransport) -> Mixer<StubTransport> {
    mixer_with(t, Layout::Horizontal)
}

pub fn mixer_with(t: &StubTransport, layout: Layout) -> Mixer<StubTransport> {
    Mixer::with_transport(t.clone(), "/dev/stub", layout, REFRESH_INTERVAL).unwrap()
}

pub fn get(m: &Mixer<StubTransport>, h: ControlHandle, key: Key) -> Value {
    m.control(h).unwrap().control().get_one(key).unwrap()
}

pub fn control_mut<'m>(m: &'m mut Mixer<StubTransport>, id: &str) -> &'m mut Control {
    let h = m.find(id).unwrap_or_else(|| panic!("no control {}", id));
    m.control_mut(h).unwrap().control_mut()
}

pub fn channels_mut<'m>(m: &'m mut Mixer<StubTransport>, id: &str) -> &'m mut Channels {
    match control_mut(m, id) {
        Control::Channels(c) => c,
        other => panic!("{} is a {} control", id, other.kind()),
    }
}

/// Wire levels currently held by a channels control
pub fn levels(m: &Mixer<StubTransport>, id: &str) -> Vec<u8> {
    let h = m.find(id).unwrap();
    match m.control(h).unwrap().control() {
        Control::Channels(c) => (0..c.channels())
            .map(|i| c.slider(i).unwrap().wire())
            .collect(),
        other => panic!("{} is a {} control", id, other.kind()),
    }
}

/// Display levels currently shown by a channels control
pub fn displayed(m: &Mixer<StubTransport>, id: &str) -> Vec<u8> {
    let h = m.find(id).unwrap();
    match m.control(h).unwrap().control() {
        Control::Channels(c) => (0..c.channels())
            .map(|i| c.slider(i).unwrap().display())
            .collect(),
        other => panic!("{} is a {} control", id, other.kind()),
    }
}
