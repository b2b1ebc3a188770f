use crate::{control::ControlHandle, device::ClassId};

/// A hardware class and the controls grouped under it
#[derive(Clone, Debug, PartialEq)]
pub struct MixerClass {
    id: ClassId,
    label: String,
    members: Vec<ControlHandle>,
    visible: bool,
}

impl MixerClass {
    pub fn new(id: ClassId, label: &str) -> Self {
        Self {
            id,
            label: label.to_string(),
            members: Vec::new(),
            visible: true,
        }
    }

    pub fn id(&self) -> ClassId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Page title: the label with its first letter capitalised
    pub fn title(&self) -> String {
        let mut chars = self.label.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    pub fn members(&self) -> &[ControlHandle] {
        &self.members
    }

    /// A class only gets a container once it holds a control
    pub fn is_populated(&self) -> bool {
        !self.members.is_empty()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub(crate) fn push(&mut self, handle: ControlHandle) {
        self.members.push(handle);
    }
}
