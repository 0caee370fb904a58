use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    VideoInput,
    AudioInput,
    AudioOutput,
}

/// A media device as reported by the camera source.
///
/// `id` is opaque and stable for the session. `label` may be empty until
/// camera permission has been granted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub id: String,
    pub label: String,
    pub kind: DeviceKind,
}

impl DeviceDescriptor {
    pub fn camera(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind: DeviceKind::VideoInput,
        }
    }

    pub fn is_camera(&self) -> bool {
        self.kind == DeviceKind::VideoInput
    }

    /// Label for status messages; falls back to "Default" when unlabeled.
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            "Default"
        } else {
            &self.label
        }
    }
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_label(), self.id)
    }
}
