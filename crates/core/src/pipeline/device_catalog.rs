use crate::camera::domain::camera_source::CameraSource;
use crate::camera::domain::device_descriptor::DeviceDescriptor;
use crate::shared::error::PipelineError;

/// Known camera devices and the default-selection policy.
pub struct DeviceCatalog {
    devices: Vec<DeviceDescriptor>,
    preferred_label: String,
}

impl DeviceCatalog {
    pub fn new(preferred_label: impl Into<String>) -> Self {
        Self {
            devices: Vec::new(),
            preferred_label: preferred_label.into(),
        }
    }

    /// Probes permission once, then replaces the catalog with the camera
    /// devices the source reports. Non-camera devices are dropped.
    pub fn discover(&mut self, source: &mut dyn CameraSource) -> Result<usize, PipelineError> {
        source
            .request_permission()
            .map_err(|e| PipelineError::PermissionDenied(e.to_string()))?;
        let devices = source
            .enumerate_devices()
            .map_err(|e| PipelineError::PermissionDenied(e.to_string()))?;

        self.devices = devices.into_iter().filter(|d| d.is_camera()).collect();
        log::info!("Discovered {} camera(s)", self.devices.len());
        for device in &self.devices {
            log::debug!("  {device}");
        }
        Ok(self.devices.len())
    }

    pub fn devices(&self) -> &[DeviceDescriptor] {
        &self.devices
    }

    pub fn find(&self, id: &str) -> Option<&DeviceDescriptor> {
        self.devices.iter().find(|d| d.id == id)
    }

    /// First device whose label contains the preferred substring
    /// (case-insensitive), else the first device.
    pub fn select_default(&self) -> Result<&DeviceDescriptor, PipelineError> {
        let needle = self.preferred_label.to_lowercase();
        let preferred = if needle.is_empty() {
            None
        } else {
            self.devices
                .iter()
                .find(|d| d.label.to_lowercase().contains(&needle))
        };
        preferred
            .or_else(|| self.devices.first())
            .ok_or(PipelineError::NoDeviceFound)
    }

    /// Keeps `previous` when it is still present, otherwise falls back to
    /// [`DeviceCatalog::select_default`].
    pub fn select_preserving(&self, previous: Option<&str>) -> Result<&DeviceDescriptor, PipelineError> {
        match previous.and_then(|id| self.find(id)) {
            Some(device) => Ok(device),
            None => self.select_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::test_support::FakeCamera;
    use rstest::rstest;

    fn discovered(labels: &[(&str, &str)], preferred: &str) -> DeviceCatalog {
        let mut catalog = DeviceCatalog::new(preferred);
        catalog
            .discover(&mut FakeCamera::with_labels(labels))
            .unwrap();
        catalog
    }

    #[rstest]
    #[case::preferred_later(&[("a", "FaceTime HD"), ("b", "Ali's iPhone Camera")], "b")]
    #[case::case_insensitive(&[("a", "Webcam"), ("b", "IPHONE")], "b")]
    #[case::fallback_first(&[("a", "Webcam"), ("b", "USB Camera")], "a")]
    #[case::empty_labels(&[("a", ""), ("b", "")], "a")]
    fn test_select_default(#[case] labels: &[(&str, &str)], #[case] expected: &str) {
        let catalog = discovered(labels, "iphone");
        assert_eq!(catalog.select_default().unwrap().id, expected);
    }

    #[test]
    fn test_empty_catalog_has_no_device() {
        let catalog = discovered(&[], "iphone");
        assert!(matches!(catalog.select_default(), Err(PipelineError::NoDeviceFound)));
    }

    #[test]
    fn test_non_camera_devices_are_filtered() {
        let mut catalog = DeviceCatalog::new("iphone");
        let count = catalog.discover(&mut FakeCamera::two_cameras()).unwrap();
        assert_eq!(count, 2);
        assert!(catalog.find("mic").is_none());
    }

    #[test]
    fn test_permission_denied() {
        let mut camera = FakeCamera::two_cameras();
        camera.deny_permission = true;
        let mut catalog = DeviceCatalog::new("iphone");
        assert!(matches!(
            catalog.discover(&mut camera),
            Err(PipelineError::PermissionDenied(_))
        ));
        assert!(catalog.devices().is_empty());
    }

    #[test]
    fn test_rediscovery_is_idempotent() {
        let mut catalog = DeviceCatalog::new("iphone");
        let mut camera = FakeCamera::two_cameras();
        catalog.discover(&mut camera).unwrap();
        let first = catalog.devices().to_vec();
        catalog.discover(&mut camera).unwrap();
        assert_eq!(catalog.devices(), first.as_slice());
    }

    #[test]
    fn test_select_preserving_keeps_present_device() {
        let catalog = discovered(&[("a", "Webcam"), ("b", "iPhone")], "iphone");
        assert_eq!(catalog.select_preserving(Some("a")).unwrap().id, "a");
        assert_eq!(catalog.select_preserving(Some("gone")).unwrap().id, "b");
        assert_eq!(catalog.select_preserving(None).unwrap().id, "b");
    }
}
