pub mod camera_source;
pub mod device_descriptor;
