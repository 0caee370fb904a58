pub mod detection_log;
pub mod frame_subscriber;
pub mod live_snapshot;
pub mod overlay_state;
pub mod session_aggregate;
