pub mod capture_compositor;
pub mod detection_scheduler;
pub mod device_catalog;
pub mod pipeline_controller;
pub mod pipeline_event;
pub mod pipeline_state;
pub mod readiness_gate;
pub mod result_fanout;
pub mod stream_manager;

#[cfg(test)]
pub(crate) mod test_support;
