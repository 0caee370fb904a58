pub mod analytics;
pub mod camera;
pub mod detection;
pub mod export;
pub mod pipeline;
pub mod shared;
