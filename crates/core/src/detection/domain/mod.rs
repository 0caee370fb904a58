pub mod artifact_loader;
pub mod face_analyzer;
pub mod face_observation;
pub mod model_artifact;
