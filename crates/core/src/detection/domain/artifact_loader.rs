use std::path::PathBuf;

use crate::detection::domain::model_artifact::ModelArtifact;

pub type LoadError = Box<dyn std::error::Error + Send + Sync>;

/// Loads one detector artifact and returns where its weights live.
///
/// Called concurrently for all artifacts, so implementations must be `Sync`.
pub trait ArtifactLoader: Send + Sync {
    fn load(&self, artifact: ModelArtifact) -> Result<PathBuf, LoadError>;
}
