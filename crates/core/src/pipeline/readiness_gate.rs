use std::path::PathBuf;

use crate::detection::domain::artifact_loader::ArtifactLoader;
use crate::detection::domain::model_artifact::ModelArtifact;
use crate::shared::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Readiness {
    #[default]
    Pending,
    Loading,
    Ready,
    Failed,
}

/// Tracks whether every detector artifact has been loaded.
///
/// Loading is all-or-nothing and never retried on its own: after a failure
/// the gate stays closed until [`ModelReadinessGate::load_all`] is called
/// again.
pub struct ModelReadinessGate {
    readiness: Readiness,
    loaded: Vec<(ModelArtifact, PathBuf)>,
}

impl Default for ModelReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelReadinessGate {
    pub fn new() -> Self {
        Self {
            readiness: Readiness::Pending,
            loaded: Vec::new(),
        }
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    pub fn is_ready(&self) -> bool {
        self.readiness == Readiness::Ready
    }

    pub fn loaded(&self) -> &[(ModelArtifact, PathBuf)] {
        &self.loaded
    }

    /// Loads all artifacts concurrently, one thread each.
    ///
    /// When several loads fail, the error reported is the first failing
    /// artifact in [`ModelArtifact::ALL`] order.
    pub fn load_all(&mut self, loader: &dyn ArtifactLoader) -> Result<(), PipelineError> {
        self.readiness = Readiness::Loading;
        self.loaded.clear();

        let results: Vec<(ModelArtifact, Result<PathBuf, String>)> = std::thread::scope(|s| {
            let handles: Vec<_> = ModelArtifact::ALL
                .iter()
                .map(|&artifact| (artifact, s.spawn(move || loader.load(artifact))))
                .collect();
            handles
                .into_iter()
                .map(|(artifact, handle)| {
                    let result = match handle.join() {
                        Ok(Ok(path)) => Ok(path),
                        Ok(Err(e)) => Err(e.to_string()),
                        Err(_) => Err("loader panicked".to_string()),
                    };
                    (artifact, result)
                })
                .collect()
        });

        let mut loaded = Vec::with_capacity(results.len());
        for (artifact, result) in results {
            match result {
                Ok(path) => loaded.push((artifact, path)),
                Err(cause) => {
                    log::error!("Failed to load model {artifact}: {cause}");
                    self.readiness = Readiness::Failed;
                    return Err(PipelineError::ModelLoad { artifact, cause });
                }
            }
        }

        self.loaded = loaded;
        self.readiness = Readiness::Ready;
        log::info!("All {} models loaded", self.loaded.len());
        Ok(())
    }
}
