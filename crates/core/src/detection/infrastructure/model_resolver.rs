use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::detection::domain::artifact_loader::{ArtifactLoader, LoadError};
use crate::detection::domain::model_artifact::ModelArtifact;
use crate::shared::constants::APP_DIR_NAME;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model file not found: {0}")]
    Missing(PathBuf),
    #[error("invalid weights manifest {path}: {reason}")]
    Manifest { path: PathBuf, reason: String },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Where model manifests and weight shards are fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    Directory(PathBuf),
    Remote(String),
}

impl ModelSource {
    pub fn parse(base: &str) -> Self {
        if base.starts_with("http://") || base.starts_with("https://") {
            ModelSource::Remote(base.trim_end_matches('/').to_string())
        } else {
            ModelSource::Directory(PathBuf::from(base))
        }
    }
}

#[derive(Deserialize)]
struct WeightGroup {
    paths: Vec<String>,
}

/// Resolves a model's weights manifest and every shard it references.
///
/// Local directories are used in place. Remote bases are mirrored into the
/// cache directory; files already cached are not downloaded again.
pub struct ModelResolver {
    source: ModelSource,
    cache_dir: PathBuf,
}

impl ModelResolver {
    pub fn new(base: &str) -> Result<Self, ModelResolveError> {
        Ok(Self::with_cache_dir(base, model_cache_dir()?))
    }

    pub fn with_cache_dir(base: &str, cache_dir: PathBuf) -> Self {
        Self {
            source: ModelSource::parse(base),
            cache_dir,
        }
    }

    /// Returns the local path of the artifact's manifest once the manifest
    /// and all of its shards are available.
    pub fn resolve(&self, artifact: ModelArtifact) -> Result<PathBuf, ModelResolveError> {
        let manifest_name = artifact.manifest_file();
        let manifest_path = self.fetch(&manifest_name)?;
        for shard in shard_paths(&manifest_path)? {
            self.fetch(&shard)?;
        }
        Ok(manifest_path)
    }

    fn fetch(&self, name: &str) -> Result<PathBuf, ModelResolveError> {
        match &self.source {
            ModelSource::Directory(dir) => {
                let path = dir.join(name);
                if path.is_file() {
                    Ok(path)
                } else {
                    Err(ModelResolveError::Missing(path))
                }
            }
            ModelSource::Remote(base) => {
                let cached_path = self.cache_dir.join(name);
                if cached_path.exists() {
                    return Ok(cached_path);
                }
                fs::create_dir_all(&self.cache_dir).map_err(ModelResolveError::CacheDir)?;
                download(&format!("{base}/{name}"), &cached_path)?;
                Ok(cached_path)
            }
        }
    }
}

impl ArtifactLoader for ModelResolver {
    fn load(&self, artifact: ModelArtifact) -> Result<PathBuf, LoadError> {
        let path = self.resolve(artifact)?;
        log::debug!("Resolved {artifact} at {}", path.display());
        Ok(path)
    }
}

/// Shard file names listed by a weights manifest, in manifest order.
fn shard_paths(manifest_path: &Path) -> Result<Vec<String>, ModelResolveError> {
    let invalid = |reason: String| ModelResolveError::Manifest {
        path: manifest_path.to_path_buf(),
        reason,
    };
    let json = fs::read_to_string(manifest_path).map_err(|e| invalid(e.to_string()))?;
    let groups: Vec<WeightGroup> = serde_json::from_str(&json).map_err(|e| invalid(e.to_string()))?;
    let shards: Vec<String> = groups.into_iter().flat_map(|g| g.paths).collect();
    if shards.iter().any(|s| s.contains("..") || Path::new(s).is_absolute()) {
        return Err(invalid("shard path escapes the model directory".into()));
    }
    Ok(shards)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/MoodLens/models/`
/// - Linux: `$XDG_CACHE_HOME/MoodLens/models/` or `~/.cache/MoodLens/models/`
/// - Windows: `%LOCALAPPDATA%/MoodLens/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join(APP_DIR_NAME).join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join(APP_DIR_NAME).join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}

fn download(url: &str, dest: &Path) -> Result<(), ModelResolveError> {
    let temp_path = dest.with_extension("part");

    let result = download_inner(url, dest, &temp_path);
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn download_inner(url: &str, dest: &Path, temp_path: &Path) -> Result<(), ModelResolveError> {
    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| ModelResolveError::Download {
            url: url.to_string(),
            source: e,
        })?;

    let write_err = |path: &Path, e: std::io::Error| ModelResolveError::Write {
        path: path.to_path_buf(),
        source: e,
    };

    let mut file = fs::File::create(temp_path).map_err(|e| write_err(temp_path, e))?;
    let mut buf = vec![0u8; 256 * 1024];
    loop {
        let n = response.read(&mut buf).map_err(|e| write_err(temp_path, e))?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])
            .map_err(|e| write_err(temp_path, e))?;
    }
    file.flush().map_err(|e| write_err(temp_path, e))?;
    drop(file);

    fs::rename(temp_path, dest).map_err(|e| write_err(dest, e))
}
