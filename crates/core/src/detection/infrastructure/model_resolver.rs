use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::APP_DIR_NAME;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("model file not found: {0}")]
    NotFound(PathBuf),
    #[error("model {name} not found in {dir}")]
    NotCached { name: String, dir: PathBuf },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Resolve a model file by name.
///
/// Resolution order:
/// 1. Explicit path (must exist)
/// 2. User cache directory (platform-specific)
pub fn resolve(name: &str, explicit: Option<&Path>) -> Result<PathBuf, ModelResolveError> {
    if let Some(path) = explicit {
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(ModelResolveError::NotFound(path.to_path_buf()))
        };
    }
    resolve_in(name, &model_cache_dir()?)
}

fn resolve_in(name: &str, dir: &Path) -> Result<PathBuf, ModelResolveError> {
    let cached_path = dir.join(name);
    if cached_path.is_file() {
        log::debug!("Using cached model {}", cached_path.display());
        Ok(cached_path)
    } else {
        Err(ModelResolveError::NotCached {
            name: name.to_string(),
            dir: dir.to_path_buf(),
        })
    }
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/LiveGate/models/`
/// - Linux: `$XDG_CACHE_HOME/LiveGate/models/` or `~/.cache/LiveGate/models/`
/// - Windows: `%LOCALAPPDATA%/LiveGate/models/`
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
