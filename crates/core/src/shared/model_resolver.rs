use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::APP_DIR_NAME;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create cache directory {path}: {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("download of {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't send Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

const READ_CHUNK: usize = 256 * 1024;

/// Resolve a model file by name.
///
/// Looks in the user cache directory, then `bundled_dir`, and finally
/// downloads `url` into the cache.
pub fn resolve(
    name: &str,
    url: &str,
    bundled_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    resolve_in(&model_cache_dir()?, name, url, bundled_dir, progress)
}

/// [`resolve`] against an explicit cache directory.
pub fn resolve_in(
    cache_dir: &Path,
    name: &str,
    url: &str,
    bundled_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    let cached = cache_dir.join(name);
    if cached.is_file() {
        log::debug!("Model {name} found in cache at {}", cached.display());
        return Ok(cached);
    }

    if let Some(bundled) = bundled_dir.map(|dir| dir.join(name)).filter(|p| p.is_file()) {
        log::debug!("Model {name} found in bundle at {}", bundled.display());
        return Ok(bundled);
    }

    fs::create_dir_all(cache_dir).map_err(|source| ModelResolveError::CacheDir {
        path: cache_dir.to_path_buf(),
        source,
    })?;
    log::info!("Downloading {name} from {url}");
    download(url, &cached, progress)?;
    Ok(cached)
}

/// Platform model cache directory, e.g. `~/.cache/FrameScout/models` on Linux.
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    let base = dirs::data_dir();
    #[cfg(not(target_os = "macos"))]
    let base = dirs::cache_dir();

    base.map(|d| d.join(APP_DIR_NAME).join("models"))
        .ok_or(ModelResolveError::NoCacheDir)
}

/// Streams `url` into `<dest>.part` and renames it into place once complete,
/// so an interrupted download never leaves a truncated model behind.
fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let download_err = |source| ModelResolveError::Download {
        url: url.to_string(),
        source,
    };

    let mut response = reqwest::blocking::get(url).map_err(download_err)?;
    if !response.status().is_success() {
        return Err(ModelResolveError::Status {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }
    let total = response.content_length().unwrap_or(0);

    let part_path = dest.with_extension("part");
    let write_err = |source| ModelResolveError::Write {
        path: part_path.clone(),
        source,
    };

    let result = (|| {
        let mut file = fs::File::create(&part_path).map_err(write_err)?;
        let mut buf = vec![0u8; READ_CHUNK];
        let mut downloaded = 0u64;
        loop {
            let n = response.read(&mut buf).map_err(write_err)?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n]).map_err(write_err)?;
            downloaded += n as u64;
            if let Some(cb) = progress.as_ref() {
                cb(downloaded, total);
            }
        }
        file.flush().map_err(write_err)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&part_path);
        return Err(e);
    }

    fs::rename(&part_path, dest).map_err(|source| ModelResolveError::Write {
        path: dest.to_path_buf(),
        source,
    })
}
