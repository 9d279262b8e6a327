use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::{PhotoframeError, PhotoframeResult};

/// External command used to transcode legacy photo formats to JPEG.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TranscoderConfig {
    /// Program to spawn.
    pub program: String,
    /// Arguments; the program reads the source on stdin and writes JPEG to stdout.
    #[serde(default)]
    pub args: Vec<String>,
}

/// Settings for running the HTTP service.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Socket address to listen on.
    pub listen: String,
    /// Directory holding the blob store.
    pub data_dir: PathBuf,
    /// Externally visible base URL; blob URLs are `<base>/blobs/<key>`.
    pub public_base_url: String,
    /// Admin user name for Basic auth.
    pub admin_id: String,
    /// Admin password for Basic auth. Basic auth is disabled when unset.
    pub admin_password: Option<String>,
    /// Static bearer token for admin endpoints. Disabled when unset.
    pub admin_token: Option<String>,
    /// Worker threads; `None` uses the available parallelism.
    pub workers: Option<usize>,
    /// Largest accepted request body, in bytes.
    pub max_body_bytes: usize,
    /// Optional legacy-format transcoder.
    pub transcoder: Option<TranscoderConfig>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8080".to_string(),
            data_dir: PathBuf::from("data"),
            public_base_url: "http://127.0.0.1:8080".to_string(),
            admin_id: "admin".to_string(),
            admin_password: None,
            admin_token: None,
            workers: None,
            max_body_bytes: 32 * 1024 * 1024,
            transcoder: None,
        }
    }
}

impl ServiceConfig {
    /// Load a JSON config file; absent fields take their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> PhotoframeResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_str(&text)
            .map_err(|e| PhotoframeError::serde(format!("config '{}': {e}", path.display())))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> PhotoframeResult<()> {
        if self.max_body_bytes == 0 {
            return Err(PhotoframeError::bad_input("max_body_bytes must be > 0"));
        }
        if self.workers == Some(0) {
            return Err(PhotoframeError::bad_input("workers must be > 0"));
        }
        if self.admin_id.is_empty() {
            return Err(PhotoframeError::bad_input("admin_id must be non-empty"));
        }
        Ok(())
    }

    /// URL prefix of blobs served by `GET /blobs/<key>`.
    pub fn blob_base_url(&self) -> String {
        format!("{}/blobs", self.public_base_url.trim_end_matches('/'))
    }

    /// Worker thread count after applying the default.
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/service.rs"]
mod tests;
