use std::io::{Read as _, Write as _};
use std::process::{Command, Stdio};

use crate::assets::decode::{decode_image, is_heif, sniff_format};
use crate::config::service::TranscoderConfig;
use crate::foundation::core::{JPEG_QUALITY, Rgba8};
use crate::foundation::error::{PhotoframeError, PhotoframeResult};
use crate::render::encode::encode_jpeg;

/// Converts photo bytes the image codec cannot read into JPEG bytes.
///
/// Implementations must be deterministic in how they fail: any input they
/// cannot handle yields an error, never partial output.
pub trait Transcoder: Send + Sync {
    /// Transcode `bytes` to a JPEG.
    fn transcode(&self, bytes: &[u8]) -> PhotoframeResult<Vec<u8>>;
}

/// [`Transcoder`] that pipes the source through an external program
/// (stdin -> stdout), e.g. `magick - jpeg:-`.
#[derive(Clone, Debug)]
pub struct CommandTranscoder {
    program: String,
    args: Vec<String>,
}

impl CommandTranscoder {
    /// Build a transcoder spawning `program` with `args`.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build from configuration.
    pub fn from_config(cfg: &TranscoderConfig) -> Self {
        Self::new(cfg.program.clone(), cfg.args.clone())
    }
}

impl Transcoder for CommandTranscoder {
    fn transcode(&self, bytes: &[u8]) -> PhotoframeResult<Vec<u8>> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                PhotoframeError::decode(format!(
                    "failed to spawn transcoder '{}': {e}",
                    self.program
                ))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| PhotoframeError::decode("failed to open transcoder stdin"))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| PhotoframeError::decode("failed to open transcoder stdout"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| PhotoframeError::decode("failed to open transcoder stderr"))?;

        let input = bytes.to_vec();
        let feeder = std::thread::spawn(move || stdin.write_all(&input));
        let stderr_drain = std::thread::spawn(move || {
            let mut buf = Vec::new();
            stderr.read_to_end(&mut buf).map(|_| buf)
        });

        let mut out = Vec::new();
        let read = stdout.read_to_end(&mut out);
        let status = child
            .wait()
            .map_err(|e| PhotoframeError::decode(format!("failed to wait for transcoder: {e}")))?;
        // A transcoder may exit before consuming all input; its exit status decides.
        let _ = feeder.join();
        let stderr_bytes = stderr_drain
            .join()
            .map_err(|_| PhotoframeError::decode("transcoder stderr drain thread panicked"))?
            .unwrap_or_default();

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(PhotoframeError::decode(format!(
                "transcoder exited with status {status}: {}",
                stderr.trim()
            )));
        }
        read.map_err(|e| PhotoframeError::decode(format!("transcoder stdout read failed: {e}")))?;
        if sniff_format(&out) != Some(image::ImageFormat::Jpeg) {
            return Err(PhotoframeError::decode("transcoder did not produce a JPEG"));
        }
        Ok(out)
    }
}

fn has_heif_extension(file_name: &str) -> bool {
    let lower = file_name.to_ascii_lowercase();
    lower.ends_with(".heic") || lower.ends_with(".heif")
}

/// Convert an uploaded photo to a JPEG at [`JPEG_QUALITY`] for client-side preview.
///
/// HEIF sources (by file name or content) go through `transcoder` first; on
/// failure, or for every other format, the image codec decodes the source and
/// it is re-encoded flattened over black.
pub fn convert_to_jpeg(
    bytes: &[u8],
    file_name: Option<&str>,
    transcoder: Option<&dyn Transcoder>,
) -> PhotoframeResult<Vec<u8>> {
    let heif = file_name.is_some_and(has_heif_extension) || is_heif(bytes);
    if heif && let Some(t) = transcoder {
        match t.transcode(bytes) {
            Ok(jpeg) => return Ok(jpeg),
            Err(err) => tracing::warn!(error = %err, "heif transcode failed, trying image codec"),
        }
    }
    let surface = decode_image(bytes)?;
    encode_jpeg(&surface, Rgba8::opaque(0, 0, 0), JPEG_QUALITY)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/transcode.rs"]
mod tests;
