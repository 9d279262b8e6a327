//! Transport-independent request handler for the photo-frame HTTP surface.

use std::sync::Arc;
use std::time::Instant;

use crate::assets::templates::TemplateAssetStore;
use crate::assets::transcode::{CommandTranscoder, Transcoder, convert_to_jpeg};
use crate::config::layout_store::LayoutConfigStore;
use crate::config::service::ServiceConfig;
use crate::foundation::core::{LayoutRect, TemplateRole};
use crate::foundation::error::{PhotoframeError, PhotoframeResult};
use crate::render::compositor::Compositor;
use crate::service::auth::{AuthGate, CredentialsGate};
use crate::service::data_url::{decode_data_url, encode_data_url};
use crate::service::multipart::FormData;
use crate::settings::accessor::SettingsAccessor;
use crate::storage::blob::{BlobStore, normalize_key};

/// File name offered for generated images.
pub const GENERATED_FILE_NAME: &str = "photoframe.jpg";

/// A request as seen by [`PhotoframeApi`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApiRequest {
    /// HTTP method, e.g. `GET`.
    pub method: String,
    /// Request target; any query string is ignored for routing.
    pub path: String,
    /// Header name/value pairs in arrival order.
    pub headers: Vec<(String, String)>,
    /// Raw body.
    pub body: Vec<u8>,
}

impl ApiRequest {
    /// Request without headers or body.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Append a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Replace the body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// First header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn route(&self) -> &str {
        self.path.split(['?', '#']).next().unwrap_or_default()
    }
}

/// A response produced by [`PhotoframeApi`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// `Content-Type` of `body`.
    pub content_type: String,
    /// Extra headers.
    pub headers: Vec<(String, String)>,
    /// Body bytes.
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Raw body with the given content type.
    pub fn bytes(status: u16, content_type: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            status,
            content_type: content_type.into(),
            headers: Vec::new(),
            body,
        }
    }

    /// JSON body.
    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        Self::bytes(status, "application/json", value.to_string().into_bytes())
    }

    /// `{"error": message}` body.
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self::json(status, &serde_json::json!({ "error": message }))
    }

    /// Append a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        if name.eq_ignore_ascii_case("content-type") {
            return Some(self.content_type.as_str());
        }
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigBody {
    user_image_area: Option<LayoutRect>,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateBody {
    user_image: Option<String>,
}

/// Stateless handler for every route of the service.
///
/// Each call reads configuration fresh from the blob store; nothing about a
/// request outlives it.
#[derive(Clone)]
pub struct PhotoframeApi {
    store: Arc<dyn BlobStore>,
    templates: TemplateAssetStore,
    layouts: LayoutConfigStore,
    settings: SettingsAccessor,
    compositor: Compositor,
    gate: Arc<dyn AuthGate>,
    transcoder: Option<Arc<dyn Transcoder>>,
    max_body_bytes: usize,
}

impl PhotoframeApi {
    /// Handler over `store`, guarding admin routes with `gate`.
    pub fn new(store: Arc<dyn BlobStore>, gate: Arc<dyn AuthGate>) -> Self {
        Self {
            templates: TemplateAssetStore::new(store.clone()),
            layouts: LayoutConfigStore::new(store.clone()),
            settings: SettingsAccessor::new(store.clone()),
            store,
            compositor: Compositor::default(),
            gate,
            transcoder: None,
            max_body_bytes: ServiceConfig::default().max_body_bytes,
        }
    }

    /// Handler wired from a service config: credentials gate, transcoder and body limit.
    pub fn from_config(cfg: &ServiceConfig, store: Arc<dyn BlobStore>) -> Self {
        let gate = CredentialsGate::from_config(cfg);
        if !gate.is_configured() {
            tracing::warn!("no admin password or token configured, admin routes are disabled");
        }
        let mut api = Self::new(store, Arc::new(gate)).with_max_body_bytes(cfg.max_body_bytes);
        if let Some(t) = &cfg.transcoder {
            api = api.with_transcoder(Arc::new(CommandTranscoder::from_config(t)));
        }
        api
    }

    /// Route legacy photo formats through `transcoder`.
    pub fn with_transcoder(mut self, transcoder: Arc<dyn Transcoder>) -> Self {
        self.compositor = self.compositor.with_transcoder(transcoder.clone());
        self.transcoder = Some(transcoder);
        self
    }

    /// Replace the compositor, keeping any configured transcoder.
    pub fn with_compositor(mut self, compositor: Compositor) -> Self {
        self.compositor = match &self.transcoder {
            Some(t) => compositor.with_transcoder(t.clone()),
            None => compositor,
        };
        self
    }

    /// Reject bodies larger than `limit` bytes with 413.
    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Largest accepted body, in bytes.
    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    /// Dispatch `req` and produce its response. Never panics on bad input.
    pub fn handle(&self, req: &ApiRequest) -> ApiResponse {
        let started = Instant::now();
        let response = self.dispatch(req);
        tracing::debug!(
            method = %req.method,
            path = %req.path,
            status = response.status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "handled"
        );
        response
    }

    fn dispatch(&self, req: &ApiRequest) -> ApiResponse {
        if req.body.len() > self.max_body_bytes {
            return ApiResponse::error(
                413,
                format!("request body exceeds {} bytes", self.max_body_bytes),
            );
        }

        let route = req.route();
        let method = req.method.as_str();
        let (allowed, response) = match route {
            "/api/settings" => ("GET", (method == "GET").then(|| self.get_settings())),
            "/api/admin/upload" => ("POST", (method == "POST").then(|| self.post_upload(req))),
            "/api/admin/config" => ("POST", (method == "POST").then(|| self.post_config(req))),
            "/api/generate" => ("POST", (method == "POST").then(|| self.post_generate(req))),
            "/api/convert" => ("POST", (method == "POST").then(|| self.post_convert(req))),
            _ => match route.strip_prefix("/blobs/") {
                Some(key) => ("GET", (method == "GET").then(|| self.get_blob(key))),
                None => return ApiResponse::error(404, "not found"),
            },
        };
        response.unwrap_or_else(|| {
            ApiResponse::error(405, "method not allowed").with_header("Allow", allowed)
        })
    }

    fn get_settings(&self) -> ApiResponse {
        let public = self.settings.read().to_public();
        match serde_json::to_value(public) {
            Ok(v) => ApiResponse::json(200, &v),
            Err(e) => failure(PhotoframeError::serde(e.to_string()), "failed to read settings"),
        }
    }

    fn post_upload(&self, req: &ApiRequest) -> ApiResponse {
        if !self.gate.is_admin(req) {
            return failure(PhotoframeError::AuthRequired, "");
        }
        match self.upload(req) {
            Ok(url) => ApiResponse::json(200, &serde_json::json!({ "url": url })),
            Err(e) => failure(e, "upload failed"),
        }
    }

    fn upload(&self, req: &ApiRequest) -> PhotoframeResult<String> {
        let form = FormData::parse(req.header("content-type").unwrap_or_default(), &req.body)?;
        let (Some(file), Some(kind)) = (form.field("file"), form.text("type")) else {
            return Err(PhotoframeError::bad_input("file and type are required"));
        };
        if file.data.is_empty() {
            return Err(PhotoframeError::bad_input("uploaded file is empty"));
        }
        let role: TemplateRole = kind.parse()?;
        self.templates.upload(role, &file.data)
    }

    fn post_config(&self, req: &ApiRequest) -> ApiResponse {
        if !self.gate.is_admin(req) {
            return failure(PhotoframeError::AuthRequired, "");
        }
        let saved = serde_json::from_slice::<ConfigBody>(&req.body)
            .map_err(|e| PhotoframeError::bad_input(format!("invalid config body: {e}")))
            .and_then(|body| {
                body.user_image_area
                    .ok_or_else(|| PhotoframeError::bad_input("userImageArea is required"))
            })
            .and_then(|rect| self.layouts.save(rect));
        match saved {
            Ok(entry) => {
                ApiResponse::json(200, &serde_json::json!({ "success": true, "url": entry.url }))
            }
            Err(e) => failure(e, "failed to save settings"),
        }
    }

    fn post_generate(&self, req: &ApiRequest) -> ApiResponse {
        match self.generate(req) {
            Ok(jpeg) => ApiResponse::bytes(200, "image/jpeg", jpeg).with_header(
                "Content-Disposition",
                format!("attachment; filename=\"{GENERATED_FILE_NAME}\""),
            ),
            Err(e) => failure(e, "image generation failed"),
        }
    }

    fn generate(&self, req: &ApiRequest) -> PhotoframeResult<Vec<u8>> {
        let body: GenerateBody = serde_json::from_slice(&req.body)
            .map_err(|e| PhotoframeError::bad_input(format!("invalid generate body: {e}")))?;
        let data_url = body
            .user_image
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| PhotoframeError::bad_input("userImage is required"))?;
        let photo = decode_data_url(&data_url)?;
        let snapshot = self.settings.read_prepared();
        self.compositor.compose(&photo, &snapshot)
    }

    fn post_convert(&self, req: &ApiRequest) -> ApiResponse {
        let form = match FormData::parse(req.header("content-type").unwrap_or_default(), &req.body)
        {
            Ok(form) => form,
            Err(e) => return failure(e, ""),
        };
        let Some(file) = form.field("file").filter(|f| !f.data.is_empty()) else {
            return failure(PhotoframeError::bad_input("file is required"), "");
        };
        match convert_to_jpeg(&file.data, file.file_name.as_deref(), self.transcoder.as_deref()) {
            Ok(jpeg) => ApiResponse::json(
                200,
                &serde_json::json!({ "base64": encode_data_url("image/jpeg", &jpeg) }),
            ),
            // Any conversion failure is reported as a server error.
            Err(e) => failure(PhotoframeError::composition(e.to_string()), "image conversion failed"),
        }
    }

    fn get_blob(&self, raw_key: &str) -> ApiResponse {
        let Ok(key) = normalize_key(raw_key) else {
            return ApiResponse::error(404, "not found");
        };
        let entry = match self.store.list(&key) {
            Ok(entries) => entries.into_iter().find(|e| e.key == key),
            Err(e) => return failure(e, "storage unavailable"),
        };
        let Some(entry) = entry else {
            return ApiResponse::error(404, "not found");
        };
        match self.store.fetch(&entry.url) {
            Ok(blob) => ApiResponse::bytes(200, blob.content_type, blob.bytes),
            Err(e) => failure(e, "storage unavailable"),
        }
    }
}

/// Map `err` onto a JSON error response. Server-side failures are logged and
/// answered with `public` instead of the internal message.
fn failure(err: PhotoframeError, public: &str) -> ApiResponse {
    let status = err.status();
    if status >= 500 {
        tracing::error!(error = %err, "{public}");
        ApiResponse::error(status, public)
    } else {
        tracing::debug!(error = %err, status, "request rejected");
        ApiResponse::error(status, err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/service/api.rs"]
mod tests;
