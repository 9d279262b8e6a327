/// Route dispatch and request/response types.
pub mod api;
/// Admin authentication.
pub mod auth;
/// `data:` URL encoding and decoding.
pub mod data_url;
/// `multipart/form-data` parsing.
pub mod multipart;
