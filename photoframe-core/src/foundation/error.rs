/// Convenience result type used across photoframe.
pub type PhotoframeResult<T> = Result<T, PhotoframeError>;

/// Top-level error taxonomy used by engine and service APIs.
///
/// Every failure is scoped to the request that produced it; [`PhotoframeError::status`]
/// maps each kind onto the HTTP status the service answers with.
#[derive(thiserror::Error, Debug)]
pub enum PhotoframeError {
    /// An admin-only operation was attempted without an admin session.
    #[error("authentication required")]
    AuthRequired,

    /// Missing or malformed request data (absent file, unknown role, bad layout).
    #[error("bad input: {0}")]
    BadInput(String),

    /// Image bytes could not be decoded as a supported raster format.
    #[error("decode error: {0}")]
    Decode(String),

    /// The backing blob store could not be reached or rejected the operation.
    #[error("storage unavailable: {0}")]
    Storage(String),

    /// Resizing, compositing or encoding the output failed.
    #[error("composition error: {0}")]
    Composition(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PhotoframeError {
    /// Build a [`PhotoframeError::BadInput`] value.
    pub fn bad_input(msg: impl Into<String>) -> Self {
        Self::BadInput(msg.into())
    }

    /// Build a [`PhotoframeError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`PhotoframeError::Storage`] value.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Build a [`PhotoframeError::Composition`] value.
    pub fn composition(msg: impl Into<String>) -> Self {
        Self::Composition(msg.into())
    }

    /// Build a [`PhotoframeError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// HTTP status code reported for this error kind.
    pub fn status(&self) -> u16 {
        match self {
            Self::AuthRequired => 401,
            Self::BadInput(_) | Self::Decode(_) | Self::Serde(_) => 400,
            Self::Storage(_) | Self::Composition(_) | Self::Other(_) => 500,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
