/// Result alias that carries the custom [`ParticleError`] type.
pub type Result<T> = std::result::Result<T, ParticleError>;

/// Common error type for the core crate.
///
/// Only setup boundaries return errors. Missing capabilities, absent options
/// and degenerate geometry are handled as silent no-ops instead.
#[derive(Debug, thiserror::Error)]
pub enum ParticleError {
    /// Free-form message for conditions without a dedicated variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
    /// No drawing surface has been acquired for the container.
    #[error("drawing context is unavailable")]
    ContextUnavailable,
    /// A font, bitmap or other asset could not be acquired.
    #[error("failed to load {resource}: {reason}")]
    ResourceLoad { resource: String, reason: String },
    /// A second handler was registered under an existing key.
    #[error("{registry} already has a handler registered for `{key}`")]
    DuplicateCapability { registry: &'static str, key: String },
    /// Registration was attempted after the simulation started.
    #[error("{registry} is sealed; register handlers before starting")]
    RegistrySealed { registry: &'static str },
}

impl ParticleError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    /// Creates a resource acquisition failure.
    pub fn resource(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ResourceLoad {
            resource: resource.into(),
            reason: reason.into(),
        }
    }
}

impl From<&str> for ParticleError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for ParticleError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
