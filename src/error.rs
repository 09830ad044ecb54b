//! Error types for the PodReloader Operator

/// Result type for the operator
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the operator
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Typed spec could not be converted into its generic map form
    #[error("Conversion error: {0}")]
    ConversionError(String),

    /// Spec failed validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    KubeError(String),

    /// Operator configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Parameters could not be encoded for the rendering step
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_yaml::Error),

    /// Finalizer error
    #[error("Finalizer error: {0}")]
    FinalizerError(#[source] Box<kube::runtime::finalizer::Error<Error>>),
}

impl From<kube::runtime::finalizer::Error<Error>> for Error {
    fn from(err: kube::runtime::finalizer::Error<Error>) -> Self {
        Error::FinalizerError(Box::new(err))
    }
}

impl Error {
    /// Short machine-readable reason, used for status conditions
    pub fn reason(&self) -> &'static str {
        match self {
            Error::ConversionError(_) => "ConversionFailed",
            Error::ValidationError(_) => "ValidationFailed",
            Error::KubeError(_) => "KubernetesApiError",
            Error::ConfigError(_) => "ConfigurationError",
            Error::SerializationError(_) => "SerializationFailed",
            Error::FinalizerError(_) => "FinalizerError",
        }
    }
}
