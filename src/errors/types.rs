//! # Error Types
//!
//! Error types for the Vault to SSM migrator using `thiserror`.

/// Custom result type for migration operations
pub type Result<T> = std::result::Result<T, MigrationError>;

/// Main error type for a migration run
#[derive(thiserror::Error, Debug)]
pub enum MigrationError {
    /// Invalid or inconsistent configuration
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A mount declared a protocol variant that is not kv1 or kv2
    #[error("Configuration error: unknown backend type {variant} for path {mount}")]
    UnknownProtocol { mount: String, variant: String },

    /// Nothing accessible in the source system, or the token lacks permission
    #[error("Access error: {message}")]
    Access { message: String },

    /// A listed path could not be read
    #[error("Not found: {path}")]
    NotFound { path: String },

    /// Listing or reading failed on the wire
    #[error("Transport error at {path}: {message}")]
    Transport { path: String, message: String },

    /// The walk went deeper than the configured bound
    #[error("Maximum walk depth {max_depth} exceeded at {path}")]
    DepthExceeded { path: String, max_depth: usize },

    /// A structured payload could not be serialized
    #[error("Serialization error at {path}")]
    Serialization {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// A single parameter write was rejected by the destination
    #[error("Write error for parameter '{name}': {message}")]
    Write { name: String, message: String },
}

impl MigrationError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Configuration { message: message.into(), source: None }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Configuration { message: message.into(), source: Some(source) }
    }

    /// Create an unknown protocol variant error
    pub fn unknown_protocol<M: Into<String>, V: Into<String>>(mount: M, variant: V) -> Self {
        Self::UnknownProtocol { mount: mount.into(), variant: variant.into() }
    }

    /// Create an access error
    pub fn access<S: Into<String>>(message: S) -> Self {
        Self::Access { message: message.into() }
    }

    /// Create a not found error
    pub fn not_found<P: Into<String>>(path: P) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create a transport error
    pub fn transport<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::Transport { path: path.into(), message: message.into() }
    }

    /// Create a depth exceeded error
    pub fn depth_exceeded<P: Into<String>>(path: P, max_depth: usize) -> Self {
        Self::DepthExceeded { path: path.into(), max_depth }
    }

    /// Create a serialization error
    pub fn serialization<P: Into<String>>(path: P, source: serde_json::Error) -> Self {
        Self::Serialization { path: path.into(), source }
    }

    /// Create a write error
    pub fn write<N: Into<String>, M: Into<String>>(name: N, message: M) -> Self {
        Self::Write { name: name.into(), message: message.into() }
    }

    /// Whether this error must stop the enclosing mount walk (and, by default, the run).
    ///
    /// Only destination write failures are recovered locally.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, MigrationError::Write { .. })
    }

    /// The source path or parameter name this error is about, if any
    pub fn path(&self) -> Option<&str> {
        match self {
            MigrationError::UnknownProtocol { mount, .. } => Some(mount),
            MigrationError::NotFound { path }
            | MigrationError::Transport { path, .. }
            | MigrationError::DepthExceeded { path, .. }
            | MigrationError::Serialization { path, .. } => Some(path),
            MigrationError::Write { name, .. } => Some(name),
            MigrationError::Configuration { .. } | MigrationError::Access { .. } => None,
        }
    }
}

impl From<validator::ValidationErrors> for MigrationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages = Vec::new();
        collect_validation_messages("", &errors, &mut messages);
        Self::config(format!("Validation failed: {}", messages.join("; ")))
    }
}

/// Flatten nested validation errors into `section.field: message` strings.
fn collect_validation_messages(
    prefix: &str,
    errors: &validator::ValidationErrors,
    out: &mut Vec<String>,
) {
    use validator::ValidationErrorsKind;

    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    for (field, kind) in fields {
        let name = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                out.push(format!("{}: {}", name, error_messages.join(", ")));
            }
            ValidationErrorsKind::Struct(nested) => collect_validation_messages(&name, nested, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_validation_messages(&format!("{}[{}]", name, index), nested, out);
                }
            }
        }
    }
}

impl From<toml::de::Error> for MigrationError {
    fn from(error: toml::de::Error) -> Self {
        Self::config_with_source("Failed to parse configuration file", Box::new(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = MigrationError::config("Test configuration error");
        assert!(matches!(error, MigrationError::Configuration { .. }));
        assert_eq!(error.to_string(), "Configuration error: Test configuration error");
    }

    #[test]
    fn test_unknown_protocol_names_path_and_variant() {
        let error = MigrationError::unknown_protocol("kv", "kv3");
        assert_eq!(error.to_string(), "Configuration error: unknown backend type kv3 for path kv");
        assert_eq!(error.path(), Some("kv"));
    }

    #[test]
    fn test_transport_error_keeps_path() {
        let error = MigrationError::transport("secret/app/", "connection reset");
        assert!(error.to_string().contains("secret/app/"));
        assert!(error.to_string().contains("connection reset"));
        assert_eq!(error.path(), Some("secret/app/"));
    }

    #[test]
    fn test_fatality() {
        assert!(MigrationError::access("no mounts").is_fatal());
        assert!(MigrationError::not_found("secret/x").is_fatal());
        assert!(MigrationError::transport("secret/", "boom").is_fatal());
        assert!(MigrationError::depth_exceeded("a/b/", 1).is_fatal());
        assert!(!MigrationError::write("/a/b", "throttled").is_fatal());
    }

    #[test]
    fn test_error_conversions() {
        let toml_error = toml::from_str::<toml::Value>("not = [valid").unwrap_err();
        let error: MigrationError = toml_error.into();
        assert!(matches!(error, MigrationError::Configuration { source: Some(_), .. }));
    }
}
