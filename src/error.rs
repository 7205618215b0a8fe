use std::path::PathBuf;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the library
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to load route manifest {}: {message}", .path.display())]
    Manifest { path: PathBuf, message: String },

    /// No resource grouping strategy was configured before the scan started.
    #[error("no resource grouping strategy configured for group '{0}'")]
    GroupingNotConfigured(String),

    #[error("invalid scan configuration: {0}")]
    InvalidConfiguration(String),

    /// A custom mapping reader failed while expanding an operation.
    #[error("mapping reader '{reader}' failed: {message}")]
    Reader { reader: String, message: String },

    /// A collaborator panicked while a resource group was being expanded.
    #[error("expansion of resource group '{group}' panicked: {message}")]
    ExpansionPanicked { group: String, message: String },
}

impl Error {
    /// Convenience constructor for reader failures
    pub fn reader(reader: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Reader {
            reader: reader.into(),
            message: message.into(),
        }
    }
}
