use std::path::PathBuf;

use thiserror::Error;

/// Failures that stop the dashboard before anything is rendered.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("data source '{}' was not found", .path.display())]
    SourceNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("data source '{source_name}' could not be parsed: {reason}")]
    SourceUnparsable { source_name: String, reason: String },
}

impl LoadError {
    pub(crate) fn unparsable(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        LoadError::SourceUnparsable {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::SourceNotFound { .. })
    }
}
