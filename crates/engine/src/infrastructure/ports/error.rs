//! Error types for port operations.

/// Module or index loading errors.
///
/// Cloneable so that every caller awaiting one shared load sees the failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// No module exists at the import path.
    #[error("Module not found: {path}")]
    ModuleNotFound { path: String },

    /// The module exists but could not be evaluated.
    #[error("Failed to evaluate {path}: {message}")]
    Evaluation { path: String, message: String },

    /// The stories index could not be fetched or parsed.
    #[error("Stories index unavailable: {0}")]
    Index(String),
}

impl LoadError {
    pub fn not_found(path: impl ToString) -> Self {
        Self::ModuleNotFound {
            path: path.to_string(),
        }
    }

    pub fn evaluation(path: impl ToString, message: impl ToString) -> Self {
        Self::Evaluation {
            path: path.to_string(),
            message: message.to_string(),
        }
    }

    pub fn index(message: impl ToString) -> Self {
        Self::Index(message.to_string())
    }
}

/// Failures raised while rendering a story or docs page.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// The renderer (or a story function it called) failed.
    #[error("Render failed: {0}")]
    Failed(String),

    /// A loader rejected.
    #[error("Loader failed: {0}")]
    Loader(String),

    /// The play function failed.
    #[error("Play function failed: {0}")]
    Play(String),
}

impl RenderError {
    pub fn failed(message: impl ToString) -> Self {
        Self::Failed(message.to_string())
    }
}

impl From<anyhow::Error> for RenderError {
    fn from(error: anyhow::Error) -> Self {
        // `{:#}` keeps the context chain on one line
        Self::Failed(format!("{error:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_messages_name_the_path() {
        assert_eq!(
            LoadError::not_found("./Button.stories.json").to_string(),
            "Module not found: ./Button.stories.json"
        );
        assert_eq!(
            LoadError::evaluation("./Button.stories.json", "bad json").to_string(),
            "Failed to evaluate ./Button.stories.json: bad json"
        );
    }

    #[test]
    fn anyhow_context_is_kept() {
        let err = anyhow::anyhow!("boom").context("rendering button");
        assert_eq!(
            RenderError::from(err),
            RenderError::Failed("rendering button: boom".into())
        );
    }
}
