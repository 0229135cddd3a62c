use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid base URL: {url}")]
    InvalidBaseUrl { url: String },

    #[error("Unsupported share type: {mime_type}. Only images can be shared.")]
    UnsupportedShareType { mime_type: String },

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),
}

/// Custom result type
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(field: &str, message: &str) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    pub fn invalid_base_url(url: &str) -> Self {
        Self::InvalidBaseUrl {
            url: url.to_string(),
        }
    }

    pub fn unsupported_share_type(mime_type: &str) -> Self {
        Self::UnsupportedShareType {
            mime_type: mime_type.to_string(),
        }
    }

    /// Errors the user can fix by editing the settings
    pub fn is_configuration_problem(&self) -> bool {
        matches!(
            self,
            AppError::InvalidBaseUrl { .. } | AppError::Validation { .. } | AppError::Config(_)
        )
    }
}
