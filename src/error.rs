use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = AppError::Api {
            status: 503,
            body: "maintenance".into(),
        };
        assert_eq!(err.to_string(), "API returned 503: maintenance");
    }

    #[test]
    fn test_serializes_as_message() {
        let err = AppError::Validation("origin equals destination".into());
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, "\"Invalid request: origin equals destination\"");
    }
}
