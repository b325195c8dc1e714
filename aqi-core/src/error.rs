use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("API response {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Malformed(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parsing error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("config encoding error: {0}")]
    Encode(serde_json::Error),
    #[error("no config directory available on this platform")]
    NoConfigDir,
    #[error("api key is required")]
    MissingApiKey,
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
}

#[derive(Debug, Error)]
pub enum PollError {
    #[error("poller task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_message_carries_status_and_body() {
        let err = FetchError::HttpStatus {
            status: 403,
            body: "API key not valid".into(),
        };
        assert_eq!(err.to_string(), "API response 403: API key not valid");
    }

    #[test]
    fn json_errors_become_malformed() {
        let json_err = serde_json::from_str::<serde_json::Value>("{ nope").unwrap_err();
        let err = FetchError::from(json_err);
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[test]
    fn config_encode_and_parse_errors_read_differently() {
        let json_err = serde_json::from_str::<serde_json::Value>("{ nope").unwrap_err();
        assert!(ConfigError::Encode(json_err)
            .to_string()
            .starts_with("config encoding error: "));
        let json_err = serde_json::from_str::<serde_json::Value>("{ nope").unwrap_err();
        assert!(ConfigError::from(json_err)
            .to_string()
            .starts_with("config parsing error: "));
    }
}
