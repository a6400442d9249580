use thiserror::Error;

/// RestProxyError は REST Proxy クライアントのエラー型。
#[derive(Debug, Error)]
pub enum RestProxyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// REST Proxy がエラーステータスを返した。
    /// `error_code` はボディの `{"error_code": 40403, ...}` から取り出した値。
    #[error("API error (status {status}, error_code {error_code:?}): {message}")]
    Api {
        status: u16,
        error_code: Option<i32>,
        message: String,
    },

    #[error("consumer instance not found: group={group}, consumer={consumer}")]
    ConsumerNotFound { group: String, consumer: String },

    #[error("topic not found: {0}")]
    TopicNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Deserialization error: {0}")]
    Deserialize(String),

    /// ベース URL か、パスに埋め込む名前が不正。
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl RestProxyError {
    /// 同じリクエストを再送して回復する見込みがあるか。
    ///
    /// 通信エラーと 5xx のみ true。4xx や不正なボディは再送しても変わらない。
    pub fn is_retryable(&self) -> bool {
        match self {
            RestProxyError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            RestProxyError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_message() {
        let err = RestProxyError::Api {
            status: 409,
            error_code: Some(40902),
            message: "Consumer instance with the specified name already exists.".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("409"));
        assert!(msg.contains("40902"));
    }

    #[test]
    fn test_consumer_not_found_message() {
        let err = RestProxyError::ConsumerNotFound {
            group: "g1".to_string(),
            consumer: "c1".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("g1"));
        assert!(msg.contains("c1"));
    }

    #[test]
    fn test_retryable_classification() {
        let server_error = RestProxyError::Api {
            status: 503,
            error_code: None,
            message: "unavailable".to_string(),
        };
        let client_error = RestProxyError::Api {
            status: 422,
            error_code: Some(42201),
            message: "bad record".to_string(),
        };
        assert!(server_error.is_retryable());
        assert!(!client_error.is_retryable());
        assert!(!RestProxyError::TopicNotFound("t".to_string()).is_retryable());
    }
}
