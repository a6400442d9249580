/// SchemaRegistryError は Schema Registry 操作に関するエラーを表す。
#[derive(Debug, thiserror::Error)]
pub enum SchemaRegistryError {
    /// HTTP リクエストが失敗した。
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// 指定したスキーマが見つからない。
    #[error("Schema not found: subject={subject}, version={version:?}")]
    SchemaNotFound {
        /// スキーマのサブジェクト名。
        subject: String,
        /// スキーマのバージョン（None の場合は latest を指す）。
        version: Option<i32>,
    },

    /// 登録レスポンスに数値の `id` フィールドが含まれていない。
    #[error("Schema registration response for subject {subject} has no id: {body}")]
    MissingSchemaId {
        /// サブジェクト名。
        subject: String,
        /// 受信したレスポンスボディ。
        body: String,
    },

    /// 既存バージョンとの互換性がなく登録を拒否された（409）。
    #[error("Compatibility check failed for subject {subject}: {reason}")]
    CompatibilityViolation {
        /// サブジェクト名。
        subject: String,
        /// 失敗理由。
        reason: String,
    },

    /// スキーマの形式が不正（422）。
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// JSON シリアライズ／デシリアライズに失敗した。
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Schema Registry サービスが利用不可、またはその他のエラーステータスを返した。
    #[error("Schema Registry unavailable: {0}")]
    Unavailable(String),

    /// ベース URL か、パスに埋め込むサブジェクト名が不正。
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_not_found_with_version() {
        let err = SchemaRegistryError::SchemaNotFound {
            subject: "transactions1-value".to_string(),
            version: Some(3),
        };
        let msg = err.to_string();
        assert!(msg.contains("transactions1-value"));
        assert!(msg.contains('3'));
    }

    #[test]
    fn test_missing_schema_id_includes_body() {
        let err = SchemaRegistryError::MissingSchemaId {
            subject: "transactions1-value".to_string(),
            body: r#"{"status":"ok"}"#.to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("transactions1-value"));
        assert!(msg.contains(r#"{"status":"ok"}"#));
    }

    #[test]
    fn test_compatibility_violation() {
        let err = SchemaRegistryError::CompatibilityViolation {
            subject: "orders-value".to_string(),
            reason: "removed required field".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("orders-value"));
        assert!(msg.contains("removed required field"));
    }

    #[test]
    fn test_serialization_error_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let err = SchemaRegistryError::from(serde_err);
        assert!(err.to_string().contains("Serialization error"));
    }

    #[test]
    fn test_unavailable() {
        let err = SchemaRegistryError::Unavailable("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));
    }
}
