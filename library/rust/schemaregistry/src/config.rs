use serde::{Deserialize, Serialize};

/// Schema Registry 接続設定。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaRegistryConfig {
    /// Schema Registry の URL。
    /// 例: "http://localhost:8081"
    pub url: String,

    /// HTTP タイムアウト（秒）。
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl SchemaRegistryConfig {
    /// 指定した URL で設定を作成する。タイムアウトは 30 秒。
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Kafka トピック名から Schema Registry のサブジェクト名を生成する。
    ///
    /// TopicNameStrategy に従い `{topic-name}-value` 形式を返す。
    pub fn subject_name(topic: &str) -> String {
        format!("{}-value", topic)
    }

    /// キー用のサブジェクト名 `{topic-name}-key` を返す。
    pub fn key_subject_name(topic: &str) -> String {
        format!("{}-key", topic)
    }
}
