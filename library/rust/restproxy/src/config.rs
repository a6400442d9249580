use serde::{Deserialize, Serialize};

/// REST Proxy 接続設定。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestProxyConfig {
    /// REST Proxy の URL（例: "http://localhost:8082"）。
    pub url: String,
    /// レコードの埋め込みフォーマット。コンテンツタイプとコンシューマーの format を決める。
    #[serde(default)]
    pub format: EmbeddedFormat,
    /// HTTP タイムアウト（秒）。ポーリングの `timeout` クエリより長くしておくこと。
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl RestProxyConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            format: EmbeddedFormat::default(),
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn with_format(mut self, format: EmbeddedFormat) -> Self {
        self.format = format;
        self
    }
}

/// REST Proxy v2 の埋め込みフォーマット。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddedFormat {
    /// Avro（Schema Registry のスキーマ ID を参照する）。
    #[default]
    Avro,
    /// スキーマなし JSON。
    Json,
    /// Base64 エンコードされたバイナリ。
    Binary,
}

impl EmbeddedFormat {
    /// コンシューマー作成時の `format` フィールド値。
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddedFormat::Avro => "avro",
            EmbeddedFormat::Json => "json",
            EmbeddedFormat::Binary => "binary",
        }
    }

    /// `application/vnd.kafka.{format}.v2+json` 形式のコンテンツタイプ。
    pub fn content_type(&self) -> &'static str {
        match self {
            EmbeddedFormat::Avro => "application/vnd.kafka.avro.v2+json",
            EmbeddedFormat::Json => "application/vnd.kafka.json.v2+json",
            EmbeddedFormat::Binary => "application/vnd.kafka.binary.v2+json",
        }
    }
}

impl std::fmt::Display for EmbeddedFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
