use std::path::Path;
use std::time::Duration;

use krp_restproxy::{ConsumerInstance, EmbeddedFormat, OffsetReset, ProduceRecord, RestProxyConfig};
use krp_retry::RetryConfig;
use krp_schemaregistry::SchemaRegistryConfig;
use serde::Deserialize;

use crate::error::SequencerError;

/// シーケンサーの実行設定。
///
/// すべてのセクションに既定値があり、設定ファイルが無い場合も
/// ローカルの REST Proxy (8082) と Schema Registry (8081) に対して 1 回の送受信を行う。
#[derive(Debug, Clone, Deserialize)]
pub struct SequencerConfig {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default = "default_schema_registry")]
    pub schema_registry: SchemaRegistryConfig,
    #[serde(default = "default_rest_proxy")]
    pub rest_proxy: RestProxyConfig,
    /// 送受信に使うトピック。サブジェクトは `{topic}-value` になる。
    #[serde(default = "default_topic")]
    pub topic: String,
    #[serde(default)]
    pub consumer: ConsumerConfig,
    /// 登録する Avro スキーマ（JSON テキスト）。
    #[serde(default = "default_value_schema")]
    pub value_schema: String,
    /// キー用の Avro スキーマ。設定すると `{topic}-key` に登録し、その ID で送信する。
    /// Avro フォーマットでキー付きレコードを送る場合は必須。
    #[serde(default)]
    pub key_schema: Option<String>,
    /// 送信するレコード。`value` は `value_schema` に従っていること。
    #[serde(default = "default_records")]
    pub records: Vec<ProduceRecord>,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub teardown: TeardownConfig,
    /// 読み取り専用の診断呼び出し。未設定なら実行しない。
    #[serde(default)]
    pub diagnostics: Option<DiagnosticsConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// RUST_LOG が未設定のときのフィルタ。
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "json" または "text"。
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConsumerConfig {
    #[serde(default = "default_group")]
    pub group: String,
    #[serde(default = "default_consumer_name")]
    pub name: String,
    #[serde(default)]
    pub auto_offset_reset: OffsetReset,
    #[serde(default = "default_true")]
    pub auto_commit_enable: bool,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            group: default_group(),
            name: default_consumer_name(),
            auto_offset_reset: OffsetReset::default(),
            auto_commit_enable: true,
        }
    }
}

impl ConsumerConfig {
    pub fn to_instance(&self, format: EmbeddedFormat) -> ConsumerInstance {
        ConsumerInstance::new(&self.group, &self.name, format)
            .with_offset_reset(self.auto_offset_reset)
            .with_auto_commit(self.auto_commit_enable)
    }
}

/// 送信後にレコードが届くまでのポーリング方針。
#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    /// REST Proxy に渡す `timeout` クエリ（ミリ秒）。
    #[serde(default = "default_poll_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_poll_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_poll_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_poll_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_poll_multiplier")]
    pub multiplier: f64,
    #[serde(default)]
    pub jitter: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_poll_timeout_ms(),
            max_attempts: default_poll_max_attempts(),
            initial_delay_ms: default_poll_initial_delay_ms(),
            max_delay_ms: default_poll_max_delay_ms(),
            multiplier: default_poll_multiplier(),
            jitter: false,
        }
    }
}

impl PollConfig {
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::new(self.max_attempts)
            .with_initial_delay(Duration::from_millis(self.initial_delay_ms))
            .with_max_delay(Duration::from_millis(self.max_delay_ms))
            .with_multiplier(self.multiplier)
            .with_jitter(self.jitter)
    }
}

/// 実行後の後始末。
///
/// どちらも既定で無効。コンシューマーを残しておけば、次回の実行で
/// まだ取得していないメッセージを受け取れる。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeardownConfig {
    #[serde(default)]
    pub unsubscribe: bool,
    #[serde(default)]
    pub destroy_consumer: bool,
}

/// 別環境のホストに対する読み取り専用の診断設定。
///
/// URL を省略した場合は主設定の URL を使う。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiagnosticsConfig {
    #[serde(default)]
    pub rest_proxy_url: Option<String>,
    #[serde(default)]
    pub schema_registry_url: Option<String>,
    /// メタデータを取得するトピック。
    #[serde(default)]
    pub topics: Vec<String>,
    /// 最新スキーマとバージョン一覧を取得するサブジェクト。
    #[serde(default)]
    pub subjects: Vec<String>,
}

fn default_app_name() -> String {
    "krp-proxy-sequencer".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_schema_registry() -> SchemaRegistryConfig {
    SchemaRegistryConfig::new("http://localhost:8081")
}

fn default_rest_proxy() -> RestProxyConfig {
    RestProxyConfig::new("http://localhost:8082")
}

fn default_topic() -> String {
    "transactions1".to_string()
}

fn default_group() -> String {
    "my-test-group".to_string()
}

fn default_consumer_name() -> String {
    "my-consumer5".to_string()
}

fn default_true() -> bool {
    true
}

fn default_value_schema() -> String {
    r#"{"namespace": "com.example.payments", "type": "record", "name": "Payment", "fields": [{"name": "id", "type": "string"}, {"name": "amount", "type": "double"}]}"#
        .to_string()
}

fn default_records() -> Vec<ProduceRecord> {
    vec![ProduceRecord::new(
        serde_json::json!({"id": "my-id-1", "amount": 15.0}),
    )]
}

fn default_poll_timeout_ms() -> u64 {
    5000
}

fn default_poll_max_attempts() -> u32 {
    5
}

fn default_poll_initial_delay_ms() -> u64 {
    1000
}

fn default_poll_max_delay_ms() -> u64 {
    10_000
}

fn default_poll_multiplier() -> f64 {
    2.0
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            app: AppConfig::default(),
            logging: LoggingConfig::default(),
            schema_registry: default_schema_registry(),
            rest_proxy: default_rest_proxy(),
            topic: default_topic(),
            consumer: ConsumerConfig::default(),
            value_schema: default_value_schema(),
            key_schema: None,
            records: default_records(),
            poll: PollConfig::default(),
            teardown: TeardownConfig::default(),
            diagnostics: None,
        }
    }
}

impl SequencerConfig {
    /// YAML 文字列から設定を読み込み、検証する。
    pub fn from_yaml_str(content: &str) -> Result<Self, SequencerError> {
        let cfg: Self = serde_yaml::from_str(content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// YAML ファイルから設定を読み込み、検証する。
    pub fn load(path: &Path) -> Result<Self, SequencerError> {
        let content = std::fs::read_to_string(path).map_err(|source| SequencerError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn validate(&self) -> Result<(), SequencerError> {
        let required = [
            ("schema_registry.url", self.schema_registry.url.as_str()),
            ("rest_proxy.url", self.rest_proxy.url.as_str()),
            ("topic", self.topic.as_str()),
            ("consumer.group", self.consumer.group.as_str()),
            ("consumer.name", self.consumer.name.as_str()),
            ("value_schema", self.value_schema.as_str()),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(SequencerError::Config(format!("{field} must not be empty")));
            }
        }
        if self.records.is_empty() {
            return Err(SequencerError::Config(
                "records must contain at least one record".to_string(),
            ));
        }
        if self.key_schema.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(SequencerError::Config(
                "key_schema must not be empty when set".to_string(),
            ));
        }
        if self.rest_proxy.format == EmbeddedFormat::Avro
            && self.key_schema.is_none()
            && self.records.iter().any(|r| r.key.is_some())
        {
            return Err(SequencerError::Config(
                "records with a key require key_schema when rest_proxy.format is avro"
                    .to_string(),
            ));
        }
        if self.poll.max_attempts == 0 {
            return Err(SequencerError::Config(
                "poll.max_attempts must be at least 1".to_string(),
            ));
        }
        let http_timeout_ms = self.rest_proxy.timeout_secs.saturating_mul(1000);
        if self.poll.timeout_ms >= http_timeout_ms {
            return Err(SequencerError::Config(format!(
                "poll.timeout_ms ({}) must be shorter than rest_proxy.timeout_secs ({}s)",
                self.poll.timeout_ms, self.rest_proxy.timeout_secs
            )));
        }
        Ok(())
    }

    /// Schema Registry のサブジェクト名。
    pub fn subject(&self) -> String {
        SchemaRegistryConfig::subject_name(&self.topic)
    }

    /// キースキーマのサブジェクト名。
    pub fn key_subject(&self) -> String {
        SchemaRegistryConfig::key_subject_name(&self.topic)
    }
}
