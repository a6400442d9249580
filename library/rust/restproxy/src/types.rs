use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::EmbeddedFormat;

/// コンシューマーが初回に読み始めるオフセット。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OffsetReset {
    #[default]
    Latest,
    Earliest,
}

impl OffsetReset {
    pub fn as_str(&self) -> &'static str {
        match self {
            OffsetReset::Latest => "latest",
            OffsetReset::Earliest => "earliest",
        }
    }
}

/// REST Proxy 上で管理されるコンシューマーインスタンスの定義。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerInstance {
    /// コンシューマーグループ名。
    pub group: String,
    /// インスタンス名。REST Proxy 上の `instances/{name}` になる。
    pub name: String,
    pub format: EmbeddedFormat,
    pub auto_offset_reset: OffsetReset,
    pub auto_commit_enable: bool,
}

impl ConsumerInstance {
    /// 最新オフセットから読み始め、自動コミットを有効にしたインスタンス定義を作る。
    pub fn new(group: impl Into<String>, name: impl Into<String>, format: EmbeddedFormat) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            format,
            auto_offset_reset: OffsetReset::Latest,
            auto_commit_enable: true,
        }
    }

    pub fn with_offset_reset(mut self, reset: OffsetReset) -> Self {
        self.auto_offset_reset = reset;
        self
    }

    pub fn with_auto_commit(mut self, enable: bool) -> Self {
        self.auto_commit_enable = enable;
        self
    }

    pub(crate) fn to_request(&self) -> CreateConsumerRequest<'_> {
        CreateConsumerRequest {
            name: &self.name,
            format: self.format.as_str(),
            auto_offset_reset: self.auto_offset_reset.as_str(),
            auto_commit_enable: if self.auto_commit_enable { "true" } else { "false" },
        }
    }
}

/// `POST /consumers/{group}` のリクエストボディ。
#[derive(Debug, Serialize)]
pub(crate) struct CreateConsumerRequest<'a> {
    pub name: &'a str,
    pub format: &'a str,
    #[serde(rename = "auto.offset.reset")]
    pub auto_offset_reset: &'a str,
    #[serde(rename = "auto.commit.enable")]
    pub auto_commit_enable: &'a str,
}

/// コンシューマー作成レスポンス。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedConsumer {
    pub instance_id: String,
    /// 以降のリクエストに使うインスタンスの URI。
    pub base_uri: String,
}

/// `/subscription` のリクエスト・レスポンスボディ。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Subscription {
    pub topics: Vec<String>,
}

/// 送信する 1 レコード。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProduceRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Value>,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<i32>,
}

impl ProduceRecord {
    pub fn new(value: Value) -> Self {
        Self {
            key: None,
            value,
            partition: None,
        }
    }

    pub fn with_key(mut self, key: Value) -> Self {
        self.key = Some(key);
        self
    }
}

/// トピックへ送信するレコードの集まり。
///
/// ボディには `value_schema_id` と `records` だけが載り、
/// `topic` は送信先 URL のパスに使われる。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicRecordBatch {
    #[serde(skip)]
    pub topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_schema_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_schema_id: Option<i32>,
    pub records: Vec<ProduceRecord>,
}

impl TopicRecordBatch {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            key_schema_id: None,
            value_schema_id: None,
            records: Vec::new(),
        }
    }

    pub fn with_value_schema_id(mut self, id: i32) -> Self {
        self.value_schema_id = Some(id);
        self
    }

    pub fn with_key_schema_id(mut self, id: i32) -> Self {
        self.key_schema_id = Some(id);
        self
    }

    pub fn push(mut self, record: ProduceRecord) -> Self {
        self.records.push(record);
        self
    }
}

/// 各レコードの書き込み結果。失敗時は `error_code` と `error` が入る。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionOffset {
    #[serde(default)]
    pub partition: Option<i32>,
    #[serde(default)]
    pub offset: Option<i64>,
    #[serde(default)]
    pub error_code: Option<i32>,
    #[serde(default)]
    pub error: Option<String>,
}

impl PartitionOffset {
    pub fn is_error(&self) -> bool {
        self.error_code.is_some() || self.error.is_some()
    }
}

/// `POST /topics/{topic}` のレスポンス。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProduceResponse {
    #[serde(default)]
    pub offsets: Vec<PartitionOffset>,
    #[serde(default)]
    pub key_schema_id: Option<i32>,
    #[serde(default)]
    pub value_schema_id: Option<i32>,
}

impl ProduceResponse {
    /// 書き込みに失敗したレコードの結果だけを返す。
    pub fn failed_offsets(&self) -> Vec<&PartitionOffset> {
        self.offsets.iter().filter(|o| o.is_error()).collect()
    }
}

/// ポーリングで受信したレコード。Avro の値は REST Proxy が JSON に変換済み。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumerRecord {
    pub topic: String,
    #[serde(default)]
    pub key: Option<Value>,
    pub value: Value,
    pub partition: i32,
    pub offset: i64,
}

/// `GET /topics/{topic}` のレスポンス。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicMetadata {
    pub name: String,
    #[serde(default)]
    pub configs: HashMap<String, String>,
    #[serde(default)]
    pub partitions: Vec<PartitionMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionMetadata {
    pub partition: i32,
    pub leader: i32,
    #[serde(default)]
    pub replicas: Vec<ReplicaMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaMetadata {
    pub broker: i32,
    pub leader: bool,
    pub in_sync: bool,
}

/// REST Proxy のエラーボディ。
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub error_code: Option<i32>,
    #[serde(default)]
    pub message: Option<String>,
}
