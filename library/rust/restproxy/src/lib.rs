//! krp-restproxy: Confluent Kafka REST Proxy (API v2) クライアントライブラリ。
//!
//! ネイティブの Kafka クライアントを使わずに、REST Proxy 経由で
//! コンシューマーインスタンスの作成・購読・ポーリング、トピックへのレコード送信、
//! トピックメタデータの参照を行う。Avro へのエンコードは REST Proxy 側が担う。

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::{HttpRestProxyClient, RestProxyClient, KAFKA_V2_CONTENT_TYPE};
pub use config::{EmbeddedFormat, RestProxyConfig};
pub use error::RestProxyError;
pub use types::{
    ConsumerInstance, ConsumerRecord, CreatedConsumer, OffsetReset, PartitionMetadata,
    PartitionOffset, ProduceRecord, ProduceResponse, ReplicaMetadata, TopicMetadata,
    TopicRecordBatch,
};

#[cfg(feature = "mock")]
pub use client::MockRestProxyClient;
