//! krp-schemaregistry: Confluent Schema Registry クライアントライブラリ。
//!
//! Kafka REST Proxy 経由で送信するレコードのための Avro スキーマ登録と、
//! 登録済みサブジェクトの参照を提供する。
//!
//! # 使用例
//!
//! ```rust,no_run
//! use krp_schemaregistry::{
//!     HttpSchemaRegistryClient, SchemaRegistryClient, SchemaRegistryConfig, SchemaType,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SchemaRegistryConfig::new("http://localhost:8081");
//!     let client = HttpSchemaRegistryClient::new(config)?;
//!
//!     let subject = SchemaRegistryConfig::subject_name("transactions1");
//!     let schema = r#"{"type": "record", "name": "Payment", "fields": [{"name": "id", "type": "string"}]}"#;
//!     let schema_id = client.register_schema(&subject, schema, SchemaType::Avro).await?;
//!
//!     println!("Registered schema id={}", schema_id);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod schema;

pub use client::{HttpSchemaRegistryClient, SchemaRegistryClient, SCHEMA_REGISTRY_CONTENT_TYPE};
pub use config::SchemaRegistryConfig;
pub use error::SchemaRegistryError;
pub use schema::{RegisteredSchema, SchemaType};

#[cfg(feature = "mock")]
pub use client::MockSchemaRegistryClient;
