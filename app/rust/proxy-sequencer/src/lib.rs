//! krp-proxy-sequencer: Schema Registry と Kafka REST Proxy を順に呼び出す実行器。
//!
//! Avro スキーマを登録し、コンシューマーを作成・購読させ、登録したスキーマ ID で
//! レコードを送信してから、そのレコードが読めるまでポーリングする。

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod logger;
pub mod sequencer;

pub use config::SequencerConfig;
pub use diagnostics::{run_diagnostics, DiagnosticsReport};
pub use error::{SequencerError, Step};
pub use sequencer::{ProxySequencer, RunReport};
