//! 構造化ログの初期化。

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// tracing-subscriber を初期化する。
///
/// RUST_LOG が設定されていればそれを優先し、無ければ `config.level` を使う。
/// format が "text" の場合はプレーンテキスト、それ以外は JSON で出力する。
pub fn init_logger(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.format == "text" {
        registry.with(fmt::layer().with_target(true)).init();
    } else {
        registry.with(fmt::layer().json().with_target(true)).init();
    }
}
