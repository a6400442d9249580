//! krp-retry: バックオフ付きリトライライブラリ。
//!
//! REST Proxy からのレコード到着待ちなど、結果が得られるまで一定回数だけ
//! 操作を繰り返すための指数バックオフポリシーとリトライ駆動関数を提供する。

pub mod error;
pub mod policy;
pub mod retry;

pub use error::RetryError;
pub use policy::RetryConfig;
pub use retry::{with_retry, with_retry_if};
