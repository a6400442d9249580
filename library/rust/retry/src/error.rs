use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetryError<E> {
    #[error("すべてのリトライが失敗しました ({attempts} 回): {last_error}")]
    ExhaustedRetries { attempts: u32, last_error: E },
    /// リトライ対象外と判定されたエラー。試行はその時点で打ち切られる。
    #[error("リトライ対象外のエラーで中断しました ({attempt} 回目): {error}")]
    NonRetryable { attempt: u32, error: E },
}

impl<E> RetryError<E> {
    /// 最後に発生した元のエラーを取り出す。
    pub fn into_inner(self) -> E {
        match self {
            RetryError::ExhaustedRetries { last_error, .. } => last_error,
            RetryError::NonRetryable { error, .. } => error,
        }
    }
}
