use krp_restproxy::RestProxyError;
use krp_schemaregistry::SchemaRegistryError;
use thiserror::Error;

/// シーケンス中のどの呼び出しで失敗したか。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    RegisterSchema,
    CreateConsumer,
    Subscribe,
    Produce,
    Poll,
    Unsubscribe,
    DestroyConsumer,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::RegisterSchema => "register_schema",
            Step::CreateConsumer => "create_consumer",
            Step::Subscribe => "subscribe",
            Step::Produce => "produce",
            Step::Poll => "poll",
            Step::Unsubscribe => "unsubscribe",
            Step::DestroyConsumer => "destroy_consumer",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SequencerError はシーケンサーの設定読み込みと実行に関するエラー。
#[derive(Debug, Error)]
pub enum SequencerError {
    #[error("invalid config: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("{step} failed: {source}")]
    SchemaRegistry {
        step: Step,
        #[source]
        source: SchemaRegistryError,
    },

    #[error("{step} failed: {source}")]
    RestProxy {
        step: Step,
        #[source]
        source: RestProxyError,
    },

    /// REST Proxy は 200 を返したが、一部のレコードが書き込めなかった。
    #[error("produce to {topic} rejected {failed} of {total} record(s): {first_error}")]
    ProduceRejected {
        topic: String,
        failed: usize,
        total: usize,
        first_error: String,
    },
}

impl SequencerError {
    pub(crate) fn proxy(step: Step) -> impl FnOnce(RestProxyError) -> Self {
        move |source| SequencerError::RestProxy { step, source }
    }

    /// 失敗したステップ。設定エラーの場合は None。
    pub fn step(&self) -> Option<Step> {
        match self {
            SequencerError::SchemaRegistry { step, .. } | SequencerError::RestProxy { step, .. } => {
                Some(*step)
            }
            SequencerError::ProduceRejected { .. } => Some(Step::Produce),
            _ => None,
        }
    }
}
