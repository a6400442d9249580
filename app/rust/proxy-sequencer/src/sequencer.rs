use std::sync::Arc;

use krp_restproxy::{
    ConsumerRecord, CreatedConsumer, ProduceResponse, RestProxyClient, RestProxyError,
    TopicRecordBatch,
};
use krp_retry::with_retry_if;
use krp_schemaregistry::{SchemaRegistryClient, SchemaType};
use tracing::{info, warn};

use crate::config::SequencerConfig;
use crate::error::{SequencerError, Step};

/// 1 回の実行結果。
#[derive(Debug, Clone)]
pub struct RunReport {
    pub schema_id: i32,
    /// `key_schema` を設定した場合のキースキーマ ID。
    pub key_schema_id: Option<i32>,
    pub consumer: CreatedConsumer,
    pub produced: ProduceResponse,
    /// ポーリングで受信したレコード。予算内に届かなかった場合は空。
    pub records: Vec<ConsumerRecord>,
}

/// Schema Registry と REST Proxy に対して固定順序で呼び出しを行う。
///
/// 登録 → コンシューマー作成 → 購読 → 送信 → ポーリング → (任意) 後始末。
/// 前段の失敗はエラーとして返し、後始末の失敗は警告ログのみで続行する。
pub struct ProxySequencer {
    config: SequencerConfig,
    registry: Arc<dyn SchemaRegistryClient>,
    proxy: Arc<dyn RestProxyClient>,
}

/// ポーリング 1 回分の失敗理由。
#[derive(Debug)]
enum PollAttemptError {
    Empty,
    Proxy(RestProxyError),
}

impl std::fmt::Display for PollAttemptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PollAttemptError::Empty => f.write_str("no records yet"),
            PollAttemptError::Proxy(e) => write!(f, "{e}"),
        }
    }
}

impl ProxySequencer {
    pub fn new(
        config: SequencerConfig,
        registry: Arc<dyn SchemaRegistryClient>,
        proxy: Arc<dyn RestProxyClient>,
    ) -> Self {
        Self {
            config,
            registry,
            proxy,
        }
    }

    /// すべてのステップを順に実行する。
    ///
    /// コンシューマーの作成に成功した後は、後続のステップが失敗しても
    /// 後始末を実行してからエラーを返す。
    pub async fn run(&self) -> Result<RunReport, SequencerError> {
        let schema_id = self.register_schema().await?;
        let key_schema_id = self.register_key_schema().await?;
        let consumer = self.create_consumer().await?;

        let exchanged = self.exchange(schema_id, key_schema_id).await;
        self.teardown().await;
        let (produced, records) = exchanged?;

        info!(
            topic = %self.config.topic,
            schema_id,
            received = records.len(),
            "sequence completed"
        );
        Ok(RunReport {
            schema_id,
            key_schema_id,
            consumer,
            produced,
            records,
        })
    }

    pub async fn register_schema(&self) -> Result<i32, SequencerError> {
        let subject = self.config.subject();
        self.registry
            .register_schema(&subject, &self.config.value_schema, SchemaType::Avro)
            .await
            .map_err(|source| SequencerError::SchemaRegistry {
                step: Step::RegisterSchema,
                source,
            })
    }

    /// `key_schema` が設定されていれば `{topic}-key` に登録する。
    pub async fn register_key_schema(&self) -> Result<Option<i32>, SequencerError> {
        let Some(schema) = &self.config.key_schema else {
            return Ok(None);
        };
        let subject = self.config.key_subject();
        self.registry
            .register_schema(&subject, schema, SchemaType::Avro)
            .await
            .map(Some)
            .map_err(|source| SequencerError::SchemaRegistry {
                step: Step::RegisterSchema,
                source,
            })
    }

    pub async fn create_consumer(&self) -> Result<CreatedConsumer, SequencerError> {
        let instance = self
            .config
            .consumer
            .to_instance(self.config.rest_proxy.format);
        self.proxy
            .create_consumer(&instance)
            .await
            .map_err(SequencerError::proxy(Step::CreateConsumer))
    }

    pub async fn subscribe(&self) -> Result<(), SequencerError> {
        let consumer = &self.config.consumer;
        self.proxy
            .subscribe(
                &consumer.group,
                &consumer.name,
                std::slice::from_ref(&self.config.topic),
            )
            .await
            .map_err(SequencerError::proxy(Step::Subscribe))?;

        match self.proxy.subscription(&consumer.group, &consumer.name).await {
            Ok(topics) => info!(
                group = %consumer.group,
                consumer = %consumer.name,
                topics = ?topics,
                "current subscription"
            ),
            Err(e) => warn!(error = %e, "failed to read back subscription"),
        }
        Ok(())
    }

    /// 購読・送信・ポーリングを行う。
    async fn exchange(
        &self,
        schema_id: i32,
        key_schema_id: Option<i32>,
    ) -> Result<(ProduceResponse, Vec<ConsumerRecord>), SequencerError> {
        self.subscribe().await?;
        let produced = self.post_records(schema_id, key_schema_id).await?;
        let records = self.poll_messages().await?;
        Ok((produced, records))
    }

    /// 設定済みのレコードを `schema_id` 付きで送信する。
    ///
    /// 1 件でも書き込みに失敗したレコードがあれば `ProduceRejected` を返す。
    pub async fn post_records(
        &self,
        schema_id: i32,
        key_schema_id: Option<i32>,
    ) -> Result<ProduceResponse, SequencerError> {
        let mut batch = TopicRecordBatch::new(&self.config.topic).with_value_schema_id(schema_id);
        if let Some(id) = key_schema_id {
            batch = batch.with_key_schema_id(id);
        }
        let batch = self
            .config
            .records
            .iter()
            .cloned()
            .fold(batch, TopicRecordBatch::push);

        let produced = self
            .proxy
            .produce(&batch)
            .await
            .map_err(SequencerError::proxy(Step::Produce))?;

        let failed = produced.failed_offsets();
        if let Some(first) = failed.first() {
            return Err(SequencerError::ProduceRejected {
                topic: batch.topic.clone(),
                failed: failed.len(),
                total: produced.offsets.len(),
                first_error: first
                    .error
                    .clone()
                    .unwrap_or_else(|| format!("error_code={:?}", first.error_code)),
            });
        }
        Ok(produced)
    }

    /// レコードが届くまでバックオフ付きでポーリングする。
    ///
    /// 空の応答と再送可能なエラーは再試行する。試行回数を使い切っても
    /// 空のままなら警告を出して空の結果を返す。
    pub async fn poll_messages(&self) -> Result<Vec<ConsumerRecord>, SequencerError> {
        let proxy: &dyn RestProxyClient = self.proxy.as_ref();
        let group = self.config.consumer.group.as_str();
        let name = self.config.consumer.name.as_str();
        let timeout_ms = self.config.poll.timeout_ms;
        let retry = self.config.poll.retry_config();

        let result = with_retry_if(
            &retry,
            move || async move {
                match proxy.poll_records(group, name, timeout_ms).await {
                    Ok(records) if !records.is_empty() => Ok(records),
                    Ok(_) => Err(PollAttemptError::Empty),
                    Err(e) => Err(PollAttemptError::Proxy(e)),
                }
            },
            |e| match e {
                PollAttemptError::Empty => true,
                PollAttemptError::Proxy(e) => e.is_retryable(),
            },
        )
        .await;

        match result {
            Ok(records) => Ok(records),
            Err(err) => match err.into_inner() {
                PollAttemptError::Empty => {
                    warn!(
                        group = %group,
                        consumer = %name,
                        attempts = retry.effective_attempts(),
                        "no records arrived within the poll budget"
                    );
                    Ok(Vec::new())
                }
                PollAttemptError::Proxy(source) => Err(SequencerError::RestProxy {
                    step: Step::Poll,
                    source,
                }),
            },
        }
    }

    /// 設定に応じて購読解除・インスタンス破棄を行う。失敗はログのみ。
    pub async fn teardown(&self) {
        let consumer = &self.config.consumer;
        if self.config.teardown.unsubscribe {
            if let Err(e) = self.proxy.unsubscribe(&consumer.group, &consumer.name).await {
                warn!(step = %Step::Unsubscribe, error = %e, "teardown step failed");
            }
        }
        if self.config.teardown.destroy_consumer {
            if let Err(e) = self
                .proxy
                .destroy_consumer(&consumer.group, &consumer.name)
                .await
            {
                warn!(step = %Step::DestroyConsumer, error = %e, "teardown step failed");
            }
        }
    }
}
