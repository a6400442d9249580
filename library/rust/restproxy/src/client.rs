use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::RestProxyConfig;
use crate::error::RestProxyError;
use crate::types::{
    ConsumerInstance, ConsumerRecord, CreatedConsumer, ErrorResponse, ProduceResponse,
    Subscription, TopicMetadata, TopicRecordBatch,
};

/// 埋め込みフォーマットを持たないリクエスト（インスタンス削除等）のコンテンツタイプ。
pub const KAFKA_V2_CONTENT_TYPE: &str = "application/vnd.kafka.v2+json";

/// Kafka REST Proxy v2 クライアントのインターフェース。
///
/// `mock` feature を有効にすると `MockRestProxyClient` が生成される。
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait RestProxyClient: Send + Sync {
    /// コンシューマーグループ内にインスタンスを作成する。
    async fn create_consumer(
        &self,
        consumer: &ConsumerInstance,
    ) -> Result<CreatedConsumer, RestProxyError>;

    /// インスタンスをトピックに購読させる。
    async fn subscribe(
        &self,
        group: &str,
        consumer: &str,
        topics: &[String],
    ) -> Result<(), RestProxyError>;

    /// インスタンスが現在購読しているトピックを返す。
    async fn subscription(&self, group: &str, consumer: &str)
        -> Result<Vec<String>, RestProxyError>;

    /// 購読を解除する。
    async fn unsubscribe(&self, group: &str, consumer: &str) -> Result<(), RestProxyError>;

    /// インスタンスを破棄する。未コミットのオフセットは失われる。
    async fn destroy_consumer(&self, group: &str, consumer: &str) -> Result<(), RestProxyError>;

    /// レコードをトピックへ送信する。
    async fn produce(&self, batch: &TopicRecordBatch) -> Result<ProduceResponse, RestProxyError>;

    /// インスタンスからレコードを取得する。`timeout_ms` は REST Proxy 側の待ち時間。
    async fn poll_records(
        &self,
        group: &str,
        consumer: &str,
        timeout_ms: u64,
    ) -> Result<Vec<ConsumerRecord>, RestProxyError>;

    /// トピック名の一覧を返す。
    async fn list_topics(&self) -> Result<Vec<String>, RestProxyError>;

    /// トピックのメタデータを返す。
    async fn get_topic(&self, topic: &str) -> Result<TopicMetadata, RestProxyError>;
}

/// 404 を受けたときにどのリソースが無いとみなすか。
enum Resource<'a> {
    Consumer { group: &'a str, consumer: &'a str },
    Topic(&'a str),
    Collection,
}

/// HttpRestProxyClient は REST Proxy への HTTP クライアント。
pub struct HttpRestProxyClient {
    config: RestProxyConfig,
    http_client: Client,
}

impl HttpRestProxyClient {
    /// 設定から HTTP クライアントを構築する。
    pub fn new(config: RestProxyConfig) -> Result<Self, RestProxyError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            config,
            http_client,
        })
    }

    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    fn content_type(&self) -> &'static str {
        self.config.format.content_type()
    }

    /// ベース URL にパスセグメントを連結する。
    ///
    /// 各セグメントはパーセントエンコードされるため、名前に `/`・`#`・`?` を
    /// 含んでいても別のリソースを指すことはない。
    fn endpoint(&self, segments: &[&str]) -> Result<Url, RestProxyError> {
        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || **s == "." || **s == "..")
        {
            return Err(RestProxyError::InvalidUrl(format!(
                "invalid path segment {bad:?}"
            )));
        }
        let mut url = Url::parse(self.base_url())
            .map_err(|e| RestProxyError::InvalidUrl(format!("{}: {e}", self.config.url)))?;
        url.path_segments_mut()
            .map_err(|()| RestProxyError::InvalidUrl(self.config.url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `/consumers/{group}/instances/{consumer}` 以下の URL。
    fn instance_url(
        &self,
        group: &str,
        consumer: &str,
        tail: &[&str],
    ) -> Result<Url, RestProxyError> {
        let mut segments = vec!["consumers", group, "instances", consumer];
        segments.extend_from_slice(tail);
        self.endpoint(&segments)
    }

    /// ステータスを検査し、成功ならボディ文字列を返す。
    async fn read_body(
        response: reqwest::Response,
        resource: Resource<'_>,
    ) -> Result<String, RestProxyError> {
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            return Ok(body);
        }

        error!("REST Proxy returned error {}: {}", status, body);
        if status == StatusCode::NOT_FOUND {
            match resource {
                Resource::Consumer { group, consumer } => {
                    return Err(RestProxyError::ConsumerNotFound {
                        group: group.to_string(),
                        consumer: consumer.to_string(),
                    })
                }
                Resource::Topic(topic) => {
                    return Err(RestProxyError::TopicNotFound(topic.to_string()))
                }
                Resource::Collection => {}
            }
        }

        let parsed: ErrorResponse = serde_json::from_str(&body).unwrap_or_default();
        Err(RestProxyError::Api {
            status: status.as_u16(),
            error_code: parsed.error_code,
            message: parsed.message.unwrap_or(body),
        })
    }

    fn decode<T: DeserializeOwned>(body: &str) -> Result<T, RestProxyError> {
        serde_json::from_str(body)
            .map_err(|e| RestProxyError::Deserialize(format!("{e}: body={body}")))
    }
}

#[async_trait]
impl RestProxyClient for HttpRestProxyClient {
    /// POST /consumers/:group
    async fn create_consumer(
        &self,
        consumer: &ConsumerInstance,
    ) -> Result<CreatedConsumer, RestProxyError> {
        let url = self.endpoint(&["consumers", consumer.group.as_str()])?;
        let body = serde_json::to_vec(&consumer.to_request())?;

        debug!(
            "Creating consumer: group={}, name={}, format={}",
            consumer.group, consumer.name, consumer.format
        );

        let resp = self
            .http_client
            .post(url)
            .header(CONTENT_TYPE, self.content_type())
            .body(body)
            .send()
            .await?;

        let text = Self::read_body(
            resp,
            Resource::Consumer {
                group: &consumer.group,
                consumer: &consumer.name,
            },
        )
        .await?;
        info!(
            url = %self.base_url(),
            group = %consumer.group,
            consumer = %consumer.name,
            response = %text,
            "consumer created"
        );
        Self::decode(&text)
    }

    /// POST /consumers/:group/instances/:consumer/subscription
    async fn subscribe(
        &self,
        group: &str,
        consumer: &str,
        topics: &[String],
    ) -> Result<(), RestProxyError> {
        let url = self.instance_url(group, consumer, &["subscription"])?;
        let body = serde_json::to_vec(&Subscription {
            topics: topics.to_vec(),
        })?;

        debug!(
            "Subscribing: group={}, consumer={}, topics={:?}",
            group, consumer, topics
        );

        let resp = self
            .http_client
            .post(url)
            .header(CONTENT_TYPE, self.content_type())
            .body(body)
            .send()
            .await?;

        let text = Self::read_body(resp, Resource::Consumer { group, consumer }).await?;
        info!(
            url = %self.base_url(),
            group = %group,
            consumer = %consumer,
            response = %text,
            "subscribed"
        );
        Ok(())
    }

    /// GET /consumers/:group/instances/:consumer/subscription
    async fn subscription(
        &self,
        group: &str,
        consumer: &str,
    ) -> Result<Vec<String>, RestProxyError> {
        let url = self.instance_url(group, consumer, &["subscription"])?;

        let resp = self
            .http_client
            .get(url)
            .header(ACCEPT, KAFKA_V2_CONTENT_TYPE)
            .send()
            .await?;

        let text = Self::read_body(resp, Resource::Consumer { group, consumer }).await?;
        let subscription: Subscription = Self::decode(&text)?;
        Ok(subscription.topics)
    }

    /// DELETE /consumers/:group/instances/:consumer/subscription
    async fn unsubscribe(&self, group: &str, consumer: &str) -> Result<(), RestProxyError> {
        let url = self.instance_url(group, consumer, &["subscription"])?;

        let resp = self
            .http_client
            .delete(url)
            .header(ACCEPT, KAFKA_V2_CONTENT_TYPE)
            .send()
            .await?;

        let text = Self::read_body(resp, Resource::Consumer { group, consumer }).await?;
        info!(
            url = %self.base_url(),
            group = %group,
            consumer = %consumer,
            response = %text,
            "unsubscribed"
        );
        Ok(())
    }

    /// DELETE /consumers/:group/instances/:consumer
    async fn destroy_consumer(&self, group: &str, consumer: &str) -> Result<(), RestProxyError> {
        let url = self.instance_url(group, consumer, &[])?;

        let resp = self
            .http_client
            .delete(url)
            .header(ACCEPT, KAFKA_V2_CONTENT_TYPE)
            .send()
            .await?;

        let text = Self::read_body(resp, Resource::Consumer { group, consumer }).await?;
        info!(
            url = %self.base_url(),
            group = %group,
            consumer = %consumer,
            response = %text,
            "consumer destroyed"
        );
        Ok(())
    }

    /// POST /topics/:topic
    async fn produce(&self, batch: &TopicRecordBatch) -> Result<ProduceResponse, RestProxyError> {
        let url = self.endpoint(&["topics", batch.topic.as_str()])?;
        let body = serde_json::to_vec(batch)?;

        debug!(
            "Producing: topic={}, records={}, value_schema_id={:?}",
            batch.topic,
            batch.records.len(),
            batch.value_schema_id
        );

        let resp = self
            .http_client
            .post(url)
            .header(CONTENT_TYPE, self.content_type())
            .header(ACCEPT, KAFKA_V2_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        let text = Self::read_body(resp, Resource::Topic(&batch.topic)).await?;
        info!(
            url = %self.base_url(),
            topic = %batch.topic,
            response = %text,
            "records posted"
        );
        Self::decode(&text)
    }

    /// GET /consumers/:group/instances/:consumer/records?timeout=:timeout_ms
    async fn poll_records(
        &self,
        group: &str,
        consumer: &str,
        timeout_ms: u64,
    ) -> Result<Vec<ConsumerRecord>, RestProxyError> {
        let mut url = self.instance_url(group, consumer, &["records"])?;
        url.query_pairs_mut()
            .append_pair("timeout", &timeout_ms.to_string());

        let resp = self
            .http_client
            .get(url)
            .header(ACCEPT, self.content_type())
            .send()
            .await?;

        let text = Self::read_body(resp, Resource::Consumer { group, consumer }).await?;
        info!(
            url = %self.base_url(),
            group = %group,
            consumer = %consumer,
            timeout_ms,
            response = %text,
            "records polled"
        );
        Self::decode(&text)
    }

    /// GET /topics
    async fn list_topics(&self) -> Result<Vec<String>, RestProxyError> {
        let url = self.endpoint(&["topics"])?;

        let resp = self
            .http_client
            .get(url)
            .header(ACCEPT, KAFKA_V2_CONTENT_TYPE)
            .send()
            .await?;

        let text = Self::read_body(resp, Resource::Collection).await?;
        Self::decode(&text)
    }

    /// GET /topics/:topic
    async fn get_topic(&self, topic: &str) -> Result<TopicMetadata, RestProxyError> {
        let url = self.endpoint(&["topics", topic])?;

        let resp = self
            .http_client
            .get(url)
            .header(ACCEPT, KAFKA_V2_CONTENT_TYPE)
            .send()
            .await?;

        let text = Self::read_body(resp, Resource::Topic(topic)).await?;
        Self::decode(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmbeddedFormat;

    fn client(url: &str) -> HttpRestProxyClient {
        HttpRestProxyClient::new(RestProxyConfig::new(url)).unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash_removed() {
        let c = client("http://localhost:8082/");
        assert_eq!(c.base_url(), "http://localhost:8082");
    }

    #[test]
    fn test_instance_url() {
        let c = client("http://localhost:8082");
        assert_eq!(
            c.instance_url("my-test-group", "my-consumer5", &[]).unwrap().as_str(),
            "http://localhost:8082/consumers/my-test-group/instances/my-consumer5"
        );
    }

    #[test]
    fn test_instance_url_encodes_reserved_characters() {
        let c = client("http://localhost:8082/");
        assert_eq!(
            c.instance_url("team#a", "c1/../../topics/t", &["records"])
                .unwrap()
                .as_str(),
            "http://localhost:8082/consumers/team%23a/instances/c1%2F..%2F..%2Ftopics%2Ft/records"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let c = client("http://proxy.local/kafka/");
        assert_eq!(
            c.endpoint(&["topics", "t?x=1"]).unwrap().as_str(),
            "http://proxy.local/kafka/topics/t%3Fx=1"
        );
    }

    #[test]
    fn test_endpoint_rejects_dot_segments() {
        let c = client("http://localhost:8082");
        assert!(matches!(
            c.endpoint(&["consumers", ".."]),
            Err(RestProxyError::InvalidUrl(_))
        ));
        assert!(matches!(
            c.endpoint(&["topics", ""]),
            Err(RestProxyError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_content_type_follows_format() {
        let c = HttpRestProxyClient::new(
            RestProxyConfig::new("http://localhost:8082").with_format(EmbeddedFormat::Json),
        )
        .unwrap();
        assert_eq!(c.content_type(), "application/vnd.kafka.json.v2+json");
    }

    #[test]
    fn test_decode_error_includes_body() {
        let err = HttpRestProxyClient::decode::<Vec<String>>("not json").unwrap_err();
        assert!(err.to_string().contains("not json"));
    }
}
