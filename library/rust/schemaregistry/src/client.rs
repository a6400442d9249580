use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Url;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::{
    config::SchemaRegistryConfig,
    error::SchemaRegistryError,
    schema::{
        parse_schema_type, ErrorResponse, RegisterSchemaRequest, RegisterSchemaResponse,
        RegisteredSchema, SchemaType, SchemaVersionResponse,
    },
};

/// Schema Registry REST API v1 のコンテンツタイプ。
pub const SCHEMA_REGISTRY_CONTENT_TYPE: &str = "application/vnd.schemaregistry.v1+json";

/// Schema Registry クライアントのインターフェース。
///
/// スキーマの登録と、登録済みサブジェクト・バージョンの参照を提供する。
/// `mock` feature を有効にすると `MockSchemaRegistryClient` が生成される。
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait SchemaRegistryClient: Send + Sync {
    /// スキーマをサブジェクトに登録し、スキーマ ID を返す。
    ///
    /// 同一スキーマが既に存在する場合は既存の ID を返す。
    /// レスポンスに `id` が無い場合は `MissingSchemaId` で失敗する。
    async fn register_schema(
        &self,
        subject: &str,
        schema: &str,
        schema_type: SchemaType,
    ) -> Result<i32, SchemaRegistryError>;

    /// サブジェクトの最新バージョンのスキーマを取得する。
    async fn get_latest_schema(
        &self,
        subject: &str,
    ) -> Result<RegisteredSchema, SchemaRegistryError>;

    /// 登録されているすべてのサブジェクト名を返す。
    async fn list_subjects(&self) -> Result<Vec<String>, SchemaRegistryError>;

    /// サブジェクトに登録されているすべてのバージョン番号を返す。
    async fn list_versions(&self, subject: &str) -> Result<Vec<i32>, SchemaRegistryError>;
}

/// HTTP 経由で Confluent Schema Registry と通信する実装。
pub struct HttpSchemaRegistryClient {
    config: SchemaRegistryConfig,
    http_client: reqwest::Client,
}

impl HttpSchemaRegistryClient {
    /// 設定から HTTP クライアントを構築する。
    ///
    /// タイムアウトは `config.timeout_secs` の値を使用する。
    pub fn new(config: SchemaRegistryConfig) -> Result<Self, SchemaRegistryError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SchemaRegistryError::Unavailable(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Schema Registry のベース URL を返す（末尾スラッシュなし）。
    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    /// ベース URL にパスセグメントを連結する。サブジェクト名はパーセントエンコードされる。
    fn endpoint(&self, segments: &[&str]) -> Result<Url, SchemaRegistryError> {
        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || **s == "." || **s == "..")
        {
            return Err(SchemaRegistryError::InvalidUrl(format!(
                "invalid path segment {bad:?}"
            )));
        }
        let mut url = Url::parse(self.base_url())
            .map_err(|e| SchemaRegistryError::InvalidUrl(format!("{}: {e}", self.config.url)))?;
        url.path_segments_mut()
            .map_err(|()| SchemaRegistryError::InvalidUrl(self.config.url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// HTTP レスポンスのステータスコードを検査してエラーに変換する。
    ///
    /// - 404 → `SchemaNotFound`
    /// - 409 → `CompatibilityViolation`
    /// - 422 → `InvalidSchema`
    /// - その他の 4xx/5xx → `Unavailable`
    async fn check_response(
        response: reqwest::Response,
        subject: Option<&str>,
        version: Option<i32>,
    ) -> Result<reqwest::Response, SchemaRegistryError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| status.to_string());
        error!("Schema Registry returned error {}: {}", status, body);

        let parsed: ErrorResponse = serde_json::from_str(&body).unwrap_or_default();
        let reason = parsed.message.unwrap_or_else(|| body.clone());
        let subject = subject.unwrap_or("unknown").to_string();

        match status {
            reqwest::StatusCode::NOT_FOUND => {
                Err(SchemaRegistryError::SchemaNotFound { subject, version })
            }
            reqwest::StatusCode::CONFLICT => {
                Err(SchemaRegistryError::CompatibilityViolation { subject, reason })
            }
            reqwest::StatusCode::UNPROCESSABLE_ENTITY => {
                Err(SchemaRegistryError::InvalidSchema(reason))
            }
            _ => Err(SchemaRegistryError::Unavailable(format!(
                "status={}, error_code={:?}, body={}",
                status, parsed.error_code, body
            ))),
        }
    }

    async fn get(&self, url: Url) -> Result<reqwest::Response, SchemaRegistryError> {
        Ok(self
            .http_client
            .get(url)
            .header(ACCEPT, SCHEMA_REGISTRY_CONTENT_TYPE)
            .send()
            .await?)
    }
}

#[async_trait]
impl SchemaRegistryClient for HttpSchemaRegistryClient {
    async fn register_schema(
        &self,
        subject: &str,
        schema: &str,
        schema_type: SchemaType,
    ) -> Result<i32, SchemaRegistryError> {
        let url = self.endpoint(&["subjects", subject, "versions"])?;
        let body = serde_json::to_vec(&RegisterSchemaRequest {
            schema,
            schema_type: schema_type.request_field(),
        })?;

        debug!(
            "Registering schema: subject={}, type={}",
            subject, schema_type
        );

        let response = self
            .http_client
            .post(url)
            .header(CONTENT_TYPE, SCHEMA_REGISTRY_CONTENT_TYPE)
            .header(ACCEPT, SCHEMA_REGISTRY_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        let response = Self::check_response(response, Some(subject), None).await?;
        let text = response.text().await?;
        let reg: RegisterSchemaResponse = serde_json::from_str(&text)?;

        let Some(id) = reg.id else {
            return Err(SchemaRegistryError::MissingSchemaId {
                subject: subject.to_string(),
                body: text,
            });
        };

        info!(
            url = %self.base_url(),
            subject = %subject,
            schema_id = id,
            response = %text,
            "schema registered"
        );
        Ok(id)
    }

    async fn get_latest_schema(
        &self,
        subject: &str,
    ) -> Result<RegisteredSchema, SchemaRegistryError> {
        let url = self.endpoint(&["subjects", subject, "versions", "latest"])?;

        debug!("Fetching latest schema: subject={}", subject);

        let response = self.get(url).await?;
        let response = Self::check_response(response, Some(subject), None).await?;
        let data: SchemaVersionResponse = response.json().await?;

        let schema_type = parse_schema_type(&data.schema_type);
        Ok(RegisteredSchema {
            id: data.id,
            subject: data.subject,
            version: data.version,
            schema: data.schema,
            schema_type,
        })
    }

    async fn list_subjects(&self) -> Result<Vec<String>, SchemaRegistryError> {
        let url = self.endpoint(&["subjects"])?;

        debug!("Listing all subjects");

        let response = self.get(url).await?;
        let response = Self::check_response(response, None, None).await?;
        let subjects: Vec<String> = response.json().await?;

        debug!("Found {} subjects", subjects.len());
        Ok(subjects)
    }

    async fn list_versions(&self, subject: &str) -> Result<Vec<i32>, SchemaRegistryError> {
        let url = self.endpoint(&["subjects", subject, "versions"])?;

        debug!("Listing versions: subject={}", subject);

        let response = self.get(url).await?;
        let response = Self::check_response(response, Some(subject), None).await?;
        let versions: Vec<i32> = response.json().await?;

        debug!("Subject {} has {} versions", subject, versions.len());
        Ok(versions)
    }
}
