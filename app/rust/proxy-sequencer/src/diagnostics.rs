use krp_restproxy::{RestProxyClient, TopicMetadata};
use krp_schemaregistry::{RegisteredSchema, SchemaRegistryClient};
use tracing::{info, warn};

use crate::config::DiagnosticsConfig;

/// 診断呼び出しの結果。失敗した呼び出しは `failures` に数えるだけで中断しない。
#[derive(Debug, Default)]
pub struct DiagnosticsReport {
    pub topics: Option<Vec<String>>,
    pub topic_metadata: Vec<TopicMetadata>,
    pub subjects: Option<Vec<String>>,
    pub schemas: Vec<RegisteredSchema>,
    pub versions: Vec<(String, Vec<i32>)>,
    pub failures: usize,
}

/// トピック・サブジェクトの一覧と、指定されたものの詳細を取得してログに出す。
pub async fn run_diagnostics(
    registry: &dyn SchemaRegistryClient,
    proxy: &dyn RestProxyClient,
    config: &DiagnosticsConfig,
) -> DiagnosticsReport {
    let mut report = DiagnosticsReport::default();

    match proxy.list_topics().await {
        Ok(topics) => {
            info!(count = topics.len(), topics = ?topics, "listed topics");
            report.topics = Some(topics);
        }
        Err(e) => {
            warn!(error = %e, "list topics failed");
            report.failures += 1;
        }
    }

    for topic in &config.topics {
        match proxy.get_topic(topic).await {
            Ok(meta) => {
                info!(
                    topic = %meta.name,
                    partitions = meta.partitions.len(),
                    configs = meta.configs.len(),
                    "fetched topic"
                );
                report.topic_metadata.push(meta);
            }
            Err(e) => {
                warn!(topic = %topic, error = %e, "get topic failed");
                report.failures += 1;
            }
        }
    }

    match registry.list_subjects().await {
        Ok(subjects) => {
            info!(count = subjects.len(), subjects = ?subjects, "listed schema subjects");
            report.subjects = Some(subjects);
        }
        Err(e) => {
            warn!(error = %e, "list schema subjects failed");
            report.failures += 1;
        }
    }

    for subject in &config.subjects {
        match registry.get_latest_schema(subject).await {
            Ok(schema) => {
                info!(
                    subject = %schema.subject,
                    schema_id = schema.id,
                    version = schema.version,
                    schema = %schema.schema,
                    "fetched latest schema"
                );
                report.schemas.push(schema);
            }
            Err(e) => {
                warn!(subject = %subject, error = %e, "get schema subject failed");
                report.failures += 1;
            }
        }
        match registry.list_versions(subject).await {
            Ok(versions) => {
                info!(subject = %subject, versions = ?versions, "listed schema versions");
                report.versions.push((subject.clone(), versions));
            }
            Err(e) => {
                warn!(subject = %subject, error = %e, "list schema versions failed");
                report.failures += 1;
            }
        }
    }

    report
}
