use krp_restproxy::{
    ConsumerInstance, EmbeddedFormat, HttpRestProxyClient, ProduceRecord, RestProxyClient,
    RestProxyConfig, RestProxyError, TopicRecordBatch, KAFKA_V2_CONTENT_TYPE,
};
use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const AVRO_CONTENT_TYPE: &str = "application/vnd.kafka.avro.v2+json";

fn client_for(server: &MockServer) -> HttpRestProxyClient {
    HttpRestProxyClient::new(RestProxyConfig::new(server.uri())).unwrap()
}

#[tokio::test]
async fn test_create_consumer_sends_descriptor() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/consumers/g1"))
        .and(header("content-type", AVRO_CONTENT_TYPE))
        .and(body_partial_json(serde_json::json!({
            "name": "c1",
            "format": "avro",
            "auto.offset.reset": "latest",
            "auto.commit.enable": "true"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "instance_id": "c1",
            "base_uri": format!("{}/consumers/g1/instances/c1", mock_server.uri())
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let created = client
        .create_consumer(&ConsumerInstance::new("g1", "c1", EmbeddedFormat::Avro))
        .await
        .unwrap();
    assert_eq!(created.instance_id, "c1");
    assert!(created.base_uri.ends_with("/consumers/g1/instances/c1"));
}

#[tokio::test]
async fn test_create_consumer_conflict_returns_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/consumers/g1"))
        .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
            "error_code": 40902,
            "message": "Consumer with specified consumer ID already exists in the specified consumer group."
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client
        .create_consumer(&ConsumerInstance::new("g1", "c1", EmbeddedFormat::Avro))
        .await
        .unwrap_err();
    match err {
        RestProxyError::Api {
            status,
            error_code,
            message,
        } => {
            assert_eq!(status, 409);
            assert_eq!(error_code, Some(40902));
            assert!(message.contains("already exists"));
        }
        other => panic!("Api エラーが期待される: {other:?}"),
    }
}

#[tokio::test]
async fn test_subscribe_posts_single_topic_list() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/consumers/g1/instances/c1/subscription"))
        .and(header("content-type", AVRO_CONTENT_TYPE))
        .and(body_json(serde_json::json!({"topics": ["t"]})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    client
        .subscribe("g1", "c1", &["t".to_string()])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_subscribe_unknown_consumer() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/consumers/g1/instances/ghost/subscription"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error_code": 40403,
            "message": "Consumer instance not found."
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client
        .subscribe("g1", "ghost", &["t".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RestProxyError::ConsumerNotFound { ref group, ref consumer } if group == "g1" && consumer == "ghost"
    ));
}

#[tokio::test]
async fn test_subscription_lists_topics() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/consumers/g1/instances/c1/subscription"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"topics": ["t"]})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let topics = client.subscription("g1", "c1").await.unwrap();
    assert_eq!(topics, vec!["t"]);
}

#[tokio::test]
async fn test_produce_embeds_schema_id_verbatim() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/topics/transactions1"))
        .and(header("content-type", AVRO_CONTENT_TYPE))
        .and(body_json(serde_json::json!({
            "value_schema_id": 62,
            "records": [{"value": {"id": "my-id-1", "amount": 15.0}}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "key_schema_id": null,
            "value_schema_id": 62,
            "offsets": [{"partition": 0, "offset": 41, "error_code": null, "error": null}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let batch = TopicRecordBatch::new("transactions1")
        .with_value_schema_id(62)
        .push(ProduceRecord::new(
            serde_json::json!({"id": "my-id-1", "amount": 15.0}),
        ));
    let resp = client.produce(&batch).await.unwrap();
    assert_eq!(resp.value_schema_id, Some(62));
    assert_eq!(resp.offsets[0].offset, Some(41));
    assert!(resp.failed_offsets().is_empty());
}

#[tokio::test]
async fn test_produce_unknown_topic() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/topics/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error_code": 40401,
            "message": "Topic not found."
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let batch = TopicRecordBatch::new("missing")
        .with_value_schema_id(1)
        .push(ProduceRecord::new(serde_json::json!({})));
    let err = client.produce(&batch).await.unwrap_err();
    assert!(matches!(err, RestProxyError::TopicNotFound(ref t) if t == "missing"));
}

#[tokio::test]
async fn test_poll_records_uses_timeout_and_accept() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/consumers/g1/instances/c1/records"))
        .and(query_param("timeout", "5000"))
        .and(header("accept", AVRO_CONTENT_TYPE))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"topic": "t", "key": null, "value": {"id": "my-id-1", "amount": 15.0}, "partition": 0, "offset": 41}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let records = client.poll_records("g1", "c1", 5000).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].topic, "t");
    assert_eq!(records[0].value["id"], "my-id-1");
}

#[tokio::test]
async fn test_poll_records_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/consumers/g1/instances/c1/records"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let records = client.poll_records("g1", "c1", 100).await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_poll_records_server_error_is_retryable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/consumers/g1/instances/c1/records"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "error_code": 50002,
            "message": "Kafka error"
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client.poll_records("g1", "c1", 100).await.unwrap_err();
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_unsubscribe_targets_exact_path() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/consumers/g1/instances/c1/subscription"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    client.unsubscribe("g1", "c1").await.unwrap();
}

#[tokio::test]
async fn test_destroy_consumer_targets_exact_path() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/consumers/g1/instances/c1"))
        .and(header("accept", KAFKA_V2_CONTENT_TYPE))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    client.destroy_consumer("g1", "c1").await.unwrap();
}

#[tokio::test]
async fn test_destroy_consumer_escapes_reserved_characters_in_names() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/consumers/team%23a/instances/c1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/consumers/g1/instances/c1%2F..%2F..%2Ftopics%2Ft"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/consumers/team"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    client.destroy_consumer("team#a", "c1").await.unwrap();
    client
        .destroy_consumer("g1", "c1/../../topics/t")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_dot_segment_name_is_rejected_without_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client.destroy_consumer("g1", "..").await.unwrap_err();
    assert!(matches!(err, RestProxyError::InvalidUrl(_)));
}

#[tokio::test]
async fn test_list_topics() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/topics"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!(["_schemas", "transactions1"])),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let topics = client.list_topics().await.unwrap();
    assert_eq!(topics, vec!["_schemas", "transactions1"]);
}

#[tokio::test]
async fn test_get_topic_uses_requested_name() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/topics/transactions1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "transactions1",
            "configs": {"retention.ms": "604800000"},
            "partitions": [{"partition": 0, "leader": 1, "replicas": [
                {"broker": 1, "leader": true, "in_sync": true}
            ]}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let meta = client.get_topic("transactions1").await.unwrap();
    assert_eq!(meta.name, "transactions1");
    assert_eq!(meta.partitions.len(), 1);
    assert_eq!(meta.configs["retention.ms"], "604800000");
}

#[tokio::test]
async fn test_json_format_switches_content_type() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/topics/t"))
        .and(header("content-type", "application/vnd.kafka.json.v2+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"offsets": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpRestProxyClient::new(
        RestProxyConfig::new(mock_server.uri()).with_format(EmbeddedFormat::Json),
    )
    .unwrap();
    let batch = TopicRecordBatch::new("t").push(ProduceRecord::new(serde_json::json!({"a": 1})));
    client.produce(&batch).await.unwrap();
}
