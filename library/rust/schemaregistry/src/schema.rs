use serde::{Deserialize, Serialize};

/// Schema Registry に登録されたスキーマを表す。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredSchema {
    /// Schema Registry が割り当てたグローバルスキーマ ID。
    pub id: i32,
    /// サブジェクト名（例: `transactions1-value`）。
    pub subject: String,
    /// サブジェクト内のバージョン番号。
    pub version: i32,
    /// スキーマ定義文字列（Avro の場合は JSON 文字列）。
    pub schema: String,
    /// スキーマのフォーマット種別。
    pub schema_type: SchemaType,
}

/// スキーマのフォーマット種別。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaType {
    /// Apache Avro 形式。
    Avro,
    /// JSON Schema 形式。
    Json,
    /// Protocol Buffers 形式。
    Protobuf,
}

impl SchemaType {
    /// Confluent Schema Registry API で使用する文字列表現を返す。
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::Avro => "AVRO",
            SchemaType::Json => "JSON",
            SchemaType::Protobuf => "PROTOBUF",
        }
    }

    /// 登録リクエストの `schemaType` に載せる値。
    ///
    /// Avro は Schema Registry の既定値なのでフィールド自体を省略する。
    pub(crate) fn request_field(self) -> Option<&'static str> {
        match self {
            SchemaType::Avro => None,
            other => Some(other.as_str()),
        }
    }
}

impl std::fmt::Display for SchemaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `POST /subjects/{subject}/versions` へのスキーマ登録リクエストペイロード。
#[derive(Debug, Serialize)]
pub(crate) struct RegisterSchemaRequest<'a> {
    /// スキーマ定義文字列。
    pub schema: &'a str,
    /// スキーマフォーマット種別文字列。
    #[serde(rename = "schemaType", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<&'a str>,
}

/// スキーマ登録レスポンス。`id` が欠けている場合は呼び出し側でエラーにする。
#[derive(Debug, Deserialize)]
pub(crate) struct RegisterSchemaResponse {
    pub id: Option<i32>,
}

/// `/subjects/{subject}/versions/{version}` レスポンス。
#[derive(Debug, Deserialize)]
pub(crate) struct SchemaVersionResponse {
    pub subject: String,
    pub version: i32,
    pub id: i32,
    pub schema: String,
    #[serde(rename = "schemaType", default = "default_schema_type_str")]
    pub schema_type: String,
}

/// Schema Registry のエラーレスポンス `{"error_code": 40401, "message": "..."}`。
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub error_code: Option<i32>,
    #[serde(default)]
    pub message: Option<String>,
}

fn default_schema_type_str() -> String {
    "AVRO".to_string()
}

/// 文字列から SchemaType へ変換する。
///
/// 大文字小文字を区別しない。不明な文字列の場合は Avro を返す。
pub(crate) fn parse_schema_type(s: &str) -> SchemaType {
    match s.to_uppercase().as_str() {
        "PROTOBUF" => SchemaType::Protobuf,
        "JSON" => SchemaType::Json,
        _ => SchemaType::Avro,
    }
}
