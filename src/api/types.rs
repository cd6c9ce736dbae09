// Request and response bodies for the HTTP surface
use crate::error::ServiceError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Deserialize, Debug, Default)]
pub struct CredentialsBody {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct MessageBody {
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct TokenBody {
    pub token: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorBody {
    pub error: String,
}

/// `{"message": ..., <key>: record}` as returned by create, update and delete.
pub fn envelope<T: Serialize>(message: &str, key: &str, record: &T) -> Result<Value, ServiceError> {
    let mut body = Map::new();
    body.insert("message".to_string(), Value::String(message.to_string()));
    body.insert(key.to_string(), serde_json::to_value(record)?);
    Ok(Value::Object(body))
}
