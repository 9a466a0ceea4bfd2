//! Remote call primitive consumed by every resource client.
//!
//! The transport (encoding, connection setup, authentication) is supplied by
//! the caller of this crate. Clients only need a method name, an ordered list
//! of positional parameters and a response value to decode.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// Errors raised by the remote call primitive.
#[derive(Debug, Error)]
pub enum CallError {
    /// Network or transport failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote side answered with a fault.
    #[error("remote fault {code}: {message}")]
    Fault { code: i64, message: String },

    /// The response value did not match the expected shape.
    #[error("cannot decode response of {method}: {source}")]
    Decode {
        method: String,
        #[source]
        source: serde_json::Error,
    },

    /// The response decoded but lacks a field the protocol guarantees.
    #[error("malformed response of {method}: missing {field}")]
    Malformed { method: String, field: &'static str },

    /// The remote side reported the request as not applied.
    #[error("{method} was rejected by the remote side")]
    Rejected { method: String },
}

/// One round trip to the remote API.
///
/// Implementations must keep `params` in the given order; optional fields are
/// conveyed by omission from a [`SparseMap`] parameter, never as null values.
#[async_trait]
pub trait Caller: Send + Sync {
    async fn send(&self, method: &str, params: Vec<Value>) -> Result<Value, CallError>;
}

#[async_trait]
impl<C: Caller + ?Sized> Caller for Arc<C> {
    async fn send(&self, method: &str, params: Vec<Value>) -> Result<Value, CallError> {
        (**self).send(method, params).await
    }
}

/// Issue `method` and decode its response into `T`.
pub async fn invoke<C, T>(caller: &C, method: &str, params: Vec<Value>) -> Result<T, CallError>
where
    C: Caller + ?Sized,
    T: DeserializeOwned,
{
    debug!(method, params = params.len(), "Sending remote call");
    let response = caller.send(method, params).await?;
    serde_json::from_value(response).map_err(|source| CallError::Decode {
        method: method.to_string(),
        source,
    })
}

/// Parameter map carrying only the fields that were explicitly set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseMap(Map<String, Value>);

impl SparseMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` unconditionally.
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Set `key` only when `value` is present.
    pub fn insert_opt<V: Into<Value>>(&mut self, key: &str, value: Option<V>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    /// Set `key` only when `value` is a non-empty string.
    pub fn insert_non_empty(&mut self, key: &str, value: &str) {
        if !value.is_empty() {
            self.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Positional parameters for a list call: no argument when nothing is set.
    pub fn into_filter_params(self) -> Vec<Value> {
        if self.is_empty() {
            Vec::new()
        } else {
            vec![self.into()]
        }
    }
}

impl From<SparseMap> for Value {
    fn from(map: SparseMap) -> Self {
        Value::Object(map.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_map_yields_no_filter_argument() {
        assert!(SparseMap::new().into_filter_params().is_empty());
    }

    #[test]
    fn unset_fields_are_skipped() {
        let mut map = SparseMap::new();
        map.insert_opt::<i64>("id", None);
        map.insert_non_empty("name", "");
        map.insert_opt("datacenter_id", Some(3));
        map.insert_non_empty("ip", "10.0.0.1");

        assert_eq!(map.len(), 2);
        assert_eq!(
            Value::from(map),
            json!({"datacenter_id": 3, "ip": "10.0.0.1"})
        );
    }

    #[test]
    fn zero_is_a_value_not_an_absence() {
        let mut map = SparseMap::new();
        map.insert_opt("vm_id", Some(0));
        assert_eq!(map.get("vm_id"), Some(&json!(0)));
        assert_eq!(map.into_filter_params(), vec![json!({"vm_id": 0})]);
    }

    #[tokio::test]
    async fn invoke_reports_decode_failures_with_method() {
        struct Fixed;

        #[async_trait]
        impl Caller for Fixed {
            async fn send(&self, _: &str, _: Vec<Value>) -> Result<Value, CallError> {
                Ok(json!("not a number"))
            }
        }

        let err = invoke::<_, i64>(&Fixed, "hosting.disk.info", vec![])
            .await
            .unwrap_err();
        match err {
            CallError::Decode { method, .. } => assert_eq!(method, "hosting.disk.info"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
