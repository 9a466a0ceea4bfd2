//! Test utilities for hosting clients.
//!
//! [`ScriptedCaller`] stands in for the remote call primitive: it replays an
//! ordered list of expected calls and records every call it receives, so tests
//! can assert both on what was sent and on what was never sent.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::caller::{CallError, Caller};
use crate::model::{Disk, IpAddress, SshKey};
use crate::schema::{DiskSchema, IpSchema, KeySchema};

/// A call received by a [`ScriptedCaller`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: String,
    pub params: Vec<Value>,
}

enum Reply {
    Value(Value),
    Error(CallError),
}

struct Step {
    method: String,
    params: Vec<Value>,
    reply: Reply,
}

/// Strict, ordered test double for [`Caller`].
///
/// Every call must match the next scripted step (method and params); once the
/// script is exhausted, calls matching the repeating step (if any) get its
/// response forever. Anything else panics with the offending call.
#[derive(Default)]
pub struct ScriptedCaller {
    script: Mutex<VecDeque<Step>>,
    repeating: Mutex<Option<(String, Vec<Value>, Value)>>,
    calls: Mutex<Vec<RecordedCall>>,
}

fn to_value(response: impl Serialize) -> Value {
    serde_json::to_value(response).expect("scripted response must serialize")
}

impl ScriptedCaller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expect `method(params)` next and answer with `response`.
    pub fn expect(&self, method: &str, params: Vec<Value>, response: impl Serialize) -> &Self {
        self.push(method, params, Reply::Value(to_value(response)))
    }

    /// Expect `method(params)` next and fail it with `error`.
    pub fn expect_error(&self, method: &str, params: Vec<Value>, error: CallError) -> &Self {
        self.push(method, params, Reply::Error(error))
    }

    /// Answer every further `method(params)` with `response` once the script is done.
    pub fn repeat(&self, method: &str, params: Vec<Value>, response: impl Serialize) -> &Self {
        *self.repeating.lock().expect("scripted caller poisoned") =
            Some((method.to_string(), params, to_value(response)));
        self
    }

    fn push(&self, method: &str, params: Vec<Value>, reply: Reply) -> &Self {
        self.script
            .lock()
            .expect("scripted caller poisoned")
            .push_back(Step {
                method: method.to_string(),
                params,
                reply,
            });
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("scripted caller poisoned").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("scripted caller poisoned").len()
    }

    /// Methods called so far, in order.
    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.method).collect()
    }

    /// Panic if scripted steps were never consumed.
    pub fn assert_done(&self) {
        let script = self.script.lock().expect("scripted caller poisoned");
        let pending: Vec<&str> = script.iter().map(|s| s.method.as_str()).collect();
        assert!(pending.is_empty(), "expected calls never made: {pending:?}");
    }
}

#[async_trait]
impl Caller for ScriptedCaller {
    async fn send(&self, method: &str, params: Vec<Value>) -> Result<Value, CallError> {
        self.calls
            .lock()
            .expect("scripted caller poisoned")
            .push(RecordedCall {
                method: method.to_string(),
                params: params.clone(),
            });

        let next = self
            .script
            .lock()
            .expect("scripted caller poisoned")
            .pop_front();
        if let Some(step) = next {
            assert_eq!(
                (step.method.as_str(), &step.params),
                (method, &params),
                "unexpected call"
            );
            return match step.reply {
                Reply::Value(value) => Ok(value),
                Reply::Error(error) => Err(error),
            };
        }

        let repeating = self.repeating.lock().expect("scripted caller poisoned");
        match repeating.as_ref() {
            Some((m, p, response)) if m == method && *p == params => Ok(response.clone()),
            _ => panic!("unexpected call {method}({params:?}): script exhausted"),
        }
    }
}

/// Assert `disk` survives a trip through the wire representation of `S`.
pub fn assert_disk_round_trip<S: DiskSchema>(disk: &Disk) {
    let wire = S::disk_to_wire(disk).expect("disk must translate to wire");
    assert_eq!(&S::disk_from_wire(wire), disk);
}

/// Assert `ip` survives a trip through the wire representation of `S`.
pub fn assert_ip_round_trip<S: IpSchema>(ip: &IpAddress) {
    let wire = S::ip_to_wire(ip).expect("ip must translate to wire");
    assert_eq!(&S::ip_from_wire(wire), ip);
}

/// Assert `key` survives a trip through the wire representation of `S`.
pub fn assert_key_round_trip<S: KeySchema>(key: &SshKey) {
    let wire = S::key_to_wire(key).expect("key must translate to wire");
    assert_eq!(&S::key_from_wire(wire), key);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn replays_script_in_order_then_repeats() {
        let caller = ScriptedCaller::new();
        caller
            .expect("a", vec![json!(1)], json!("first"))
            .repeat("b", vec![], json!(true));

        assert_eq!(caller.send("a", vec![json!(1)]).await.unwrap(), json!("first"));
        assert_eq!(caller.send("b", vec![]).await.unwrap(), json!(true));
        assert_eq!(caller.send("b", vec![]).await.unwrap(), json!(true));
        assert_eq!(caller.methods(), vec!["a", "b", "b"]);
        caller.assert_done();
    }

    #[tokio::test]
    async fn scripted_errors_are_returned() {
        let caller = ScriptedCaller::new();
        caller.expect_error("a", vec![], CallError::Transport("down".into()));
        let err = caller.send("a", vec![]).await.unwrap_err();
        assert!(matches!(err, CallError::Transport(msg) if msg == "down"));
    }

    #[tokio::test]
    #[should_panic(expected = "unexpected call")]
    async fn mismatched_params_panic() {
        let caller = ScriptedCaller::new();
        caller.expect("a", vec![json!(1)], json!(null));
        let _ = caller.send("a", vec![json!(2)]).await;
    }
}
