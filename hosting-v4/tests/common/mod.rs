//! Shared test utilities for hosting-v4 integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use hosting::PollConfig;
use hosting::test_util::ScriptedCaller;
use hosting_v4::Hostingv4;
use hosting_v4::operation::OPERATION_INFO;
use hosting_v4::{Operation, OperationInfo};
use serde_json::json;
use tracing_subscriber::EnvFilter;

/// Install a test-friendly subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// v4 clients wired to a scripted caller, polling without delay.
pub struct TestHosting {
    pub caller: Arc<ScriptedCaller>,
    pub hosting: Hostingv4<ScriptedCaller>,
}

impl TestHosting {
    pub fn new() -> Self {
        init_tracing();
        let caller = Arc::new(ScriptedCaller::new());
        let hosting = Hostingv4::with_config(caller.clone(), PollConfig::unbounded());
        Self { caller, hosting }
    }

    /// Script one `operation.info` answer.
    pub fn expect_status(&self, operation_id: i64, status: &str) {
        self.caller.expect(
            OPERATION_INFO,
            vec![json!(operation_id)],
            OperationInfo::new(operation_id, status),
        );
    }

    pub fn expect_done(&self, operation_id: i64) {
        self.expect_status(operation_id, "DONE");
    }
}

pub fn disk_operation(id: i64, disk_id: i64) -> Operation {
    Operation {
        id,
        disk_id: Some(disk_id),
        ..Default::default()
    }
}

pub fn ip_operation(id: i64, ip_id: i64) -> Operation {
    Operation {
        id,
        ip_id: Some(ip_id),
        ..Default::default()
    }
}

pub fn operation(id: i64) -> Operation {
    Operation {
        id,
        ..Default::default()
    }
}
