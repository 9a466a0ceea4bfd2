//! Asynchronous operation handles and the tracker that waits on them.
//!
//! Every v4 mutation returns an operation handle instead of the resource. The
//! tracker polls `operation.info` until the operation reaches a terminal
//! status; only `DONE` counts as success.

use std::sync::Arc;

use hosting::{CallError, Caller, HostingError, PollConfig, Result, invoke};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub const OPERATION_INFO: &str = "operation.info";

/// Terminal success status.
pub const STATUS_DONE: &str = "DONE";

/// Terminal failure statuses.
pub const FAILURE_STATUSES: &[&str] = &["ERROR", "CANCEL"];

/// Handle returned by every mutating call.
///
/// Only the id field matching the resource kind is set by the remote side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_id: Option<i64>,
}

impl Operation {
    pub fn disk_id(&self, method: &str) -> std::result::Result<i64, CallError> {
        result_id(method, "disk_id", self.disk_id)
    }

    pub fn ip_id(&self, method: &str) -> std::result::Result<i64, CallError> {
        result_id(method, "ip_id", self.ip_id)
    }
}

fn result_id(
    method: &str,
    field: &'static str,
    value: Option<i64>,
) -> std::result::Result<i64, CallError> {
    value.ok_or_else(|| CallError::Malformed {
        method: method.to_string(),
        field,
    })
}

/// Response of `operation.info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationInfo {
    pub id: i64,
    #[serde(alias = "step")]
    pub status: String,
}

impl OperationInfo {
    pub fn new(id: i64, status: &str) -> Self {
        Self {
            id,
            status: status.to_string(),
        }
    }
}

/// Where a polled operation stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Pending,
    Done,
    Failed(String),
}

impl PollState {
    /// Unknown labels keep the operation pending.
    pub fn classify(status: &str) -> Self {
        if status == STATUS_DONE {
            PollState::Done
        } else if FAILURE_STATUSES.contains(&status) {
            PollState::Failed(status.to_string())
        } else {
            PollState::Pending
        }
    }
}

/// Waits for v4 operations to reach a terminal status.
pub struct OperationTracker<C> {
    caller: Arc<C>,
    config: PollConfig,
    cancel: CancellationToken,
}

impl<C> Clone for OperationTracker<C> {
    fn clone(&self) -> Self {
        Self {
            caller: self.caller.clone(),
            config: self.config.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

impl<C: Caller> OperationTracker<C> {
    pub fn new(caller: Arc<C>, config: PollConfig, cancel: CancellationToken) -> Self {
        Self {
            caller,
            config,
            cancel,
        }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Token aborting every wait of this tracker once cancelled.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Query the current status once.
    pub async fn status(&self, operation_id: i64) -> Result<OperationInfo> {
        let info = invoke(&*self.caller, OPERATION_INFO, vec![json!(operation_id)]).await?;
        Ok(info)
    }

    /// Block until `operation_id` is `DONE`.
    ///
    /// Fails with `OperationFailed` on a terminal failure status, `Cancelled`
    /// when the token fires, and `DeadlineExceeded`/`PollLimitReached` when
    /// the configured bounds are hit.
    #[tracing::instrument(skip(self))]
    pub async fn await_completion(&self, operation_id: i64) -> Result<()> {
        let bounded = async {
            match self.config.deadline() {
                Some(deadline) => {
                    tokio::time::timeout(deadline, self.poll_until_terminal(operation_id))
                        .await
                        .unwrap_or(Err(HostingError::DeadlineExceeded {
                            operation_id,
                            deadline,
                        }))
                }
                None => self.poll_until_terminal(operation_id).await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                warn!(operation_id, "Wait for operation cancelled");
                Err(HostingError::Cancelled { operation_id })
            }
            result = bounded => result,
        }
    }

    async fn poll_until_terminal(&self, operation_id: i64) -> Result<()> {
        let interval = self.config.interval();
        let mut attempts = 0u32;

        loop {
            if self.config.max_attempts.is_some_and(|max| attempts >= max) {
                warn!(operation_id, attempts, "Operation still pending, giving up");
                return Err(HostingError::PollLimitReached {
                    operation_id,
                    attempts,
                });
            }
            attempts += 1;

            let info = self.status(operation_id).await?;
            match PollState::classify(&info.status) {
                PollState::Done => {
                    debug!(operation_id, attempts, "Operation done");
                    return Ok(());
                }
                PollState::Failed(status) => {
                    warn!(operation_id, status = %status, "Operation failed");
                    return Err(HostingError::OperationFailed {
                        operation_id,
                        status,
                    });
                }
                PollState::Pending => {
                    debug!(operation_id, status = %info.status, "Operation pending");
                    if interval.is_zero() {
                        tokio::task::yield_now().await;
                    } else {
                        tokio::time::sleep(interval).await;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hosting::test_util::ScriptedCaller;
    use std::time::Duration;

    fn tracker(caller: &Arc<ScriptedCaller>, config: PollConfig) -> OperationTracker<ScriptedCaller> {
        OperationTracker::new(caller.clone(), config, CancellationToken::new())
    }

    fn expect_status(caller: &ScriptedCaller, id: i64, status: &str) {
        caller.expect(OPERATION_INFO, vec![json!(id)], OperationInfo::new(id, status));
    }

    #[test]
    fn classify_labels() {
        assert_eq!(PollState::classify("DONE"), PollState::Done);
        assert_eq!(PollState::classify("ERROR"), PollState::Failed("ERROR".into()));
        assert_eq!(PollState::classify("CANCEL"), PollState::Failed("CANCEL".into()));
        assert_eq!(PollState::classify("WAIT"), PollState::Pending);
        assert_eq!(PollState::classify("RUN"), PollState::Pending);
        assert_eq!(PollState::classify("done"), PollState::Pending);
        assert_eq!(PollState::classify(""), PollState::Pending);
    }

    #[test]
    fn info_accepts_step_field() {
        let info: OperationInfo = serde_json::from_value(json!({"id": 3, "step": "RUN"})).unwrap();
        assert_eq!(info, OperationInfo::new(3, "RUN"));
    }

    #[test]
    fn missing_result_id_is_malformed() {
        let op = Operation {
            id: 1,
            ..Default::default()
        };
        assert!(matches!(
            op.disk_id("hosting.disk.create"),
            Err(CallError::Malformed { field: "disk_id", .. })
        ));
    }

    #[test]
    fn handle_ignores_ids_of_other_resources() {
        let op: Operation =
            serde_json::from_value(json!({"id": 3, "ip_id": 1337, "iface_id": 55})).unwrap();
        assert_eq!(op.ip_id("hosting.iface.create").unwrap(), 1337);
        assert_eq!(serde_json::to_value(&op).unwrap(), json!({"id": 3, "ip_id": 1337}));
    }

    #[tokio::test]
    async fn stops_on_first_done() {
        let caller = Arc::new(ScriptedCaller::new());
        expect_status(&caller, 7, "DONE");

        tracker(&caller, PollConfig::unbounded())
            .await_completion(7)
            .await
            .unwrap();
        assert_eq!(caller.call_count(), 1);
    }

    #[tokio::test]
    async fn keeps_polling_through_non_terminal_labels() {
        let caller = Arc::new(ScriptedCaller::new());
        for status in ["BILL", "WAIT", "RUN", "SOMETHING_NEW", "DONE"] {
            expect_status(&caller, 9, status);
        }

        tracker(&caller, PollConfig::unbounded())
            .await_completion(9)
            .await
            .unwrap();
        assert_eq!(caller.call_count(), 5);
        caller.assert_done();
    }

    #[tokio::test]
    async fn failure_carries_operation_and_status() {
        let caller = Arc::new(ScriptedCaller::new());
        expect_status(&caller, 212, "WAIT");
        expect_status(&caller, 212, "ERROR");

        let err = tracker(&caller, PollConfig::unbounded())
            .await_completion(212)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "bad operation status for 212: ERROR");
        assert_eq!(caller.call_count(), 2);
    }

    #[tokio::test]
    async fn remote_errors_stop_polling() {
        let caller = Arc::new(ScriptedCaller::new());
        caller.expect_error(
            OPERATION_INFO,
            vec![json!(4)],
            CallError::Transport("connection reset".into()),
        );

        let err = tracker(&caller, PollConfig::unbounded())
            .await_completion(4)
            .await
            .unwrap_err();
        assert!(matches!(err, HostingError::Remote(CallError::Transport(_))));
    }

    #[tokio::test]
    async fn attempt_limit_is_enforced() {
        let caller = Arc::new(ScriptedCaller::new());
        caller.repeat(OPERATION_INFO, vec![json!(5)], OperationInfo::new(5, "WAIT"));

        let err = tracker(&caller, PollConfig::unbounded().with_max_attempts(Some(3)))
            .await_completion(5)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HostingError::PollLimitReached {
                operation_id: 5,
                attempts: 3
            }
        ));
        assert_eq!(caller.call_count(), 3);
    }

    #[tokio::test]
    async fn deadline_bounds_the_wait() {
        let caller = Arc::new(ScriptedCaller::new());
        caller.repeat(OPERATION_INFO, vec![json!(6)], OperationInfo::new(6, "WAIT"));
        let config = PollConfig::unbounded()
            .with_interval(Duration::from_millis(5))
            .with_deadline(Some(Duration::from_millis(50)));

        let err = tracker(&caller, config).await_completion(6).await.unwrap_err();
        assert!(matches!(err, HostingError::DeadlineExceeded { operation_id: 6, .. }));
        assert!(caller.call_count() >= 1);
    }

    #[tokio::test]
    async fn cancellation_is_distinct_from_remote_failure() {
        let caller = Arc::new(ScriptedCaller::new());
        caller.repeat(OPERATION_INFO, vec![json!(8)], OperationInfo::new(8, "WAIT"));
        let tracker = tracker(&caller, PollConfig::unbounded().with_interval(Duration::from_millis(5)));

        let token = tracker.cancellation_token().clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });

        let err = tracker.await_completion(8).await.unwrap_err();
        assert!(matches!(err, HostingError::Cancelled { operation_id: 8 }));
    }

    #[tokio::test]
    async fn cancelled_token_prevents_any_poll() {
        let caller = Arc::new(ScriptedCaller::new());
        let tracker = tracker(&caller, PollConfig::unbounded());
        tracker.cancellation_token().cancel();

        let err = tracker.await_completion(1).await.unwrap_err();
        assert!(matches!(err, HostingError::Cancelled { operation_id: 1 }));
        assert_eq!(caller.call_count(), 0);
    }
}
