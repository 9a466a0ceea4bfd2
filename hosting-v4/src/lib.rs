//! hosting-v4: clients for version 4 of the hosting-control API.
//!
//! v4 uses integer identifiers, sizes in MB and asynchronous mutations that
//! return an operation handle. This crate translates between that schema and
//! the stable `hosting` domain model, and waits on every operation before
//! handing results back.
//!
//! # Example
//! ```ignore
//! use std::sync::Arc;
//! use hosting::{DiskManager, DiskSpec, Hosting, PollConfig};
//! use hosting_v4::Hostingv4;
//!
//! let hosting = Hostingv4::with_config(Arc::new(transport), PollConfig::default());
//! let disk = hosting.disks().create_disk(DiskSpec {
//!     region_id: "3".into(),
//!     name: "data".into(),
//!     size: 20,
//! }).await?;
//! ```

use std::sync::Arc;

use hosting::{Caller, DiskManager, Hosting, IpManager, KeyManager, PollConfig};
use tokio_util::sync::CancellationToken;

mod convert;
pub mod disk;
pub mod ip;
pub mod operation;
pub mod ssh;

pub use convert::MB_PER_GB;
pub use disk::{DiskClient, DiskV4};
pub use ip::{DEFAULT_BANDWIDTH, IpAddressV4, IpClient};
pub use operation::{Operation, OperationInfo, OperationTracker, PollState};
pub use ssh::{KeyClient, SshKeyV4};

/// Tag type carrying the v4 schema translations.
#[derive(Debug, Clone, Copy, Default)]
pub struct V4;

/// All v4 resource clients over one shared caller.
pub struct Hostingv4<C> {
    disks: DiskClient<C>,
    ips: IpClient<C>,
    keys: KeyClient<C>,
    cancel: CancellationToken,
}

impl<C: Caller + 'static> Hostingv4<C> {
    pub fn new(caller: Arc<C>) -> Self {
        Self::with_config(caller, PollConfig::default())
    }

    pub fn with_config(caller: Arc<C>, config: PollConfig) -> Self {
        Self::with_cancellation(caller, config, CancellationToken::new())
    }

    /// Build clients whose operation waits abort when `cancel` fires.
    pub fn with_cancellation(caller: Arc<C>, config: PollConfig, cancel: CancellationToken) -> Self {
        let tracker = OperationTracker::new(caller.clone(), config, cancel.clone());
        Self {
            disks: DiskClient::new(caller.clone(), tracker.clone()),
            ips: IpClient::new(caller.clone(), tracker),
            keys: KeyClient::new(caller),
            cancel,
        }
    }

    /// Cancelling this token aborts every pending and future operation wait.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

impl<C: Caller + 'static> Hosting for Hostingv4<C> {
    fn disks(&self) -> &dyn DiskManager {
        &self.disks
    }

    fn ips(&self) -> &dyn IpManager {
        &self.ips
    }

    fn keys(&self) -> &dyn KeyManager {
        &self.keys
    }
}
