//! hosting: version-independent client surface for the hosting-control API.
//!
//! This crate holds everything a caller sees regardless of the wire protocol
//! version spoken by the remote service:
//! - the domain model (disks, IP addresses, SSH keys and their filters)
//! - the remote call primitive ([`Caller`]) the clients are built on
//! - the schema capability traits each wire version implements
//! - the manager traits exposing the public operations
//!
//! Wire-specific clients live in their own crates (see `hosting-v4`).
//!
//! # Example
//! ```ignore
//! use hosting::{DiskFilter, DiskManager, Hosting};
//!
//! let hosting = hosting_v4::Hostingv4::new(caller);
//! let disks = hosting.disks().list_disks(DiskFilter {
//!     region_id: "3".into(),
//!     ..Default::default()
//! }).await?;
//! ```

pub mod caller;
pub mod config;
pub mod error;
pub mod manager;
pub mod model;
pub mod schema;
pub mod test_util;

pub use caller::{CallError, Caller, SparseMap, invoke};
pub use config::PollConfig;
pub use error::{HostingError, Result};
pub use manager::{DiskManager, Hosting, IpManager, KeyManager};
pub use model::{
    Disk, DiskFilter, DiskImage, DiskSpec, IpAddress, IpFilter, IpVersion, Region, SshKey, Vlan,
};
pub use schema::{DiskSchema, IpSchema, KeySchema};
