//! Public operations, independent of the wire protocol version.
//!
//! Mutations block until the remote operation reaches a terminal state and,
//! except for deletions, return the freshly read resource. Lookups named
//! `*_from_*` are soft: a missing resource is `Ok(None)`, while translation
//! and remote errors still propagate.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{
    Disk, DiskFilter, DiskImage, DiskSpec, IpAddress, IpFilter, IpVersion, Region, SshKey, Vlan,
};

#[async_trait]
pub trait DiskManager: Send + Sync {
    /// Create an empty disk.
    async fn create_disk(&self, spec: DiskSpec) -> Result<Disk>;

    /// Create a disk holding a copy of `image`.
    ///
    /// If both `spec.region_id` and `image.region_id` are set they must match.
    async fn create_disk_from_image(&self, spec: DiskSpec, image: DiskImage) -> Result<Disk>;

    async fn list_all_disks(&self) -> Result<Vec<Disk>>;

    async fn list_disks(&self, filter: DiskFilter) -> Result<Vec<Disk>>;

    async fn disk_from_id(&self, id: &str) -> Result<Option<Disk>>;

    async fn disk_from_name(&self, name: &str) -> Result<Option<Disk>>;

    async fn delete_disk(&self, disk: &Disk) -> Result<()>;

    /// Grow `disk` by `size_gb`; disks never shrink.
    async fn extend_disk(&self, disk: &Disk, size_gb: u64) -> Result<Disk>;

    async fn rename_disk(&self, disk: &Disk, name: &str) -> Result<Disk>;
}

#[async_trait]
pub trait IpManager: Send + Sync {
    /// Allocate a public address of `version` in `region`.
    async fn create_ip(&self, region: &Region, version: IpVersion) -> Result<IpAddress>;

    /// Bind the private address `ip` on `vlan`.
    async fn create_private_ip(&self, vlan: &Vlan, ip: &str) -> Result<IpAddress>;

    async fn list_ips(&self, filter: IpFilter) -> Result<Vec<IpAddress>>;

    async fn ip_from_id(&self, id: &str) -> Result<Option<IpAddress>>;

    async fn ip_from_address(&self, ip: &str) -> Result<Option<IpAddress>>;

    async fn delete_ip(&self, ip: &IpAddress) -> Result<()>;
}

#[async_trait]
pub trait KeyManager: Send + Sync {
    async fn create_key(&self, name: &str, value: &str) -> Result<SshKey>;

    async fn delete_key(&self, key: &SshKey) -> Result<()>;

    /// List every key with its value and fingerprint.
    async fn list_keys(&self) -> Result<Vec<SshKey>>;

    async fn key_from_name(&self, name: &str) -> Result<Option<SshKey>>;
}

/// Entry point bundling all resource managers of one wire version.
pub trait Hosting: Send + Sync {
    fn disks(&self) -> &dyn DiskManager;

    fn ips(&self) -> &dyn IpManager;

    fn keys(&self) -> &dyn KeyManager;
}
