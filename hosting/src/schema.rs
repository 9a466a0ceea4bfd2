//! Schema capability traits.
//!
//! Each supported wire protocol version provides one tagged type implementing
//! these traits. Conversions are pure: they never touch the network.
//!
//! Creation translation is strict (required ids must be present and numeric),
//! filter translation skips empty fields and only fails on a non-empty value
//! that does not parse, and wire-to-domain translation always succeeds.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::caller::SparseMap;
use crate::error::Result;
use crate::model::{
    Disk, DiskFilter, DiskSpec, IpAddress, IpFilter, IpVersion, Region, SshKey, Vlan,
};

pub trait DiskSchema {
    /// Wire representation of a disk.
    type Disk: Serialize + DeserializeOwned + Send;

    fn disk_create_params(spec: &DiskSpec) -> Result<SparseMap>;

    fn disk_filter_params(filter: &DiskFilter) -> Result<SparseMap>;

    fn disk_from_wire(disk: Self::Disk) -> Disk;

    fn disk_to_wire(disk: &Disk) -> Result<Self::Disk>;
}

pub trait IpSchema {
    /// Wire representation of an IP address.
    type Ip: Serialize + DeserializeOwned + Send;

    /// Parameters allocating a public address in `region`.
    fn ip_create_params(region: &Region, version: IpVersion) -> Result<SparseMap>;

    /// Parameters binding the private address `ip` on `vlan`.
    fn private_ip_create_params(vlan: &Vlan, ip: &str) -> Result<SparseMap>;

    fn ip_filter_params(filter: &IpFilter) -> Result<SparseMap>;

    fn ip_from_wire(ip: Self::Ip) -> IpAddress;

    fn ip_to_wire(ip: &IpAddress) -> Result<Self::Ip>;
}

pub trait KeySchema {
    /// Wire representation of an SSH key.
    type Key: Serialize + DeserializeOwned + Send;

    fn key_create_params(name: &str, value: &str) -> Result<SparseMap>;

    fn key_from_wire(key: Self::Key) -> SshKey;

    fn key_to_wire(key: &SshKey) -> Result<Self::Key>;
}
