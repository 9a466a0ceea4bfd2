//! Domain model shared by every wire protocol version.
//!
//! Identifiers are opaque decimal strings from the caller's point of view.
//! Filter fields use the empty string for "not set".

use std::fmt;

use serde::{Deserialize, Serialize};

/// Block storage attached (or attachable) to virtual machines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disk {
    pub id: String,
    pub name: String,
    /// Size in GB.
    pub size: u64,
    pub region_id: String,
    pub state: String,
    /// Disk type as reported by the remote side (e.g. `data`).
    pub kind: String,
    pub attached_vm_ids: Vec<String>,
    pub is_boot_disk: bool,
}

/// Creation parameters for a new disk.
///
/// `name` and `size` are optional; the remote side picks defaults when unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskSpec {
    pub region_id: String,
    pub name: String,
    /// Size in GB, 0 for the remote default.
    pub size: u64,
}

/// Source disk used to create a new disk from an image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskImage {
    pub disk_id: String,
    pub name: String,
    /// Size in GB.
    pub size: u64,
    pub region_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskFilter {
    pub id: String,
    pub region_id: String,
    pub name: String,
    pub vm_id: String,
}

impl DiskFilter {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// IP protocol version. Serialized as its numeric value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum IpVersion {
    #[default]
    V4,
    V6,
}

impl IpVersion {
    pub fn number(self) -> i64 {
        match self {
            IpVersion::V4 => 4,
            IpVersion::V6 => 6,
        }
    }
}

impl TryFrom<i64> for IpVersion {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            4 => Ok(IpVersion::V4),
            6 => Ok(IpVersion::V6),
            other => Err(format!("bad IP version {other}")),
        }
    }
}

impl From<IpVersion> for i64 {
    fn from(version: IpVersion) -> Self {
        version.number()
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IPv{}", self.number())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpAddress {
    pub id: String,
    pub ip: String,
    pub region_id: String,
    pub version: IpVersion,
    pub attached_vm_id: Option<String>,
    pub state: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpFilter {
    pub id: String,
    pub ip: String,
    pub region_id: String,
    pub version: Option<IpVersion>,
    pub vm_id: String,
}

impl IpFilter {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn by_ip(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshKey {
    pub id: String,
    pub fingerprint: String,
    pub name: String,
    pub value: String,
}

/// Datacenter a resource lives in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub name: String,
    pub country: String,
}

/// Private virtual network private IPs are bound to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vlan {
    pub id: String,
    pub name: String,
    pub gateway: String,
    pub subnet: String,
    pub region_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ip_version_serializes_as_number() {
        assert_eq!(serde_json::to_value(IpVersion::V6).unwrap(), 6);
        let parsed: IpVersion = serde_json::from_value(4.into()).unwrap();
        assert_eq!(parsed, IpVersion::V4);
    }

    #[test]
    fn unknown_ip_version_is_rejected() {
        assert!(serde_json::from_value::<IpVersion>(5.into()).is_err());
        assert_eq!(IpVersion::try_from(5), Err("bad IP version 5".to_string()));
    }

    #[test]
    fn filter_constructors_pin_one_field() {
        let filter = DiskFilter::by_name("data");
        assert_eq!(filter.name, "data");
        assert!(filter.id.is_empty() && filter.region_id.is_empty() && filter.vm_id.is_empty());

        let filter = IpFilter::by_ip("10.0.0.1");
        assert_eq!(filter.ip, "10.0.0.1");
        assert_eq!(filter.version, None);
    }
}
