//! IP addresses in the v4 schema.
//!
//! v4 allocates addresses through network interfaces: creating an IP creates
//! an interface carrying it, and deleting an IP deletes its owning interface.

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use hosting::{
    CallError, Caller, HostingError, IpAddress, IpFilter, IpManager, IpSchema, IpVersion, Region,
    Result, SparseMap, Vlan, invoke,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::V4;
use crate::convert::{optional_id, parse_id, required_id};
use crate::operation::{Operation, OperationTracker};

pub const IFACE_CREATE: &str = "hosting.iface.create";
pub const IFACE_DELETE: &str = "hosting.iface.delete";
pub const IP_INFO: &str = "hosting.ip.info";
pub const IP_LIST: &str = "hosting.ip.list";

/// Bandwidth requested for new interfaces, in kbit/s.
pub const DEFAULT_BANDWIDTH: i64 = 102_400;

/// IP address as exchanged with the v4 API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpAddressV4 {
    pub id: i64,
    pub ip: String,
    #[serde(rename = "datacenter_id")]
    pub region_id: i64,
    pub version: IpVersion,
    #[serde(default)]
    pub vm_id: Option<i64>,
    #[serde(default)]
    pub state: String,
    /// Interface owning this address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iface_id: Option<i64>,
}

impl IpSchema for V4 {
    type Ip = IpAddressV4;

    fn ip_create_params(region: &Region, version: IpVersion) -> Result<SparseMap> {
        let region = required_id("Region", "ID", &region.id)?;

        let mut params = SparseMap::new();
        params.insert("datacenter_id", region);
        params.insert("ip_version", version.number());
        params.insert("bandwidth", DEFAULT_BANDWIDTH);
        Ok(params)
    }

    fn private_ip_create_params(vlan: &Vlan, ip: &str) -> Result<SparseMap> {
        let vlan_id = required_id("Vlan", "ID", &vlan.id)?;
        let region = required_id("Vlan", "RegionID", &vlan.region_id)?;
        if ip.is_empty() {
            return Err(HostingError::not_provided("IpAddress", "IP"));
        }
        ip.parse::<IpAddr>()
            .map_err(|_| HostingError::parse("IpAddress", "IP", ip))?;

        let mut params = SparseMap::new();
        params.insert("datacenter_id", region);
        params.insert("bandwidth", DEFAULT_BANDWIDTH);
        params.insert("ip", ip);
        params.insert("vlan", vlan_id);
        Ok(params)
    }

    fn ip_filter_params(filter: &IpFilter) -> Result<SparseMap> {
        let mut params = SparseMap::new();
        params.insert_opt("id", optional_id("IpFilter", "ID", &filter.id)?);
        params.insert_non_empty("ip", &filter.ip);
        params.insert_opt(
            "datacenter_id",
            optional_id("IpFilter", "RegionID", &filter.region_id)?,
        );
        params.insert_opt("version", filter.version.map(IpVersion::number));
        params.insert_opt("vm_id", optional_id("IpFilter", "VMID", &filter.vm_id)?);
        Ok(params)
    }

    fn ip_from_wire(ip: IpAddressV4) -> IpAddress {
        IpAddress {
            id: ip.id.to_string(),
            ip: ip.ip,
            region_id: ip.region_id.to_string(),
            version: ip.version,
            attached_vm_id: ip.vm_id.map(|id| id.to_string()),
            state: ip.state,
        }
    }

    fn ip_to_wire(ip: &IpAddress) -> Result<IpAddressV4> {
        let vm_id = match &ip.attached_vm_id {
            Some(id) => Some(parse_id("IpAddress", "AttachedVMID", id)?),
            None => None,
        };

        Ok(IpAddressV4 {
            id: parse_id("IpAddress", "ID", &ip.id)?,
            ip: ip.ip.clone(),
            region_id: parse_id("IpAddress", "RegionID", &ip.region_id)?,
            version: ip.version,
            vm_id,
            state: ip.state.clone(),
            iface_id: None,
        })
    }
}

/// IP address operations against the v4 API.
pub struct IpClient<C> {
    caller: Arc<C>,
    tracker: OperationTracker<C>,
}

impl<C: Caller> IpClient<C> {
    pub fn new(caller: Arc<C>, tracker: OperationTracker<C>) -> Self {
        Self { caller, tracker }
    }

    async fn fetch_wire(&self, id: i64) -> Result<IpAddressV4> {
        let ip = invoke(&*self.caller, IP_INFO, vec![json!(id)]).await?;
        Ok(ip)
    }

    /// Create an interface carrying a new address and read the address back.
    async fn create_iface(&self, params: SparseMap) -> Result<IpAddress> {
        let op: Operation = invoke(&*self.caller, IFACE_CREATE, vec![params.into()]).await?;
        let ip_id = op.ip_id(IFACE_CREATE)?;

        self.tracker.await_completion(op.id).await?;
        let ip = V4::ip_from_wire(self.fetch_wire(ip_id).await?);
        info!(ip_id = %ip.id, address = %ip.ip, operation_id = op.id, "IP created");
        Ok(ip)
    }

    async fn first(&self, filter: IpFilter) -> Result<Option<IpAddress>> {
        Ok(self.list_ips(filter).await?.into_iter().next())
    }
}

#[async_trait]
impl<C: Caller> IpManager for IpClient<C> {
    #[tracing::instrument(skip(self))]
    async fn create_ip(&self, region: &Region, version: IpVersion) -> Result<IpAddress> {
        let params = V4::ip_create_params(region, version)?;
        self.create_iface(params).await
    }

    #[tracing::instrument(skip(self))]
    async fn create_private_ip(&self, vlan: &Vlan, ip: &str) -> Result<IpAddress> {
        let params = V4::private_ip_create_params(vlan, ip)?;
        self.create_iface(params).await
    }

    #[tracing::instrument(skip(self))]
    async fn list_ips(&self, filter: IpFilter) -> Result<Vec<IpAddress>> {
        // ip.list always takes its filter argument; an empty map matches everything
        let params = V4::ip_filter_params(&filter)?;
        let ips: Vec<IpAddressV4> = invoke(&*self.caller, IP_LIST, vec![params.into()]).await?;
        debug!(count = ips.len(), "Listed IPs");
        Ok(ips.into_iter().map(V4::ip_from_wire).collect())
    }

    async fn ip_from_id(&self, id: &str) -> Result<Option<IpAddress>> {
        if id.is_empty() {
            return Ok(None);
        }
        self.first(IpFilter::by_id(id)).await
    }

    async fn ip_from_address(&self, ip: &str) -> Result<Option<IpAddress>> {
        if ip.is_empty() {
            return Ok(None);
        }
        self.first(IpFilter::by_ip(ip)).await
    }

    #[tracing::instrument(skip(self), fields(ip_id = %ip.id))]
    async fn delete_ip(&self, ip: &IpAddress) -> Result<()> {
        let id = required_id("IpAddress", "ID", &ip.id)?;

        let iface_id = self
            .fetch_wire(id)
            .await?
            .iface_id
            .ok_or_else(|| CallError::Malformed {
                method: IP_INFO.to_string(),
                field: "iface_id",
            })?;
        debug!(iface_id, "Resolved owning interface");

        let op: Operation = invoke(&*self.caller, IFACE_DELETE, vec![json!(iface_id)]).await?;
        self.tracker.await_completion(op.id).await?;
        info!(iface_id, operation_id = op.id, "IP {} deleted", id);
        Ok(())
    }
}
