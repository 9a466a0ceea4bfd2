//! Disks in the v4 schema.

use std::sync::Arc;

use async_trait::async_trait;
use hosting::{
    Caller, Disk, DiskFilter, DiskImage, DiskManager, DiskSchema, DiskSpec, HostingError, Result,
    SparseMap, invoke,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::V4;
use crate::convert::{gb_to_mb, mb_to_gb, optional_id, parse_id, required_id};
use crate::operation::{Operation, OperationTracker};

pub const DISK_CREATE: &str = "hosting.disk.create";
pub const DISK_CREATE_FROM: &str = "hosting.disk.create_from";
pub const DISK_DELETE: &str = "hosting.disk.delete";
pub const DISK_UPDATE: &str = "hosting.disk.update";
pub const DISK_INFO: &str = "hosting.disk.info";
pub const DISK_LIST: &str = "hosting.disk.list";

/// Disk as exchanged with the v4 API. Sizes are in MB.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskV4 {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub size: i64,
    #[serde(rename = "datacenter_id")]
    pub region_id: i64,
    #[serde(default)]
    pub state: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(rename = "vms_id", default)]
    pub vm_ids: Vec<i64>,
    #[serde(default)]
    pub is_boot_disk: bool,
}

impl DiskSchema for V4 {
    type Disk = DiskV4;

    fn disk_create_params(spec: &DiskSpec) -> Result<SparseMap> {
        let region = required_id("DiskSpec", "RegionID", &spec.region_id)?;

        let mut params = SparseMap::new();
        params.insert("datacenter_id", region);
        params.insert_non_empty("name", &spec.name);
        if spec.size > 0 {
            params.insert("size", gb_to_mb("DiskSpec", spec.size)?);
        }
        Ok(params)
    }

    fn disk_filter_params(filter: &DiskFilter) -> Result<SparseMap> {
        let mut params = SparseMap::new();
        params.insert_opt("id", optional_id("DiskFilter", "ID", &filter.id)?);
        params.insert_opt(
            "datacenter_id",
            optional_id("DiskFilter", "RegionID", &filter.region_id)?,
        );
        params.insert_non_empty("name", &filter.name);
        params.insert_opt("vm_id", optional_id("DiskFilter", "VMID", &filter.vm_id)?);
        Ok(params)
    }

    fn disk_from_wire(disk: DiskV4) -> Disk {
        Disk {
            id: disk.id.to_string(),
            name: disk.name,
            size: mb_to_gb(disk.size),
            region_id: disk.region_id.to_string(),
            state: disk.state,
            kind: disk.kind,
            attached_vm_ids: disk.vm_ids.iter().map(i64::to_string).collect(),
            is_boot_disk: disk.is_boot_disk,
        }
    }

    fn disk_to_wire(disk: &Disk) -> Result<DiskV4> {
        let vm_ids = disk
            .attached_vm_ids
            .iter()
            .map(|id| parse_id("Disk", "AttachedVMIDs", id))
            .collect::<Result<Vec<_>>>()?;

        Ok(DiskV4 {
            id: parse_id("Disk", "ID", &disk.id)?,
            name: disk.name.clone(),
            size: gb_to_mb("Disk", disk.size)?,
            region_id: parse_id("Disk", "RegionID", &disk.region_id)?,
            state: disk.state.clone(),
            kind: disk.kind.clone(),
            vm_ids,
            is_boot_disk: disk.is_boot_disk,
        })
    }
}

/// Regions name the same datacenter: equal ids when both parse, equal text otherwise.
fn same_region(a: &str, b: &str) -> bool {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Disk operations against the v4 API.
pub struct DiskClient<C> {
    caller: Arc<C>,
    tracker: OperationTracker<C>,
}

impl<C: Caller> DiskClient<C> {
    pub fn new(caller: Arc<C>, tracker: OperationTracker<C>) -> Self {
        Self { caller, tracker }
    }

    async fn fetch_wire(&self, id: i64) -> Result<DiskV4> {
        let disk = invoke(&*self.caller, DISK_INFO, vec![json!(id)]).await?;
        Ok(disk)
    }

    /// Read one disk by its wire id.
    async fn fetch(&self, id: i64) -> Result<Disk> {
        Ok(V4::disk_from_wire(self.fetch_wire(id).await?))
    }

    /// Issue a disk mutation, wait for it and read the disk back.
    ///
    /// Updates already know their disk, so `known_id` covers handles that
    /// omit `disk_id`.
    async fn mutate(
        &self,
        method: &str,
        params: Vec<Value>,
        known_id: Option<i64>,
    ) -> Result<Disk> {
        let op: Operation = invoke(&*self.caller, method, params).await?;
        let disk_id = match known_id {
            Some(id) => op.disk_id.unwrap_or(id),
            None => op.disk_id(method)?,
        };

        self.tracker.await_completion(op.id).await?;
        let disk = self.fetch(disk_id).await?;
        info!(disk_id = %disk.id, operation_id = op.id, "{} finished", method);
        Ok(disk)
    }

    /// Pick the first disk matching `filter`, if any.
    async fn first(&self, filter: DiskFilter) -> Result<Option<Disk>> {
        Ok(self.list_disks(filter).await?.into_iter().next())
    }
}

#[async_trait]
impl<C: Caller> DiskManager for DiskClient<C> {
    #[tracing::instrument(skip(self))]
    async fn create_disk(&self, spec: DiskSpec) -> Result<Disk> {
        let params = V4::disk_create_params(&spec)?;
        self.mutate(DISK_CREATE, vec![params.into()], None).await
    }

    #[tracing::instrument(skip(self))]
    async fn create_disk_from_image(&self, spec: DiskSpec, image: DiskImage) -> Result<Disk> {
        if image.disk_id.is_empty() {
            return Err(HostingError::not_provided("DiskImage", "DiskID"));
        }
        if !spec.region_id.is_empty()
            && !image.region_id.is_empty()
            && !same_region(&spec.region_id, &image.region_id)
        {
            return Err(HostingError::Mismatch {
                entity: "DiskSpec",
                field: "RegionID",
                expected: image.region_id,
                found: spec.region_id,
            });
        }

        let mut spec = spec;
        if spec.region_id.is_empty() {
            spec.region_id = image.region_id.clone();
        }
        let params = V4::disk_create_params(&spec)?;
        let image_id = parse_id("DiskImage", "DiskID", &image.disk_id)?;

        self.mutate(DISK_CREATE_FROM, vec![params.into(), json!(image_id)], None)
            .await
    }

    async fn list_all_disks(&self) -> Result<Vec<Disk>> {
        self.list_disks(DiskFilter::default()).await
    }

    #[tracing::instrument(skip(self))]
    async fn list_disks(&self, filter: DiskFilter) -> Result<Vec<Disk>> {
        let params = V4::disk_filter_params(&filter)?.into_filter_params();
        // disk.list and disk.info return the same fields
        let disks: Vec<DiskV4> = invoke(&*self.caller, DISK_LIST, params).await?;
        debug!(count = disks.len(), "Listed disks");
        Ok(disks.into_iter().map(V4::disk_from_wire).collect())
    }

    async fn disk_from_id(&self, id: &str) -> Result<Option<Disk>> {
        if id.is_empty() {
            return Ok(None);
        }
        self.first(DiskFilter::by_id(id)).await
    }

    async fn disk_from_name(&self, name: &str) -> Result<Option<Disk>> {
        if name.is_empty() {
            return Ok(None);
        }
        self.first(DiskFilter::by_name(name)).await
    }

    #[tracing::instrument(skip(self), fields(disk_id = %disk.id))]
    async fn delete_disk(&self, disk: &Disk) -> Result<()> {
        let id = required_id("Disk", "ID", &disk.id)?;

        let op: Operation = invoke(&*self.caller, DISK_DELETE, vec![json!(id)]).await?;
        self.tracker.await_completion(op.id).await?;
        info!(operation_id = op.id, "Disk {} deleted", id);
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(disk_id = %disk.id))]
    async fn extend_disk(&self, disk: &Disk, size_gb: u64) -> Result<Disk> {
        let id = required_id("Disk", "ID", &disk.id)?;
        let delta = gb_to_mb("Disk", size_gb)?;

        // the domain size is rounded down to whole GB, so grow from the wire size
        let current = self.fetch_wire(id).await?.size;
        let size = current
            .checked_add(delta)
            .ok_or_else(|| HostingError::parse("Disk", "Size", size_gb.to_string()))?;
        debug!(current, size, "Extending disk");

        let mut update = SparseMap::new();
        update.insert("size", size);

        self.mutate(DISK_UPDATE, vec![json!(id), update.into()], Some(id))
            .await
    }

    #[tracing::instrument(skip(self), fields(disk_id = %disk.id))]
    async fn rename_disk(&self, disk: &Disk, name: &str) -> Result<Disk> {
        let id = required_id("Disk", "ID", &disk.id)?;
        if name.is_empty() {
            return Err(HostingError::not_provided("Disk", "Name"));
        }
        let mut update = SparseMap::new();
        update.insert("name", name);

        self.mutate(DISK_UPDATE, vec![json!(id), update.into()], Some(id))
            .await
    }
}
