//! SSH keys in the v4 schema.
//!
//! Key calls are synchronous on the remote side: no operation handle is
//! involved. `ssh.list` only returns summaries, so full keys need one
//! `ssh.info` per key.

use std::sync::Arc;

use async_trait::async_trait;
use hosting::{
    CallError, Caller, HostingError, KeyManager, KeySchema, Result, SparseMap, SshKey, invoke,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::V4;
use crate::convert::{parse_id, required_id};

pub const SSH_CREATE: &str = "hosting.ssh.create";
pub const SSH_DELETE: &str = "hosting.ssh.delete";
pub const SSH_INFO: &str = "hosting.ssh.info";
pub const SSH_LIST: &str = "hosting.ssh.list";

/// SSH key as exchanged with the v4 API; only the id differs from the domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshKeyV4 {
    #[serde(default)]
    pub fingerprint: String,
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

impl KeySchema for V4 {
    type Key = SshKeyV4;

    fn key_create_params(name: &str, value: &str) -> Result<SparseMap> {
        if name.is_empty() {
            return Err(HostingError::not_provided("SshKey", "Name"));
        }
        if value.is_empty() {
            return Err(HostingError::not_provided("SshKey", "Value"));
        }

        let mut params = SparseMap::new();
        params.insert("name", name);
        params.insert("value", value);
        Ok(params)
    }

    fn key_from_wire(key: SshKeyV4) -> SshKey {
        SshKey {
            id: key.id.to_string(),
            fingerprint: key.fingerprint,
            name: key.name,
            value: key.value,
        }
    }

    fn key_to_wire(key: &SshKey) -> Result<SshKeyV4> {
        Ok(SshKeyV4 {
            fingerprint: key.fingerprint.clone(),
            id: parse_id("SshKey", "ID", &key.id)?,
            name: key.name.clone(),
            value: key.value.clone(),
        })
    }
}

/// SSH key operations against the v4 API.
pub struct KeyClient<C> {
    caller: Arc<C>,
}

impl<C: Caller> KeyClient<C> {
    pub fn new(caller: Arc<C>) -> Self {
        Self { caller }
    }

    async fn fetch(&self, id: i64) -> Result<SshKey> {
        let key: SshKeyV4 = invoke(&*self.caller, SSH_INFO, vec![json!(id)]).await?;
        Ok(V4::key_from_wire(key))
    }

    async fn summaries(&self, params: Vec<serde_json::Value>) -> Result<Vec<SshKeyV4>> {
        let keys = invoke(&*self.caller, SSH_LIST, params).await?;
        Ok(keys)
    }
}

#[async_trait]
impl<C: Caller> KeyManager for KeyClient<C> {
    #[tracing::instrument(skip(self, value))]
    async fn create_key(&self, name: &str, value: &str) -> Result<SshKey> {
        let params = V4::key_create_params(name, value)?;
        let created: SshKeyV4 = invoke(&*self.caller, SSH_CREATE, vec![params.into()]).await?;

        let key = self.fetch(created.id).await?;
        info!(key_id = %key.id, fingerprint = %key.fingerprint, "SSH key created");
        Ok(key)
    }

    #[tracing::instrument(skip(self), fields(key_id = %key.id))]
    async fn delete_key(&self, key: &SshKey) -> Result<()> {
        let id = required_id("SshKey", "ID", &key.id)?;

        let deleted: bool = invoke(&*self.caller, SSH_DELETE, vec![json!(id)]).await?;
        if !deleted {
            return Err(CallError::Rejected {
                method: SSH_DELETE.to_string(),
            }
            .into());
        }
        info!("SSH key {} deleted", id);
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn list_keys(&self) -> Result<Vec<SshKey>> {
        let summaries = self.summaries(Vec::new()).await?;
        debug!(count = summaries.len(), "Fetching key details");

        let mut keys = Vec::with_capacity(summaries.len());
        for summary in summaries {
            keys.push(self.fetch(summary.id).await?);
        }
        Ok(keys)
    }

    async fn key_from_name(&self, name: &str) -> Result<Option<SshKey>> {
        if name.is_empty() {
            return Ok(None);
        }
        let mut filter = SparseMap::new();
        filter.insert("name", name);

        match self.summaries(vec![filter.into()]).await?.into_iter().next() {
            Some(summary) => self.fetch(summary.id).await.map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hosting::test_util::assert_key_round_trip;

    #[test]
    fn create_params_need_name_and_value() {
        assert_eq!(
            V4::key_create_params("", "ssh-ed25519 AAAA").unwrap_err().field(),
            Some("Name")
        );
        assert_eq!(
            V4::key_create_params("laptop", "").unwrap_err().field(),
            Some("Value")
        );
        let params = V4::key_create_params("laptop", "ssh-ed25519 AAAA").unwrap();
        assert_eq!(
            serde_json::Value::from(params),
            json!({"name": "laptop", "value": "ssh-ed25519 AAAA"})
        );
    }

    #[test]
    fn summaries_decode_without_value() {
        let key: SshKeyV4 =
            serde_json::from_value(json!({"id": 42, "name": "laptop", "fingerprint": "ab:cd"}))
                .unwrap();
        let key = V4::key_from_wire(key);
        assert_eq!(key.id, "42");
        assert!(key.value.is_empty());
    }

    #[test]
    fn round_trips_through_wire() {
        for id in [0, 1, 42, 510_042, i64::MAX] {
            assert_key_round_trip::<V4>(&SshKey {
                id: id.to_string(),
                fingerprint: format!("ab:cd:{:02x}", id % 256),
                name: format!("key{id}"),
                value: "ssh-ed25519 AAAA".into(),
            });
        }
    }
}
