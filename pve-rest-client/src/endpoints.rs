//! A few typed API endpoints.
//!
//! Path components are part of the request struct but are not serialized, everything else is
//! sent as parameter. Unset optional fields are left out.

use serde::{Deserialize, Serialize};

use crate::params::IndexedParams;
use crate::{ResponseType, Verb};

/// Highest number of network devices of a QEMU guest.
pub const QEMU_NET_COUNT: usize = 32;

/// A typed API call.
pub trait ApiEndpoint: Serialize {
    const VERB: Verb;
    const RESPONSE_TYPE: ResponseType = ResponseType::Json;

    /// The resource path relative to `/api2/{format}`.
    fn resource(&self) -> String;
}

/// `GET /version`
#[derive(Clone, Debug, Default, Serialize)]
pub struct GetVersion;

impl ApiEndpoint for GetVersion {
    const VERB: Verb = Verb::Get;

    fn resource(&self) -> String {
        "/version".to_string()
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct VersionResponse {
    pub release: String,
    pub repoid: String,
    pub version: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterResourceKind {
    Vm,
    Storage,
    Node,
    Sdn,
}
serde_plain::derive_display_from_serialize!(ClusterResourceKind);
serde_plain::derive_fromstr_from_deserialize!(ClusterResourceKind);

/// `GET /cluster/resources`
#[derive(Clone, Debug, Default, Serialize)]
pub struct GetClusterResources {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<ClusterResourceKind>,
}

impl ApiEndpoint for GetClusterResources {
    const VERB: Verb = Verb::Get;

    fn resource(&self) -> String {
        "/cluster/resources".to_string()
    }
}

/// An entry of the cluster resource list.
#[derive(Debug, Deserialize, Serialize)]
pub struct ClusterResource {
    pub id: String,

    #[serde(rename = "type")]
    pub ty: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(deserialize_with = "pve_login::parse::deserialize_u32")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vmid: Option<u32>,

    #[serde(deserialize_with = "pve_login::parse::deserialize_u64")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxmem: Option<u64>,

    #[serde(deserialize_with = "pve_login::parse::deserialize_bool")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<bool>,
}

/// `POST /nodes/{node}/qemu/{vmid}/status/start`
#[derive(Clone, Debug, Serialize)]
pub struct StartQemu {
    #[serde(skip)]
    pub node: String,

    #[serde(skip)]
    pub vmid: u32,

    /// Specifies the QEMU machine type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine: Option<String>,

    /// Ignore locks, only root is allowed to use this option.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skiplock: Option<bool>,

    /// Wait maximal timeout seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl StartQemu {
    pub fn new(node: impl Into<String>, vmid: u32) -> Self {
        Self {
            node: node.into(),
            vmid,
            machine: None,
            skiplock: None,
            timeout: None,
        }
    }
}

impl ApiEndpoint for StartQemu {
    const VERB: Verb = Verb::Create;

    fn resource(&self) -> String {
        format!("/nodes/{}/qemu/{}/status/start", self.node, self.vmid)
    }
}

/// `POST /nodes/{node}/qemu/{vmid}/status/stop`
#[derive(Clone, Debug, Serialize)]
pub struct StopQemu {
    #[serde(skip)]
    pub node: String,

    #[serde(skip)]
    pub vmid: u32,

    /// Do not deactivate storage volumes.
    #[serde(rename = "keepActive", skip_serializing_if = "Option::is_none")]
    pub keep_active: Option<bool>,

    /// Abort a running shutdown task before stopping.
    #[serde(rename = "overrule-shutdown", skip_serializing_if = "Option::is_none")]
    pub overrule_shutdown: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub skiplock: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl StopQemu {
    pub fn new(node: impl Into<String>, vmid: u32) -> Self {
        Self {
            node: node.into(),
            vmid,
            keep_active: None,
            overrule_shutdown: None,
            skiplock: None,
            timeout: None,
        }
    }
}

impl ApiEndpoint for StopQemu {
    const VERB: Verb = Verb::Create;

    fn resource(&self) -> String {
        format!("/nodes/{}/qemu/{}/status/stop", self.node, self.vmid)
    }
}

/// `PUT /nodes/{node}/qemu/{vmid}/config`
#[derive(Clone, Debug, Serialize)]
pub struct UpdateQemuConfig {
    #[serde(skip)]
    pub node: String,

    #[serde(skip)]
    pub vmid: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cores: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// A list of settings to delete.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<String>,

    /// Prevent changes if the current configuration has a different digest.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,

    /// Network devices, sent as `net0` ... `net31`.
    #[serde(flatten)]
    pub net: IndexedParams<String, QEMU_NET_COUNT>,
}

impl UpdateQemuConfig {
    pub fn new(node: impl Into<String>, vmid: u32) -> Self {
        Self {
            node: node.into(),
            vmid,
            cores: None,
            memory: None,
            name: None,
            description: None,
            delete: None,
            digest: None,
            net: IndexedParams::new("net"),
        }
    }
}

impl ApiEndpoint for UpdateQemuConfig {
    const VERB: Verb = Verb::Set;

    fn resource(&self) -> String {
        format!("/nodes/{}/qemu/{}/config", self.node, self.vmid)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VzdumpMode {
    Snapshot,
    Suspend,
    Stop,
}
serde_plain::derive_display_from_serialize!(VzdumpMode);
serde_plain::derive_fromstr_from_deserialize!(VzdumpMode);

/// `POST /nodes/{node}/vzdump`
#[derive(Clone, Debug, Serialize)]
pub struct CreateVzdump {
    #[serde(skip)]
    pub node: String,

    /// Backup all known guest systems on this host.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub compress: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<VzdumpMode>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<String>,

    /// The ID of the guest system you want to backup, comma separated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vmid: Option<String>,
}

impl CreateVzdump {
    pub fn new(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            all: None,
            compress: None,
            mode: None,
            storage: None,
            vmid: None,
        }
    }
}

impl ApiEndpoint for CreateVzdump {
    const VERB: Verb = Verb::Create;

    fn resource(&self) -> String {
        format!("/nodes/{}/vzdump", self.node)
    }
}

/// `DELETE /nodes/{node}/qemu/{vmid}`
#[derive(Clone, Debug, Serialize)]
pub struct DeleteQemu {
    #[serde(skip)]
    pub node: String,

    #[serde(skip)]
    pub vmid: u32,

    /// Remove the guest from backup jobs, replication and HA.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purge: Option<bool>,

    #[serde(
        rename = "destroy-unreferenced-disks",
        skip_serializing_if = "Option::is_none"
    )]
    pub destroy_unreferenced_disks: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub skiplock: Option<bool>,
}

impl DeleteQemu {
    pub fn new(node: impl Into<String>, vmid: u32) -> Self {
        Self {
            node: node.into(),
            vmid,
            purge: None,
            destroy_unreferenced_disks: None,
            skiplock: None,
        }
    }
}

impl ApiEndpoint for DeleteQemu {
    const VERB: Verb = Verb::Delete;

    fn resource(&self) -> String {
        format!("/nodes/{}/qemu/{}", self.node, self.vmid)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::params::to_parameters;

    #[test]
    fn path_fields_are_not_parameters() {
        let mut start = StartQemu::new("pve1", 100);
        start.timeout = Some(30);

        assert_eq!(start.resource(), "/nodes/pve1/qemu/100/status/start");
        let params = to_parameters(&start).unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("timeout"), Some(&json!(30)));
    }

    #[test]
    fn unit_endpoint_has_no_parameters() {
        assert!(to_parameters(&GetVersion).unwrap().is_empty());
    }

    #[test]
    fn indexed_network_devices() {
        let mut config = UpdateQemuConfig::new("pve1", 100);
        config.cores = Some(2);
        config.net.insert(0, "virtio,bridge=vmbr0".to_string()).unwrap();
        config.net.insert(3, "e1000,bridge=vmbr1".to_string()).unwrap();
        assert!(config.net.insert(QEMU_NET_COUNT, String::new()).is_err());

        let params = to_parameters(&config).unwrap();
        assert_eq!(params.get("cores"), Some(&json!(2)));
        assert_eq!(params.get("net0"), Some(&json!("virtio,bridge=vmbr0")));
        assert_eq!(params.get("net3"), Some(&json!("e1000,bridge=vmbr1")));
        assert_eq!(params.get("net1"), None);
    }

    #[test]
    fn renamed_fields() {
        let mut stop = StopQemu::new("pve1", 100);
        stop.keep_active = Some(true);
        stop.overrule_shutdown = Some(false);

        let params = to_parameters(&stop).unwrap();
        assert_eq!(params.get("keepActive"), Some(&json!(true)));
        assert_eq!(params.get("overrule-shutdown"), Some(&json!(false)));
    }

    #[test]
    fn cluster_resources_decode_perlish_values() {
        let resource: ClusterResource = serde_json::from_value(json!({
            "id": "qemu/100",
            "type": "qemu",
            "node": "pve1",
            "vmid": "100",
            "maxmem": 2147483648u64,
            "template": 0,
        }))
        .unwrap();

        assert_eq!(resource.vmid, Some(100));
        assert_eq!(resource.maxmem, Some(2147483648));
        assert_eq!(resource.template, Some(false));
        assert_eq!(resource.status, None);
    }

    #[test]
    fn resource_kind_filter() {
        let params = to_parameters(&GetClusterResources {
            ty: Some(ClusterResourceKind::Vm),
        })
        .unwrap();
        assert_eq!(params.get("type"), Some(&json!("vm")));
        assert_eq!(
            "storage".parse::<ClusterResourceKind>().unwrap(),
            ClusterResourceKind::Storage
        );
    }
}
