//! Cluster models: bootstrap payloads and node listings.

use rubrik_core::Error;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use validator::Validate;

use crate::Result;

/// DNS servers used when the caller does not provide any.
pub const DEFAULT_DNS_NAMESERVERS: &[&str] = &["8.8.8.8"];
/// NTP servers used when the caller does not provide any.
pub const DEFAULT_NTP_SERVERS: &[&str] = &["pool.ntp.org"];
/// ID of the admin account created during bootstrap.
pub const ADMIN_USER_ID: &str = "admin";

/// Parameters for bootstrapping a new cluster.
///
/// The list fields are optional and resolved to their defaults when the
/// request is turned into a [`BootstrapConfig`].
#[derive(Debug, Clone, Validate)]
pub struct BootstrapRequest {
    /// Unique name to assign to the cluster.
    #[validate(length(min = 1))]
    pub cluster_name: String,
    /// Email address for the admin account.
    #[validate(email)]
    pub admin_email: String,
    /// Password for the admin account.
    pub admin_password: SecretString,
    /// Gateway of the management network.
    #[validate(length(min = 1))]
    pub management_gateway: String,
    /// Subnet mask of the management network.
    #[validate(length(min = 1))]
    pub management_subnet_mask: String,
    /// Enable software encryption at rest.
    pub enable_encryption: bool,
    /// Node name to management IP address.
    pub node_config: Option<BTreeMap<String, String>>,
    /// DNS search domains, empty when unset.
    pub dns_search_domains: Option<Vec<String>>,
    /// DNS nameservers, [`DEFAULT_DNS_NAMESERVERS`] when unset.
    pub dns_nameservers: Option<Vec<String>>,
    /// NTP servers, [`DEFAULT_NTP_SERVERS`] when unset.
    pub ntp_servers: Option<Vec<String>>,
}

impl BootstrapRequest {
    /// Create a request with the required scalars; encryption is enabled.
    #[must_use]
    pub fn new(
        cluster_name: impl Into<String>,
        admin_email: impl Into<String>,
        admin_password: impl Into<String>,
        management_gateway: impl Into<String>,
        management_subnet_mask: impl Into<String>,
    ) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            admin_email: admin_email.into(),
            admin_password: SecretString::from(admin_password.into()),
            management_gateway: management_gateway.into(),
            management_subnet_mask: management_subnet_mask.into(),
            enable_encryption: true,
            node_config: None,
            dns_search_domains: None,
            dns_nameservers: None,
            ntp_servers: None,
        }
    }

    /// Add a single node and its management IP.
    #[must_use]
    pub fn with_node(mut self, name: impl Into<String>, ip: impl Into<String>) -> Self {
        self.node_config
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), ip.into());
        self
    }

    /// Replace the node mapping.
    #[must_use]
    pub fn with_node_config(mut self, node_config: BTreeMap<String, String>) -> Self {
        self.node_config = Some(node_config);
        self
    }

    /// Enable or disable software encryption at rest.
    #[must_use]
    pub const fn with_encryption(mut self, enabled: bool) -> Self {
        self.enable_encryption = enabled;
        self
    }

    /// Set DNS search domains.
    #[must_use]
    pub fn with_dns_search_domains(mut self, domains: Vec<String>) -> Self {
        self.dns_search_domains = Some(domains);
        self
    }

    /// Set DNS nameservers.
    #[must_use]
    pub fn with_dns_nameservers(mut self, nameservers: Vec<String>) -> Self {
        self.dns_nameservers = Some(nameservers);
        self
    }

    /// Set NTP servers.
    #[must_use]
    pub fn with_ntp_servers(mut self, servers: Vec<String>) -> Self {
        self.ntp_servers = Some(servers);
        self
    }

    /// Validate the request and assemble the wire payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] when `node_config` is missing or
    /// empty, or a required field is blank.
    pub fn to_config(&self) -> Result<BootstrapConfig> {
        let node_config = self
            .node_config
            .as_ref()
            .filter(|nodes| !nodes.is_empty())
            .ok_or_else(|| {
                Error::ValidationError(
                    "You must provide a valid, non-empty mapping for `node_config`".to_string(),
                )
            })?;

        for (name, address) in node_config {
            if name.trim().is_empty() {
                return Err(Error::ValidationError(
                    "`node_config` contains a node with a blank name".to_string(),
                ));
            }
            require_non_blank(&format!("node_config[{name}]"), address)?;
        }

        self.validate()?;

        require_non_blank("cluster_name", &self.cluster_name)?;
        require_non_blank("admin_password", self.admin_password.expose_secret())?;
        require_non_blank("management_gateway", &self.management_gateway)?;
        require_non_blank("management_subnet_mask", &self.management_subnet_mask)?;

        let node_configs = node_config
            .iter()
            .map(|(name, address)| {
                let config = NodeConfig {
                    management_ip_config: ManagementIpConfig {
                        netmask: self.management_subnet_mask.clone(),
                        gateway: self.management_gateway.clone(),
                        address: address.clone(),
                    },
                };
                (name.clone(), config)
            })
            .collect();

        Ok(BootstrapConfig {
            enable_software_encryption_at_rest: self.enable_encryption,
            name: self.cluster_name.clone(),
            dns_nameservers: self
                .dns_nameservers
                .clone()
                .unwrap_or_else(|| to_owned_list(DEFAULT_DNS_NAMESERVERS)),
            dns_search_domains: self.dns_search_domains.clone().unwrap_or_default(),
            ntp_servers: self
                .ntp_servers
                .clone()
                .unwrap_or_else(|| to_owned_list(DEFAULT_NTP_SERVERS)),
            admin_user_info: AdminUserInfo {
                password: self.admin_password.expose_secret().to_string(),
                email_address: self.admin_email.clone(),
                id: ADMIN_USER_ID.to_string(),
            },
            node_configs,
        })
    }
}

fn require_non_blank(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::ValidationError(format!("`{field}` must not be blank")));
    }
    Ok(())
}

fn to_owned_list(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

/// Body of `POST /internal/cluster/me/bootstrap`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapConfig {
    /// Software encryption at rest.
    pub enable_software_encryption_at_rest: bool,
    /// Cluster name.
    pub name: String,
    /// DNS nameservers.
    pub dns_nameservers: Vec<String>,
    /// DNS search domains.
    pub dns_search_domains: Vec<String>,
    /// NTP servers.
    pub ntp_servers: Vec<String>,
    /// Admin account created by the bootstrap.
    pub admin_user_info: AdminUserInfo,
    /// Per-node network configuration keyed by node name.
    pub node_configs: BTreeMap<String, NodeConfig>,
}

/// Admin account details.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserInfo {
    /// Admin password.
    pub password: String,
    /// Admin email address.
    pub email_address: String,
    /// Account ID, always `admin`.
    pub id: String,
}

impl fmt::Debug for AdminUserInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminUserInfo")
            .field("password", &"[REDACTED]")
            .field("email_address", &self.email_address)
            .field("id", &self.id)
            .finish()
    }
}

/// Network configuration of one node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfig {
    /// Management interface settings.
    pub management_ip_config: ManagementIpConfig,
}

/// Management interface settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManagementIpConfig {
    /// Subnet mask.
    pub netmask: String,
    /// Gateway address.
    pub gateway: String,
    /// Node address.
    pub address: String,
}

/// Response of `GET /internal/cluster/me/node`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeList {
    /// Cluster nodes in the order the cluster reports them.
    pub data: Vec<Node>,
}

impl NodeList {
    /// Management IP of every node, in order.
    #[must_use]
    pub fn ip_addresses(&self) -> Vec<String> {
        self.data.iter().map(|node| node.ip_address.clone()).collect()
    }
}

/// A single cluster node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    /// Management IP address.
    #[serde(rename = "ipAddress")]
    pub ip_address: String,
    /// Remaining fields, kept as returned.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of [`crate::ClusterClient::end_user_authorization`].
#[derive(Debug, Clone, PartialEq)]
pub struct EndUserLookup {
    /// ID of the object the end user would be authorized on.
    pub object_id: String,
    /// Raw response of the user lookup.
    pub user: Value,
}
