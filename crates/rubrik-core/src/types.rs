//! Core Rubrik domain types.
//!
//! API versions used to build endpoint URLs, and the object types that can be
//! resolved to cluster-internal IDs.

use crate::error::{Error, Result};
use crate::query::QueryParams;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Version segment of a Rubrik API URL (`/api/<version>/...`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    /// Public v1 API
    V1,
    /// Public v2 API
    V2,
    /// Internal API
    Internal,
}

impl ApiVersion {
    /// Returns the URL path segment for this version.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
            Self::Internal => "internal",
        }
    }
}

impl FromStr for ApiVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "v1" => Ok(Self::V1),
            "v2" => Ok(Self::V2),
            "internal" => Ok(Self::Internal),
            _ => Err(Error::InvalidRequest(format!("Unknown API version: {s}"))),
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of cluster object that can be resolved by name to its ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    /// vSphere virtual machine
    Vmware,
    /// SLA domain
    Sla,
    /// vSphere ESXi host
    VmwareHost,
    /// Physical (Linux/Windows) host
    PhysicalHost,
    /// Fileset template
    FilesetTemplate,
    /// Managed volume
    ManagedVolume,
    /// Nutanix AHV virtual machine
    Ahv,
}

impl ObjectType {
    /// Returns the object type name as accepted by the SDK.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Vmware => "vmware",
            Self::Sla => "sla",
            Self::VmwareHost => "vmware_host",
            Self::PhysicalHost => "physical_host",
            Self::FilesetTemplate => "fileset_template",
            Self::ManagedVolume => "managed_volume",
            Self::Ahv => "ahv",
        }
    }

    /// Returns all object types.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Vmware,
            Self::Sla,
            Self::VmwareHost,
            Self::PhysicalHost,
            Self::FilesetTemplate,
            Self::ManagedVolume,
            Self::Ahv,
        ]
    }

    /// API version of the listing endpoint used for ID lookups.
    #[must_use]
    pub const fn api_version(&self) -> ApiVersion {
        match self {
            Self::ManagedVolume | Self::Ahv => ApiVersion::Internal,
            _ => ApiVersion::V1,
        }
    }

    /// Listing endpoint used for ID lookups.
    #[must_use]
    pub const fn lookup_endpoint(&self) -> &'static str {
        match self {
            Self::Vmware => "/vmware/vm",
            Self::Sla => "/sla_domain",
            Self::VmwareHost => "/vmware/host",
            Self::PhysicalHost => "/host",
            Self::FilesetTemplate => "/fileset_template",
            Self::ManagedVolume => "/managed_volume",
            Self::Ahv => "/nutanix/vm",
        }
    }

    /// Field of each listed object compared against the requested name.
    #[must_use]
    pub const fn match_field(&self) -> &'static str {
        match self {
            Self::PhysicalHost => "hostname",
            _ => "name",
        }
    }

    /// Query parameters narrowing the listing to `name`.
    ///
    /// The host listing cannot filter by name server-side, so `vmware_host`
    /// returns every host on the local cluster and relies on client-side matching.
    #[must_use]
    pub fn lookup_query(&self, name: &str) -> Vec<(&'static str, String)> {
        let params = QueryParams::new().with("primary_cluster_id", "local");
        let params = match self {
            Self::Vmware | Self::Ahv | Self::ManagedVolume => {
                params.with("is_relic", false).with("name", name)
            }
            Self::Sla | Self::FilesetTemplate => params.with("name", name),
            Self::PhysicalHost => params.with("hostname", name),
            Self::VmwareHost => params,
        };
        params.into_pairs()
    }
}

impl FromStr for ObjectType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|object_type| object_type.name() == s)
            .ok_or_else(|| Error::InvalidRequest(format!("Unknown object type: {s}")))
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
