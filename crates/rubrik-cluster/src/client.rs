//! Asynchronous client for the Rubrik cluster endpoints.

use crate::models::{BootstrapRequest, EndUserLookup, NodeList};
use crate::Result;
use rubrik_core::query::QueryParams;
use rubrik_core::{ApiTransport, ApiVersion, Error, HttpTransport, ObjectType, RubrikClientConfig};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const VERSION_ENDPOINT: &str = "/cluster/me/version";
const NODE_ENDPOINT: &str = "/cluster/me/node";
const BOOTSTRAP_ENDPOINT: &str = "/cluster/me/bootstrap";
const USER_ENDPOINT: &str = "/user";

/// Bootstrap request ID queried when none is given.
pub const DEFAULT_BOOTSTRAP_REQUEST_ID: &str = "1";

/// Object types an end user can be authorized on.
pub const END_USER_OBJECT_TYPES: &[ObjectType] = &[ObjectType::Vmware];

/// Client for cluster-level management of a Rubrik cluster.
///
/// Every call takes an optional timeout; `None` falls back to the client
/// default (15 seconds unless configured otherwise).
#[derive(Clone)]
pub struct ClusterClient {
    transport: Arc<dyn ApiTransport>,
    default_timeout: Duration,
}

impl ClusterClient {
    /// Create a client on top of an existing transport.
    #[must_use]
    pub fn new(transport: Arc<dyn ApiTransport>) -> Self {
        Self {
            transport,
            default_timeout: Duration::from_secs(rubrik_core::client::RUBRIK_DEFAULT_TIMEOUT),
        }
    }

    /// Create a client backed by an [`HttpTransport`] for the configured cluster.
    pub fn from_config(config: &RubrikClientConfig) -> Result<Self> {
        let transport = HttpTransport::from_config(config)?;
        Ok(Self::new(Arc::new(transport)).with_default_timeout(config.timeout()))
    }

    /// Override the timeout used when a call does not pass one.
    #[must_use]
    pub const fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Software version running on the cluster.
    pub async fn cluster_version(&self, timeout: Option<Duration>) -> Result<Value> {
        info!("cluster_version: Getting the software version of the Rubrik cluster.");
        self.transport
            .get(
                ApiVersion::V1,
                VERSION_ENDPOINT,
                &[],
                self.timeout(timeout),
                true,
            )
            .await
    }

    /// Management IP address of each node, in the order the cluster lists them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] if the response lacks `data` or a node
    /// lacks `ipAddress`.
    pub async fn cluster_node_ip(&self, timeout: Option<Duration>) -> Result<Vec<String>> {
        info!("cluster_node_ip: Generating a list of all cluster node IPs.");
        let response = self
            .transport
            .get(
                ApiVersion::Internal,
                NODE_ENDPOINT,
                &[],
                self.timeout(timeout),
                true,
            )
            .await?;

        let nodes: NodeList = serde_json::from_value(response).map_err(|err| {
            Error::ParseError(format!("Unexpected node listing from `{NODE_ENDPOINT}`: {err}"))
        })?;

        Ok(nodes.ip_addresses())
    }

    /// Issue a bootstrap request to an unconfigured cluster.
    ///
    /// The request is sent without credentials. Nothing is sent when the
    /// request fails validation.
    pub async fn bootstrap(
        &self,
        request: &BootstrapRequest,
        timeout: Option<Duration>,
    ) -> Result<Value> {
        let config = request.to_config()?;
        let body = serde_json::to_value(&config)?;

        info!(
            cluster = %config.name,
            nodes = config.node_configs.len(),
            "bootstrap: Starting the bootstrap process."
        );
        self.transport
            .post(
                ApiVersion::Internal,
                BOOTSTRAP_ENDPOINT,
                &body,
                self.timeout(timeout),
                false,
            )
            .await
    }

    /// Status of a bootstrap request; `request_id` defaults to `"1"`.
    pub async fn bootstrap_status(
        &self,
        request_id: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<Value> {
        let params = QueryParams::new()
            .with(
                "request_id",
                request_id.unwrap_or(DEFAULT_BOOTSTRAP_REQUEST_ID),
            )
            .into_pairs();

        info!("bootstrap_status: Getting the status of the Rubrik cluster bootstrap.");
        self.transport
            .get(
                ApiVersion::Internal,
                BOOTSTRAP_ENDPOINT,
                &params,
                self.timeout(timeout),
                false,
            )
            .await
    }

    /// Resolve the object and the end user an authorization would apply to.
    ///
    /// `object_type` defaults to `vmware`, the only type currently accepted.
    /// No authorization is granted: the call returns the resolved object ID
    /// together with the raw user lookup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`], without contacting the cluster,
    /// when `object_type` is not supported.
    pub async fn end_user_authorization(
        &self,
        object_name: &str,
        end_user: &str,
        object_type: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<EndUserLookup> {
        let object_type = end_user_object_type(object_type.unwrap_or("vmware"))?;
        let timeout = self.timeout(timeout);

        info!(
            "end_user_authorization: Searching the Rubrik cluster for the vSphere VM '{object_name}'."
        );
        let object_id = self
            .transport
            .object_id(object_name, object_type, timeout)
            .await?;

        info!("end_user_authorization: Searching the Rubrik cluster for the end user '{end_user}'.");
        let params = QueryParams::new().with("username", end_user).into_pairs();
        let user = self
            .transport
            .get(ApiVersion::Internal, USER_ENDPOINT, &params, timeout, true)
            .await?;

        // TODO: grant the authorization once the internal authorization endpoint is wired up.
        Ok(EndUserLookup { object_id, user })
    }

    fn timeout(&self, timeout: Option<Duration>) -> Duration {
        timeout.unwrap_or(self.default_timeout)
    }
}

fn end_user_object_type(name: &str) -> Result<ObjectType> {
    END_USER_OBJECT_TYPES
        .iter()
        .copied()
        .find(|object_type| object_type.name() == name)
        .ok_or_else(|| {
            let valid: Vec<_> = END_USER_OBJECT_TYPES.iter().map(ObjectType::name).collect();
            Error::ValidationError(format!(
                "The end_user_authorization() object_type argument must be one of the following: {valid:?}"
            ))
        })
}
