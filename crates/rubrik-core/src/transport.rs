//! API transport shared by every Rubrik resource client.
//!
//! [`ApiTransport`] is the seam resource clients are written against; it is
//! what the resource clients hold instead of inheriting HTTP behaviour.
//! [`HttpTransport`] is the reqwest implementation that talks to a cluster.

use crate::client::ClientConfig;
use crate::config::RubrikClientConfig;
use crate::types::{ApiVersion, ObjectType};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Method};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const USER_AGENT: &str = concat!("rubrik-core/", env!("CARGO_PKG_VERSION"));

/// Authenticated HTTP access to a Rubrik cluster.
///
/// Every call names the API version and endpoint path (starting with `/`),
/// carries its own timeout, and states whether credentials must be sent.
/// Responses are returned as decoded JSON, `Value::Null` for empty bodies.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// Issue a GET request with optional query parameters.
    async fn get(
        &self,
        version: ApiVersion,
        endpoint: &str,
        params: &[(&'static str, String)],
        timeout: Duration,
        authenticated: bool,
    ) -> Result<Value>;

    /// Issue a POST request with a JSON body.
    async fn post(
        &self,
        version: ApiVersion,
        endpoint: &str,
        body: &Value,
        timeout: Duration,
        authenticated: bool,
    ) -> Result<Value>;

    /// Issue a PATCH request with a JSON body.
    async fn patch(
        &self,
        version: ApiVersion,
        endpoint: &str,
        body: &Value,
        timeout: Duration,
        authenticated: bool,
    ) -> Result<Value>;

    /// Issue a DELETE request.
    async fn delete(
        &self,
        version: ApiVersion,
        endpoint: &str,
        timeout: Duration,
        authenticated: bool,
    ) -> Result<Value>;

    /// Resolve the name of a cluster object to its internal ID.
    async fn object_id(
        &self,
        name: &str,
        object_type: ObjectType,
        timeout: Duration,
    ) -> Result<String>;
}

/// Look up `name` through the listing endpoint of `object_type`.
///
/// Only exact matches on the type's match field count. No match is
/// [`Error::NotFound`], more than one is [`Error::AmbiguousObject`].
pub async fn resolve_object_id<T>(
    transport: &T,
    name: &str,
    object_type: ObjectType,
    timeout: Duration,
) -> Result<String>
where
    T: ApiTransport + ?Sized,
{
    debug!(%object_type, name, "Resolving object ID");

    let params = object_type.lookup_query(name);
    let response = transport
        .get(
            object_type.api_version(),
            object_type.lookup_endpoint(),
            &params,
            timeout,
            true,
        )
        .await?;

    let listing: ObjectListing = serde_json::from_value(response).map_err(|err| {
        Error::ParseError(format!(
            "Unexpected {object_type} listing from `{}`: {err}",
            object_type.lookup_endpoint()
        ))
    })?;

    let field = object_type.match_field();
    let mut ids = listing
        .data
        .iter()
        .filter(|object| object.get(field).and_then(Value::as_str) == Some(name))
        .filter_map(|object| object.get("id").and_then(Value::as_str));

    match (ids.next(), ids.next()) {
        (Some(id), None) => Ok(id.to_string()),
        (None, _) => Err(Error::NotFound(format!(
            "The {object_type} object '{name}' was not found on the Rubrik cluster"
        ))),
        (Some(_), Some(_)) => Err(Error::AmbiguousObject(format!(
            "Multiple {object_type} objects named '{name}' were found on the Rubrik cluster"
        ))),
    }
}

#[derive(Debug, Deserialize)]
struct ObjectListing {
    data: Vec<Map<String, Value>>,
}

enum Credentials {
    Token(SecretString),
    Basic {
        username: String,
        password: SecretString,
    },
}

/// Builder for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportBuilder {
    config: RubrikClientConfig,
    http_config: ClientConfig,
}

impl HttpTransportBuilder {
    /// Create a builder from a [`RubrikClientConfig`].
    #[must_use]
    pub fn new(config: RubrikClientConfig) -> Self {
        let http_config = ClientConfig::new().with_timeout(config.timeout());
        Self {
            config,
            http_config,
        }
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, http_config: ClientConfig) -> Self {
        self.http_config = http_config;
        self
    }

    /// Finalise the builder and create the [`HttpTransport`].
    pub fn build(self) -> Result<HttpTransport> {
        self.config.validate_config()?;
        let base_url = self.config.base_url()?;

        let mut builder = ClientBuilder::new()
            .user_agent(USER_AGENT)
            .timeout(self.http_config.timeout)
            .connect_timeout(self.http_config.connect_timeout)
            .gzip(self.http_config.enable_compression);

        if !self.config.tls_verify {
            warn!(node = %self.config.node_ip, "TLS verification disabled for Rubrik client");
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(ca_cert) = &self.config.tls_ca_cert {
            debug!("loading Rubrik CA certificate from {}", ca_cert.display());
            let bytes = std::fs::read(ca_cert).map_err(|err| {
                Error::ConfigError(format!(
                    "Failed to read Rubrik CA certificate {}: {err}",
                    ca_cert.display()
                ))
            })?;
            let cert = reqwest::Certificate::from_pem(&bytes).map_err(|err| {
                Error::ConfigError(format!("Invalid Rubrik CA certificate: {err}"))
            })?;
            builder = builder.add_root_certificate(cert);
        }

        let http = builder.build().map_err(|err| {
            Error::ConfigError(format!("Failed to build Rubrik HTTP client: {err}"))
        })?;

        let credentials = match (
            self.config.api_token,
            self.config.username,
            self.config.password,
        ) {
            (Some(token), _, _) => Some(Credentials::Token(token)),
            (None, Some(username), Some(password)) => {
                Some(Credentials::Basic { username, password })
            }
            _ => None,
        };

        Ok(HttpTransport {
            http,
            base_url,
            credentials: credentials.map(Arc::new),
        })
    }
}

/// reqwest-backed [`ApiTransport`].
#[derive(Clone)]
pub struct HttpTransport {
    http: Client,
    base_url: Url,
    credentials: Option<Arc<Credentials>>,
}

struct ApiCall<'a> {
    method: Method,
    version: ApiVersion,
    endpoint: &'a str,
    params: &'a [(&'static str, String)],
    body: Option<&'a Value>,
    timeout: Duration,
    authenticated: bool,
}

impl HttpTransport {
    /// Construct a transport directly from the configuration.
    pub fn from_config(config: &RubrikClientConfig) -> Result<Self> {
        HttpTransportBuilder::new(config.clone()).build()
    }

    /// Start a builder pre-populated with the provided configuration.
    #[must_use]
    pub fn builder(config: RubrikClientConfig) -> HttpTransportBuilder {
        HttpTransportBuilder::new(config)
    }

    /// Return the base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn build_url(&self, version: ApiVersion, endpoint: &str) -> Result<Url> {
        let endpoint = endpoint.trim_start_matches('/');
        let path = format!("api/{version}/{endpoint}");
        self.base_url
            .join(&path)
            .map_err(|err| Error::InvalidEndpoint(format!("Invalid Rubrik path `{path}`: {err}")))
    }

    async fn execute(&self, call: ApiCall<'_>) -> Result<Value> {
        let url = self.build_url(call.version, call.endpoint)?;

        debug!(
            method = %call.method,
            version = %call.version,
            endpoint = call.endpoint,
            authenticated = call.authenticated,
            "Sending Rubrik API request"
        );

        let mut request = self
            .http
            .request(call.method, url)
            .timeout(call.timeout)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json");

        if !call.params.is_empty() {
            request = request.query(call.params);
        }

        if let Some(body) = call.body {
            request = request.json(body);
        }

        if call.authenticated {
            request = match self.credentials.as_deref() {
                Some(Credentials::Token(token)) => request.bearer_auth(token.expose_secret()),
                Some(Credentials::Basic { username, password }) => {
                    request.basic_auth(username, Some(password.expose_secret()))
                }
                None => {
                    return Err(Error::ConfigError(format!(
                        "`{}` requires authentication but no credentials are configured",
                        call.endpoint
                    )));
                }
            };
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(Error::from_status(status, error_message(text)));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|err| {
            Error::ParseError(format!(
                "Failed to parse Rubrik response for `{}`: {err}",
                call.endpoint
            ))
        })
    }
}

/// Prefer the `message` field of the appliance's JSON error body.
fn error_message(text: String) -> String {
    serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|body| body.get("message").and_then(Value::as_str).map(str::to_owned))
        .unwrap_or(text)
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn get(
        &self,
        version: ApiVersion,
        endpoint: &str,
        params: &[(&'static str, String)],
        timeout: Duration,
        authenticated: bool,
    ) -> Result<Value> {
        self.execute(ApiCall {
            method: Method::GET,
            version,
            endpoint,
            params,
            body: None,
            timeout,
            authenticated,
        })
        .await
    }

    async fn post(
        &self,
        version: ApiVersion,
        endpoint: &str,
        body: &Value,
        timeout: Duration,
        authenticated: bool,
    ) -> Result<Value> {
        self.execute(ApiCall {
            method: Method::POST,
            version,
            endpoint,
            params: &[],
            body: Some(body),
            timeout,
            authenticated,
        })
        .await
    }

    async fn patch(
        &self,
        version: ApiVersion,
        endpoint: &str,
        body: &Value,
        timeout: Duration,
        authenticated: bool,
    ) -> Result<Value> {
        self.execute(ApiCall {
            method: Method::PATCH,
            version,
            endpoint,
            params: &[],
            body: Some(body),
            timeout,
            authenticated,
        })
        .await
    }

    async fn delete(
        &self,
        version: ApiVersion,
        endpoint: &str,
        timeout: Duration,
        authenticated: bool,
    ) -> Result<Value> {
        self.execute(ApiCall {
            method: Method::DELETE,
            version,
            endpoint,
            params: &[],
            body: None,
            timeout,
            authenticated,
        })
        .await
    }

    async fn object_id(
        &self,
        name: &str,
        object_type: ObjectType,
        timeout: Duration,
    ) -> Result<String> {
        resolve_object_id(self, name, object_type, timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn transport(server: &MockServer) -> HttpTransport {
        let config = RubrikClientConfig::new(server.uri())
            .unwrap()
            .with_credentials("admin", "secret");
        HttpTransport::from_config(&config).unwrap()
    }

    fn without_authorization(request: &Request) -> bool {
        !request.headers.contains_key("authorization")
    }

    #[tokio::test]
    async fn get_sends_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/cluster/me/version"))
            .and(header("authorization", "Basic YWRtaW46c2VjcmV0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "version": "5.3.2-p2-13757",
                "date": "2021-03-12T03:02:47.000Z"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = transport(&server)
            .get(ApiVersion::V1, "/cluster/me/version", &[], TIMEOUT, true)
            .await
            .unwrap();
        assert_eq!(response["version"], "5.3.2-p2-13757");
    }

    #[tokio::test]
    async fn json_headers_sent_on_bodyless_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/internal/cluster/me/node"))
            .and(header("content-type", "application/json"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/sla_domain/sla-1"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport(&server);
        transport
            .get(ApiVersion::Internal, "/cluster/me/node", &[], TIMEOUT, true)
            .await
            .unwrap();
        transport
            .delete(ApiVersion::V1, "/sla_domain/sla-1", TIMEOUT, true)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn token_takes_precedence_over_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/internal/cluster/me/node"))
            .and(header("authorization", "Bearer tok-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .expect(1)
            .mount(&server)
            .await;

        let config = RubrikClientConfig::new(server.uri())
            .unwrap()
            .with_credentials("admin", "secret")
            .with_api_token("tok-123");
        let transport = HttpTransport::from_config(&config).unwrap();

        transport
            .get(ApiVersion::Internal, "/cluster/me/node", &[], TIMEOUT, true)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unauthenticated_post_sends_no_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/internal/cluster/me/bootstrap"))
            .and(without_authorization)
            .and(body_json(json!({"name": "lab"})))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({"id": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let response = transport(&server)
            .post(
                ApiVersion::Internal,
                "/cluster/me/bootstrap",
                &json!({"name": "lab"}),
                TIMEOUT,
                false,
            )
            .await
            .unwrap();
        assert_eq!(response, json!({"id": 1}));
    }

    #[tokio::test]
    async fn authenticated_call_without_credentials_fails_locally() {
        let server = MockServer::start().await;
        let config = RubrikClientConfig::new(server.uri()).unwrap();
        let transport = HttpTransport::from_config(&config).unwrap();

        let err = transport
            .get(ApiVersion::V1, "/cluster/me/version", &[], TIMEOUT, true)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn query_params_are_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/internal/user"))
            .and(query_param("username", "jane doe@example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let params = [("username", "jane doe@example.com".to_string())];
        transport(&server)
            .get(ApiVersion::Internal, "/user", &params, TIMEOUT, true)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn empty_body_decodes_to_null() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/sla_domain/sla-1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let response = transport(&server)
            .delete(ApiVersion::V1, "/sla_domain/sla-1", TIMEOUT, true)
            .await
            .unwrap();
        assert_eq!(response, Value::Null);
    }

    #[tokio::test]
    async fn patch_sends_body() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/api/v1/vmware/vm/vm-1"))
            .and(body_json(json!({"configuredSlaDomainId": "sla-1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "vm-1"})))
            .expect(1)
            .mount(&server)
            .await;

        let response = transport(&server)
            .patch(
                ApiVersion::V1,
                "/vmware/vm/vm-1",
                &json!({"configuredSlaDomainId": "sla-1"}),
                TIMEOUT,
                true,
            )
            .await
            .unwrap();
        assert_eq!(response["id"], "vm-1");
    }

    #[tokio::test]
    async fn error_body_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/cluster/me/version"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "errorType": "user_error",
                "message": "No cluster with id me",
                "cause": null
            })))
            .mount(&server)
            .await;

        let err = transport(&server)
            .get(ApiVersion::V1, "/cluster/me/version", &[], TIMEOUT, true)
            .await
            .unwrap_err();
        assert_eq!(err, Error::NotFound("No cluster with id me".to_string()));
    }

    #[tokio::test]
    async fn server_errors_map_to_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = transport(&server)
            .get(ApiVersion::V1, "/cluster/me/version", &[], TIMEOUT, true)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn malformed_json_is_a_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let err = transport(&server)
            .get(ApiVersion::V1, "/cluster/me/version", &[], TIMEOUT, true)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ParseError(_)));
    }

    #[tokio::test]
    async fn per_call_timeout_is_applied() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let err = transport(&server)
            .get(
                ApiVersion::V1,
                "/cluster/me/version",
                &[],
                Duration::from_millis(100),
                true,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
    }

    #[tokio::test]
    async fn object_id_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/vmware/vm"))
            .and(query_param("primary_cluster_id", "local"))
            .and(query_param("is_relic", "false"))
            .and(query_param("name", "web-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "hasMore": false,
                "data": [
                    {"id": "VirtualMachine:::1111", "name": "web-01"},
                    {"id": "VirtualMachine:::2222", "name": "web-01-clone"}
                ],
                "total": 2
            })))
            .expect(1)
            .mount(&server)
            .await;

        let id = transport(&server)
            .object_id("web-01", ObjectType::Vmware, TIMEOUT)
            .await
            .unwrap();
        assert_eq!(id, "VirtualMachine:::1111");
    }

    fn listing_transport(listing: Value) -> MockApiTransport {
        let mut transport = MockApiTransport::new();
        transport
            .expect_get()
            .times(1)
            .returning(move |_, _, _, _, _| Ok(listing.clone()));
        transport
    }

    #[tokio::test]
    async fn resolve_object_id_not_found() {
        let transport = listing_transport(json!({"data": [{"id": "sla-1", "name": "Gold"}]}));
        let err = resolve_object_id(&transport, "Silver", ObjectType::Sla, TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn resolve_object_id_ambiguous() {
        let transport = listing_transport(json!({"data": [
            {"id": "VirtualMachine:::1", "name": "db"},
            {"id": "VirtualMachine:::2", "name": "db"}
        ]}));
        let err = resolve_object_id(&transport, "db", ObjectType::Vmware, TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AmbiguousObject(_)));
    }

    #[tokio::test]
    async fn resolve_object_id_matches_hostname_for_hosts() {
        let mut transport = MockApiTransport::new();
        transport
            .expect_get()
            .withf(|version, endpoint, params, _, authenticated| {
                *version == ApiVersion::V1
                    && endpoint == "/host"
                    && params.contains(&("hostname", "db.example.com".to_string()))
                    && *authenticated
            })
            .times(1)
            .returning(|_, _, _, _, _| {
                Ok(json!({"data": [{"id": "Host:::42", "hostname": "db.example.com"}]}))
            });

        let id = resolve_object_id(&transport, "db.example.com", ObjectType::PhysicalHost, TIMEOUT)
            .await
            .unwrap();
        assert_eq!(id, "Host:::42");
    }

    #[tokio::test]
    async fn resolve_object_id_rejects_unexpected_shape() {
        let transport = listing_transport(json!([{"id": "x"}]));
        let err = resolve_object_id(&transport, "x", ObjectType::Vmware, TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ParseError(_)));
    }
}
