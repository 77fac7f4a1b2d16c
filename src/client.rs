//! Client facade and construction
//!
//! Registers the command table once at construction and exposes the generic
//! verbs (`read`/`write`/`list`/`delete`/`help`) plus a single [`call`]
//! dispatch method for every registered operation.
//!
//! [`call`]: VaultClient::call

use std::collections::HashMap;
use std::time::Duration;

use jsonschema::JSONSchema;
use serde_json::{json, Value};

use crate::commands::{default_commands, Method, Operation};
use crate::error::ClientError;
use crate::request::{self, RequestConfig};
use crate::validate;

/// Environment variable for the server address.
const ENV_VAULT_ADDR: &str = "VAULT_ADDR";

/// Environment variable for the authentication token.
const ENV_VAULT_TOKEN: &str = "VAULT_TOKEN";

/// Environment variable for the namespace header.
const ENV_VAULT_NAMESPACE: &str = "VAULT_NAMESPACE";

/// Environment variable that disables TLS certificate verification when
/// truthy (supports self-signed deployments).
const ENV_VAULT_SKIP_VERIFY: &str = "VAULT_SKIP_VERIFY";

/// Default server address when `VAULT_ADDR` is unset.
const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8200";

/// Default API version path prefix.
const DEFAULT_API_VERSION: &str = "v1";

/// Facade method names that command-table entries must not shadow.
const RESERVED_NAMES: &[&str] = &["read", "write", "list", "delete", "help", "request"];

/// A table entry plus its schemas compiled at registration time.
struct RegisteredOp {
    op: Operation,
    req_schema: Option<JSONSchema>,
    query_schema: Option<JSONSchema>,
}

/// Client for the Vault REST API.
///
/// `endpoint`, `api_version`, and `token` are plain fields the owner may
/// reassign between calls; each dispatch reads them at call time. All other
/// state is fixed at construction.
pub struct VaultClient {
    /// Base URL of the server, without the API version suffix.
    pub endpoint: String,
    /// API version path prefix (`v1`).
    pub api_version: String,
    /// Authentication token; attached as `X-Vault-Token` when non-empty.
    pub token: Option<String>,
    namespace: Option<String>,
    headers: Vec<(String, String)>,
    http: reqwest::Client,
    ops: HashMap<String, RegisteredOp>,
}

impl std::fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultClient")
            .field("endpoint", &self.endpoint)
            .field("api_version", &self.api_version)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("operations", &self.ops.len())
            .finish()
    }
}

impl VaultClient {
    /// Create a client with environment-configured defaults and the default
    /// command table. Equivalent to `VaultClient::builder().build()`.
    pub fn new() -> Result<Self, ClientError> {
        Self::builder().build()
    }

    /// Start configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Invoke a registered operation by name.
    ///
    /// `args` fields populate path-template variables, request-schema body
    /// fields, and query-schema query fields per the operation's descriptor.
    /// Validation failures abort before any network I/O.
    pub async fn call(&self, name: &str, args: Value) -> Result<Value, ClientError> {
        let registered = match self.ops.get(name) {
            Some(registered) => registered,
            None => {
                return Err(ClientError::UnknownOperation {
                    name: name.to_string(),
                })
            }
        };
        let payload = if args.is_null() { json!({}) } else { args };

        if registered.op.has_schema() {
            validate::validate(&payload, registered.req_schema.as_ref())?;
            validate::validate(&payload, registered.query_schema.as_ref())?;
        }

        let mut path = request::render_path(&registered.op.path, &payload);
        if let Some(schema) = registered.op.query_schema.as_ref() {
            path = request::extend_query(&path, schema, &payload);
        }

        // The whole payload travels as the JSON body on writes; the server
        // ignores fields it already consumed from the path.
        let body = match registered.op.method {
            Method::Put => Some(&payload),
            _ => None,
        };
        self.execute(registered.op.method, &path, body).await
    }

    /// Read the resource at `path`.
    pub async fn read(&self, path: &str) -> Result<Value, ClientError> {
        self.request(Method::Get, &rooted(path), None).await
    }

    /// Write `data` to `path`.
    pub async fn write(&self, path: &str, data: Value) -> Result<Value, ClientError> {
        self.request(Method::Put, &rooted(path), Some(data)).await
    }

    /// List the keys under `path`.
    pub async fn list(&self, path: &str) -> Result<Value, ClientError> {
        self.request(Method::List, &rooted(path), None).await
    }

    /// Delete the resource at `path`.
    pub async fn delete(&self, path: &str) -> Result<Value, ClientError> {
        self.request(Method::Delete, &rooted(path), None).await
    }

    /// Fetch help metadata for `path`.
    pub async fn help(&self, path: &str) -> Result<Value, ClientError> {
        let path = format!("{}?help=1", rooted(path));
        self.request(Method::Get, &path, None).await
    }

    /// Issue a raw request under the configured endpoint and API version.
    ///
    /// The generic verbs and every registered operation funnel through here;
    /// `path` is used as given, including any query string.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ClientError> {
        self.execute(method, path, body.as_ref()).await
    }

    /// Names of all registered operations.
    pub fn operations(&self) -> impl Iterator<Item = &str> {
        self.ops.keys().map(String::as_str)
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ClientError> {
        let config = RequestConfig {
            endpoint: &self.endpoint,
            api_version: &self.api_version,
            token: self.token.as_deref(),
            namespace: self.namespace.as_deref(),
            headers: &self.headers,
        };
        request::execute(&self.http, &config, method, path, body).await
    }
}

/// Prefix `path` with a single leading slash.
fn rooted(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Configuration for constructing a [`VaultClient`].
///
/// Unset options fall back to the environment (`VAULT_ADDR`, `VAULT_TOKEN`,
/// `VAULT_NAMESPACE`, `VAULT_SKIP_VERIFY`) and then to built-in defaults.
#[derive(Default)]
pub struct ClientBuilder {
    endpoint: Option<String>,
    token: Option<String>,
    api_version: Option<String>,
    namespace: Option<String>,
    timeout: Option<Duration>,
    skip_verify: Option<bool>,
    headers: Vec<(String, String)>,
    http: Option<reqwest::Client>,
    commands: Option<Vec<Operation>>,
}

impl ClientBuilder {
    /// Base URL of the server.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Authentication token. An empty token disables header injection.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// API version path prefix (default `v1`).
    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    /// Namespace sent as `X-Vault-Namespace` on every call.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Request timeout applied to the built transport. Without it, the
    /// transport's own default applies.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Disable TLS certificate verification (self-signed deployments).
    pub fn skip_verify(mut self, skip: bool) -> Self {
        self.skip_verify = Some(skip);
        self
    }

    /// Add a default header sent on every call. An explicit `X-Vault-Token`
    /// here suppresses token injection.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Use a pre-built transport instead of constructing one. `timeout` and
    /// `skip_verify` are ignored in that case.
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Replace the default command table.
    pub fn commands(mut self, commands: Vec<Operation>) -> Self {
        self.commands = Some(commands);
        self
    }

    /// Resolve defaults, build the transport, and register the table.
    pub fn build(self) -> Result<VaultClient, ClientError> {
        let endpoint = self
            .endpoint
            .or_else(|| std::env::var(ENV_VAULT_ADDR).ok())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let token = self.token.or_else(|| std::env::var(ENV_VAULT_TOKEN).ok());
        let namespace = self
            .namespace
            .or_else(|| std::env::var(ENV_VAULT_NAMESPACE).ok());
        let api_version = self
            .api_version
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());
        let skip_verify = self.skip_verify.unwrap_or_else(|| {
            std::env::var(ENV_VAULT_SKIP_VERIFY)
                .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE"))
                .unwrap_or(false)
        });

        let http = match self.http {
            Some(http) => http,
            None => {
                let mut builder = reqwest::Client::builder();
                if let Some(timeout) = self.timeout {
                    builder = builder.timeout(timeout);
                }
                if skip_verify {
                    builder = builder.danger_accept_invalid_certs(true);
                }
                builder.build().map_err(ClientError::Transport)?
            }
        };

        let mut ops = HashMap::new();
        for op in self.commands.unwrap_or_else(default_commands) {
            register(&mut ops, op)?;
        }

        Ok(VaultClient {
            endpoint,
            api_version,
            token,
            namespace,
            headers: self.headers,
            http,
            ops,
        })
    }
}

fn register(ops: &mut HashMap<String, RegisteredOp>, op: Operation) -> Result<(), ClientError> {
    if !is_identifier(&op.name) {
        return Err(ClientError::Command {
            name: op.name,
            message: "name is not a valid identifier".to_string(),
        });
    }
    if RESERVED_NAMES.contains(&op.name.as_str()) {
        return Err(ClientError::Command {
            name: op.name,
            message: "name shadows a client method".to_string(),
        });
    }
    if ops.contains_key(&op.name) {
        return Err(ClientError::Command {
            name: op.name,
            message: "duplicate operation name".to_string(),
        });
    }

    let req_schema = match op.req_schema.as_ref() {
        Some(schema) => Some(validate::compile(&op.name, schema)?),
        None => None,
    };
    let query_schema = match op.query_schema.as_ref() {
        Some(schema) => Some(validate::compile(&op.name, schema)?),
        None => None,
    };

    ops.insert(
        op.name.clone(),
        RegisteredOp {
            op,
            req_schema,
            query_schema,
        },
    );
    Ok(())
}
