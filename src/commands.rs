//! Command table → internal IR
//!
//! The command table is configuration data: a flat list of `Operation`s
//! naming an API action, its HTTP method and path template, and optional
//! JSON Schemas for the request body and query string. The client registers
//! the table once at construction; [`default_commands`] ships the system
//! backend surface of the Vault API.

use serde_json::{json, Value};

/// HTTP methods used by the Vault API.
///
/// `LIST` is a Vault-specific method, distinct from `GET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    List,
    Delete,
}

impl Method {
    /// Wire name of the method.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::List => "LIST",
            Method::Delete => "DELETE",
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
            // LIST is a valid HTTP token, so this cannot fail.
            Method::List => reqwest::Method::from_bytes(b"LIST").expect("valid method token"),
        }
    }
}

/// One entry of the command table: a named API operation ready for
/// registration on the client.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Operation {
    /// Unique operation name (e.g. "unseal"). Must be a valid identifier
    /// and must not shadow a client facade method.
    pub name: String,
    /// HTTP method.
    pub method: Method,
    /// URL path template with `{{var}}` placeholders, relative to the API
    /// version prefix (e.g. "/sys/policy/{{name}}").
    pub path: String,
    /// JSON Schema for the request payload, if any.
    pub req_schema: Option<Value>,
    /// JSON Schema for the query string, if any. Its declared properties
    /// name the payload fields that become query parameters; everything
    /// else stays a path or body field.
    pub query_schema: Option<Value>,
}

impl Operation {
    pub fn new(name: impl Into<String>, method: Method, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method,
            path: path.into(),
            req_schema: None,
            query_schema: None,
        }
    }

    /// Set the request payload schema.
    pub fn req_schema(mut self, schema: Value) -> Self {
        self.req_schema = Some(schema);
        self
    }

    /// Set the query-string schema.
    pub fn query_schema(mut self, schema: Value) -> Self {
        self.query_schema = Some(schema);
        self
    }

    /// Whether the operation declares any schema at all. Schema-less
    /// operations skip validation and query extension entirely.
    pub(crate) fn has_schema(&self) -> bool {
        self.req_schema.is_some() || self.query_schema.is_some()
    }
}

/// The default command table: the system backend surface of the Vault API.
///
/// Callers may replace or extend this at construction; the table is plain
/// data and carries no logic of its own.
pub fn default_commands() -> Vec<Operation> {
    vec![
        Operation::new("status", Method::Get, "/sys/seal-status"),
        Operation::new("initialized", Method::Get, "/sys/init"),
        Operation::new("init", Method::Put, "/sys/init").req_schema(json!({
            "type": "object",
            "properties": {
                "secret_shares": { "type": "integer" },
                "secret_threshold": { "type": "integer" },
                "pgp_keys": { "type": "array", "items": { "type": "string" } },
            },
            "required": ["secret_shares", "secret_threshold"],
        })),
        Operation::new("unseal", Method::Put, "/sys/unseal").req_schema(json!({
            "type": "object",
            "properties": {
                "key": { "type": "string" },
                "reset": { "type": "boolean" },
            },
            "required": ["key"],
        })),
        Operation::new("seal", Method::Put, "/sys/seal"),
        Operation::new("generate_root_status", Method::Get, "/sys/generate-root/attempt"),
        Operation::new("generate_root_init", Method::Put, "/sys/generate-root/attempt").req_schema(
            json!({
                "type": "object",
                "properties": {
                    "otp": { "type": "string" },
                    "pgp_key": { "type": "string" },
                },
            }),
        ),
        Operation::new("generate_root_cancel", Method::Delete, "/sys/generate-root/attempt"),
        Operation::new("generate_root_update", Method::Put, "/sys/generate-root/update")
            .req_schema(json!({
                "type": "object",
                "properties": {
                    "key": { "type": "string" },
                    "nonce": { "type": "string" },
                },
                "required": ["key", "nonce"],
            })),
        Operation::new("mounts", Method::Get, "/sys/mounts"),
        Operation::new("mount", Method::Put, "/sys/mounts/{{mount_point}}").req_schema(json!({
            "type": "object",
            "properties": {
                "mount_point": { "type": "string" },
                "type": { "type": "string" },
                "description": { "type": "string" },
            },
            "required": ["mount_point", "type"],
        })),
        Operation::new("unmount", Method::Delete, "/sys/mounts/{{mount_point}}").req_schema(
            json!({
                "type": "object",
                "properties": {
                    "mount_point": { "type": "string" },
                },
                "required": ["mount_point"],
            }),
        ),
        Operation::new("remount", Method::Put, "/sys/remount").req_schema(json!({
            "type": "object",
            "properties": {
                "from": { "type": "string" },
                "to": { "type": "string" },
            },
            "required": ["from", "to"],
        })),
        Operation::new("policies", Method::Get, "/sys/policy"),
        Operation::new("get_policy", Method::Get, "/sys/policy/{{name}}"),
        Operation::new("add_policy", Method::Put, "/sys/policy/{{name}}").req_schema(json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "rules": { "type": "string" },
            },
            "required": ["name", "rules"],
        })),
        Operation::new("remove_policy", Method::Delete, "/sys/policy/{{name}}").req_schema(json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
            },
            "required": ["name"],
        })),
        Operation::new("auths", Method::Get, "/sys/auth"),
        Operation::new("enable_auth", Method::Put, "/sys/auth/{{mount_point}}").req_schema(json!({
            "type": "object",
            "properties": {
                "mount_point": { "type": "string" },
                "type": { "type": "string" },
                "description": { "type": "string" },
            },
            "required": ["mount_point", "type"],
        })),
        Operation::new("disable_auth", Method::Delete, "/sys/auth/{{mount_point}}").req_schema(
            json!({
                "type": "object",
                "properties": {
                    "mount_point": { "type": "string" },
                },
                "required": ["mount_point"],
            }),
        ),
        Operation::new("audits", Method::Get, "/sys/audit"),
        Operation::new("enable_audit", Method::Put, "/sys/audit/{{name}}").req_schema(json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "type": { "type": "string" },
                "description": { "type": "string" },
            },
            "required": ["name", "type"],
        })),
        Operation::new("disable_audit", Method::Delete, "/sys/audit/{{name}}").req_schema(json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
            },
            "required": ["name"],
        })),
        Operation::new("renew", Method::Put, "/sys/leases/renew").req_schema(json!({
            "type": "object",
            "properties": {
                "lease_id": { "type": "string" },
                "increment": { "type": "integer" },
            },
            "required": ["lease_id"],
        })),
        Operation::new("revoke", Method::Put, "/sys/leases/revoke").req_schema(json!({
            "type": "object",
            "properties": {
                "lease_id": { "type": "string" },
            },
            "required": ["lease_id"],
        })),
        Operation::new("revoke_prefix", Method::Put, "/sys/leases/revoke-prefix/{{path_prefix}}")
            .req_schema(json!({
                "type": "object",
                "properties": {
                    "path_prefix": { "type": "string" },
                },
                "required": ["path_prefix"],
            })),
        Operation::new("rotate", Method::Put, "/sys/rotate"),
        Operation::new("unwrap", Method::Put, "/sys/wrapping/unwrap"),
        Operation::new("health", Method::Get, "/sys/health").query_schema(json!({
            "type": "object",
            "properties": {
                "standbyok": { "type": "boolean" },
                "activecode": { "type": "integer" },
                "standbycode": { "type": "integer" },
                "sealedcode": { "type": "integer" },
                "uninitcode": { "type": "integer" },
            },
        })),
        Operation::new("leader", Method::Get, "/sys/leader"),
        Operation::new("step_down", Method::Put, "/sys/step-down"),
        Operation::new("token_create", Method::Put, "/auth/token/create"),
        Operation::new("token_lookup", Method::Put, "/auth/token/lookup").req_schema(json!({
            "type": "object",
            "properties": {
                "token": { "type": "string" },
            },
            "required": ["token"],
        })),
        Operation::new("token_lookup_self", Method::Get, "/auth/token/lookup-self"),
        Operation::new("token_renew", Method::Put, "/auth/token/renew").req_schema(json!({
            "type": "object",
            "properties": {
                "token": { "type": "string" },
                "increment": { "type": "integer" },
            },
            "required": ["token"],
        })),
        Operation::new("token_renew_self", Method::Put, "/auth/token/renew-self"),
        Operation::new("token_revoke", Method::Put, "/auth/token/revoke").req_schema(json!({
            "type": "object",
            "properties": {
                "token": { "type": "string" },
            },
            "required": ["token"],
        })),
        Operation::new("token_revoke_self", Method::Put, "/auth/token/revoke-self"),
        Operation::new("approle_login", Method::Put, "/auth/approle/login").req_schema(json!({
            "type": "object",
            "properties": {
                "role_id": { "type": "string" },
                "secret_id": { "type": "string" },
            },
            "required": ["role_id"],
        })),
        Operation::new("userpass_login", Method::Put, "/auth/userpass/login/{{username}}")
            .req_schema(json!({
                "type": "object",
                "properties": {
                    "username": { "type": "string" },
                    "password": { "type": "string" },
                },
                "required": ["username", "password"],
            })),
        Operation::new("github_login", Method::Put, "/auth/github/login").req_schema(json!({
            "type": "object",
            "properties": {
                "token": { "type": "string" },
            },
            "required": ["token"],
        })),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn method_wire_names() {
        assert_eq!(Method::Get.as_str(), "GET");
        assert_eq!(Method::List.as_str(), "LIST");
        assert_eq!(reqwest::Method::from(Method::List).as_str(), "LIST");
        assert_eq!(reqwest::Method::from(Method::Put), reqwest::Method::PUT);
    }

    #[test]
    fn operation_builder_sets_schemas() {
        let op = Operation::new("demo", Method::Put, "/demo/{{name}}")
            .req_schema(json!({ "type": "object" }))
            .query_schema(json!({ "properties": { "list": {} } }));
        assert!(op.req_schema.is_some());
        assert!(op.query_schema.is_some());
        assert!(op.has_schema());
    }

    #[test]
    fn schemaless_operation_has_no_schema() {
        let op = Operation::new("demo", Method::Get, "/demo");
        assert!(!op.has_schema());
    }

    #[test]
    fn default_table_names_are_unique() {
        let table = default_commands();
        let names: HashSet<_> = table.iter().map(|op| op.name.as_str()).collect();
        assert_eq!(names.len(), table.len());
    }

    #[test]
    fn default_table_paths_are_rooted() {
        for op in default_commands() {
            assert!(op.path.starts_with('/'), "unrooted path for {}", op.name);
        }
    }

    #[test]
    fn health_declares_query_schema_only() {
        let table = default_commands();
        let health = table.iter().find(|op| op.name == "health").unwrap();
        assert!(health.req_schema.is_none());
        let props = health.query_schema.as_ref().unwrap()["properties"]
            .as_object()
            .unwrap();
        assert!(props.contains_key("standbyok"));
        assert!(props.contains_key("sealedcode"));
    }

    #[test]
    fn init_requires_shares_and_threshold() {
        let table = default_commands();
        let init = table.iter().find(|op| op.name == "init").unwrap();
        let required = init.req_schema.as_ref().unwrap()["required"]
            .as_array()
            .unwrap();
        assert!(required.contains(&json!("secret_shares")));
        assert!(required.contains(&json!("secret_threshold")));
    }
}
