//! Request construction → HTTP dispatch → response normalization
//!
//! Renders the operation's path template against the payload, extends the
//! query string, issues the request, and maps the raw response onto the
//! uniform result shape.

use serde_json::Value;
use tracing::debug;

use crate::commands::Method;
use crate::error::ClientError;

/// Token header understood by the server.
const TOKEN_HEADER: &str = "X-Vault-Token";

/// Namespace header understood by the server.
const NAMESPACE_HEADER: &str = "X-Vault-Namespace";

/// Request paths matching this fragment report health through their status
/// code, so every status resolves successfully.
const HEALTH_PATH: &str = "sys/health";

/// Per-call view of the client configuration, read at dispatch time.
pub(crate) struct RequestConfig<'a> {
    pub(crate) endpoint: &'a str,
    pub(crate) api_version: &'a str,
    pub(crate) token: Option<&'a str>,
    pub(crate) namespace: Option<&'a str>,
    pub(crate) headers: &'a [(String, String)],
}

/// Substitute `{{field}}` placeholders in a path template from the payload.
///
/// Values are inserted verbatim, so a field containing slashes (nested
/// secret paths) survives templating intact. A placeholder with no matching
/// scalar field renders as empty.
pub(crate) fn render_path(template: &str, payload: &Value) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                out.push_str(&scalar_to_string(payload.get(after[..end].trim())));
                rest = &after[end + 2..];
            }
            None => {
                // Unterminated placeholder: emit the tail literally.
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Append query-schema-declared payload fields to the path.
///
/// Only keys named by the query schema's `properties` become query
/// parameters, in the schema's declared order; everything else stays a path
/// or body field. Values are percent-encoded.
pub(crate) fn extend_query(path: &str, query_schema: &Value, payload: &Value) -> String {
    let props = match query_schema.get("properties").and_then(|p| p.as_object()) {
        Some(props) => props,
        None => return path.to_string(),
    };

    let mut pairs = Vec::new();
    for key in props.keys() {
        if let Some(value) = payload.get(key) {
            let encoded = urlencoding::encode(&scalar_to_string(Some(value))).into_owned();
            pairs.push(format!("{key}={encoded}"));
        }
    }

    if pairs.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, pairs.join("&"))
    }
}

fn scalar_to_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Issue one API request and normalize the outcome.
///
/// Non-2xx statuses are not transport failures: the raw status and body
/// always reach [`normalize`] for uniform interpretation. Only
/// connection-level errors map to [`ClientError::Transport`].
pub(crate) async fn execute(
    http: &reqwest::Client,
    config: &RequestConfig<'_>,
    method: Method,
    path: &str,
    body: Option<&Value>,
) -> Result<Value, ClientError> {
    let url = format!(
        "{}/{}{}",
        config.endpoint.trim_end_matches('/'),
        config.api_version,
        path
    );
    debug!(method = method.as_str(), %url, "dispatching API request");

    let mut req = http.request(method.into(), &url);
    for (name, value) in config.headers {
        req = req.header(name, value);
    }
    // Attach the token only when one is configured and the caller has not
    // already set the header explicitly.
    let token_set = config
        .headers
        .iter()
        .any(|(name, _)| name.eq_ignore_ascii_case(TOKEN_HEADER));
    if let Some(token) = config.token {
        if !token.is_empty() && !token_set {
            req = req.header(TOKEN_HEADER, token);
        }
    }
    if let Some(namespace) = config.namespace {
        req = req.header(NAMESPACE_HEADER, namespace);
    }
    if let Some(body) = body {
        req = req.json(body);
    }

    let resp = req.send().await.map_err(ClientError::Transport)?;
    let status = resp.status().as_u16();
    let text = resp.text().await.map_err(ClientError::Transport)?;
    debug!(status, path, "API response received");

    normalize(status, parse_body(&text), path)
}

/// Parse a response body as JSON; an empty body is `Null` and a non-JSON
/// body is kept as a JSON string.
fn parse_body(text: &str) -> Value {
    if text.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Map a raw status + parsed body onto the uniform result shape.
///
/// 200 and 204 resolve with the body. A request path matching the
/// health-check endpoint resolves with the body for any status, since
/// non-2xx there encodes an application state the caller interprets.
/// Everything else fails with the server's first error-envelope entry, or
/// `Status <code>` when the envelope is absent or empty.
pub(crate) fn normalize(
    status: u16,
    body: Value,
    request_path: &str,
) -> Result<Value, ClientError> {
    if status == 200 || status == 204 {
        return Ok(body);
    }
    if request_path.contains(HEALTH_PATH) {
        return Ok(body);
    }

    let message = body
        .get("errors")
        .and_then(|errors| errors.as_array())
        .and_then(|errors| errors.first())
        .and_then(|first| first.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Status {status}"));

    Err(ClientError::Api { status, message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn render_path_substitutes_fields() {
        let path = render_path("/sys/policy/{{name}}", &json!({ "name": "admins" }));
        assert_eq!(path, "/sys/policy/admins");
    }

    #[test]
    fn render_path_preserves_slashes_in_values() {
        let path = render_path("/secret/{{name}}", &json!({ "name": "a/b/c" }));
        assert_eq!(path, "/secret/a/b/c");
    }

    #[test]
    fn render_path_missing_field_renders_empty() {
        let path = render_path("/sys/audit/{{name}}", &json!({}));
        assert_eq!(path, "/sys/audit/");
    }

    #[test]
    fn render_path_handles_multiple_placeholders() {
        let path = render_path(
            "/auth/{{backend}}/login/{{username}}",
            &json!({ "backend": "userpass", "username": "alice" }),
        );
        assert_eq!(path, "/auth/userpass/login/alice");
    }

    #[test]
    fn render_path_keeps_unterminated_placeholder_literal() {
        let path = render_path("/sys/{{oops", &json!({ "oops": "x" }));
        assert_eq!(path, "/sys/{{oops");
    }

    #[test]
    fn render_path_formats_numbers_and_bools() {
        let path = render_path("/kv/{{id}}/{{flag}}", &json!({ "id": 42, "flag": true }));
        assert_eq!(path, "/kv/42/true");
    }

    #[test]
    fn extend_query_appends_declared_fields_only() {
        let schema = json!({
            "properties": { "list": {} },
        });
        let path = extend_query("/secret", &schema, &json!({ "list": true, "other": 1 }));
        assert_eq!(path, "/secret?list=true");
    }

    #[test]
    fn extend_query_without_matching_keys_leaves_path_alone() {
        let schema = json!({
            "properties": { "list": {} },
        });
        assert_eq!(extend_query("/secret", &schema, &json!({})), "/secret");
    }

    #[test]
    fn extend_query_follows_declared_property_order() {
        let schema = json!({
            "properties": {
                "standbyok": { "type": "boolean" },
                "sealedcode": { "type": "integer" },
            },
        });
        let path = extend_query(
            "/sys/health",
            &schema,
            &json!({ "sealedcode": 503, "standbyok": true }),
        );
        assert_eq!(path, "/sys/health?standbyok=true&sealedcode=503");
    }

    #[test]
    fn extend_query_percent_encodes_values() {
        let schema = json!({
            "properties": { "prefix": {} },
        });
        let path = extend_query("/list", &schema, &json!({ "prefix": "a b&c" }));
        assert_eq!(path, "/list?prefix=a%20b%26c");
    }

    #[test]
    fn normalize_resolves_200_with_body() {
        let body = json!({ "data": { "k": 1 } });
        assert_eq!(normalize(200, body.clone(), "/secret/x").unwrap(), body);
    }

    #[test]
    fn normalize_resolves_204_with_null_body() {
        assert_eq!(normalize(204, Value::Null, "/secret/x").unwrap(), Value::Null);
    }

    #[test]
    fn normalize_uses_first_error_envelope_entry() {
        let err = normalize(
            404,
            json!({ "errors": ["no such path"] }),
            "/secret/missing",
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "no such path");
        match err {
            ClientError::Api { status, .. } => assert_eq!(status, 404),
            other => panic!("expected Api, got: {other:?}"),
        }
    }

    #[test]
    fn normalize_falls_back_to_status_message() {
        let err = normalize(500, Value::Null, "/secret/x").unwrap_err();
        assert_eq!(err.to_string(), "Status 500");
    }

    #[test]
    fn normalize_empty_error_envelope_falls_back() {
        let err = normalize(503, json!({ "errors": [] }), "/secret/x").unwrap_err();
        assert_eq!(err.to_string(), "Status 503");
    }

    #[test]
    fn normalize_health_path_resolves_any_status() {
        let body = json!({ "sealed": true });
        let resolved = normalize(500, body.clone(), "/sys/health?standbyok=true").unwrap();
        assert_eq!(resolved, body);
    }

    #[test]
    fn parse_body_falls_back_for_non_json() {
        assert_eq!(parse_body(""), Value::Null);
        assert_eq!(parse_body("plain"), Value::String("plain".into()));
        assert_eq!(parse_body(r#"{"a":1}"#), json!({ "a": 1 }));
    }
}
