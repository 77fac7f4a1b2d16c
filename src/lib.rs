//! Declarative HTTP client for HashiCorp Vault's REST API.
//!
//! Maps a static command table onto HTTP calls: each table entry names an
//! operation, its method and path template, and optional JSON Schemas for
//! the request body and query string. The client registers the table once
//! at construction, validates payloads before anything reaches the network,
//! and normalizes every response into a parsed JSON body or a typed error.
//!
//! # Usage
//!
//! ```no_run
//! use serde_json::json;
//! use vault_rest::VaultClient;
//!
//! # async fn run() -> Result<(), vault_rest::ClientError> {
//! // Defaults come from VAULT_ADDR / VAULT_TOKEN when unset here.
//! let client = VaultClient::builder()
//!     .endpoint("http://127.0.0.1:8200")
//!     .token("s.myroottoken")
//!     .build()?;
//!
//! let status = client.call("status", json!({})).await?;
//! println!("sealed: {}", status["sealed"]);
//!
//! client.write("secret/hello", json!({ "value": "world" })).await?;
//! let secret = client.read("secret/hello").await?;
//! println!("{}", secret["data"]["value"]);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod commands;
pub mod error;
mod request;
mod validate;

pub use client::{ClientBuilder, VaultClient};
pub use commands::{default_commands, Method, Operation};
pub use error::ClientError;

// Re-export dependencies for downstream crates
pub use reqwest;
pub use serde_json;
