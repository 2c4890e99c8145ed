#![allow(clippy::doc_markdown)] // Allow product names like OnCall without backticks

//! Typed client for the Grafana OnCall public REST API.
//!
//! Covers alerts, escalation chains, escalation policies, on-call schedules
//! and users. Two pieces do the real work:
//!
//! - [`variant`] turns the API's flat tagged objects (escalation policies,
//!   schedules) into a header struct plus a Rust enum and back, without
//!   losing fields and without failing on types the client does not know.
//! - [`pagination`] walks the API's page envelopes into one ordered `Vec`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use oncall::{ClientConfig, OnCallClient};
//! use oncall::resources::{EscalationPolicyFilter, EscalationPolicyRule};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Reads ONCALL_API_URL and ONCALL_API_TOKEN
//!     let client = OnCallClient::from_env()?;
//!
//!     let chain = client
//!         .create_escalation_chain("primary", &Default::default())
//!         .await?;
//!
//!     client
//!         .create_escalation_policy(
//!             &chain.id,
//!             oncall::resources::escalation_policies::POSITION_END,
//!             EscalationPolicyRule::Wait { duration: Duration::from_secs(300) },
//!         )
//!         .await?;
//!
//!     let policies = client
//!         .list_escalation_policies(&EscalationPolicyFilter {
//!             escalation_chain_id: chain.id.clone(),
//!         })
//!         .await?;
//!
//!     for policy in policies {
//!         println!("{} {:?}", policy.position, policy.rule);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Errors
//!
//! Every operation returns [`OnCallError`]: `Transport` when no response
//! arrived, `Api` for non-2xx statuses, `Decode` when a body does not match
//! its schema. Nothing is retried; logging goes through `tracing` and the
//! library never installs a subscriber.

pub mod client;
pub mod config;
pub mod error;
pub mod pagination;
pub mod resources;
pub mod time;
pub mod transport;
pub mod variant;

pub use client::OnCallClient;
pub use config::ClientConfig;
pub use error::{OnCallError, Result};
pub use pagination::{paginate, Page};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, Transport};
