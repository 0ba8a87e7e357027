//! Transport seam for the kahuna driver.
//!
//! The vendor services are reached over an insecure local named-service
//! discovery protocol; this crate defines the two traits the runtime
//! depends on ([`Discovery`] to locate a server by name, [`RpcClient`]
//! to issue calls against one) together with the transport error
//! taxonomy and scripted test doubles.
//!
//! The real discovery protocol implementation plugs in behind these
//! traits; the runtime never sees anything but `ReturnValue` JSON text
//! and [`TransportError`]s.
//!
//! # Example
//!
//! ```
//! use kahuna_client::testing::ScriptedDiscovery;
//! use kahuna_client::Discovery;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let discovery = ScriptedDiscovery::new();
//! discovery.serve("AutomationStudio");
//!
//! let client = discovery
//!     .discover("AutomationStudio", Duration::from_secs(5))
//!     .await
//!     .unwrap();
//! # let _ = client;
//! # }
//! ```

pub mod error;
pub mod testing;
pub mod transport;

pub use error::TransportError;
pub use transport::{Discovery, RpcClient};
