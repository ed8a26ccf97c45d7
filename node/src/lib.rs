//! Strongbox Node
//!
//! Hosts a vault ledger behind an async request loop. The node adds what the
//! ledger itself leaves to its host: configuration from the environment,
//! idempotent request handling, metrics, and a payout book that plays the role
//! of the value-transfer facility.

pub mod node;
pub mod config;
pub mod error;
pub mod metrics;
pub mod payout;
pub mod responses;
pub mod state;

pub use node::VaultNode;
pub use config::NodeConfig;
pub use error::NodeError;
pub use payout::PayoutBook;
pub use responses::{ResponseCache, ResponseCacheConfig};
