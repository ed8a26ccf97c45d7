//! Strongbox Common Types
//!
//! Shared types for the Strongbox vault ledger: identifiers, amounts, the
//! call envelope, and the per-operation error taxonomy.

pub mod identifiers;
pub mod monetary;
pub mod call;
pub mod error;

pub use identifiers::*;
pub use monetary::*;
pub use call::*;
pub use error::*;
