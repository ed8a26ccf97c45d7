//! Strongbox Ledger Engine
//!
//! Single-asset vault ledger with a fixed bank cap and per-withdrawal limit.
//! Withdrawals commit their debit before handing value to an external
//! [`TransferExecutor`], so a recipient that calls back into the ledger
//! observes the debit and cannot spend the same balance twice.

pub mod engine;
pub mod params;
pub mod balance;
pub mod journal;
pub mod transfer;
pub mod guard;

pub use engine::{IntegrityError, VaultLedger, VaultSnapshot};
pub use params::{LedgerParams, ParameterValidator, ValidationMode};
pub use balance::BalanceBook;
pub use journal::{EventKind, Journal, LedgerEvent, DEFAULT_JOURNAL_CAPACITY};
pub use transfer::{NoopExecutor, TransferExecutor};
pub use guard::{DiagnosticPolicy, Route, UnrecognizedCallGuard};
