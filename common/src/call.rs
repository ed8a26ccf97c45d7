//! Call envelope types.
//!
//! An [`Interaction`] is what the host delivers to the ledger: the caller's
//! identity, the value attached to the call, and an opaque payload naming the
//! operation. An empty payload is a bare value transfer.

use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, ErrorReport, RequestId};

/// Recognized operations, as encoded in an interaction payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Deposit the attached value into the caller's vault.
    Deposit,
    /// Withdraw `amount` from the caller's vault to the caller.
    Withdraw { amount: Amount },
    /// Read an account's balance.
    GetVaultBalance { account: AccountId },
    /// Read the operation counters.
    GetStats,
}

impl Operation {
    /// Whether value may be attached to this operation.
    pub fn is_payable(&self) -> bool {
        matches!(self, Operation::Deposit)
    }

    /// Encode as an interaction payload.
    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Decode an interaction payload. `None` if it names no known operation.
    pub fn decode(payload: &[u8]) -> Option<Self> {
        serde_json::from_slice(payload).ok()
    }
}

/// An inbound call as delivered by the host environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    /// Authenticated caller identity.
    pub caller: AccountId,
    /// Value attached to the call.
    pub value: Amount,
    /// Raw operation payload.
    #[serde(default)]
    pub payload: Vec<u8>,
}

impl Interaction {
    /// A bare value transfer with no operation payload.
    pub fn transfer(caller: impl Into<AccountId>, value: Amount) -> Self {
        Self {
            caller: caller.into(),
            value,
            payload: Vec::new(),
        }
    }

    /// A call to a recognized operation.
    pub fn call(
        caller: impl Into<AccountId>,
        value: Amount,
        operation: &Operation,
    ) -> serde_json::Result<Self> {
        Ok(Self {
            caller: caller.into(),
            value,
            payload: operation.encode()?,
        })
    }

    /// A call with an arbitrary payload.
    pub fn raw(caller: impl Into<AccountId>, value: Amount, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            caller: caller.into(),
            value,
            payload: payload.into(),
        }
    }

    /// Check if this is a bare value transfer.
    pub fn is_bare_transfer(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Operation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultStats {
    /// Successful deposits.
    pub deposit_count: u64,
    /// Successful withdrawals.
    pub withdrawal_count: u64,
}

/// Successful result of a dispatched call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    Deposited { account: AccountId, amount: Amount },
    Withdrawn { account: AccountId, amount: Amount },
    Balance { account: AccountId, balance: Amount },
    Stats(VaultStats),
}

/// Request envelope handled by a vault node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRequest {
    /// Idempotency key; a repeated ID returns the recorded response.
    pub request_id: RequestId,
    /// The call itself.
    pub interaction: Interaction,
}

impl CallRequest {
    /// Wrap an interaction under a fresh request ID.
    pub fn new(interaction: Interaction) -> Self {
        Self {
            request_id: RequestId::new(),
            interaction,
        }
    }
}

/// Response envelope returned by a vault node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallResponse {
    /// The request this answers.
    pub request_id: RequestId,
    /// Outcome or error report.
    pub result: Result<CallOutcome, ErrorReport>,
}

impl CallResponse {
    /// Check if the call succeeded.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Error code, if the call failed.
    pub fn error_code(&self) -> Option<&str> {
        self.result.as_ref().err().map(|r| r.code.as_str())
    }
}
