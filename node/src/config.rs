//! Node configuration.

use strongbox_common::{Amount, ConfigError};
use strongbox_ledger::{
    DiagnosticPolicy, LedgerParams, ParameterValidator, ValidationMode, DEFAULT_JOURNAL_CAPACITY,
};

/// Ledger parameters as configured, before validation.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Maximum amount per withdrawal.
    pub withdrawal_limit: Amount,
    /// Maximum total held.
    pub bank_cap: Amount,
    /// Enforce `withdrawal_limit <= bank_cap`.
    pub strict_params: bool,
    /// Journal a diagnostic for rejected calls.
    pub emit_diagnostics: bool,
    /// Journal events retained.
    pub journal_capacity: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            withdrawal_limit: Amount::new(100),
            bank_cap: Amount::new(1000),
            strict_params: true,
            emit_diagnostics: true,
            journal_capacity: DEFAULT_JOURNAL_CAPACITY,
        }
    }
}

impl LedgerConfig {
    /// Validator matching `strict_params`.
    pub fn validator(&self) -> ParameterValidator {
        ParameterValidator::with_mode(if self.strict_params {
            ValidationMode::Strict
        } else {
            ValidationMode::Lenient
        })
    }

    /// Validated ledger parameters.
    pub fn params(&self) -> Result<LedgerParams, ConfigError> {
        self.validator()
            .validate(self.withdrawal_limit, self.bank_cap)
    }

    /// Diagnostic policy matching `emit_diagnostics`.
    pub fn diagnostic_policy(&self) -> DiagnosticPolicy {
        if self.emit_diagnostics {
            DiagnosticPolicy::Emit
        } else {
            DiagnosticPolicy::Silent
        }
    }
}

/// Main node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Node ID (generated when absent).
    pub node_id: Option<String>,
    /// Ledger configuration.
    pub ledger: LedgerConfig,
    /// Capacity of the inbound request channel.
    pub request_buffer: usize,
    /// Answered requests kept for replay.
    pub response_cache_size: usize,
    /// Seconds an answered request can be replayed.
    pub response_ttl_secs: u64,
    /// Log level.
    pub log_level: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: None,
            ledger: LedgerConfig::default(),
            request_buffer: 1024,
            response_cache_size: 10_000,
            response_ttl_secs: 600,
            log_level: "info".to_string(),
        }
    }
}

impl NodeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup. Unparseable values
    /// keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(id) = lookup("STRONGBOX_NODE_ID") {
            config.node_id = Some(id);
        }

        if let Some(limit) = lookup("STRONGBOX_WITHDRAWAL_LIMIT") {
            if let Ok(limit) = limit.parse::<u128>() {
                config.ledger.withdrawal_limit = Amount::new(limit);
            }
        }

        if let Some(cap) = lookup("STRONGBOX_BANK_CAP") {
            if let Ok(cap) = cap.parse::<u128>() {
                config.ledger.bank_cap = Amount::new(cap);
            }
        }

        if let Some(strict) = lookup("STRONGBOX_STRICT_PARAMS") {
            if let Ok(strict) = strict.parse() {
                config.ledger.strict_params = strict;
            }
        }

        if let Some(emit) = lookup("STRONGBOX_EMIT_DIAGNOSTICS") {
            if let Ok(emit) = emit.parse() {
                config.ledger.emit_diagnostics = emit;
            }
        }

        if let Some(buffer) = lookup("STRONGBOX_REQUEST_BUFFER") {
            if let Ok(buffer) = buffer.parse() {
                config.request_buffer = buffer;
            }
        }

        if let Some(capacity) = lookup("STRONGBOX_JOURNAL_CAPACITY") {
            if let Ok(capacity) = capacity.parse() {
                config.ledger.journal_capacity = capacity;
            }
        }

        if let Some(size) = lookup("STRONGBOX_RESPONSE_CACHE") {
            if let Ok(size) = size.parse() {
                config.response_cache_size = size;
            }
        }

        if let Some(ttl) = lookup("STRONGBOX_RESPONSE_TTL_SECS") {
            if let Ok(ttl) = ttl.parse() {
                config.response_ttl_secs = ttl;
            }
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.request_buffer == 0 {
            return Err("Request buffer cannot be 0".to_string());
        }

        if self.response_cache_size == 0 {
            return Err("Response cache size cannot be 0".to_string());
        }

        if self.ledger.journal_capacity == 0 {
            return Err("Journal capacity cannot be 0".to_string());
        }

        self.ledger.params().map_err(|e| e.to_string())?;

        Ok(())
    }
}
