//! Vault node: hosts a ledger and serves call requests.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, instrument, warn};

use strongbox_common::{CallOutcome, CallRequest, CallResponse};
use strongbox_ledger::{TransferExecutor, VaultLedger};

use crate::config::NodeConfig;
use crate::error::{NodeError, NodeResult};
use crate::metrics::{Metrics, SharedMetrics};
use crate::responses::{ResponseCache, ResponseCacheConfig};
use crate::state::NodeState;

/// A request paired with the channel its response goes back on.
pub type Envelope = (CallRequest, oneshot::Sender<CallResponse>);

/// Hosts a vault ledger and serves requests against it.
pub struct VaultNode {
    /// Configuration.
    config: NodeConfig,
    /// Node ID for this instance.
    node_id: String,
    /// Current node state.
    state: Arc<RwLock<NodeState>>,
    /// The ledger.
    ledger: Arc<VaultLedger>,
    /// Responses already produced, by request ID.
    responses: Arc<ResponseCache>,
    /// Metrics.
    metrics: SharedMetrics,
}

impl VaultNode {
    /// Create a node, validating the ledger parameters from `config`.
    pub fn new(
        config: NodeConfig,
        node_id: String,
        executor: Arc<dyn TransferExecutor>,
    ) -> anyhow::Result<Self> {
        let params = config.ledger.params()?;
        let ledger = VaultLedger::with_policy(params, executor, config.ledger.diagnostic_policy())
            .with_journal_capacity(config.ledger.journal_capacity);
        let ttl = i64::try_from(config.response_ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX);
        let responses = ResponseCache::with_config(ResponseCacheConfig {
            ttl,
            max_entries: config.response_cache_size,
        });

        Ok(Self {
            config,
            node_id,
            state: Arc::new(RwLock::new(NodeState::Starting)),
            ledger: Arc::new(ledger),
            responses: Arc::new(responses),
            metrics: Arc::new(Metrics::new()),
        })
    }

    /// Start accepting requests.
    #[instrument(skip(self), fields(node_id = %self.node_id))]
    pub async fn start(&self) -> NodeResult<()> {
        info!("Starting node");
        *self.state.write() = NodeState::Running;
        info!(
            withdrawal_limit = %self.ledger.params().withdrawal_limit(),
            bank_cap = %self.ledger.params().bank_cap(),
            "Node started"
        );
        Ok(())
    }

    /// Stop accepting requests.
    #[instrument(skip(self), fields(node_id = %self.node_id))]
    pub async fn stop(&self) -> NodeResult<()> {
        info!("Stopping node");
        *self.state.write() = NodeState::ShuttingDown;

        if let Err(e) = self.ledger.verify_integrity() {
            error!(error = %e, "Ledger integrity check failed at shutdown");
        }

        *self.state.write() = NodeState::Stopped;
        info!(snapshot = ?self.ledger.snapshot(), "Node stopped");
        Ok(())
    }

    /// Handle one request.
    ///
    /// A request whose ID has already been answered gets the recorded
    /// response back without touching the ledger.
    #[instrument(skip(self, request), fields(request_id = %request.request_id))]
    pub async fn handle_request(&self, request: CallRequest) -> NodeResult<CallOutcome> {
        if !self.is_accepting_requests() {
            return Err(NodeError::NotAccepting);
        }

        if let Some(existing) = self.responses.get(&request.request_id) {
            debug!("Duplicate request answered from cache");
            self.metrics.duplicate_request();
            return existing.result.map_err(NodeError::Replayed);
        }

        let request_id = request.request_id;
        let ledger = self.ledger.clone();
        let interaction = request.interaction;

        // Transfer executors may block, so ledger calls stay off the async workers.
        let result = tokio::task::spawn_blocking(move || ledger.dispatch(&interaction))
            .await
            .map_err(|e| NodeError::Internal(format!("ledger task failed: {e}")))?;

        self.metrics.record(&result);

        let response = CallResponse {
            request_id,
            result: result.as_ref().map_err(|e| e.report()).cloned(),
        };
        self.responses.insert(response);

        match &result {
            Ok(outcome) => debug!(outcome = ?outcome, "Request completed"),
            Err(e) => warn!(code = e.error_code(), error = %e, "Request rejected"),
        }

        result.map_err(NodeError::from)
    }

    /// Handle one request and wrap the result in a response envelope.
    pub async fn respond(&self, request: CallRequest) -> CallResponse {
        let request_id = request.request_id;

        if let Some(existing) = self.responses.get(&request_id) {
            self.metrics.duplicate_request();
            return existing;
        }

        let result = self
            .handle_request(request)
            .await
            .map_err(|e| e.report());
        CallResponse { request_id, result }
    }

    /// Serve requests from `rx` until the channel closes or the node stops.
    pub async fn serve(self: Arc<Self>, mut rx: mpsc::Receiver<Envelope>) {
        info!(node_id = %self.node_id, "Serving requests");

        while let Some((request, reply)) = rx.recv().await {
            let response = self.respond(request).await;
            if reply.send(response).is_err() {
                debug!("Caller dropped before response was sent");
            }

            if self.state().is_terminal() {
                break;
            }
        }

        info!(node_id = %self.node_id, "Request loop finished");
    }

    /// Create a request channel sized from the configuration.
    pub fn channel(&self) -> (mpsc::Sender<Envelope>, mpsc::Receiver<Envelope>) {
        mpsc::channel(self.config.request_buffer)
    }

    /// Check if the node is accepting requests.
    pub fn is_accepting_requests(&self) -> bool {
        self.state.read().accepts_requests()
    }

    /// Get the current node state.
    pub fn state(&self) -> NodeState {
        *self.state.read()
    }

    /// Node ID.
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// The hosted ledger.
    pub fn ledger(&self) -> &Arc<VaultLedger> {
        &self.ledger
    }

    /// Node metrics.
    pub fn metrics(&self) -> &SharedMetrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payout::PayoutBook;
    use strongbox_common::{AccountId, Amount, Interaction, Operation};

    fn create_test_node() -> (VaultNode, Arc<PayoutBook>) {
        let payouts = Arc::new(PayoutBook::new());
        let node = VaultNode::new(
            NodeConfig::default(),
            "test-node-1".to_string(),
            payouts.clone(),
        )
        .unwrap();
        (node, payouts)
    }

    fn withdraw(caller: &str, amount: u128) -> CallRequest {
        CallRequest::new(
            Interaction::call(
                caller,
                Amount::ZERO,
                &Operation::Withdraw {
                    amount: Amount::new(amount),
                },
            )
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_node_creation() {
        let (node, _) = create_test_node();
        assert_eq!(node.state(), NodeState::Starting);
        assert!(!node.is_accepting_requests());
    }

    #[test]
    fn test_invalid_ledger_config_is_rejected() {
        let mut config = NodeConfig::default();
        config.ledger.bank_cap = Amount::ZERO;
        assert!(VaultNode::new(config, "n".into(), Arc::new(PayoutBook::new())).is_err());
    }

    #[tokio::test]
    async fn test_node_start_stop() {
        let (node, _) = create_test_node();

        node.start().await.unwrap();
        assert_eq!(node.state(), NodeState::Running);

        node.stop().await.unwrap();
        assert_eq!(node.state(), NodeState::Stopped);

        let err = node
            .handle_request(CallRequest::new(Interaction::transfer("alice", Amount::new(1))))
            .await
            .unwrap_err();
        assert!(matches!(err, NodeError::NotAccepting));
    }

    #[tokio::test]
    async fn test_deposit_and_withdraw_delivers_value() {
        let (node, payouts) = create_test_node();
        node.start().await.unwrap();

        node.handle_request(CallRequest::new(Interaction::transfer("alice", Amount::new(80))))
            .await
            .unwrap();
        let outcome = node.handle_request(withdraw("alice", 30)).await.unwrap();

        assert_eq!(
            outcome,
            CallOutcome::Withdrawn {
                account: AccountId::new("alice"),
                amount: Amount::new(30),
            }
        );
        assert_eq!(payouts.delivered_to(&AccountId::new("alice")), Amount::new(30));
        assert_eq!(node.ledger().vault_balance(&AccountId::new("alice")), Amount::new(50));
    }

    #[tokio::test]
    async fn test_duplicate_request_is_not_reexecuted() {
        let (node, payouts) = create_test_node();
        node.start().await.unwrap();

        node.handle_request(CallRequest::new(Interaction::transfer("alice", Amount::new(80))))
            .await
            .unwrap();

        let request = withdraw("alice", 30);
        let first = node.respond(request.clone()).await;
        let second = node.respond(request).await;

        assert!(first.is_success());
        assert_eq!(first, second);
        assert_eq!(payouts.delivered_to(&AccountId::new("alice")), Amount::new(30));
        assert_eq!(node.ledger().stats().withdrawal_count, 1);
        assert_eq!(node.metrics().snapshot().requests_duplicate, 1);
    }

    #[tokio::test]
    async fn test_blocked_recipient_rolls_back() {
        let (node, payouts) = create_test_node();
        node.start().await.unwrap();

        node.handle_request(CallRequest::new(Interaction::transfer("alice", Amount::new(80))))
            .await
            .unwrap();
        payouts.block(AccountId::new("alice"));

        let response = node.respond(withdraw("alice", 30)).await;

        assert_eq!(response.error_code(), Some("TRANSFER_FAILED"));
        assert_eq!(node.ledger().vault_balance(&AccountId::new("alice")), Amount::new(80));
        assert_eq!(node.ledger().total_deposited(), Amount::new(80));
        assert_eq!(node.metrics().snapshot().transfers_failed, 1);
    }

    #[tokio::test]
    async fn test_response_cache_is_bounded() {
        let mut config = NodeConfig::default();
        config.response_cache_size = 2;
        let node = VaultNode::new(config, "n".into(), Arc::new(PayoutBook::new())).unwrap();
        node.start().await.unwrap();

        for _ in 0..10 {
            node.respond(CallRequest::new(Interaction::raw("mallory", Amount::ZERO, b"x".to_vec())))
                .await;
        }

        assert_eq!(node.responses.len(), 2);
    }

    #[tokio::test]
    async fn test_serve_over_channel() {
        let (node, _) = create_test_node();
        let node = Arc::new(node);
        node.start().await.unwrap();

        let (tx, rx) = node.channel();
        let server = tokio::spawn(node.clone().serve(rx));

        let (reply_tx, reply_rx) = oneshot::channel();
        tx.send((
            CallRequest::new(Interaction::raw("mallory", Amount::new(9), b"??".to_vec())),
            reply_tx,
        ))
        .await
        .unwrap();
        let response = reply_rx.await.unwrap();
        assert_eq!(response.error_code(), Some("UNRECOGNIZED_CALL"));

        let (reply_tx, reply_rx) = oneshot::channel();
        tx.send((
            CallRequest::new(Interaction::call("bob", Amount::ZERO, &Operation::GetStats).unwrap()),
            reply_tx,
        ))
        .await
        .unwrap();
        let response = reply_rx.await.unwrap();
        assert!(response.is_success());

        drop(tx);
        server.await.unwrap();
        assert_eq!(node.metrics().snapshot().calls_unrecognized, 1);
    }
}
