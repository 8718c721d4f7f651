//! # Taxed Token Service
//!
//! Async façade over one [`TaxedToken`].
//!
//! - Serializes every operation through a single `tokio::sync::RwLock`
//! - Accepts request payloads tagged with a correlation ID
//! - Keeps a bounded history of committed events and running statistics

use crate::adapters::{
    ConstantPriceRouter, DeterministicPairFactory, InMemoryLedger, InMemoryReferenceLedger,
};
use crate::config::{ServiceConfig, TokenConfig};
use crate::domain::entities::{BlockContext, TaxConfiguration, TransferReceipt};
use crate::domain::value_objects::{Address, U256};
use crate::errors::TokenError;
use crate::events::{
    AdminCommand, AdminRequestPayload, AdminResponsePayload, TokenEvent, TransferRequestPayload,
    TransferResponsePayload,
};
use crate::ports::inbound::TaxedTokenApi;
use crate::ports::outbound::{ExchangeRouter, ReferenceLedger, TokenLedger};
use crate::token::{Deployment, TaxedToken};

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Statistics for the taxed token service.
#[derive(Debug, Default, Clone)]
pub struct ServiceStats {
    /// Transfers committed.
    pub transfers_committed: u64,
    /// Transfers reverted.
    pub transfers_reverted: u64,
    /// Administrative commands committed.
    pub admin_committed: u64,
    /// Administrative commands rejected.
    pub admin_rejected: u64,
    /// Conversions completed (automatic and manual).
    pub conversions: u64,
    /// Total fees collected, in smallest units.
    pub fees_collected: U256,
    /// Total reference currency forwarded to the treasury.
    pub reference_forwarded: U256,
}

/// The taxed token service.
pub struct TaxedTokenService<L, R, X> {
    /// Service configuration.
    config: ServiceConfig,
    /// The token.
    token: Arc<RwLock<TaxedToken<L, R, X>>>,
    /// Recently committed events, oldest first.
    history: Arc<RwLock<VecDeque<TokenEvent>>>,
    /// Service statistics.
    stats: Arc<RwLock<ServiceStats>>,
}

impl<L, R, X> TaxedTokenService<L, R, X>
where
    L: TokenLedger,
    R: ReferenceLedger,
    X: ExchangeRouter,
{
    /// Wrap a deployed token.
    pub fn new(mut token: TaxedToken<L, R, X>, config: ServiceConfig) -> Self {
        let mut history = VecDeque::new();
        push_bounded(&mut history, token.drain_events(), config.event_history_limit);
        Self {
            config,
            token: Arc::new(RwLock::new(token)),
            history: Arc::new(RwLock::new(history)),
            stats: Arc::new(RwLock::new(ServiceStats::default())),
        }
    }

    /// Get current service statistics.
    pub async fn stats(&self) -> ServiceStats {
        self.stats.read().await.clone()
    }

    /// Committed events, oldest first, up to the configured limit.
    pub async fn recent_events(&self) -> Vec<TokenEvent> {
        self.history.read().await.iter().cloned().collect()
    }

    /// Read access to the token for views.
    pub async fn token(&self) -> RwLockReadGuard<'_, TaxedToken<L, R, X>> {
        self.token.read().await
    }

    /// Handle a transfer request.
    #[instrument(skip(self, payload), fields(correlation_id = %correlation_id))]
    pub async fn handle_transfer(
        &self,
        correlation_id: Uuid,
        payload: TransferRequestPayload,
    ) -> TransferResponsePayload {
        info!(
            from = ?payload.from,
            to = ?payload.to,
            amount = %payload.amount,
            delegated = payload.spender.is_some(),
            "Processing transfer request"
        );

        let (result, events) = self
            .run_transfer(
                payload.spender,
                payload.from,
                payload.to,
                payload.amount,
                Some(payload.block_context),
            )
            .await;

        match result {
            Ok(receipt) => TransferResponsePayload {
                success: true,
                receipt: Some(receipt),
                events,
                revert_reason: None,
            },
            Err(e) => TransferResponsePayload {
                success: false,
                receipt: None,
                events: Vec::new(),
                revert_reason: Some(e.to_string()),
            },
        }
    }

    /// Handle an administrative request.
    #[instrument(skip(self, payload), fields(correlation_id = %correlation_id))]
    pub async fn handle_admin(
        &self,
        correlation_id: Uuid,
        payload: AdminRequestPayload,
    ) -> AdminResponsePayload {
        info!(
            caller = ?payload.caller,
            command = ?payload.command,
            "Processing admin request"
        );

        match self
            .run_admin(payload.caller, payload.command, Some(payload.block_context))
            .await
        {
            Ok(events) => AdminResponsePayload {
                success: true,
                events,
                revert_reason: None,
            },
            Err(e) => AdminResponsePayload {
                success: false,
                events: Vec::new(),
                revert_reason: Some(e.to_string()),
            },
        }
    }

    async fn run_transfer(
        &self,
        spender: Option<Address>,
        from: Address,
        to: Address,
        amount: U256,
        block: Option<BlockContext>,
    ) -> (Result<TransferReceipt, TokenError>, Vec<TokenEvent>) {
        let (result, events) = {
            let mut token = self.token.write().await;
            if let Some(block) = block {
                token.set_block_context(block);
            }
            let result = match spender {
                Some(spender) => token.transfer_from(spender, from, to, amount),
                None => token.transfer(from, to, amount),
            };
            (result, token.drain_events())
        };

        {
            let mut stats = self.stats.write().await;
            match &result {
                Ok(receipt) => {
                    stats.transfers_committed += 1;
                    stats.fees_collected = stats.fees_collected.saturating_add(receipt.split.fee);
                }
                Err(e) => {
                    stats.transfers_reverted += 1;
                    warn!(error = %e, "Transfer reverted");
                }
            }
        }
        self.record(&events).await;

        (result, events)
    }

    async fn run_admin(
        &self,
        caller: Address,
        command: AdminCommand,
        block: Option<BlockContext>,
    ) -> Result<Vec<TokenEvent>, TokenError> {
        let result = {
            let mut token = self.token.write().await;
            if let Some(block) = block {
                token.set_block_context(block);
            }
            let result = token.execute(caller, command);
            token.drain_events();
            result
        };

        match &result {
            Ok(events) => {
                self.stats.write().await.admin_committed += 1;
                self.record(events).await;
            }
            Err(e) => {
                self.stats.write().await.admin_rejected += 1;
                warn!(error = %e, "Admin command rejected");
            }
        }
        result
    }

    async fn record(&self, events: &[TokenEvent]) {
        if events.is_empty() {
            return;
        }
        {
            let mut stats = self.stats.write().await;
            for event in events {
                if let TokenEvent::ProceedsConverted { forwarded, .. } = event {
                    stats.conversions += 1;
                    stats.reference_forwarded = stats.reference_forwarded.saturating_add(*forwarded);
                }
            }
        }
        let mut history = self.history.write().await;
        push_bounded(
            &mut history,
            events.iter().cloned(),
            self.config.event_history_limit,
        );
        debug!(count = events.len(), retained = history.len(), "Events recorded");
    }
}

fn push_bounded(
    history: &mut VecDeque<TokenEvent>,
    events: impl IntoIterator<Item = TokenEvent>,
    limit: usize,
) {
    history.extend(events);
    while history.len() > limit {
        history.pop_front();
    }
}

/// Deploy a token over in-memory adapters with the default configuration
/// (for testing).
///
/// The router sells into the primary pool at one reference unit per token;
/// seed the pool's reference balance through `reference` to make conversions
/// succeed.
///
/// # Errors
///
/// Fails if `deployment` contains a zero address.
pub fn create_test_token(
    deployment: Deployment,
    reference: InMemoryReferenceLedger,
) -> Result<TaxedToken<InMemoryLedger, InMemoryReferenceLedger, ConstantPriceRouter>, TokenError>
{
    let reference_token = Address::repeat(0xC0);
    let mut factory = DeterministicPairFactory::new(Address::repeat(0xF0), [0u8; 32]);
    let pool = factory.pair_address(deployment.token, reference_token);
    let router = ConstantPriceRouter::new(
        Address::repeat(0xB0),
        reference_token,
        pool,
        U256::one(),
        U256::one(),
    );

    TaxedToken::deploy(
        deployment,
        &TokenConfig::default(),
        InMemoryLedger::new(),
        reference,
        router,
        &mut factory,
        BlockContext::default(),
    )
}

/// Create a service around [`create_test_token`] (for testing).
///
/// # Errors
///
/// Fails if `deployment` contains a zero address.
pub fn create_test_service(
    deployment: Deployment,
    reference: InMemoryReferenceLedger,
) -> Result<
    TaxedTokenService<InMemoryLedger, InMemoryReferenceLedger, ConstantPriceRouter>,
    TokenError,
> {
    let token = create_test_token(deployment, reference)?;
    Ok(TaxedTokenService::new(token, ServiceConfig::default()))
}

// =============================================================================
// TaxedTokenApi Implementation
// =============================================================================

#[async_trait]
impl<L, R, X> TaxedTokenApi for TaxedTokenService<L, R, X>
where
    L: TokenLedger,
    R: ReferenceLedger,
    X: ExchangeRouter,
{
    async fn transfer(
        &self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<TransferReceipt, TokenError> {
        self.run_transfer(None, from, to, amount, None).await.0
    }

    async fn transfer_from(
        &self,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<TransferReceipt, TokenError> {
        self.run_transfer(Some(spender), from, to, amount, None)
            .await
            .0
    }

    async fn approve(
        &self,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        let (result, events) = {
            let mut token = self.token.write().await;
            let result = token.approve(owner, spender, amount);
            (result, token.drain_events())
        };
        self.record(&events).await;
        result
    }

    async fn execute_admin(
        &self,
        caller: Address,
        command: AdminCommand,
    ) -> Result<Vec<TokenEvent>, TokenError> {
        self.run_admin(caller, command, None).await
    }

    async fn balance_of(&self, account: Address) -> U256 {
        self.token.read().await.balance_of(account)
    }

    async fn tax_configuration(&self) -> TaxConfiguration {
        self.token.read().await.tax_configuration()
    }
}

// =============================================================================
// TESTS
// =============================================================================
