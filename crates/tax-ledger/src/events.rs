//! # Event Schema
//!
//! Notifications emitted by committed operations, plus the request/response
//! payloads accepted by [`crate::service::TaxedTokenService`].
//!
//! Events are for observability only; nothing in the token reads them back.
//! A reverted operation emits nothing.

use crate::domain::entities::{BlockContext, TransferReceipt};
use crate::domain::value_objects::{Address, TaxRate, U256};
use serde::{Deserialize, Serialize};

// =============================================================================
// TOKEN EVENTS
// =============================================================================

/// Notification emitted by the token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenEvent {
    /// Tokens moved between accounts (fee legs are separate events).
    Transfer {
        /// Debited account (zero for a mint).
        from: Address,
        /// Credited account.
        to: Address,
        /// Amount moved.
        amount: U256,
    },
    /// Allowance set.
    Approval {
        /// Holder granting the allowance.
        owner: Address,
        /// Account allowed to spend.
        spender: Address,
        /// New allowance.
        amount: U256,
    },
    /// Buy tax changed.
    BuyTaxUpdated {
        /// Previous rate.
        old: TaxRate,
        /// Rate now in force.
        new: TaxRate,
    },
    /// Sell tax changed.
    SellTaxUpdated {
        /// Previous rate.
        old: TaxRate,
        /// Rate now in force.
        new: TaxRate,
    },
    /// Exclusion status set.
    ExclusionUpdated {
        /// Affected account.
        account: Address,
        /// New status.
        excluded: bool,
    },
    /// Pool registered.
    PairAdded {
        /// Newly registered pool.
        pair: Address,
    },
    /// Treasury wallet changed.
    TreasuryUpdated {
        /// Previous treasury.
        old: Address,
        /// Treasury now receiving proceeds.
        new: Address,
    },
    /// Conversion threshold changed.
    SwapThresholdUpdated {
        /// Previous threshold, in smallest units.
        old: U256,
        /// Threshold now in force.
        new: U256,
    },
    /// Ownership moved.
    OwnershipTransferred {
        /// Previous owner (zero at deployment).
        old: Address,
        /// Current owner.
        new: Address,
    },
    /// Accumulated proceeds converted and forwarded.
    ProceedsConverted {
        /// Tokens sold.
        tokens_in: U256,
        /// Reference currency the swap produced.
        reference_out: U256,
        /// Reference currency paid to the treasury.
        forwarded: U256,
        /// Treasury at the time of the conversion.
        treasury: Address,
    },
    /// Reference currency received by the token contract.
    ValueReceived {
        /// Payer.
        from: Address,
        /// Amount received.
        amount: U256,
    },
}

impl TokenEvent {
    /// Short event name, used as a log field.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Transfer { .. } => "Transfer",
            Self::Approval { .. } => "Approval",
            Self::BuyTaxUpdated { .. } => "BuyTaxUpdated",
            Self::SellTaxUpdated { .. } => "SellTaxUpdated",
            Self::ExclusionUpdated { .. } => "ExclusionUpdated",
            Self::PairAdded { .. } => "PairAdded",
            Self::TreasuryUpdated { .. } => "TreasuryUpdated",
            Self::SwapThresholdUpdated { .. } => "SwapThresholdUpdated",
            Self::OwnershipTransferred { .. } => "OwnershipTransferred",
            Self::ProceedsConverted { .. } => "ProceedsConverted",
            Self::ValueReceived { .. } => "ValueReceived",
        }
    }

    /// Returns true for events produced by the administrative surface.
    #[must_use]
    pub fn is_administrative(&self) -> bool {
        matches!(
            self,
            Self::BuyTaxUpdated { .. }
                | Self::SellTaxUpdated { .. }
                | Self::ExclusionUpdated { .. }
                | Self::PairAdded { .. }
                | Self::TreasuryUpdated { .. }
                | Self::SwapThresholdUpdated { .. }
                | Self::OwnershipTransferred { .. }
        )
    }
}

// =============================================================================
// ADMINISTRATIVE COMMANDS
// =============================================================================

/// Administrative command accepted by the service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminCommand {
    /// Set the buy tax (percent, at most 10).
    SetBuyTax {
        /// New rate.
        percent: u8,
    },
    /// Set the sell tax (percent, at most 10).
    SetSellTax {
        /// New rate.
        percent: u8,
    },
    /// Set exclusion status for one address.
    SetExcluded {
        /// Affected account.
        account: Address,
        /// New status.
        excluded: bool,
    },
    /// Set exclusion status for many addresses. Rejects an empty list.
    SetExcludedBatch {
        /// Affected accounts.
        accounts: Vec<Address>,
        /// New status for all of them.
        excluded: bool,
    },
    /// Register an additional pool.
    AddPair {
        /// Pool to register.
        pair: Address,
    },
    /// Change the treasury wallet.
    SetTreasury {
        /// New treasury wallet.
        treasury: Address,
    },
    /// Change the conversion threshold (smallest units).
    SetSwapThreshold {
        /// New threshold.
        threshold: U256,
    },
    /// Run a conversion now.
    ManualSwap,
    /// Hand ownership to another address.
    TransferOwnership {
        /// Next owner.
        new_owner: Address,
    },
}

// =============================================================================
// REQUEST / RESPONSE PAYLOADS
// =============================================================================

/// Request to move tokens.
///
/// `spender` set means an allowance-based transfer on behalf of `from`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransferRequestPayload {
    /// Account whose tokens move.
    pub from: Address,
    /// Recipient.
    pub to: Address,
    /// Amount in smallest units.
    pub amount: U256,
    /// Spender acting for `from`, if any.
    pub spender: Option<Address>,
    /// Block context for execution.
    pub block_context: BlockContext,
}

/// Response to a transfer request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransferResponsePayload {
    /// Whether the transfer committed.
    pub success: bool,
    /// Receipt of the committed transfer.
    pub receipt: Option<TransferReceipt>,
    /// Events emitted by the transfer.
    pub events: Vec<TokenEvent>,
    /// Revert reason (if failed).
    pub revert_reason: Option<String>,
}

/// Request to run an administrative command.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdminRequestPayload {
    /// Caller whose authority is checked.
    pub caller: Address,
    /// Command to execute.
    pub command: AdminCommand,
    /// Block context for execution.
    pub block_context: BlockContext,
}

/// Response to an administrative request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdminResponsePayload {
    /// Whether the command committed.
    pub success: bool,
    /// Events emitted by the command.
    pub events: Vec<TokenEvent>,
    /// Revert reason (if failed).
    pub revert_reason: Option<String>,
}

// =============================================================================
// EVENT BUS TOPICS
// =============================================================================

/// Topics for publishing token activity.
pub mod topics {
    /// Transfer requests.
    pub const TRANSFER_REQUEST: &str = "tax_ledger.transfer.request";

    /// Transfer responses.
    pub const TRANSFER_RESPONSE: &str = "tax_ledger.transfer.response";

    /// Administrative requests.
    pub const ADMIN_REQUEST: &str = "tax_ledger.admin.request";

    /// Administrative responses.
    pub const ADMIN_RESPONSE: &str = "tax_ledger.admin.response";

    /// Committed token events.
    pub const TOKEN_EVENTS: &str = "tax_ledger.events";
}

// =============================================================================
// TESTS
// =============================================================================
