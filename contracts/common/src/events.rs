//! Protocol Events for optvault
//!
//! Events are emitted during contract execution and can be indexed
//! off-chain for building UIs, analytics, and notifications.
//! A rejected call emits nothing.

use crate::Vec;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use crate::types::{Address, AssetId, VaultIndex};

/// Event types for indexing and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum EventType {
    // Vault Events (0x01 - 0x1F)
    VaultOpened = 0x01,
    CollateralDeposited = 0x02,
    CollateralWithdrawn = 0x03,
    DebtIssued = 0x04,
    DebtRedeemed = 0x05,
    UnsafeEvaluated = 0x06,
    VaultLiquidated = 0x07,

    // Token Events (0x40 - 0x5F)
    TokenTransfer = 0x40,
    TokenMint = 0x41,
    TokenBurn = 0x42,
    TokenApproval = 0x43,

    // Oracle Events (0x60 - 0x7F)
    PriceUpdated = 0x60,
    OracleOperatorChanged = 0x61,
}

/// Main event enum containing all possible protocol events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum OptionsEvent {
    // ============ Vault Events ============

    /// Emitted when a new vault is opened
    VaultOpened {
        index: VaultIndex,
        owner: Address,
        timestamp: u64,
    },

    /// Emitted when collateral is credited to a vault
    CollateralDeposited {
        index: VaultIndex,
        depositor: Address,
        amount: u64,
        new_collateral: u64,
        timestamp: u64,
    },

    /// Emitted when the owner withdraws surplus collateral
    CollateralWithdrawn {
        index: VaultIndex,
        amount: u64,
        new_collateral: u64,
        timestamp: u64,
    },

    /// Emitted when option tokens are minted against a vault
    DebtIssued {
        index: VaultIndex,
        recipient: Address,
        amount: u64,
        new_debt: u64,
        timestamp: u64,
    },

    /// Emitted when option tokens are burned to reduce a vault's debt
    DebtRedeemed {
        index: VaultIndex,
        amount: u64,
        new_debt: u64,
        timestamp: u64,
    },

    /// Emitted every time a vault's safety is evaluated
    UnsafeEvaluated {
        index: VaultIndex,
        is_unsafe: bool,
        timestamp: u64,
    },

    /// Emitted when a vault is (partially) liquidated
    VaultLiquidated {
        index: VaultIndex,
        liquidator: Address,
        repay_amount: u64,
        collateral_payout: u64,
        new_debt: u64,
        new_collateral: u64,
        timestamp: u64,
    },

    // ============ Token Events ============

    /// Emitted on token transfer
    TokenTransfer {
        from: Address,
        to: Address,
        amount: u64,
        timestamp: u64,
    },

    /// Emitted when tokens are minted
    TokenMint {
        to: Address,
        amount: u64,
        new_total_supply: u64,
        timestamp: u64,
    },

    /// Emitted when tokens are burned
    TokenBurn {
        from: Address,
        amount: u64,
        new_total_supply: u64,
        timestamp: u64,
    },

    /// Emitted when an allowance is set
    TokenApproval {
        owner: Address,
        spender: Address,
        amount: u64,
        timestamp: u64,
    },

    // ============ Oracle Events ============

    /// Emitted when an asset quote is updated
    PriceUpdated {
        asset: AssetId,
        old_value: u64,
        new_value: u64,
        scale: i32,
        timestamp: u64,
    },

    /// Emitted when oracle operator changes
    OracleOperatorChanged {
        old_operator: Address,
        new_operator: Address,
        timestamp: u64,
    },
}

impl OptionsEvent {
    /// Get the event type for filtering
    pub fn event_type(&self) -> EventType {
        match self {
            Self::VaultOpened { .. } => EventType::VaultOpened,
            Self::CollateralDeposited { .. } => EventType::CollateralDeposited,
            Self::CollateralWithdrawn { .. } => EventType::CollateralWithdrawn,
            Self::DebtIssued { .. } => EventType::DebtIssued,
            Self::DebtRedeemed { .. } => EventType::DebtRedeemed,
            Self::UnsafeEvaluated { .. } => EventType::UnsafeEvaluated,
            Self::VaultLiquidated { .. } => EventType::VaultLiquidated,
            Self::TokenTransfer { .. } => EventType::TokenTransfer,
            Self::TokenMint { .. } => EventType::TokenMint,
            Self::TokenBurn { .. } => EventType::TokenBurn,
            Self::TokenApproval { .. } => EventType::TokenApproval,
            Self::PriceUpdated { .. } => EventType::PriceUpdated,
            Self::OracleOperatorChanged { .. } => EventType::OracleOperatorChanged,
        }
    }

    /// Get the timestamp when the event occurred
    pub fn timestamp(&self) -> u64 {
        match self {
            Self::VaultOpened { timestamp, .. } => *timestamp,
            Self::CollateralDeposited { timestamp, .. } => *timestamp,
            Self::CollateralWithdrawn { timestamp, .. } => *timestamp,
            Self::DebtIssued { timestamp, .. } => *timestamp,
            Self::DebtRedeemed { timestamp, .. } => *timestamp,
            Self::UnsafeEvaluated { timestamp, .. } => *timestamp,
            Self::VaultLiquidated { timestamp, .. } => *timestamp,
            Self::TokenTransfer { timestamp, .. } => *timestamp,
            Self::TokenMint { timestamp, .. } => *timestamp,
            Self::TokenBurn { timestamp, .. } => *timestamp,
            Self::TokenApproval { timestamp, .. } => *timestamp,
            Self::PriceUpdated { timestamp, .. } => *timestamp,
            Self::OracleOperatorChanged { timestamp, .. } => *timestamp,
        }
    }

    /// Vault the event refers to, if any
    pub fn vault_index(&self) -> Option<VaultIndex> {
        match self {
            Self::VaultOpened { index, .. }
            | Self::CollateralDeposited { index, .. }
            | Self::CollateralWithdrawn { index, .. }
            | Self::DebtIssued { index, .. }
            | Self::DebtRedeemed { index, .. }
            | Self::UnsafeEvaluated { index, .. }
            | Self::VaultLiquidated { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Serialize event to bytes for storage/transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    /// Deserialize event from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        borsh::from_slice(bytes).ok()
    }
}

/// Event log for collecting multiple events during execution
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<OptionsEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Emit an event (add to log)
    pub fn emit(&mut self, event: OptionsEvent) {
        self.events.push(event);
    }

    /// Get all events
    pub fn events(&self) -> &[OptionsEvent] {
        &self.events
    }

    /// Most recent event
    pub fn last(&self) -> Option<&OptionsEvent> {
        self.events.last()
    }

    /// Take ownership of all events
    pub fn into_events(self) -> Vec<OptionsEvent> {
        self.events
    }

    /// Filter events by type
    pub fn filter_by_type(&self, event_type: EventType) -> Vec<&OptionsEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Check if any events were emitted
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Get number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Clear all events
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
