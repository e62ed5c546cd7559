//! optvault Common Library
//!
//! Shared types, constants, and utilities for all optvault contracts.
//!
//! An option series locks a collateral asset in owner-opened vaults and
//! mints option tokens against it. This crate holds everything the token,
//! oracle and vault-manager contracts agree on:
//!
//! - **Types**: series, vaults, protocol parameters, actions
//! - **Math**: exact ratios with checked `u128` arithmetic
//! - **Oracle Adapter**: fail-closed collateral-to-strike rate
//! - **Token Seam**: the `TokenLedger` trait driven by the vault manager
//! - **Liquidation Math**: safety check, payout and per-call cap
//! - **Events**: structured event log for indexers
//!
//! This crate is `no_std` compatible for WASM compilation when built
//! without the default `std` feature.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

// Re-export collections for submodules based on feature
#[cfg(not(feature = "std"))]
pub use alloc::{collections::BTreeMap, vec::Vec};
#[cfg(feature = "std")]
pub use std::{collections::BTreeMap, vec::Vec};

pub mod constants;
pub mod errors;
pub mod types;
pub mod math;
pub mod events;
pub mod oracle;
pub mod token_ops;
pub mod liquidation;

// Re-exports for convenience
pub use errors::*;
pub use types::*;
pub use math::*;
pub use events::*;
pub use oracle::*;
pub use token_ops::*;
pub use liquidation::*;
