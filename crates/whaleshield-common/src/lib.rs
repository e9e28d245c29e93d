//! WhaleShield shared types and traits.
//!
//! This crate is the base foundation for the WhaleShield crates: amounts,
//! addresses, the base-layer transaction codec, progress notifications and
//! the interfaces of the external collaborators (shielded pool, ledger,
//! transaction signer).
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

pub mod address;
pub mod amount;
pub mod asset;
pub mod error;
pub mod ledger;
pub mod pool;
pub mod progress;
pub mod signer;
pub mod transaction;

pub use address::Address;
pub use amount::Amount;
pub use asset::AssetId;
pub use error::Error;
pub use ledger::LedgerConnector;
pub use pool::{DepositRequest, ShieldedPool, WithdrawRequest};
pub use progress::{TradeProgress, TradeStep};
pub use signer::{Keypair, TransactionSigner};
pub use transaction::{TransactionRef, VersionedTransaction};
