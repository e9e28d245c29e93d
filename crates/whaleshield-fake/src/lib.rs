//! WhaleShield Fake Backends
//!
//! Used for testing and simulation where the pool, the ledger and the
//! aggregator all live in memory.

#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

pub mod aggregator;
pub mod error;
pub mod ledger;
pub mod pool;

pub use aggregator::FakeAggregator;
pub use error::Error;
pub use ledger::{FakeLedger, SwapEffect};
pub use pool::FakeShieldedPool;
