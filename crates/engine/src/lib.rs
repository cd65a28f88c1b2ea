//! Bundle submission engine
//!
//! This crate assembles tip-carrying bundles, waits for the block engine to
//! report an outcome, and drives resubmission until a bundle is accepted.

pub mod assembler;
pub mod blockhash;
pub mod builder;
pub mod driver;
pub mod forger;
pub mod waiter;

pub use assembler::*;
pub use blockhash::*;
pub use builder::*;
pub use driver::*;
pub use forger::*;
pub use waiter::*;
