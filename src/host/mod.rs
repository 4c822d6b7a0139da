//! host
//!
//! The UI toolkit side of the back-stack.
//!
//! # Modules
//!
//! - [`traits`] - The [`Host`] trait and the transactions it applies
//! - [`mock`] - In-memory host for tests

pub mod mock;
pub mod traits;

pub use traits::{CommitMode, Continuation, Host, Transaction, TxOp};
