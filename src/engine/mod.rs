//! engine
//!
//! Drives back-stacks through a [`Host`](crate::host::Host).
//!
//! # Architecture
//!
//! Every operation follows the same shape:
//!
//! 1. **Settle**: resume continuations the host has completed
//! 2. **Plan**: decide from the held entries what changes (pure)
//! 3. **Commit**: hand ordered transactions to the host
//! 4. **Record**: update the held entries and the current screen
//!
//! The engine never mutates screens directly. It records history and
//! issues transactions; the host decides when they take effect.
//!
//! # Invariants
//!
//! - Push and pop require a started container
//! - A retired screen's state is captured after it is stopped and before
//!   it is destroyed, or not at all
//! - Every detached screen is eventually removed, even if its entry was
//!   popped in the meantime
//! - A screen rebuilt by a pop is a fresh instance, primed with the
//!   state captured for its entry

pub mod back_stack;
pub mod plan;

pub use back_stack::{BackStack, BackStackError, REGISTRY_KIND};
pub use plan::{plan_pop_to, PopPlan};
