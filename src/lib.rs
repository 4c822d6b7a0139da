//! Backstack - a navigation back-stack that keeps only one screen alive
//!
//! Screens pushed onto a container replace the visible one. The retired
//! screen is not kept in memory: its type, arguments, tag and captured
//! state are recorded, the instance is destroyed, and a fresh instance is
//! rebuilt from that record when the user navigates back.
//!
//! # Architecture
//!
//! - [`core`] - Domain types, stack state, persistence, and configuration
//! - [`engine`] - The [`BackStack`](engine::BackStack) controller
//! - [`host`] - The seam to the UI toolkit, plus a mock for tests
//!
//! # Correctness Invariants
//!
//! 1. At most one screen per container is live and attached
//! 2. Retired screens are rebuilt from recorded state, never kept alive
//! 3. Persisted stacks restore to the same entries in the same order
//! 4. Driving a container that was never started is a hard error

pub mod core;
pub mod engine;
pub mod host;
