//! core
//!
//! Core domain types, persisted state, and configuration.
//!
//! # Modules
//!
//! - [`types`] - Strong types: ContainerId, ScreenType, Blob, etc.
//! - [`screen`] - Screen instance handles
//! - [`anim`] - Transition options for push and pop
//! - [`entry`] - Retired-screen records
//! - [`state`] - Per-container history and its persisted form
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Persisted documents are strict and self-describing
//! - Nothing here talks to a host

pub mod anim;
pub mod config;
pub mod entry;
pub mod screen;
pub mod state;
pub mod types;
