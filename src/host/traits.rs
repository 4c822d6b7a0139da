//! host::traits
//!
//! The seam between the back-stack and the UI toolkit that actually
//! swaps screens in and out of containers.
//!
//! # Design
//!
//! The back-stack never touches views. Everything visible happens in the
//! [`Host`], which receives ordered [`Transaction`]s and applies them
//! either later, batched with other deferred work, or immediately.
//!
//! A transaction may carry a [`Continuation`]. The host hands it back via
//! [`Host::take_completed`] once the transaction has been applied, and the
//! back-stack resumes the work it describes from
//! [`BackStack::dispatch_completions`](crate::engine::BackStack::dispatch_completions).
//! The host only guarantees ordering: a continuation is never returned
//! before its transaction has taken effect.
//!
//! # Example
//!
//! ```
//! use backstack::core::screen::Screen;
//! use backstack::core::types::{ContainerId, ScreenType};
//! use backstack::host::{CommitMode, Host, Transaction};
//! use backstack::host::mock::MockHost;
//!
//! let mut host = MockHost::new();
//! let container = ContainerId::new(1);
//! let home = Screen::new(ScreenType::new("app.Home").unwrap(), None);
//!
//! host.commit(Transaction::new().add(container, home.clone()), CommitMode::Deferred);
//! assert!(host.find_screen(container).is_none());
//!
//! host.execute_pending();
//! assert!(host.find_screen(container).unwrap().same_instance(&home));
//! ```

use serde::{Deserialize, Serialize};

use crate::core::anim::{SharedElements, Transition};
use crate::core::entry::EntryId;
use crate::core::screen::Screen;
use crate::core::types::{Blob, ContainerId, ScreenType};

/// When a committed transaction takes effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitMode {
    /// Queued and applied with the host's next batch.
    Deferred,
    /// Applied before `commit` returns, after draining queued work.
    Immediate,
}

/// One operation inside a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOp {
    /// Attach `screen` to `container`.
    Add {
        container: ContainerId,
        screen: Screen,
    },
    /// Destroy every screen attached to `container`, then attach `screen`.
    Replace {
        container: ContainerId,
        screen: Screen,
    },
    /// Stop `screen` and take it out of its container without destroying it.
    Detach { screen: Screen },
    /// Destroy `screen`.
    Remove { screen: Screen },
}

impl TxOp {
    /// The screen the operation acts on.
    pub fn screen(&self) -> &Screen {
        match self {
            TxOp::Add { screen, .. }
            | TxOp::Replace { screen, .. }
            | TxOp::Detach { screen }
            | TxOp::Remove { screen } => screen,
        }
    }
}

/// Work to resume once a transaction has been applied.
///
/// The only continuation the back-stack issues follows a detach: capture
/// the detached screen's state into its stack entry, then remove the
/// screen for good. Capturing between detach and remove is the one point
/// where the screen is stopped but not yet destroyed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Continuation {
    container: ContainerId,
    entry: EntryId,
    screen: Screen,
}

impl Continuation {
    pub(crate) fn capture_and_remove(container: ContainerId, entry: EntryId, screen: Screen) -> Self {
        Self {
            container,
            entry,
            screen,
        }
    }

    /// Container of the stack that owns the entry.
    pub fn container(&self) -> ContainerId {
        self.container
    }

    /// Entry waiting for the captured state.
    pub fn entry(&self) -> EntryId {
        self.entry
    }

    /// The detached screen.
    pub fn screen(&self) -> &Screen {
        &self.screen
    }
}

/// An ordered batch of operations applied atomically by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    ops: Vec<TxOp>,
    transition: Transition,
    shared_elements: SharedElements,
    primary: Option<Screen>,
    reordering_allowed: bool,
    on_commit: Option<Continuation>,
}

impl Transaction {
    /// An empty transaction.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `screen` to `container`.
    pub fn add(mut self, container: ContainerId, screen: Screen) -> Self {
        self.ops.push(TxOp::Add { container, screen });
        self
    }

    /// Replace whatever `container` shows with `screen`.
    pub fn replace(mut self, container: ContainerId, screen: Screen) -> Self {
        self.ops.push(TxOp::Replace { container, screen });
        self
    }

    /// Detach `screen` from its container.
    pub fn detach(mut self, screen: Screen) -> Self {
        self.ops.push(TxOp::Detach { screen });
        self
    }

    /// Destroy `screen`.
    pub fn remove(mut self, screen: Screen) -> Self {
        self.ops.push(TxOp::Remove { screen });
        self
    }

    /// Set the enter/exit transitions.
    pub fn with_transition(mut self, transition: Transition) -> Self {
        self.transition = transition;
        self
    }

    /// Add shared-element correspondences.
    pub fn with_shared_elements(mut self, elements: &SharedElements) -> Self {
        self.shared_elements.extend_from(elements);
        self
    }

    /// Mark `screen` as the primary navigation screen of its container.
    pub fn set_primary(mut self, screen: Screen) -> Self {
        self.primary = Some(screen);
        self
    }

    /// Allow the host to reorder and merge this transaction with others.
    pub fn reordering_allowed(mut self, allowed: bool) -> Self {
        self.reordering_allowed = allowed;
        self
    }

    /// Resume `continuation` once this transaction has been applied.
    pub fn run_on_commit(mut self, continuation: Continuation) -> Self {
        self.on_commit = Some(continuation);
        self
    }

    /// Operations, in order.
    pub fn ops(&self) -> &[TxOp] {
        &self.ops
    }

    /// Transitions to run.
    pub fn transition(&self) -> Transition {
        self.transition
    }

    /// Shared-element correspondences.
    pub fn shared_elements(&self) -> &SharedElements {
        &self.shared_elements
    }

    /// The screen to mark as primary, if any.
    pub fn primary(&self) -> Option<&Screen> {
        self.primary.as_ref()
    }

    /// Whether reordering is allowed.
    pub fn is_reordering_allowed(&self) -> bool {
        self.reordering_allowed
    }

    /// The pending continuation, if any.
    pub fn on_commit(&self) -> Option<&Continuation> {
        self.on_commit.as_ref()
    }

    /// Take the continuation out, leaving none.
    pub fn take_on_commit(&mut self) -> Option<Continuation> {
        self.on_commit.take()
    }
}

/// The UI toolkit the back-stack drives.
///
/// All methods are called on the UI thread.
pub trait Host {
    /// Queue (`Deferred`) or apply (`Immediate`) a transaction.
    ///
    /// Immediate commits first apply everything already queued.
    fn commit(&mut self, transaction: Transaction, mode: CommitMode);

    /// Apply every queued transaction now.
    fn execute_pending(&mut self);

    /// Continuations of transactions applied since the last call, in
    /// application order.
    fn take_completed(&mut self) -> Vec<Continuation>;

    /// The screen currently attached to `container`.
    fn find_screen(&self, container: ContainerId) -> Option<Screen>;

    /// Capture reconstruction state of a stopped screen.
    fn save_state(&mut self, screen: &Screen) -> Option<Blob>;

    /// Container for a nested back-stack hosted inside `screen`.
    fn hosted_container(&self, _screen: &Screen) -> Option<ContainerId> {
        None
    }

    /// Build a new, unattached screen instance.
    fn instantiate(&mut self, screen_type: &ScreenType, args: Option<&Blob>) -> Screen {
        Screen::new(screen_type.clone(), args.cloned())
    }
}
