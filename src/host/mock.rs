//! host::mock
//!
//! In-memory host for deterministic testing.
//!
//! # Design
//!
//! `MockHost` keeps a queue of deferred transactions and applies them only
//! when [`Host::execute_pending`] is called, the way a UI toolkit applies
//! its pending work on the next frame. Every screen instance it attaches
//! gets a lifecycle log, so tests can assert the exact sequence a screen
//! went through (created, started, stopped, state saved, destroyed).
//!
//! Captured state is derived from the screen: the UTF-8 arguments (or the
//! type name when there are none) followed by `_state`.
//!
//! # Example
//!
//! ```
//! use backstack::core::screen::Screen;
//! use backstack::core::types::{Blob, ContainerId, ScreenType};
//! use backstack::host::mock::{LifecycleEvent, MockHost};
//! use backstack::host::{CommitMode, Host, Transaction};
//!
//! let mut host = MockHost::new();
//! let screen = Screen::new(ScreenType::new("Page").unwrap(), Some(Blob::from("first")));
//! host.commit(
//!     Transaction::new().add(ContainerId::new(1), screen.clone()),
//!     CommitMode::Immediate,
//! );
//!
//! assert_eq!(
//!     host.events(&screen),
//!     &[LifecycleEvent::Created { saved_state: None }, LifecycleEvent::Started]
//! );
//! ```

use std::collections::{BTreeMap, HashMap, VecDeque};

use super::traits::{CommitMode, Continuation, Host, Transaction, TxOp};
use crate::core::screen::Screen;
use crate::core::types::{Blob, ContainerId, ScreenKey, ScreenType};

/// A lifecycle callback observed on a mock screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Instance created, with the state it was primed with.
    Created { saved_state: Option<Blob> },
    Started,
    Stopped,
    /// Reconstruction state captured.
    StateSaved { state: Blob },
    Destroyed,
}

/// Live bookkeeping for one screen instance.
#[derive(Debug)]
struct Instance {
    screen: Screen,
    container: ContainerId,
    attached: bool,
}

/// Mock host for testing.
#[derive(Debug, Default)]
pub struct MockHost {
    /// Live (attached or detached) instances.
    instances: HashMap<ScreenKey, Instance>,
    /// Attached screen per container.
    slots: BTreeMap<ContainerId, ScreenKey>,
    /// Primary navigation screen per container.
    primary: BTreeMap<ContainerId, ScreenKey>,
    /// Lifecycle log per instance, kept after destruction.
    events: HashMap<ScreenKey, Vec<LifecycleEvent>>,
    /// Screen types that host a nested container.
    hosted: HashMap<ScreenType, ContainerId>,
    pending: VecDeque<Transaction>,
    completed: Vec<Continuation>,
    /// Every transaction applied, in order.
    applied: Vec<Transaction>,
}

impl MockHost {
    /// Create an empty mock host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare that every screen of `screen_type` hosts `container`.
    pub fn with_hosted_container(mut self, screen_type: ScreenType, container: ContainerId) -> Self {
        self.hosted.insert(screen_type, container);
        self
    }

    /// Lifecycle log of `screen`.
    pub fn events(&self, screen: &Screen) -> &[LifecycleEvent] {
        self.events
            .get(&screen.key())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Primary navigation screen of `container`.
    pub fn primary(&self, container: ContainerId) -> Option<Screen> {
        let key = self.primary.get(&container)?;
        self.instances.get(key).map(|i| i.screen.clone())
    }

    /// Number of queued transactions.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Transactions applied so far.
    pub fn applied(&self) -> &[Transaction] {
        &self.applied
    }

    /// Number of live instances, attached or detached.
    pub fn live_count(&self) -> usize {
        self.instances.len()
    }

    /// Whether `screen` is still a live instance.
    pub fn is_live(&self, screen: &Screen) -> bool {
        self.instances.contains_key(&screen.key())
    }

    /// Simulate a configuration change.
    ///
    /// Queued work is applied first. Every attached screen then has its
    /// state saved and is destroyed, and a new instance of the same type,
    /// arguments and tag is created from that state in its place. Detached
    /// screens are destroyed. Undelivered continuations are dropped with
    /// the old instances.
    pub fn recreate(&mut self) {
        self.execute_pending();
        self.completed.clear();

        let attached: Vec<(ContainerId, ScreenKey)> =
            self.slots.iter().map(|(c, k)| (*c, *k)).collect();
        let detached: Vec<ScreenKey> = self
            .instances
            .iter()
            .filter(|(_, i)| !i.attached)
            .map(|(k, _)| *k)
            .collect();

        for key in detached {
            self.destroy(key);
        }

        let primaries = std::mem::take(&mut self.primary);
        self.slots.clear();
        for (container, key) in attached {
            let Some(old) = self.instances.get(&key).map(|i| i.screen.clone()) else {
                continue;
            };
            self.log(key, LifecycleEvent::Stopped);
            let state = self.state_for(&old);
            self.log(key, LifecycleEvent::StateSaved {
                state: state.clone(),
            });
            self.log(key, LifecycleEvent::Destroyed);
            self.instances.remove(&key);

            let fresh = Screen::new(old.screen_type().clone(), old.args().cloned())
                .with_tag(old.tag().map(str::to_owned))
                .with_initial_state(Some(state));
            if primaries.get(&container) == Some(&key) {
                self.primary.insert(container, fresh.key());
            }
            self.attach(container, fresh);
        }
    }

    fn state_for(&self, screen: &Screen) -> Blob {
        let name = screen
            .args()
            .and_then(|args| std::str::from_utf8(args.as_bytes()).ok())
            .map(str::to_owned)
            .unwrap_or_else(|| screen.screen_type().to_string());
        Blob::from(format!("{name}_state").as_str())
    }

    fn log(&mut self, key: ScreenKey, event: LifecycleEvent) {
        self.events.entry(key).or_default().push(event);
    }

    fn attach(&mut self, container: ContainerId, screen: Screen) {
        let key = screen.key();
        self.log(
            key,
            LifecycleEvent::Created {
                saved_state: screen.initial_state().cloned(),
            },
        );
        self.log(key, LifecycleEvent::Started);
        self.instances.insert(
            key,
            Instance {
                screen,
                container,
                attached: true,
            },
        );
        self.slots.insert(container, key);
    }

    fn destroy(&mut self, key: ScreenKey) {
        let Some(instance) = self.instances.remove(&key) else {
            return;
        };
        if instance.attached {
            self.log(key, LifecycleEvent::Stopped);
        }
        self.log(key, LifecycleEvent::Destroyed);
        if self.slots.get(&instance.container) == Some(&key) {
            self.slots.remove(&instance.container);
        }
        if self.primary.get(&instance.container) == Some(&key) {
            self.primary.remove(&instance.container);
        }

        // Nested screens go down with their host screen.
        if let Some(child) = self.hosted.get(instance.screen.screen_type()).copied() {
            let nested: Vec<ScreenKey> = self
                .instances
                .iter()
                .filter(|(_, i)| i.container == child)
                .map(|(k, _)| *k)
                .collect();
            for nested_key in nested {
                self.destroy(nested_key);
            }
        }
    }

    fn apply(&mut self, mut transaction: Transaction) {
        for op in transaction.ops().to_vec() {
            match op {
                TxOp::Add { container, screen } => self.attach(container, screen),
                TxOp::Replace { container, screen } => {
                    let occupants: Vec<ScreenKey> = self
                        .instances
                        .iter()
                        .filter(|(_, i)| i.container == container && i.attached)
                        .map(|(k, _)| *k)
                        .collect();
                    for key in occupants {
                        self.destroy(key);
                    }
                    self.attach(container, screen);
                }
                TxOp::Detach { screen } => {
                    let key = screen.key();
                    let container = match self.instances.get_mut(&key) {
                        Some(instance) if instance.attached => {
                            instance.attached = false;
                            instance.container
                        }
                        _ => continue,
                    };
                    self.log(key, LifecycleEvent::Stopped);
                    if self.slots.get(&container) == Some(&key) {
                        self.slots.remove(&container);
                    }
                }
                TxOp::Remove { screen } => self.destroy(screen.key()),
            }
        }

        if let Some(primary) = transaction.primary() {
            if let Some(instance) = self.instances.get(&primary.key()) {
                self.primary.insert(instance.container, primary.key());
            }
        }

        if let Some(continuation) = transaction.take_on_commit() {
            self.completed.push(continuation);
        }
        self.applied.push(transaction);
    }
}

impl Host for MockHost {
    fn commit(&mut self, transaction: Transaction, mode: CommitMode) {
        match mode {
            CommitMode::Deferred => self.pending.push_back(transaction),
            CommitMode::Immediate => {
                self.execute_pending();
                self.apply(transaction);
            }
        }
    }

    fn execute_pending(&mut self) {
        while let Some(transaction) = self.pending.pop_front() {
            self.apply(transaction);
        }
    }

    fn take_completed(&mut self) -> Vec<Continuation> {
        std::mem::take(&mut self.completed)
    }

    fn find_screen(&self, container: ContainerId) -> Option<Screen> {
        let key = self.slots.get(&container)?;
        self.instances.get(key).map(|i| i.screen.clone())
    }

    fn save_state(&mut self, screen: &Screen) -> Option<Blob> {
        let live = self.instances.get(&screen.key())?.screen.clone();
        let state = self.state_for(&live);
        self.log(
            live.key(),
            LifecycleEvent::StateSaved {
                state: state.clone(),
            },
        );
        Some(state)
    }

    fn hosted_container(&self, screen: &Screen) -> Option<ContainerId> {
        self.hosted.get(screen.screen_type()).copied()
    }
}
