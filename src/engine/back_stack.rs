//! engine::back_stack
//!
//! The back-stack controller.
//!
//! # State Machine
//!
//! Each container is either **empty** (never started, no state held) or
//! **active** (one screen visible, zero or more retired entries below it).
//! [`BackStack::start_with`] moves a container from empty to active;
//! push and pop require an active container and fail with
//! [`BackStackError::NotStarted`] otherwise.
//!
//! # Push Sequencing
//!
//! Pushing retires the visible screen in two host transactions:
//!
//! 1. *detach*, carrying a [`Continuation`]
//! 2. once the host reports the detach applied: capture the screen's
//!    state into its entry, then *remove* it
//!
//! State capture is only well defined between the screen being stopped
//! and being destroyed, which is exactly the window between the two. The
//! *replace* that shows the new screen is committed right away and does
//! not wait for the continuation.
//!
//! # Nested Stacks
//!
//! A screen may host a container of its own. A pop always drains the
//! deepest started nested stack first, following the chain of current
//! screens depth first, before touching the outer stack.
//!
//! A nested stack belongs to the screen instance hosting it. When that
//! screen is pushed away or replaced by a pop, the nested stacks below it
//! are discarded; a rebuilt host screen starts its containers afresh.
//!
//! # Example
//!
//! ```
//! use backstack::core::screen::Screen;
//! use backstack::core::types::{Blob, ContainerId, ScreenType};
//! use backstack::engine::BackStack;
//! use backstack::host::mock::MockHost;
//! use backstack::host::{CommitMode, Host};
//!
//! let page = |name: &str| Screen::new(ScreenType::new("Page").unwrap(), Some(Blob::from(name)));
//! let container = ContainerId::new(1);
//! let mut host = MockHost::new();
//! let mut stack = BackStack::default();
//!
//! stack.start_with(&mut host, container, page("first"), None).unwrap();
//! host.execute_pending();
//! stack.push(&mut host, container, page("second"), None, None).unwrap();
//! host.execute_pending();
//! stack.dispatch_completions(&mut host);
//! assert_eq!(stack.depth(container), 1);
//!
//! assert!(stack.pop(&mut host, container, None, CommitMode::Immediate).unwrap());
//! let shown = host.find_screen(container).unwrap();
//! assert_eq!(shown.initial_state(), Some(&Blob::from("first_state")));
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace, warn};

use super::plan::plan_pop_to;
use crate::core::anim::{AnimationSpec, PopAnimationSpec};
use crate::core::config::Config;
use crate::core::entry::StackEntry;
use crate::core::screen::Screen;
use crate::core::state::{PersistedStack, StackState, StateError, SCHEMA_VERSION};
use crate::core::types::ContainerId;
use crate::host::{CommitMode, Continuation, Host, Transaction};

/// The kind identifier for a persisted set of stacks.
pub const REGISTRY_KIND: &str = "backstack.registry";

/// Errors from back-stack operations.
#[derive(Debug, Error)]
pub enum BackStackError {
    /// Push or pop on a container that was never started.
    #[error("back-stack for container {0} was not started: call start_with before push or pop")]
    NotStarted(ContainerId),

    /// Stack state error.
    #[error(transparent)]
    State(#[from] StateError),
}

impl BackStackError {
    /// Whether this is a usage error: the back-stack was driven before
    /// being set up. These are programming errors, not runtime conditions.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            BackStackError::NotStarted(_)
                | BackStackError::State(StateError::MissingContainer)
                | BackStackError::State(StateError::ContainerMismatch { .. })
        )
    }
}

/// Persisted form of every stack.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct PersistedRegistry {
    kind: String,
    schema_version: u32,
    stacks: Vec<PersistedStack>,
}

/// Back-stacks for every container, and the operations that drive them.
///
/// One [`StackState`] is held per started container. The `BackStack`
/// outlives individual screens; hosts persist it with [`save`](Self::save)
/// before the process may be killed and bring it back with
/// [`restore`](Self::restore).
#[derive(Debug, Default)]
pub struct BackStack {
    stacks: BTreeMap<ContainerId, StackState>,
    config: Config,
}

impl BackStack {
    /// Create an empty back-stack.
    pub fn new(config: Config) -> Self {
        Self {
            stacks: BTreeMap::new(),
            config,
        }
    }

    /// The configuration in use.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Start `container` with `screen` as its only visible screen.
    ///
    /// Queued host work is applied first. If the container then already
    /// shows a screen (for example after a configuration change), nothing
    /// happens and `false` is returned.
    ///
    /// # Errors
    ///
    /// Returns a state error only if the held state is inconsistent with
    /// `container`.
    pub fn start_with(
        &mut self,
        host: &mut dyn Host,
        container: ContainerId,
        screen: Screen,
        tag: Option<&str>,
    ) -> Result<bool, BackStackError> {
        host.execute_pending();
        self.dispatch_completions(host);

        if host.find_screen(container).is_some() {
            debug!(%container, "container already shows a screen, keeping it");
            return Ok(false);
        }

        let reordering = self.config.reordering_allowed();
        let state = self.stacks.entry(container).or_default();
        state.set_container(container)?;

        let screen = screen.with_tag(tag.map(str::to_owned));
        debug!(%container, screen_type = %screen.screen_type(), "starting back-stack");
        host.commit(
            Transaction::new()
                .add(container, screen.clone())
                .reordering_allowed(reordering)
                .set_primary(screen.clone()),
            CommitMode::Deferred,
        );
        state.set_current(screen);
        Ok(true)
    }

    /// Push `screen`, retiring the current one into the stack.
    ///
    /// Transitions and shared elements of `options` apply to this push;
    /// its pop transitions are stored on the retired entry.
    ///
    /// # Errors
    ///
    /// Returns `BackStackError::NotStarted` if `container` was never started.
    pub fn push(
        &mut self,
        host: &mut dyn Host,
        container: ContainerId,
        screen: Screen,
        tag: Option<&str>,
        options: Option<&AnimationSpec>,
    ) -> Result<(), BackStackError> {
        self.dispatch_completions(host);

        let reordering = self.config.reordering_allowed();
        let transition = options.map(AnimationSpec::transition).unwrap_or_default();
        let shared = options.map(AnimationSpec::shared_elements);

        let current =
            started(&mut self.stacks, container)?.current_screen(|c| host.find_screen(c))?;
        if let Some(current) = &current {
            self.discard_nested(host, container, current);
        }

        let state = started(&mut self.stacks, container)?;
        let container = state.container()?;
        if let Some(current) = current {
            let entry = state.push_entry(StackEntry::capture(&current, options));
            let attached = host
                .find_screen(container)
                .is_some_and(|live| live.same_instance(&current));

            if attached {
                trace!(%container, screen = %current.key(), "detaching current screen");
                let mut detach = Transaction::new()
                    .detach(current.clone())
                    .with_transition(transition)
                    .reordering_allowed(reordering);
                if let Some(shared) = shared {
                    detach = detach.with_shared_elements(shared);
                }
                let continuation = Continuation::capture_and_remove(container, entry, current);
                host.commit(detach.run_on_commit(continuation), CommitMode::Deferred);
            } else {
                debug!(%container, "current screen not attached yet, retiring it without state");
            }
        }

        let screen = screen.with_tag(tag.map(str::to_owned));
        debug!(
            %container,
            screen_type = %screen.screen_type(),
            depth = state.len(),
            "pushing screen"
        );
        let mut replace = Transaction::new()
            .replace(container, screen.clone())
            .with_transition(transition)
            .reordering_allowed(reordering)
            .set_primary(screen.clone());
        if let Some(shared) = shared {
            replace = replace.with_shared_elements(shared);
        }
        host.commit(replace, CommitMode::Deferred);
        state.set_current(screen);
        Ok(())
    }

    /// Pop the top screen.
    ///
    /// A started nested stack hosted by the current screen is popped
    /// first. Returns `false` if there was nothing to pop at any depth.
    ///
    /// # Errors
    ///
    /// Returns `BackStackError::NotStarted` if `container` was never started.
    pub fn pop(
        &mut self,
        host: &mut dyn Host,
        container: ContainerId,
        options: Option<&PopAnimationSpec>,
        mode: CommitMode,
    ) -> Result<bool, BackStackError> {
        self.settle(host, mode);
        self.pop_inner(host, container, options, mode, &mut BTreeSet::new())
    }

    /// Pop the top screen, applying it before returning.
    ///
    /// This is what a host's back-button handler should call.
    ///
    /// # Errors
    ///
    /// Returns `BackStackError::NotStarted` if `container` was never started.
    pub fn pop_immediate(
        &mut self,
        host: &mut dyn Host,
        container: ContainerId,
    ) -> Result<bool, BackStackError> {
        self.pop(host, container, None, CommitMode::Immediate)
    }

    /// Handle a back press by popping with the configured commit mode.
    ///
    /// Returns `false` when nothing was popped, in which case the host
    /// should run its own back behaviour.
    ///
    /// # Errors
    ///
    /// Returns `BackStackError::NotStarted` if `container` was never started.
    pub fn on_back_pressed(
        &mut self,
        host: &mut dyn Host,
        container: ContainerId,
    ) -> Result<bool, BackStackError> {
        let mode = self.config.back_press_mode();
        self.pop(host, container, None, mode)
    }

    /// Pop back to the nearest entry tagged `tag`.
    ///
    /// See [`plan_pop_to`](super::plan::plan_pop_to) for which screen is
    /// restored. Nested stacks are not consulted. Returns `false`, leaving
    /// the stack untouched, if no entry carries the tag.
    ///
    /// # Errors
    ///
    /// Returns `BackStackError::NotStarted` if `container` was never started.
    pub fn pop_to(
        &mut self,
        host: &mut dyn Host,
        container: ContainerId,
        tag: &str,
        inclusive: bool,
        mode: CommitMode,
    ) -> Result<bool, BackStackError> {
        self.settle(host, mode);

        let state = started(&mut self.stacks, container)?;
        let Some(plan) = plan_pop_to(state.entries(), tag, inclusive) else {
            debug!(%container, tag, "no entry with tag, nothing to pop");
            return Ok(false);
        };
        debug!(
            %container,
            tag,
            inclusive,
            removed = plan.removed(state.len()),
            "popping to tag"
        );
        let Some(entry) = state.split_off(plan.restore_index()).into_iter().next() else {
            return Ok(false);
        };
        self.restore_entry(host, container, entry, None, mode)?;
        Ok(true)
    }

    /// Pop up to, but not including, the entry tagged `tag`.
    ///
    /// # Errors
    ///
    /// Returns `BackStackError::NotStarted` if `container` was never started.
    pub fn pop_exclusive(
        &mut self,
        host: &mut dyn Host,
        container: ContainerId,
        tag: &str,
    ) -> Result<bool, BackStackError> {
        self.pop_to(host, container, tag, false, CommitMode::Deferred)
    }

    /// Pop up to and including the entry tagged `tag`.
    ///
    /// # Errors
    ///
    /// Returns `BackStackError::NotStarted` if `container` was never started.
    pub fn pop_inclusive(
        &mut self,
        host: &mut dyn Host,
        container: ContainerId,
        tag: &str,
    ) -> Result<bool, BackStackError> {
        self.pop_to(host, container, tag, true, CommitMode::Deferred)
    }

    /// [`pop_exclusive`](Self::pop_exclusive), applied before returning.
    ///
    /// # Errors
    ///
    /// Returns `BackStackError::NotStarted` if `container` was never started.
    pub fn pop_exclusive_immediate(
        &mut self,
        host: &mut dyn Host,
        container: ContainerId,
        tag: &str,
    ) -> Result<bool, BackStackError> {
        self.pop_to(host, container, tag, false, CommitMode::Immediate)
    }

    /// [`pop_inclusive`](Self::pop_inclusive), applied before returning.
    ///
    /// # Errors
    ///
    /// Returns `BackStackError::NotStarted` if `container` was never started.
    pub fn pop_inclusive_immediate(
        &mut self,
        host: &mut dyn Host,
        container: ContainerId,
        tag: &str,
    ) -> Result<bool, BackStackError> {
        self.pop_to(host, container, tag, true, CommitMode::Immediate)
    }

    /// Resume continuations the host has completed.
    ///
    /// For each detached screen: capture its state into its entry, if the
    /// entry is still on the stack, then queue its removal. The host event
    /// loop calls this after applying deferred work; every public
    /// operation also calls it first. Returns the number of continuations
    /// resumed.
    pub fn dispatch_completions(&mut self, host: &mut dyn Host) -> usize {
        let reordering = self.config.reordering_allowed();
        let completed = host.take_completed();
        let count = completed.len();

        for continuation in completed {
            let screen = continuation.screen().clone();
            match self.stacks.get_mut(&continuation.container()) {
                Some(state) => match state.entry_mut(continuation.entry()) {
                    Some(entry) => {
                        if let Some(saved) = host.save_state(&screen) {
                            trace!(
                                container = %continuation.container(),
                                bytes = saved.len(),
                                "captured state of retired screen"
                            );
                            entry.attach_saved_state(saved);
                        }
                    }
                    None => debug!(
                        container = %continuation.container(),
                        "entry popped before its screen was torn down, dropping state"
                    ),
                },
                None => debug!(
                    container = %continuation.container(),
                    "back-stack discarded before its screen was torn down"
                ),
            }
            host.commit(
                Transaction::new()
                    .remove(screen)
                    .reordering_allowed(reordering),
                CommitMode::Deferred,
            );
        }
        count
    }

    /// Whether `container` has been started.
    pub fn is_started(&self, container: ContainerId) -> bool {
        self.stacks.contains_key(&container)
    }

    /// Number of retired entries for `container`.
    pub fn depth(&self, container: ContainerId) -> usize {
        self.stacks.get(&container).map_or(0, StackState::len)
    }

    /// Retired entries for `container`, bottom to top.
    pub fn entries(&self, container: ContainerId) -> &[StackEntry] {
        self.stacks
            .get(&container)
            .map_or(&[], StackState::entries)
    }

    /// The screen recorded as current for `container`, without resolving.
    pub fn current_screen(&self, container: ContainerId) -> Option<&Screen> {
        self.stacks.get(&container)?.cached_current()
    }

    /// The held state for `container`.
    pub fn state(&self, container: ContainerId) -> Option<&StackState> {
        self.stacks.get(&container)
    }

    /// Drop the state of `container`, e.g. when the screen hosting it is
    /// destroyed for good.
    pub fn discard(&mut self, container: ContainerId) -> Option<StackState> {
        debug!(%container, "discarding back-stack");
        self.stacks.remove(&container)
    }

    /// Forget every cached current screen.
    ///
    /// Hosts that keep this `BackStack` across a recreation of their
    /// screens call this afterwards; each current screen is then resolved
    /// again from its live container.
    pub fn forget_current_screens(&mut self) {
        for state in self.stacks.values_mut() {
            state.clear_current();
        }
    }

    /// Write every stack.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn save(&self, writer: impl Write) -> Result<(), BackStackError> {
        let stacks = self
            .stacks
            .values()
            .map(StackState::to_persisted)
            .collect::<Result<Vec<_>, _>>()?;
        let registry = PersistedRegistry {
            kind: REGISTRY_KIND.to_string(),
            schema_version: SCHEMA_VERSION,
            stacks,
        };
        serde_json::to_writer(writer, &registry).map_err(StateError::from)?;
        Ok(())
    }

    /// Read stacks written by [`save`](Self::save).
    ///
    /// Current screens are not persisted; each is resolved from its live
    /// container on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or of the wrong kind or
    /// version.
    pub fn restore(reader: impl Read, config: Config) -> Result<Self, BackStackError> {
        let registry: PersistedRegistry =
            serde_json::from_reader(reader).map_err(StateError::from)?;
        if registry.kind != REGISTRY_KIND {
            return Err(StateError::InvalidKind {
                found: registry.kind,
                expected: REGISTRY_KIND.to_string(),
            }
            .into());
        }
        if registry.schema_version != SCHEMA_VERSION {
            return Err(StateError::UnsupportedVersion(registry.schema_version).into());
        }

        let mut back_stack = Self::new(config);
        for persisted in registry.stacks {
            back_stack.insert_state(StackState::from_persisted(persisted)?)?;
        }
        debug!(stacks = back_stack.stacks.len(), "restored back-stacks");
        Ok(back_stack)
    }

    /// Write the stack of one container.
    ///
    /// # Errors
    ///
    /// Returns `BackStackError::NotStarted` if `container` was never started.
    pub fn save_container(
        &self,
        container: ContainerId,
        writer: impl Write,
    ) -> Result<(), BackStackError> {
        let state = self
            .stacks
            .get(&container)
            .ok_or(BackStackError::NotStarted(container))?;
        state.persist(writer)?;
        Ok(())
    }

    /// Read one container's stack written by [`save_container`](Self::save_container),
    /// replacing any state held for that container.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob cannot be read.
    pub fn restore_container(&mut self, reader: impl Read) -> Result<ContainerId, BackStackError> {
        let state = StackState::restore(reader)?;
        self.insert_state(state)
    }

    fn insert_state(&mut self, state: StackState) -> Result<ContainerId, BackStackError> {
        let container = state.container()?;
        self.stacks.insert(container, state);
        Ok(container)
    }

    /// Bring deferred work up to date before a pop.
    ///
    /// Immediate pops apply queued host work first so that state captured
    /// for a just-retired screen is on its entry before the entry is read.
    fn settle(&mut self, host: &mut dyn Host, mode: CommitMode) {
        if mode == CommitMode::Immediate {
            host.execute_pending();
        }
        self.dispatch_completions(host);
    }

    /// Pop `container`, delegating to nested stacks first.
    ///
    /// `visited` holds the containers already on the delegation chain so a
    /// cyclic nesting reported by the host ends the walk.
    fn pop_inner(
        &mut self,
        host: &mut dyn Host,
        container: ContainerId,
        options: Option<&PopAnimationSpec>,
        mode: CommitMode,
        visited: &mut BTreeSet<ContainerId>,
    ) -> Result<bool, BackStackError> {
        visited.insert(container);
        if let Some(child) = self.nested_container(host, container, visited)? {
            if self.pop_inner(host, child, None, mode, visited)? {
                debug!(%container, %child, "popped nested back-stack");
                return Ok(true);
            }
        }

        let state = started(&mut self.stacks, container)?;
        let Some(entry) = state.pop_entry() else {
            debug!(%container, "back-stack empty, nothing to pop");
            return Ok(false);
        };
        self.restore_entry(host, container, entry, options, mode)?;
        Ok(true)
    }

    /// The started container hosted by the current screen of `container`.
    fn nested_container(
        &mut self,
        host: &mut dyn Host,
        container: ContainerId,
        visited: &BTreeSet<ContainerId>,
    ) -> Result<Option<ContainerId>, BackStackError> {
        let state = started(&mut self.stacks, container)?;
        let Some(current) = state.current_screen(|c| host.find_screen(c))? else {
            return Ok(None);
        };
        let child = host.hosted_container(&current);
        if let Some(child) = child.filter(|child| visited.contains(child)) {
            warn!(%container, %child, "nested back-stacks form a cycle, not delegating");
            return Ok(None);
        }
        Ok(child.filter(|child| self.stacks.contains_key(child)))
    }

    /// Drop the stacks nested under `screen`, which is leaving `container`.
    ///
    /// A nested container is torn down with the screen hosting it, so its
    /// history goes too. Walks down through the current screen of each
    /// nested stack.
    fn discard_nested(&mut self, host: &dyn Host, container: ContainerId, screen: &Screen) {
        let mut visited = BTreeSet::from([container]);
        let mut next = host.hosted_container(screen);
        while let Some(child) = next.filter(|child| visited.insert(*child)) {
            let Some(state) = self.stacks.remove(&child) else {
                break;
            };
            debug!(
                %container,
                %child,
                depth = state.len(),
                "discarding nested back-stack with its host screen"
            );
            next = state
                .cached_current()
                .cloned()
                .or_else(|| host.find_screen(child))
                .and_then(|current| host.hosted_container(&current));
        }
    }

    /// Show a fresh screen rebuilt from `entry`.
    fn restore_entry(
        &mut self,
        host: &mut dyn Host,
        container: ContainerId,
        entry: StackEntry,
        options: Option<&PopAnimationSpec>,
        mode: CommitMode,
    ) -> Result<(), BackStackError> {
        let reordering = self.config.reordering_allowed();
        let replaced =
            started(&mut self.stacks, container)?.current_screen(|c| host.find_screen(c))?;
        if let Some(replaced) = &replaced {
            self.discard_nested(host, container, replaced);
        }

        let screen = host
            .instantiate(entry.type_id(), entry.args())
            .with_tag(entry.tag().map(str::to_owned))
            .with_initial_state(entry.saved_state().cloned());

        debug!(
            %container,
            screen_type = %screen.screen_type(),
            restored_state = entry.saved_state().is_some(),
            ?mode,
            "popping to entry"
        );
        let mut replace = Transaction::new()
            .replace(container, screen.clone())
            .with_transition(entry.pop_transition())
            .reordering_allowed(reordering)
            .set_primary(screen.clone());
        if let Some(options) = options {
            replace = replace.with_shared_elements(options.shared_elements());
        }
        host.commit(replace, mode);
        started(&mut self.stacks, container)?.set_current(screen);

        if mode == CommitMode::Immediate {
            self.dispatch_completions(host);
        }
        Ok(())
    }
}

/// The state of a started container.
fn started(
    stacks: &mut BTreeMap<ContainerId, StackState>,
    container: ContainerId,
) -> Result<&mut StackState, BackStackError> {
    stacks
        .get_mut(&container)
        .ok_or(BackStackError::NotStarted(container))
}
