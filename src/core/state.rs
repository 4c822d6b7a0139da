//! core::state
//!
//! Navigation history for one container.
//!
//! # Contents
//!
//! - The container id, set once when the stack is started
//! - The ordered entries, bottom to top
//! - A cached handle to the screen currently shown in the container
//!
//! # Persistence
//!
//! [`StackState::persist`] and [`StackState::restore`] write and read a
//! self-describing JSON document with `kind` and `schema_version`. Reading
//! streams from any [`std::io::Read`]; the whole blob never has to be in
//! memory as a string. The current-screen handle is not persisted: after a
//! restore it is resolved again from the live container.
//!
//! # Example
//!
//! ```
//! use backstack::core::entry::StackEntry;
//! use backstack::core::state::StackState;
//! use backstack::core::types::{ContainerId, ScreenType};
//!
//! let mut state = StackState::new();
//! state.set_container(ContainerId::new(1)).unwrap();
//! state.push_entry(StackEntry::new(
//!     ScreenType::new("app.Home").unwrap(),
//!     None,
//!     None,
//!     Default::default(),
//! ));
//!
//! let mut blob = Vec::new();
//! state.persist(&mut blob).unwrap();
//! let restored = StackState::restore(blob.as_slice()).unwrap();
//! assert_eq!(restored.entries(), state.entries());
//! ```

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::entry::{EntryId, StackEntry};
use crate::core::screen::Screen;
use crate::core::types::ContainerId;

/// The kind identifier for a persisted stack.
pub const STATE_KIND: &str = "backstack.stack-state";

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Errors from stack state operations.
#[derive(Debug, Error)]
pub enum StateError {
    /// The stack was used before its container was set.
    #[error("missing container id: start the back-stack with a container and initial screen first")]
    MissingContainer,

    /// The container was already set to a different id.
    #[error("container already set to {current}, cannot change it to {requested}")]
    ContainerMismatch {
        current: ContainerId,
        requested: ContainerId,
    },

    #[error("invalid kind '{found}', expected '{expected}'")]
    InvalidKind { found: String, expected: String },

    #[error("unsupported schema version {0}, supported: {SCHEMA_VERSION}")]
    UnsupportedVersion(u32),

    #[error("stack state json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persisted form of one stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PersistedStack {
    kind: String,
    schema_version: u32,
    container_id: ContainerId,
    entries: Vec<StackEntry>,
}

/// Navigation history for one container.
#[derive(Debug, Clone, Default)]
pub struct StackState {
    container: Option<ContainerId>,
    entries: Vec<StackEntry>,
    current: Option<Screen>,
    next_entry_id: u64,
}

impl StackState {
    /// An empty, unstarted state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the container.
    ///
    /// The container is fixed once set. Setting the same id again is
    /// accepted so a host can re-run its start-up path.
    ///
    /// # Errors
    ///
    /// Returns `StateError::ContainerMismatch` if a different id is already set.
    pub fn set_container(&mut self, container: ContainerId) -> Result<(), StateError> {
        match self.container {
            Some(current) if current != container => Err(StateError::ContainerMismatch {
                current,
                requested: container,
            }),
            _ => {
                self.container = Some(container);
                Ok(())
            }
        }
    }

    /// The container id.
    ///
    /// # Errors
    ///
    /// Returns `StateError::MissingContainer` if the stack was never started.
    pub fn container(&self) -> Result<ContainerId, StateError> {
        self.container.ok_or(StateError::MissingContainer)
    }

    /// Whether the container has been set.
    pub fn has_container(&self) -> bool {
        self.container.is_some()
    }

    /// The current screen, resolving it through `lookup` if not cached.
    ///
    /// `lookup` is asked for the screen currently attached to the
    /// container. A resolved screen is cached.
    ///
    /// # Errors
    ///
    /// Returns `StateError::MissingContainer` if the stack was never started.
    pub fn current_screen(
        &mut self,
        lookup: impl FnOnce(ContainerId) -> Option<Screen>,
    ) -> Result<Option<Screen>, StateError> {
        let container = self.container()?;
        if self.current.is_none() {
            self.current = lookup(container);
        }
        Ok(self.current.clone())
    }

    /// The cached current screen, without resolving.
    pub fn cached_current(&self) -> Option<&Screen> {
        self.current.as_ref()
    }

    /// Record the screen now shown in the container.
    pub fn set_current(&mut self, screen: Screen) {
        self.current = Some(screen);
    }

    /// Forget the cached current screen so the next access re-resolves it.
    pub fn clear_current(&mut self) {
        self.current = None;
    }

    /// Append an entry and return its id.
    pub fn push_entry(&mut self, mut entry: StackEntry) -> EntryId {
        let id = EntryId::new(self.next_entry_id);
        self.next_entry_id += 1;
        entry.set_id(id);
        self.entries.push(entry);
        id
    }

    /// Remove and return the top entry.
    pub fn pop_entry(&mut self) -> Option<StackEntry> {
        self.entries.pop()
    }

    /// Remove every entry from `index` upward, returning them bottom to top.
    pub fn split_off(&mut self, index: usize) -> Vec<StackEntry> {
        if index >= self.entries.len() {
            return Vec::new();
        }
        self.entries.split_off(index)
    }

    /// Entries, bottom to top.
    pub fn entries(&self) -> &[StackEntry] {
        &self.entries
    }

    /// Look up a live entry by id.
    pub fn entry_mut(&mut self, id: EntryId) -> Option<&mut StackEntry> {
        self.entries.iter_mut().find(|entry| entry.id() == id)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the container id and entries as JSON.
    ///
    /// # Errors
    ///
    /// Returns `StateError::MissingContainer` if the stack was never
    /// started, or `StateError::Json` if writing fails.
    pub fn persist(&self, writer: impl Write) -> Result<(), StateError> {
        serde_json::to_writer(writer, &self.to_persisted()?)?;
        Ok(())
    }

    /// Read a state previously written by [`persist`](Self::persist).
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed, the `kind` does not
    /// match [`STATE_KIND`], or the schema version is unsupported.
    pub fn restore(reader: impl Read) -> Result<Self, StateError> {
        let persisted: PersistedStack = serde_json::from_reader(reader)?;
        Self::from_persisted(persisted)
    }

    pub(crate) fn to_persisted(&self) -> Result<PersistedStack, StateError> {
        Ok(PersistedStack {
            kind: STATE_KIND.to_string(),
            schema_version: SCHEMA_VERSION,
            container_id: self.container()?,
            entries: self.entries.clone(),
        })
    }

    pub(crate) fn from_persisted(persisted: PersistedStack) -> Result<Self, StateError> {
        if persisted.kind != STATE_KIND {
            return Err(StateError::InvalidKind {
                found: persisted.kind,
                expected: STATE_KIND.to_string(),
            });
        }
        if persisted.schema_version != SCHEMA_VERSION {
            return Err(StateError::UnsupportedVersion(persisted.schema_version));
        }

        let mut state = Self::new();
        state.set_container(persisted.container_id)?;
        for entry in persisted.entries {
            state.push_entry(entry);
        }
        Ok(state)
    }
}
