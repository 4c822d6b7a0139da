//! core::entry
//!
//! Stack entries: screens that were pushed out of view.
//!
//! # Lifecycle
//!
//! 1. Built synchronously at push time from the outgoing screen, with no
//!    saved state.
//! 2. Once the host has detached the outgoing screen, its captured state
//!    is attached exactly once.
//! 3. Consumed when popped: a fresh screen is built from the type and
//!    arguments and primed with the saved state.
//!
//! # Persisted Fields
//!
//! `type_id`, `tag`, `args`, `pop_enter`, `pop_exit`, `saved_state`, in
//! that order. The [`EntryId`] is process-local and never persisted.

use serde::{Deserialize, Serialize};

use crate::core::anim::{AnimationSpec, Transition};
use crate::core::screen::Screen;
use crate::core::types::{Blob, ScreenType, TransitionId};

/// Process-local handle to an entry inside one [`StackState`](crate::core::state::StackState).
///
/// Used by pending continuations to find their entry again, since the
/// entry may have been popped by the time the host reports completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(u64);

impl EntryId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// A screen removed from view, retained for later reconstruction.
///
/// Equality compares the persisted fields only; the [`EntryId`] is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StackEntry {
    #[serde(skip)]
    id: EntryId,
    type_id: ScreenType,
    tag: Option<String>,
    args: Option<Blob>,
    pop_enter: TransitionId,
    pop_exit: TransitionId,
    saved_state: Option<Blob>,
}

impl StackEntry {
    /// Build an entry from its parts, with no saved state.
    pub fn new(
        type_id: ScreenType,
        tag: Option<String>,
        args: Option<Blob>,
        pop_transition: Transition,
    ) -> Self {
        Self {
            id: EntryId::default(),
            type_id,
            tag,
            args,
            pop_enter: pop_transition.enter,
            pop_exit: pop_transition.exit,
            saved_state: None,
        }
    }

    /// Capture an entry from the screen being pushed out of view.
    ///
    /// The pop transition comes from the options of the push that retires
    /// the screen, not from the push that originally showed it.
    pub fn capture(screen: &Screen, options: Option<&AnimationSpec>) -> Self {
        Self::new(
            screen.screen_type().clone(),
            screen.tag().map(str::to_owned),
            screen.args().cloned(),
            options.map(AnimationSpec::pop_transition).unwrap_or_default(),
        )
    }

    /// Process-local id, assigned when pushed onto a stack.
    pub fn id(&self) -> EntryId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: EntryId) {
        self.id = id;
    }

    /// Type identifier of the retired screen.
    pub fn type_id(&self) -> &ScreenType {
        &self.type_id
    }

    /// Tag the retired screen was installed under.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Construction arguments of the retired screen.
    pub fn args(&self) -> Option<&Blob> {
        self.args.as_ref()
    }

    /// Transitions to use when this entry is popped back into view.
    pub fn pop_transition(&self) -> Transition {
        Transition::new(self.pop_enter, self.pop_exit)
    }

    /// Captured reconstruction state, once the screen has been torn down.
    pub fn saved_state(&self) -> Option<&Blob> {
        self.saved_state.as_ref()
    }

    /// Whether this entry's tag equals `tag`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag.as_deref() == Some(tag)
    }

    /// Attach captured state.
    ///
    /// State is attached at most once; returns `false` and leaves the
    /// entry unchanged if state is already present.
    pub fn attach_saved_state(&mut self, state: Blob) -> bool {
        if self.saved_state.is_some() {
            return false;
        }
        self.saved_state = Some(state);
        true
    }
}

impl PartialEq for StackEntry {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
            && self.tag == other.tag
            && self.args == other.args
            && self.pop_enter == other.pop_enter
            && self.pop_exit == other.pop_exit
            && self.saved_state == other.saved_state
    }
}

impl Eq for StackEntry {}
