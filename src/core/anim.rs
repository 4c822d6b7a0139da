//! core::anim
//!
//! Transition options for push and pop operations.
//!
//! These are plain option bags. The back-stack forwards them to the host
//! transaction unchanged, except that the pop-specific transitions of an
//! [`AnimationSpec`] are stored on the stack entry and only used when that
//! entry is popped back into view.
//!
//! # Example
//!
//! ```
//! use backstack::core::anim::{AnimationSpec, PopAnimationSpec};
//! use backstack::core::types::{TransitionId, ViewRef};
//!
//! let push = AnimationSpec::new()
//!     .with_transitions(TransitionId::new(1), TransitionId::new(2))
//!     .with_pop_transitions(TransitionId::new(3), TransitionId::new(4))
//!     .with_shared_element(ViewRef::new(10), "hero");
//! assert_eq!(push.pop_transition().enter, TransitionId::new(3));
//!
//! let pop = PopAnimationSpec::new().with_shared_element(ViewRef::new(11), "hero");
//! assert_eq!(pop.shared_elements().len(), 1);
//! ```

use serde::{Deserialize, Serialize};

use crate::core::types::{TransitionId, ViewRef};

/// An enter/exit transition pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transition {
    /// Transition for the screen coming into view.
    pub enter: TransitionId,
    /// Transition for the screen leaving view.
    pub exit: TransitionId,
}

impl Transition {
    /// Build a transition pair.
    pub const fn new(enter: TransitionId, exit: TransitionId) -> Self {
        Self { enter, exit }
    }

    /// Whether neither side has a custom transition.
    pub const fn is_none(&self) -> bool {
        self.enter.is_none() && self.exit.is_none()
    }
}

/// Ordered view-to-name correspondences for shared-element transitions.
///
/// Keyed by view identity: adding a view that is already present replaces
/// its name in place and keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedElements {
    pairs: Vec<(ViewRef, String)>,
}

impl SharedElements {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `view` to `name`, overwriting any previous name for `view`.
    pub fn insert(&mut self, view: ViewRef, name: impl Into<String>) {
        let name = name.into();
        match self.pairs.iter_mut().find(|(v, _)| *v == view) {
            Some((_, existing)) => *existing = name,
            None => self.pairs.push((view, name)),
        }
    }

    /// The name mapped to `view`, if any.
    pub fn get(&self, view: ViewRef) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(v, _)| *v == view)
            .map(|(_, name)| name.as_str())
    }

    /// Iterate over the pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (ViewRef, &str)> {
        self.pairs.iter().map(|(view, name)| (*view, name.as_str()))
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether there are no pairs.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Add every pair of `other`, with the same overwrite rule as [`insert`](Self::insert).
    pub fn extend_from(&mut self, other: &SharedElements) {
        for (view, name) in other.iter() {
            self.insert(view, name);
        }
    }
}

/// Options for a push.
///
/// `transition` runs when the new screen replaces the current one.
/// `pop_transition` is remembered on the stack entry of the screen being
/// pushed off and runs when that entry is later popped back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnimationSpec {
    transition: Transition,
    pop_transition: Transition,
    shared_elements: SharedElements,
}

impl AnimationSpec {
    /// Options with no transitions and no shared elements.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the enter/exit transitions for the push itself.
    ///
    /// These are not replayed when popping.
    pub fn with_transitions(mut self, enter: TransitionId, exit: TransitionId) -> Self {
        self.transition = Transition::new(enter, exit);
        self
    }

    /// Set the transitions to run when the pushed-off screen is popped back.
    pub fn with_pop_transitions(mut self, pop_enter: TransitionId, pop_exit: TransitionId) -> Self {
        self.pop_transition = Transition::new(pop_enter, pop_exit);
        self
    }

    /// Map a view of the outgoing screen to a view of the incoming one.
    pub fn with_shared_element(mut self, view: ViewRef, name: impl Into<String>) -> Self {
        self.shared_elements.insert(view, name);
        self
    }

    /// Transitions for the push.
    pub fn transition(&self) -> Transition {
        self.transition
    }

    /// Transitions recorded for the later pop.
    pub fn pop_transition(&self) -> Transition {
        self.pop_transition
    }

    /// Shared-element correspondences.
    pub fn shared_elements(&self) -> &SharedElements {
        &self.shared_elements
    }
}

/// Options for a pop.
///
/// A pop is issued to the host as a replace, so the host runs the
/// shared-element transition on the screen that comes back into view.
/// These correspondences are supplied at pop time because the views of the
/// current screen only exist then.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopAnimationSpec {
    shared_elements: SharedElements,
}

impl PopAnimationSpec {
    /// Options with no shared elements.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a view of the outgoing screen to a view of the restored one.
    pub fn with_shared_element(mut self, view: ViewRef, name: impl Into<String>) -> Self {
        self.shared_elements.insert(view, name);
        self
    }

    /// Shared-element correspondences.
    pub fn shared_elements(&self) -> &SharedElements {
        &self.shared_elements
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_view_overwrites_name_in_place() {
        let mut elements = SharedElements::new();
        elements.insert(ViewRef::new(1), "a");
        elements.insert(ViewRef::new(2), "b");
        elements.insert(ViewRef::new(1), "c");

        let pairs: Vec<_> = elements.iter().collect();
        assert_eq!(pairs, vec![(ViewRef::new(1), "c"), (ViewRef::new(2), "b")]);
    }

    #[test]
    fn distinct_views_with_same_name_are_kept() {
        let spec = PopAnimationSpec::new()
            .with_shared_element(ViewRef::new(1), "hero")
            .with_shared_element(ViewRef::new(2), "hero");
        assert_eq!(spec.shared_elements().len(), 2);
    }

    #[test]
    fn default_spec_has_no_transitions() {
        let spec = AnimationSpec::new();
        assert!(spec.transition().is_none());
        assert!(spec.pop_transition().is_none());
        assert!(spec.shared_elements().is_empty());
    }

    #[test]
    fn push_and_pop_transitions_are_independent() {
        let spec = AnimationSpec::new()
            .with_transitions(TransitionId::new(1), TransitionId::new(2))
            .with_pop_transitions(TransitionId::new(3), TransitionId::new(4));
        assert_eq!(
            spec.transition(),
            Transition::new(TransitionId::new(1), TransitionId::new(2))
        );
        assert_eq!(
            spec.pop_transition(),
            Transition::new(TransitionId::new(3), TransitionId::new(4))
        );
    }

    #[test]
    fn extend_from_applies_overwrite_rule() {
        let mut base = SharedElements::new();
        base.insert(ViewRef::new(1), "old");
        let mut extra = SharedElements::new();
        extra.insert(ViewRef::new(1), "new");
        extra.insert(ViewRef::new(3), "other");

        base.extend_from(&extra);
        assert_eq!(base.get(ViewRef::new(1)), Some("new"));
        assert_eq!(base.len(), 2);
    }
}
