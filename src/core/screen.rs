//! core::screen
//!
//! Handle to a screen instance.
//!
//! A [`Screen`] is what callers push and what the host attaches to a
//! container. It carries everything needed to rebuild an equivalent
//! instance later: the type identifier, the construction arguments and
//! the tag it was installed under. When a screen is rebuilt from a stack
//! entry it also carries the captured state to restore from.

use crate::core::types::{Blob, ScreenKey, ScreenType};

/// A screen instance.
///
/// Cloning a `Screen` clones the handle, not the instance: both clones
/// share the same [`ScreenKey`] and compare as the same instance via
/// [`Screen::same_instance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    key: ScreenKey,
    screen_type: ScreenType,
    args: Option<Blob>,
    tag: Option<String>,
    initial_state: Option<Blob>,
}

impl Screen {
    /// Create a new screen instance with a fresh identity.
    pub fn new(screen_type: ScreenType, args: Option<Blob>) -> Self {
        Self {
            key: ScreenKey::new(),
            screen_type,
            args,
            tag: None,
            initial_state: None,
        }
    }

    /// Identity of this instance.
    pub fn key(&self) -> ScreenKey {
        self.key
    }

    /// The type identifier used to rebuild this screen.
    pub fn screen_type(&self) -> &ScreenType {
        &self.screen_type
    }

    /// Construction arguments.
    pub fn args(&self) -> Option<&Blob> {
        self.args.as_ref()
    }

    /// The tag this screen was installed under, if any.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// State this instance should be restored from when it is attached.
    pub fn initial_state(&self) -> Option<&Blob> {
        self.initial_state.as_ref()
    }

    /// Set the tag the screen is installed under.
    pub fn with_tag(mut self, tag: Option<String>) -> Self {
        self.tag = tag;
        self
    }

    /// Prime the instance with previously captured state.
    ///
    /// Must be called before the screen is attached to a container.
    pub fn with_initial_state(mut self, state: Option<Blob>) -> Self {
        self.initial_state = state;
        self
    }

    /// Whether `other` is a handle to this very instance.
    pub fn same_instance(&self, other: &Screen) -> bool {
        self.key == other.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail() -> Screen {
        Screen::new(
            ScreenType::new("app.Detail").unwrap(),
            Some(Blob::from("id=1")),
        )
    }

    #[test]
    fn clones_share_identity() {
        let screen = detail();
        let handle = screen.clone().with_tag(Some("detail".into()));
        assert!(screen.same_instance(&handle));
        assert_eq!(handle.tag(), Some("detail"));
    }

    #[test]
    fn new_instances_are_distinct() {
        assert!(!detail().same_instance(&detail()));
    }

    #[test]
    fn initial_state_starts_empty() {
        let screen = detail();
        assert!(screen.initial_state().is_none());
        let primed = screen.with_initial_state(Some(Blob::from("scroll=3")));
        assert_eq!(primed.initial_state(), Some(&Blob::from("scroll=3")));
    }
}
