//! engine::plan
//!
//! Planning for tag-scoped pops.
//!
//! A tag-scoped pop can remove several levels at once. Planning is a pure
//! function of the entries so the controller can decide what to do before
//! touching any state.
//!
//! # Semantics
//!
//! The stack is scanned from the top for the nearest entry with the tag.
//! Everything from the top down to and including that entry is removed.
//! The screen restored into view is then:
//!
//! - exclusive: the matched entry itself
//! - inclusive: the entry directly below the matched one, which is removed
//!   as well; if the match was the bottom entry there is nothing below and
//!   the matched entry is restored instead
//!
//! # Example
//!
//! ```
//! use backstack::core::entry::StackEntry;
//! use backstack::core::types::ScreenType;
//! use backstack::engine::plan::plan_pop_to;
//!
//! let entry = |name: &str, tag: &str| {
//!     StackEntry::new(ScreenType::new(name).unwrap(), Some(tag.into()), None, Default::default())
//! };
//! let entries = vec![entry("A", "x"), entry("B", "y"), entry("C", "z")];
//!
//! let plan = plan_pop_to(&entries, "y", false).unwrap();
//! assert_eq!(plan.restore_index(), 1); // B comes back, [A] stays
//!
//! let plan = plan_pop_to(&entries, "y", true).unwrap();
//! assert_eq!(plan.restore_index(), 0); // A comes back, nothing stays
//! ```

use crate::core::entry::StackEntry;

/// Outcome of planning a tag-scoped pop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopPlan {
    matched: usize,
    restore: usize,
}

impl PopPlan {
    /// Index of the nearest entry carrying the tag.
    pub fn matched_index(&self) -> usize {
        self.matched
    }

    /// Index of the entry to restore. The stack is truncated to this length.
    pub fn restore_index(&self) -> usize {
        self.restore
    }

    /// Number of entries removed from a stack of `len` entries, the
    /// restored one included.
    pub fn removed(&self, len: usize) -> usize {
        len.saturating_sub(self.restore)
    }
}

/// Plan a pop to the nearest entry tagged `tag`.
///
/// Returns `None` if no entry carries the tag.
pub fn plan_pop_to(entries: &[StackEntry], tag: &str, inclusive: bool) -> Option<PopPlan> {
    let matched = entries.iter().rposition(|entry| entry.has_tag(tag))?;
    let restore = if inclusive && matched > 0 {
        matched - 1
    } else {
        matched
    };
    Some(PopPlan { matched, restore })
}
