//! Integration tests for the back-stack controller.
//!
//! These tests drive `BackStack` against `MockHost` through full
//! navigation scenarios: start, push, pop, configuration changes,
//! tag-scoped pops, back presses and nested stacks.

use backstack::core::config::Config;
use backstack::core::screen::Screen;
use backstack::core::types::{Blob, ContainerId, ScreenType};
use backstack::engine::{BackStack, BackStackError};
use backstack::host::mock::{LifecycleEvent, MockHost};
use backstack::host::{CommitMode, Continuation, Host, Transaction};

const ROOT: ContainerId = ContainerId::new(1);
const CHILD: ContainerId = ContainerId::new(2);

// =============================================================================
// Test Helpers
// =============================================================================

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn page(name: &str) -> Screen {
    Screen::new(ScreenType::new("Page").unwrap(), Some(Blob::from(name)))
}

fn state(name: &str) -> Blob {
    Blob::from(format!("{name}_state").as_str())
}

/// A mock host and a back-stack driven through it.
struct Harness {
    host: MockHost,
    stack: BackStack,
}

impl Harness {
    fn new() -> Self {
        init_logging();
        Self {
            host: MockHost::new(),
            stack: BackStack::default(),
        }
    }

    fn with_host(host: MockHost) -> Self {
        init_logging();
        Self {
            host,
            stack: BackStack::default(),
        }
    }

    /// Apply queued work and resume continuations until the host is idle.
    fn settle(&mut self) {
        loop {
            self.host.execute_pending();
            let resumed = self.stack.dispatch_completions(&mut self.host);
            if resumed == 0 && self.host.pending_len() == 0 {
                break;
            }
        }
    }

    fn start(&mut self, container: ContainerId, name: &str, tag: Option<&str>) {
        assert!(self
            .stack
            .start_with(&mut self.host, container, page(name), tag)
            .unwrap());
        self.settle();
    }

    fn push(&mut self, container: ContainerId, name: &str, tag: Option<&str>) {
        self.stack
            .push(&mut self.host, container, page(name), tag, None)
            .unwrap();
        self.settle();
    }

    fn shown(&self, container: ContainerId) -> Screen {
        self.host
            .find_screen(container)
            .expect("container shows a screen")
    }

    fn shown_name(&self, container: ContainerId) -> String {
        let shown = self.shown(container);
        String::from_utf8(shown.args().unwrap().as_bytes().to_vec()).unwrap()
    }
}

// =============================================================================
// Start and Push
// =============================================================================

#[test]
fn start_shows_initial_screen_once() {
    let mut h = Harness::new();
    h.start(ROOT, "first", None);
    assert_eq!(h.shown_name(ROOT), "first");

    assert!(!h
        .stack
        .start_with(&mut h.host, ROOT, page("again"), None)
        .unwrap());
    h.settle();
    assert_eq!(h.shown_name(ROOT), "first");
    assert_eq!(h.host.live_count(), 1);
}

#[test]
fn push_retires_previous_screen_after_saving_state() {
    let mut h = Harness::new();
    h.start(ROOT, "first", None);
    let first = h.shown(ROOT);

    h.push(ROOT, "second", None);

    assert_eq!(h.shown_name(ROOT), "second");
    assert_eq!(h.host.live_count(), 1);
    assert_eq!(
        h.host.events(&first),
        &[
            LifecycleEvent::Created { saved_state: None },
            LifecycleEvent::Started,
            LifecycleEvent::Stopped,
            LifecycleEvent::StateSaved {
                state: state("first")
            },
            LifecycleEvent::Destroyed,
        ]
    );
    assert_eq!(h.stack.entries(ROOT)[0].saved_state(), Some(&state("first")));
}

#[test]
fn push_right_after_start_does_not_crash() {
    let mut h = Harness::new();
    h.stack
        .start_with(&mut h.host, ROOT, page("first"), None)
        .unwrap();
    h.stack
        .push(&mut h.host, ROOT, page("second"), None, None)
        .unwrap();
    h.settle();

    assert_eq!(h.shown_name(ROOT), "second");
    assert_eq!(h.stack.depth(ROOT), 1);
    assert_eq!(h.host.live_count(), 1);
}

#[test]
fn only_visible_screen_stays_alive() {
    let mut h = Harness::new();
    h.start(ROOT, "s0", None);
    for i in 1..10 {
        h.push(ROOT, &format!("s{i}"), None);
        assert_eq!(h.host.live_count(), 1);
    }
    assert_eq!(h.stack.depth(ROOT), 9);
}

// =============================================================================
// Pop
// =============================================================================

#[test]
fn pop_rebuilds_screen_from_saved_state() {
    let mut h = Harness::new();
    h.start(ROOT, "first", None);
    h.push(ROOT, "second", None);

    assert!(h.stack.pop_immediate(&mut h.host, ROOT).unwrap());

    let shown = h.shown(ROOT);
    assert_eq!(h.shown_name(ROOT), "first");
    assert_eq!(
        h.host.events(&shown),
        &[
            LifecycleEvent::Created {
                saved_state: Some(state("first"))
            },
            LifecycleEvent::Started,
        ]
    );
    assert_eq!(h.stack.depth(ROOT), 0);
}

#[test]
fn pop_on_empty_stack_returns_false() {
    let mut h = Harness::new();
    h.start(ROOT, "first", None);
    assert!(!h.stack.pop_immediate(&mut h.host, ROOT).unwrap());
    assert_eq!(h.shown_name(ROOT), "first");
}

#[test]
fn pop_after_configuration_change_with_restored_stack() {
    let mut h = Harness::new();
    h.start(ROOT, "first", None);
    h.push(ROOT, "second", None);

    let mut blob = Vec::new();
    h.stack.save(&mut blob).unwrap();
    h.host.recreate();
    h.stack = BackStack::restore(blob.as_slice(), Config::default()).unwrap();

    // The host re-runs its start-up path; the container is occupied.
    assert!(!h
        .stack
        .start_with(&mut h.host, ROOT, page("first"), None)
        .unwrap());

    assert!(h.stack.pop_immediate(&mut h.host, ROOT).unwrap());
    assert_eq!(h.shown_name(ROOT), "first");
    assert_eq!(h.shown(ROOT).initial_state(), Some(&state("first")));
    h.settle();
    assert_eq!(h.host.live_count(), 1);
}

#[test]
fn push_after_configuration_change_captures_recreated_screen() {
    let mut h = Harness::new();
    h.start(ROOT, "first", None);
    h.push(ROOT, "second", None);

    h.host.recreate();
    h.stack.forget_current_screens();
    h.push(ROOT, "third", None);

    assert_eq!(h.stack.depth(ROOT), 2);
    assert_eq!(h.stack.entries(ROOT)[1].saved_state(), Some(&state("second")));
    assert_eq!(h.host.live_count(), 1);

    assert!(h.stack.pop_immediate(&mut h.host, ROOT).unwrap());
    assert_eq!(h.shown_name(ROOT), "second");
}

// =============================================================================
// Tag-scoped Pops
// =============================================================================

fn tagged() -> Harness {
    let mut h = Harness::new();
    h.start(ROOT, "first", Some("first_tag"));
    h.push(ROOT, "second", Some("second_tag"));
    h.push(ROOT, "third", None);
    h
}

#[test]
fn pop_inclusive_goes_below_tagged_entry() {
    let mut h = tagged();
    assert!(h
        .stack
        .pop_inclusive_immediate(&mut h.host, ROOT, "second_tag")
        .unwrap());

    assert_eq!(h.shown_name(ROOT), "first");
    assert_eq!(h.shown(ROOT).tag(), Some("first_tag"));
    assert_eq!(h.shown(ROOT).initial_state(), Some(&state("first")));
    assert_eq!(h.stack.depth(ROOT), 0);
}

#[test]
fn pop_exclusive_stops_at_tagged_entry() {
    let mut h = tagged();
    assert!(h
        .stack
        .pop_exclusive_immediate(&mut h.host, ROOT, "second_tag")
        .unwrap());

    assert_eq!(h.shown_name(ROOT), "second");
    assert_eq!(h.shown(ROOT).tag(), Some("second_tag"));
    assert_eq!(h.shown(ROOT).initial_state(), Some(&state("second")));
    assert_eq!(h.stack.depth(ROOT), 1);
}

#[test]
fn pop_to_missing_tag_changes_nothing() {
    let mut h = tagged();
    let before = h.stack.entries(ROOT).to_vec();
    let shown = h.shown(ROOT);

    assert!(!h
        .stack
        .pop_to(&mut h.host, ROOT, "absent", true, CommitMode::Immediate)
        .unwrap());
    h.settle();

    assert_eq!(h.stack.entries(ROOT), before.as_slice());
    assert!(h.shown(ROOT).same_instance(&shown));
}

// =============================================================================
// Back Press
// =============================================================================

#[test]
fn back_press_pops_until_empty() {
    let mut h = Harness::new();
    h.start(ROOT, "first", None);
    h.push(ROOT, "second", None);
    h.push(ROOT, "third", None);

    assert!(h.stack.on_back_pressed(&mut h.host, ROOT).unwrap());
    assert_eq!(h.shown_name(ROOT), "second");
    assert!(h.stack.on_back_pressed(&mut h.host, ROOT).unwrap());
    assert_eq!(h.shown_name(ROOT), "first");
    assert!(!h.stack.on_back_pressed(&mut h.host, ROOT).unwrap());
}

// =============================================================================
// Nested Stacks
// =============================================================================

#[test]
fn pop_drains_nested_stack_before_outer() {
    let shell = ScreenType::new("Shell").unwrap();
    let mut h = Harness::with_host(MockHost::new().with_hosted_container(shell.clone(), CHILD));

    h.start(ROOT, "home", None);
    h.stack
        .push(&mut h.host, ROOT, Screen::new(shell, None), None, None)
        .unwrap();
    h.settle();
    let outer = h.shown(ROOT);
    h.start(CHILD, "inner-a", None);
    h.push(CHILD, "inner-b", None);

    assert!(h.stack.pop_immediate(&mut h.host, ROOT).unwrap());
    assert_eq!(h.shown_name(CHILD), "inner-a");
    assert!(h.shown(ROOT).same_instance(&outer));
    assert_eq!(h.stack.depth(ROOT), 1);

    assert!(h.stack.pop_immediate(&mut h.host, ROOT).unwrap());
    assert_eq!(h.shown_name(ROOT), "home");
    assert!(h.host.find_screen(CHILD).is_none());
    assert_eq!(h.stack.depth(ROOT), 0);
}

#[test]
fn tag_pop_ignores_nested_stack() {
    let shell = ScreenType::new("Shell").unwrap();
    let mut h = Harness::with_host(MockHost::new().with_hosted_container(shell.clone(), CHILD));

    h.start(ROOT, "home", Some("home"));
    h.stack
        .push(&mut h.host, ROOT, Screen::new(shell, None), None, None)
        .unwrap();
    h.settle();
    h.start(CHILD, "inner-a", None);
    h.push(CHILD, "inner-b", None);

    assert!(h
        .stack
        .pop_exclusive_immediate(&mut h.host, ROOT, "home")
        .unwrap());
    assert_eq!(h.shown_name(ROOT), "home");
    // The nested stack went with the shell it lived in.
    assert!(!h.stack.is_started(CHILD));
}

#[test]
fn nested_stack_starts_fresh_after_host_screen_returns() {
    let shell = ScreenType::new("Shell").unwrap();
    let mut h = Harness::with_host(MockHost::new().with_hosted_container(shell.clone(), CHILD));

    h.start(ROOT, "home", None);
    h.stack
        .push(&mut h.host, ROOT, Screen::new(shell, None), None, None)
        .unwrap();
    h.settle();
    h.start(CHILD, "a", None);
    h.push(CHILD, "b", None);

    h.push(ROOT, "other", None);
    assert!(!h.stack.is_started(CHILD));

    assert!(h.stack.pop_immediate(&mut h.host, ROOT).unwrap());
    assert_eq!(h.shown(ROOT).screen_type().as_str(), "Shell");

    // The rebuilt shell starts its nested container again.
    h.start(CHILD, "a", None);
    assert_eq!(h.stack.depth(CHILD), 0);
    assert_eq!(h.shown_name(CHILD), "a");

    assert!(h.stack.on_back_pressed(&mut h.host, ROOT).unwrap());
    assert_eq!(h.shown_name(ROOT), "home");
    assert!(h.host.find_screen(CHILD).is_none());
    assert!(!h.stack.is_started(CHILD));
}

// =============================================================================
// Errors and Persistence
// =============================================================================

#[test]
fn driving_unstarted_container_is_a_configuration_error() {
    let mut h = Harness::new();
    let push = h
        .stack
        .push(&mut h.host, ROOT, page("first"), None, None)
        .unwrap_err();
    let pop = h.stack.pop_immediate(&mut h.host, ROOT).unwrap_err();

    assert!(matches!(push, BackStackError::NotStarted(c) if c == ROOT));
    assert!(push.is_configuration_error());
    assert!(pop.is_configuration_error());
    assert!(push.to_string().contains("start_with"));
}

#[test]
fn registry_roundtrip_keeps_every_container() {
    let mut h = Harness::new();
    h.start(ROOT, "a", Some("a"));
    h.push(ROOT, "b", None);
    h.start(CHILD, "x", None);
    h.push(CHILD, "y", Some("y"));
    h.push(CHILD, "z", None);

    let mut blob = Vec::new();
    h.stack.save(&mut blob).unwrap();
    let restored = BackStack::restore(blob.as_slice(), Config::default()).unwrap();

    assert_eq!(restored.entries(ROOT), h.stack.entries(ROOT));
    assert_eq!(restored.entries(CHILD), h.stack.entries(CHILD));
    assert_eq!(restored.depth(CHILD), 2);
}

// =============================================================================
// Custom Hosts
// =============================================================================

/// Host that records every screen it is asked to build.
struct RecordingHost {
    inner: MockHost,
    built: Vec<ScreenType>,
}

impl Host for RecordingHost {
    fn commit(&mut self, transaction: Transaction, mode: CommitMode) {
        self.inner.commit(transaction, mode);
    }

    fn execute_pending(&mut self) {
        self.inner.execute_pending();
    }

    fn take_completed(&mut self) -> Vec<Continuation> {
        self.inner.take_completed()
    }

    fn find_screen(&self, container: ContainerId) -> Option<Screen> {
        self.inner.find_screen(container)
    }

    fn save_state(&mut self, screen: &Screen) -> Option<Blob> {
        self.inner.save_state(screen)
    }

    fn instantiate(&mut self, screen_type: &ScreenType, args: Option<&Blob>) -> Screen {
        self.built.push(screen_type.clone());
        Screen::new(screen_type.clone(), args.cloned())
    }
}

#[test]
fn pop_builds_screens_through_host() {
    init_logging();
    let mut host = RecordingHost {
        inner: MockHost::new(),
        built: Vec::new(),
    };
    let mut stack = BackStack::default();

    stack.start_with(&mut host, ROOT, page("first"), None).unwrap();
    host.execute_pending();
    stack.push(&mut host, ROOT, page("second"), None, None).unwrap();
    assert!(stack.pop_immediate(&mut host, ROOT).unwrap());

    assert_eq!(host.built, vec![ScreenType::new("Page").unwrap()]);
    let shown = host.find_screen(ROOT).unwrap();
    assert_eq!(shown.initial_state(), Some(&state("first")));
}
