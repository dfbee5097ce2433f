//! Test utilities for stores with validated actions
//!
//! - [`RecordingMiddleware`]: captures every action that reaches its stage
//! - [`TestHarness`]: a store wired with a recorder and a validation stage
//! - Assertion macros for verifying recorded actions
//!
//! # Example
//!
//! ```ignore
//! use vetted_dispatch::testing::TestHarness;
//! use vetted_dispatch::assert_emitted;
//!
//! let mut harness = TestHarness::new(AppState::default(), reducer);
//!
//! harness.settle(add_person.create(person)).await?;
//!
//! let actions = harness.drain_emitted();
//! assert_emitted!(actions, PeopleAction::AddInvalid(_));
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::Result;
use crate::middleware::{RedispatchPolicy, ValidationMiddleware};
use crate::store::{Dispatched, Middleware, Next, Reducer, Store};
use crate::validation::Dispatchable;
use crate::Action;

/// Shared log of recorded actions.
///
/// Clones observe the same log.
pub struct Recording<A> {
    actions: Arc<Mutex<Vec<A>>>,
}

impl<A> Recording<A> {
    fn lock(&self) -> MutexGuard<'_, Vec<A>> {
        self.actions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take every action recorded so far.
    pub fn drain(&self) -> Vec<A> {
        std::mem::take(&mut *self.lock())
    }

    /// Copy the recorded actions without clearing them.
    pub fn snapshot(&self) -> Vec<A>
    where
        A: Clone,
    {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl<A> Clone for Recording<A> {
    fn clone(&self) -> Self {
        Self {
            actions: Arc::clone(&self.actions),
        }
    }
}

impl<A> Default for Recording<A> {
    fn default() -> Self {
        Self {
            actions: Arc::default(),
        }
    }
}

impl<A: fmt::Debug> fmt::Debug for Recording<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.lock().iter()).finish()
    }
}

/// Middleware recording the action of everything that passes through it.
///
/// Validatable actions are recorded as the action ordinary consumers see.
pub struct RecordingMiddleware<A> {
    recording: Recording<A>,
}

impl<A> RecordingMiddleware<A> {
    pub fn new() -> Self {
        Self {
            recording: Recording::default(),
        }
    }

    /// A handle onto this middleware's log, usable after the middleware has
    /// moved into a store.
    pub fn recording(&self) -> Recording<A> {
        self.recording.clone()
    }
}

impl<A> Default for RecordingMiddleware<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Action> Middleware<A> for RecordingMiddleware<A> {
    fn handle(&mut self, action: Dispatchable<A>, next: Next<'_, A>) -> Dispatched {
        self.recording.lock().push(action.action().clone());
        next.forward(action)
    }
}

/// Test harness pairing a store with a recorder placed ahead of validation.
///
/// Every dispatched action is recorded on the way in. With the default
/// policy failure actions re-enter from the top and are recorded too, while
/// validated originals resume past the recorder and are recorded only once.
///
/// # Type Parameters
///
/// - `S`: The state type
/// - `A`: The action type (must implement [`Action`])
pub struct TestHarness<S, A: Action> {
    store: Store<S, A>,
    recording: Recording<A>,
}

impl<S: Send + 'static, A: Action> TestHarness<S, A> {
    /// Create a harness with the default redispatch policy.
    pub fn new(state: S, reducer: Reducer<S, A>) -> Self {
        Self::with_policy(state, reducer, RedispatchPolicy::default())
    }

    pub fn with_policy(state: S, reducer: Reducer<S, A>, policy: RedispatchPolicy) -> Self {
        let recorder = RecordingMiddleware::new();
        let recording = recorder.recording();
        let store = Store::new(state, reducer)
            .with_middleware(recorder)
            .with_middleware(ValidationMiddleware::with_policy(policy));
        Self { store, recording }
    }

    pub fn store(&self) -> &Store<S, A> {
        &self.store
    }

    pub fn dispatch(&self, action: impl Into<Dispatchable<A>>) -> Dispatched {
        self.store.dispatch(action)
    }

    /// Dispatch and wait for the outcome to reach the reducer.
    pub async fn settle(&self, action: impl Into<Dispatchable<A>>) -> Result<bool> {
        self.store.dispatch(action).settled().await
    }

    /// Read the current state.
    pub fn state<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        self.store.with_state(f)
    }

    /// Drain all recorded actions.
    pub fn drain_emitted(&mut self) -> Vec<A> {
        self.recording.drain()
    }

    /// Check if any actions were recorded.
    pub fn has_emitted(&mut self) -> bool {
        !self.drain_emitted().is_empty()
    }
}

/// Assert that a specific action was emitted.
///
/// # Example
///
/// ```ignore
/// use vetted_dispatch::assert_emitted;
///
/// let actions = harness.drain_emitted();
/// assert_emitted!(actions, PeopleAction::Add(_));
/// assert_emitted!(actions, PeopleAction::AddInvalid(unit) if *unit.payload() == "negative");
/// ```
#[macro_export]
macro_rules! assert_emitted {
    ($actions:expr, $pattern:pat $(if $guard:expr)?) => {
        assert!(
            $actions.iter().any(|a| matches!(a, $pattern $(if $guard)?)),
            "Expected action matching `{}` to be emitted, but got: {:?}",
            stringify!($pattern),
            $actions
        );
    };
}

/// Assert that a specific action was NOT emitted.
#[macro_export]
macro_rules! assert_not_emitted {
    ($actions:expr, $pattern:pat $(if $guard:expr)?) => {
        assert!(
            !$actions.iter().any(|a| matches!(a, $pattern $(if $guard)?)),
            "Expected action matching `{}` NOT to be emitted, but it was: {:?}",
            stringify!($pattern),
            $actions
        );
    };
}

/// Find and return the first action matching a pattern.
#[macro_export]
macro_rules! find_emitted {
    ($actions:expr, $pattern:pat $(if $guard:expr)?) => {
        $actions.iter().find(|a| matches!(a, $pattern $(if $guard)?))
    };
}

/// Count how many actions match a pattern.
#[macro_export]
macro_rules! count_emitted {
    ($actions:expr, $pattern:pat $(if $guard:expr)?) => {
        $actions.iter().filter(|a| matches!(a, $pattern $(if $guard)?)).count()
    };
}

/// Assert that an action of the given kind was emitted.
///
/// Works on any slice of [`Action`](crate::Action)s, including plain
/// [`Unit`](crate::Unit)s.
#[macro_export]
macro_rules! assert_kind_emitted {
    ($actions:expr, $kind:expr) => {{
        let kind: &str = $kind;
        assert!(
            $actions
                .iter()
                .any(|a| $crate::Action::kind(a) == kind),
            "Expected action of kind `{}` to be emitted, but got: {:?}",
            kind,
            $actions
        );
    }};
}
