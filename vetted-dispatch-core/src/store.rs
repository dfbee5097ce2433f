//! Centralized state store with a middleware chain
//!
//! Every dispatch walks the store's middleware in order. Each middleware
//! receives the action and a [`Next`] handle; forwarding through `Next`
//! hands the action to the following middleware, and past the last one to
//! the reducer.
//!
//! `Store` is a cheap handle: clones share the same state and chain. That is
//! what lets a validation finishing on another task re-enter the store,
//! either at the top ([`Next::entry`]) or right after the stage that
//! deferred it ([`Next::resume`]).

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::task::{Context, Poll};

use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::validation::Dispatchable;
use crate::Action;

/// A reducer function that handles actions and mutates state
///
/// Returns `true` if the state changed.
pub type Reducer<S, A> = fn(&mut S, A) -> bool;

/// What a dispatch produced.
#[derive(Debug)]
pub enum Dispatched {
    /// The action reached the reducer; `true` if the state changed.
    Reduced(bool),
    /// The action is being validated; await the completion for the outcome.
    Pending(Completion),
}

impl Dispatched {
    pub fn is_pending(&self) -> bool {
        matches!(self, Dispatched::Pending(_))
    }

    /// The reducer's verdict, if the action was reduced synchronously.
    pub fn changed(&self) -> Option<bool> {
        match self {
            Dispatched::Reduced(changed) => Some(*changed),
            Dispatched::Pending(_) => None,
        }
    }

    /// Wait until the action, or whatever it resolved to, has been reduced.
    pub async fn settled(self) -> Result<bool> {
        match self {
            Dispatched::Reduced(changed) => Ok(changed),
            Dispatched::Pending(completion) => completion.await,
        }
    }
}

/// The pending completion of a validated dispatch.
///
/// Dropping it does not cancel the validation.
pub struct Completion {
    kind: &'static str,
    handle: JoinHandle<Result<bool>>,
}

impl Completion {
    pub(crate) fn new(kind: &'static str, handle: JoinHandle<Result<bool>>) -> Self {
        Self { kind, handle }
    }

    /// Kind of the action whose validation this tracks.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Future for Completion {
    type Output = Result<bool>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let kind = self.kind;
        Pin::new(&mut self.handle).poll(cx).map(|joined| {
            joined
                .map_err(|source| Error::Aborted { kind, source })
                .and_then(|settled| settled)
        })
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("kind", &self.kind)
            .field("finished", &self.is_finished())
            .finish()
    }
}

/// Middleware trait for intercepting actions
///
/// Implement this trait to add logging, validation, or other cross-cutting
/// concerns to your store. Call [`Next::forward`] to pass an action on;
/// returning without forwarding swallows it.
pub trait Middleware<A: Action>: Send {
    fn handle(&mut self, action: Dispatchable<A>, next: Next<'_, A>) -> Dispatched;
}

/// A no-op middleware that forwards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMiddleware;

impl<A: Action> Middleware<A> for NoopMiddleware {
    fn handle(&mut self, action: Dispatchable<A>, next: Next<'_, A>) -> Dispatched {
        next.forward(action)
    }
}

/// The remainder of the chain after the current middleware.
pub struct Next<'a, A: Action> {
    chain: &'a mut [Box<dyn Middleware<A>>],
    stage: usize,
    reduce: &'a mut dyn FnMut(A) -> bool,
    entry: &'a Arc<dyn Dispatcher<A>>,
}

impl<A: Action> Next<'_, A> {
    /// Pass the action to the rest of the chain.
    pub fn forward(self, action: Dispatchable<A>) -> Dispatched {
        let Next {
            chain,
            stage,
            reduce,
            entry,
        } = self;

        match chain.split_first_mut() {
            Some((middleware, rest)) => middleware.handle(
                action,
                Next {
                    chain: rest,
                    stage: stage + 1,
                    reduce,
                    entry,
                },
            ),
            None => match action {
                Dispatchable::Plain(action) => Dispatched::Reduced(reduce(action)),
                Dispatchable::Validatable(validatable) => {
                    tracing::error!(
                        kind = %validatable.kind(),
                        "validatable action reached the reducer unvalidated; dropping it"
                    );
                    Dispatched::Reduced(false)
                }
            },
        }
    }

    /// Index of the stage `forward` would run next.
    pub fn stage(&self) -> usize {
        self.stage
    }

    /// A handle re-entering the store from its first stage.
    pub fn entry(&self) -> Redispatcher<A> {
        Redispatcher {
            target: Arc::clone(self.entry),
            stage: 0,
        }
    }

    /// A handle re-entering the store at the stage after the current one.
    pub fn resume(&self) -> Redispatcher<A> {
        Redispatcher {
            target: Arc::clone(self.entry),
            stage: self.stage,
        }
    }
}

trait Dispatcher<A: Action>: Send + Sync {
    fn dispatch_from(self: Arc<Self>, stage: usize, action: Dispatchable<A>) -> Dispatched;
}

/// An owned handle that dispatches into a store at a fixed stage.
///
/// Meant for use after an await, e.g. from a spawned task. Dispatching
/// through it from inside [`Middleware::handle`] deadlocks, since the chain
/// is locked for the duration of a dispatch.
pub struct Redispatcher<A: Action> {
    target: Arc<dyn Dispatcher<A>>,
    stage: usize,
}

impl<A: Action> Redispatcher<A> {
    pub fn dispatch(&self, action: impl Into<Dispatchable<A>>) -> Dispatched {
        Arc::clone(&self.target).dispatch_from(self.stage, action.into())
    }

    pub fn stage(&self) -> usize {
        self.stage
    }
}

impl<A: Action> Clone for Redispatcher<A> {
    fn clone(&self) -> Self {
        Self {
            target: Arc::clone(&self.target),
            stage: self.stage,
        }
    }
}

impl<A: Action> fmt::Debug for Redispatcher<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Redispatcher")
            .field("stage", &self.stage)
            .finish_non_exhaustive()
    }
}

struct Inner<S, A: Action> {
    state: S,
    reducer: Reducer<S, A>,
    chain: Vec<Box<dyn Middleware<A>>>,
}

struct Shared<S, A: Action> {
    inner: Mutex<Inner<S, A>>,
}

impl<S, A: Action> Shared<S, A> {
    fn lock(&self) -> MutexGuard<'_, Inner<S, A>> {
        // A panicking reducer already unwound to its caller; keep serving.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: Send + 'static, A: Action> Dispatcher<A> for Shared<S, A> {
    fn dispatch_from(self: Arc<Self>, stage: usize, action: Dispatchable<A>) -> Dispatched {
        let entry: Arc<dyn Dispatcher<A>> = self.clone();
        let mut inner = self.lock();
        let Inner {
            state,
            reducer,
            chain,
        } = &mut *inner;

        let reducer = *reducer;
        let mut reduce = |action: A| reducer(state, action);
        let stage = stage.min(chain.len());

        let next = Next {
            chain: &mut chain[stage..],
            stage,
            reduce: &mut reduce,
            entry: &entry,
        };
        next.forward(action)
    }
}

/// Centralized state store with Redux-like reducer pattern
///
/// The store holds the application state and provides a single point
/// for state mutations through the `dispatch` method.
///
/// # Type Parameters
/// * `S` - The application state type
/// * `A` - The action type (must implement `Action`)
///
/// # Example
/// ```ignore
/// #[derive(Default)]
/// struct AppState {
///     people: Vec<Person>,
///     last_error: Option<String>,
/// }
///
/// fn reducer(state: &mut AppState, action: PeopleAction) -> bool {
///     match action {
///         PeopleAction::Add(unit) => {
///             state.people.push(unit.into_payload());
///             true
///         }
///         PeopleAction::AddInvalid(unit) => {
///             state.last_error = Some(unit.into_payload());
///             true
///         }
///     }
/// }
///
/// let store = Store::new(AppState::default(), reducer)
///     .with_middleware(ValidationMiddleware::new());
/// store.dispatch(add_person.create(person)).settled().await?;
/// ```
pub struct Store<S, A: Action> {
    shared: Arc<Shared<S, A>>,
}

impl<S: Send + 'static, A: Action> Store<S, A> {
    /// Create a new store with initial state and reducer
    pub fn new(state: S, reducer: Reducer<S, A>) -> Self {
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state,
                    reducer,
                    chain: Vec::new(),
                }),
            }),
        }
    }

    /// Append a middleware to the chain
    pub fn with_middleware<M: Middleware<A> + 'static>(self, middleware: M) -> Self {
        self.add_middleware(middleware);
        self
    }

    /// Append a middleware to the chain of a live store
    pub fn add_middleware<M: Middleware<A> + 'static>(&self, middleware: M) {
        self.shared.lock().chain.push(Box::new(middleware));
    }

    pub fn middleware_count(&self) -> usize {
        self.shared.lock().chain.len()
    }

    /// Dispatch an action through the middleware chain
    ///
    /// Plain actions are reduced before this returns. Validatable actions
    /// come back as [`Dispatched::Pending`].
    pub fn dispatch(&self, action: impl Into<Dispatchable<A>>) -> Dispatched {
        Arc::clone(&self.shared).dispatch_from(0, action.into())
    }

    /// A handle dispatching into this store from its first stage
    pub fn redispatcher(&self) -> Redispatcher<A> {
        Redispatcher {
            target: self.shared.clone(),
            stage: 0,
        }
    }

    /// Read the current state
    pub fn with_state<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.shared.lock().state)
    }

    /// Mutate the state directly
    ///
    /// Use this sparingly - prefer dispatching actions for state changes.
    pub fn update_state<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.shared.lock().state)
    }

    /// Clone the current state
    pub fn snapshot(&self) -> S
    where
        S: Clone,
    {
        self.with_state(S::clone)
    }
}

impl<S, A: Action> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S, A: Action> fmt::Debug for Store<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Store");
        // Formatting from inside a dispatch must not wait on the chain lock
        match self.shared.inner.try_lock() {
            Ok(inner) => debug.field("middleware_count", &inner.chain.len()),
            Err(TryLockError::Poisoned(poisoned)) => {
                debug.field("middleware_count", &poisoned.into_inner().chain.len())
            }
            Err(TryLockError::WouldBlock) => {
                debug.field("middleware_count", &format_args!("<dispatching>"))
            }
        };
        debug.finish_non_exhaustive()
    }
}
