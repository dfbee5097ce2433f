//! Deferred validation attached to actions
//!
//! A validatable action carries a [`Deferred`] procedure next to the action
//! ordinary consumers see. The procedure is a lazily evaluated future: it
//! does nothing until the [`ValidationMiddleware`](crate::ValidationMiddleware)
//! runs it, then it invokes the predicate and resolves to the next action to
//! dispatch, either the original (possibly with a normalized payload) or a
//! failure action built from the validation error.
//!
//! # Predicates
//!
//! Any `Fn(P) -> impl Future` closure whose output converts into a
//! [`Verdict`] is a [`Predicate`]. Synchronous checks are wrapped with
//! [`ready`]:
//!
//! ```ignore
//! use vetted_dispatch::{ready, Verdict};
//!
//! // async, "throws" by returning Err
//! let is_adult = |age: u32| async move {
//!     if age < 18 { Err("too young") } else { Ok(()) }
//! };
//!
//! // sync, normalizes the payload
//! let trimmed = ready(|name: &String| Verdict::<String, ()>::Normalized(name.trim().into()));
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::creator::ActionCreator;
use crate::unit::Unit;
use crate::Action;

/// An owned, type-erased future that can move across tasks.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The outcome of running a predicate against a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict<P, E> {
    /// The payload passed as-is.
    Valid,
    /// The payload passed, and should be replaced by this one.
    Normalized(P),
    /// The payload failed; the value becomes the failure action's payload.
    Invalid(E),
}

impl<P, E> Verdict<P, E> {
    /// Returns true unless this is [`Verdict::Invalid`].
    pub fn is_valid(&self) -> bool {
        !matches!(self, Verdict::Invalid(_))
    }
}

/// `true` passes, `false` fails with `false` as the failure payload.
impl<P> From<bool> for Verdict<P, bool> {
    fn from(valid: bool) -> Self {
        if valid {
            Verdict::Valid
        } else {
            Verdict::Invalid(false)
        }
    }
}

/// `None` passes unchanged, `Some` replaces the payload.
impl<P, E> From<Option<P>> for Verdict<P, E> {
    fn from(normalized: Option<P>) -> Self {
        match normalized {
            Some(payload) => Verdict::Normalized(payload),
            None => Verdict::Valid,
        }
    }
}

/// An `Err` is treated exactly like [`Verdict::Invalid`].
impl<P, E> From<Result<(), E>> for Verdict<P, E> {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Verdict::Valid,
            Err(error) => Verdict::Invalid(error),
        }
    }
}

impl<P, E> From<Result<Option<P>, E>> for Verdict<P, E> {
    fn from(result: Result<Option<P>, E>) -> Self {
        match result {
            Ok(normalized) => normalized.into(),
            Err(error) => Verdict::Invalid(error),
        }
    }
}

impl<P, E> From<Result<Verdict<P, E>, E>> for Verdict<P, E> {
    fn from(result: Result<Verdict<P, E>, E>) -> Self {
        result.unwrap_or_else(Verdict::Invalid)
    }
}

/// An async check run against a payload when its action is dispatched.
pub trait Predicate<P, E>: Send + Sync + 'static {
    fn check(&self, payload: P) -> BoxFuture<'static, Verdict<P, E>>;
}

impl<P, E, F, Fut, O> Predicate<P, E> for F
where
    P: 'static,
    E: 'static,
    F: Fn(P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = O> + Send + 'static,
    O: Into<Verdict<P, E>>,
{
    fn check(&self, payload: P) -> BoxFuture<'static, Verdict<P, E>> {
        let pending = self(payload);
        Box::pin(async move { pending.await.into() })
    }
}

/// A synchronous predicate, see [`ready`].
#[derive(Clone, Copy)]
pub struct Ready<F>(F);

/// Adapt a synchronous check into a [`Predicate`].
///
/// The check still only runs when the validation is driven, not when the
/// action is created.
pub fn ready<F>(check: F) -> Ready<F> {
    Ready(check)
}

impl<P, E, F, O> Predicate<P, E> for Ready<F>
where
    P: 'static,
    E: Send + 'static,
    F: Fn(&P) -> O + Send + Sync + 'static,
    O: Into<Verdict<P, E>>,
    Verdict<P, E>: Send,
{
    fn check(&self, payload: P) -> BoxFuture<'static, Verdict<P, E>> {
        let verdict = (self.0)(&payload).into();
        Box::pin(std::future::ready(verdict))
    }
}

/// A deferred validation procedure.
///
/// Resolves to the action that should continue through the store.
pub struct Deferred<A> {
    kind: &'static str,
    resolution: BoxFuture<'static, A>,
}

impl<A> Deferred<A> {
    /// Wrap a future resolving to the next action for the action of `kind`.
    pub fn new<F>(kind: &'static str, resolution: F) -> Self
    where
        F: Future<Output = A> + Send + 'static,
    {
        Self {
            kind,
            resolution: Box::pin(resolution),
        }
    }

    /// Kind of the action this procedure validates.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Drive the validation and hand the resolved action to `continuation`.
    ///
    /// The continuation is called exactly once, after the predicate settles.
    pub async fn run<R>(self, continuation: impl FnOnce(A) -> R) -> R {
        let resolved = self.resolution.await;
        continuation(resolved)
    }
}

impl<A> fmt::Debug for Deferred<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Build the deferred procedure validating `unit`.
///
/// On pass the original unit, extension fields included, resolves with the
/// effective payload. On failure `on_failure` builds the failure unit from
/// the value the predicate produced or returned as its error.
pub fn wrap<P, E, A>(
    unit: Unit<P>,
    predicate: Arc<dyn Predicate<P, E>>,
    on_failure: ActionCreator<E>,
) -> Deferred<A>
where
    P: Clone + Send + 'static,
    E: Send + 'static,
    A: From<Unit<P>> + From<Unit<E>> + 'static,
{
    let kind = unit.kind();
    Deferred::new(kind, async move {
        let verdict = predicate.check(unit.payload().clone()).await;
        match verdict {
            Verdict::Valid => {
                tracing::trace!(kind = %kind, "validation passed");
                A::from(unit)
            }
            Verdict::Normalized(payload) => {
                tracing::trace!(kind = %kind, "validation passed with normalized payload");
                A::from(unit.with_payload(payload))
            }
            Verdict::Invalid(error) => {
                tracing::debug!(
                    kind = %kind,
                    failure = %on_failure.kind(),
                    "validation failed"
                );
                A::from(on_failure.create(error))
            }
        }
    })
}

/// An action paired with the procedure that validates it.
///
/// Consumers that only care about the action read it through
/// [`action`](Validatable::action); the procedure is only reachable by
/// matching [`Dispatchable::Validatable`].
pub struct Validatable<A> {
    action: A,
    deferred: Deferred<A>,
}

impl<A> Validatable<A> {
    pub fn new(action: A, deferred: Deferred<A>) -> Self {
        Self { action, deferred }
    }

    /// The action as ordinary consumers see it, before validation.
    pub fn action(&self) -> &A {
        &self.action
    }

    pub fn deferred(&self) -> &Deferred<A> {
        &self.deferred
    }

    pub fn into_parts(self) -> (A, Deferred<A>) {
        (self.action, self.deferred)
    }
}

impl<A: Action> Validatable<A> {
    pub fn kind(&self) -> &'static str {
        self.action.kind()
    }
}

impl<A: fmt::Debug> fmt::Debug for Validatable<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validatable")
            .field("action", &self.action)
            .finish_non_exhaustive()
    }
}

/// Anything a store accepts: a plain action or a validatable one.
#[derive(Debug)]
pub enum Dispatchable<A> {
    Plain(A),
    Validatable(Validatable<A>),
}

impl<A> Dispatchable<A> {
    /// The action as ordinary consumers see it.
    pub fn action(&self) -> &A {
        match self {
            Dispatchable::Plain(action) => action,
            Dispatchable::Validatable(validatable) => validatable.action(),
        }
    }

    /// The attached validation procedure, if any.
    pub fn deferred_validation(&self) -> Option<&Deferred<A>> {
        match self {
            Dispatchable::Plain(_) => None,
            Dispatchable::Validatable(validatable) => Some(validatable.deferred()),
        }
    }

    pub fn is_validatable(&self) -> bool {
        matches!(self, Dispatchable::Validatable(_))
    }
}

impl<A: Action> Dispatchable<A> {
    pub fn kind(&self) -> &'static str {
        self.action().kind()
    }
}

impl<A> From<A> for Dispatchable<A> {
    fn from(action: A) -> Self {
        Dispatchable::Plain(action)
    }
}

impl<A> From<Validatable<A>> for Dispatchable<A> {
    fn from(validatable: Validatable<A>) -> Self {
        Dispatchable::Validatable(validatable)
    }
}
