//! Action creators
//!
//! An [`ActionCreator`] builds [`Unit`]s of a single kind. A
//! [`ValidatableCreator`] composes one with a failure creator and a
//! predicate, and builds [`Validatable`] actions instead.
//!
//! # Example
//!
//! ```ignore
//! use vetted_dispatch::{ready, ActionCreator, ValidatableCreator};
//!
//! let add = ValidatableCreator::<u32, bool>::new(
//!     ("people/add", "people/add/invalid"),
//!     ready(|age: &u32| *age < 150),
//! )?;
//!
//! store.dispatch(add.create::<PeopleAction>(42));
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::unit::{Extras, Unit};
use crate::validation::{ready, wrap, Predicate, Validatable, Verdict};
use crate::Action;

/// Field names owned by [`Unit`] itself; extras may not shadow them.
const RESERVED_FIELDS: &[&str] = &["type", "payload"];

type ExtrasFn<P> = Arc<dyn Fn(&P) -> Extras + Send + Sync>;

/// Builds units of one fixed kind.
pub struct ActionCreator<P> {
    kind: &'static str,
    extras: Option<ExtrasFn<P>>,
}

impl<P> ActionCreator<P> {
    pub fn new(kind: &'static str) -> Self {
        Self { kind, extras: None }
    }

    /// Compute extension fields from each payload.
    ///
    /// Runs synchronously inside [`create`](Self::create); a panic unwinds
    /// to whoever called `create`.
    pub fn with_extras<F>(mut self, extras: F) -> Self
    where
        F: Fn(&P) -> Extras + Send + Sync + 'static,
    {
        self.extras = Some(Arc::new(extras));
        self
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Build a unit carrying `payload`.
    pub fn create(&self, payload: P) -> Unit<P> {
        let mut extras = self
            .extras
            .as_ref()
            .map(|extras| extras(&payload))
            .unwrap_or_default();
        for field in RESERVED_FIELDS {
            if extras.remove(*field).is_some() {
                tracing::warn!(kind = %self.kind, field = %field, "ignoring reserved extra field");
            }
        }
        Unit::from_parts(self.kind, payload, extras)
    }
}

impl<P> ActionCreator<P>
where
    P: Clone + Send + 'static,
{
    /// Turn this creator into a validatable one.
    ///
    /// Kind and extension fields are kept; failures are reported as
    /// `failure_kind` units carrying the validation error.
    pub fn validated_by<E, V>(
        self,
        failure_kind: &'static str,
        predicate: V,
    ) -> Result<ValidatableCreator<P, E>>
    where
        E: Send + 'static,
        V: Predicate<P, E>,
    {
        ValidatableCreator::from_parts(self, ActionCreator::new(failure_kind), predicate)
    }
}

impl<P> Clone for ActionCreator<P> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            extras: self.extras.clone(),
        }
    }
}

impl<P> fmt::Debug for ActionCreator<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionCreator")
            .field("kind", &self.kind)
            .field("has_extras", &self.extras.is_some())
            .finish()
    }
}

impl<P> fmt::Display for ActionCreator<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind)
    }
}

/// A creator whose actions are validated before they reach the reducer.
///
/// Holds the base creator, the paired failure creator, and the predicate.
/// The two kinds are fixed at construction and always distinct.
pub struct ValidatableCreator<P, E> {
    base: ActionCreator<P>,
    on_failure: ActionCreator<E>,
    predicate: Arc<dyn Predicate<P, E>>,
}

impl<P, E> ValidatableCreator<P, E>
where
    P: Clone + Send + 'static,
    E: Send + 'static,
{
    /// Build both creators from a `(kind, failure_kind)` pair.
    pub fn new<V>(
        (kind, failure_kind): (&'static str, &'static str),
        predicate: V,
    ) -> Result<Self>
    where
        V: Predicate<P, E>,
    {
        Self::from_parts(
            ActionCreator::new(kind),
            ActionCreator::new(failure_kind),
            predicate,
        )
    }

    /// Build both creators with a predicate that always passes.
    ///
    /// Actions still go through validation and resolve to themselves; a
    /// real check can be swapped in later without touching dispatch sites.
    pub fn unchecked(kinds: (&'static str, &'static str)) -> Result<Self> {
        Self::new(kinds, ready(|_: &P| Verdict::<P, E>::Valid))
    }

    /// Compose existing creators with a predicate.
    pub fn from_parts<V>(
        base: ActionCreator<P>,
        on_failure: ActionCreator<E>,
        predicate: V,
    ) -> Result<Self>
    where
        V: Predicate<P, E>,
    {
        if base.kind() == on_failure.kind() {
            return Err(Error::KindCollision { kind: base.kind() });
        }
        Ok(Self {
            base,
            on_failure,
            predicate: Arc::new(predicate),
        })
    }

    /// Build a validatable action for `payload`.
    ///
    /// The predicate does not run here; it runs when the action passes a
    /// [`ValidationMiddleware`](crate::ValidationMiddleware).
    pub fn create<A>(&self, payload: P) -> Validatable<A>
    where
        A: Action + From<Unit<P>> + From<Unit<E>>,
    {
        let unit = self.base.create(payload);
        let deferred = wrap(unit.clone(), self.predicate.clone(), self.on_failure.clone());
        Validatable::new(A::from(unit), deferred)
    }
}

impl<P, E> ValidatableCreator<P, E> {
    pub fn kind(&self) -> &'static str {
        self.base.kind()
    }

    pub fn failure_kind(&self) -> &'static str {
        self.on_failure.kind()
    }

    /// The creator for unvalidated units of the same kind.
    pub fn base(&self) -> &ActionCreator<P> {
        &self.base
    }

    /// The creator for failure units.
    pub fn on_validation_failure(&self) -> &ActionCreator<E> {
        &self.on_failure
    }
}

impl<P, E> Clone for ValidatableCreator<P, E> {
    fn clone(&self) -> Self {
        Self {
            base: self.base.clone(),
            on_failure: self.on_failure.clone(),
            predicate: self.predicate.clone(),
        }
    }
}

impl<P, E> fmt::Debug for ValidatableCreator<P, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatableCreator")
            .field("kind", &self.kind())
            .field("failure_kind", &self.failure_kind())
            .finish_non_exhaustive()
    }
}

impl<P, E> fmt::Display for ValidatableCreator<P, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}
