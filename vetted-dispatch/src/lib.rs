//! vetted-dispatch: asynchronous action validation for Redux-style stores
//!
//! Actions built by a [`ValidatableCreator`] carry a predicate that runs
//! when they pass through a [`ValidationMiddleware`]. The reducer only ever
//! sees the validated action (possibly with a normalized payload) or the
//! paired failure action carrying the validation error.
//!
//! # Example
//! ```ignore
//! use vetted_dispatch::prelude::*;
//!
//! #[derive(Action, Clone, Debug)]
//! enum PeopleAction {
//!     #[action(unit)]
//!     Add(Unit<Person>),
//!     #[action(unit)]
//!     AddInvalid(Unit<bool>),
//! }
//!
//! let add = ValidatableCreator::new(
//!     ("people/add", "people/add/invalid"),
//!     ready(|person: &Person| person.age >= 0),
//! )?;
//!
//! let store = Store::new(People::default(), reducer)
//!     .with_middleware(ValidationMiddleware::new());
//! store.dispatch(add.create::<PeopleAction>(person)).settled().await?;
//! ```

// Re-export everything from core
pub use vetted_dispatch_core::*;

// Re-export derive macros
pub use vetted_dispatch_macros::Action;

/// Prelude for convenient imports
pub mod prelude {
    // Traits
    pub use vetted_dispatch_core::{Action, Middleware, Predicate};

    // Action construction
    pub use vetted_dispatch_core::{
        ready, ActionCreator, Dispatchable, Extras, Unit, Validatable, ValidatableCreator, Verdict,
    };

    // Store
    pub use vetted_dispatch_core::{
        ActionLoggerConfig, Dispatched, LoggingMiddleware, Next, NoopMiddleware, Reducer,
        RedispatchPolicy, Store, ValidationMiddleware,
    };

    pub use vetted_dispatch_core::{Error, Result};

    // Derive macros
    pub use vetted_dispatch_macros::Action;
}
