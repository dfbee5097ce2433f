//! Core traits and types for vetted-dispatch
//!
//! This crate provides a Redux-style store whose actions can carry an
//! asynchronous validation that runs before they reach the reducer.
//!
//! # Core Concepts
//!
//! - **Action**: Events that describe state changes
//! - **Unit**: The plain `{ type, payload, ...extras }` record creators build
//! - **Creators**: Build units, or validatable units paired with a predicate
//!   and a failure kind
//! - **Store**: Centralized state container with a middleware chain
//! - **ValidationMiddleware**: Runs the predicate and redispatches either the
//!   (possibly normalized) action or a failure action
//!
//! # Basic Example
//!
//! ```ignore
//! use vetted_dispatch_core::prelude::*;
//!
//! #[derive(Clone, Debug)]
//! enum PeopleAction {
//!     Add(Unit<Person>),
//!     AddInvalid(Unit<bool>),
//! }
//!
//! let add = ValidatableCreator::<Person, bool>::new(
//!     ("people/add", "people/add/invalid"),
//!     ready(|person: &Person| person.age >= 0),
//! )?;
//!
//! let store = Store::new(AppState::default(), reducer)
//!     .with_middleware(ValidationMiddleware::new());
//!
//! store.dispatch(add.create(Person { name: "Ada".into(), age: -1 }))
//!     .settled()
//!     .await?;
//! // The reducer saw PeopleAction::AddInvalid(false)
//! ```

pub mod action;
pub mod creator;
pub mod error;
pub mod middleware;
pub mod store;
pub mod testing;
pub mod unit;
pub mod validation;

// Core trait exports
pub use action::Action;
pub use error::{Error, Result};

// Action construction exports
pub use creator::{ActionCreator, ValidatableCreator};
pub use unit::{Extras, Unit};
pub use validation::{
    ready, wrap, BoxFuture, Deferred, Dispatchable, Predicate, Ready, Validatable, Verdict,
};

// Store exports
pub use middleware::{
    ActionLoggerConfig, LoggingMiddleware, RedispatchPolicy, ValidationMiddleware,
};
pub use store::{
    Completion, Dispatched, Middleware, Next, NoopMiddleware, Reducer, Redispatcher, Store,
};

// Testing exports
pub use testing::{Recording, RecordingMiddleware, TestHarness};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::action::Action;
    pub use crate::creator::{ActionCreator, ValidatableCreator};
    pub use crate::error::{Error, Result};
    pub use crate::middleware::{
        ActionLoggerConfig, LoggingMiddleware, RedispatchPolicy, ValidationMiddleware,
    };
    pub use crate::store::{Dispatched, Middleware, Next, NoopMiddleware, Reducer, Store};
    pub use crate::unit::{Extras, Unit};
    pub use crate::validation::{ready, Dispatchable, Validatable, Verdict};
}
