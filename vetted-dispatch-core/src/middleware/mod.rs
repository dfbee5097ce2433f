//! Middleware shipped with the store
//!
//! - **ValidationMiddleware**: drives deferred validations and redispatches
//!   whatever they resolve to
//! - **LoggingMiddleware**: traces dispatched actions, filtered by kind
//!
//! # Quick Start
//!
//! ```ignore
//! use vetted_dispatch::middleware::{ActionLoggerConfig, LoggingMiddleware, ValidationMiddleware};
//!
//! let store = Store::new(AppState::default(), reducer)
//!     .with_middleware(LoggingMiddleware::new().with_filter(ActionLoggerConfig::new(Some("people/*"), None)))
//!     .with_middleware(ValidationMiddleware::new());
//! ```

mod logging;
mod validation;

pub use logging::{glob_match, ActionLoggerConfig, LoggingMiddleware};
pub use validation::{ParsePolicyError, RedispatchPolicy, ValidationMiddleware};
