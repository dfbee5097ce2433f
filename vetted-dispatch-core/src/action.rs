//! Action trait for type-safe state mutations

use std::fmt::Debug;

/// Marker trait for actions that can be dispatched to the store
///
/// Actions represent intents to change state. They should be:
/// - Clone: Actions may be logged, recorded, or sent to multiple handlers
/// - Debug: For debugging and logging
/// - Send + 'static: Validations resolve them on spawned tasks
///
/// Use `#[derive(Action)]` from `vetted-dispatch-macros` to auto-implement this trait.
pub trait Action: Clone + Debug + Send + 'static {
    /// The discriminant identifying this action's logical event type
    fn kind(&self) -> &'static str;
}
