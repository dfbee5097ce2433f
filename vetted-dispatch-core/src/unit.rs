//! The plain action record built by creators
//!
//! A [`Unit`] is the smallest thing a store understands: a discriminant, a
//! payload, and whatever extension fields the creator decided to attach.
//! It serializes to the familiar `{ "type": ..., "payload": ..., ...extras }`
//! shape so units can be logged or shipped to devtools unchanged.

use std::fmt::Debug;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::Action;

/// Caller-defined extension fields carried next to `type` and `payload`.
pub type Extras = Map<String, Value>;

/// An immutable action record of one kind.
///
/// Units are never mutated in place. Anything that "changes" a unit
/// ([`with_payload`](Unit::with_payload), [`with_extra`](Unit::with_extra))
/// consumes it and returns a new record.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Unit<P> {
    #[serde(rename = "type")]
    kind: &'static str,
    payload: P,
    #[serde(flatten)]
    extras: Extras,
}

impl<P> Unit<P> {
    /// Create a unit with no extension fields.
    pub fn new(kind: &'static str, payload: P) -> Self {
        Self {
            kind,
            payload,
            extras: Extras::new(),
        }
    }

    /// Create a unit carrying the given extension fields.
    pub fn from_parts(kind: &'static str, payload: P, extras: Extras) -> Self {
        Self {
            kind,
            payload,
            extras,
        }
    }

    /// Return a copy of this unit with one more extension field.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn extras(&self) -> &Extras {
        &self.extras
    }

    /// Look up a single extension field.
    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extras.get(key)
    }

    pub fn into_payload(self) -> P {
        self.payload
    }

    /// Replace the payload, keeping kind and extension fields.
    pub fn with_payload<Q>(self, payload: Q) -> Unit<Q> {
        Unit {
            kind: self.kind,
            payload,
            extras: self.extras,
        }
    }

    /// Transform the payload, keeping kind and extension fields.
    pub fn map_payload<Q>(self, f: impl FnOnce(P) -> Q) -> Unit<Q> {
        let Unit {
            kind,
            payload,
            extras,
        } = self;
        Unit {
            kind,
            payload: f(payload),
            extras,
        }
    }

    pub fn into_parts(self) -> (&'static str, P, Extras) {
        (self.kind, self.payload, self.extras)
    }
}

impl<P> Action for Unit<P>
where
    P: Clone + Debug + Send + 'static,
{
    fn kind(&self) -> &'static str {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_flat() {
        let unit = Unit::new("add", json!({ "age": 5 })).with_extra("meta", "from-form");

        let value = serde_json::to_value(&unit).unwrap();
        assert_eq!(
            value,
            json!({ "type": "add", "payload": { "age": 5 }, "meta": "from-form" })
        );
    }

    #[test]
    fn test_with_payload_keeps_kind_and_extras() {
        let unit = Unit::new("add", 1).with_extra("source", "cli");
        let replaced = unit.clone().with_payload("one");

        assert_eq!(replaced.kind(), "add");
        assert_eq!(*replaced.payload(), "one");
        assert_eq!(replaced.extras(), unit.extras());
        // The original record is untouched
        assert_eq!(*unit.payload(), 1);
    }

    #[test]
    fn test_map_payload() {
        let unit = Unit::new("count", 20).map_payload(|n| n * 2 + 2);
        assert_eq!(unit.into_payload(), 42);
    }

    #[test]
    fn test_action_kind() {
        let unit = Unit::new("people/add", ());
        assert_eq!(Action::kind(&unit), "people/add");
        assert!(unit.extra("missing").is_none());
    }
}
