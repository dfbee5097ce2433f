//! The interceptor driving deferred validations

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::store::{Completion, Dispatched, Middleware, Next, Redispatcher};
use crate::validation::{Dispatchable, Validatable};
use crate::Action;

/// Where a resolved action re-enters the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RedispatchPolicy {
    /// Actions of the original kind continue after the interceptor; any
    /// other kind (a failure action) goes through the whole chain again.
    #[default]
    RestartFromTop,
    /// Every resolved action continues after the interceptor.
    ContinueInChain,
}

impl RedispatchPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedispatchPolicy::RestartFromTop => "restart-from-top",
            RedispatchPolicy::ContinueInChain => "continue-in-chain",
        }
    }
}

impl fmt::Display for RedispatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown redispatch policy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown redispatch policy `{0}`, expected `restart-from-top` or `continue-in-chain`")]
pub struct ParsePolicyError(String);

impl FromStr for RedispatchPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "restart-from-top" | "restart" => Ok(RedispatchPolicy::RestartFromTop),
            "continue-in-chain" | "continue" => Ok(RedispatchPolicy::ContinueInChain),
            _ => Err(ParsePolicyError(s.to_string())),
        }
    }
}

/// Middleware that validates [`Validatable`] actions before they go further.
///
/// Plain actions are forwarded untouched. A validatable action is never
/// forwarded itself: its deferred validation runs on a spawned tokio task,
/// and whatever it resolves to is dispatched back into the store according
/// to the [`RedispatchPolicy`].
///
/// Outside a tokio runtime there is nothing to run the validation on: the
/// action is dropped with an error log and never reduced.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationMiddleware {
    policy: RedispatchPolicy,
}

impl ValidationMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: RedispatchPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> RedispatchPolicy {
        self.policy
    }

    fn intercept<A: Action>(&self, validatable: Validatable<A>, next: &Next<'_, A>) -> Dispatched {
        let kind = validatable.kind();
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::error!(
                kind = %kind,
                "no tokio runtime to validate on; dropping action"
            );
            return Dispatched::Reduced(false);
        };
        let (_original, deferred) = validatable.into_parts();
        let policy = self.policy;
        let entry = next.entry();
        let resume = next.resume();

        tracing::debug!(kind = %kind, policy = %policy, "validating action");

        let handle = runtime.spawn(async move {
            let redispatched = deferred
                .run(|resolved: A| {
                    let target = redispatch_target(policy, kind, &resolved, &entry, &resume);
                    tracing::debug!(
                        kind = %kind,
                        resolved = %resolved.kind(),
                        stage = target.stage(),
                        "redispatching validated action"
                    );
                    target.dispatch(resolved)
                })
                .await;
            redispatched.settled().await
        });

        Dispatched::Pending(Completion::new(kind, handle))
    }
}

fn redispatch_target<'r, A: Action>(
    policy: RedispatchPolicy,
    original: &'static str,
    resolved: &A,
    entry: &'r Redispatcher<A>,
    resume: &'r Redispatcher<A>,
) -> &'r Redispatcher<A> {
    match policy {
        RedispatchPolicy::RestartFromTop if resolved.kind() != original => entry,
        _ => resume,
    }
}

impl<A: Action> Middleware<A> for ValidationMiddleware {
    fn handle(&mut self, action: Dispatchable<A>, next: Next<'_, A>) -> Dispatched {
        match action {
            Dispatchable::Validatable(validatable) => self.intercept(validatable, &next),
            plain => next.forward(plain),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creator::ValidatableCreator;
    use crate::store::Store;
    use crate::unit::Unit;
    use crate::validation::ready;
    use std::sync::{Arc, Mutex};

    type Seen = Arc<Mutex<Vec<&'static str>>>;

    /// Records every kind that reaches its stage
    struct Spy(Seen);

    impl<A: Action> Middleware<A> for Spy {
        fn handle(&mut self, action: Dispatchable<A>, next: Next<'_, A>) -> Dispatched {
            self.0.lock().unwrap().push(action.kind());
            next.forward(action)
        }
    }

    fn record(state: &mut Vec<(&'static str, i32)>, action: Unit<i32>) -> bool {
        state.push((action.kind(), *action.payload()));
        true
    }

    fn positive() -> ValidatableCreator<i32, i32> {
        ValidatableCreator::new(
            ("num/set", "num/set/invalid"),
            ready(|n: &i32| if *n > 0 { Ok(()) } else { Err(*n) }),
        )
        .unwrap()
    }

    fn store(policy: RedispatchPolicy) -> (Store<Vec<(&'static str, i32)>, Unit<i32>>, Seen, Seen) {
        let before: Seen = Arc::default();
        let after: Seen = Arc::default();
        let store = Store::new(Vec::new(), record)
            .with_middleware(Spy(before.clone()))
            .with_middleware(ValidationMiddleware::with_policy(policy))
            .with_middleware(Spy(after.clone()));
        (store, before, after)
    }

    #[test]
    fn test_policy_parse_and_display() {
        assert_eq!(RedispatchPolicy::default(), RedispatchPolicy::RestartFromTop);
        assert_eq!(
            "continue_in_chain".parse::<RedispatchPolicy>().unwrap(),
            RedispatchPolicy::ContinueInChain
        );
        assert_eq!(
            " Restart ".parse::<RedispatchPolicy>().unwrap(),
            RedispatchPolicy::RestartFromTop
        );
        assert!("sideways".parse::<RedispatchPolicy>().is_err());
        assert_eq!(RedispatchPolicy::ContinueInChain.to_string(), "continue-in-chain");
        assert_eq!(
            serde_json::to_value(RedispatchPolicy::RestartFromTop).unwrap(),
            serde_json::json!("restart-from-top")
        );
    }

    #[test]
    fn test_no_runtime_drops_validatable() {
        let (store, before, after) = store(RedispatchPolicy::default());

        let dispatched = store.dispatch(positive().create::<Unit<i32>>(5));
        assert_eq!(dispatched.changed(), Some(false));

        // Plain actions need no runtime
        assert_eq!(store.dispatch(Unit::new("num/reset", 0)).changed(), Some(true));
        assert_eq!(store.snapshot(), vec![("num/reset", 0)]);
        assert_eq!(*before.lock().unwrap(), vec!["num/set", "num/reset"]);
        assert_eq!(*after.lock().unwrap(), vec!["num/reset"]);
    }

    #[tokio::test]
    async fn test_plain_action_passes_through() {
        let (store, before, after) = store(RedispatchPolicy::default());

        let dispatched = store.dispatch(Unit::new("num/reset", 0));

        assert_eq!(dispatched.changed(), Some(true));
        assert_eq!(*before.lock().unwrap(), vec!["num/reset"]);
        assert_eq!(*after.lock().unwrap(), vec!["num/reset"]);
    }

    #[tokio::test]
    async fn test_valid_action_resumes_after_interceptor() {
        let (store, before, after) = store(RedispatchPolicy::RestartFromTop);

        let dispatched = store.dispatch(positive().create::<Unit<i32>>(5));
        assert!(dispatched.is_pending());
        assert!(store.snapshot().is_empty());

        assert!(dispatched.settled().await.unwrap());
        assert_eq!(store.snapshot(), vec![("num/set", 5)]);
        assert_eq!(*before.lock().unwrap(), vec!["num/set"]);
        assert_eq!(*after.lock().unwrap(), vec!["num/set"]);
    }

    #[tokio::test]
    async fn test_failure_restarts_from_top() {
        let (store, before, after) = store(RedispatchPolicy::RestartFromTop);

        store
            .dispatch(positive().create::<Unit<i32>>(-2))
            .settled()
            .await
            .unwrap();

        assert_eq!(store.snapshot(), vec![("num/set/invalid", -2)]);
        assert_eq!(*before.lock().unwrap(), vec!["num/set", "num/set/invalid"]);
        assert_eq!(*after.lock().unwrap(), vec!["num/set/invalid"]);
    }

    #[tokio::test]
    async fn test_failure_continues_in_chain() {
        let (store, before, after) = store(RedispatchPolicy::ContinueInChain);

        store
            .dispatch(positive().create::<Unit<i32>>(-2))
            .settled()
            .await
            .unwrap();

        assert_eq!(store.snapshot(), vec![("num/set/invalid", -2)]);
        assert_eq!(*before.lock().unwrap(), vec!["num/set"]);
        assert_eq!(*after.lock().unwrap(), vec!["num/set/invalid"]);
    }

    #[tokio::test]
    async fn test_concurrent_validations_all_settle() {
        let (store, _, _) = store(RedispatchPolicy::default());
        let creator = positive();

        let pending: Vec<_> = (-2..3)
            .map(|n| store.dispatch(creator.create::<Unit<i32>>(n)))
            .collect();
        for dispatched in pending {
            dispatched.settled().await.unwrap();
        }

        let mut reduced = store.snapshot();
        reduced.sort();
        assert_eq!(
            reduced,
            vec![
                ("num/set", 1),
                ("num/set", 2),
                ("num/set/invalid", -2),
                ("num/set/invalid", -1),
                ("num/set/invalid", 0),
            ]
        );
    }

    #[tokio::test]
    async fn test_panicking_predicate_aborts() {
        let creator = ValidatableCreator::<i32, i32>::new(
            ("num/set", "num/set/invalid"),
            ready(|_: &i32| -> Result<(), i32> { panic!("predicate blew up") }),
        )
        .unwrap();
        let (store, _, _) = store(RedispatchPolicy::default());

        let result = store.dispatch(creator.create::<Unit<i32>>(1)).settled().await;

        assert!(matches!(
            result,
            Err(crate::Error::Aborted { kind: "num/set", .. })
        ));
        assert!(store.snapshot().is_empty());
    }
}
