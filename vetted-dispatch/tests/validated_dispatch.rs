//! End-to-end tests: creators, the validation middleware, and a store

use serde::Serialize;
use serde_json::json;
use vetted_dispatch::prelude::*;
use vetted_dispatch::testing::RecordingMiddleware;
use vetted_dispatch::{assert_emitted, assert_not_emitted, count_emitted, find_emitted};

#[derive(Clone, Debug, PartialEq, Serialize)]
struct Person {
    name: String,
    age: i32,
}

fn person(name: &str, age: i32) -> Person {
    Person {
        name: name.to_string(),
        age,
    }
}

#[derive(Action, Clone, Debug, PartialEq)]
enum PeopleAction {
    #[action(unit)]
    Add(Unit<Person>),
    #[action(unit)]
    AddInvalid(Unit<bool>),
    #[action(unit)]
    AddRejected(Unit<&'static str>),
    Clear,
}

/// Keeps every action that reached the reducer
fn terminal(state: &mut Vec<PeopleAction>, action: PeopleAction) -> bool {
    state.push(action);
    true
}

fn store() -> Store<Vec<PeopleAction>, PeopleAction> {
    Store::new(Vec::new(), terminal).with_middleware(ValidationMiddleware::new())
}

fn non_negative_age() -> ValidatableCreator<Person, bool> {
    ValidatableCreator::new(("add", "add/invalid"), ready(|p: &Person| p.age >= 0)).unwrap()
}

#[tokio::test]
async fn scenario_a_valid_payload_reaches_reducer() {
    let store = store();

    let changed = store
        .dispatch(non_negative_age().create::<PeopleAction>(person("Ada", 5)))
        .settled()
        .await
        .unwrap();

    assert!(changed);
    let reduced = store.snapshot();
    assert_eq!(reduced, vec![PeopleAction::Add(Unit::new("add", person("Ada", 5)))]);
    let PeopleAction::Add(unit) = &reduced[0] else {
        panic!("expected Add, got {:?}", reduced[0]);
    };
    assert_eq!(
        serde_json::to_value(unit).unwrap(),
        json!({ "type": "add", "payload": { "name": "Ada", "age": 5 } })
    );
}

#[tokio::test]
async fn scenario_a_false_becomes_failure_payload() {
    let store = store();

    store
        .dispatch(non_negative_age().create::<PeopleAction>(person("Ada", -1)))
        .settled()
        .await
        .unwrap();

    assert_eq!(
        store.snapshot(),
        vec![PeopleAction::AddInvalid(Unit::new("add/invalid", false))]
    );
}

#[tokio::test]
async fn scenario_b_async_error_becomes_failure_payload() {
    let creator = ValidatableCreator::<Person, &'static str>::new(
        ("add", "add/invalid"),
        |p: Person| async move {
            tokio::task::yield_now().await;
            if p.age < 0 {
                return Err("negative");
            }
            Ok(())
        },
    )
    .unwrap();
    let store = store();

    store
        .dispatch(creator.create::<PeopleAction>(person("Ada", -1)))
        .settled()
        .await
        .unwrap();

    let reduced = store.snapshot();
    assert_emitted!(reduced, PeopleAction::AddRejected(unit) if *unit.payload() == "negative");
    assert_not_emitted!(reduced, PeopleAction::Add(_));
    let failure = find_emitted!(reduced, PeopleAction::AddRejected(_)).unwrap();
    assert_eq!(failure.kind(), "add/invalid");
}

#[tokio::test]
async fn scenario_c_normalized_payload_replaces_original() {
    let creator = ValidatableCreator::<Person, bool>::new(("add", "add/invalid"), |p: Person| async move {
        let name = p.name.trim().to_string();
        Some(Person { name, ..p })
    })
    .unwrap();
    let store = store();

    store
        .dispatch(creator.create::<PeopleAction>(person(" Bob ", 30)))
        .settled()
        .await
        .unwrap();

    assert_eq!(
        store.snapshot(),
        vec![PeopleAction::Add(Unit::new("add", person("Bob", 30)))]
    );
}

#[tokio::test]
async fn plain_actions_pass_through_untouched() {
    let store = store();

    let dispatched = store.dispatch(PeopleAction::Clear);

    assert!(!dispatched.is_pending());
    assert_eq!(dispatched.changed(), Some(true));
    assert_eq!(store.snapshot(), vec![PeopleAction::Clear]);
}

#[tokio::test]
async fn extras_survive_validation() {
    let creator = ActionCreator::new("add")
        .with_extras(|p: &Person| {
            let mut extras = Extras::new();
            extras.insert("initial".into(), json!(p.name.chars().next()));
            extras
        })
        .validated_by::<bool, _>("add/invalid", ready(|p: &Person| p.age >= 0))
        .unwrap();
    let store = store();

    store
        .dispatch(creator.create::<PeopleAction>(person("Ada", 36)))
        .settled()
        .await
        .unwrap();

    let reduced = store.snapshot();
    let Some(PeopleAction::Add(unit)) = reduced.first() else {
        panic!("expected Add, got {reduced:?}");
    };
    assert_eq!(unit.extra("initial"), Some(&json!("A")));
}

#[tokio::test]
async fn restart_from_top_reenters_entry_only_on_failure() {
    let recorder = RecordingMiddleware::new();
    let entry = recorder.recording();
    let store = Store::new(Vec::new(), terminal)
        .with_middleware(recorder)
        .with_middleware(ValidationMiddleware::new());
    let creator = non_negative_age();

    store
        .dispatch(creator.create::<PeopleAction>(person("Ada", 5)))
        .settled()
        .await
        .unwrap();
    let passed = entry.drain();
    assert_eq!(count_emitted!(passed, PeopleAction::Add(_)), 1);
    assert_eq!(passed.len(), 1);

    store
        .dispatch(creator.create::<PeopleAction>(person("Ada", -1)))
        .settled()
        .await
        .unwrap();
    let failed = entry.drain();
    assert_eq!(failed.len(), 2);
    assert_emitted!(failed, PeopleAction::Add(_));
    assert_emitted!(failed, PeopleAction::AddInvalid(_));
}

#[tokio::test]
async fn continue_in_chain_never_reenters_entry() {
    let recorder = RecordingMiddleware::new();
    let entry = recorder.recording();
    let store = Store::new(Vec::new(), terminal)
        .with_middleware(recorder)
        .with_middleware(ValidationMiddleware::with_policy(
            RedispatchPolicy::ContinueInChain,
        ));

    store
        .dispatch(non_negative_age().create::<PeopleAction>(person("Ada", -1)))
        .settled()
        .await
        .unwrap();

    assert_eq!(entry.len(), 1);
    assert_eq!(
        store.snapshot(),
        vec![PeopleAction::AddInvalid(Unit::new("add/invalid", false))]
    );
}

#[tokio::test]
async fn validatable_without_interceptor_is_never_reduced() {
    let store = Store::new(Vec::new(), terminal);

    let dispatched = store.dispatch(non_negative_age().create::<PeopleAction>(person("Ada", 5)));

    assert_eq!(dispatched.changed(), Some(false));
    assert!(store.snapshot().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn many_pending_validations_settle_independently() {
    let store = store();
    let creator = ValidatableCreator::<Person, bool>::new(("add", "add/invalid"), |p: Person| async move {
        // Later dispatches finish first
        let delay = 20u64.saturating_sub(p.age.unsigned_abs() as u64);
        tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        p.age >= 0
    })
    .unwrap();

    let pending: Vec<_> = (-3..=3)
        .map(|age| store.dispatch(creator.create::<PeopleAction>(person("P", age))))
        .collect();
    assert!(pending.iter().all(Dispatched::is_pending));
    for dispatched in pending {
        dispatched.settled().await.unwrap();
    }

    let reduced = store.snapshot();
    assert_eq!(reduced.len(), 7);
    assert_eq!(count_emitted!(reduced, PeopleAction::Add(_)), 4);
    assert_eq!(count_emitted!(reduced, PeopleAction::AddInvalid(_)), 3);
}

#[test]
fn kind_collision_is_rejected() {
    let result = ValidatableCreator::<Person, bool>::new(("add", "add"), ready(|_: &Person| true));

    assert!(matches!(result, Err(Error::KindCollision { kind: "add" })));
}
