#![allow(missing_docs)]

use std::sync::OnceLock;

use actionbind::action::{
	ActionList, EngineObject, EntryState, IssueKind, MemberFilter, MethodBuilder, ObjectId, ObjectStore, Outcome, RunMode, Skip, TypeBuilder, TypeIdentity,
	Value, builtin, list_invocable_members,
};
use actionbind_testkit::{fixture_json, fixture_path};

#[derive(Default)]
struct Counter {
	value: i32,
	log: Vec<String>,
}

impl EngineObject for Counter {}

fn counter_type() -> TypeIdentity {
	static COUNTER: OnceLock<TypeIdentity> = OnceLock::new();
	COUNTER
		.get_or_init(|| {
			let int = TypeIdentity::builtin(builtin::I32);
			TypeBuilder::object::<Counter>("demo.Counter", "Demo")
				.method(
					MethodBuilder::new("Add")
						.param("a", int.clone())
						.param("b", int.clone())
						.returns(int.clone())
						.instance(|counter: &mut Counter, call| {
							let a = call.arg(0)?.as_i32().ok_or("a must be i32")?;
							let b = call.arg(1)?.as_i32().ok_or("b must be i32")?;
							counter.value += a + b;
							counter.log.push(format!("Add({a}, {b})"));
							Ok(Value::I32(counter.value))
						}),
				)
				.method(MethodBuilder::new("Reset").instance(|counter: &mut Counter, _| {
					counter.value = 0;
					counter.log.push("Reset".to_owned());
					Ok(Value::Null)
				}))
				.method(
					MethodBuilder::new("Follow")
						.param("leader", TypeIdentity::builtin(builtin::ENGINE_OBJECT))
						.instance(|counter: &mut Counter, call| {
							let leader = call.arg(0)?.as_object().ok_or("leader must be an object")?;
							counter.log.push(format!("Follow({})", leader.name().unwrap_or_default()));
							Ok(Value::Null)
						}),
				)
				.settable_field("value", int, |counter: &mut Counter, value| {
					counter.value = value.as_i32().ok_or("value must be i32")?;
					Ok(())
				})
				.register()
				.expect("demo.Counter registers")
		})
		.clone()
}

fn scene() -> ObjectStore {
	counter_type();
	let mut store = ObjectStore::new();
	store.spawn_with_id(ObjectId(1), "main", Counter::default());
	store.spawn_with_id(ObjectId(2), "leader", Counter::default());
	store
}

fn counter_log(store: &ObjectStore, id: u64) -> Vec<String> {
	store.get(ObjectId(id), |counter: &Counter| counter.log.clone()).expect("counter alive")
}

#[test]
fn persisted_list_reattaches_and_invokes_in_order() {
	let store = scene();
	let mut list = ActionList::load(fixture_path("counter_actions.json")).expect("fixture loads");
	assert_eq!(list.len(), 5);

	list.attach(&store);
	assert_eq!(list.prepare(), 1, "Multiply no longer exists");
	assert_eq!(list.get(2).map(|entry| entry.state()), Some(EntryState::Dangling));

	let outcomes = list.invoke_in(RunMode::Live).expect("list invokes");
	assert_eq!(
		outcomes,
		[
			Outcome::Invoked(Value::I32(7)),
			Outcome::Skipped(Skip::Disabled),
			Outcome::Skipped(Skip::Dangling),
			Outcome::Invoked(Value::Null),
			Outcome::Invoked(Value::Null),
		]
	);
	assert_eq!(counter_log(&store, 1), ["Add(3, 4)", "Follow(leader)"]);
	assert_eq!(store.get(ObjectId(2), |counter: &Counter| counter.value), Some(40));
}

#[test]
fn runtime_only_entries_wait_for_live_mode() {
	let store = scene();
	let mut list = ActionList::load(fixture_path("counter_actions.json")).expect("fixture loads");
	list.attach(&store);

	let outcomes = list.invoke_in(RunMode::Edit).expect("list invokes");
	assert_eq!(outcomes[4], Outcome::Skipped(Skip::NotLive));
	assert_eq!(counter_log(&store, 1), ["Add(3, 4)"]);
}

#[test]
fn unattached_list_skips_instance_members() {
	counter_type();
	let list = ActionList::load(fixture_path("counter_actions.json")).expect("fixture loads");
	let outcomes = list.invoke_in(RunMode::Live).expect("list invokes");
	assert_eq!(outcomes[0], Outcome::Skipped(Skip::TargetMissing));
	assert_eq!(outcomes[1], Outcome::Skipped(Skip::Disabled));
}

#[test]
fn saved_list_matches_fixture_shape() {
	let store = scene();
	let mut list = ActionList::load(fixture_path("counter_actions.json")).expect("fixture loads");
	list.attach(&store);

	let saved: serde_json::Value = serde_json::from_str(&list.to_json().expect("list serializes")).expect("saved list is json");
	let fixture = fixture_json("counter_actions.json");
	for idx in 0..5 {
		let saved_entry = &saved["actions"][idx];
		let fixture_entry = &fixture["actions"][idx];
		assert_eq!(saved_entry["targetObjectHandle"], fixture_entry["targetObjectHandle"]);
		assert_eq!(saved_entry["callState"], fixture_entry["callState"]);
		assert_eq!(saved_entry["target"]["name"], fixture_entry["target"]["name"]);
	}
	assert_eq!(saved["actions"][4]["arguments"][0]["liveRefHandle"], 2);
}

#[test]
fn broken_fixture_reports_structural_issues() {
	let list = ActionList::load(fixture_path("broken_actions.json")).expect("fixture loads");
	let issues = list.structural_issues();
	let kinds: Vec<(usize, &IssueKind)> = issues.iter().map(|issue| (issue.entry, &issue.kind)).collect();

	assert!(kinds.contains(&(0, &IssueKind::NoTargetObject)));
	assert!(kinds.contains(&(0, &IssueKind::ArgumentCount { expected: 2, got: 1 })));
	assert!(kinds.iter().any(|(entry, kind)| *entry == 0 && matches!(kind, IssueKind::ArgumentType { index: 0, .. })));
	assert!(kinds.iter().any(|(entry, kind)| *entry == 1 && matches!(kind, IssueKind::MalformedText { index: 0, .. })));
	assert!(kinds.contains(&(2, &IssueKind::NoMember)));
	assert_eq!(issues.len(), 5);
}

#[test]
fn registered_counter_lists_its_members() {
	let counter = counter_type();
	let members = list_invocable_members(&counter, MemberFilter::DEFAULT | MemberFilter::INCLUDE_FIELDS).expect("members list");
	let names: Vec<&str> = members.iter().map(|member| member.name()).collect();
	assert_eq!(names, ["Add", "Reset", "Follow", "value"]);
}
