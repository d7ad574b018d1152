use std::sync::Arc;

use crate::action::test_support::{self, Calculator, Failing, Greeter, prim, ty};
use crate::action::{
	ActionError, DanglingReason, EngineObject, FieldSignature, MethodBuilder, TypeBuilder, MemberResolver, MemberSignature, MethodSignature, ObjectStore, ParameterSignature, Resolution,
	TypeDescriptor, TypeIdentity, Value, builtin, universe,
};

fn param(name: &str, ty: TypeIdentity, is_generic: bool) -> ParameterSignature {
	ParameterSignature {
		ty,
		name: name.into(),
		is_generic,
	}
}

fn method(owner: &str, name: &str, parameters: Vec<ParameterSignature>) -> MemberSignature {
	MemberSignature::Method(MethodSignature {
		declaring_type: ty(owner),
		name: name.into(),
		is_static: false,
		parameters,
	})
}

fn target(name: &str) -> Arc<TypeDescriptor> {
	test_support::install();
	ty(name).resolve().expect("fixture type resolves")
}

fn dangling_reason(resolution: Resolution) -> DanglingReason {
	match resolution {
		Resolution::Dangling(dangling) => dangling.reason,
		other => panic!("expected dangling, got {other:?}"),
	}
}

#[test]
fn add_binds_and_invokes() {
	let calc_ty = target("fixture.Calculator");
	let sig = method("fixture.Calculator", "Add", vec![param("a", prim(builtin::I32), false), param("b", prim(builtin::I32), false)]);
	let Resolution::Method(bound) = MemberResolver::new().resolve(&calc_ty, &sig) else {
		panic!("Add should bind");
	};

	let mut store = ObjectStore::new();
	let handle = store.spawn("calc", Calculator::default());
	let result = bound.invoke(Some(&handle), &[Value::I32(3), Value::I32(4)]).expect("Add succeeds");
	assert_eq!(result, Value::I32(7));
	assert_eq!(handle.with(|calc: &Calculator| calc.log.clone()), Some(vec!["Add(3, 4)".to_owned()]));
}

#[test]
fn overloads_bind_by_parameter_types() {
	let greeter_ty = target("fixture.Greeter");
	let resolver = MemberResolver::new();
	let mut store = ObjectStore::new();
	let handle = store.spawn("greeter", Greeter::default());

	let by_string = method("fixture.Greeter", "Bar", vec![param("text", prim(builtin::STRING), false)]);
	let Resolution::Method(bound) = resolver.resolve(&greeter_ty, &by_string) else {
		panic!("Bar(string) should bind");
	};
	bound.invoke(Some(&handle), &[Value::from("hello")]).expect("Bar(string) succeeds");

	let by_int = method("fixture.Greeter", "Bar", vec![param("count", prim(builtin::I32), false)]);
	let Resolution::Method(bound) = resolver.resolve(&greeter_ty, &by_int) else {
		panic!("Bar(i32) should bind");
	};
	bound.invoke(Some(&handle), &[Value::I32(2)]).expect("Bar(i32) succeeds");

	let calls = handle.with(|greeter: &Greeter| greeter.calls.clone()).expect("greeter alive");
	assert_eq!(calls, ["Bar(string:hello)", "Bar(i32:2)"]);
}

#[test]
fn generic_method_closes_over_stored_type() {
	let greeter_ty = target("fixture.Greeter");
	let sig = method("fixture.Greeter", "Foo", vec![param("value", ty("fixture.Person"), true)]);
	let Resolution::Method(bound) = MemberResolver::new().resolve(&greeter_ty, &sig) else {
		panic!("Foo<Person> should bind");
	};
	assert_eq!(bound.type_args(), [ty("fixture.Person")]);

	let mut store = ObjectStore::new();
	let handle = store.spawn("greeter", Greeter::default());
	bound.invoke(Some(&handle), &[Value::Null]).expect("Foo succeeds");
	assert_eq!(handle.with(|greeter: &Greeter| greeter.calls.clone()), Some(vec!["Foo<Person>".to_owned()]));

	let concrete = method("fixture.Greeter", "Foo", vec![param("value", ty("fixture.Person"), false)]);
	assert_eq!(dangling_reason(MemberResolver::new().resolve(&greeter_ty, &concrete)), DanglingReason::SignatureChanged);
}

#[test]
fn changed_signatures_dangle() {
	let greeter_ty = target("fixture.Greeter");
	let resolver = MemberResolver::new();

	let foo2 = method("fixture.Greeter", "Foo2", vec![param("value", prim(builtin::STRING), false)]);
	assert_eq!(dangling_reason(resolver.resolve(&greeter_ty, &foo2)), DanglingReason::SignatureChanged);

	let removed = method("fixture.Greeter", "Vanished", Vec::new());
	assert_eq!(dangling_reason(resolver.resolve(&greeter_ty, &removed)), DanglingReason::NoSuchMember);

	let unknown = method("fixture.Greeter", "Bar", vec![param("x", TypeIdentity::new("Gone", "resolve_test.Gone, Old"), false)]);
	assert!(matches!(dangling_reason(resolver.resolve(&greeter_ty, &unknown)), DanglingReason::TypeNotFound { .. }));

	let Resolution::Dangling(dangling) = resolver.resolve(&greeter_ty, &removed) else {
		panic!("still dangling");
	};
	assert_eq!(dangling.member, "Greeter.Vanished()");
}

#[test]
fn fields_bind_by_name_and_type() {
	let calc_ty = target("fixture.Calculator");
	let resolver = MemberResolver::new();
	let total = MemberSignature::Field(FieldSignature {
		declaring_type: ty("fixture.Calculator"),
		name: "total".into(),
		field_type: prim(builtin::I32),
	});
	let Resolution::Field(bound) = resolver.resolve(&calc_ty, &total) else {
		panic!("total should bind");
	};

	let mut store = ObjectStore::new();
	let handle = store.spawn("calc", Calculator::default());
	bound.set(&handle, Value::I32(11)).expect("set succeeds");
	assert_eq!(handle.with(|calc: &Calculator| calc.total), Some(11));

	let retyped = MemberSignature::Field(FieldSignature {
		declaring_type: ty("fixture.Calculator"),
		name: "total".into(),
		field_type: prim(builtin::F32),
	});
	assert!(matches!(dangling_reason(resolver.resolve(&calc_ty, &retyped)), DanglingReason::FieldTypeChanged { ref actual } if actual == "i32, core"));
}

#[test]
fn static_methods_ignore_target() {
	let calc_ty = target("fixture.Calculator");
	let sig = MemberSignature::Method(MethodSignature {
		declaring_type: ty("fixture.Calculator"),
		name: "Describe".into(),
		is_static: true,
		parameters: vec![param("value", prim(builtin::I32), false)],
	});
	let Resolution::Method(bound) = MemberResolver::new().resolve(&calc_ty, &sig) else {
		panic!("Describe should bind");
	};
	assert!(bound.is_static());
	assert_eq!(bound.invoke(None, &[Value::I32(5)]).expect("Describe succeeds"), Value::from("value=5"));
}

#[test]
fn resolutions_are_cached_per_type_and_signature() {
	let calc_ty = target("fixture.Calculator");
	let resolver = MemberResolver::new();
	assert!(resolver.is_empty());

	let reset = method("fixture.Calculator", "Reset", Vec::new());
	resolver.resolve(&calc_ty, &reset);
	resolver.resolve(&calc_ty, &reset);
	assert_eq!(resolver.len(), 1);

	let greeter_ty = target("fixture.Greeter");
	resolver.resolve(&greeter_ty, &reset);
	assert_eq!(resolver.len(), 2, "same signature on another type is a separate entry");
}

#[test]
fn invocation_errors_surface() {
	let failing_ty = target("fixture.Failing");
	let explode = method("fixture.Failing", "Explode", Vec::new());
	let Resolution::Method(bound) = MemberResolver::new().resolve(&failing_ty, &explode) else {
		panic!("Explode should bind");
	};

	let mut store = ObjectStore::new();
	let handle = store.spawn("failing", Failing);
	let err = bound.invoke(Some(&handle), &[]).expect_err("body fails");
	let source = err.into_target_error().expect("target error");
	assert_eq!(source.to_string(), "boom");

	let err = bound.invoke(Some(&handle), &[Value::I32(1)]).expect_err("too many arguments");
	assert!(matches!(err, ActionError::ArgumentCount { expected: 0, got: 1, .. }));

	store.destroy(handle.id());
	let err = bound.invoke(Some(&handle), &[]).expect_err("destroyed target");
	assert!(matches!(err, ActionError::Target { .. }));
}

struct LateHost;

impl EngineObject for LateHost {}

#[test]
fn registering_a_type_drops_stale_resolutions() {
	let gadget = TypeIdentity::new("Gadget", "late.Gadget, Late");
	TypeBuilder::object::<LateHost>("late.Host", "Late")
		.method(MethodBuilder::new("Take").param("item", gadget.clone()).instance(|_: &mut LateHost, _| Ok(Value::Null)))
		.register()
		.expect("host registers");
	let host = TypeIdentity::new("Host", "late.Host, Late").resolve().expect("host resolves");
	let sig = MemberSignature::Method(MethodSignature {
		declaring_type: host.identity(),
		name: "Take".into(),
		is_static: false,
		parameters: vec![param("item", gadget, false)],
	});
	let resolver = universe().resolver();

	assert_eq!(
		dangling_reason(resolver.resolve(&host, &sig)),
		DanglingReason::TypeNotFound {
			qualified_name: "late.Gadget, Late".to_owned()
		}
	);

	TypeBuilder::class("late.Gadget", "Late").register().expect("gadget registers");
	let stale = resolver.cached_dangling().into_iter().filter(|dangling| dangling.member.contains("Gadget")).count();
	assert_eq!(stale, 0, "no resolution cached against the unregistered name survives");
	assert!(matches!(resolver.resolve(&host, &sig), Resolution::Method(_)));
}
