use serde_json::json;

use crate::action::test_support::{self, prim, ty};
use crate::action::{ActionError, FieldSignature, MemberSignature, MethodSignature, builtin};

fn method(type_name: &str, name: &str, params: usize) -> crate::action::MethodDescriptor {
	let owner = ty(type_name).resolve().expect("fixture type resolves");
	owner
		.methods()
		.iter()
		.find(|item| &*item.name == name && item.params.len() == params)
		.cloned()
		.expect("fixture method exists")
}

#[test]
fn capture_records_declared_parameters() {
	test_support::install();
	let add = MethodSignature::capture(&method("fixture.Calculator", "Add", 2), &[]).expect("add captures");
	assert_eq!(add.declaring_type, ty("fixture.Calculator"));
	assert!(!add.is_static);
	assert!(!add.is_generic());
	let names: Vec<&str> = add.parameters.iter().map(|param| &*param.name).collect();
	assert_eq!(names, ["a", "b"]);
	assert!(add.parameters.iter().all(|param| param.ty == prim(builtin::I32)));

	let describe = MethodSignature::capture(&method("fixture.Calculator", "Describe", 1), &[]).expect("describe captures");
	assert!(describe.is_static);
}

#[test]
fn generic_capture_needs_type_arguments() {
	test_support::install();
	let foo = method("fixture.Greeter", "Foo", 1);
	let err = MethodSignature::capture(&foo, &[]).expect_err("open generic");
	assert!(matches!(err, ActionError::GenericArgumentCount { expected: 1, got: 0, .. }));

	let closed = MethodSignature::capture(&foo, &[ty("fixture.Person")]).expect("closed generic");
	assert!(closed.is_generic());
	assert_eq!(closed.parameters[0].ty, ty("fixture.Person"));
	assert!(closed.parameters[0].is_generic);
}

#[test]
fn close_fills_generic_positions() {
	test_support::install();
	let open = MethodSignature::capture(&method("fixture.Greeter", "Foo", 1), &[prim(builtin::OBJECT)]).expect("placeholder capture");
	let closed = open.close(&[prim(builtin::STRING)]).expect("close with string");
	assert_eq!(closed.parameters[0].ty, prim(builtin::STRING));
	assert_ne!(open, closed);

	let err = open.close(&[]).expect_err("missing type argument");
	assert!(matches!(err, ActionError::GenericArgumentCount { expected: 1, got: 0, .. }));
}

#[test]
fn equality_ignores_parameter_names() {
	test_support::install();
	let add = MethodSignature::capture(&method("fixture.Calculator", "Add", 2), &[]).expect("add captures");
	let mut renamed = add.clone();
	renamed.parameters[0].name = "left".into();
	assert_eq!(add, renamed);

	let mut retyped = add.clone();
	retyped.parameters[1].ty = prim(builtin::I64);
	assert_ne!(add, retyped);

	let mut made_static = add.clone();
	made_static.is_static = true;
	assert_ne!(add, made_static);
}

#[test]
fn persisted_shape_round_trips() {
	test_support::install();
	let add: MemberSignature = MethodSignature::capture(&method("fixture.Calculator", "Add", 2), &[]).expect("add captures").into();
	let json = serde_json::to_value(&add).expect("method serializes");
	assert_eq!(json["isMethod"], true);
	assert_eq!(json["name"], "Add");
	assert_eq!(json["parameters"][1]["type"]["qualifiedName"], "i32, core");
	assert_eq!(json["parameters"][1]["isGeneric"], false);
	assert!(json.get("fieldType").is_none());
	let back: MemberSignature = serde_json::from_value(json).expect("method deserializes");
	assert_eq!(back, add);

	let field: MemberSignature = FieldSignature {
		declaring_type: ty("fixture.Calculator"),
		name: "total".into(),
		field_type: prim(builtin::I32),
	}
	.into();
	let json = serde_json::to_value(&field).expect("field serializes");
	assert_eq!(json["isMethod"], false);
	assert_eq!(json["fieldType"]["displayName"], "i32");
	let back: MemberSignature = serde_json::from_value(json).expect("field deserializes");
	assert_eq!(back, field);
	assert_eq!(back.arity(), 1);
}

#[test]
fn field_record_without_type_is_invalid() {
	let record = json!({
		"isMethod": false,
		"declaringType": { "displayName": "Calculator", "qualifiedName": "fixture.Calculator, Fixture" },
		"name": "total",
	});
	let err = serde_json::from_value::<MemberSignature>(record).expect_err("missing fieldType");
	assert!(err.to_string().contains("no fieldType"), "{err}");
}

#[test]
fn display_names_member_and_parameters() {
	test_support::install();
	let add: MemberSignature = MethodSignature::capture(&method("fixture.Calculator", "Add", 2), &[]).expect("add captures").into();
	assert_eq!(add.to_string(), "Calculator.Add(i32, i32)");

	let foo: MemberSignature = MethodSignature::capture(&method("fixture.Greeter", "Foo", 1), &[ty("fixture.Person")])
		.expect("foo captures")
		.into();
	assert_eq!(foo.to_string(), "Greeter.Foo(<Person>)");

	let field = MemberSignature::Field(FieldSignature {
		declaring_type: ty("fixture.Calculator"),
		name: "total".into(),
		field_type: prim(builtin::I32),
	});
	assert_eq!(field.to_string(), "Calculator.total: i32");
}
