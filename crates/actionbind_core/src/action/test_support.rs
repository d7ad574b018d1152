//! Fixture type universe shared by unit tests.

use once_cell::sync::Lazy;

use crate::action::{Accessor, EngineObject, MethodBuilder, TypeBuilder, TypeIdentity, Value, builtin};

pub(crate) const MODULE: &str = "Fixture";

/// Identity of a fixture type by qualified name.
pub(crate) fn ty(name: &str) -> TypeIdentity {
	let short = name.rsplit('.').next().unwrap_or(name);
	TypeIdentity::new(short, format!("{name}, {MODULE}"))
}

pub(crate) fn prim(name: &str) -> TypeIdentity {
	TypeIdentity::builtin(name)
}

#[derive(Default)]
pub(crate) struct Calculator {
	pub total: i32,
	pub log: Vec<String>,
}

impl EngineObject for Calculator {}

#[derive(Default)]
pub(crate) struct Greeter {
	pub calls: Vec<String>,
}

impl EngineObject for Greeter {}

#[derive(Default)]
pub(crate) struct Failing;

impl EngineObject for Failing {}

#[derive(Default)]
pub(crate) struct Magnet {
	pub charge: i32,
}

impl EngineObject for Magnet {}

static INSTALLED: Lazy<()> = Lazy::new(register_all);

/// Register the fixture types once per test process.
pub(crate) fn install() {
	Lazy::force(&INSTALLED);
}

fn register_all() {
	let builders = [
		TypeBuilder::enumeration("fixture.Mood", MODULE, false, &[("Calm", 0), ("Happy", 1), ("Angry", 2)]),
		TypeBuilder::enumeration("fixture.Layers", MODULE, true, &[("None", 0), ("Ground", 1), ("Water", 2), ("Air", 4)]),
		TypeBuilder::class("fixture.Person", MODULE)
			.field("name", prim(builtin::STRING))
			.field("age", prim(builtin::I32))
			.field("home", prim(builtin::VECTOR3)),
		TypeBuilder::class("fixture.Student", MODULE)
			.base(ty("fixture.Person"))
			.field("name", prim(builtin::STRING))
			.field("age", prim(builtin::I32))
			.field("home", prim(builtin::VECTOR3))
			.field("school", prim(builtin::STRING)),
		TypeBuilder::class("fixture.Team", MODULE).field("lead", ty("fixture.Person")).field("mood", ty("fixture.Mood")),
		TypeBuilder::class("fixture.Boxed", MODULE).field("label", prim(builtin::STRING)).field("payload", prim(builtin::OBJECT)),
		TypeBuilder::class("fixture.Node", MODULE).field("value", prim(builtin::I32)).field("next", ty("fixture.Node")),
		TypeBuilder::object::<Calculator>("fixture.Calculator", MODULE)
			.method(
				MethodBuilder::new("Add")
					.param("a", prim(builtin::I32))
					.param("b", prim(builtin::I32))
					.returns(prim(builtin::I32))
					.instance(|calc: &mut Calculator, call| {
						let a = call.arg(0)?.as_i32().ok_or("a must be i32")?;
						let b = call.arg(1)?.as_i32().ok_or("b must be i32")?;
						calc.total = a + b;
						calc.log.push(format!("Add({a}, {b})"));
						Ok(Value::I32(calc.total))
					}),
			)
			.method(MethodBuilder::new("Reset").instance(|calc: &mut Calculator, _| {
				calc.total = 0;
				calc.log.push("Reset".to_owned());
				Ok(Value::Null)
			}))
			.method(MethodBuilder::new("get_Total").returns(prim(builtin::I32)).accessor(Accessor::Getter).instance(
				|calc: &mut Calculator, _| Ok(Value::I32(calc.total)),
			))
			.method(
				MethodBuilder::new("set_Total")
					.param("value", prim(builtin::I32))
					.accessor(Accessor::Setter)
					.instance(|calc: &mut Calculator, call| {
						calc.total = call.arg(0)?.as_i32().ok_or("value must be i32")?;
						Ok(Value::Null)
					}),
			)
			.method(
				MethodBuilder::new("AddLegacy")
					.param("a", prim(builtin::I32))
					.obsolete()
					.instance(|calc: &mut Calculator, call| {
						calc.total += call.arg(0)?.as_i32().ok_or("a must be i32")?;
						Ok(Value::Null)
					}),
			)
			.method(
				MethodBuilder::new("Describe")
					.param("value", prim(builtin::I32))
					.returns(prim(builtin::STRING))
					.static_fn(|call| Ok(Value::String(format!("value={}", call.arg(0)?.as_i32().unwrap_or_default())))),
			)
			.settable_field("total", prim(builtin::I32), |calc: &mut Calculator, value| {
				calc.total = value.as_i32().ok_or("total must be i32")?;
				calc.log.push(format!("total={}", calc.total));
				Ok(())
			}),
		TypeBuilder::object::<Greeter>("fixture.Greeter", MODULE)
			.method(
				MethodBuilder::new("Bar")
					.param("count", prim(builtin::I32))
					.instance(|greeter: &mut Greeter, call| record(greeter, format!("Bar(i32:{})", call.arg(0)?.as_i32().unwrap_or_default()))),
			)
			.method(
				MethodBuilder::new("Bar")
					.param("text", prim(builtin::STRING))
					.instance(|greeter: &mut Greeter, call| record(greeter, format!("Bar(string:{})", call.arg(0)?.as_str().unwrap_or_default()))),
			)
			.method(MethodBuilder::new("Greet").param("person", ty("fixture.Person")).instance(|greeter: &mut Greeter, call| {
				let name = match call.arg(0)? {
					Value::Struct(person) => person.get("name").and_then(Value::as_str).unwrap_or_default().to_owned(),
					_ => "nobody".to_owned(),
				};
				record(greeter, format!("Greet({name})"))
			}))
			.method(
				MethodBuilder::new("Foo")
					.generic_param("value", "T")
					.instance(|greeter: &mut Greeter, call| {
						let closed = call.type_args.first().map(|item| item.display_name().to_owned()).unwrap_or_default();
						record(greeter, format!("Foo<{closed}>"))
					}),
			)
			.method(
				MethodBuilder::new("Foo2")
					.param("value", prim(builtin::I32))
					.instance(|greeter: &mut Greeter, _| record(greeter, "Foo2(i32)".to_owned())),
			)
			.method(MethodBuilder::new("Paint").param("color", prim(builtin::COLOR)).instance(|greeter: &mut Greeter, call| {
				let red = call.arg(0)?.as_struct().and_then(|color| color.get("r")).and_then(Value::as_f32).unwrap_or_default();
				record(greeter, format!("Paint(r={red})"))
			}))
			.method(MethodBuilder::new("Follow").param("leader", prim(builtin::ENGINE_OBJECT)).instance(|greeter: &mut Greeter, call| {
				let leader = call.arg(0)?.as_object().map(|handle| handle.id().0).unwrap_or_default();
				record(greeter, format!("Follow(#{leader})"))
			}))
			.method(
				MethodBuilder::new("Echo")
					.param("text", prim(builtin::STRING))
					.returns(prim(builtin::STRING))
					.instance(|_: &mut Greeter, call| Ok(call.arg(0)?.clone())),
			),
		TypeBuilder::object::<Magnet>("fixture.Magnet", MODULE).method(
			MethodBuilder::new("Absorb")
				.param("other", prim(builtin::ENGINE_OBJECT))
				.returns(prim(builtin::I32))
				.instance(|magnet: &mut Magnet, call| {
					let other = call.arg(0)?.as_object().ok_or("other must be an object")?;
					let charge = other.try_with(|source: &Magnet| source.charge)?;
					magnet.charge += charge;
					Ok(Value::I32(magnet.charge))
				}),
		),
		TypeBuilder::object::<Failing>("fixture.Failing", MODULE).method(MethodBuilder::new("Explode").instance(|_: &mut Failing, _| Err("boom".into()))),
	];

	for builder in builders {
		builder.register().expect("fixture type registers");
	}
}

fn record(greeter: &mut Greeter, line: String) -> crate::action::CallResult {
	greeter.calls.push(line);
	Ok(Value::Null)
}
