use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::action::object::EngineObject;
use crate::action::resolve::MemberResolver;
use crate::action::{ActionError, Result, TargetError, Value};

/// Names of the types every universe starts with.
pub mod builtin {
	/// Boolean primitive.
	pub const BOOL: &str = "bool";
	/// 32-bit signed integer primitive.
	pub const I32: &str = "i32";
	/// 64-bit signed integer primitive.
	pub const I64: &str = "i64";
	/// 32-bit float primitive.
	pub const F32: &str = "f32";
	/// 64-bit float primitive.
	pub const F64: &str = "f64";
	/// UTF-8 string. Reference type, so it accepts null.
	pub const STRING: &str = "string";
	/// Universal reference root. Every non-null value is assignable to it.
	pub const OBJECT: &str = "object";
	/// Root of the external engine-object category.
	pub const ENGINE_OBJECT: &str = "engine.Object";
	/// Three-component float vector.
	pub const VECTOR3: &str = "engine.Vector3";
	/// Rotation quaternion, defaults to identity.
	pub const QUATERNION: &str = "engine.Quaternion";
	/// RGBA color, defaults to white.
	pub const COLOR: &str = "engine.Color";

	pub(crate) const CORE_MODULE: &str = "core";
	pub(crate) const ENGINE_MODULE: &str = "engine";
}

/// Result of a member body.
pub type CallResult = std::result::Result<Value, TargetError>;

pub(crate) type InstanceFn = Arc<dyn Fn(&mut dyn EngineObject, &Call<'_>) -> CallResult + Send + Sync>;
pub(crate) type StaticFn = Arc<dyn Fn(&Call<'_>) -> CallResult + Send + Sync>;
pub(crate) type FieldSetFn = Arc<dyn Fn(&mut dyn EngineObject, Value) -> std::result::Result<(), TargetError> + Send + Sync>;
pub(crate) type DefaultFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// Index of a registered type inside its universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(u32);

impl TypeKey {
	/// Raw registration index.
	pub fn index(self) -> u32 {
		self.0
	}
}

/// Serializable handle to a runtime type, resolved lazily by qualified name.
///
/// Equality and hashing go through the resolved type, so two identities naming the
/// same type through different but equivalent strings (module suffix, registered
/// alias) compare equal. Identities that do not resolve compare by their raw string.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeIdentity {
	display_name: Box<str>,
	qualified_name: Box<str>,
}

impl TypeIdentity {
	/// Build an identity from a display name and a qualified `"<name>, <module>"` string.
	pub fn new(display_name: impl Into<Box<str>>, qualified_name: impl Into<Box<str>>) -> Self {
		Self {
			display_name: display_name.into(),
			qualified_name: qualified_name.into(),
		}
	}

	/// Identity of a built-in type, e.g. `TypeIdentity::builtin(builtin::I32)`.
	pub fn builtin(name: &str) -> Self {
		let module = if name.starts_with("engine.") { builtin::ENGINE_MODULE } else { builtin::CORE_MODULE };
		Self::new(short_name(name), format!("{name}, {module}"))
	}

	/// Short name used for display.
	pub fn display_name(&self) -> &str {
		&self.display_name
	}

	/// Full persisted identifier.
	pub fn qualified_name(&self) -> &str {
		&self.qualified_name
	}

	/// Qualified name without the module suffix.
	pub fn type_name(&self) -> &str {
		normalize_name(&self.qualified_name)
	}

	/// Resolve against the process-wide universe.
	pub fn resolve(&self) -> Result<Arc<TypeDescriptor>> {
		universe().resolve(self)
	}

	/// Registration key when the identity resolves.
	pub fn key(&self) -> Option<TypeKey> {
		universe().key_of(self)
	}
}

impl PartialEq for TypeIdentity {
	fn eq(&self, other: &Self) -> bool {
		match (self.key(), other.key()) {
			(Some(left), Some(right)) => left == right,
			(None, None) => self.qualified_name == other.qualified_name,
			_ => false,
		}
	}
}

impl Eq for TypeIdentity {}

impl Hash for TypeIdentity {
	fn hash<H: Hasher>(&self, state: &mut H) {
		match self.key() {
			Some(key) => {
				state.write_u8(1);
				key.hash(state);
			}
			None => {
				state.write_u8(0);
				self.qualified_name.hash(state);
			}
		}
	}
}

impl fmt::Debug for TypeIdentity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "TypeIdentity({})", self.qualified_name)
	}
}

impl fmt::Display for TypeIdentity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.display_name)
	}
}

/// Primitive scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
	/// `bool`
	Bool,
	/// `i32`
	I32,
	/// `i64`
	I64,
	/// `f32`
	F32,
	/// `f64`
	F64,
	/// `string`
	String,
}

/// Enum layout: named values, optionally combinable as bit flags.
#[derive(Debug, Clone)]
pub struct EnumDef {
	/// Whether values combine as bit flags.
	pub flags: bool,
	/// Variant names and their values in declaration order.
	pub variants: Vec<(Box<str>, i64)>,
}

impl EnumDef {
	/// Look up a variant value by name.
	pub fn value_of(&self, name: &str) -> Option<i64> {
		self.variants.iter().find(|(item, _)| &**item == name).map(|(_, value)| *value)
	}

	/// Look up a variant name by exact value.
	pub fn name_of(&self, value: i64) -> Option<&str> {
		self.variants.iter().find(|(_, item)| *item == value).map(|(name, _)| &**name)
	}
}

/// One data field of a struct or class layout.
#[derive(Debug, Clone)]
pub struct DataField {
	/// Field name.
	pub name: Box<str>,
	/// Declared field type.
	pub ty: TypeIdentity,
}

/// Structural category of a type.
#[derive(Debug, Clone)]
pub enum TypeKind {
	/// Scalar primitive.
	Primitive(Primitive),
	/// Named integer values.
	Enum(EnumDef),
	/// Composite of data fields; value struct or reference class.
	Struct {
		/// Data fields in declaration order.
		fields: Vec<DataField>,
	},
	/// External engine object; never text-encoded.
	Object,
	/// The universal `object` root.
	Any,
}

/// Whether a method is a property accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessor {
	/// Property getter.
	Getter,
	/// Property setter.
	Setter,
}

/// Parameter type as declared on a live method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
	/// Closed parameter type.
	Concrete(TypeIdentity),
	/// Open generic parameter, indexing the method's generic parameter list.
	Generic(usize),
}

/// One declared parameter.
#[derive(Debug, Clone)]
pub struct ParamDescriptor {
	/// Parameter name.
	pub name: Box<str>,
	/// Declared type.
	pub ty: ParamType,
}

/// Arguments handed to a member body.
pub struct Call<'a> {
	/// Concrete types a generic method was closed over, in generic parameter order.
	pub type_args: &'a [TypeIdentity],
	/// Unpacked argument values in parameter order.
	pub args: &'a [Value],
}

impl Call<'_> {
	/// Argument at `idx`, or a target error naming the missing position.
	pub fn arg(&self, idx: usize) -> std::result::Result<&Value, TargetError> {
		self.args.get(idx).ok_or_else(|| format!("missing argument {idx}").into())
	}
}

#[derive(Clone)]
pub(crate) enum MethodBody {
	Instance(InstanceFn),
	Static(StaticFn),
}

/// Live method on a registered type.
#[derive(Clone)]
pub struct MethodDescriptor {
	/// Method name.
	pub name: Box<str>,
	/// Type the method is declared on.
	pub declaring: TypeIdentity,
	/// Static methods ignore the target object.
	pub is_static: bool,
	/// Generic parameter names; empty for non-generic methods.
	pub generic_params: Vec<Box<str>>,
	/// Declared parameters.
	pub params: Vec<ParamDescriptor>,
	/// Return type; `None` for methods without a return value.
	pub returns: Option<TypeIdentity>,
	/// Property accessor role, if any.
	pub accessor: Option<Accessor>,
	/// Marked deprecated.
	pub obsolete: bool,
	pub(crate) body: MethodBody,
}

impl MethodDescriptor {
	/// Whether the method declares generic parameters.
	pub fn is_generic(&self) -> bool {
		!self.generic_params.is_empty()
	}
}

impl fmt::Debug for MethodDescriptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MethodDescriptor")
			.field("name", &self.name)
			.field("declaring", &self.declaring)
			.field("is_static", &self.is_static)
			.field("generic_params", &self.generic_params)
			.field("params", &self.params)
			.field("returns", &self.returns)
			.finish_non_exhaustive()
	}
}

/// Settable member field on an engine-object type.
#[derive(Clone)]
pub struct FieldDescriptor {
	/// Field name.
	pub name: Box<str>,
	/// Type the field is declared on.
	pub declaring: TypeIdentity,
	/// Field type.
	pub ty: TypeIdentity,
	/// Marked deprecated.
	pub obsolete: bool,
	pub(crate) setter: FieldSetFn,
}

impl fmt::Debug for FieldDescriptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FieldDescriptor")
			.field("name", &self.name)
			.field("declaring", &self.declaring)
			.field("ty", &self.ty)
			.finish_non_exhaustive()
	}
}

/// Registered runtime type.
pub struct TypeDescriptor {
	key: TypeKey,
	name: Box<str>,
	qualified_name: Box<str>,
	module: Box<str>,
	kind: TypeKind,
	value_type: bool,
	base: Option<TypeIdentity>,
	aliases: Vec<Box<str>>,
	rust_type: Option<TypeId>,
	methods: Vec<MethodDescriptor>,
	fields: Vec<FieldDescriptor>,
	default: Option<DefaultFn>,
}

impl TypeDescriptor {
	/// Registration key.
	pub fn key(&self) -> TypeKey {
		self.key
	}

	/// Short display name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Qualified name without module suffix.
	pub fn qualified_name(&self) -> &str {
		&self.qualified_name
	}

	/// Owning module.
	pub fn module(&self) -> &str {
		&self.module
	}

	/// Structural category.
	pub fn kind(&self) -> &TypeKind {
		&self.kind
	}

	/// Value types require exact type matches and reject null.
	pub fn is_value_type(&self) -> bool {
		self.value_type
	}

	/// Whether values of this type are external engine objects.
	pub fn is_engine_object(&self) -> bool {
		matches!(self.kind, TypeKind::Object)
	}

	/// Direct base type.
	pub fn base(&self) -> Option<&TypeIdentity> {
		self.base.as_ref()
	}

	/// Alternate names that resolve to this type.
	pub fn aliases(&self) -> &[Box<str>] {
		&self.aliases
	}

	/// Methods declared on this type, in declaration order.
	pub fn methods(&self) -> &[MethodDescriptor] {
		&self.methods
	}

	/// Settable fields declared on this type, in declaration order.
	pub fn fields(&self) -> &[FieldDescriptor] {
		&self.fields
	}

	/// Data layout fields for struct and class types.
	pub fn data_fields(&self) -> &[DataField] {
		match &self.kind {
			TypeKind::Struct { fields } => fields,
			_ => &[],
		}
	}

	/// Persistable identity of this type.
	pub fn identity(&self) -> TypeIdentity {
		TypeIdentity::new(self.name.clone(), format!("{}, {}", self.qualified_name, self.module))
	}

	pub(crate) fn custom_default(&self) -> Option<Value> {
		self.default.as_ref().map(|make| make())
	}
}

impl fmt::Debug for TypeDescriptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TypeDescriptor")
			.field("key", &self.key)
			.field("qualified_name", &self.qualified_name)
			.field("module", &self.module)
			.field("kind", &self.kind)
			.field("value_type", &self.value_type)
			.field("base", &self.base)
			.field("methods", &self.methods.len())
			.field("fields", &self.fields.len())
			.finish()
	}
}

/// Method registration builder.
pub struct MethodBuilder {
	name: Box<str>,
	is_static: bool,
	generic_params: Vec<Box<str>>,
	params: Vec<ParamDescriptor>,
	returns: Option<TypeIdentity>,
	accessor: Option<Accessor>,
	obsolete: bool,
	body: MethodBody,
}

impl MethodBuilder {
	/// Start an instance method whose body does nothing and returns null.
	pub fn new(name: impl Into<Box<str>>) -> Self {
		Self {
			name: name.into(),
			is_static: false,
			generic_params: Vec::new(),
			params: Vec::new(),
			returns: None,
			accessor: None,
			obsolete: false,
			body: MethodBody::Instance(Arc::new(|_, _| Ok(Value::Null))),
		}
	}

	/// Declare a generic parameter.
	pub fn generic(mut self, name: impl Into<Box<str>>) -> Self {
		self.generic_params.push(name.into());
		self
	}

	/// Declare a parameter of a concrete type.
	pub fn param(mut self, name: impl Into<Box<str>>, ty: TypeIdentity) -> Self {
		self.params.push(ParamDescriptor {
			name: name.into(),
			ty: ParamType::Concrete(ty),
		});
		self
	}

	/// Declare a parameter typed by a generic parameter, declaring it if needed.
	pub fn generic_param(mut self, name: impl Into<Box<str>>, generic: &str) -> Self {
		let idx = match self.generic_params.iter().position(|item| &**item == generic) {
			Some(idx) => idx,
			None => {
				self.generic_params.push(generic.into());
				self.generic_params.len() - 1
			}
		};
		self.params.push(ParamDescriptor {
			name: name.into(),
			ty: ParamType::Generic(idx),
		});
		self
	}

	/// Declare the return type.
	pub fn returns(mut self, ty: TypeIdentity) -> Self {
		self.returns = Some(ty);
		self
	}

	/// Mark as a property accessor.
	pub fn accessor(mut self, accessor: Accessor) -> Self {
		self.accessor = Some(accessor);
		self
	}

	/// Mark as deprecated.
	pub fn obsolete(mut self) -> Self {
		self.obsolete = true;
		self
	}

	/// Instance body over a concrete object type.
	pub fn instance<T, F>(mut self, body: F) -> Self
	where
		T: EngineObject,
		F: Fn(&mut T, &Call<'_>) -> CallResult + Send + Sync + 'static,
	{
		let name = self.name.clone();
		self.is_static = false;
		self.body = MethodBody::Instance(Arc::new(move |target: &mut dyn EngineObject, call: &Call<'_>| {
			let target = (*target)
				.as_any_mut()
				.downcast_mut::<T>()
				.ok_or_else(|| -> TargetError { format!("{name}: target is not a {}", std::any::type_name::<T>()).into() })?;
			body(target, call)
		}));
		self
	}

	/// Instance body over any engine object, for methods declared on base types.
	pub fn instance_dyn<F>(mut self, body: F) -> Self
	where
		F: Fn(&mut dyn EngineObject, &Call<'_>) -> CallResult + Send + Sync + 'static,
	{
		self.is_static = false;
		self.body = MethodBody::Instance(Arc::new(body));
		self
	}

	/// Static body; the target object is not consulted.
	pub fn static_fn<F>(mut self, body: F) -> Self
	where
		F: Fn(&Call<'_>) -> CallResult + Send + Sync + 'static,
	{
		self.is_static = true;
		self.body = MethodBody::Static(Arc::new(body));
		self
	}

	fn build(self, declaring: &TypeIdentity) -> MethodDescriptor {
		MethodDescriptor {
			name: self.name,
			declaring: declaring.clone(),
			is_static: self.is_static,
			generic_params: self.generic_params,
			params: self.params,
			returns: self.returns,
			accessor: self.accessor,
			obsolete: self.obsolete,
			body: self.body,
		}
	}
}

struct PendingField {
	name: Box<str>,
	ty: TypeIdentity,
	obsolete: bool,
	setter: FieldSetFn,
}

/// Type registration builder.
pub struct TypeBuilder {
	qualified_name: Box<str>,
	module: Box<str>,
	kind: TypeKind,
	value_type: bool,
	base: Option<TypeIdentity>,
	aliases: Vec<Box<str>>,
	rust_type: Option<TypeId>,
	methods: Vec<MethodBuilder>,
	fields: Vec<PendingField>,
	default: Option<DefaultFn>,
}

impl TypeBuilder {
	fn new(qualified_name: &str, module: &str, kind: TypeKind, value_type: bool) -> Self {
		Self {
			qualified_name: qualified_name.into(),
			module: module.into(),
			kind,
			value_type,
			base: None,
			aliases: Vec::new(),
			rust_type: None,
			methods: Vec::new(),
			fields: Vec::new(),
			default: None,
		}
	}

	/// Primitive scalar type.
	pub fn primitive(qualified_name: &str, module: &str, primitive: Primitive) -> Self {
		let value_type = primitive != Primitive::String;
		Self::new(qualified_name, module, TypeKind::Primitive(primitive), value_type)
	}

	/// Enum value type; `flags` makes values combinable.
	pub fn enumeration(qualified_name: &str, module: &str, flags: bool, variants: &[(&str, i64)]) -> Self {
		let variants = variants.iter().map(|(name, value)| (Box::<str>::from(*name), *value)).collect();
		Self::new(qualified_name, module, TypeKind::Enum(EnumDef { flags, variants }), true)
	}

	/// Value struct: copied by value, exact-type assignment only.
	pub fn value_struct(qualified_name: &str, module: &str) -> Self {
		Self::new(qualified_name, module, TypeKind::Struct { fields: Vec::new() }, true)
	}

	/// Serializable reference class: nullable, subclassable.
	pub fn class(qualified_name: &str, module: &str) -> Self {
		Self::new(qualified_name, module, TypeKind::Struct { fields: Vec::new() }, false)
	}

	/// Engine-object type backed by the Rust type `T`.
	pub fn object<T: EngineObject>(qualified_name: &str, module: &str) -> Self {
		let mut builder = Self::object_base(qualified_name, module);
		builder.rust_type = Some(TypeId::of::<T>());
		builder
	}

	/// Engine-object type with no concrete Rust backing, used as a base.
	pub fn object_base(qualified_name: &str, module: &str) -> Self {
		let mut builder = Self::new(qualified_name, module, TypeKind::Object, false);
		builder.base = Some(TypeIdentity::builtin(builtin::ENGINE_OBJECT));
		builder
	}

	/// Set the direct base type.
	pub fn base(mut self, base: TypeIdentity) -> Self {
		self.base = Some(base);
		self
	}

	/// Register an alternate qualified name, e.g. the name before a rename.
	pub fn alias(mut self, name: &str) -> Self {
		self.aliases.push(name.into());
		self
	}

	/// Append a data field to a struct or class layout.
	pub fn field(mut self, name: &str, ty: TypeIdentity) -> Self {
		if let TypeKind::Struct { fields } = &mut self.kind {
			fields.push(DataField { name: name.into(), ty });
		}
		self
	}

	/// Declare a method.
	pub fn method(mut self, method: MethodBuilder) -> Self {
		self.methods.push(method);
		self
	}

	/// Declare a settable member field over a concrete object type.
	pub fn settable_field<T, F>(mut self, name: &str, ty: TypeIdentity, set: F) -> Self
	where
		T: EngineObject,
		F: Fn(&mut T, Value) -> std::result::Result<(), TargetError> + Send + Sync + 'static,
	{
		let field_name: Box<str> = name.into();
		let label = field_name.clone();
		self.fields.push(PendingField {
			name: field_name,
			ty,
			obsolete: false,
			setter: Arc::new(move |target: &mut dyn EngineObject, value: Value| {
				let target = (*target)
					.as_any_mut()
					.downcast_mut::<T>()
					.ok_or_else(|| -> TargetError { format!("{label}: target is not a {}", std::any::type_name::<T>()).into() })?;
				set(target, value)
			}),
		});
		self
	}

	/// Mark the most recently declared settable field as deprecated.
	pub fn obsolete_field(mut self) -> Self {
		if let Some(field) = self.fields.last_mut() {
			field.obsolete = true;
		}
		self
	}

	/// Override the value produced for newly selected parameters of this type.
	pub fn default_value<F>(mut self, make: F) -> Self
	where
		F: Fn() -> Value + Send + Sync + 'static,
	{
		self.default = Some(Arc::new(make));
		self
	}

	/// Register into the process-wide universe.
	pub fn register(self) -> Result<TypeIdentity> {
		universe().register(self)
	}
}

#[derive(Default)]
struct Registry {
	types: Vec<Arc<TypeDescriptor>>,
	by_name: HashMap<Box<str>, TypeKey>,
	by_rust: HashMap<TypeId, TypeKey>,
}

/// Append-only set of registered types plus the member-resolution cache.
pub struct TypeUniverse {
	registry: RwLock<Registry>,
	identities: RwLock<HashMap<Box<str>, Option<TypeKey>>>,
	resolver: MemberResolver,
}

static UNIVERSE: Lazy<TypeUniverse> = Lazy::new(TypeUniverse::with_builtins);

/// Process-wide type universe.
pub fn universe() -> &'static TypeUniverse {
	&UNIVERSE
}

const MAX_BASE_HOPS: usize = 64;

impl TypeUniverse {
	/// Universe holding only the built-in types.
	pub fn with_builtins() -> Self {
		let universe = Self {
			registry: RwLock::new(Registry::default()),
			identities: RwLock::new(HashMap::new()),
			resolver: MemberResolver::new(),
		};

		let core = builtin::CORE_MODULE;
		let engine = builtin::ENGINE_MODULE;
		let f32_ty = || TypeIdentity::builtin(builtin::F32);
		for builder in [
			TypeBuilder::primitive(builtin::BOOL, core, Primitive::Bool),
			TypeBuilder::primitive(builtin::I32, core, Primitive::I32),
			TypeBuilder::primitive(builtin::I64, core, Primitive::I64),
			TypeBuilder::primitive(builtin::F32, core, Primitive::F32),
			TypeBuilder::primitive(builtin::F64, core, Primitive::F64),
			TypeBuilder::primitive(builtin::STRING, core, Primitive::String),
			TypeBuilder::new(builtin::OBJECT, core, TypeKind::Any, false),
			TypeBuilder::new(builtin::ENGINE_OBJECT, engine, TypeKind::Object, false),
			TypeBuilder::value_struct(builtin::VECTOR3, engine)
				.field("x", f32_ty())
				.field("y", f32_ty())
				.field("z", f32_ty()),
			TypeBuilder::value_struct(builtin::QUATERNION, engine)
				.field("x", f32_ty())
				.field("y", f32_ty())
				.field("z", f32_ty())
				.field("w", f32_ty())
				.default_value(|| Value::structure(builtin::QUATERNION, [("x", 0.0_f32), ("y", 0.0), ("z", 0.0), ("w", 1.0)])),
			TypeBuilder::value_struct(builtin::COLOR, engine)
				.field("r", f32_ty())
				.field("g", f32_ty())
				.field("b", f32_ty())
				.field("a", f32_ty())
				.default_value(|| Value::structure(builtin::COLOR, [("r", 1.0_f32), ("g", 1.0), ("b", 1.0), ("a", 1.0)])),
		] {
			Self::insert(&mut universe.registry.write(), builder);
		}

		universe
	}

	/// Register a type. Fails when the name or an alias is already taken.
	pub fn register(&self, builder: TypeBuilder) -> Result<TypeIdentity> {
		let mut registry = self.registry.write();
		for name in std::iter::once(&builder.qualified_name).chain(builder.aliases.iter()) {
			if registry.by_name.contains_key(name) {
				return Err(ActionError::DuplicateType {
					qualified_name: name.to_string(),
				});
			}
		}

		let names: Vec<Box<str>> = std::iter::once(builder.qualified_name.clone()).chain(builder.aliases.iter().cloned()).collect();
		let identity = Self::insert(&mut registry, builder);
		drop(registry);

		// Earlier failed lookups of these names are stale now.
		self.identities.write().retain(|raw, key| key.is_some() || !names.iter().any(|name| &**name == normalize_name(raw)));
		// Cached keys hash parameter types by identity, which changes once a name resolves.
		self.resolver.clear();
		tracing::debug!(type_name = identity.type_name(), "registered type");
		Ok(identity)
	}

	fn insert(registry: &mut Registry, builder: TypeBuilder) -> TypeIdentity {
		let key = TypeKey(registry.types.len() as u32);
		let declaring = TypeIdentity::new(short_name(&builder.qualified_name), format!("{}, {}", builder.qualified_name, builder.module));
		let methods = builder.methods.into_iter().map(|method| method.build(&declaring)).collect();
		let fields = builder
			.fields
			.into_iter()
			.map(|field| FieldDescriptor {
				name: field.name,
				declaring: declaring.clone(),
				ty: field.ty,
				obsolete: field.obsolete,
				setter: field.setter,
			})
			.collect();

		let descriptor = TypeDescriptor {
			key,
			name: short_name(&builder.qualified_name).into(),
			qualified_name: builder.qualified_name,
			module: builder.module,
			kind: builder.kind,
			value_type: builder.value_type,
			base: builder.base,
			aliases: builder.aliases,
			rust_type: builder.rust_type,
			methods,
			fields,
			default: builder.default,
		};

		registry.by_name.insert(descriptor.qualified_name.clone(), key);
		for alias in &descriptor.aliases {
			registry.by_name.insert(alias.clone(), key);
		}
		if let Some(rust_type) = descriptor.rust_type {
			registry.by_rust.insert(rust_type, key);
		}
		registry.types.push(Arc::new(descriptor));
		declaring
	}

	/// Number of registered types.
	pub fn len(&self) -> usize {
		self.registry.read().types.len()
	}

	/// Whether nothing is registered.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Look up a type by qualified name or alias, with or without module suffix.
	pub fn lookup(&self, name: &str) -> Option<Arc<TypeDescriptor>> {
		let registry = self.registry.read();
		let key = registry.by_name.get(normalize_name(name))?;
		registry.types.get(key.0 as usize).cloned()
	}

	/// Look up a type by registration key.
	pub fn get(&self, key: TypeKey) -> Option<Arc<TypeDescriptor>> {
		self.registry.read().types.get(key.0 as usize).cloned()
	}

	/// Type registered for a concrete engine-object Rust type.
	pub fn type_of_rust(&self, rust_type: TypeId) -> Option<Arc<TypeDescriptor>> {
		let registry = self.registry.read();
		let key = registry.by_rust.get(&rust_type)?;
		registry.types.get(key.0 as usize).cloned()
	}

	/// Memoized key for an identity string.
	pub fn key_of(&self, identity: &TypeIdentity) -> Option<TypeKey> {
		if let Some(hit) = self.identities.read().get(identity.qualified_name()) {
			return *hit;
		}
		let key = self.lookup(identity.qualified_name()).map(|item| item.key);
		self.identities.write().insert(identity.qualified_name.clone(), key);
		key
	}

	/// Resolve an identity to its live descriptor.
	pub fn resolve(&self, identity: &TypeIdentity) -> Result<Arc<TypeDescriptor>> {
		self.key_of(identity).and_then(|key| self.get(key)).ok_or_else(|| ActionError::TypeNotFound {
			qualified_name: identity.qualified_name().to_owned(),
		})
	}

	/// Runtime type of a value; `None` for null.
	pub fn type_of(&self, value: &Value) -> Result<Option<Arc<TypeDescriptor>>> {
		let name = match value {
			Value::Null => return Ok(None),
			Value::Bool(_) => builtin::BOOL,
			Value::I32(_) => builtin::I32,
			Value::I64(_) => builtin::I64,
			Value::F32(_) => builtin::F32,
			Value::F64(_) => builtin::F64,
			Value::String(_) => builtin::STRING,
			Value::Enum(item) => &item.type_name,
			Value::Struct(item) => &item.type_name,
			Value::Object(handle) => {
				let found = handle.rust_type().and_then(|rust_type| self.type_of_rust(rust_type));
				return found.map(Some).ok_or_else(|| ActionError::TypeNotFound {
					qualified_name: format!("<unregistered object type for #{}>", handle.id()),
				});
			}
		};
		self.lookup(name).map(Some).ok_or_else(|| ActionError::TypeNotFound {
			qualified_name: name.to_owned(),
		})
	}

	/// Base chain starting at `ty` itself. Unresolvable bases end the chain.
	pub fn ancestry(&self, ty: &Arc<TypeDescriptor>) -> Vec<Arc<TypeDescriptor>> {
		let mut out = vec![ty.clone()];
		while out.len() < MAX_BASE_HOPS {
			let Some(base) = out.last().and_then(|item| item.base.clone()) else {
				break;
			};
			match self.resolve(&base) {
				Ok(next) if !out.iter().any(|item| item.key == next.key) => out.push(next),
				_ => break,
			}
		}
		out
	}

	/// Whether a value of type `actual` may be stored where `declared` is expected.
	pub fn is_assignable(&self, declared: &TypeDescriptor, actual: &Arc<TypeDescriptor>) -> bool {
		if declared.key == actual.key || matches!(declared.kind, TypeKind::Any) {
			return true;
		}
		if declared.value_type {
			return false;
		}
		self.ancestry(actual).iter().any(|item| item.key == declared.key)
	}

	/// Whether `value` may be stored where `declared` is expected.
	///
	/// Value types reject null and require the exact type; reference types accept
	/// null and any value whose type derives from `declared`.
	pub fn accepts(&self, declared: &TypeDescriptor, value: &Value) -> Result<bool> {
		match self.type_of(value)? {
			None => Ok(!declared.value_type),
			Some(actual) => Ok(self.is_assignable(declared, &actual)),
		}
	}

	/// Process-wide member resolution cache.
	pub fn resolver(&self) -> &MemberResolver {
		&self.resolver
	}
}

/// Strip the module suffix from a qualified identity string.
pub(crate) fn normalize_name(name: &str) -> &str {
	name.split(',').next().unwrap_or(name).trim()
}

fn short_name(qualified: &str) -> &str {
	let qualified = normalize_name(qualified);
	qualified.rsplit('.').next().unwrap_or(qualified)
}
