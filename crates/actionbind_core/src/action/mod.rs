mod argument;
mod codec;
mod defaults;
mod entry;
mod error;
mod list;
mod lister;
mod member;
mod object;
mod resolve;
mod types;
mod value;

#[cfg(test)]
mod test_support;

/// Persisted argument slot.
pub use argument::ArgumentSlot;
/// Structural value codec and its limits.
pub use codec::{CodecOptions, ValueSnapshot, decode, encode};
/// Default value synthesis for newly selected parameter types.
pub use defaults::default_value_for;
/// Single configured invocation and its gates.
pub use entry::{ActionEntry, CallState, EntryState, Outcome, RunMode, Skip};
/// Error and result aliases.
pub use error::{ActionError, ObjectAccessError, Result, TargetError};
/// Ordered invocation list and document checks.
pub use list::{ActionList, IssueKind, StructuralIssue};
/// Member enumeration for authoring tools.
pub use lister::{MemberFilter, list_invocable_members};
/// Persisted member references.
pub use member::{FieldSignature, MemberSignature, MethodSignature, ParameterSignature};
/// External object graph handles.
pub use object::{AsAny, EngineObject, ObjectHandle, ObjectId, ObjectResolver, ObjectStore};
/// Member resolution and bound callables.
pub use resolve::{BoundField, BoundMethod, Dangling, DanglingReason, MemberResolver, Resolution};
/// Type universe and registration builders.
pub use types::{
	Accessor, Call, CallResult, DataField, EnumDef, FieldDescriptor, MethodBuilder, MethodDescriptor, ParamDescriptor, ParamType, Primitive, TypeBuilder, TypeDescriptor,
	TypeIdentity, TypeKey, TypeKind, TypeUniverse, builtin, universe,
};
/// Runtime value tree.
pub use value::{EnumValue, FieldValue, StructValue, Value};
