use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use parking_lot::ReentrantMutex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::action::ObjectAccessError;

/// Dynamic downcasting support for engine objects.
pub trait AsAny {
	/// Borrow as `Any`.
	fn as_any(&self) -> &dyn Any;
	/// Mutably borrow as `Any`.
	fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
	fn as_any(&self) -> &dyn Any {
		self
	}

	fn as_any_mut(&mut self) -> &mut dyn Any {
		self
	}
}

/// Object owned by the host engine. Entries reference it, never own it.
pub trait EngineObject: AsAny + Send + 'static {}

/// Stable identifier of an engine object, persisted in place of the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

pub(crate) struct LiveObject {
	name: Box<str>,
	state: ReentrantMutex<RefCell<Box<dyn EngineObject>>>,
}

/// Non-owning reference to an engine object.
///
/// Persists as its [`ObjectId`] alone. A freshly deserialized handle is detached
/// until [`ObjectHandle::attach`] re-links it to the live object graph.
#[derive(Clone)]
pub struct ObjectHandle {
	id: ObjectId,
	rust_type: Option<TypeId>,
	live: Weak<LiveObject>,
}

impl ObjectHandle {
	/// Handle carrying only an id, not linked to any live object.
	pub fn detached(id: ObjectId) -> Self {
		Self {
			id,
			rust_type: None,
			live: Weak::new(),
		}
	}

	/// Object identifier.
	pub fn id(&self) -> ObjectId {
		self.id
	}

	/// Concrete Rust type of the referenced object, known once attached.
	pub fn rust_type(&self) -> Option<TypeId> {
		self.rust_type
	}

	/// Whether the handle has been linked to a live object graph.
	pub fn is_attached(&self) -> bool {
		self.rust_type.is_some()
	}

	/// Whether the referenced object still exists.
	pub fn is_alive(&self) -> bool {
		self.live.strong_count() > 0
	}

	/// Host-assigned object name.
	pub fn name(&self) -> Option<String> {
		self.live.upgrade().map(|live| live.name.to_string())
	}

	/// Re-link against an object graph; unknown ids keep the handle as is.
	pub fn attach(&self, objects: &dyn ObjectResolver) -> Self {
		objects.resolve_object(self.id).unwrap_or_else(|| self.clone())
	}

	/// Run `f` with exclusive access to the object.
	///
	/// Fails instead of blocking when the object is already borrowed on this
	/// thread, e.g. by the member call it was passed into.
	pub fn try_with_mut<R>(&self, f: impl FnOnce(&mut dyn EngineObject) -> R) -> Result<R, ObjectAccessError> {
		let live = self.live.upgrade().ok_or(ObjectAccessError::Missing(self.id))?;
		let guard = live.state.lock();
		let mut state = guard.try_borrow_mut().map_err(|_| ObjectAccessError::Busy(self.id))?;
		let out = f(&mut **state);
		Ok(out)
	}

	/// Run `f` against the object downcast to `T`. Shared reads may nest.
	pub fn try_with<T: EngineObject, R>(&self, f: impl FnOnce(&T) -> R) -> Result<R, ObjectAccessError> {
		let live = self.live.upgrade().ok_or(ObjectAccessError::Missing(self.id))?;
		let guard = live.state.lock();
		let state = guard.try_borrow().map_err(|_| ObjectAccessError::Busy(self.id))?;
		let object = (**state).as_any().downcast_ref::<T>().ok_or(ObjectAccessError::WrongType {
			id: self.id,
			expected: std::any::type_name::<T>(),
		})?;
		let out = f(object);
		Ok(out)
	}

	/// [`ObjectHandle::try_with_mut`], discarding the failure reason.
	pub fn with_mut<R>(&self, f: impl FnOnce(&mut dyn EngineObject) -> R) -> Option<R> {
		self.try_with_mut(f).ok()
	}

	/// [`ObjectHandle::try_with`], discarding the failure reason.
	pub fn with<T: EngineObject, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
		self.try_with(f).ok()
	}
}

impl PartialEq for ObjectHandle {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl Eq for ObjectHandle {}

impl Hash for ObjectHandle {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id.hash(state);
	}
}

impl fmt::Debug for ObjectHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = if !self.is_attached() {
			"detached"
		} else if self.is_alive() {
			"alive"
		} else {
			"destroyed"
		};
		write!(f, "ObjectHandle({}, {state})", self.id)
	}
}

impl Serialize for ObjectHandle {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		self.id.serialize(serializer)
	}
}

impl<'de> Deserialize<'de> for ObjectHandle {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		ObjectId::deserialize(deserializer).map(Self::detached)
	}
}

/// External object graph lookup used when re-attaching persisted handles.
pub trait ObjectResolver {
	/// Live handle for `id`, if the object exists.
	fn resolve_object(&self, id: ObjectId) -> Option<ObjectHandle>;
}

/// Minimal host-side object graph: owns objects and hands out handles.
#[derive(Default)]
pub struct ObjectStore {
	objects: HashMap<ObjectId, (TypeId, Arc<LiveObject>)>,
	next_id: u64,
}

impl ObjectStore {
	/// Empty store.
	pub fn new() -> Self {
		Self::default()
	}

	/// Take ownership of `object` under a fresh id.
	pub fn spawn<T: EngineObject>(&mut self, name: &str, object: T) -> ObjectHandle {
		let mut next = self.next_id.max(1);
		while self.objects.contains_key(&ObjectId(next)) {
			next += 1;
		}
		self.spawn_with_id(ObjectId(next), name, object)
	}

	/// Take ownership of `object` under a caller-chosen id, replacing any previous owner.
	pub fn spawn_with_id<T: EngineObject>(&mut self, id: ObjectId, name: &str, object: T) -> ObjectHandle {
		let live = Arc::new(LiveObject {
			name: name.into(),
			state: ReentrantMutex::new(RefCell::new(Box::new(object))),
		});
		let rust_type = TypeId::of::<T>();
		let handle = ObjectHandle {
			id,
			rust_type: Some(rust_type),
			live: Arc::downgrade(&live),
		};
		self.objects.insert(id, (rust_type, live));
		self.next_id = self.next_id.max(id.0.saturating_add(1));
		handle
	}

	/// Handle for a stored object.
	pub fn handle(&self, id: ObjectId) -> Option<ObjectHandle> {
		let (rust_type, live) = self.objects.get(&id)?;
		Some(ObjectHandle {
			id,
			rust_type: Some(*rust_type),
			live: Arc::downgrade(live),
		})
	}

	/// Drop a stored object. Outstanding handles stop resolving.
	pub fn destroy(&mut self, id: ObjectId) -> bool {
		self.objects.remove(&id).is_some()
	}

	/// Number of stored objects.
	pub fn len(&self) -> usize {
		self.objects.len()
	}

	/// Whether the store is empty.
	pub fn is_empty(&self) -> bool {
		self.objects.is_empty()
	}

	/// Read a stored object downcast to `T`.
	pub fn get<T: EngineObject, R>(&self, id: ObjectId, f: impl FnOnce(&T) -> R) -> Option<R> {
		self.handle(id)?.with(f)
	}
}

impl ObjectResolver for ObjectStore {
	fn resolve_object(&self, id: ObjectId) -> Option<ObjectHandle> {
		self.handle(id)
	}
}
