//! Field and record descriptors, and the process-lifetime descriptor cache.
//!
//! A [`Record`] impl is the meeting point with the two external
//! collaborators the engine depends on: the field discovery provider
//! ([`Record::fields`], invoked at most once per type) and the instance
//! factory ([`Record::empty`]). Ordering, caching, extraction, and
//! assignment are all handled here.
//!
//! Field order is significant: neither field count nor field names are
//! written to the wire, so encoder and decoder walk the same cached
//! descriptor and order/arity are implied, not encoded. Once a descriptor
//! is published for a type it is never mutated; concurrent first-time
//! construction is idempotent and safe to race.

use crate::{errors::Error, tag::Kind, Value};
use hashbrown::HashMap;
use once_cell::sync::Lazy;
use std::{
    any::{Any, TypeId},
    cell::RefCell,
    sync::RwLock,
};

/// The type-erased half of a descriptor: field names and declared kinds in
/// order, without accessors. This is what nested-record fields point at and
/// what the size calculator, encoder, and decoder walk.
#[derive(Debug)]
pub struct Shape {
    /// Record type name, used in diagnostics only.
    pub name: &'static str,
    /// `(field name, declared kind)` in declared order.
    pub fields: Vec<(&'static str, Kind)>,
}

/// A single field of a record type: name, declared kind, and get/set
/// accessors against an owning instance. Immutable once constructed.
pub struct Field<R> {
    pub name: &'static str,
    pub kind: Kind,
    /// Reads the field's current value. `None` means the value is absent,
    /// which fails the whole encode with a value error naming this field.
    pub get: fn(&R) -> Option<Value>,
    /// Assigns a decoded value through to the instance. Returns the value's
    /// rejection on a variant mismatch so the caller can report it.
    pub set: fn(&mut R, Value) -> Result<(), SetError>,
}

// manual impls: derive would put bounds on R
impl<R> Clone for Field<R> {
    fn clone(&self) -> Field<R> {
        Field {
            name: self.name,
            kind: self.kind,
            get: self.get,
            set: self.set,
        }
    }
}

impl<R> std::fmt::Debug for Field<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

/// The ordered, cached description of one record type's fields.
#[derive(Debug)]
pub struct Descriptor<R> {
    pub shape: Shape,
    pub fields: Vec<Field<R>>,
}

/// A rejected assignment inside a `set` accessor.
#[derive(Debug)]
pub enum SetError {
    /// The value's variant does not match the field's declared kind. The
    /// value is handed back for reporting.
    Mismatch(Value),
    /// A nested record failed to assemble; carries the inner failure.
    Nested(Error),
}

impl From<Value> for SetError {
    fn from(v: Value) -> SetError {
        SetError::Mismatch(v)
    }
}

impl From<Error> for SetError {
    fn from(e: Error) -> SetError {
        SetError::Nested(e)
    }
}

impl SetError {
    /// Attributes the rejection to a field at a buffer offset.
    pub fn into_error(self, field: &'static str, kind: Kind, offset: usize) -> Error {
        match self {
            SetError::Mismatch(v) => Error::structural(
                field,
                kind,
                offset,
                format!("cannot assign a {} value", v.kind_name()),
            ),
            SetError::Nested(e) => e,
        }
    }
}

/// A type that can be encoded and decoded as a record.
///
/// `fields` and `empty` are the external collaborator hooks; the provided
/// methods are the engine's view. See the crate docs for a worked impl.
pub trait Record: Sized + 'static {
    /// Record type name, used in shapes and diagnostics.
    fn name() -> &'static str;

    /// The field discovery hook: ordered field descriptors for this type.
    /// Treated as a pure function and invoked at most once per process;
    /// the result is cached for the process lifetime.
    fn fields() -> Vec<Field<Self>>;

    /// The instance factory: a fresh, zero-value instance for the decoder
    /// to populate.
    fn empty() -> Self;

    /// The cached descriptor for this type, built on first use.
    fn descriptor() -> &'static Descriptor<Self> {
        cached::<Self>()
    }

    /// The cached type-erased shape for this type.
    fn shape() -> &'static Shape {
        &Self::descriptor().shape
    }

    /// Extracts every field's value in declared order. An absent value
    /// fails the extraction with a value error naming the field.
    fn to_values(&self) -> Result<Vec<Value>, Error> {
        let desc = Self::descriptor();
        let mut out = Vec::with_capacity(desc.fields.len());
        for f in &desc.fields {
            match (f.get)(self) {
                Some(v) => out.push(v),
                None => return Err(Error::value(f.name, 0, "required field value is absent")),
            }
        }
        Ok(out)
    }

    /// Extracts this record as a [`Value::Record`], for use in the `get`
    /// accessor of a nesting field. `None` if any inner value is absent.
    fn to_value(&self) -> Option<Value> {
        self.to_values().ok().map(Value::Record)
    }

    /// Builds an instance from values in declared order, assigning each
    /// through its `set` accessor.
    fn of_values(values: Vec<Value>) -> Result<Self, Error> {
        let desc = Self::descriptor();
        if values.len() != desc.fields.len() {
            return Err(Error::structural(
                desc.shape.name,
                Kind::Unknown,
                0,
                format!(
                    "expected {} field values, got {}",
                    desc.fields.len(),
                    values.len()
                ),
            ));
        }
        let mut rec = Self::empty();
        for (f, v) in desc.fields.iter().zip(values) {
            (f.set)(&mut rec, v).map_err(|e| e.into_error(f.name, f.kind, 0))?;
        }
        Ok(rec)
    }

    /// Builds an instance from a [`Value::Record`], for use in the `set`
    /// accessor of a nesting field.
    fn of_value(value: Value) -> Result<Self, SetError> {
        match value {
            Value::Record(values) => Self::of_values(values).map_err(SetError::Nested),
            other => Err(SetError::Mismatch(other)),
        }
    }
}

/// The declared kind for a field nesting a record of type `S`.
///
/// Self-referential record types cannot be laid out (their encoded size
/// would be infinite), so a nesting edge that closes a cycle degrades to
/// [`Kind::Unknown`]: the descriptor still builds, and the first encode or
/// decode of the cyclic field fails with a structural error instead of the
/// construction overflowing the stack.
pub fn nested<S: Record>() -> Kind {
    let id = TypeId::of::<S>();
    let cyclic = BUILDING.with(|b| b.borrow().contains(&id));
    if cyclic {
        Kind::Unknown
    } else {
        Kind::Record(S::shape())
    }
}

// Types whose descriptors are currently being built on this thread. Used
// only to detect self-referential nesting in `nested`.
thread_local! {
    static BUILDING: RefCell<Vec<TypeId>> = RefCell::new(Vec::new());
}

// One slot per record type, written at most once and read-only afterwards.
// Losing a construction race discards the loser's work; repeated
// construction is idempotent because `Record::fields` is pure.
static DESCRIPTORS: Lazy<RwLock<HashMap<TypeId, &'static (dyn Any + Send + Sync)>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

fn cached<R: Record>() -> &'static Descriptor<R> {
    let id = TypeId::of::<R>();
    let published = DESCRIPTORS
        .read()
        .expect("descriptor cache poisoned")
        .get(&id)
        .copied();
    let slot: &'static (dyn Any + Send + Sync) = match published {
        Some(slot) => slot,
        None => {
            // Build outside the lock: `R::fields` may recurse into other
            // types' descriptors through `nested`.
            let built = build::<R>();
            let mut map = DESCRIPTORS.write().expect("descriptor cache poisoned");
            *map.entry(id).or_insert_with(|| {
                let leaked: &'static Descriptor<R> = Box::leak(Box::new(built));
                leaked as &'static (dyn Any + Send + Sync)
            })
        }
    };
    slot.downcast_ref::<Descriptor<R>>()
        .expect("descriptor cache slot holds the wrong type")
}

fn build<R: Record>() -> Descriptor<R> {
    let id = TypeId::of::<R>();
    BUILDING.with(|b| b.borrow_mut().push(id));
    let fields = R::fields();
    BUILDING.with(|b| {
        b.borrow_mut().pop();
    });
    let shape = Shape {
        name: R::name(),
        fields: fields.iter().map(|f| (f.name, f.kind)).collect(),
    };
    Descriptor { shape, fields }
}
