use derive_ex::derive_ex;
use parse_display::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;


/// Identity of one edit context.
///
/// Two editors open over records of the same type get different ids,
/// so their field references never collide.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[display("{0}")]
#[serde(transparent)]
pub struct InstanceId(Uuid);

impl InstanceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}
impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

/// A single field on a specific edit context instance.
#[derive(Clone, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[display("{instance_id}.{field_name}")]
pub struct FieldReference {
    pub instance_id: InstanceId,
    pub field_name: String,
}

impl FieldReference {
    pub fn new(instance_id: InstanceId, field_name: impl Into<String>) -> Self {
        Self {
            instance_id,
            field_name: field_name.into(),
        }
    }
    pub fn is_on(&self, instance_id: InstanceId) -> bool {
        self.instance_id == instance_id
    }
}

/// Statically declared accessor for one field of record type `R`.
///
/// A record type lists its fields as `const` values of this type instead of
/// discovering them at runtime. Use [`record_field!`](crate::record_field) to declare one.
#[derive_ex(Clone, Copy, bound())]
pub struct Field<R, T> {
    name: &'static str,
    get: fn(&R) -> &T,
    get_mut: fn(&mut R) -> &mut T,
}

impl<R, T> Field<R, T> {
    pub const fn new(name: &'static str, get: fn(&R) -> &T, get_mut: fn(&mut R) -> &mut T) -> Self {
        Self { name, get, get_mut }
    }
    pub const fn name(&self) -> &'static str {
        self.name
    }
    pub fn get<'a>(&self, record: &'a R) -> &'a T {
        (self.get)(record)
    }
    pub fn get_mut<'a>(&self, record: &'a mut R) -> &'a mut T {
        (self.get_mut)(record)
    }
    pub fn reference(&self, instance_id: InstanceId) -> FieldReference {
        FieldReference::new(instance_id, self.name)
    }
}
impl<R, T> std::fmt::Debug for Field<R, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Field({})", self.name)
    }
}

/// Declares a [`Field`] for a named struct field.
///
/// ```
/// use record_edit::{record_field, Field};
///
/// #[derive(Default)]
/// struct Person {
///     name: String,
/// }
/// const NAME: Field<Person, String> = record_field!(Person, name: String, "Name");
///
/// let mut p = Person::default();
/// *NAME.get_mut(&mut p) = "Ann".to_string();
/// assert_eq!(NAME.get(&p), "Ann");
/// ```
#[macro_export]
macro_rules! record_field {
    ($record:ty, $field:ident : $ty:ty, $name:expr) => {
        $crate::Field::<$record, $ty>::new(
            $name,
            {
                fn get(r: &$record) -> &$ty {
                    &r.$field
                }
                get
            },
            {
                fn get_mut(r: &mut $record) -> &mut $ty {
                    &mut r.$field
                }
                get_mut
            },
        )
    };
}
