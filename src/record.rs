use uuid::Uuid;

use crate::Field;

/// A record shape that can be edited through a [`RecordEditContext`](crate::RecordEditContext).
///
/// The record is a plain value. The edit context keeps its own copies of it,
/// so equality is all that is needed to compute dirty state.
pub trait EditRecord: Clone + PartialEq + Default + 'static {
    /// The identity field. A record whose id is [`Uuid::nil`] is new.
    const ID: Field<Self, Uuid>;

    /// Names of every editable field, in declaration order.
    const FIELD_NAMES: &'static [&'static str];

    fn id(&self) -> Uuid {
        *Self::ID.get(self)
    }

    fn with_id(mut self, id: Uuid) -> Self {
        *Self::ID.get_mut(&mut self) = id;
        self
    }

    fn is_new(&self) -> bool {
        self.id().is_nil()
    }
}
