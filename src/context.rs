use std::any::type_name;

use parse_display::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EditRecord, Event, Field, FieldReference, InstanceId, MessageScope, PropertyStates,
    RecordValidator, Subscription, ValidationMessages, ValidationResult, ValidationStateUpdated,
};

#[cfg(test)]
mod tests;

/// A field was written before any record was loaded into the edit context.
///
/// This is a programmer error: the context has no baseline to compare against.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
#[display("cannot edit `{type_name}` before a record has been loaded")]
pub struct NotLoadedError {
    type_name: &'static str,
}
impl NotLoadedError {
    fn new<R>() -> Self {
        Self {
            type_name: type_name::<R>(),
        }
    }
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}
impl std::error::Error for NotLoadedError {}

/// Behavior switches of a [`RecordEditContext`].
///
/// Missing keys take their default when deserialized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditContextOptions {
    /// Validate a field every time its value changes.
    pub validate_on_field_changed: bool,
    /// Fire `FieldChanged(None)` and `EditStateUpdated` from [`RecordEditContext::load`].
    pub notify_on_load: bool,
}
impl Default for EditContextOptions {
    fn default() -> Self {
        Self {
            validate_on_field_changed: false,
            notify_on_load: true,
        }
    }
}

#[derive(Clone, Default)]
struct EditEvents {
    field_changed: Event<Option<&'static str>>,
    edit_state_updated: Event<bool>,
    validation_state_updated: Event<ValidationStateUpdated>,
}

enum Notification {
    FieldChanged {
        field_name: Option<&'static str>,
        is_dirty: bool,
    },
    ValidationStateUpdated(ValidationStateUpdated),
}

/// Notifications produced by a mutation that have not been fired yet.
///
/// Returned by the `*_deferred` methods of [`RecordEditContext`]. When the context is shared through
/// `Rc<RefCell<_>>`, release the mutable borrow before calling [`notify`](Self::notify)
/// so that handlers can read the context.
#[must_use]
pub struct PendingNotifications {
    events: EditEvents,
    items: Vec<Notification>,
}

impl PendingNotifications {
    fn new(events: &EditEvents) -> Self {
        Self {
            events: events.clone(),
            items: Vec::new(),
        }
    }
    fn field_changed(&mut self, field_name: Option<&'static str>, is_dirty: bool) {
        self.items.push(Notification::FieldChanged {
            field_name,
            is_dirty,
        });
    }
    fn validation_state_updated(&mut self, e: ValidationStateUpdated) {
        self.items.push(Notification::ValidationStateUpdated(e));
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Fires every notification in the order the mutation produced them.
    pub fn notify(self) {
        for item in self.items {
            match item {
                Notification::FieldChanged {
                    field_name,
                    is_dirty,
                } => {
                    self.events.field_changed.emit(&field_name);
                    self.events.edit_state_updated.emit(&is_dirty);
                }
                Notification::ValidationStateUpdated(e) => {
                    self.events.validation_state_updated.emit(&e);
                }
            }
        }
    }

    /// Drops the notifications without firing them.
    pub fn discard(self) {}
}

impl std::fmt::Debug for PendingNotifications {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingNotifications")
            .field("len", &self.items.len())
            .finish()
    }
}

/// The editable, observable surrogate of one record.
///
/// The context holds a baseline copy of the last loaded or saved record and a live copy
/// that field setters write to. Dirty state is the structural difference between the two.
///
/// Notification handlers of the plain mutating methods are called before the method returns.
/// A context shared through `Rc<RefCell<_>>` whose handlers read it back should be mutated
/// through the `*_deferred` methods, firing the returned [`PendingNotifications`] after the
/// borrow is released.
pub struct RecordEditContext<R: EditRecord> {
    instance_id: InstanceId,
    base: R,
    current: R,
    is_loaded: bool,
    options: EditContextOptions,
    property_states: PropertyStates,
    messages: ValidationMessages,
    validator: Option<Box<dyn RecordValidator<R>>>,
    events: EditEvents,
}

impl<R: EditRecord> RecordEditContext<R> {
    /// Creates an unloaded context. Every setter fails until [`load`](Self::load) is called.
    pub fn new() -> Self {
        Self::with_options(EditContextOptions::default())
    }

    pub fn with_options(options: EditContextOptions) -> Self {
        Self {
            instance_id: InstanceId::new(),
            base: R::default(),
            current: R::default(),
            is_loaded: false,
            options,
            property_states: PropertyStates::new(),
            messages: ValidationMessages::new(),
            validator: None,
            events: EditEvents::default(),
        }
    }

    /// Creates a context already loaded with `record`, without notifying.
    pub fn with_record(record: R) -> Self {
        let mut this = Self::new();
        this.load_with(record, false);
        this
    }

    pub fn with_validator(mut self, validator: impl RecordValidator<R> + 'static) -> Self {
        self.set_validator(validator);
        self
    }
    pub fn set_validator(&mut self, validator: impl RecordValidator<R> + 'static) {
        self.validator = Some(Box::new(validator));
    }

    pub fn instance_id(&self) -> InstanceId {
        self.instance_id
    }
    pub fn options(&self) -> &EditContextOptions {
        &self.options
    }
    pub fn options_mut(&mut self) -> &mut EditContextOptions {
        &mut self.options
    }

    /// Loads `record` as both the baseline and the live values.
    ///
    /// Clears property states and validation messages of this context.
    pub fn load(&mut self, record: R) {
        self.load_deferred(record).notify();
    }

    pub fn load_with(&mut self, record: R, notify: bool) {
        let pending = self.load_pending(record);
        if notify {
            pending.notify();
        }
    }

    /// [`load`](Self::load) without firing notifications.
    ///
    /// The result is empty when [`EditContextOptions::notify_on_load`] is off.
    pub fn load_deferred(&mut self, record: R) -> PendingNotifications {
        let pending = self.load_pending(record);
        if self.options.notify_on_load {
            pending
        } else {
            pending.discard();
            PendingNotifications::new(&self.events)
        }
    }

    fn load_pending(&mut self, record: R) -> PendingNotifications {
        self.current = record.clone();
        self.base = record;
        self.is_loaded = true;
        self.property_states.clear_instance(self.instance_id);
        tracing::debug!(
            instance = %self.instance_id,
            record = type_name::<R>(),
            id = %self.base.id(),
            "loaded record"
        );
        let mut pending = PendingNotifications::new(&self.events);
        self.clear_messages(&mut pending);
        pending.field_changed(None, self.is_dirty());
        pending
    }

    /// Makes the live values the new baseline.
    pub fn save(&mut self) -> Result<(), NotLoadedError> {
        self.save_deferred().map(PendingNotifications::notify)
    }

    pub fn save_deferred(&mut self) -> Result<PendingNotifications, NotLoadedError> {
        self.ensure_loaded()?;
        self.base = self.current.clone();
        self.property_states.clear_instance(self.instance_id);
        tracing::debug!(instance = %self.instance_id, id = %self.base.id(), "saved record");
        let mut pending = PendingNotifications::new(&self.events);
        pending.field_changed(None, self.is_dirty());
        Ok(pending)
    }

    /// Discards every edit and restores the baseline values.
    pub fn reset(&mut self) -> Result<(), NotLoadedError> {
        self.reset_deferred().map(PendingNotifications::notify)
    }

    pub fn reset_deferred(&mut self) -> Result<PendingNotifications, NotLoadedError> {
        self.ensure_loaded()?;
        self.current = self.base.clone();
        self.property_states.clear_instance(self.instance_id);
        tracing::debug!(instance = %self.instance_id, id = %self.base.id(), "reset record");
        let mut pending = PendingNotifications::new(&self.events);
        self.clear_messages(&mut pending);
        pending.field_changed(None, self.is_dirty());
        Ok(pending)
    }

    pub fn get<T>(&self, field: Field<R, T>) -> &T {
        field.get(&self.current)
    }

    /// Writes `value` into `field`.
    ///
    /// Returns `Ok(false)` without notifying when the value equals the current one.
    /// Otherwise the field's property state is re-evaluated against the baseline,
    /// then `FieldChanged` and `EditStateUpdated` are fired in that order.
    pub fn set<T: PartialEq>(&mut self, field: Field<R, T>, value: T) -> Result<bool, NotLoadedError> {
        let pending = self.set_deferred(field, value)?;
        let is_changed = !pending.is_empty();
        pending.notify();
        Ok(is_changed)
    }

    /// [`set`](Self::set) without firing notifications. The result is empty when nothing changed.
    pub fn set_deferred<T: PartialEq>(
        &mut self,
        field: Field<R, T>,
        value: T,
    ) -> Result<PendingNotifications, NotLoadedError> {
        self.ensure_loaded()?;
        let mut pending = PendingNotifications::new(&self.events);
        let current = field.get_mut(&mut self.current);
        if *current == value {
            return Ok(pending);
        }
        *current = value;

        let is_changed = field.get(&self.current) != field.get(&self.base);
        self.property_states
            .update(field.reference(self.instance_id), is_changed);
        tracing::trace!(instance = %self.instance_id, field = field.name(), is_changed, "field changed");

        pending.field_changed(Some(field.name()), self.is_dirty());
        if self.options.validate_on_field_changed {
            let (_, e) = self.run_validator(Some(field.name()));
            pending.validation_state_updated(e);
        }
        Ok(pending)
    }

    pub fn id(&self) -> Uuid {
        self.current.id()
    }
    pub fn set_id(&mut self, id: Uuid) -> Result<bool, NotLoadedError> {
        self.set(R::ID, id)
    }

    /// Materializes the live values. The baseline is untouched.
    pub fn as_record(&self) -> R {
        self.current.clone()
    }

    /// Materializes the live values under a freshly generated id.
    pub fn as_new_record(&self) -> R {
        self.current.clone().with_id(Uuid::new_v4())
    }

    /// The baseline: the record as last loaded or saved.
    pub fn clean_record(&self) -> &R {
        &self.base
    }

    pub fn is_loaded(&self) -> bool {
        self.is_loaded
    }
    pub fn is_dirty(&self) -> bool {
        self.current != self.base
    }
    pub fn is_new(&self) -> bool {
        self.current.is_new()
    }
    pub fn is_valid(&self) -> bool {
        !self.messages.has_messages(None)
    }

    pub fn field_reference(&self, field_name: &str) -> FieldReference {
        FieldReference::new(self.instance_id, field_name)
    }
    pub fn is_changed(&self, field_name: &str) -> bool {
        self.property_states
            .get_state(&self.field_reference(field_name))
    }
    pub fn changed_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        R::FIELD_NAMES
            .iter()
            .copied()
            .filter(|name| self.is_changed(name))
    }
    pub fn property_states(&self) -> &PropertyStates {
        &self.property_states
    }

    pub fn has_messages(&self, field_name: Option<&str>) -> bool {
        self.messages(field_name).next().is_some()
    }
    pub fn messages<'a>(&'a self, field_name: Option<&'a str>) -> impl Iterator<Item = &'a str> + 'a {
        self.messages
            .iter()
            .filter(move |m| match field_name {
                Some(name) => m.target.field().is_some_and(|f| f.field_name == name),
                None => true,
            })
            .map(|m| m.text.as_str())
    }
    pub fn validation_messages(&self) -> &ValidationMessages {
        &self.messages
    }

    /// Runs the validator over the live values, narrowed to `field_name` when given.
    ///
    /// Prior messages of the validated scope are cleared first.
    /// Without a validator every record is valid.
    pub fn validate(&mut self, field_name: Option<&str>) -> ValidationResult {
        let (result, e) = self.run_validator(field_name);
        self.events.validation_state_updated.emit(&e);
        result
    }

    fn run_validator(&mut self, field_name: Option<&str>) -> (ValidationResult, ValidationStateUpdated) {
        let scope = match field_name {
            Some(name) => MessageScope::Field(self.field_reference(name)),
            None => MessageScope::Instance(self.instance_id),
        };
        self.messages.clear(&scope);
        let result = match &self.validator {
            Some(validator) => validator.validate(
                &self.current,
                self.instance_id,
                &mut self.messages,
                field_name,
            ),
            None => ValidationResult::valid(),
        };
        tracing::debug!(
            instance = %self.instance_id,
            field = field_name,
            is_valid = result.is_valid,
            messages = result.messages.len(),
            "validated record"
        );
        let e = ValidationStateUpdated {
            is_valid: result.is_valid,
            instance_id: self.instance_id,
            field: field_name.map(|name| self.field_reference(name)),
        };
        (result, e)
    }

    /// Fires `FieldChanged(field_name)` followed by `EditStateUpdated(is_dirty)`.
    ///
    /// `None` means every field may have changed.
    pub fn notify_field_changed(&self, field_name: Option<&'static str>) {
        self.events.field_changed.emit(&field_name);
        self.events.edit_state_updated.emit(&self.is_dirty());
    }

    pub fn on_field_changed(&self, f: impl Fn(Option<&'static str>) + 'static) -> Subscription {
        self.events.field_changed.subscribe(move |name| f(*name))
    }
    pub fn on_edit_state_updated(&self, f: impl Fn(bool) + 'static) -> Subscription {
        self.events
            .edit_state_updated
            .subscribe(move |is_dirty| f(*is_dirty))
    }
    pub fn on_validation_state_updated(
        &self,
        f: impl Fn(&ValidationStateUpdated) + 'static,
    ) -> Subscription {
        self.events.validation_state_updated.subscribe(f)
    }

    fn ensure_loaded(&self) -> Result<(), NotLoadedError> {
        if self.is_loaded {
            Ok(())
        } else {
            Err(NotLoadedError::new::<R>())
        }
    }

    fn clear_messages(&mut self, pending: &mut PendingNotifications) {
        if !self.messages.has_messages(None) {
            return;
        }
        self.messages.clear(&MessageScope::Instance(self.instance_id));
        pending.validation_state_updated(ValidationStateUpdated {
            is_valid: true,
            instance_id: self.instance_id,
            field: None,
        });
    }
}

impl<R: EditRecord> Default for RecordEditContext<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: EditRecord + std::fmt::Debug> std::fmt::Debug for RecordEditContext<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordEditContext")
            .field("instance_id", &self.instance_id)
            .field("is_loaded", &self.is_loaded)
            .field("is_dirty", &self.is_dirty())
            .field("record", &self.current)
            .finish_non_exhaustive()
    }
}

/// Edit state of a context, independent of its record type.
///
/// UI components that only render status (save buttons, validation summaries)
/// can hold a `&dyn EditState`.
pub trait EditState {
    fn instance_id(&self) -> InstanceId;
    fn is_loaded(&self) -> bool;
    fn is_dirty(&self) -> bool;
    fn is_valid(&self) -> bool;
    fn is_new(&self) -> bool;
    fn is_changed(&self, field_name: &str) -> bool;
    fn has_messages(&self, field_name: Option<&str>) -> bool;
    fn validate(&mut self, field_name: Option<&str>) -> ValidationResult;
}

impl<R: EditRecord> EditState for RecordEditContext<R> {
    fn instance_id(&self) -> InstanceId {
        Self::instance_id(self)
    }
    fn is_loaded(&self) -> bool {
        Self::is_loaded(self)
    }
    fn is_dirty(&self) -> bool {
        Self::is_dirty(self)
    }
    fn is_valid(&self) -> bool {
        Self::is_valid(self)
    }
    fn is_new(&self) -> bool {
        Self::is_new(self)
    }
    fn is_changed(&self, field_name: &str) -> bool {
        Self::is_changed(self, field_name)
    }
    fn has_messages(&self, field_name: Option<&str>) -> bool {
        Self::has_messages(self, field_name)
    }
    fn validate(&mut self, field_name: Option<&str>) -> ValidationResult {
        Self::validate(self, field_name)
    }
}
