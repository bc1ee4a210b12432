use super::{MessageScope, ValidationMessages, ValidationResult};
use crate::{FieldReference, InstanceId};

/// Builder for one validation run over one record.
///
/// Creating it clears the messages of the validated scope, so re-running a field
/// never leaves stale messages behind.
///
/// ```
/// use record_edit::{InstanceId, Validation, ValidationMessages};
///
/// let id = InstanceId::new();
/// let mut messages = ValidationMessages::new();
/// let mut v = Validation::new(id, &mut messages, None);
/// v.field("Temperature", &70)
///     .greater_than(&-61, "too cold")
///     .less_than(&61, "too hot");
/// let result = v.finish();
/// assert!(!result.is_valid);
/// assert_eq!(result.messages.len(), 1);
/// ```
pub struct Validation<'a> {
    instance_id: InstanceId,
    messages: &'a mut ValidationMessages,
    field: Option<&'a str>,
    start: usize,
    is_valid: bool,
}

impl<'a> Validation<'a> {
    pub fn new(
        instance_id: InstanceId,
        messages: &'a mut ValidationMessages,
        field: Option<&'a str>,
    ) -> Self {
        let scope = match field {
            Some(name) => MessageScope::Field(FieldReference::new(instance_id, name)),
            None => MessageScope::Instance(instance_id),
        };
        messages.clear(&scope);
        let start = messages.len();
        Self {
            instance_id,
            messages,
            field,
            start,
            is_valid: true,
        }
    }

    /// Starts a rule chain for field `name`.
    ///
    /// When the run is narrowed to another field, the chain evaluates nothing.
    pub fn field<'v, T: ?Sized>(&'v mut self, name: &'static str, value: &'v T) -> FieldRules<'v, 'a, T> {
        let active = match self.field {
            Some(f) => f == name,
            None => true,
        };
        FieldRules {
            validation: self,
            name,
            value,
            active,
        }
    }

    /// Checks a rule about the whole record. Only evaluated when no field narrowing is in effect.
    pub fn record(&mut self, is_ok: bool, text: &str) -> &mut Self {
        if self.field.is_none() && !is_ok {
            self.messages.add_message(self.instance_id, text);
            self.is_valid = false;
        }
        self
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn finish(self) -> ValidationResult {
        ValidationResult {
            is_valid: self.is_valid,
            messages: self.messages.tail(self.start),
        }
    }

    fn fail(&mut self, name: &str, text: &str) {
        self.messages
            .add_message(FieldReference::new(self.instance_id, name), text);
        self.is_valid = false;
    }
}

/// Rule chain for one field. Every rule runs even after an earlier one failed.
pub struct FieldRules<'v, 'a, T: ?Sized> {
    validation: &'v mut Validation<'a>,
    name: &'static str,
    value: &'v T,
    active: bool,
}

impl<T: ?Sized> FieldRules<'_, '_, T> {
    /// Fails with `text` unless `is_ok` holds for the value.
    pub fn check(self, is_ok: impl FnOnce(&T) -> bool, text: &str) -> Self {
        if self.active && !is_ok(self.value) {
            self.validation.fail(self.name, text);
        }
        self
    }
}

impl<T: PartialOrd + ?Sized> FieldRules<'_, '_, T> {
    pub fn greater_than(self, bound: &T, text: &str) -> Self {
        self.check(|v| v > bound, text)
    }
    pub fn greater_than_or_equal_to(self, bound: &T, text: &str) -> Self {
        self.check(|v| v >= bound, text)
    }
    pub fn less_than(self, bound: &T, text: &str) -> Self {
        self.check(|v| v < bound, text)
    }
    pub fn less_than_or_equal_to(self, bound: &T, text: &str) -> Self {
        self.check(|v| v <= bound, text)
    }
}

impl<T: AsRef<str> + ?Sized> FieldRules<'_, '_, T> {
    /// Fails when the text is shorter than `len` characters.
    pub fn min_length(self, len: usize, text: &str) -> Self {
        self.check(|v| v.as_ref().chars().count() >= len, text)
    }
    pub fn max_length(self, len: usize, text: &str) -> Self {
        self.check(|v| v.as_ref().chars().count() <= len, text)
    }
    pub fn not_blank(self, text: &str) -> Self {
        self.check(|v| !v.as_ref().trim().is_empty(), text)
    }
}
