use parse_display::Display;
use serde::{Deserialize, Serialize};

use crate::{FieldReference, InstanceId};

mod rules;

pub use rules::*;


/// What a [`ValidationMessage`] is about: one field, or the whole record.
#[derive(Clone, Debug, Display, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageTarget {
    #[display("{0}")]
    Field(FieldReference),
    #[display("{0}")]
    Record(InstanceId),
}
impl MessageTarget {
    pub fn instance_id(&self) -> InstanceId {
        match self {
            MessageTarget::Field(f) => f.instance_id,
            MessageTarget::Record(id) => *id,
        }
    }
    pub fn field(&self) -> Option<&FieldReference> {
        match self {
            MessageTarget::Field(f) => Some(f),
            MessageTarget::Record(_) => None,
        }
    }
}
impl From<FieldReference> for MessageTarget {
    fn from(value: FieldReference) -> Self {
        MessageTarget::Field(value)
    }
}
impl From<InstanceId> for MessageTarget {
    fn from(value: InstanceId) -> Self {
        MessageTarget::Record(value)
    }
}

#[derive(Clone, Debug, Display, PartialEq, Eq, Serialize, Deserialize)]
#[display("{target}: {text}")]
pub struct ValidationMessage {
    pub target: MessageTarget,
    pub text: String,
}

/// Which messages a clear operation removes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MessageScope {
    All,
    /// Every message of one instance, field-level and record-level.
    Instance(InstanceId),
    Field(FieldReference),
}
impl MessageScope {
    fn contains(&self, target: &MessageTarget) -> bool {
        match self {
            MessageScope::All => true,
            MessageScope::Instance(id) => target.instance_id() == *id,
            MessageScope::Field(f) => target.field() == Some(f),
        }
    }
}

/// Accumulated validation failures, in the order they were added.
#[derive(Clone, Debug, Default)]
pub struct ValidationMessages {
    messages: Vec<ValidationMessage>,
}

impl ValidationMessages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_message(&mut self, target: impl Into<MessageTarget>, text: impl Into<String>) {
        self.messages.push(ValidationMessage {
            target: target.into(),
            text: text.into(),
        });
    }

    pub fn clear(&mut self, scope: &MessageScope) {
        self.messages.retain(|m| !scope.contains(&m.target));
    }

    /// Returns true if `field` has any message, or if any message exists when `field` is `None`.
    pub fn has_messages(&self, field: Option<&FieldReference>) -> bool {
        match field {
            Some(f) => self.messages.iter().any(|m| m.target.field() == Some(f)),
            None => !self.messages.is_empty(),
        }
    }

    pub fn get_messages<'a>(
        &'a self,
        field: Option<&'a FieldReference>,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.messages
            .iter()
            .filter(move |m| field.is_none() || m.target.field() == field)
            .map(|m| m.text.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationMessage> {
        self.messages.iter()
    }
    pub fn len(&self) -> usize {
        self.messages.len()
    }
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn tail(&self, start: usize) -> Vec<ValidationMessage> {
        self.messages[start..].to_vec()
    }
}

/// Outcome of one validation run.
///
/// `messages` holds only the messages produced by that run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub messages: Vec<ValidationMessage>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            messages: Vec::new(),
        }
    }

    pub fn field_messages<'a>(&'a self, field_name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.messages
            .iter()
            .filter(move |m| m.target.field().is_some_and(|f| f.field_name == field_name))
            .map(|m| m.text.as_str())
    }
}

/// Argument of the validation-state notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationStateUpdated {
    pub is_valid: bool,
    pub instance_id: InstanceId,
    /// `None` when the whole record was validated.
    pub field: Option<FieldReference>,
}

/// Validation rules for one record type.
///
/// `field` narrows the run to one field name; `None` validates every field.
/// Implementations append failures to `messages` and must not short-circuit,
/// so every failing rule of a field is reported at once.
pub trait RecordValidator<R> {
    fn validate(
        &self,
        record: &R,
        instance_id: InstanceId,
        messages: &mut ValidationMessages,
        field: Option<&str>,
    ) -> ValidationResult;
}

impl<R, F> RecordValidator<R> for F
where
    F: Fn(&R, InstanceId, &mut ValidationMessages, Option<&str>) -> ValidationResult,
{
    fn validate(
        &self,
        record: &R,
        instance_id: InstanceId,
        messages: &mut ValidationMessages,
        field: Option<&str>,
    ) -> ValidationResult {
        self(record, instance_id, messages, field)
    }
}
