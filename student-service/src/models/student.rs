use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::{Validate, ValidationError};

pub type StudentId = i64;

/// A student record.
///
/// Only the identity is interpreted here. Every other field is carried as
/// an opaque JSON attribute and written back exactly as received, so the
/// wire form is a single flat object: `{"id": 1, "name": "Ada"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Student {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<StudentId>,
    #[serde(flatten)]
    #[validate(custom(function = "validate_attributes"))]
    pub attributes: Map<String, Value>,
}

impl Student {
    pub fn new(attributes: Map<String, Value>) -> Self {
        Self {
            id: None,
            attributes,
        }
    }

    pub fn with_id(mut self, id: StudentId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn without_id(mut self) -> Self {
        self.id = None;
        self
    }
}

fn validate_attributes(attributes: &Map<String, Value>) -> Result<(), ValidationError> {
    if attributes.is_empty() {
        let mut error = ValidationError::new("empty");
        error.message = Some("a student needs at least one attribute".into());
        return Err(error);
    }

    if attributes.keys().any(|name| name.trim().is_empty()) {
        let mut error = ValidationError::new("blank_name");
        error.message = Some("attribute names cannot be blank".into());
        return Err(error);
    }

    if let Some((name, _)) = attributes.iter().find(|(_, value)| value.is_null()) {
        let mut error = ValidationError::new("null_value");
        error.message = Some("attribute values cannot be null".into());
        error.add_param("attribute".into(), name);
        return Err(error);
    }

    Ok(())
}
