use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AppError, FieldErrors};

/// Default images served when a record has no upload of its own.
pub const DEFAULT_BLOG_COVER: &str = "images/assets/default-blog-cover.jpg";
pub const DEFAULT_AVATAR: &str = "images/assets/default-avatar.jpg";

/// Storage folders for uploaded images.
pub const BLOG_COVER_FOLDER: &str = "blogs";
pub const AVATAR_FOLDER: &str = "avatars";

/// Body of endpoints that only report an outcome.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Successfully logged out")]
    pub message: String,
}

/// A request body field as sent by the client.
///
/// Deserializing never fails on the value itself: a value of the wrong JSON
/// type becomes `Invalid`, so the validator can report it under the field
/// name together with every other violation. `null` counts as absent.
/// Structs using it need `#[serde(default)]` so absent keys become `Missing`.
#[derive(Debug, Default, Clone, PartialEq)]
pub enum Field<T> {
    #[default]
    Missing,
    Present(T),
    Invalid,
}

impl<T> Field<T> {
    pub fn present(&self) -> Option<&T> {
        match self {
            Field::Present(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_present(self) -> Option<T> {
        match self {
            Field::Present(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Field::Present(value)
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        if value.is_null() {
            return Ok(Field::Missing);
        }
        Ok(serde_json::from_value(value).map_or(Field::Invalid, Field::Present))
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Field::Present(value) => value.serialize(serializer),
            Field::Missing | Field::Invalid => serializer.serialize_none(),
        }
    }
}

/// Collects field errors so that every violated constraint is reported at once.
#[derive(Default)]
pub struct FieldValidator {
    errors: FieldErrors,
}

impl FieldValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Record a missing required field. Returns whether the key was sent.
    pub fn required<T>(&mut self, field: &str, value: &Field<T>) -> bool {
        if matches!(value, Field::Missing) {
            self.add(field, "Missing data for required field.");
            return false;
        }
        true
    }

    /// Type-check a string field.
    pub fn string<'a>(&mut self, field: &str, value: &'a Field<String>) -> Option<&'a str> {
        if matches!(value, Field::Invalid) {
            self.add(field, "Not a valid string.");
        }
        value.present().map(String::as_str)
    }

    /// Type-check an integer field.
    pub fn integer(&mut self, field: &str, value: &Field<i32>) -> Option<i32> {
        if matches!(value, Field::Invalid) {
            self.add(field, "Not a valid integer.");
        }
        value.present().copied()
    }

    /// Check a character-count upper bound on an optional string.
    pub fn max_length(&mut self, field: &str, value: Option<&str>, max: usize) {
        if let Some(v) = value
            && v.chars().count() > max
        {
            self.add(field, format!("Longer than maximum length {max}."));
        }
    }

    /// Check a character-count range on an optional string.
    pub fn length_between(&mut self, field: &str, value: Option<&str>, min: usize, max: usize) {
        if let Some(v) = value {
            let len = v.chars().count();
            if len < min || len > max {
                self.add(field, format!("Length must be between {min} and {max}."));
            }
        }
    }

    pub fn finish(self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::InvalidFields(self.errors))
        }
    }
}

/// Truthy-overwrite for strings: an empty string never replaces a stored value.
pub fn truthy_str(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Truthy-overwrite for integers: zero never replaces a stored value.
pub fn truthy_int(value: Option<i32>) -> Option<i32> {
    value.filter(|n| *n != 0)
}
