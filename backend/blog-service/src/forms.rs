/// Input forms for post and comment mutations
///
/// Field validation that needs no storage lookup lives here. Whether a chosen
/// group actually exists is checked by `PostService`, which reports it through
/// the same `FormErrors` map.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::{Validate, ValidationErrors};

use crate::models::Post;

pub const REQUIRED_MESSAGE: &str = "This field is required.";
pub const INVALID_CHOICE_MESSAGE: &str = "Select a valid choice.";
pub const INVALID_IMAGE_MESSAGE: &str = "Upload a valid image.";

/// Storage prefix every post image key lives under.
pub const IMAGE_PREFIX: &str = "posts/";

/// Field name -> messages, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut form_errors = FormErrors::new();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors.iter() {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                form_errors.add(&field.to_string(), message);
            }
        }
        form_errors
    }
}

/// Result of submitting a form: either the stored object or the messages to
/// re-render the form with.
#[derive(Debug)]
pub enum FormOutcome<T> {
    Saved(T),
    Invalid(FormErrors),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct PostForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub text: String,

    /// Raw group choice; empty means "no group".
    #[serde(default)]
    pub group: Option<String>,

    #[serde(default)]
    pub image: Option<String>,
}

/// A `PostForm` that passed field validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanPost {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

impl PostForm {
    /// Form bound to an existing post, used to pre-fill the edit page.
    pub fn from_post(post: &Post) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group_id.map(|id| id.to_string()),
            image: post.image.clone(),
        }
    }

    /// Trim, then validate fields that need no lookup.
    pub fn clean(&self) -> Result<CleanPost, FormErrors> {
        let normalized = PostForm {
            text: self.text.trim().to_string(),
            group: self.group.clone(),
            image: self.image.clone(),
        };

        let mut errors = match normalized.validate() {
            Ok(()) => FormErrors::new(),
            Err(e) => FormErrors::from(e),
        };

        let group_id = match normalized.group.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match raw.parse::<i64>() {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.add("group", INVALID_CHOICE_MESSAGE);
                    None
                }
            },
        };

        let image = match normalized.image.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(key) if is_valid_image_key(key) => Some(key.to_string()),
            Some(_) => {
                errors.add("image", INVALID_IMAGE_MESSAGE);
                None
            }
        };

        errors.into_result()?;
        Ok(CleanPost {
            text: normalized.text,
            group_id,
            image,
        })
    }
}

fn is_valid_image_key(key: &str) -> bool {
    key.len() > IMAGE_PREFIX.len()
        && key.starts_with(IMAGE_PREFIX)
        && !key.split('/').any(|segment| segment == ".." || segment.is_empty())
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct CommentForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub text: String,
}

impl CommentForm {
    pub fn clean(&self) -> Result<String, FormErrors> {
        let normalized = CommentForm {
            text: self.text.trim().to_string(),
        };
        normalized.validate().map_err(FormErrors::from)?;
        Ok(normalized.text)
    }
}
