//! Input validation for the two user actions
//!
//! Raw form input goes in; either call parameters ready for the builder or
//! field-level messages come out. The orchestrator does not call these; the
//! caller must, before handing parameters over.

use crate::classifier::{ErrorKind, ParsedError};
use crate::types::{sui_to_mist, CreateBountyParams, SubmitLabelParams};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

static OBJECT_ID: Lazy<Regex> = Lazy::new(|| {
    // Static pattern, always compiles
    Regex::new(r"^0x[a-fA-F0-9]+$").expect("valid object id pattern")
});

/// Returns true for `0x`-prefixed hex identifiers
pub fn is_object_id(value: &str) -> bool {
    OBJECT_ID.is_match(value)
}

/// Raw create-bounty input
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBountyForm {
    pub name: String,
    pub file_names: Vec<String>,
    pub blob_ids: Vec<String>,
    pub allowed_labels: Vec<String>,
    pub total_images: f64,
    /// Reward in whole SUI
    pub reward_amount: f64,
}

/// Raw submit-label input
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitLabelForm {
    pub bounty_object_id: String,
    pub file_name: String,
    pub label: String,
}

/// Validation messages keyed by form field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    /// Single classified error for surfaces that show one message
    pub fn to_parsed_error(&self) -> ParsedError {
        let first = self
            .0
            .values()
            .flatten()
            .next()
            .cloned()
            .unwrap_or_else(|| "Invalid input".to_string());
        ParsedError::new(ErrorKind::ValidationError, self.to_string(), first)
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

fn required_text(errors: &mut FieldErrors, field: &'static str, value: &str, required: &str, blank: &str) {
    if value.is_empty() {
        errors.add(field, required);
    } else if value.trim().is_empty() {
        errors.add(field, blank);
    }
}

fn non_empty_list(errors: &mut FieldErrors, field: &'static str, values: &[String], empty_list: &str, empty_item: &str) {
    if values.is_empty() {
        errors.add(field, empty_list);
    }
    if values.iter().any(String::is_empty) {
        errors.add(field, empty_item);
    }
}

/// Validate create-bounty input and convert the reward to MIST
pub fn validate_create_bounty(form: &CreateBountyForm) -> Result<CreateBountyParams, FieldErrors> {
    let mut errors = FieldErrors::default();

    required_text(
        &mut errors,
        "name",
        &form.name,
        "Bounty name is required",
        "Bounty name cannot be only whitespace",
    );
    non_empty_list(
        &mut errors,
        "fileNames",
        &form.file_names,
        "At least one file is required",
        "File name cannot be empty",
    );
    non_empty_list(
        &mut errors,
        "blobIds",
        &form.blob_ids,
        "At least one blob ID is required",
        "Blob ID cannot be empty",
    );
    non_empty_list(
        &mut errors,
        "allowedLabels",
        &form.allowed_labels,
        "At least one allowed label is required",
        "Label cannot be empty",
    );

    if !form.total_images.is_finite() {
        errors.add("totalImages", "Total images must be a number");
    } else if form.total_images.fract() != 0.0 {
        errors.add("totalImages", "Total images must be an integer");
    } else if form.total_images <= 0.0 {
        errors.add("totalImages", "Total images must be a positive number");
    }

    let reward = if !form.reward_amount.is_finite() {
        errors.add("rewardAmount", "Reward amount must be a number");
        None
    } else if form.reward_amount <= 0.0 {
        errors.add("rewardAmount", "Reward amount must be a positive number");
        None
    } else {
        match sui_to_mist(form.reward_amount) {
            Some(mist) if mist > 0 => Some(mist),
            _ => {
                errors.add("rewardAmount", "Reward amount is out of range");
                None
            }
        }
    };

    if form.file_names.len() != form.blob_ids.len() {
        errors.add("fileNames", "File names and blob IDs must have the same length");
    }

    match reward {
        Some(reward_amount) if errors.is_empty() => Ok(CreateBountyParams {
            name: form.name.clone(),
            file_name_list: form.file_names.clone(),
            blob_ids: form.blob_ids.clone(),
            allowed_labels: form.allowed_labels.clone(),
            total_images: form.total_images as u64,
            reward_amount,
        }),
        _ => Err(errors),
    }
}

/// Validate submit-label input
pub fn validate_submit_label(form: &SubmitLabelForm) -> Result<SubmitLabelParams, FieldErrors> {
    let mut errors = FieldErrors::default();

    if form.bounty_object_id.is_empty() {
        errors.add("bountyObjectId", "Bounty object ID is required");
    } else if !is_object_id(&form.bounty_object_id) {
        errors.add(
            "bountyObjectId",
            "Bounty object ID must be a valid Sui object ID (starting with 0x)",
        );
    }
    required_text(
        &mut errors,
        "fileName",
        &form.file_name,
        "File name is required",
        "File name cannot be only whitespace",
    );
    required_text(
        &mut errors,
        "label",
        &form.label,
        "Label is required",
        "Label cannot be only whitespace",
    );

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(SubmitLabelParams {
        bounty_object_id: form.bounty_object_id.clone(),
        file_name: form.file_name.clone(),
        label: form.label.clone(),
    })
}
