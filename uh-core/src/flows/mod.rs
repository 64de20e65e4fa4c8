//! Setup flows for the two integrations
//!
//! These are plain validation steps, not a form engine. A host renders its
//! own forms, passes the submitted values in, and shows [`form_errors`] on
//! failure.

pub mod compensation;
pub mod device;

use std::collections::BTreeMap;

use crate::error::UpsHatError;

/// Form field that carries errors not tied to a single input
pub const BASE_ERROR_FIELD: &str = "base";

/// Error map in the shape hosts render next to a form
pub fn form_errors(err: &UpsHatError) -> BTreeMap<String, String> {
    let mut errors = BTreeMap::new();
    errors.insert(
        BASE_ERROR_FIELD.to_string(),
        err.kind().message_key().to_string(),
    );
    errors
}
