//! Request workflows
//!
//! Handlers stay thin: they extract, call one function here, and wrap the
//! result. Each workflow reads the clock once and passes `now` down.

pub mod exceptions;
pub mod reports;

use shared::error::{AppError, AppResult};
use validator::Validate;

/// Run derive-based validation, reporting the first message per field
pub fn validate_payload<T: Validate>(payload: &T) -> AppResult<()> {
    let Err(errors) = payload.validate() else {
        return Ok(());
    };

    let mut fields: Vec<(String, String)> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let message = errs
                .first()
                .and_then(|e| e.message.as_ref())
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("{field} is invalid"));
            (field.to_string(), message)
        })
        .collect();
    fields.sort();

    let summary = fields
        .iter()
        .map(|(_, message)| message.as_str())
        .collect::<Vec<_>>()
        .join("; ");
    let mut err = AppError::validation(summary);
    for (field, message) in fields {
        err = err.with_detail(field, message);
    }
    Err(err)
}
