//! JSON body extraction with schema validation
//!
//! Wraps `axum::Json` and runs `validator` rules, turning failures into a
//! 422 envelope with a field-keyed error map before the handler runs.

use std::collections::HashMap;

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::error::ApiError;

/// A deserialized and validated JSON body
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| {
                let mut errors = HashMap::new();
                errors.insert("body".to_string(), vec![e.body_text()]);
                ApiError::Validation(errors).into_response()
            })?;

        value
            .validate()
            .map_err(|e| ApiError::Validation(format_errors(e)).into_response())?;

        Ok(ValidatedJson(value))
    }
}

/// Flatten `validator` output into `{field: [messages]}`
fn format_errors(errors: ValidationErrors) -> HashMap<String, Vec<String>> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {field}"))
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}
