/// Extractors that deserialize and validate request input
///
/// Rejections from axum's own extractors and from `validator` are turned into
/// `VaultError::InvalidInput`, so every client mistake is answered with the
/// same JSON error body.
use crate::error::VaultError;
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

/// JSON body that passed validation
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = VaultError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| VaultError::InvalidInput(rejection.body_text()))?;

        value.validate().map_err(invalid_input)?;

        Ok(ValidatedJson(value))
    }
}

/// Query string that passed validation
#[derive(Debug, Clone)]
pub struct ValidatedQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = VaultError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| VaultError::InvalidInput(rejection.body_text()))?;

        value.validate().map_err(invalid_input)?;

        Ok(ValidatedQuery(value))
    }
}

/// Flatten field errors into one message
fn invalid_input(errors: ValidationErrors) -> VaultError {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| match &err.message {
                Some(message) => message.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .collect();
    messages.sort();

    VaultError::InvalidInput(messages.join(", "))
}
