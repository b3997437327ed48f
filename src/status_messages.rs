use rocket::http::Status as HttpStatus;
use rocket::response::{self, Responder, Response};
use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use rocket::Request;
use rocket_okapi::gen::OpenApiGenerator;
use rocket_okapi::response::OpenApiResponderInner;
use rocket_okapi::{JsonSchema, OpenApiError};

use crate::error::ArenaError;

/// JSON body returned for every failed request.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct Status {
    pub message: String,
}

pub fn new_status(message: String) -> Json<Status> {
    Json(Status { message })
}

/// Responder wrapping an [`ArenaError`] with its HTTP status.
#[derive(Debug)]
pub struct ApiError(pub ArenaError);

impl ApiError {
    pub fn http_status(&self) -> HttpStatus {
        match self.0 {
            ArenaError::NotFound(_) | ArenaError::NoPendingCommit => HttpStatus::NotFound,
            ArenaError::CapacityExceeded => HttpStatus::Conflict,
            ArenaError::InsufficientCombatants(_)
            | ArenaError::InvalidEntry(_)
            | ArenaError::InvalidSortKey(_) => HttpStatus::BadRequest,
            ArenaError::Persistence(_) => HttpStatus::ServiceUnavailable,
        }
    }
}

impl From<ArenaError> for ApiError {
    fn from(error: ArenaError) -> Self {
        ApiError(error)
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let status = self.http_status();
        Response::build_from(new_status(self.0.to_string()).respond_to(request)?)
            .status(status)
            .ok()
    }
}

impl OpenApiResponderInner for ApiError {
    fn responses(_gen: &mut OpenApiGenerator) -> Result<okapi::openapi3::Responses, OpenApiError> {
        use okapi::openapi3::{RefOr, Response as OpenApiResponse, Responses};

        let mut responses = okapi::Map::new();
        for (code, description) in [
            ("400", "Invalid request, or fewer than two combatants staged."),
            ("404", "Catalog entry missing or deleted, or nothing to retry."),
            ("409", "The staging set is already full."),
            ("503", "The catalog store failed or timed out."),
        ] {
            responses.insert(
                code.to_string(),
                RefOr::Object(OpenApiResponse {
                    description: description.to_string(),
                    ..Default::default()
                }),
            );
        }
        Ok(Responses {
            responses,
            ..Default::default()
        })
    }
}
