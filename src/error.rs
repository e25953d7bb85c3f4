use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::env;
use std::fmt::{self, Debug, Display};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub code: i32,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Internal,
    State,
    Validation,
    Conflict,
    NotFound,
    Unauthorized,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self.code {
            100..=199 => ErrorKind::State,
            200..=299 => ErrorKind::Validation,
            300..=399 => ErrorKind::Conflict,
            400..=499 => ErrorKind::NotFound,
            500..=599 => ErrorKind::Unauthorized,
            _ => ErrorKind::Internal,
        }
    }

    pub fn is_state_error(&self) -> bool {
        self.kind() == ErrorKind::State
    }

    pub fn is_validation_error(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    pub fn is_conflict_error(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    pub fn is_not_found_error(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_unauthorized_error(&self) -> bool {
        self.kind() == ErrorKind::Unauthorized
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for Error {}

impl From<env::VarError> for Error {
    fn from(err: env::VarError) -> Self {
        env_var_error(err)
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        database_error(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        reqwest_error(err)
    }
}

impl From<oso::OsoError> for Error {
    fn from(err: oso::OsoError) -> Self {
        authorizor_error(err)
    }
}

impl From<minijinja::Error> for Error {
    fn from(err: minijinja::Error) -> Self {
        template_error(err)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_message) = match self.kind() {
            ErrorKind::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
            ErrorKind::State => (StatusCode::BAD_REQUEST, self.message.as_str()),
            ErrorKind::Validation => (StatusCode::UNPROCESSABLE_ENTITY, self.message.as_str()),
            ErrorKind::Conflict => (StatusCode::CONFLICT, self.message.as_str()),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, self.message.as_str()),
            ErrorKind::Unauthorized => (StatusCode::FORBIDDEN, self.message.as_str()),
        };

        let body = Json(json!({
            "code": self.code,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

fn error(code: i32, message: &str) -> Error {
    Error {
        code,
        message: message.into(),
    }
}

// internal

pub fn env_var_error(err: env::VarError) -> Error {
    tracing::error!("environment variable error: {}", err);
    error(1, "environment variable error")
}

pub fn database_error<T: Debug>(err: T) -> Error {
    tracing::error!("database error: {:?}", err);
    error(2, "database error")
}

pub fn reqwest_error(err: reqwest::Error) -> Error {
    tracing::error!("reqwest error: {}", err);
    error(3, "reqwest error")
}

pub fn upstream_error() -> Error {
    error(4, "upstream error")
}

pub fn unexpected_error() -> Error {
    error(5, "unexpected error")
}

pub fn authorizor_error(err: oso::OsoError) -> Error {
    tracing::error!("authorizor error: {}", err);
    error(6, "authorizor error")
}

pub fn config_error(message: &str) -> Error {
    tracing::error!("configuration error: {}", message);
    error(7, "configuration error")
}

pub fn template_error(err: minijinja::Error) -> Error {
    tracing::error!("template error: {}", err);
    error(8, "template error")
}

// state

pub fn invalid_state_error() -> Error {
    error(100, "invalid state")
}

pub fn ride_not_available_error() -> Error {
    error(101, "the ride is no longer open to bids")
}

pub fn ride_not_awarded_error() -> Error {
    error(102, "the ride has not been awarded to a driver")
}

pub fn ride_not_completed_error() -> Error {
    error(103, "the ride has not been completed yet")
}

pub fn chat_not_open_error() -> Error {
    error(104, "the conversation opens once a driver has bid on the ride")
}

// validation

pub fn invalid_input_error() -> Error {
    error(200, "invalid input")
}

pub fn invalid_price_error() -> Error {
    error(201, "the proposed price exceeds the ride's ceiling price")
}

pub fn price_not_lower_error() -> Error {
    error(202, "a revised bid must be strictly lower than the current one")
}

pub fn price_above_ceiling_error() -> Error {
    error(203, "the revised price exceeds the ride's ceiling price")
}

pub fn invalid_note_error() -> Error {
    error(204, "a note must be between 1 and 5")
}

pub fn non_positive_price_error() -> Error {
    error(205, "a price must be strictly positive")
}

// conflict

pub fn duplicate_bid_error() -> Error {
    error(300, "you have already bid on this ride")
}

pub fn already_reviewed_error() -> Error {
    error(301, "you have already reviewed this ride")
}

pub fn duplicate_user_error() -> Error {
    error(302, "an account already exists for this identity or email")
}

pub fn bid_changed_error() -> Error {
    error(303, "the bid changed or was withdrawn, reload the ride")
}

// not found

pub fn ride_not_found_error() -> Error {
    error(401, "ride not found")
}

pub fn bid_not_found_error() -> Error {
    error(402, "bid not found")
}

pub fn user_not_found_error() -> Error {
    error(403, "user not found")
}

// authorization

pub fn unauthorized_error() -> Error {
    error(500, "you are not allowed to perform this action")
}

pub fn unauthenticated_error() -> Error {
    error(501, "authentication required")
}

pub fn user_not_validated_error() -> Error {
    error(502, "your account must be validated before you can bid")
}

pub fn not_participant_error() -> Error {
    error(503, "you are not a participant of this ride")
}

#[test]
fn error_kind_test() {
    assert_eq!(duplicate_bid_error().kind(), ErrorKind::Conflict);
    assert_eq!(already_reviewed_error().kind(), ErrorKind::Conflict);
    assert_eq!(invalid_price_error().kind(), ErrorKind::Validation);
    assert_eq!(price_not_lower_error().kind(), ErrorKind::Validation);
    assert_eq!(ride_not_available_error().kind(), ErrorKind::State);
    assert_eq!(ride_not_found_error().kind(), ErrorKind::NotFound);
    assert_eq!(unauthorized_error().kind(), ErrorKind::Unauthorized);
    assert_eq!(unexpected_error().kind(), ErrorKind::Internal);
}

#[test]
fn internal_errors_hide_their_message_test() {
    let response = database_error("connection refused").into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = duplicate_bid_error().into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}
