use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use crate::cancellation::CancellationSignal;
use crate::error::Result;
use crate::router::{Valid, correlation_id};
use crate::user::{CreateUserCommand, UserDto};

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    #[validate(email(message = "Email must be formatted."))]
    pub email: String,
    #[validate(length(
        min = 1,
        max = 100,
        message = "First name must contain between 1 and 100 characters."
    ))]
    pub first_name: String,
    #[validate(length(
        min = 1,
        max = 100,
        message = "Last name must contain between 1 and 100 characters."
    ))]
    pub last_name: String,
    pub sending_system_id: Uuid,
}

/// Handler to create user.
pub async fn handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, Json<UserDto>)> {
    let command = CreateUserCommand {
        correlation_id: correlation_id(&headers),
        email: body.email,
        first_name: body.first_name,
        last_name: body.last_name,
        sending_system_id: body.sending_system_id,
    };

    // Dropping the request (client gone, timeout) cancels the command.
    let cancellation = CancellationSignal::new();
    let _guard = cancellation.drop_guard();

    let user = state.create_user.handle(command, cancellation).await?;

    Ok((StatusCode::CREATED, Json(user)))
}
