use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use uuid::Uuid;

use crate::AppState;
use crate::cancellation::CancellationSignal;
use crate::error::Result;
use crate::router::{ValidPath, correlation_id};
use crate::user::{GetUserQuery, UserDto};

/// Handler to read a user.
pub async fn get(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<UserDto>> {
    let query = GetUserQuery {
        correlation_id: correlation_id(&headers),
        id,
    };

    let cancellation = CancellationSignal::new();
    let _guard = cancellation.drop_guard();

    Ok(Json(state.get_user.handle(query, cancellation).await?))
}
