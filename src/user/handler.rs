//! Command handlers for users.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::cancellation::CancellationSignal;
use crate::error::{Result, ServerError};
use crate::mediator::Handler;
use crate::user::{
    CreateUserCommand, GetUserQuery, User, UserDto, UserRepository,
    normalize_email,
};

/// Register users, e-mail being the uniqueness key.
#[derive(Clone)]
pub struct CreateUserHandler {
    repo: Arc<dyn UserRepository>,
}

impl CreateUserHandler {
    /// Create a new [`CreateUserHandler`].
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl Handler<CreateUserCommand> for CreateUserHandler {
    async fn handle(
        &self,
        command: CreateUserCommand,
        cancellation: CancellationSignal,
    ) -> Result<UserDto> {
        let user = User {
            id: Uuid::new_v4(),
            email_key: normalize_email(&command.email),
            email: command.email,
            first_name: command.first_name,
            last_name: command.last_name,
            sending_system_id: command.sending_system_id,
        };

        tokio::select! {
            biased;
            _ = cancellation.cancelled() => return Err(ServerError::Cancelled),
            result = self.repo.insert(&user) => result?,
        }

        metrics::counter!("users_created_total").increment(1);
        tracing::info!(
            user_id = %user.id,
            correlation_id = %command.correlation_id,
            sending_system_id = %user.sending_system_id,
            "user created"
        );

        Ok(user.into())
    }
}

/// Read users by identifier.
#[derive(Clone)]
pub struct GetUserHandler {
    repo: Arc<dyn UserRepository>,
}

impl GetUserHandler {
    /// Create a new [`GetUserHandler`].
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl Handler<GetUserQuery> for GetUserHandler {
    async fn handle(
        &self,
        query: GetUserQuery,
        cancellation: CancellationSignal,
    ) -> Result<UserDto> {
        let user = tokio::select! {
            biased;
            _ = cancellation.cancelled() => return Err(ServerError::Cancelled),
            result = self.repo.find_by_id(query.id) => result?,
        };

        user.map(UserDto::from).ok_or(ServerError::UserNotFound)
    }
}
