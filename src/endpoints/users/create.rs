use crate::cancellation::CancellationSignal;
use crate::error::Result;
use crate::mediator::Sender;
use crate::user::{CreateUserCommand, UserDto};

/// Endpoint registering a new user.
pub struct Create<S> {
    sender: S,
}

impl<S> Create<S>
where
    S: Sender<CreateUserCommand>,
{
    pub fn new(sender: S) -> Self {
        Self { sender }
    }

    /// Forward `command` and return the created user.
    ///
    /// # Errors
    ///
    /// Errors of the dispatcher are returned untouched, e.g.
    /// [`ServerError::UserExists`](crate::error::ServerError::UserExists).
    pub async fn handle(
        &self,
        command: CreateUserCommand,
        cancellation: CancellationSignal,
    ) -> Result<UserDto> {
        self.sender.send(command, cancellation).await
    }
}
