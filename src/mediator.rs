//! Command dispatching.
//!
//! A [`Command`] is routed by [`Mediator`] to the single [`Handler`] that was
//! registered for it. Callers only depend on the [`Sender`] capability.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::Instrument;
use uuid::Uuid;

use crate::cancellation::CancellationSignal;
use crate::error::{Result, ServerError};
use crate::user::{CreateUserCommand, GetUserQuery, UserDto};

/// Immutable request for a state change or a read.
pub trait Command: Send + Sync + 'static {
    /// Value produced when the command succeeds.
    type Output: Send + 'static;

    /// Name used in logs and errors.
    const NAME: &'static str;

    /// Request-tracing identifier supplied by the caller.
    fn correlation_id(&self) -> Uuid;
}

/// Executes one kind of command.
#[async_trait]
pub trait Handler<C: Command>: Send + Sync {
    async fn handle(
        &self,
        command: C,
        cancellation: CancellationSignal,
    ) -> Result<C::Output>;
}

/// Capability to send a command and await its typed result.
#[async_trait]
pub trait Sender<C: Command>: Send + Sync {
    async fn send(
        &self,
        command: C,
        cancellation: CancellationSignal,
    ) -> Result<C::Output>;
}

#[async_trait]
impl<C, S> Sender<C> for Arc<S>
where
    C: Command,
    S: Sender<C> + ?Sized,
{
    async fn send(
        &self,
        command: C,
        cancellation: CancellationSignal,
    ) -> Result<C::Output> {
        (**self).send(command, cancellation).await
    }
}

/// Routes each command kind to exactly one handler.
#[derive(Clone)]
pub struct Mediator {
    create_user: Arc<dyn Handler<CreateUserCommand>>,
    get_user: Arc<dyn Handler<GetUserQuery>>,
}

impl Mediator {
    /// Create a new [`MediatorBuilder`].
    pub fn builder() -> MediatorBuilder {
        MediatorBuilder::default()
    }
}

#[async_trait]
impl Sender<CreateUserCommand> for Mediator {
    async fn send(
        &self,
        command: CreateUserCommand,
        cancellation: CancellationSignal,
    ) -> Result<UserDto> {
        dispatch(self.create_user.as_ref(), command, cancellation).await
    }
}

#[async_trait]
impl Sender<GetUserQuery> for Mediator {
    async fn send(
        &self,
        command: GetUserQuery,
        cancellation: CancellationSignal,
    ) -> Result<UserDto> {
        dispatch(self.get_user.as_ref(), command, cancellation).await
    }
}

async fn dispatch<C: Command>(
    handler: &dyn Handler<C>,
    command: C,
    cancellation: CancellationSignal,
) -> Result<C::Output> {
    let span = tracing::info_span!(
        "dispatch",
        command = C::NAME,
        correlation_id = %command.correlation_id(),
    );

    if cancellation.is_cancelled() {
        span.in_scope(|| tracing::debug!("command cancelled before dispatch"));
        return Err(ServerError::Cancelled);
    }

    handler.handle(command, cancellation).instrument(span).await
}

/// Builder for [`Mediator`].
#[derive(Default)]
pub struct MediatorBuilder {
    create_user: Option<Arc<dyn Handler<CreateUserCommand>>>,
    get_user: Option<Arc<dyn Handler<GetUserQuery>>>,
}

impl MediatorBuilder {
    /// Register the handler of [`CreateUserCommand`].
    pub fn create_user<H>(mut self, handler: H) -> Self
    where
        H: Handler<CreateUserCommand> + 'static,
    {
        self.create_user = Some(Arc::new(handler));
        self
    }

    /// Register the handler of [`GetUserQuery`].
    pub fn get_user<H>(mut self, handler: H) -> Self
    where
        H: Handler<GetUserQuery> + 'static,
    {
        self.get_user = Some(Arc::new(handler));
        self
    }

    /// Build [`Mediator`].
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::MissingHandler`] if a command kind has no
    /// handler.
    pub fn build(self) -> Result<Mediator> {
        Ok(Mediator {
            create_user: self.create_user.ok_or(ServerError::MissingHandler(
                CreateUserCommand::NAME,
            ))?,
            get_user: self
                .get_user
                .ok_or(ServerError::MissingHandler(GetUserQuery::NAME))?,
        })
    }
}
