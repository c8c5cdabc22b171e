use crate::cancellation::CancellationSignal;
use crate::error::Result;
use crate::mediator::Sender;
use crate::user::{GetUserQuery, UserDto};

/// Endpoint reading a user.
pub struct Get<S> {
    sender: S,
}

impl<S> Get<S>
where
    S: Sender<GetUserQuery>,
{
    pub fn new(sender: S) -> Self {
        Self { sender }
    }

    pub async fn handle(
        &self,
        query: GetUserQuery,
        cancellation: CancellationSignal,
    ) -> Result<UserDto> {
        self.sender.send(query, cancellation).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::mock::MockSender;
    use crate::error::ServerError;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_get_user() {
        let query = GetUserQuery {
            correlation_id: Uuid::new_v4(),
            id: Uuid::new_v4(),
        };
        let dto = UserDto {
            id: query.id,
            email: "firstUser@test.com".into(),
            first_name: "first".into(),
            last_name: "user".into(),
        };
        let endpoint = Get::new(
            MockSender::<GetUserQuery>::new().returns(Ok(dto.clone())),
        );
        let cancellation = CancellationSignal::new();

        let user = endpoint
            .handle(query.clone(), cancellation.clone())
            .await
            .unwrap();

        assert_eq!(user, dto);
        let calls = endpoint.sender.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, query);
        assert!(calls[0].1.same_as(&cancellation));
    }

    #[tokio::test]
    async fn test_not_found_is_propagated() {
        let query = GetUserQuery {
            correlation_id: Uuid::new_v4(),
            id: Uuid::new_v4(),
        };
        let endpoint = Get::new(
            MockSender::<GetUserQuery>::new()
                .returns(Err(ServerError::UserNotFound)),
        );

        let err = endpoint
            .handle(query.clone(), CancellationSignal::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ServerError::UserNotFound));
        assert_eq!(endpoint.sender.calls()[0].0, query);
    }
}
