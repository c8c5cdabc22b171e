mod handler;
mod repository;

pub use handler::*;
pub use repository::*;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::mediator::Command;

/// Request to register a new user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateUserCommand {
    pub correlation_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Identifier of the system which emitted the request.
    pub sending_system_id: Uuid,
}

impl Command for CreateUserCommand {
    type Output = UserDto;

    const NAME: &'static str = "CreateUser";

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Request to read a single user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GetUserQuery {
    pub correlation_id: Uuid,
    pub id: Uuid,
}

impl Command for GetUserQuery {
    type Output = UserDto;

    const NAME: &'static str = "GetUser";

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Snapshot of a user returned to callers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// User as saved on database.
#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    /// E-mail as sent by the caller.
    pub email: String,
    /// Lower-cased and trimmed e-mail, unique across users.
    pub email_key: String,
    pub first_name: String,
    pub last_name: String,
    pub sending_system_id: Uuid,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

/// Key used to detect duplicate users.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(
            normalize_email("  FirstUser@Test.com "),
            "firstuser@test.com"
        );
    }

    #[test]
    fn test_dto_is_camel_case() {
        let dto = UserDto {
            id: Uuid::nil(),
            email: "firstuser@test.com".into(),
            first_name: "first".into(),
            last_name: "user".into(),
        };

        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["firstName"], "first");
        assert_eq!(json["lastName"], "user");
        assert_eq!(json["id"], Uuid::nil().to_string());
    }
}
