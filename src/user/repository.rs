//! Handle user persistence.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{Result, ServerError};
use crate::user::User;

/// Port for user persistence operations.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::UserExists`] if another user already owns the
    /// same e-mail.
    async fn insert(&self, user: &User) -> Result<()>;

    /// Find a user by its identifier.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
}

#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: Pool<Postgres>,
}

impl PostgresUserRepository {
    /// Create a new [`PostgresUserRepository`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn insert(&self, user: &User) -> Result<()> {
        let result = sqlx::query(
            r#"INSERT INTO users
                (id, email, email_key, first_name, last_name, sending_system_id)
                VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.email_key)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.sending_system_id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                Err(ServerError::UserExists)
            },
            Err(err) => Err(err.into()),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"SELECT
                id, email, email_key, first_name, last_name, sending_system_id
                FROM users WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

/// Volatile repository, used when no database is configured and in tests.
#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<Store>,
}

#[derive(Default)]
struct Store {
    by_id: HashMap<Uuid, User>,
    by_email: HashMap<String, Uuid>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn insert(&self, user: &User) -> Result<()> {
        let mut store = self.users.write().await;

        if store.by_email.contains_key(&user.email_key)
            || store.by_id.contains_key(&user.id)
        {
            return Err(ServerError::UserExists);
        }

        store.by_email.insert(user.email_key.clone(), user.id);
        store.by_id.insert(user.id, user.clone());

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().await.by_id.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::normalize_email;

    fn user(email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: email.into(),
            email_key: normalize_email(email),
            first_name: "first".into(),
            last_name: "user".into(),
            sending_system_id: Uuid::new_v4(),
        }
    }

    #[tokio::test]
    async fn test_memory_insert_and_find() {
        let repo = MemoryUserRepository::new();
        let user = user("firstUser@test.com");

        repo.insert(&user).await.unwrap();

        assert_eq!(repo.find_by_id(user.id).await.unwrap(), Some(user));
        assert_eq!(repo.find_by_id(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_rejects_duplicate_email() {
        let repo = MemoryUserRepository::new();
        repo.insert(&user("firstUser@test.com")).await.unwrap();

        let err = repo
            .insert(&user(" FIRSTUSER@test.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, ServerError::UserExists));
    }

    #[tokio::test]
    async fn test_memory_concurrent_inserts_keep_one() {
        let repo = std::sync::Arc::new(MemoryUserRepository::new());

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let repo = std::sync::Arc::clone(&repo);
                tokio::spawn(async move {
                    repo.insert(&user("race@test.com")).await
                })
            })
            .collect();

        let mut created = 0;
        for task in tasks {
            if task.await.unwrap().is_ok() {
                created += 1;
            }
        }

        assert_eq!(created, 1);
    }

    #[sqlx::test]
    async fn test_postgres_insert_and_find(pool: Pool<Postgres>) {
        let repo = PostgresUserRepository::new(pool);
        let user = user("firstUser@test.com");

        repo.insert(&user).await.unwrap();

        let found = repo.find_by_id(user.id).await.unwrap();
        assert_eq!(found, Some(user));
        assert_eq!(found.unwrap().email, "firstUser@test.com");
        assert_eq!(repo.find_by_id(Uuid::new_v4()).await.unwrap(), None);
    }

    #[sqlx::test]
    async fn test_postgres_rejects_duplicate_email(pool: Pool<Postgres>) {
        let repo = PostgresUserRepository::new(pool);
        let first = user("firstUser@test.com");
        repo.insert(&first).await.unwrap();

        let err = repo
            .insert(&user(" FIRSTUSER@test.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, ServerError::UserExists));
        assert_eq!(repo.find_by_id(first.id).await.unwrap(), Some(first));
    }
}
