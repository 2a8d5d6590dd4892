//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{EmailAddress, UserAccount, UserId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::UserRow;
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    map_basic_pool_error(error, UserPersistenceError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> UserPersistenceError {
    map_basic_diesel_error(
        error,
        UserPersistenceError::query,
        UserPersistenceError::connection,
    )
}

fn to_account(row: UserRow) -> Result<UserAccount, UserPersistenceError> {
    UserAccount::try_from(row).map_err(UserPersistenceError::query)
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserAccount>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        users::table
            .filter(users::id.eq(id.as_uuid()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(to_account)
            .transpose()
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<UserAccount>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        users::table
            .filter(users::email.eq(email.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(to_account)
            .transpose()
    }

    async fn set_active(
        &self,
        email: &EmailAddress,
        is_active: bool,
    ) -> Result<bool, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(users::table.filter(users::email.eq(email.as_ref())))
            .set(users::is_active.eq(is_active))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }
}

#[cfg(test)]
mod tests {
    //! Row conversion coverage; queries run against PostgreSQL in deployment.
    use rstest::rstest;
    use uuid::Uuid;

    use super::*;

    #[rstest]
    fn rows_with_invalid_email_become_query_errors() {
        let row = UserRow {
            id: Uuid::new_v4(),
            email: "not-an-email".to_owned(),
            password_hash: String::new(),
            is_active: true,
            is_staff: false,
        };
        assert!(matches!(
            to_account(row),
            Err(UserPersistenceError::Query { .. })
        ));
    }

    #[rstest]
    fn rows_convert_to_accounts() {
        let id = Uuid::new_v4();
        let account = to_account(UserRow {
            id,
            email: "staff@example.com".to_owned(),
            password_hash: "$argon2id$...".to_owned(),
            is_active: false,
            is_staff: true,
        })
        .expect("valid row");
        assert_eq!(account.id.as_uuid(), &id);
        assert!(account.is_staff);
        assert!(!account.is_active);
    }
}
