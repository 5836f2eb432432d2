use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;

use emporium_core::{Address, Email, Phone, Role, UserId};

use super::{PgDatabase, conflict_on_unique};
use crate::db::{Page, RepositoryError, UserStore};
use crate::models::{NewUser, ProfileChanges, User};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, address, phone, is_active, \
                            email_verified, last_login, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    address: Option<Json<Address>>,
    phone: Option<String>,
    is_active: bool,
    email_verified: bool,
    last_login: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| RepositoryError::corrupt("email", e))?;
        let role: Role = row
            .role
            .parse()
            .map_err(|e| RepositoryError::corrupt("role", e))?;
        let phone = row
            .phone
            .as_deref()
            .map(Phone::parse)
            .transpose()
            .map_err(|e| RepositoryError::corrupt("phone", e))?;

        Ok(Self {
            id: UserId::new(row.id),
            name: row.name,
            email,
            password_hash: row.password_hash,
            role,
            address: row.address.map(|Json(a)| a),
            phone,
            is_active: row.is_active,
            email_verified: row.email_verified,
            last_login: row.last_login,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl UserStore for PgDatabase {
    async fn count_users(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let row: UserRow = sqlx::query_as(&format!(
            r"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email"))?;

        row.try_into()
    }

    async fn update_user(&self, user: &User) -> Result<User, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            r"
            UPDATE users
            SET name = $2, email = $3, role = $4, address = $5, phone = $6,
                is_active = $7, email_verified = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(user.address.as_ref().map(Json))
        .bind(user.phone.as_ref().map(Phone::as_str))
        .bind(user.is_active)
        .bind(user.email_verified)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email"))?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    async fn record_login(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            r"
            UPDATE users
            SET last_login = NOW()
            WHERE id = $1 AND is_active
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn set_password_hash(&self, id: UserId, hash: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1 AND is_active",
        )
        .bind(id)
        .bind(hash)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_profile(
        &self,
        id: UserId,
        changes: &ProfileChanges,
    ) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            r"
            UPDATE users
            SET name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                address = COALESCE($4, address),
                updated_at = NOW()
            WHERE id = $1 AND is_active
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.phone.as_ref().map(Phone::as_str))
        .bind(changes.address.as_ref().map(Json))
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_users(&self, page: Option<Page>) -> Result<Vec<User>, RepositoryError> {
        let mut sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC");
        if let Some(page) = page {
            sql.push_str(&format!(" LIMIT {} OFFSET {}", page.limit, page.offset()));
        }
        let rows: Vec<UserRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }
}
