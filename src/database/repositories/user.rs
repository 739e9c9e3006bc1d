//! User repository implementation

use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::user::{CreateUserRequest, UpdateUserRequest, User};
use crate::utils::errors::{Result, WaddleError};
use crate::utils::helpers::Pagination;

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, phone, avatar_url, \
    fcm_token, is_banned, deleted_at, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user
    pub async fn create(&self, request: CreateUserRequest) -> Result<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name, phone)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(request.email)
        .bind(request.password_hash)
        .bind(request.first_name.trim())
        .bind(request.last_name.trim())
        .bind(request.phone)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| WaddleError::from_db(e, "an account with this email already exists"))
    }

    /// Find a user by ID, deleted accounts excluded
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND deleted_at IS NULL"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Update profile fields
    pub async fn update(&self, id: Uuid, request: UpdateUserRequest) -> Result<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                phone = COALESCE($4, phone),
                avatar_url = COALESCE($5, avatar_url),
                updated_at = $6
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(request.first_name.map(|v| v.trim().to_string()))
        .bind(request.last_name.map(|v| v.trim().to_string()))
        .bind(request.phone)
        .bind(request.avatar_url)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| WaddleError::not_found("user", id))
    }

    /// Soft delete: the row stays for booking history, the email is released
    pub async fn soft_delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET deleted_at = NOW(),
                email = 'deleted+' || id::text || '@waddle.invalid',
                fcm_token = NULL,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(WaddleError::not_found("user", id));
        }
        Ok(())
    }

    /// List users, optionally filtered by an email or name fragment
    pub async fn list(&self, search: Option<&str>, page: Pagination) -> Result<(Vec<User>, i64)> {
        fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, search: Option<&str>) {
            qb.push(" WHERE deleted_at IS NULL");
            if let Some(q) = search.filter(|q| !q.trim().is_empty()) {
                let pattern = format!("%{}%", q.trim());
                qb.push(" AND (email ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR first_name || ' ' || last_name ILIKE ")
                    .push_bind(pattern)
                    .push(")");
            }
        }

        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {USER_COLUMNS} FROM users"));
        push_filter(&mut qb, search);
        qb.push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let users = qb.build_query_as::<User>().fetch_all(&self.pool).await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        push_filter(&mut count, search);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        Ok((users, total))
    }

    /// Ban/unban user
    pub async fn set_ban_status(&self, id: Uuid, is_banned: bool) -> Result<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET is_banned = $2, updated_at = $3
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(is_banned)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| WaddleError::not_found("user", id))
    }
}
