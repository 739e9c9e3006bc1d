//! Organiser repository implementation

use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::organiser::{CreateOrganiserRequest, Organiser, UpdateOrganiserRequest};
use crate::utils::errors::{Result, WaddleError};
use crate::utils::helpers::Pagination;

const ORGANISER_COLUMNS: &str = "id, email, password_hash, name, organisation_name, phone, bio, \
    avatar_url, stripe_account_id, fcm_token, is_approved, is_banned, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct OrganiserRepository {
    pool: PgPool,
}

impl OrganiserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, request: CreateOrganiserRequest) -> Result<Organiser> {
        sqlx::query_as::<_, Organiser>(&format!(
            r#"
            INSERT INTO organisers (email, password_hash, name, organisation_name, phone, is_approved)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ORGANISER_COLUMNS}
            "#
        ))
        .bind(request.email)
        .bind(request.password_hash)
        .bind(request.name.trim())
        .bind(request.organisation_name)
        .bind(request.phone)
        .bind(request.is_approved)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| WaddleError::from_db(e, "an account with this email already exists"))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Organiser>> {
        let organiser = sqlx::query_as::<_, Organiser>(&format!(
            "SELECT {ORGANISER_COLUMNS} FROM organisers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(organiser)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Organiser>> {
        let organiser = sqlx::query_as::<_, Organiser>(&format!(
            "SELECT {ORGANISER_COLUMNS} FROM organisers WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(organiser)
    }

    pub async fn update(&self, id: Uuid, request: UpdateOrganiserRequest) -> Result<Organiser> {
        sqlx::query_as::<_, Organiser>(&format!(
            r#"
            UPDATE organisers
            SET name = COALESCE($2, name),
                organisation_name = COALESCE($3, organisation_name),
                phone = COALESCE($4, phone),
                bio = COALESCE($5, bio),
                avatar_url = COALESCE($6, avatar_url),
                stripe_account_id = COALESCE($7, stripe_account_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ORGANISER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(request.name.map(|v| v.trim().to_string()))
        .bind(request.organisation_name)
        .bind(request.phone)
        .bind(request.bio)
        .bind(request.avatar_url)
        .bind(request.stripe_account_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| WaddleError::not_found("organiser", id))
    }

    pub async fn list(
        &self,
        public_only: bool,
        search: Option<&str>,
        page: Pagination,
    ) -> Result<(Vec<Organiser>, i64)> {
        fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, public_only: bool, search: Option<&str>) {
            qb.push(" WHERE TRUE");
            if public_only {
                qb.push(" AND is_approved AND NOT is_banned");
            }
            if let Some(q) = search.filter(|q| !q.trim().is_empty()) {
                let pattern = format!("%{}%", q.trim());
                qb.push(" AND (name ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR organisation_name ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR email ILIKE ")
                    .push_bind(pattern)
                    .push(")");
            }
        }

        let mut qb =
            QueryBuilder::<Postgres>::new(format!("SELECT {ORGANISER_COLUMNS} FROM organisers"));
        push_filter(&mut qb, public_only, search);
        qb.push(" ORDER BY name LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let organisers = qb.build_query_as::<Organiser>().fetch_all(&self.pool).await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM organisers");
        push_filter(&mut count, public_only, search);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        Ok((organisers, total))
    }

    pub async fn set_approval(&self, id: Uuid, approved: bool) -> Result<Organiser> {
        sqlx::query_as::<_, Organiser>(&format!(
            "UPDATE organisers SET is_approved = $2, updated_at = NOW() WHERE id = $1 RETURNING {ORGANISER_COLUMNS}"
        ))
        .bind(id)
        .bind(approved)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| WaddleError::not_found("organiser", id))
    }

    pub async fn set_ban_status(&self, id: Uuid, is_banned: bool) -> Result<Organiser> {
        sqlx::query_as::<_, Organiser>(&format!(
            "UPDATE organisers SET is_banned = $2, updated_at = NOW() WHERE id = $1 RETURNING {ORGANISER_COLUMNS}"
        ))
        .bind(id)
        .bind(is_banned)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| WaddleError::not_found("organiser", id))
    }
}
