//! Vendor repository implementation

use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::vendor::{CreateVendorRequest, UpdateVendorRequest, Vendor};
use crate::utils::errors::{Result, WaddleError};
use crate::utils::helpers::Pagination;

const VENDOR_COLUMNS: &str = "id, email, password_hash, business_name, contact_name, phone, \
    description, website, address, logo_url, stripe_account_id, fcm_token, is_approved, is_banned, \
    created_at, updated_at";

#[derive(Debug, Clone)]
pub struct VendorRepository {
    pool: PgPool,
}

impl VendorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, request: CreateVendorRequest) -> Result<Vendor> {
        sqlx::query_as::<_, Vendor>(&format!(
            r#"
            INSERT INTO vendors (email, password_hash, business_name, contact_name, phone, is_approved)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {VENDOR_COLUMNS}
            "#
        ))
        .bind(request.email)
        .bind(request.password_hash)
        .bind(request.business_name.trim())
        .bind(request.contact_name)
        .bind(request.phone)
        .bind(request.is_approved)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| WaddleError::from_db(e, "an account with this email already exists"))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Vendor>> {
        let vendor = sqlx::query_as::<_, Vendor>(&format!(
            "SELECT {VENDOR_COLUMNS} FROM vendors WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(vendor)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Vendor>> {
        let vendor = sqlx::query_as::<_, Vendor>(&format!(
            "SELECT {VENDOR_COLUMNS} FROM vendors WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(vendor)
    }

    pub async fn update(&self, id: Uuid, request: UpdateVendorRequest) -> Result<Vendor> {
        sqlx::query_as::<_, Vendor>(&format!(
            r#"
            UPDATE vendors
            SET business_name = COALESCE($2, business_name),
                contact_name = COALESCE($3, contact_name),
                phone = COALESCE($4, phone),
                description = COALESCE($5, description),
                website = COALESCE($6, website),
                address = COALESCE($7, address),
                logo_url = COALESCE($8, logo_url),
                stripe_account_id = COALESCE($9, stripe_account_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {VENDOR_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(request.business_name.map(|v| v.trim().to_string()))
        .bind(request.contact_name)
        .bind(request.phone)
        .bind(request.description)
        .bind(request.website)
        .bind(request.address)
        .bind(request.logo_url)
        .bind(request.stripe_account_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| WaddleError::not_found("vendor", id))
    }

    /// List vendors; the public catalogue only shows approved, unbanned accounts
    pub async fn list(
        &self,
        public_only: bool,
        search: Option<&str>,
        page: Pagination,
    ) -> Result<(Vec<Vendor>, i64)> {
        fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, public_only: bool, search: Option<&str>) {
            qb.push(" WHERE TRUE");
            if public_only {
                qb.push(" AND is_approved AND NOT is_banned");
            }
            if let Some(q) = search.filter(|q| !q.trim().is_empty()) {
                let pattern = format!("%{}%", q.trim());
                qb.push(" AND (business_name ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR email ILIKE ")
                    .push_bind(pattern)
                    .push(")");
            }
        }

        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {VENDOR_COLUMNS} FROM vendors"));
        push_filter(&mut qb, public_only, search);
        qb.push(" ORDER BY business_name LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let vendors = qb.build_query_as::<Vendor>().fetch_all(&self.pool).await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM vendors");
        push_filter(&mut count, public_only, search);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        Ok((vendors, total))
    }

    pub async fn set_approval(&self, id: Uuid, approved: bool) -> Result<Vendor> {
        sqlx::query_as::<_, Vendor>(&format!(
            "UPDATE vendors SET is_approved = $2, updated_at = NOW() WHERE id = $1 RETURNING {VENDOR_COLUMNS}"
        ))
        .bind(id)
        .bind(approved)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| WaddleError::not_found("vendor", id))
    }

    pub async fn set_ban_status(&self, id: Uuid, is_banned: bool) -> Result<Vendor> {
        sqlx::query_as::<_, Vendor>(&format!(
            "UPDATE vendors SET is_banned = $2, updated_at = NOW() WHERE id = $1 RETURNING {VENDOR_COLUMNS}"
        ))
        .bind(id)
        .bind(is_banned)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| WaddleError::not_found("vendor", id))
    }
}
