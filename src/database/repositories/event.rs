//! Event repository implementation

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::event::{
    CreateEventRequest, Event, EventFilter, EventOwner, EventStatus, ModerationStatus,
};
use crate::utils::errors::{Result, WaddleError};
use crate::utils::helpers::Pagination;

pub(crate) const EVENT_COLUMNS: &str = "id, title, description, category, venue_name, address, city, \
    image_url, price_cents, currency, capacity, tickets_booked, min_age, max_age, starts_at, ends_at, \
    status, moderation_status, moderation_note, recurrence, recurrence_until, parent_event_id, \
    vendor_id, organiser_id, created_at, updated_at";

/// Keeps events of banned providers out, and of unapproved ones when approval is required
const PROVIDER_STANDING: &str = "NOT EXISTS (SELECT 1 FROM vendors p WHERE p.id = events.vendor_id \
    AND (p.is_banned OR (NOT p.is_approved AND $4))) \
    AND NOT EXISTS (SELECT 1 FROM organisers p WHERE p.id = events.organiser_id \
    AND (p.is_banned OR (NOT p.is_approved AND $4)))";

fn push_provider_standing(qb: &mut QueryBuilder<'_, Postgres>, require_approval: bool) {
    qb.push(" AND NOT EXISTS (SELECT 1 FROM vendors p WHERE p.id = events.vendor_id AND (p.is_banned OR (NOT p.is_approved AND ")
        .push_bind(require_approval)
        .push(")))");
    qb.push(" AND NOT EXISTS (SELECT 1 FROM organisers p WHERE p.id = events.organiser_id AND (p.is_banned OR (NOT p.is_approved AND ")
        .push_bind(require_approval)
        .push(")))");
}

/// Like and review counters of one event
#[derive(Debug, Clone, Default, FromRow)]
pub struct EventStats {
    pub like_count: i64,
    pub review_count: i64,
    pub average_rating: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new draft event
    pub async fn create(
        &self,
        owner: EventOwner,
        request: CreateEventRequest,
        currency: &str,
        moderation_status: ModerationStatus,
    ) -> Result<Event> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events (title, description, category, venue_name, address, city, image_url,
                price_cents, currency, capacity, min_age, max_age, starts_at, ends_at,
                moderation_status, recurrence, recurrence_until, vendor_id, organiser_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(request.title.trim())
        .bind(request.description)
        .bind(request.category.trim())
        .bind(request.venue_name)
        .bind(request.address)
        .bind(request.city)
        .bind(request.image_url)
        .bind(request.price_cents)
        .bind(currency.to_lowercase())
        .bind(request.capacity)
        .bind(request.min_age)
        .bind(request.max_age)
        .bind(request.starts_at)
        .bind(request.ends_at)
        .bind(moderation_status)
        .bind(request.recurrence)
        .bind(request.recurrence_until)
        .bind(owner.vendor_id())
        .bind(owner.organiser_id())
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    /// Find event by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    /// Load and lock an event row inside a transaction
    pub async fn find_for_update(conn: &mut PgConnection, id: Uuid) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(event)
    }

    /// Public catalogue: published, approved, upcoming unless a range is given
    pub async fn list_public(
        &self,
        filter: &EventFilter,
        page: Pagination,
        now: DateTime<Utc>,
        require_approval: bool,
    ) -> Result<(Vec<Event>, i64)> {
        fn push_filter(
            qb: &mut QueryBuilder<'_, Postgres>,
            filter: &EventFilter,
            now: DateTime<Utc>,
            require_approval: bool,
        ) {
            qb.push(" WHERE status = 'published' AND moderation_status = 'approved'");
            push_provider_standing(qb, require_approval);
            qb.push(" AND starts_at >= ").push_bind(filter.from.unwrap_or(now).max(now));
            if let Some(to) = filter.to {
                qb.push(" AND starts_at <= ").push_bind(to);
            }
            if let Some(category) = filter.category.as_ref().filter(|c| !c.trim().is_empty()) {
                qb.push(" AND category ILIKE ").push_bind(category.trim().to_string());
            }
            if let Some(city) = filter.city.as_ref().filter(|c| !c.trim().is_empty()) {
                qb.push(" AND city ILIKE ").push_bind(city.trim().to_string());
            }
            if let Some(q) = filter.q.as_ref().filter(|q| !q.trim().is_empty()) {
                let pattern = format!("%{}%", q.trim());
                qb.push(" AND (title ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR description ILIKE ")
                    .push_bind(pattern)
                    .push(")");
            }
            if let Some(vendor_id) = filter.vendor_id {
                qb.push(" AND vendor_id = ").push_bind(vendor_id);
            }
            if let Some(organiser_id) = filter.organiser_id {
                qb.push(" AND organiser_id = ").push_bind(organiser_id);
            }
        }

        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {EVENT_COLUMNS} FROM events"));
        push_filter(&mut qb, filter, now, require_approval);
        qb.push(" ORDER BY starts_at ASC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let events = qb.build_query_as::<Event>().fetch_all(&self.pool).await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM events");
        push_filter(&mut count, filter, now, require_approval);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        Ok((events, total))
    }

    /// All events of one provider, newest first
    pub async fn list_by_owner(&self, owner: EventOwner, page: Pagination) -> Result<(Vec<Event>, i64)> {
        let column = match owner {
            EventOwner::Vendor(_) => "vendor_id",
            EventOwner::Organiser(_) => "organiser_id",
        };
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE {column} = $1 ORDER BY starts_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(owner.id())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM events WHERE {column} = $1"))
            .bind(owner.id())
            .fetch_one(&self.pool)
            .await?;

        Ok((events, total))
    }

    /// Moderation queue
    pub async fn list_by_moderation(
        &self,
        status: Option<ModerationStatus>,
        page: Pagination,
    ) -> Result<(Vec<Event>, i64)> {
        let events = sqlx::query_as::<_, Event>(&format!(
            r#"
            SELECT {EVENT_COLUMNS} FROM events
            WHERE ($1::moderation_status IS NULL OR moderation_status = $1)
            ORDER BY created_at ASC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(status)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM events WHERE ($1::moderation_status IS NULL OR moderation_status = $1)",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok((events, total))
    }

    /// Persist the editable fields of an already validated event
    pub async fn update(&self, event: &Event) -> Result<Event> {
        sqlx::query_as::<_, Event>(&format!(
            r#"
            UPDATE events
            SET title = $2, description = $3, category = $4, venue_name = $5, address = $6,
                city = $7, image_url = $8, price_cents = $9, capacity = $10, min_age = $11,
                max_age = $12, starts_at = $13, ends_at = $14, recurrence = $15,
                recurrence_until = $16, updated_at = NOW()
            WHERE id = $1 AND status IN ('draft', 'published') AND tickets_booked <= $10
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.category)
        .bind(&event.venue_name)
        .bind(&event.address)
        .bind(&event.city)
        .bind(&event.image_url)
        .bind(event.price_cents)
        .bind(event.capacity)
        .bind(event.min_age)
        .bind(event.max_age)
        .bind(event.starts_at)
        .bind(event.ends_at)
        .bind(event.recurrence)
        .bind(event.recurrence_until)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            WaddleError::Conflict("event changed while it was being edited".to_string())
        })
    }

    /// Move an event between statuses if it is still in `from`
    pub async fn transition(
        conn: &mut PgConnection,
        id: Uuid,
        from: EventStatus,
        to: EventStatus,
    ) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            UPDATE events SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_optional(conn)
        .await?;

        Ok(event)
    }

    pub async fn moderate(&self, id: Uuid, status: ModerationStatus, note: Option<&str>) -> Result<Event> {
        sqlx::query_as::<_, Event>(&format!(
            r#"
            UPDATE events SET moderation_status = $2, moderation_note = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status)
        .bind(note)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| WaddleError::not_found("event", id))
    }

    /// Lock an event and its generated occurrences, returning their ids
    pub async fn lock_series(conn: &mut PgConnection, id: Uuid) -> Result<Vec<Uuid>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT id FROM events WHERE id = $1 OR parent_event_id = $1 ORDER BY id FOR UPDATE",
        )
        .bind(id)
        .fetch_all(conn)
        .await?;

        Ok(ids)
    }

    /// Delete an event, and its occurrences, when none holds a pending or confirmed booking
    ///
    /// The rows are locked first, so a booking that reserves seats
    /// concurrently either commits before the check or waits for the delete.
    pub async fn delete_if_unbooked(&self, id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let ids = Self::lock_series(&mut *tx, id).await?;
        if ids.is_empty() {
            return Ok(true);
        }

        let active: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM bookings WHERE event_id = ANY($1) AND status IN ('pending', 'confirmed'))",
        )
        .bind(&ids[..])
        .fetch_one(&mut *tx)
        .await?;
        if active {
            return Ok(false);
        }

        // Historic bookings keep their rows; detach them before removing the events.
        sqlx::query(
            "DELETE FROM payments WHERE booking_id IN (SELECT id FROM bookings WHERE event_id = ANY($1))",
        )
        .bind(&ids[..])
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            "DELETE FROM disputes WHERE booking_id IN (SELECT id FROM bookings WHERE event_id = ANY($1))",
        )
        .bind(&ids[..])
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM bookings WHERE event_id = ANY($1)")
            .bind(&ids[..])
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM events WHERE id = ANY($1)")
            .bind(&ids[..])
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Reserve seats with a single conditional update
    ///
    /// Returns `None` when the event is not bookable or lacks capacity.
    pub async fn reserve_seats(
        conn: &mut PgConnection,
        id: Uuid,
        quantity: i32,
        now: DateTime<Utc>,
        require_approval: bool,
    ) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            UPDATE events SET tickets_booked = tickets_booked + $2, updated_at = NOW()
            WHERE id = $1
              AND status = 'published'
              AND moderation_status = 'approved'
              AND starts_at > $3
              AND tickets_booked + $2 <= capacity
              AND {PROVIDER_STANDING}
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(quantity)
        .bind(now)
        .bind(require_approval)
        .fetch_optional(conn)
        .await?;

        Ok(event)
    }

    pub async fn release_seats(conn: &mut PgConnection, id: Uuid, quantity: i32) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE events SET tickets_booked = GREATEST(tickets_booked - $2, 0), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(quantity)
        .execute(conn)
        .await?;

        Ok(())
    }

    pub async fn stats(&self, id: Uuid) -> Result<EventStats> {
        let stats = sqlx::query_as::<_, EventStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM likes WHERE event_id = $1) AS like_count,
                (SELECT COUNT(*) FROM reviews WHERE event_id = $1) AS review_count,
                (SELECT AVG(rating)::FLOAT8 FROM reviews WHERE event_id = $1) AS average_rating
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }

    /// Generated occurrences of a series that are not yet finished or cancelled
    pub async fn open_occurrences(&self, parent_id: Uuid) -> Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            r#"
            SELECT {EVENT_COLUMNS} FROM events
            WHERE parent_event_id = $1 AND status IN ('draft', 'published')
            ORDER BY starts_at
            "#
        ))
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Parent events whose recurrence window is still open
    pub async fn recurring_parents(&self, now: DateTime<Utc>) -> Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            r#"
            SELECT {EVENT_COLUMNS} FROM events
            WHERE recurrence <> 'none'
              AND parent_event_id IS NULL
              AND status = 'published'
              AND moderation_status = 'approved'
              AND recurrence_until > $1
            ORDER BY starts_at
            "#
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Insert one generated occurrence; `false` if it already exists
    pub async fn insert_occurrence(
        &self,
        parent: &Event,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO events (title, description, category, venue_name, address, city, image_url,
                price_cents, currency, capacity, tickets_booked, min_age, max_age, starts_at, ends_at,
                status, moderation_status, recurrence, parent_event_id, vendor_id, organiser_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 0, $11, $12, $13, $14,
                'published', 'approved', 'none', $15, $16, $17)
            ON CONFLICT (parent_event_id, starts_at) DO NOTHING
            "#,
        )
        .bind(&parent.title)
        .bind(&parent.description)
        .bind(&parent.category)
        .bind(&parent.venue_name)
        .bind(&parent.address)
        .bind(&parent.city)
        .bind(&parent.image_url)
        .bind(parent.price_cents)
        .bind(&parent.currency)
        .bind(parent.capacity)
        .bind(parent.min_age)
        .bind(parent.max_age)
        .bind(starts_at)
        .bind(ends_at)
        .bind(parent.id)
        .bind(parent.vendor_id)
        .bind(parent.organiser_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Mark published events that have ended as completed
    pub async fn complete_finished(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE events SET status = 'completed', updated_at = NOW() WHERE status = 'published' AND ends_at < $1",
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
