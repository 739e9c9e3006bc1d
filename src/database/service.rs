//! Database service layer
//!
//! This module provides a high-level interface to database operations

use sqlx::{Postgres, Transaction};

use crate::database::repositories::*;
use crate::database::{health_check, DatabasePool};
use crate::utils::errors::Result;

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pool: DatabasePool,
    pub accounts: AccountRepository,
    pub users: UserRepository,
    pub vendors: VendorRepository,
    pub organisers: OrganiserRepository,
    pub admins: AdminRepository,
    pub events: EventRepository,
    pub bookings: BookingRepository,
    pub payments: PaymentRepository,
    pub payouts: PayoutRepository,
    pub activities: ActivityRepository,
    pub reviews: ReviewRepository,
    pub likes: LikeRepository,
    pub favorites: FavoriteRepository,
    pub disputes: DisputeRepository,
    pub notifications: NotificationRepository,
    pub crowd_sources: CrowdSourceRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            accounts: AccountRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            vendors: VendorRepository::new(pool.clone()),
            organisers: OrganiserRepository::new(pool.clone()),
            admins: AdminRepository::new(pool.clone()),
            events: EventRepository::new(pool.clone()),
            bookings: BookingRepository::new(pool.clone()),
            payments: PaymentRepository::new(pool.clone()),
            payouts: PayoutRepository::new(pool.clone()),
            activities: ActivityRepository::new(pool.clone()),
            reviews: ReviewRepository::new(pool.clone()),
            likes: LikeRepository::new(pool.clone()),
            favorites: FavoriteRepository::new(pool.clone()),
            disputes: DisputeRepository::new(pool.clone()),
            notifications: NotificationRepository::new(pool.clone()),
            crowd_sources: CrowdSourceRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Start a transaction for multi-row state changes
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>> {
        Ok(self.pool.begin().await?)
    }

    pub async fn ping(&self) -> Result<()> {
        health_check(&self.pool).await
    }
}
