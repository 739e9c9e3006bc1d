//! Database repositories module
//!
//! This module contains all repository implementations for data access

pub mod account;
pub mod activity;
pub mod admin;
pub mod booking;
pub mod crowd_source;
pub mod dispute;
pub mod engagement;
pub mod event;
pub mod notification;
pub mod organiser;
pub mod payment;
pub mod payout;
pub mod review;
pub mod stripe_event;
pub mod user;
pub mod vendor;

// Re-export repositories
pub use account::{AccountRepository, AccountState};
pub use activity::ActivityRepository;
pub use admin::AdminRepository;
pub use booking::{BookingRepository, NewBooking};
pub use crowd_source::CrowdSourceRepository;
pub use dispute::DisputeRepository;
pub use engagement::{FavoriteRepository, LikeRepository};
pub use event::{EventRepository, EventStats};
pub use notification::NotificationRepository;
pub use organiser::OrganiserRepository;
pub use payment::{PaymentRepository, RevenueTotals};
pub use payout::{PayoutRepository, PayoutTotals};
pub use review::ReviewRepository;
pub use stripe_event::StripeEventRepository;
pub use user::UserRepository;
pub use vendor::VendorRepository;
