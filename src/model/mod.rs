//! Subscription records and the storage interface the rest of the crate goes through.

mod repo;
mod types;

pub use repo::SubscriptionRepo;
pub use types::{
    DateRange, EmailError, Listing, NewSubscription, Stats, SubscriberEmail, Subscription,
    SubscriptionFilter,
};

// ###################################
// ->   ERROR
// ###################################
pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("a subscription with this email already exists")]
    EmailTaken,
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}
