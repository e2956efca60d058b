//! Newsletter subscription service.
//!
//! Validates and normalizes emails, persists subscriptions through a `SubscriptionRepo` and
//! reports every result as a tagged outcome. The HTTP layer only formats outcomes.

use tracing::info;

use crate::model::{
    self, EmailError, Listing, NewSubscription, Stats, SubscriberEmail, Subscription,
    SubscriptionFilter, SubscriptionRepo,
};

/// Rows per admin list page.
pub const PAGE_SIZE: u32 = 50;

/// Result of a subscribe request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Created(Subscription),
    /// The normalized email is already stored.
    Conflict,
    ValidationFailed(EmailError),
}

/// Result of an unsubscribe request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsubscribeOutcome {
    Unsubscribed,
    NotFound,
    /// The email was empty. Unsubscribing requires nothing more.
    ValidationFailed,
}

#[derive(Clone, Debug)]
pub struct SubscriptionService<R> {
    repo: R,
}

impl<R: SubscriptionRepo> SubscriptionService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    #[cfg(test)]
    pub(crate) fn repo(&self) -> &R {
        &self.repo
    }

    /// Validation failures never reach the store.
    #[tracing::instrument(name = "subscribe", skip(self, user_agent))]
    pub async fn subscribe(
        &self,
        email: &str,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> model::Result<SubscribeOutcome> {
        let email = match SubscriberEmail::parse(email) {
            Ok(email) => email,
            Err(er) => return Ok(SubscribeOutcome::ValidationFailed(er)),
        };

        let new_sub = NewSubscription {
            email,
            ip_address,
            user_agent,
        };
        match self.repo.create(new_sub).await {
            Ok(subscription) => {
                info!(id = subscription.id, "New newsletter subscription");
                Ok(SubscribeOutcome::Created(subscription))
            }
            Err(model::Error::EmailTaken) => Ok(SubscribeOutcome::Conflict),
            Err(er) => Err(er),
        }
    }

    #[tracing::instrument(name = "unsubscribe", skip(self))]
    pub async fn unsubscribe(&self, email: &str) -> model::Result<UnsubscribeOutcome> {
        // Any non-empty value is looked up, malformed addresses are simply not found.
        let email = match SubscriberEmail::parse(email) {
            Ok(email) => email,
            Err(EmailError::Empty) => return Ok(UnsubscribeOutcome::ValidationFailed),
            Err(_) => return Ok(UnsubscribeOutcome::NotFound),
        };

        let Some(subscription) = self.repo.find_by_email(&email).await? else {
            return Ok(UnsubscribeOutcome::NotFound);
        };
        self.repo.set_active(subscription.id, false).await?;
        info!(id = subscription.id, "Newsletter unsubscription");

        Ok(UnsubscribeOutcome::Unsubscribed)
    }

    /// Returns `false` when no subscription has this `id`.
    pub async fn activate(&self, id: i64) -> model::Result<bool> {
        self.repo.set_active(id, true).await
    }

    /// Returns `false` when no subscription has this `id`.
    pub async fn deactivate(&self, id: i64) -> model::Result<bool> {
        self.repo.set_active(id, false).await
    }

    /// Applies `is_active` to every selected subscription and returns how many were affected.
    #[tracing::instrument(name = "bulk_set_active", skip(self, ids), fields(selected = ids.len()))]
    pub async fn set_active_many(&self, ids: &[i64], is_active: bool) -> model::Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.repo.set_active_many(ids, is_active).await
    }

    pub async fn stats(&self) -> model::Result<Stats> {
        self.repo.count().await
    }

    /// `page` is 1-based and clamped to the available pages.
    pub async fn list(&self, filter: &SubscriptionFilter, page: u32) -> model::Result<Listing> {
        let page_size = i64::from(PAGE_SIZE);
        let requested = i64::from(page.max(1));

        let (rows, total_matching) = self
            .repo
            .list(filter, (requested - 1) * page_size, page_size)
            .await?;

        let page_count = page_count(total_matching);
        if rows.is_empty() && requested > i64::from(page_count) {
            // Out of range: fall back to the last page.
            let last = i64::from(page_count);
            let (rows, total_matching) = self
                .repo
                .list(filter, (last - 1) * page_size, page_size)
                .await?;
            return Ok(Listing {
                rows,
                total_matching,
                page: page_count,
                page_count,
            });
        }

        Ok(Listing {
            rows,
            total_matching,
            page: requested as u32,
            page_count,
        })
    }

    pub async fn selected(&self, ids: &[i64]) -> model::Result<Vec<Subscription>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.repo.find_many(ids).await
    }
}

/// Number of pages needed for `total` rows. An empty list still has one page.
fn page_count(total: i64) -> u32 {
    let pages = (total.max(0) + i64::from(PAGE_SIZE) - 1) / i64::from(PAGE_SIZE);
    pages.max(1) as u32
}
