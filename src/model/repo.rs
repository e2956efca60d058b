use std::future::Future;

use chrono::Utc;
use sqlx::{postgres::PgDatabaseError, Postgres, QueryBuilder};

use crate::database::DbManager;

use super::{
    Error, NewSubscription, Result, Stats, SubscriberEmail, Subscription, SubscriptionFilter,
};

const SUBSCRIPTION_COLUMNS: &str = "id, email, subscribed_at, is_active, ip_address, user_agent";

/// Narrow storage interface for subscriptions.
pub trait SubscriptionRepo: Clone + Send + Sync + 'static {
    /// Inserts a new active subscription. Fails with `Error::EmailTaken` on a duplicate email.
    fn create(&self, new_sub: NewSubscription) -> impl Future<Output = Result<Subscription>> + Send;

    fn find_by_email(
        &self,
        email: &SubscriberEmail,
    ) -> impl Future<Output = Result<Option<Subscription>>> + Send;

    /// Returns `false` if no row has this `id`.
    fn set_active(&self, id: i64, is_active: bool) -> impl Future<Output = Result<bool>> + Send;

    /// Returns the number of rows matched by `ids`.
    fn set_active_many(
        &self,
        ids: &[i64],
        is_active: bool,
    ) -> impl Future<Output = Result<u64>> + Send;

    fn count(&self) -> impl Future<Output = Result<Stats>> + Send;

    /// Newest first. Returns the requested slice and the number of rows matching the filter.
    fn list(
        &self,
        filter: &SubscriptionFilter,
        offset: i64,
        limit: i64,
    ) -> impl Future<Output = Result<(Vec<Subscription>, i64)>> + Send;

    /// Newest first.
    fn find_many(&self, ids: &[i64]) -> impl Future<Output = Result<Vec<Subscription>>> + Send;
}

// ###################################
// ->   POSTGRES
// ###################################
impl SubscriptionRepo for DbManager {
    #[tracing::instrument(name = "insert_subscription", skip_all, fields(email = %new_sub.email.as_ref()))]
    async fn create(&self, new_sub: NewSubscription) -> Result<Subscription> {
        let sql = format!(
            r#"
        INSERT INTO subscriptions (email, subscribed_at, is_active, ip_address, user_agent)
        VALUES ($1, $2, TRUE, $3, $4)
        RETURNING {SUBSCRIPTION_COLUMNS}
        "#
        );

        let query_result = sqlx::query_as::<_, Subscription>(&sql)
            .bind(new_sub.email.as_ref())
            .bind(Utc::now())
            .bind(new_sub.ip_address)
            .bind(new_sub.user_agent)
            .fetch_one(self.db())
            .await;

        match query_result {
            Ok(subscription) => Ok(subscription),
            Err(er) if is_unique_violation(&er) => Err(Error::EmailTaken),
            Err(er) => Err(er.into()),
        }
    }

    async fn find_by_email(&self, email: &SubscriberEmail) -> Result<Option<Subscription>> {
        let sql = format!("SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE email = $1");
        let subscription = sqlx::query_as::<_, Subscription>(&sql)
            .bind(email.as_ref())
            .fetch_optional(self.db())
            .await?;

        Ok(subscription)
    }

    async fn set_active(&self, id: i64, is_active: bool) -> Result<bool> {
        let res = sqlx::query("UPDATE subscriptions SET is_active = $1 WHERE id = $2")
            .bind(is_active)
            .bind(id)
            .execute(self.db())
            .await?;

        Ok(res.rows_affected() > 0)
    }

    async fn set_active_many(&self, ids: &[i64], is_active: bool) -> Result<u64> {
        let res = sqlx::query("UPDATE subscriptions SET is_active = $1 WHERE id = ANY($2)")
            .bind(is_active)
            .bind(ids)
            .execute(self.db())
            .await?;

        Ok(res.rows_affected())
    }

    async fn count(&self) -> Result<Stats> {
        let (total, active): (i64, i64) = sqlx::query_as(
            r#"
        SELECT COUNT(*), COUNT(*) FILTER (WHERE is_active)
        FROM subscriptions
        "#,
        )
        .fetch_one(self.db())
        .await?;

        Ok(Stats::new(total, active))
    }

    async fn list(
        &self,
        filter: &SubscriptionFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Subscription>, i64)> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM subscriptions");
        push_filter(&mut count_qb, filter);
        let total_matching: i64 = count_qb
            .build_query_scalar()
            .fetch_one(self.db())
            .await?;

        let mut rows_qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions"
        ));
        push_filter(&mut rows_qb, filter);
        rows_qb
            .push(" ORDER BY subscribed_at DESC, id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let rows = rows_qb
            .build_query_as::<Subscription>()
            .fetch_all(self.db())
            .await?;

        Ok((rows, total_matching))
    }

    async fn find_many(&self, ids: &[i64]) -> Result<Vec<Subscription>> {
        let sql = format!(
            r#"
        SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions
        WHERE id = ANY($1)
        ORDER BY subscribed_at DESC, id DESC
        "#
        );
        let rows = sqlx::query_as::<_, Subscription>(&sql)
            .bind(ids)
            .fetch_all(self.db())
            .await?;

        Ok(rows)
    }
}

// ###################################
// ->   HELPERS
// ###################################
fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &SubscriptionFilter) {
    qb.push(" WHERE TRUE");

    if let Some(is_active) = filter.is_active {
        qb.push(" AND is_active = ").push_bind(is_active);
    }
    if let Some(since) = filter.subscribed_since {
        qb.push(" AND subscribed_at >= ").push_bind(since);
    }
    if let Some(search) = filter.search.as_deref() {
        let pattern = format!("%{}%", escape_like(search));
        qb.push(" AND (email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR ip_address ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Escapes the `LIKE` wildcards so the search term is matched literally.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Checks whether the query failed because of the unique constraint on `email`.
fn is_unique_violation(er: &sqlx::Error) -> bool {
    match er {
        sqlx::Error::Database(db_er) => db_er
            .try_downcast_ref::<PgDatabaseError>()
            .is_some_and(|pg_er| pg_er.code() == "23505"),
        _ => false,
    }
}
