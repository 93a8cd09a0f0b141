use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use log::{debug, warn};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{NewOrder, Order, OrderStatus};
use crate::domain::ports::{Collection, OrderStore, PendingFeed};
use crate::schema::{orders, pharmacy_orders};

use super::models::{NewOrderRow, OrderRow};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};
        match e {
            Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                DomainError::Conflict(info.message().to_string())
            }
            other => DomainError::Internal(other.to_string()),
        }
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

/// Runs a blocking Diesel call off the async executor.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, DomainError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, DomainError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DomainError::Internal(e.to_string()))?
}

fn into_orders(rows: Vec<OrderRow>) -> Result<Vec<Order>, DomainError> {
    rows.into_iter().map(Order::try_from).collect()
}

fn load_pending(pool: &DbPool, pharmacy_id: Uuid) -> Result<Vec<Order>, DomainError> {
    let mut conn = pool.get()?;
    let rows = pharmacy_orders::table
        .filter(pharmacy_orders::pharmacy_id.eq(pharmacy_id))
        .filter(pharmacy_orders::status.eq(OrderStatus::Pending.as_str()))
        .order((pharmacy_orders::created_at.desc(), pharmacy_orders::id.asc()))
        .load::<OrderRow>(&mut conn)?;
    into_orders(rows)
}

/// What the poller compares between two reads.
fn fingerprint(orders: &[Order]) -> Vec<(Uuid, OrderStatus)> {
    orders.iter().map(|o| (o.id, o.status)).collect()
}

// ── Store ─────────────────────────────────────────────────────────────────────

pub struct DieselOrderStore {
    pool: DbPool,
    poll_interval: Duration,
}

impl DieselOrderStore {
    pub fn new(pool: DbPool, poll_interval: Duration) -> Self {
        Self {
            pool,
            poll_interval,
        }
    }
}

#[async_trait]
impl OrderStore for DieselOrderStore {
    async fn create(&self, order: NewOrder) -> Result<Order, DomainError> {
        let order = order.into_order(Uuid::new_v4(), Utc::now())?;
        let row = NewOrderRow::from_order(&order)?;
        let pool = self.pool.clone();

        run_blocking(move || {
            let mut conn = pool.get()?;
            // Both copies or neither.
            conn.transaction::<_, DomainError, _>(|conn| {
                diesel::insert_into(pharmacy_orders::table)
                    .values(&row.scoped())
                    .execute(conn)?;
                diesel::insert_into(orders::table)
                    .values(&row)
                    .execute(conn)?;
                Ok(())
            })
        })
        .await?;

        Ok(order)
    }

    async fn find(&self, collection: Collection, id: Uuid) -> Result<Option<Order>, DomainError> {
        let pool = self.pool.clone();
        let row = run_blocking(move || {
            let mut conn = pool.get()?;
            let row = match collection {
                Collection::Pharmacy(pharmacy_id) => pharmacy_orders::table
                    .filter(pharmacy_orders::id.eq(id))
                    .filter(pharmacy_orders::pharmacy_id.eq(pharmacy_id))
                    .first::<OrderRow>(&mut conn)
                    .optional()?,
                Collection::Global => orders::table
                    .filter(orders::id.eq(id))
                    .first::<OrderRow>(&mut conn)
                    .optional()?,
            };
            Ok(row)
        })
        .await?;

        row.map(Order::try_from).transpose()
    }

    async fn list_for_pharmacy(
        &self,
        pharmacy_id: Uuid,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, DomainError> {
        let pool = self.pool.clone();
        let rows = run_blocking(move || {
            let mut conn = pool.get()?;
            let mut query = pharmacy_orders::table
                .filter(pharmacy_orders::pharmacy_id.eq(pharmacy_id))
                .order((pharmacy_orders::created_at.desc(), pharmacy_orders::id.asc()))
                .into_boxed();
            if let Some(status) = status {
                query = query.filter(pharmacy_orders::status.eq(status.as_str()));
            }
            Ok(query.load::<OrderRow>(&mut conn)?)
        })
        .await?;
        into_orders(rows)
    }

    async fn list_for_client(&self, client_id: Uuid) -> Result<Vec<Order>, DomainError> {
        let pool = self.pool.clone();
        let rows = run_blocking(move || {
            let mut conn = pool.get()?;
            Ok(orders::table
                .filter(orders::client_id.eq(client_id))
                .order((orders::created_at.desc(), orders::id.asc()))
                .load::<OrderRow>(&mut conn)?)
        })
        .await?;
        into_orders(rows)
    }

    async fn update_status(
        &self,
        collection: Collection,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<(), DomainError> {
        let pool = self.pool.clone();
        let updated = run_blocking(move || {
            let mut conn = pool.get()?;
            let now = Utc::now();
            let updated = match collection {
                Collection::Pharmacy(pharmacy_id) => diesel::update(
                    pharmacy_orders::table
                        .filter(pharmacy_orders::id.eq(id))
                        .filter(pharmacy_orders::pharmacy_id.eq(pharmacy_id)),
                )
                .set((
                    pharmacy_orders::status.eq(status.as_str()),
                    pharmacy_orders::updated_at.eq(now),
                ))
                .execute(&mut conn)?,
                Collection::Global => diesel::update(orders::table.filter(orders::id.eq(id)))
                    .set((orders::status.eq(status.as_str()), orders::updated_at.eq(now)))
                    .execute(&mut conn)?,
            };
            Ok(updated)
        })
        .await?;

        if updated == 0 {
            return Err(DomainError::NotFound(format!("order {}", id)));
        }
        Ok(())
    }

    /// Polls the pending orders of `pharmacy_id` and pushes a snapshot whenever
    /// the set of keys changes or the read starts failing. Stops once the
    /// receiver is dropped.
    fn watch_pending(&self, pharmacy_id: Uuid) -> PendingFeed {
        let (tx, rx) = mpsc::unbounded_channel();
        let pool = self.pool.clone();
        let every = self.poll_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            let mut last: Option<Vec<(Uuid, OrderStatus)>> = None;
            let mut failing = false;

            loop {
                ticker.tick().await;
                if tx.is_closed() {
                    break;
                }
                let pool = pool.clone();
                match run_blocking(move || load_pending(&pool, pharmacy_id)).await {
                    Ok(orders) => {
                        failing = false;
                        let current = fingerprint(&orders);
                        if last.as_ref() == Some(&current) {
                            continue;
                        }
                        last = Some(current);
                        if tx.send(Ok(orders)).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        if failing {
                            continue;
                        }
                        failing = true;
                        warn!("Polling pending orders of pharmacy {} failed: {}", pharmacy_id, e);
                        if tx.send(Err(e)).is_err() {
                            break;
                        }
                    }
                }
            }
            debug!("Stopped polling pending orders of pharmacy {}", pharmacy_id);
        });

        rx
    }
}
