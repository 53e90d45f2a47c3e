use std::ops::RangeInclusive;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{PageAssignment, SquareStore, StoreStats};
use crate::domains::squares::errors::StoreError;
use crate::domains::squares::models::square::{AdPayload, PaymentStatus, SquareRecord};

/// Condition shared by every "is this record active at $now" query.
const ACTIVE_AT: &str = "retired_at IS NULL \
     AND payment_status = 'confirmed' \
     AND purchased_at <= $1 \
     AND expires_at > $1";

/// Postgres-backed store.
///
/// The `squares` table carries a deferrable exclusion constraint on
/// `square_number` for unretired rows, so a page's swaps are only checked
/// for uniqueness at commit.
#[derive(Clone)]
pub struct PostgresSquareStore {
    pool: PgPool,
}

impl PostgresSquareStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(sqlx::FromRow)]
struct SquareRow {
    id: Uuid,
    square_number: i32,
    page_number: i32,
    business_name: String,
    contact_email: String,
    deal_link: Option<String>,
    logo_reference: Option<String>,
    purchased_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    payment_status: String,
    retired_at: Option<DateTime<Utc>>,
    last_shuffled_at: Option<DateTime<Utc>>,
}

impl TryFrom<SquareRow> for SquareRecord {
    type Error = StoreError;

    fn try_from(row: SquareRow) -> Result<Self, Self::Error> {
        let payment_status = PaymentStatus::parse(&row.payment_status).ok_or_else(|| {
            anyhow!("unknown payment status '{}' on {}", row.payment_status, row.id)
        })?;
        Ok(SquareRecord {
            id: row.id,
            square_number: u32::try_from(row.square_number)
                .map_err(|_| anyhow!("negative square number on {}", row.id))?,
            page_number: u32::try_from(row.page_number)
                .map_err(|_| anyhow!("negative page number on {}", row.id))?,
            payload: AdPayload {
                business_name: row.business_name,
                contact_email: row.contact_email,
                deal_link: row.deal_link,
                logo_reference: row.logo_reference,
            },
            purchased_at: row.purchased_at,
            expires_at: row.expires_at,
            payment_status,
            retired_at: row.retired_at,
            last_shuffled_at: row.last_shuffled_at,
        })
    }
}

fn into_records(rows: Vec<SquareRow>) -> Result<Vec<SquareRecord>, StoreError> {
    rows.into_iter().map(SquareRecord::try_from).collect()
}

#[async_trait]
impl SquareStore for PostgresSquareStore {
    async fn insert_pending(
        &self,
        record: SquareRecord,
        now: DateTime<Utc>,
    ) -> Result<SquareRecord, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Purchases want the uniqueness check now, not at commit
        sqlx::query("SET CONSTRAINTS squares_one_holder_per_square IMMEDIATE")
            .execute(&mut *tx)
            .await?;

        // A lapsed record on this square must be retired before the
        // exclusion constraint will admit a new one.
        sqlx::query(
            r#"
            UPDATE squares
            SET retired_at = $2
            WHERE square_number = $1 AND retired_at IS NULL AND expires_at <= $2
            "#,
        )
        .bind(record.square_number as i32)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let inserted = sqlx::query_as::<_, SquareRow>(
            r#"
            INSERT INTO squares (
                id, square_number, page_number, business_name, contact_email,
                deal_link, logo_reference, purchased_at, expires_at, payment_status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'pending')
            RETURNING *
            "#,
        )
        .bind(record.id)
        .bind(record.square_number as i32)
        .bind(record.page_number as i32)
        .bind(&record.payload.business_name)
        .bind(&record.payload.contact_email)
        .bind(&record.payload.deal_link)
        .bind(&record.payload.logo_reference)
        .bind(record.purchased_at)
        .bind(record.expires_at)
        .fetch_one(&mut *tx)
        .await;

        let inserted = match inserted {
            Ok(row) => row,
            Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some("23P01") => {
                return Err(StoreError::SquareOccupied(record.square_number));
            }
            Err(e) => return Err(e.into()),
        };

        tx.commit().await?;
        inserted.try_into()
    }

    async fn confirm_payment(&self, id: Uuid) -> Result<SquareRecord, StoreError> {
        let updated = sqlx::query_as::<_, SquareRow>(
            r#"
            UPDATE squares
            SET payment_status = 'confirmed', updated_at = NOW()
            WHERE id = $1 AND payment_status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(row) => row.try_into(),
            None if self.find_by_id(id).await?.is_some() => Err(StoreError::NotPending(id)),
            None => Err(StoreError::NotFound(id)),
        }
    }

    async fn cancel_pending(&self, id: Uuid) -> Result<(), StoreError> {
        let deleted = sqlx::query("DELETE FROM squares WHERE id = $1 AND payment_status = 'pending'")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if deleted > 0 {
            return Ok(());
        }
        match self.find_by_id(id).await? {
            Some(_) => Err(StoreError::NotPending(id)),
            None => Err(StoreError::NotFound(id)),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<SquareRecord>, StoreError> {
        sqlx::query_as::<_, SquareRow>("SELECT * FROM squares WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(SquareRecord::try_from)
            .transpose()
    }

    async fn list_squares(
        &self,
        squares: RangeInclusive<u32>,
    ) -> Result<Vec<SquareRecord>, StoreError> {
        let rows = sqlx::query_as::<_, SquareRow>(
            r#"
            SELECT * FROM squares
            WHERE retired_at IS NULL AND square_number BETWEEN $1 AND $2
            ORDER BY square_number ASC
            "#,
        )
        .bind(*squares.start() as i32)
        .bind(*squares.end() as i32)
        .fetch_all(&self.pool)
        .await?;

        into_records(rows)
    }

    async fn active_records(&self, now: DateTime<Utc>) -> Result<Vec<SquareRecord>, StoreError> {
        let rows = sqlx::query_as::<_, SquareRow>(&format!(
            "SELECT * FROM squares WHERE {} ORDER BY square_number ASC",
            ACTIVE_AT
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        into_records(rows)
    }

    async fn apply_page_assignment(
        &self,
        assignment: &PageAssignment,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let page = assignment.page;
        let mut tx = self.pool.begin().await?;

        // Lock the page's occupants for the rest of the transaction
        let current: Vec<(Uuid, i32)> = sqlx::query_as(&format!(
            "SELECT id, square_number FROM squares \
             WHERE {} AND page_number = $2 \
             ORDER BY square_number ASC \
             FOR UPDATE",
            ACTIVE_AT
        ))
        .bind(now)
        .bind(page as i32)
        .fetch_all(&mut *tx)
        .await?;

        let occupied: Vec<u32> = current.iter().map(|(_, sq)| *sq as u32).collect();
        if occupied != assignment.occupied {
            return Err(StoreError::OccupancyChanged { page });
        }
        for mv in &assignment.moves {
            let in_place = current
                .iter()
                .any(|(id, sq)| *id == mv.record_id && *sq as u32 == mv.from);
            if !in_place {
                return Err(StoreError::OccupancyChanged { page });
            }
        }

        for mv in &assignment.moves {
            sqlx::query(
                r#"
                UPDATE squares
                SET square_number = $1, last_shuffled_at = $2, updated_at = NOW()
                WHERE id = $3
                "#,
            )
            .bind(mv.to as i32)
            .bind(now)
            .bind(mv.record_id)
            .execute(&mut *tx)
            .await?;
        }

        // Deferred exclusion constraint is checked here; any failure rolls
        // back the whole page.
        tx.commit().await?;
        Ok(())
    }

    async fn mark_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let retired = sqlx::query(
            r#"
            UPDATE squares
            SET retired_at = $1, updated_at = NOW()
            WHERE retired_at IS NULL AND expires_at <= $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(retired)
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let (total, shuffled, last): (i64, i64, Option<DateTime<Utc>>) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(last_shuffled_at), MAX(last_shuffled_at) FROM squares",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(StoreStats {
            total_records: total.max(0) as u64,
            shuffled_records: shuffled.max(0) as u64,
            last_shuffled_at: last,
        })
    }
}
