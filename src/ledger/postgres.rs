use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use super::store::{Access, LedgerStore, LedgerTx};
use super::LedgerError;
use crate::database::models::{
    Assignment, FieldValue, MonitoringEntry, MonitoringSource, NewMonitoringEntry,
    NewNurseryRecord, NurseryDetail, NurseryRecord, TreeDescription,
};
use crate::filter::NurseryFilter;

const DESCRIPTION_COLUMNS: &str =
    "tree_desc_id, scientific_name, kinyarwanda, family, products, quantity_nursery";

/// PostgreSQL-backed ledger store
#[derive(Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn begin(&self, access: Access) -> Result<Box<dyn LedgerTx>, LedgerError> {
        let mut tx = self.pool.begin().await?;
        if access == Access::Snapshot {
            // Must be the first statement of the transaction
            sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
                .execute(&mut *tx)
                .await?;
        }
        Ok(Box::new(PgLedgerTx { tx }))
    }

    async fn ping(&self) -> Result<(), LedgerError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

struct PgLedgerTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn lock_description(
        &mut self,
        tree_desc_id: i32,
    ) -> Result<Option<TreeDescription>, LedgerError> {
        let sql = format!(
            "SELECT {} FROM tree_description WHERE tree_desc_id = $1 FOR UPDATE",
            DESCRIPTION_COLUMNS
        );
        let row = sqlx::query_as::<_, TreeDescription>(&sql)
            .bind(tree_desc_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn adjust_quantity_nursery(
        &mut self,
        tree_desc_id: i32,
        delta: Decimal,
    ) -> Result<TreeDescription, LedgerError> {
        let sql = format!(
            "UPDATE tree_description SET quantity_nursery = quantity_nursery + $1 \
             WHERE tree_desc_id = $2 RETURNING {}",
            DESCRIPTION_COLUMNS
        );
        sqlx::query_as::<_, TreeDescription>(&sql)
            .bind(delta)
            .bind(tree_desc_id)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| LedgerError::description_not_found(tree_desc_id))
    }

    async fn insert_nursery(
        &mut self,
        record: &NewNurseryRecord,
    ) -> Result<NurseryRecord, LedgerError> {
        let row = sqlx::query_as::<_, NurseryRecord>(
            r#"
            INSERT INTO trees_nursery (
                tree_desc_id, quantity_added, registration_date, village_id, registered_by, notes,
                growing_method_id, stage_id_nursery, date_planted, propagation_method
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(record.tree_desc_id)
        .bind(record.quantity_added)
        .bind(record.registration_date)
        .bind(&record.village_id)
        .bind(record.registered_by)
        .bind(&record.notes)
        .bind(record.growing_method_id)
        .bind(record.stage_id_nursery)
        .bind(record.date_planted)
        .bind(&record.propagation_method)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn lock_nursery(&mut self, id: i32) -> Result<Option<NurseryRecord>, LedgerError> {
        let sql = "SELECT * FROM trees_nursery WHERE id = $1 FOR UPDATE";
        let row = sqlx::query_as::<_, NurseryRecord>(sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    async fn update_nursery(
        &mut self,
        id: i32,
        assignments: &[Assignment],
    ) -> Result<NurseryRecord, LedgerError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE trees_nursery SET ");
        {
            let mut set = qb.separated(", ");
            for assignment in assignments {
                set.push(assignment.column.as_str());
                set.push_unseparated(" = ");
                match &assignment.value {
                    FieldValue::Decimal(v) => set.push_bind_unseparated(*v),
                    FieldValue::Date(v) => set.push_bind_unseparated(*v),
                    FieldValue::Text(v) => set.push_bind_unseparated(v.clone()),
                    FieldValue::Int(v) => set.push_bind_unseparated(*v),
                };
            }
            set.push("updated_at = CURRENT_TIMESTAMP");
        }
        qb.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        qb.build_query_as::<NurseryRecord>()
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| LedgerError::nursery_not_found(id))
    }

    async fn delete_nursery(&mut self, id: i32) -> Result<NurseryRecord, LedgerError> {
        sqlx::query_as::<_, NurseryRecord>("DELETE FROM trees_nursery WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| LedgerError::nursery_not_found(id))
    }

    async fn insert_monitoring(
        &mut self,
        entry: &NewMonitoringEntry,
    ) -> Result<MonitoringEntry, LedgerError> {
        let row = sqlx::query_as::<_, MonitoringEntry>(
            r#"
            INSERT INTO tree_monitoring (
                tree_desc_id, nursery_id, monitoring_date, quantity, health_status, source,
                monitored_by, notes
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(entry.tree_desc_id)
        .bind(entry.nursery_id)
        .bind(entry.monitoring_date)
        .bind(entry.quantity)
        .bind(&entry.health_status)
        .bind(entry.source.code())
        .bind(entry.monitored_by)
        .bind(&entry.notes)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn delete_monitoring_for_nursery(
        &mut self,
        nursery_id: i32,
        source: MonitoringSource,
    ) -> Result<u64, LedgerError> {
        let sql = "DELETE FROM tree_monitoring WHERE nursery_id = $1 AND source = $2";
        let result = sqlx::query(sql)
            .bind(nursery_id)
            .bind(source.code())
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn select_nursery(
        &mut self,
        filter: &NurseryFilter,
    ) -> Result<Vec<NurseryDetail>, LedgerError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT
                tn.*,
                td.scientific_name,
                td.kinyarwanda,
                td.family,
                td.quantity_nursery AS total_nursery_quantity
            FROM trees_nursery tn
            JOIN tree_description td ON td.tree_desc_id = tn.tree_desc_id
            WHERE 1=1"#,
        );
        filter.push_where(&mut qb);
        qb.push(" ORDER BY tn.registration_date DESC, tn.id DESC");

        let rows = qb
            .build_query_as::<NurseryDetail>()
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows)
    }

    async fn select_monitoring(
        &mut self,
        tree_desc_ids: &[i32],
        source: MonitoringSource,
    ) -> Result<Vec<MonitoringEntry>, LedgerError> {
        if tree_desc_ids.is_empty() {
            return Ok(vec![]);
        }
        let rows = sqlx::query_as::<_, MonitoringEntry>(
            r#"
            SELECT * FROM tree_monitoring
            WHERE source = $1 AND tree_desc_id = ANY($2)
            ORDER BY monitoring_date DESC, id DESC
            "#,
        )
        .bind(source.code())
        .bind(tree_desc_ids.to_vec())
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows)
    }

    async fn commit(self: Box<Self>) -> Result<(), LedgerError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), LedgerError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
