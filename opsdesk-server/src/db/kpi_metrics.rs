//! KPI snapshot history

use shared::models::{KpiMetric, MetricType};
use sqlx::SqlitePool;

use crate::BoxError;

/// Store one snapshot (all rows or none)
pub async fn insert_snapshot(pool: &SqlitePool, metrics: &[KpiMetric]) -> Result<(), BoxError> {
    let mut tx = pool.begin().await?;
    for metric in metrics {
        sqlx::query(
            "INSERT INTO kpi_metrics (id, metric_type, metric_value, recorded_at) VALUES (?, ?, ?, ?)",
        )
        .bind(metric.id)
        .bind(metric.metric_type)
        .bind(metric.metric_value)
        .bind(metric.recorded_at)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(())
}

/// Rows recorded at or after `since`, oldest first
pub async fn list_since(pool: &SqlitePool, since: i64) -> Result<Vec<KpiMetric>, BoxError> {
    let rows = sqlx::query_as::<_, KpiMetric>(
        "SELECT id, metric_type, metric_value, recorded_at FROM kpi_metrics \
         WHERE recorded_at >= ? ORDER BY recorded_at, id",
    )
    .bind(since)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Latest `limit` rows of one metric, oldest first
pub async fn history(
    pool: &SqlitePool,
    metric_type: MetricType,
    limit: i64,
) -> Result<Vec<KpiMetric>, BoxError> {
    let mut rows = sqlx::query_as::<_, KpiMetric>(
        "SELECT id, metric_type, metric_value, recorded_at FROM kpi_metrics \
         WHERE metric_type = ? ORDER BY recorded_at DESC, id DESC LIMIT ?",
    )
    .bind(metric_type)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    rows.reverse();
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::test_pool;

    fn metric(id: i64, metric_type: MetricType, value: f64, at: i64) -> KpiMetric {
        KpiMetric {
            id,
            metric_type,
            metric_value: value,
            recorded_at: at,
        }
    }

    #[tokio::test]
    async fn test_snapshot_and_history() {
        let pool = test_pool().await;
        insert_snapshot(
            &pool,
            &[
                metric(1, MetricType::OpenExceptions, 12.0, 100),
                metric(2, MetricType::SlaCompliance, 91.5, 100),
            ],
        )
        .await
        .unwrap();
        insert_snapshot(&pool, &[metric(3, MetricType::OpenExceptions, 9.0, 200)])
            .await
            .unwrap();
        insert_snapshot(&pool, &[metric(4, MetricType::OpenExceptions, 7.0, 300)])
            .await
            .unwrap();

        let open = history(&pool, MetricType::OpenExceptions, 2).await.unwrap();
        let values: Vec<f64> = open.iter().map(|m| m.metric_value).collect();
        assert_eq!(values, vec![9.0, 7.0]);

        let since = list_since(&pool, 150).await.unwrap();
        assert_eq!(since.len(), 2);
        assert!(since.iter().all(|m| m.metric_type == MetricType::OpenExceptions));
    }

    #[tokio::test]
    async fn test_snapshot_is_atomic() {
        let pool = test_pool().await;
        // duplicate primary key in the second row aborts the whole snapshot
        let result = insert_snapshot(
            &pool,
            &[
                metric(1, MetricType::EscalationRate, 20.0, 100),
                metric(1, MetricType::AvgResolutionTime, 4.5, 100),
            ],
        )
        .await;
        assert!(result.is_err());
        assert!(list_since(&pool, 0).await.unwrap().is_empty());
    }
}
