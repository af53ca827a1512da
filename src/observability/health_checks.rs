//! Health check functionality module.

use anyhow::Result;
use sqlx::PgPool;
use std::time::Instant;

use super::metrics::record_health_check_metrics;

/// Readiness: every configured dependency must answer
pub async fn perform_readiness_checks(db_pool: Option<&PgPool>) -> Result<()> {
    if let Some(pool) = db_pool {
        let start = Instant::now();
        let result = check_database_health(pool).await;
        record_health_check_metrics("database", result.is_ok(), start.elapsed());
        result?;
    }

    Ok(())
}

/// Check database connectivity and basic query capability
pub async fn check_database_health(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .fetch_one(pool)
        .await
        .map_err(|e| anyhow::anyhow!("Database health check failed: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ready_without_database() {
        assert!(perform_readiness_checks(None).await.is_ok());
    }
}
