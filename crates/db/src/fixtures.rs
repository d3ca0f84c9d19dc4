use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Expected row count per seeded table.
const SEED_TABLES: &[(&str, i64)] = &[
    ("market_packages", 6),
    ("products_inventory", 4),
    ("inverter_products", 6),
    ("battery_products", 5),
    ("install_cost_refs", 3),
    ("knowledge_base", 6),
];

const SEED_TIER_CODES: &[&str] = &["A", "B", "C", "D"];

const SEED_INSTALL_VOLTAGES: &[i64] = &[12, 24, 48];

/// Reference catalog: market packages, inventory, sizing components and
/// knowledge-base snippets.
pub struct SeedDataset;

impl SeedDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/seed_catalog.sql");

    /// Replaces catalog and knowledge rows with the reference dataset.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;

        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        let mut tables = Vec::with_capacity(SEED_TABLES.len());
        for (table, _) in SEED_TABLES {
            tables.push((*table, count_rows(pool, table).await?));
        }

        Ok(SeedResult { tables })
    }

    /// Checks that the seeded rows exist and that the sizing engine has what it needs.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for (table, expected) in SEED_TABLES {
            let actual = count_rows(pool, table).await?;
            checks.push((*table, actual == *expected));
        }

        for code in SEED_TIER_CODES {
            let exists: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM market_packages WHERE tier_code = ?1 AND is_portable = 0)",
            )
            .bind(code)
            .fetch_one(pool)
            .await?;
            checks.push((tier_label(code), exists == 1));
        }

        let portable_count: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM market_packages WHERE is_portable = 1")
                .fetch_one(pool)
                .await?;
        checks.push(("portable-packages", portable_count > 0));

        for voltage in SEED_INSTALL_VOLTAGES {
            let inverters: i64 =
                sqlx::query_scalar("SELECT COUNT(1) FROM inverter_products WHERE system_voltage = ?1")
                    .bind(voltage)
                    .fetch_one(pool)
                    .await?;
            let install: i64 = sqlx::query_scalar(
                "SELECT COUNT(1) FROM install_cost_refs WHERE system_voltage = ?1",
            )
            .bind(voltage)
            .fetch_one(pool)
            .await?;
            checks.push((voltage_label(*voltage), inverters > 0 && install == 1));
        }

        let all_present = checks.iter().all(|(_, passed)| *passed);
        Ok(VerificationResult { all_present, checks })
    }

    /// Removes seeded catalog and knowledge rows.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;

        for (table, _) in SEED_TABLES {
            sqlx::query(&format!("DELETE FROM {table}")).execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

async fn count_rows(pool: &DbPool, table: &str) -> Result<i64, RepositoryError> {
    let count: i64 =
        sqlx::query_scalar(&format!("SELECT COUNT(1) FROM {table}")).fetch_one(pool).await?;
    Ok(count)
}

fn tier_label(code: &str) -> &'static str {
    match code {
        "A" => "tier-a-package",
        "B" => "tier-b-package",
        "C" => "tier-c-package",
        _ => "tier-d-package",
    }
}

fn voltage_label(voltage: i64) -> &'static str {
    match voltage {
        12 => "components-12v",
        24 => "components-24v",
        _ => "components-48v",
    }
}

#[derive(Debug)]
pub struct SeedResult {
    pub tables: Vec<(&'static str, i64)>,
}

impl SeedResult {
    pub fn total_rows(&self) -> i64 {
        self.tables.iter().map(|(_, count)| count).sum()
    }
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}
