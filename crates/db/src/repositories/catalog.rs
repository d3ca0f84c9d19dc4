use async_trait::async_trait;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row, Sqlite};

use meesaya_core::domain::catalog::{
    BatteryRow, InstallCostRef, InverterRow, PackageRow, ProductRow, Tier, VoltageRange,
};
use meesaya_core::errors::ApplicationError;
use meesaya_core::sizing::catalog::CatalogRepository;

use super::{decode, like_pattern, RepositoryError};
use crate::DbPool;

const PACKAGE_COLUMNS: &str = "tier_code, tier_name, system_voltage, inverter_kw, battery_kwh,
    est_price_low, est_price_high, install_cost, description, is_portable";

pub struct SqlCatalogRepository {
    pool: DbPool,
}

impl SqlCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_package(row: &SqliteRow) -> Result<PackageRow, RepositoryError> {
    let tier_code: Option<String> = decode(row.try_get("tier_code"))?;
    let tier = tier_code
        .map(|code| code.parse::<Tier>().map_err(|e| RepositoryError::Decode(e.to_string())))
        .transpose()?;
    let system_voltage: i64 = decode(row.try_get("system_voltage"))?;

    Ok(PackageRow {
        tier,
        name: decode(row.try_get("tier_name"))?,
        system_voltage: to_u32("system_voltage", system_voltage)?,
        inverter_kw: decode(row.try_get("inverter_kw"))?,
        battery_kwh: decode(row.try_get("battery_kwh"))?,
        est_price_low: decode(row.try_get("est_price_low"))?,
        est_price_high: decode(row.try_get("est_price_high"))?,
        install_cost: decode(row.try_get("install_cost"))?,
        description: decode(row.try_get("description"))?,
        is_portable: decode(row.try_get("is_portable"))?,
    })
}

fn row_to_inverter(row: &SqliteRow) -> Result<InverterRow, RepositoryError> {
    let rated_watts: i64 = decode(row.try_get("rated_watts"))?;
    let system_voltage: i64 = decode(row.try_get("system_voltage"))?;
    let max_charge_amps: i64 = decode(row.try_get("max_charge_amps"))?;

    Ok(InverterRow {
        brand: decode(row.try_get("brand"))?,
        model: decode(row.try_get("model"))?,
        rated_watts: to_u32("rated_watts", rated_watts)?,
        system_voltage: to_u32("system_voltage", system_voltage)?,
        max_charge_amps: to_u32("max_charge_amps", max_charge_amps)?,
        price: decode(row.try_get("price"))?,
    })
}

fn row_to_battery(row: &SqliteRow) -> Result<BatteryRow, RepositoryError> {
    Ok(BatteryRow {
        brand: decode(row.try_get("brand"))?,
        model: decode(row.try_get("model"))?,
        chemistry: decode(row.try_get("chemistry"))?,
        nominal_voltage: decode(row.try_get("nominal_voltage"))?,
        capacity_kwh: decode(row.try_get("capacity_kwh"))?,
        price: decode(row.try_get("price"))?,
    })
}

fn row_to_install_ref(row: &SqliteRow) -> Result<InstallCostRef, RepositoryError> {
    let system_voltage: i64 = decode(row.try_get("system_voltage"))?;

    Ok(InstallCostRef {
        system_voltage: to_u32("system_voltage", system_voltage)?,
        labor_cost: decode(row.try_get("labor_cost"))?,
        accessories_cost: decode(row.try_get("accessories_cost"))?,
        mounting_per_panel: decode(row.try_get("mounting_per_panel"))?,
        cabinet_cost: decode(row.try_get("cabinet_cost"))?,
    })
}

fn row_to_product(row: &SqliteRow) -> Result<ProductRow, RepositoryError> {
    let warranty_years: i64 = decode(row.try_get("warranty_years"))?;

    Ok(ProductRow {
        category: decode(row.try_get("category"))?,
        brand: decode(row.try_get("brand"))?,
        model: decode(row.try_get("model"))?,
        specs: decode(row.try_get("specs"))?,
        price: decode(row.try_get("price"))?,
        warranty_years: to_u32("warranty_years", warranty_years)?,
        tags: decode(row.try_get("tags"))?,
    })
}

fn to_u32(column: &str, value: i64) -> Result<u32, RepositoryError> {
    u32::try_from(value)
        .map_err(|_| RepositoryError::Decode(format!("{column} out of range: {value}")))
}

impl SqlCatalogRepository {
    async fn optional_package<'q>(
        &self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Result<Option<PackageRow>, RepositoryError> {
        let row = query.fetch_optional(&self.pool).await?;
        row.as_ref().map(row_to_package).transpose()
    }
}

#[async_trait]
impl CatalogRepository for SqlCatalogRepository {
    async fn find_portable_package(
        &self,
        min_kw: f64,
    ) -> Result<Option<PackageRow>, ApplicationError> {
        let sql = format!(
            "SELECT {PACKAGE_COLUMNS} FROM market_packages
             WHERE is_portable = 1 AND inverter_kw >= ?
             ORDER BY est_price_low ASC, id ASC LIMIT 1"
        );
        Ok(self.optional_package(sqlx::query(&sql).bind(min_kw)).await?)
    }

    async fn find_package_by_tier(
        &self,
        tier: Tier,
    ) -> Result<Option<PackageRow>, ApplicationError> {
        let sql = format!("SELECT {PACKAGE_COLUMNS} FROM market_packages WHERE tier_code = ? LIMIT 1");
        Ok(self.optional_package(sqlx::query(&sql).bind(tier.code())).await?)
    }

    async fn find_inverter(
        &self,
        min_watts: f64,
        voltage: u32,
        min_charge_amps: f64,
    ) -> Result<Option<InverterRow>, ApplicationError> {
        let row = sqlx::query(
            "SELECT brand, model, rated_watts, system_voltage, max_charge_amps, price
             FROM inverter_products
             WHERE rated_watts >= ? AND system_voltage = ? AND max_charge_amps >= ?
             ORDER BY price ASC, id ASC LIMIT 1",
        )
        .bind(min_watts)
        .bind(i64::from(voltage))
        .bind(min_charge_amps)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(row.as_ref().map(row_to_inverter).transpose()?)
    }

    async fn find_battery(
        &self,
        voltage_range: VoltageRange,
        chemistry: &str,
    ) -> Result<Option<BatteryRow>, ApplicationError> {
        let row = sqlx::query(
            "SELECT brand, model, chemistry, nominal_voltage, capacity_kwh, price
             FROM battery_products
             WHERE nominal_voltage BETWEEN ? AND ? AND chemistry = ? COLLATE NOCASE
             ORDER BY price ASC, id ASC LIMIT 1",
        )
        .bind(voltage_range.min)
        .bind(voltage_range.max)
        .bind(chemistry)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(row.as_ref().map(row_to_battery).transpose()?)
    }

    async fn find_install_cost_ref(
        &self,
        voltage: u32,
    ) -> Result<Option<InstallCostRef>, ApplicationError> {
        let row = sqlx::query(
            "SELECT system_voltage, labor_cost, accessories_cost, mounting_per_panel, cabinet_cost
             FROM install_cost_refs WHERE system_voltage = ?",
        )
        .bind(i64::from(voltage))
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(row.as_ref().map(row_to_install_ref).transpose()?)
    }

    async fn find_bundled_package(
        &self,
        min_watts: f64,
        min_kwh: f64,
        voltage: u32,
    ) -> Result<Option<PackageRow>, ApplicationError> {
        let sql = format!(
            "SELECT {PACKAGE_COLUMNS} FROM market_packages
             WHERE is_portable = 0 AND inverter_kw * 1000.0 >= ? AND battery_kwh >= ?
               AND system_voltage = ?
             ORDER BY est_price_low + install_cost ASC, id ASC LIMIT 1"
        );
        let query = sqlx::query(&sql).bind(min_watts).bind(min_kwh).bind(i64::from(voltage));
        Ok(self.optional_package(query).await?)
    }

    async fn search_products(
        &self,
        text: &str,
        limit: u32,
    ) -> Result<Vec<ProductRow>, ApplicationError> {
        let pattern = like_pattern(text.trim());
        let rows = sqlx::query(
            "SELECT category, brand, model, specs, price, warranty_years, tags
             FROM products_inventory
             WHERE brand LIKE ?1 ESCAPE '\\' OR model LIKE ?1 ESCAPE '\\'
                OR category LIKE ?1 ESCAPE '\\'
             ORDER BY price ASC, id ASC LIMIT ?2",
        )
        .bind(pattern)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        let products = rows.iter().map(row_to_product).collect::<Result<Vec<_>, _>>()?;
        Ok(products)
    }
}
