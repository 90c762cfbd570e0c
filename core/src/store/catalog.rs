use super::{decode_decimal, decode_optional_decimal, decode_term, Database};
use crate::{
    error::SimResult,
    product_matcher::ProductCatalog,
    types::{CreditProduct, ProductCode},
};
use async_trait::async_trait;
use rusqlite::{params, params_from_iter, Row};
use rust_decimal::Decimal;
use std::collections::BTreeSet;

const PRODUCT_COLUMNS: &str =
    "product_code, name, monthly_rate, min_term, max_term, min_principal, max_principal";

pub struct SqliteProductCatalog {
    db: Database,
}

/// Row as stored, before decimal decoding.
struct RawProduct {
    code:          ProductCode,
    name:          String,
    monthly_rate:  String,
    min_term:      i64,
    max_term:      Option<i64>,
    min_principal: String,
    max_principal: Option<String>,
}

impl RawProduct {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            code:          row.get(0)?,
            name:          row.get(1)?,
            monthly_rate:  row.get(2)?,
            min_term:      row.get(3)?,
            max_term:      row.get(4)?,
            min_principal: row.get(5)?,
            max_principal: row.get(6)?,
        })
    }

    fn decode(self) -> SimResult<CreditProduct> {
        Ok(CreditProduct {
            code:          self.code,
            name:          self.name,
            monthly_rate:  decode_decimal("monthly_rate", &self.monthly_rate)?,
            min_term:      decode_term("min_term", self.min_term)?,
            max_term:      self.max_term.map(|t| decode_term("max_term", t)).transpose()?,
            min_principal: decode_decimal("min_principal", &self.min_principal)?,
            max_principal: decode_optional_decimal("max_principal", self.max_principal.as_deref())?,
        })
    }
}

impl SqliteProductCatalog {
    pub fn new(db: Database) -> SimResult<Self> {
        db.migrate_catalog()?;
        Ok(Self { db })
    }

    pub fn open(path: &str) -> SimResult<Self> {
        Self::new(Database::open(path)?)
    }

    pub fn in_memory() -> SimResult<Self> {
        Self::new(Database::in_memory()?)
    }

    // ── Reference data loading (out of band) ─────────────────────

    /// Load a whole catalog in one transaction. Returns rows written.
    /// Only tooling and tests load the catalog; simulation code never
    /// writes to it.
    pub fn seed(&self, products: &[CreditProduct]) -> SimResult<usize> {
        self.db.write_now(|conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(&format!(
                    "INSERT OR REPLACE INTO product ({PRODUCT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
                ))?;
                for product in products {
                    stmt.execute(params![
                        product.code,
                        product.name,
                        product.monthly_rate.to_string(),
                        product.min_term as i64,
                        product.max_term.map(|t| t as i64),
                        product.min_principal.to_string(),
                        product.max_principal.map(|p| p.to_string()),
                    ])?;
                }
            }
            tx.commit()?;
            log::info!("catalog: seeded {} products", products.len());
            Ok(products.len())
        })
    }

    pub fn product_count(&self) -> SimResult<u64> {
        self.db.read_now(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM product", [], |row| row.get(0))?;
            Ok(n as u64)
        })
    }
}

#[async_trait]
impl ProductCatalog for SqliteProductCatalog {
    async fn find_eligible(
        &self,
        principal: Decimal,
        term_months: u32,
    ) -> SimResult<Option<CreditProduct>> {
        self.db
            .read(move |conn| {
                // Term bounds are integers and filter in SQL; principal
                // bounds are exact decimals and are checked after decoding.
                let mut stmt = conn.prepare(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM product
                     WHERE min_term <= ?1 AND (max_term IS NULL OR max_term >= ?1)
                     ORDER BY product_code ASC"
                ))?;
                let mut rows = stmt.query(params![term_months as i64])?;
                while let Some(row) = rows.next()? {
                    let product = RawProduct::from_row(row)?.decode()?;
                    if product.is_eligible(principal, term_months) {
                        return Ok(Some(product));
                    }
                }
                Ok(None)
            })
            .await
    }

    async fn find_by_codes(&self, codes: &BTreeSet<ProductCode>) -> SimResult<Vec<CreditProduct>> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        let codes: Vec<ProductCode> = codes.iter().copied().collect();
        self.db
            .read(move |conn| {
                let placeholders = vec!["?"; codes.len()].join(", ");
                let mut stmt = conn.prepare(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM product
                     WHERE product_code IN ({placeholders})
                     ORDER BY product_code ASC"
                ))?;
                let raw = stmt
                    .query_map(params_from_iter(codes.iter()), RawProduct::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                raw.into_iter().map(RawProduct::decode).collect()
            })
            .await
    }
}
