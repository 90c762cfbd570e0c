use super::{decode_decimal, decode_term, decode_timestamp, encode_timestamp, Database};
use crate::{
    clock::{Clock, SystemClock},
    error::{SimError, SimResult},
    simulation_store::SimulationStore,
    types::{DayRange, NewSimulation, ProductCode, ProductDayAggregate, SimulationRecord},
};
use async_trait::async_trait;
use rusqlite::{params, Row};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

const SIMULATION_COLUMNS: &str =
    "simulation_id, created_at, principal, term_months, total_installments, product_code";

pub struct SqliteSimulationStore {
    db:    Database,
    clock: Arc<dyn Clock>,
}

struct RawSimulation {
    id:                 String,
    created_at:         String,
    principal:          String,
    term_months:        i64,
    total_installments: String,
    product_code:       ProductCode,
}

impl RawSimulation {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id:                 row.get(0)?,
            created_at:         row.get(1)?,
            principal:          row.get(2)?,
            term_months:        row.get(3)?,
            total_installments: row.get(4)?,
            product_code:       row.get(5)?,
        })
    }

    fn decode(self) -> SimResult<SimulationRecord> {
        let id = Uuid::parse_str(&self.id).map_err(|_| SimError::CorruptValue {
            column: "simulation_id",
            value:  self.id.clone(),
        })?;
        Ok(SimulationRecord {
            id,
            created_at:         decode_timestamp("created_at", &self.created_at)?,
            principal:          decode_decimal("principal", &self.principal)?,
            term_months:        decode_term("term_months", self.term_months)?,
            total_installments: decode_decimal("total_installments", &self.total_installments)?,
            product_code:       self.product_code,
        })
    }
}

#[derive(Default)]
struct DayAccumulator {
    count:                  u32,
    sum_monthly:            Decimal,
    sum_principal:          Decimal,
    sum_total_installments: Decimal,
}

impl DayAccumulator {
    fn add(&mut self, principal: Decimal, term_months: u32, total: Decimal) -> SimResult<()> {
        let overflow = || SimError::Overflow { context: "daily volume sums" };
        let monthly = total / Decimal::from(term_months);
        self.sum_monthly = self.sum_monthly.checked_add(monthly).ok_or_else(overflow)?;
        self.sum_principal = self.sum_principal.checked_add(principal).ok_or_else(overflow)?;
        self.sum_total_installments = self
            .sum_total_installments
            .checked_add(total)
            .ok_or_else(overflow)?;
        self.count += 1;
        Ok(())
    }
}

impl SqliteSimulationStore {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> SimResult<Self> {
        db.migrate_history()?;
        Ok(Self { db, clock })
    }

    pub fn open(path: &str) -> SimResult<Self> {
        Self::new(Database::open(path)?, Arc::new(SystemClock))
    }

    pub fn in_memory(clock: Arc<dyn Clock>) -> SimResult<Self> {
        Self::new(Database::in_memory()?, clock)
    }
}

#[async_trait]
impl SimulationStore for SqliteSimulationStore {
    async fn insert(&self, simulation: NewSimulation) -> SimResult<SimulationRecord> {
        let record = SimulationRecord {
            id:                 Uuid::new_v4(),
            created_at:         self.clock.now(),
            principal:          simulation.principal,
            term_months:        simulation.term_months,
            total_installments: simulation.total_installments,
            product_code:       simulation.product_code,
        };
        let row = (
            record.id.to_string(),
            encode_timestamp(record.created_at),
            record.principal.to_string(),
            record.term_months as i64,
            record.total_installments.to_string(),
            record.product_code,
        );
        self.db
            .write(move |conn| {
                conn.execute(
                    &format!("INSERT INTO simulation ({SIMULATION_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
                    params![row.0, row.1, row.2, row.3, row.4, row.5],
                )?;
                Ok(())
            })
            .await?;
        log::debug!("history: stored simulation {} (product {})", record.id, record.product_code);
        Ok(record)
    }

    async fn count(&self) -> SimResult<u64> {
        self.db
            .read(|conn| {
                let n: i64 = conn.query_row("SELECT COUNT(*) FROM simulation", [], |row| row.get(0))?;
                Ok(n as u64)
            })
            .await
    }

    async fn page(&self, offset: u64, limit: u32) -> SimResult<Vec<SimulationRecord>> {
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);
        self.db
            .read(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {SIMULATION_COLUMNS} FROM simulation
                     ORDER BY created_at DESC, rowid DESC
                     LIMIT ?1 OFFSET ?2"
                ))?;
                let raw = stmt
                    .query_map(params![limit as i64, offset], RawSimulation::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                raw.into_iter().map(RawSimulation::decode).collect()
            })
            .await
    }

    async fn aggregate_by_product_for_day(&self, range: DayRange) -> SimResult<Vec<ProductDayAggregate>> {
        let (start, end) = (encode_timestamp(range.start), encode_timestamp(range.end));
        let rows = self
            .db
            .read(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT product_code, principal, term_months, total_installments
                     FROM simulation
                     WHERE product_code > 0 AND created_at >= ?1 AND created_at <= ?2
                     ORDER BY product_code ASC",
                )?;
                let rows = stmt
                    .query_map(params![start, end], |row| {
                        Ok((
                            row.get::<_, ProductCode>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, i64>(2)?,
                            row.get::<_, String>(3)?,
                        ))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        // Folded here rather than with SQL SUM/AVG, which would go
        // through floating point on TEXT decimals.
        let mut groups: BTreeMap<ProductCode, DayAccumulator> = BTreeMap::new();
        for (code, principal, term, total) in rows {
            let principal = decode_decimal("principal", &principal)?;
            let term = decode_term("term_months", term)?;
            let total = decode_decimal("total_installments", &total)?;
            if term == 0 {
                return Err(SimError::CorruptValue { column: "term_months", value: "0".into() });
            }

            groups.entry(code).or_default().add(principal, term, total)?;
        }

        Ok(groups
            .into_iter()
            .map(|(product_code, acc)| ProductDayAggregate {
                product_code,
                avg_monthly_installment: acc.sum_monthly / Decimal::from(acc.count),
                sum_principal:           acc.sum_principal,
                sum_total_installments:  acc.sum_total_installments,
            })
            .collect())
    }
}
