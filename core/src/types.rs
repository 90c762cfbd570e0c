//! Shared data contracts used across matching, amortization and history.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Catalog primary key of a credit product.
pub type ProductCode = i32;

/// Identifier generated by the history store on insert.
pub type SimulationId = Uuid;

// ── Catalog ───────────────────────────────────────────────────

/// Reference data owned by the product catalog. Never mutated here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditProduct {
    pub code:          ProductCode,
    pub name:          String,
    /// Monthly rate as a fraction, e.g. 0.0179 for 1.79% a month.
    pub monthly_rate:  Decimal,
    pub min_term:      u32,
    #[serde(default)]
    pub max_term:      Option<u32>,
    pub min_principal: Decimal,
    #[serde(default)]
    pub max_principal: Option<Decimal>,
}

impl CreditProduct {
    /// Inclusive eligibility window check. Absent upper bounds are unbounded.
    pub fn is_eligible(&self, principal: Decimal, term_months: u32) -> bool {
        principal >= self.min_principal
            && self.max_principal.map_or(true, |max| principal <= max)
            && term_months >= self.min_term
            && self.max_term.map_or(true, |max| term_months <= max)
    }
}

// ── Request ───────────────────────────────────────────────────

/// Raw client input. Validated by the orchestrator before matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub principal:   Decimal,
    pub term_months: i64,
}

impl SimulationRequest {
    pub fn new(principal: Decimal, term_months: i64) -> Self {
        Self { principal, term_months }
    }
}

// ── Schedules ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    pub number:       u32,
    pub amortization: Decimal,
    pub interest:     Decimal,
    pub total:        Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScheduleKind {
    #[serde(rename = "SAC")]
    Sac,
    #[serde(rename = "PRICE")]
    Price,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleResult {
    pub kind:         ScheduleKind,
    pub installments: Vec<Installment>,
}

impl ScheduleResult {
    pub fn new(kind: ScheduleKind, installments: Vec<Installment>) -> Self {
        Self { kind, installments }
    }

    /// Sum of every installment total. `None` if the sum leaves the
    /// decimal range.
    pub fn total_paid(&self) -> Option<Decimal> {
        self.installments
            .iter()
            .try_fold(Decimal::ZERO, |acc, i| acc.checked_add(i.total))
    }
}

// ── History ───────────────────────────────────────────────────

/// A simulation about to be persisted. Id and timestamp come from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSimulation {
    pub principal:          Decimal,
    pub term_months:        u32,
    pub total_installments: Decimal,
    pub product_code:       ProductCode,
}

/// Immutable history row. Holds the product code only, never the product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRecord {
    pub id:                 SimulationId,
    pub created_at:         DateTime<Utc>,
    pub principal:          Decimal,
    pub term_months:        u32,
    pub total_installments: Decimal,
    pub product_code:       ProductCode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResponse {
    pub simulation_id: SimulationId,
    pub product_code:  ProductCode,
    pub product_name:  String,
    pub monthly_rate:  Decimal,
    pub schedules:     Vec<ScheduleResult>,
}

impl SimulationResponse {
    pub fn schedule(&self, kind: ScheduleKind) -> Option<&ScheduleResult> {
        self.schedules.iter().find(|s| s.kind == kind)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPage {
    pub page:          u32,
    pub page_size:     u32,
    pub total_records: u64,
    pub page_records:  usize,
    pub records:       Vec<SimulationRecord>,
}

// ── Daily report ──────────────────────────────────────────────

/// Inclusive instant range covering one calendar day (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRange {
    pub start: DateTime<Utc>,
    pub end:   DateTime<Utc>,
}

impl DayRange {
    /// `[date 00:00:00, date 23:59:59.999999]`. Microseconds are the
    /// finest resolution the history store keeps.
    pub fn for_date(date: NaiveDate) -> Self {
        let start = date.and_time(chrono::NaiveTime::MIN).and_utc();
        let end = start + Duration::days(1) - Duration::microseconds(1);
        Self { start, end }
    }
}

/// Per-product aggregate computed by the history store for one day.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDayAggregate {
    pub product_code:            ProductCode,
    /// Mean of `total_installments / term_months`, unrounded.
    pub avg_monthly_installment: Decimal,
    pub sum_principal:           Decimal,
    pub sum_total_installments:  Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyProductVolume {
    pub product_code:            ProductCode,
    pub product_name:            String,
    pub avg_monthly_rate:        Decimal,
    pub avg_monthly_installment: Decimal,
    pub sum_principal:           Decimal,
    pub sum_total_installments:  Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyVolumeReport {
    /// Calendar date as `YYYY-MM-DD`.
    pub date:     String,
    pub products: Vec<DailyProductVolume>,
}
