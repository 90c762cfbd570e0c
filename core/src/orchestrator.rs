//! Simulation orchestration: the only place that composes matching,
//! amortization and persistence.
//!
//! FLOW (simulate):
//!   1. Validate the request (before any catalog access). Principal and
//!      term are capped (`MAX_PRINCIPAL`, `MAX_TERM_MONTHS`).
//!   2. Match a product. `ProductNotFound` propagates unchanged.
//!   3. Build SAC and PRICE schedules at the product's rate.
//!   4. Persist one record. Total value = sum of PRICE installments.
//!   5. Return both schedules with product identity and the record id.
//!
//! RULES:
//!   - Nothing is written when matching or scheduling fails.
//!   - The record is the last thing written; there is nothing to undo
//!     if persisting fails.
//!   - No retries anywhere. Every failure surfaces on the first attempt.
//!   - No state is shared between calls beyond the stores themselves.

use crate::{
    amortization,
    config::PaginationConfig,
    error::{SimError, SimResult},
    product_matcher::{ProductCatalog, ProductMatcher},
    simulation_store::SimulationStore,
    types::{
        CreditProduct, DailyProductVolume, DailyVolumeReport, DayRange, HistoryPage,
        NewSimulation, ProductCode, ScheduleKind, SimulationRequest, SimulationResponse,
    },
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};

pub struct SimulationOrchestrator<C, S> {
    matcher:    ProductMatcher<C>,
    store:      S,
    pagination: PaginationConfig,
}

impl<C: ProductCatalog, S: SimulationStore> SimulationOrchestrator<C, S> {
    pub fn new(catalog: C, store: S) -> Self {
        Self::with_pagination(catalog, store, PaginationConfig::default())
    }

    pub fn with_pagination(catalog: C, store: S, pagination: PaginationConfig) -> Self {
        Self {
            matcher: ProductMatcher::new(catalog),
            store,
            pagination,
        }
    }

    // ── Simulate ──────────────────────────────────────────────

    pub async fn simulate(&self, request: &SimulationRequest) -> SimResult<SimulationResponse> {
        let term_months = validate_request(request)?;
        let principal = request.principal;

        let product = self.matcher.match_product(principal, term_months).await?;
        let schedules = amortization::both_schedules(principal, term_months, product.monthly_rate)?;

        let total_installments = schedules
            .iter()
            .find(|s| s.kind == ScheduleKind::Price)
            .map_or(Some(Decimal::ZERO), |s| s.total_paid())
            .ok_or(SimError::Overflow { context: "PRICE total paid" })?;

        let record = self
            .store
            .insert(NewSimulation {
                principal,
                term_months,
                total_installments,
                product_code: product.code,
            })
            .await?;

        log::info!(
            "simulate: id={} product={} principal={} term={} total={}",
            record.id,
            product.code,
            principal,
            term_months,
            total_installments
        );

        Ok(SimulationResponse {
            simulation_id: record.id,
            product_code:  product.code,
            product_name:  product.name,
            monthly_rate:  product.monthly_rate,
            schedules:     schedules.into(),
        })
    }

    // ── History ───────────────────────────────────────────────

    /// Paginated history, newest first. Out-of-range paging input is
    /// clamped, never rejected.
    pub async fn list_history(&self, page: i64, page_size: i64) -> SimResult<HistoryPage> {
        let (page, page_size) = self.pagination.sanitize(page, page_size);
        let offset = (page as u64 - 1) * page_size as u64;

        let total_records = self.store.count().await?;
        let records = self.store.page(offset, page_size).await?;

        Ok(HistoryPage {
            page,
            page_size,
            total_records,
            page_records: records.len(),
            records,
        })
    }

    // ── Daily report ──────────────────────────────────────────

    /// Aggregate the day's history per product, then enrich each group
    /// from the catalog. Products missing from the catalog get a
    /// placeholder name and a zero rate instead of failing the report.
    pub async fn daily_volume_report(&self, date: NaiveDate) -> SimResult<DailyVolumeReport> {
        let date_label = date.format("%Y-%m-%d").to_string();
        let aggregates = self
            .store
            .aggregate_by_product_for_day(DayRange::for_date(date))
            .await?;

        if aggregates.is_empty() {
            return Ok(DailyVolumeReport { date: date_label, products: Vec::new() });
        }

        let codes: BTreeSet<ProductCode> = aggregates.iter().map(|a| a.product_code).collect();
        let catalog: HashMap<ProductCode, CreditProduct> = self
            .matcher
            .products_by_codes(&codes)
            .await?
            .into_iter()
            .map(|p| (p.code, p))
            .collect();

        let products = aggregates
            .into_iter()
            .map(|agg| {
                let (product_name, avg_monthly_rate) = match catalog.get(&agg.product_code) {
                    Some(p) => (p.name.clone(), p.monthly_rate),
                    None => {
                        log::warn!("report {date_label}: product {} missing from catalog", agg.product_code);
                        (missing_product_name(agg.product_code), Decimal::ZERO)
                    }
                };
                DailyProductVolume {
                    product_code: agg.product_code,
                    product_name,
                    avg_monthly_rate,
                    avg_monthly_installment: amortization::round_money(agg.avg_monthly_installment),
                    sum_principal:           agg.sum_principal,
                    sum_total_installments:  agg.sum_total_installments,
                }
            })
            .collect();

        Ok(DailyVolumeReport { date: date_label, products })
    }
}

pub fn missing_product_name(code: ProductCode) -> String {
    format!("Product {code} (not found)")
}

/// Longest accepted term: a signed 16-bit month count.
pub const MAX_TERM_MONTHS: u32 = i16::MAX as u32;

/// Largest accepted principal, `9_999_999_999_999_999.99` (18 digits,
/// 2 of them cents).
pub const MAX_PRINCIPAL: Decimal = Decimal::from_parts(0xA763_FFFF, 0x0DE0_B6B3, 0, false, 2);

/// Input validation, distinct from product matching.
fn validate_request(request: &SimulationRequest) -> SimResult<u32> {
    if request.principal <= Decimal::ZERO {
        return Err(SimError::invalid(
            "principal",
            format!("must be positive, got {}", request.principal),
        ));
    }
    if request.principal > MAX_PRINCIPAL {
        return Err(SimError::invalid(
            "principal",
            format!("must not exceed {MAX_PRINCIPAL}, got {}", request.principal),
        ));
    }
    if request.term_months < 1 {
        return Err(SimError::invalid(
            "term_months",
            format!("must be at least 1, got {}", request.term_months),
        ));
    }
    if request.term_months > i64::from(MAX_TERM_MONTHS) {
        return Err(SimError::invalid(
            "term_months",
            format!("must not exceed {MAX_TERM_MONTHS}, got {}", request.term_months),
        ));
    }
    u32::try_from(request.term_months)
        .map_err(|_| SimError::invalid("term_months", format!("{} is out of range", request.term_months)))
}
