#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use credit_sim_core::{
    clock::FixedClock,
    orchestrator::SimulationOrchestrator,
    store::{SqliteProductCatalog, SqliteSimulationStore},
    types::CreditProduct,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

pub type TestOrchestrator =
    SimulationOrchestrator<Arc<SqliteProductCatalog>, Arc<SqliteSimulationStore>>;

pub struct Harness {
    pub catalog:      Arc<SqliteProductCatalog>,
    pub history:      Arc<SqliteSimulationStore>,
    pub clock:        Arc<FixedClock>,
    pub orchestrator: TestOrchestrator,
}

pub fn product(
    code: i32,
    rate: Decimal,
    min_term: u32,
    max_term: Option<u32>,
    min_principal: Decimal,
    max_principal: Option<Decimal>,
) -> CreditProduct {
    CreditProduct {
        code,
        name: format!("Produto {code}"),
        monthly_rate: rate,
        min_term,
        max_term,
        min_principal,
        max_principal,
    }
}

/// The four-product reference catalog shipped in data/products.
pub fn reference_products() -> Vec<CreditProduct> {
    vec![
        product(1, dec!(0.0179), 0, Some(24), dec!(200.00), Some(dec!(10000.00))),
        product(2, dec!(0.0175), 25, Some(48), dec!(10001.00), Some(dec!(100000.00))),
        product(3, dec!(0.0182), 49, Some(96), dec!(100000.01), Some(dec!(1000000.00))),
        product(4, dec!(0.0151), 96, None, dec!(1000000.01), None),
    ]
}

pub fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

pub fn harness_with(products: &[CreditProduct]) -> Harness {
    let catalog = Arc::new(SqliteProductCatalog::in_memory().expect("catalog"));
    catalog.seed(products).expect("seed catalog");
    let clock = Arc::new(FixedClock::new(at(2025, 7, 30, 12, 0, 0)));
    let history = Arc::new(SqliteSimulationStore::in_memory(clock.clone()).expect("history"));
    let orchestrator = SimulationOrchestrator::new(catalog.clone(), history.clone());
    Harness { catalog, history, clock, orchestrator }
}

pub fn harness() -> Harness {
    harness_with(&reference_products())
}
