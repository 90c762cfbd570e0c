mod common;

use chrono::{Duration, NaiveDate};
use common::{at, harness};
use credit_sim_core::{
    orchestrator::missing_product_name,
    simulation_store::SimulationStore,
    types::{NewSimulation, ScheduleKind, SimulationRequest},
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 30).unwrap()
}

fn record(code: i32, principal: Decimal, term: u32, total: Decimal) -> NewSimulation {
    NewSimulation {
        principal,
        term_months: term,
        total_installments: total,
        product_code: code,
    }
}

#[tokio::test]
async fn day_without_simulations_is_empty() {
    let h = harness();
    let report = h.orchestrator.daily_volume_report(day()).await.unwrap();
    assert_eq!(report.date, "2025-07-30");
    assert!(report.products.is_empty());
}

#[tokio::test]
async fn groups_per_product_and_enriches_from_catalog() {
    let h = harness();
    let small = h
        .orchestrator
        .simulate(&SimulationRequest::new(dec!(1000), 12))
        .await
        .unwrap();
    h.orchestrator
        .simulate(&SimulationRequest::new(dec!(1000), 12))
        .await
        .unwrap();
    h.orchestrator
        .simulate(&SimulationRequest::new(dec!(20000), 36))
        .await
        .unwrap();

    let report = h.orchestrator.daily_volume_report(day()).await.unwrap();
    assert_eq!(report.products.len(), 2);

    let p1 = &report.products[0];
    let level = small.schedule(ScheduleKind::Price).unwrap().installments[0].total;
    assert_eq!(p1.product_code, 1);
    assert_eq!(p1.product_name, "Produto 1");
    assert_eq!(p1.avg_monthly_rate, dec!(0.0179));
    assert_eq!(p1.sum_principal, dec!(2000));
    assert_eq!(p1.sum_total_installments, level * Decimal::from(24));
    assert_eq!(p1.avg_monthly_installment, level);

    let p2 = &report.products[1];
    assert_eq!(p2.product_code, 2);
    assert_eq!(p2.sum_principal, dec!(20000));
}

#[tokio::test]
async fn average_is_over_per_record_monthly_values() {
    let h = harness();
    h.history.insert(record(1, dec!(1000), 10, dec!(1100))).await.unwrap();
    h.history.insert(record(1, dec!(3000), 4, dec!(3333))).await.unwrap();

    let report = h.orchestrator.daily_volume_report(day()).await.unwrap();
    let p1 = &report.products[0];
    // (110 + 833.25) / 2 = 471.625 -> 471.62 (midpoint to even)
    assert_eq!(p1.avg_monthly_installment, dec!(471.62));
    assert_eq!(p1.sum_principal, dec!(4000));
    assert_eq!(p1.sum_total_installments, dec!(4433));
}

#[tokio::test]
async fn product_missing_from_catalog_gets_placeholder() {
    let h = harness();
    h.history.insert(record(99, dec!(500), 5, dec!(520))).await.unwrap();
    h.history.insert(record(1, dec!(500), 5, dec!(520))).await.unwrap();

    let report = h.orchestrator.daily_volume_report(day()).await.unwrap();
    assert_eq!(report.products.len(), 2);

    let missing = report.products.iter().find(|p| p.product_code == 99).unwrap();
    assert_eq!(missing.product_name, missing_product_name(99));
    assert_eq!(missing.product_name, "Product 99 (not found)");
    assert_eq!(missing.avg_monthly_rate, Decimal::ZERO);
    assert_eq!(missing.avg_monthly_installment, dec!(104.00));

    let known = report.products.iter().find(|p| p.product_code == 1).unwrap();
    assert_eq!(known.product_name, "Produto 1");
}

#[tokio::test]
async fn day_bounds_are_inclusive_and_neighbours_excluded() {
    let h = harness();

    h.clock.set(at(2025, 7, 29, 23, 59, 59) + Duration::microseconds(999_999));
    h.history.insert(record(1, dec!(1), 1, dec!(1))).await.unwrap();

    h.clock.set(at(2025, 7, 30, 0, 0, 0));
    h.history.insert(record(1, dec!(10), 1, dec!(10))).await.unwrap();

    h.clock.set(at(2025, 7, 30, 23, 59, 59) + Duration::microseconds(999_999));
    h.history.insert(record(1, dec!(100), 1, dec!(100))).await.unwrap();

    h.clock.set(at(2025, 7, 31, 0, 0, 0));
    h.history.insert(record(1, dec!(1000), 1, dec!(1000))).await.unwrap();

    let report = h.orchestrator.daily_volume_report(day()).await.unwrap();
    assert_eq!(report.products.len(), 1);
    assert_eq!(report.products[0].sum_principal, dec!(110));

    let next = h
        .orchestrator
        .daily_volume_report(NaiveDate::from_ymd_opt(2025, 7, 31).unwrap())
        .await
        .unwrap();
    assert_eq!(next.products[0].sum_principal, dec!(1000));
}

#[tokio::test]
async fn non_positive_product_codes_are_ignored() {
    let h = harness();
    h.history.insert(record(0, dec!(700), 7, dec!(700))).await.unwrap();
    h.history.insert(record(-1, dec!(700), 7, dec!(700))).await.unwrap();

    let report = h.orchestrator.daily_volume_report(day()).await.unwrap();
    assert!(report.products.is_empty());
}
