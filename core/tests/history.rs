mod common;

use chrono::Duration;
use common::harness;
use credit_sim_core::{
    config::PaginationConfig,
    orchestrator::SimulationOrchestrator,
    simulation_store::SimulationStore,
    types::NewSimulation,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

async fn insert_many(h: &common::Harness, n: u32) {
    for i in 0..n {
        h.history
            .insert(NewSimulation {
                principal:          Decimal::from(1000 + i),
                term_months:        12,
                total_installments: dec!(1200),
                product_code:       1,
            })
            .await
            .expect("insert");
        h.clock.advance(Duration::seconds(1));
    }
}

#[tokio::test]
async fn zero_page_and_size_behave_like_defaults() {
    let h = harness();
    insert_many(&h, 25).await;

    let sanitized = h.orchestrator.list_history(0, 0).await.unwrap();
    let explicit = h.orchestrator.list_history(1, 20).await.unwrap();

    assert_eq!(sanitized, explicit);
    assert_eq!(sanitized.page, 1);
    assert_eq!(sanitized.page_size, 20);
    assert_eq!(sanitized.total_records, 25);
    assert_eq!(sanitized.page_records, 20);
}

#[tokio::test]
async fn oversized_page_is_clamped_to_maximum() {
    let h = harness();
    insert_many(&h, 105).await;

    let page = h.orchestrator.list_history(1, 1000).await.unwrap();
    assert_eq!(page.page_size, 100);
    assert_eq!(page.page_records, 100);
    assert_eq!(page.total_records, 105);

    let tail = h.orchestrator.list_history(2, 1000).await.unwrap();
    assert_eq!(tail.page_records, 5);
}

#[tokio::test]
async fn records_come_newest_first() {
    let h = harness();
    insert_many(&h, 5).await;

    let first = h.orchestrator.list_history(1, 2).await.unwrap();
    let principals: Vec<Decimal> = first.records.iter().map(|r| r.principal).collect();
    assert_eq!(principals, vec![dec!(1004), dec!(1003)]);

    let second = h.orchestrator.list_history(2, 2).await.unwrap();
    let principals: Vec<Decimal> = second.records.iter().map(|r| r.principal).collect();
    assert_eq!(principals, vec![dec!(1002), dec!(1001)]);

    for pair in first.records.windows(2) {
        assert!(pair[0].created_at >= pair[1].created_at);
    }
}

#[tokio::test]
async fn page_past_the_end_is_empty_not_an_error() {
    let h = harness();
    insert_many(&h, 3).await;

    let page = h.orchestrator.list_history(50, 10).await.unwrap();
    assert_eq!(page.page, 50);
    assert_eq!(page.total_records, 3);
    assert_eq!(page.page_records, 0);
    assert!(page.records.is_empty());
}

#[tokio::test]
async fn empty_history_returns_empty_page() {
    let h = harness();
    let page = h.orchestrator.list_history(1, 20).await.unwrap();
    assert_eq!(page.total_records, 0);
    assert!(page.records.is_empty());
}

#[tokio::test]
async fn configured_limits_are_honoured() {
    let h = harness();
    insert_many(&h, 12).await;
    let orchestrator = SimulationOrchestrator::with_pagination(
        h.catalog.clone(),
        h.history.clone(),
        PaginationConfig { default_page_size: 5, max_page_size: 10 },
    );

    assert_eq!(orchestrator.list_history(1, 0).await.unwrap().page_records, 5);
    assert_eq!(orchestrator.list_history(1, 50).await.unwrap().page_size, 10);
}
