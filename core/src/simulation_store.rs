//! History store contract.
//!
//! RULE: history is append-only. Nothing here updates or deletes a record.

use crate::{
    error::SimResult,
    types::{DayRange, NewSimulation, ProductDayAggregate, SimulationRecord},
};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait SimulationStore: Send + Sync {
    /// Persist one simulation. The store assigns id and creation instant.
    async fn insert(&self, simulation: NewSimulation) -> SimResult<SimulationRecord>;

    async fn count(&self) -> SimResult<u64>;

    /// Records ordered newest first, skipping `offset`, at most `limit`.
    async fn page(&self, offset: u64, limit: u32) -> SimResult<Vec<SimulationRecord>>;

    /// Per-product aggregates of records created inside `range`
    /// (inclusive on both ends), ordered by product code.
    async fn aggregate_by_product_for_day(&self, range: DayRange) -> SimResult<Vec<ProductDayAggregate>>;
}

#[async_trait]
impl<T: SimulationStore + ?Sized> SimulationStore for Arc<T> {
    async fn insert(&self, simulation: NewSimulation) -> SimResult<SimulationRecord> {
        (**self).insert(simulation).await
    }

    async fn count(&self) -> SimResult<u64> {
        (**self).count().await
    }

    async fn page(&self, offset: u64, limit: u32) -> SimResult<Vec<SimulationRecord>> {
        (**self).page(offset, limit).await
    }

    async fn aggregate_by_product_for_day(&self, range: DayRange) -> SimResult<Vec<ProductDayAggregate>> {
        (**self).aggregate_by_product_for_day(range).await
    }
}
