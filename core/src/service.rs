//! Boundary service: wraps the orchestrator with timing, telemetry
//! logging and failure translation for whatever transport calls it.
//!
//! Telemetry lines go to the `telemetry` log target:
//!   SUCCESS | <op> | <ms>ms
//!   ALERT   | <op> | status=<status> | <ms>ms    (client-correctable)
//!   FAILURE | <op> | <ms>ms | <error>            (store faults)

use crate::{
    error::{SimError, SimResult},
    orchestrator::SimulationOrchestrator,
    product_matcher::ProductCatalog,
    simulation_store::SimulationStore,
    types::{DailyVolumeReport, HistoryPage, SimulationRequest, SimulationResponse},
};
use chrono::NaiveDate;
use serde::Serialize;
use std::future::Future;
use std::time::Instant;

pub const TELEMETRY_TARGET: &str = "telemetry";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    BadRequest,
    NotFound,
    ServerError,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceError {
    pub status:  ServiceStatus,
    pub message: String,
}

impl From<SimError> for ServiceError {
    fn from(err: SimError) -> Self {
        match err {
            SimError::InvalidInput { .. } => ServiceError {
                status:  ServiceStatus::BadRequest,
                message: err.to_string(),
            },
            SimError::ProductNotFound { .. } => ServiceError {
                status:  ServiceStatus::NotFound,
                message: err.to_string(),
            },
            // Details stay in the log.
            _ => ServiceError {
                status:  ServiceStatus::ServerError,
                message: "internal error while processing the request".into(),
            },
        }
    }
}

pub struct SimulationService<C, S> {
    orchestrator: SimulationOrchestrator<C, S>,
}

impl<C: ProductCatalog, S: SimulationStore> SimulationService<C, S> {
    pub fn new(orchestrator: SimulationOrchestrator<C, S>) -> Self {
        Self { orchestrator }
    }

    pub async fn submit_simulation(
        &self,
        request: &SimulationRequest,
    ) -> Result<SimulationResponse, ServiceError> {
        instrument("submit_simulation", self.orchestrator.simulate(request)).await
    }

    pub async fn list_history(&self, page: i64, page_size: i64) -> Result<HistoryPage, ServiceError> {
        instrument("list_history", self.orchestrator.list_history(page, page_size)).await
    }

    /// `date` must be `YYYY-MM-DD`; anything else is a bad request.
    pub async fn daily_report(&self, date: &str) -> Result<DailyVolumeReport, ServiceError> {
        instrument("daily_report", async {
            let date = parse_report_date(date)?;
            self.orchestrator.daily_volume_report(date).await
        })
        .await
    }
}

pub fn parse_report_date(raw: &str) -> SimResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| SimError::invalid("date", format!("'{raw}' is not a YYYY-MM-DD date")))
}

async fn instrument<T>(
    op: &'static str,
    fut: impl Future<Output = SimResult<T>>,
) -> Result<T, ServiceError> {
    let started = Instant::now();
    let result = fut.await;
    let elapsed = started.elapsed().as_millis();

    match result {
        Ok(value) => {
            log::info!(target: TELEMETRY_TARGET, "SUCCESS | {op} | {elapsed}ms");
            Ok(value)
        }
        Err(err) if err.is_client_error() => {
            let err = ServiceError::from(err);
            log::warn!(
                target: TELEMETRY_TARGET,
                "ALERT | {op} | status={:?} | {elapsed}ms | {}",
                err.status,
                err.message
            );
            Err(err)
        }
        Err(err) => {
            log::error!(target: TELEMETRY_TARGET, "FAILURE | {op} | {elapsed}ms | {err}");
            Err(ServiceError::from(err))
        }
    }
}
