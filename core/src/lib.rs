//! Credit simulation core: product matching, SAC and PRICE installment
//! schedules, simulation history and daily volume reporting.

pub mod amortization;
pub mod clock;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod product_matcher;
pub mod service;
pub mod simulation_store;
pub mod store;
pub mod types;
