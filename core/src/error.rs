use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("No credit product accepts principal {principal} over {term_months} months")]
    ProductNotFound { principal: Decimal, term_months: u32 },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] rusqlite::Error),

    #[error("Corrupt value in column '{column}': {value:?}")]
    CorruptValue { column: &'static str, value: String },

    #[error("Arithmetic overflow while computing {context}")]
    Overflow { context: &'static str },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SimError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        SimError::InvalidInput { field, reason: reason.into() }
    }

    /// True when the caller can fix the failure by changing its input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SimError::InvalidInput { .. } | SimError::ProductNotFound { .. }
        )
    }
}

pub type SimResult<T> = Result<T, SimError>;
