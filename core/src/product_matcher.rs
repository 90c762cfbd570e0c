//! Product eligibility matching.
//!
//! The catalog is authoritative and read-only from here. Selection takes
//! the first eligible product in catalog key order; there is no best-rate
//! or tightest-window tie-break.

use crate::{
    error::{SimError, SimResult},
    types::{CreditProduct, ProductCode},
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Read-only source of credit products.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// First product whose eligibility window contains both values,
    /// in catalog key order. `None` when nothing fits.
    async fn find_eligible(
        &self,
        principal: Decimal,
        term_months: u32,
    ) -> SimResult<Option<CreditProduct>>;

    /// Products for the given codes. Unknown codes are left out.
    async fn find_by_codes(&self, codes: &BTreeSet<ProductCode>) -> SimResult<Vec<CreditProduct>>;
}

#[async_trait]
impl<T: ProductCatalog + ?Sized> ProductCatalog for Arc<T> {
    async fn find_eligible(
        &self,
        principal: Decimal,
        term_months: u32,
    ) -> SimResult<Option<CreditProduct>> {
        (**self).find_eligible(principal, term_months).await
    }

    async fn find_by_codes(&self, codes: &BTreeSet<ProductCode>) -> SimResult<Vec<CreditProduct>> {
        (**self).find_by_codes(codes).await
    }
}

pub struct ProductMatcher<C> {
    catalog: C,
}

impl<C: ProductCatalog> ProductMatcher<C> {
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    /// Select the product for a validated request, or `ProductNotFound`.
    pub async fn match_product(&self, principal: Decimal, term_months: u32) -> SimResult<CreditProduct> {
        match self.catalog.find_eligible(principal, term_months).await? {
            Some(product) => {
                log::debug!(
                    "matcher: principal={principal} term={term_months} -> product {} ({})",
                    product.code,
                    product.name
                );
                Ok(product)
            }
            None => {
                log::info!("matcher: no product for principal={principal} term={term_months}");
                Err(SimError::ProductNotFound { principal, term_months })
            }
        }
    }

    /// Batch lookup used by report enrichment. Gaps are allowed.
    pub async fn products_by_codes(&self, codes: &BTreeSet<ProductCode>) -> SimResult<Vec<CreditProduct>> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        self.catalog.find_by_codes(codes).await
    }
}
