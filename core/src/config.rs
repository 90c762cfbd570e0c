use crate::types::CreditProduct;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

pub const CATALOG_DB_ENV: &str = "CREDIT_SIM_CATALOG_DB";
pub const HISTORY_DB_ENV: &str = "CREDIT_SIM_HISTORY_DB";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    #[serde(default = "max_page_size")]
    pub max_page_size: u32,
}

fn default_page_size() -> u32 { DEFAULT_PAGE_SIZE }
fn max_page_size() -> u32 { MAX_PAGE_SIZE }

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size:     MAX_PAGE_SIZE,
        }
    }
}

impl PaginationConfig {
    /// Clamp raw paging input. Never fails:
    /// page < 1 becomes 1, size < 1 becomes the default, size above the
    /// maximum becomes the maximum.
    pub fn sanitize(&self, page: i64, page_size: i64) -> (u32, u32) {
        let page = page.clamp(1, u32::MAX as i64) as u32;
        let page_size = if page_size < 1 {
            self.default_page_size
        } else if page_size > self.max_page_size as i64 {
            self.max_page_size
        } else {
            page_size as u32
        };
        (page, page_size)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite path of the read-only product catalog.
    pub catalog_db: String,
    /// SQLite path of the simulation history.
    pub history_db: String,
    /// Optional catalog JSON used by the `seed` command.
    #[serde(default)]
    pub catalog_seed: Option<String>,
    #[serde(default)]
    pub pagination: PaginationConfig,
}

#[derive(Debug, Clone, Deserialize)]
struct ProductCatalogFile {
    products: Vec<CreditProduct>,
}

impl AppConfig {
    /// Load `{data_dir}/config.json`, then apply environment overrides.
    /// In tests, use AppConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/config.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let mut config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.apply_env_overrides();
        if config.pagination.default_page_size == 0
            || config.pagination.default_page_size > config.pagination.max_page_size
        {
            anyhow::bail!(
                "{path}: default_page_size must be within 1..={}",
                config.pagination.max_page_size
            );
        }
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var(CATALOG_DB_ENV) {
            log::info!("config: catalog_db overridden by {CATALOG_DB_ENV}");
            self.catalog_db = path;
        }
        if let Ok(path) = std::env::var(HISTORY_DB_ENV) {
            log::info!("config: history_db overridden by {HISTORY_DB_ENV}");
            self.history_db = path;
        }
    }

    /// In-memory databases and default paging.
    pub fn default_test() -> Self {
        Self {
            catalog_db:   ":memory:".into(),
            history_db:   ":memory:".into(),
            catalog_seed: None,
            pagination:   PaginationConfig::default(),
        }
    }
}

/// Read a `{ "products": [...] }` catalog file.
pub fn load_product_catalog(path: &str) -> anyhow::Result<Vec<CreditProduct>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
    let file: ProductCatalogFile = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
    Ok(file.products)
}
