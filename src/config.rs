//! # Pantry Configuration Module
//!
//! Runtime settings read from the environment: remote store credentials,
//! the database id of each collection, HTTP limits and the log format.

use anyhow::{bail, Context, Result};
use std::time::Duration;

// Defaults for optional settings
pub const DEFAULT_BASE_URL: &str = "https://api.notion.com/v1";
pub const DEFAULT_API_VERSION: &str = "2022-06-28";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Largest page the query endpoint accepts
pub const QUERY_PAGE_SIZE: usize = 100;

/// Remote database id for each collection
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseIds {
    pub stock: String,
    pub want_list: String,
    pub recipes: String,
    /// Ingredient catalog, optional
    pub ingredients: Option<String>,
    /// Recipe to ingredient relation rows, optional
    pub recipe_ingredients: Option<String>,
}

impl DatabaseIds {
    /// Both relation collections are configured
    pub fn has_relations(&self) -> bool {
        self.ingredients.is_some() && self.recipe_ingredients.is_some()
    }
}

/// HTTP client settings for the remote store
#[derive(Debug, Clone, PartialEq)]
pub struct NotionConfig {
    pub api_key: String,
    pub base_url: String,
    /// Value of the `Notion-Version` header
    pub api_version: String,
    pub timeout: Duration,
    pub page_size: usize,
}

impl NotionConfig {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            page_size: QUERY_PAGE_SIZE,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Everything the binary needs to start
#[derive(Debug, Clone, PartialEq)]
pub struct PantryConfig {
    pub notion: NotionConfig,
    pub databases: DatabaseIds,
    pub log_format: LogFormat,
}

impl PantryConfig {
    /// Read configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let optional = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &str| {
            optional(key).with_context(|| format!("{key} must be set"))
        };

        let timeout_secs = match optional("NOTION_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("NOTION_TIMEOUT_SECS is not a whole number: {raw}"))?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            bail!("NOTION_TIMEOUT_SECS must be greater than zero");
        }

        let log_format = match optional("PANTRY_LOG_FORMAT").as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => bail!("PANTRY_LOG_FORMAT must be 'pretty' or 'json', got '{other}'"),
        };

        let mut notion = NotionConfig::new(&required("NOTION_API_KEY")?)
            .with_base_url(&optional("NOTION_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()));
        notion.api_version =
            optional("NOTION_VERSION").unwrap_or_else(|| DEFAULT_API_VERSION.to_string());
        notion.timeout = Duration::from_secs(timeout_secs);

        Ok(Self {
            notion,
            databases: DatabaseIds {
                stock: required("NOTION_STOCK_DB_ID")?,
                want_list: required("NOTION_WANT_LIST_DB_ID")?,
                recipes: required("NOTION_RECIPES_DB_ID")?,
                ingredients: optional("NOTION_INGREDIENTS_DB_ID"),
                recipe_ingredients: optional("NOTION_RECIPE_INGREDIENTS_DB_ID"),
            },
            log_format,
        })
    }
}
