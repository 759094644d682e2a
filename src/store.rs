//! # Document Store Module
//!
//! The pantry keeps its data in a remote page/database service. This module
//! defines the narrow slice of that service the pantry relies on: records made
//! of typed properties, five named collections, a handful of filters, and the
//! six operations in [`DocumentStore`].
//!
//! [`MemoryStore`] implements the trait in-process and backs the tests.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tracing::debug;

/// Property bag of a record, keyed by property name
pub type Properties = BTreeMap<String, PropertyValue>;

/// The named collections the pantry reads and writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Collection {
    /// Pantry inventory
    Stock,
    /// Shopping list
    WantList,
    /// Recipe collection
    Recipe,
    /// Ingredient catalog
    Ingredient,
    /// Recipe to ingredient relation rows
    RecipeIngredient,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Collection::Stock => "stock",
            Collection::WantList => "want list",
            Collection::Recipe => "recipes",
            Collection::Ingredient => "ingredients",
            Collection::RecipeIngredient => "recipe ingredients",
        };
        write!(f, "{name}")
    }
}

/// Soft-delete state; records are archived, never removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    #[default]
    Active,
    Archived,
}

/// A single typed property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    Title(String),
    RichText(String),
    Number(Option<f64>),
    Select(Option<String>),
    MultiSelect(Vec<String>),
    Checkbox(bool),
    Date(Option<NaiveDate>),
    Url(Option<String>),
    Relation(Vec<String>),
}

/// A record as stored remotely
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub properties: Properties,
    #[serde(default)]
    pub lifecycle: Lifecycle,
}

impl Record {
    /// Text of a title, rich text, select or url property; `""` when missing
    pub fn text(&self, key: &str) -> String {
        match self.properties.get(key) {
            Some(PropertyValue::Title(s)) | Some(PropertyValue::RichText(s)) => s.clone(),
            Some(PropertyValue::Select(Some(s))) | Some(PropertyValue::Url(Some(s))) => s.clone(),
            _ => String::new(),
        }
    }

    /// Like [`Record::text`] but `None` for missing or blank values
    pub fn opt_text(&self, key: &str) -> Option<String> {
        let text = self.text(key);
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Numeric property; `0` when missing
    pub fn number(&self, key: &str) -> f64 {
        self.opt_number(key).unwrap_or(0.0)
    }

    /// Numeric property, keeping absence distinct from zero
    pub fn opt_number(&self, key: &str) -> Option<f64> {
        match self.properties.get(key) {
            Some(PropertyValue::Number(n)) => *n,
            _ => None,
        }
    }

    /// Checkbox property; `false` when missing
    pub fn checkbox(&self, key: &str) -> bool {
        matches!(self.properties.get(key), Some(PropertyValue::Checkbox(true)))
    }

    pub fn date(&self, key: &str) -> Option<NaiveDate> {
        match self.properties.get(key) {
            Some(PropertyValue::Date(d)) => *d,
            _ => None,
        }
    }

    /// Multi-select names; empty when missing
    pub fn multi_select(&self, key: &str) -> Vec<String> {
        match self.properties.get(key) {
            Some(PropertyValue::MultiSelect(values)) => values.clone(),
            _ => Vec::new(),
        }
    }

    /// Related record ids; empty when missing
    pub fn relation(&self, key: &str) -> Vec<String> {
        match self.properties.get(key) {
            Some(PropertyValue::Relation(ids)) => ids.clone(),
            _ => Vec::new(),
        }
    }

    pub fn is_archived(&self) -> bool {
        self.lifecycle == Lifecycle::Archived
    }
}

/// Server-side filters the pantry needs
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Checkbox property equals the given flag
    Checkbox { property: String, equals: bool },
    /// Relation property contains the given record id
    RelationContains { property: String, id: String },
    /// Date property is set and on or before the given day
    DateOnOrBefore { property: String, date: NaiveDate },
}

impl Filter {
    pub fn checkbox(property: &str, equals: bool) -> Self {
        Filter::Checkbox {
            property: property.to_string(),
            equals,
        }
    }

    pub fn relation_contains(property: &str, id: &str) -> Self {
        Filter::RelationContains {
            property: property.to_string(),
            id: id.to_string(),
        }
    }

    pub fn date_on_or_before(property: &str, date: NaiveDate) -> Self {
        Filter::DateOnOrBefore {
            property: property.to_string(),
            date,
        }
    }

    /// Evaluate the filter against a record held in memory
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Filter::Checkbox { property, equals } => record.checkbox(property) == *equals,
            Filter::RelationContains { property, id } => {
                record.relation(property).iter().any(|r| r == id)
            }
            Filter::DateOnOrBefore { property, date } => {
                record.date(property).is_some_and(|d| d <= *date)
            }
        }
    }
}

/// Operations the pantry performs against the remote store.
///
/// `query` only ever returns active records. `update` merges the given
/// properties into the record and leaves the others untouched.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// List active records, optionally filtered
    async fn query(&self, collection: Collection, filter: Option<&Filter>) -> Result<Vec<Record>>;

    /// Fetch a record by id, archived or not
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Record>>;

    /// Create a record and return it with its new id
    async fn create(&self, collection: Collection, properties: Properties) -> Result<Record>;

    /// Merge properties into an existing record
    async fn update(&self, collection: Collection, id: &str, properties: Properties)
        -> Result<Record>;

    /// Soft-delete a record
    async fn archive(&self, collection: Collection, id: &str) -> Result<()>;
}

/// In-process store with the same semantics as the remote one
#[derive(Debug)]
pub struct MemoryStore {
    records: Mutex<HashMap<Collection, Vec<Record>>>,
    next_id: AtomicU64,
    /// Writes allowed before every further write fails; `usize::MAX` means unlimited
    write_budget: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            write_budget: AtomicUsize::new(usize::MAX),
        }
    }

    /// Let `writes` more create/update/archive calls succeed, then fail the rest
    pub fn fail_after_writes(&self, writes: usize) {
        self.write_budget.store(writes, Ordering::SeqCst);
    }

    /// Seed a record directly and return its id
    pub async fn insert(&self, collection: Collection, properties: Properties) -> String {
        let id = self.allocate_id(collection);
        let mut records = self.records.lock().await;
        records.entry(collection).or_default().push(Record {
            id: id.clone(),
            properties,
            lifecycle: Lifecycle::Active,
        });
        id
    }

    /// All records of a collection including archived ones
    pub async fn snapshot(&self, collection: Collection) -> Vec<Record> {
        let records = self.records.lock().await;
        records.get(&collection).cloned().unwrap_or_default()
    }

    fn allocate_id(&self, collection: Collection) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        format!("{}-{n}", format!("{collection:?}").to_lowercase())
    }

    fn spend_write(&self) -> Result<()> {
        let remaining = self.write_budget.load(Ordering::SeqCst);
        if remaining == usize::MAX {
            return Ok(());
        }
        if remaining == 0 {
            anyhow::bail!("store rejected the write");
        }
        self.write_budget.store(remaining - 1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn query(&self, collection: Collection, filter: Option<&Filter>) -> Result<Vec<Record>> {
        let records = self.records.lock().await;
        let found: Vec<Record> = records
            .get(&collection)
            .map(|all| {
                all.iter()
                    .filter(|r| !r.is_archived())
                    .filter(|r| filter.map_or(true, |f| f.matches(r)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        debug!(%collection, count = found.len(), "memory query");
        Ok(found)
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Record>> {
        let records = self.records.lock().await;
        Ok(records
            .get(&collection)
            .and_then(|all| all.iter().find(|r| r.id == id))
            .cloned())
    }

    async fn create(&self, collection: Collection, properties: Properties) -> Result<Record> {
        self.spend_write()
            .with_context(|| format!("Failed to create record in {collection}"))?;
        let record = Record {
            id: self.allocate_id(collection),
            properties,
            lifecycle: Lifecycle::Active,
        };
        let mut records = self.records.lock().await;
        records.entry(collection).or_default().push(record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        properties: Properties,
    ) -> Result<Record> {
        self.spend_write()
            .with_context(|| format!("Failed to update record {id} in {collection}"))?;
        let mut records = self.records.lock().await;
        let record = records
            .get_mut(&collection)
            .and_then(|all| all.iter_mut().find(|r| r.id == id))
            .with_context(|| format!("No record {id} in {collection}"))?;
        record.properties.extend(properties);
        Ok(record.clone())
    }

    async fn archive(&self, collection: Collection, id: &str) -> Result<()> {
        self.spend_write()
            .with_context(|| format!("Failed to archive record {id} in {collection}"))?;
        let mut records = self.records.lock().await;
        let record = records
            .get_mut(&collection)
            .and_then(|all| all.iter_mut().find(|r| r.id == id))
            .with_context(|| format!("No record {id} in {collection}"))?;
        record.lifecycle = Lifecycle::Archived;
        Ok(())
    }
}
