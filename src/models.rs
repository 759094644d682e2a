//! # Pantry Data Model
//!
//! Typed views over the records kept in the document store, and the
//! property names each collection uses.
//!
//! ## Core Concepts
//!
//! - **Stock item**: something on hand, with an optional staple minimum
//! - **Want-list item**: something to buy, entered by hand or added automatically
//! - **Recipe**: a named dish whose ingredients drive cooking updates
//! - **Usage item**: one ingredient quantity consumed by a cooking request
//!
//! ## Usage
//!
//! ```rust
//! use pantry::models::{NewStockItem, NewWantItem, Priority};
//!
//! let eggs = NewStockItem::new("Eggs", 12.0, "count").staple(6.0);
//! let milk = NewWantItem::new("Milk", 1.0, "gallon").with_priority(Priority::High);
//! assert_eq!(eggs.min_quantity, Some(6.0));
//! assert_eq!(milk.priority, Priority::High);
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::store::{Lifecycle, Properties, PropertyValue, Record};
use crate::units::format_quantity;

/// Property names shared by the collections
pub mod fields {
    pub const NAME: &str = "Name";
    pub const QUANTITY: &str = "Quantity";
    pub const UNIT: &str = "Unit";
    pub const CATEGORY: &str = "Category";
    pub const NOTES: &str = "Notes";
    // Stock
    pub const STAPLE: &str = "Staple";
    pub const MIN_QUANTITY: &str = "Min Quantity";
    pub const EXPIRY_DATE: &str = "Expiry Date";
    // Want list
    pub const PRIORITY: &str = "Priority";
    pub const PURCHASED: &str = "Purchased";
    pub const AUTO_ADDED: &str = "Auto Added";
    // Recipes
    pub const TAGS: &str = "Tags";
    pub const TRIED: &str = "Tried";
    pub const URL: &str = "URL";
    // Recipe ingredient relation rows
    pub const RECIPE: &str = "Recipe";
    pub const INGREDIENT: &str = "Ingredient";
    pub const OPTIONAL: &str = "Optional";
}

/// Case-insensitive, whitespace-trimmed name equality
pub fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Want-list priority, ordered Low < Medium < High
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }

    /// Parse a stored select value; anything unrecognized reads as Medium
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "low" => Priority::Low,
            "high" => Priority::High,
            _ => Priority::Medium,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A pantry inventory record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockItem {
    pub id: String,
    pub name: String,
    /// Never negative
    pub quantity: f64,
    pub unit: String,
    pub category: String,
    pub is_staple: bool,
    /// Only meaningful for staples
    pub min_quantity: Option<f64>,
    pub expiry_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub lifecycle: Lifecycle,
}

impl StockItem {
    pub fn from_record(record: &Record) -> Self {
        Self {
            id: record.id.clone(),
            name: record.text(fields::NAME),
            quantity: record.number(fields::QUANTITY).max(0.0),
            unit: record.text(fields::UNIT),
            category: record.text(fields::CATEGORY),
            is_staple: record.checkbox(fields::STAPLE),
            min_quantity: record.opt_number(fields::MIN_QUANTITY),
            expiry_date: record.date(fields::EXPIRY_DATE),
            notes: record.opt_text(fields::NOTES),
            lifecycle: record.lifecycle,
        }
    }

    /// Staple with a minimum that is at or below it
    pub fn is_low(&self) -> bool {
        self.is_staple && self.min_quantity.is_some_and(|min| self.quantity <= min)
    }

    pub fn matches_name(&self, name: &str) -> bool {
        same_name(&self.name, name)
    }
}

impl fmt::Display for StockItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} {}",
            self.name,
            format_quantity(self.quantity),
            self.unit
        )?;
        if let Some(min) = self.min_quantity.filter(|_| self.is_staple) {
            write!(f, " (staple, min {})", format_quantity(min))?;
        }
        if let Some(date) = self.expiry_date {
            write!(f, " [expires {date}]")?;
        }
        Ok(())
    }
}

/// Fields for a new stock record
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewStockItem {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub is_staple: bool,
    #[serde(default)]
    pub min_quantity: Option<f64>,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewStockItem {
    pub fn new(name: &str, quantity: f64, unit: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            quantity: quantity.max(0.0),
            unit: unit.trim().to_string(),
            category: String::new(),
            is_staple: false,
            min_quantity: None,
            expiry_date: None,
            notes: None,
        }
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }

    /// Strip surrounding whitespace from the text fields
    pub fn trimmed(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.unit = self.unit.trim().to_string();
        self.category = self.category.trim().to_string();
        self
    }

    /// Mark as a staple replenished once it drops to `min_quantity`
    pub fn staple(mut self, min_quantity: f64) -> Self {
        self.is_staple = true;
        self.min_quantity = Some(min_quantity);
        self
    }

    pub fn with_expiry(mut self, date: NaiveDate) -> Self {
        self.expiry_date = Some(date);
        self
    }

    pub fn to_properties(&self) -> Properties {
        let mut props = Properties::new();
        props.insert(fields::NAME.into(), PropertyValue::Title(self.name.clone()));
        props.insert(
            fields::QUANTITY.into(),
            PropertyValue::Number(Some(self.quantity.max(0.0))),
        );
        props.insert(fields::UNIT.into(), select(&self.unit));
        props.insert(fields::CATEGORY.into(), select(&self.category));
        props.insert(fields::STAPLE.into(), PropertyValue::Checkbox(self.is_staple));
        if let Some(min) = self.min_quantity {
            props.insert(fields::MIN_QUANTITY.into(), PropertyValue::Number(Some(min)));
        }
        if let Some(date) = self.expiry_date {
            props.insert(fields::EXPIRY_DATE.into(), PropertyValue::Date(Some(date)));
        }
        if let Some(notes) = &self.notes {
            props.insert(fields::NOTES.into(), PropertyValue::RichText(notes.clone()));
        }
        props
    }
}

/// Partial update of a stock record; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StockUpdate {
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub is_staple: Option<bool>,
    #[serde(default)]
    pub min_quantity: Option<f64>,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
}

impl StockUpdate {
    pub fn quantity(quantity: f64) -> Self {
        Self {
            quantity: Some(quantity),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn to_properties(&self) -> Properties {
        let mut props = Properties::new();
        if let Some(quantity) = self.quantity {
            props.insert(
                fields::QUANTITY.into(),
                PropertyValue::Number(Some(quantity.max(0.0))),
            );
        }
        if let Some(unit) = &self.unit {
            props.insert(fields::UNIT.into(), select(unit));
        }
        if let Some(category) = &self.category {
            props.insert(fields::CATEGORY.into(), select(category));
        }
        if let Some(is_staple) = self.is_staple {
            props.insert(fields::STAPLE.into(), PropertyValue::Checkbox(is_staple));
        }
        if let Some(min) = self.min_quantity {
            props.insert(fields::MIN_QUANTITY.into(), PropertyValue::Number(Some(min)));
        }
        if let Some(date) = self.expiry_date {
            props.insert(fields::EXPIRY_DATE.into(), PropertyValue::Date(Some(date)));
        }
        props
    }
}

/// A pending purchase
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WantListItem {
    pub id: String,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub category: String,
    pub priority: Priority,
    pub is_purchased: bool,
    pub is_auto_added: bool,
    pub notes: Option<String>,
    pub lifecycle: Lifecycle,
}

impl WantListItem {
    pub fn from_record(record: &Record) -> Self {
        Self {
            id: record.id.clone(),
            name: record.text(fields::NAME),
            quantity: record.number(fields::QUANTITY).max(0.0),
            unit: record.text(fields::UNIT),
            category: record.text(fields::CATEGORY),
            priority: Priority::parse(&record.text(fields::PRIORITY)),
            is_purchased: record.checkbox(fields::PURCHASED),
            is_auto_added: record.checkbox(fields::AUTO_ADDED),
            notes: record.opt_text(fields::NOTES),
            lifecycle: record.lifecycle,
        }
    }

    pub fn matches_name(&self, name: &str) -> bool {
        same_name(&self.name, name)
    }
}

impl fmt::Display for WantListItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let check = if self.is_purchased { "x" } else { " " };
        write!(
            f,
            "[{check}] {} {} {} ({})",
            format_quantity(self.quantity),
            self.unit,
            self.name,
            self.priority
        )?;
        if self.is_auto_added {
            write!(f, " auto")?;
        }
        Ok(())
    }
}

/// Fields for a new want-list record
#[derive(Debug, Clone, PartialEq)]
pub struct NewWantItem {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub category: String,
    pub priority: Priority,
    pub is_auto_added: bool,
    pub notes: Option<String>,
}

impl NewWantItem {
    pub fn new(name: &str, quantity: f64, unit: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            quantity,
            unit: unit.trim().to_string(),
            category: String::new(),
            priority: Priority::Medium,
            is_auto_added: false,
            notes: None,
        }
    }

    /// Replenish a staple back up to its minimum
    pub fn replenish(item: &StockItem, priority: Priority, note: String) -> Self {
        Self {
            name: item.name.clone(),
            quantity: item.min_quantity.unwrap_or(item.quantity),
            unit: item.unit.clone(),
            category: item.category.clone(),
            priority,
            is_auto_added: true,
            notes: Some(note),
        }
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.to_string());
        self
    }

    pub fn to_properties(&self) -> Properties {
        let mut props = Properties::new();
        props.insert(fields::NAME.into(), PropertyValue::Title(self.name.clone()));
        props.insert(
            fields::QUANTITY.into(),
            PropertyValue::Number(Some(self.quantity)),
        );
        props.insert(fields::UNIT.into(), select(&self.unit));
        props.insert(fields::CATEGORY.into(), select(&self.category));
        props.insert(
            fields::PRIORITY.into(),
            PropertyValue::Select(Some(self.priority.as_str().to_string())),
        );
        props.insert(fields::PURCHASED.into(), PropertyValue::Checkbox(false));
        props.insert(
            fields::AUTO_ADDED.into(),
            PropertyValue::Checkbox(self.is_auto_added),
        );
        if let Some(notes) = &self.notes {
            props.insert(fields::NOTES.into(), PropertyValue::RichText(notes.clone()));
        }
        props
    }
}

/// A recipe record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub tags: Vec<String>,
    pub tried: bool,
    pub url: Option<String>,
}

impl Recipe {
    pub fn from_record(record: &Record) -> Self {
        Self {
            id: record.id.clone(),
            name: record.text(fields::NAME),
            tags: record.multi_select(fields::TAGS),
            tried: record.checkbox(fields::TRIED),
            url: record.opt_text(fields::URL),
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| same_name(t, tag))
    }
}

/// One ingredient line of a recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    #[serde(default)]
    pub optional: bool,
}

impl RecipeIngredient {
    pub fn new(name: &str, quantity: f64, unit: &str) -> Self {
        Self {
            name: name.to_string(),
            quantity,
            unit: unit.to_string(),
            optional: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

impl fmt::Display for RecipeIngredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            format_quantity(self.quantity),
            self.unit,
            self.name
        )?;
        if self.optional {
            write!(f, " (optional)")?;
        }
        Ok(())
    }
}

/// One consumed quantity in a cooking request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageItem {
    pub name: String,
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
}

impl From<UsageItem> for RecipeIngredient {
    fn from(item: UsageItem) -> Self {
        RecipeIngredient {
            name: item.name,
            quantity: item.quantity,
            unit: item.unit,
            optional: false,
        }
    }
}

fn select(value: &str) -> PropertyValue {
    if value.trim().is_empty() {
        PropertyValue::Select(None)
    } else {
        PropertyValue::Select(Some(value.trim().to_string()))
    }
}
