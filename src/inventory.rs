//! # Stock Management
//!
//! Listing, adding and editing stock items, plus the low-stock report.

use serde::Serialize;
use tracing::info;

use crate::errors::PantryError;
use crate::models::{same_name, NewStockItem, NewWantItem, Priority, StockItem, StockUpdate};
use crate::repository::PantryRepository;
use crate::units::format_quantity;

/// Active stock sorted by name, optionally limited to one category
pub async fn list_stock(
    repo: &PantryRepository,
    category: Option<&str>,
) -> Result<Vec<StockItem>, PantryError> {
    let mut items = repo.list_stock().await?;
    if let Some(category) = category.filter(|c| !c.trim().is_empty()) {
        items.retain(|item| same_name(&item.category, category));
    }
    items.sort_by_key(|item| item.name.to_lowercase());
    Ok(items)
}

/// Outcome of [`add_stock_item`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockAddition {
    pub item: StockItem,
    /// An existing item of the same name was incremented
    pub merged: bool,
}

/// Add stock; an existing item with the same name has its quantity increased
pub async fn add_stock_item(
    repo: &PantryRepository,
    new_item: &NewStockItem,
) -> Result<StockAddition, PantryError> {
    let new_item = new_item.clone().trimmed();
    if new_item.name.is_empty() {
        return Err(PantryError::InvalidArguments("name must not be empty".to_string()));
    }
    if new_item.quantity < 0.0 {
        return Err(PantryError::InvalidArguments(
            "quantity must not be negative".to_string(),
        ));
    }

    if let Some(existing) = repo.find_stock_by_name(&new_item.name).await? {
        let total = existing.quantity + new_item.quantity;
        info!(item = %existing.name, added = new_item.quantity, total, "Merging into existing stock");
        let item = repo.set_stock_quantity(&existing.id, total).await?;
        return Ok(StockAddition { item, merged: true });
    }

    let item = repo.create_stock(&new_item).await?;
    Ok(StockAddition {
        item,
        merged: false,
    })
}

/// Apply a partial update to the stock item called `name`
pub async fn update_stock_item(
    repo: &PantryRepository,
    name: &str,
    update: &StockUpdate,
) -> Result<StockItem, PantryError> {
    if update.is_empty() {
        return Err(PantryError::MissingInput(
            "nothing to update; pass at least one field".to_string(),
        ));
    }
    if update.quantity.is_some_and(|q| q < 0.0) {
        return Err(PantryError::InvalidArguments(
            "quantity must not be negative".to_string(),
        ));
    }

    let existing = repo
        .find_stock_by_name(name)
        .await?
        .ok_or_else(|| PantryError::not_found("stock item", name))?;

    Ok(repo.update_stock(&existing.id, update).await?)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LowStockEntry {
    pub name: String,
    pub quantity: f64,
    pub min_quantity: f64,
    pub unit: String,
    /// Already waiting on the want list, unpurchased
    pub on_want_list: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LowStockReport {
    pub low: Vec<LowStockEntry>,
    /// Names added to the want list by this call
    pub added: Vec<String>,
}

/// Staples at or below their minimum; optionally queue the missing ones
pub async fn check_low_stock(
    repo: &PantryRepository,
    add_to_want_list: bool,
) -> Result<LowStockReport, PantryError> {
    let stock = repo.list_stock().await?;
    let pending: Vec<String> = repo
        .list_want_items()
        .await?
        .into_iter()
        .filter(|w| !w.is_purchased)
        .map(|w| w.name)
        .collect();

    let mut low: Vec<&StockItem> = stock.iter().filter(|item| item.is_low()).collect();
    low.sort_by_key(|item| item.name.to_lowercase());

    let mut report = LowStockReport::default();
    for item in low {
        let min = item.min_quantity.unwrap_or_default();
        let on_want_list = pending.iter().any(|name| same_name(name, &item.name));

        if add_to_want_list && !on_want_list {
            let note = format!(
                "Low stock: {} {} (minimum {})",
                format_quantity(item.quantity),
                item.unit,
                format_quantity(min)
            );
            repo.create_want_item(&NewWantItem::replenish(item, Priority::Medium, note))
                .await?;
            report.added.push(item.name.clone());
        }

        report.low.push(LowStockEntry {
            name: item.name.clone(),
            quantity: item.quantity,
            min_quantity: min,
            unit: item.unit.clone(),
            on_want_list,
        });
    }

    info!(low = report.low.len(), added = report.added.len(), "Low-stock check");
    Ok(report)
}
