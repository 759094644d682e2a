//! # Purchase Transfer
//!
//! Moves purchased want-list items into stock. A purchase whose name matches
//! an active stock item (case-insensitive) adds to its quantity; otherwise a
//! new, non-staple stock item is created. The want-list item is archived.

use serde::Serialize;
use tracing::info;

use crate::errors::PantryError;
use crate::models::NewStockItem;
use crate::repository::PantryRepository;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferEntry {
    pub name: String,
    pub added: f64,
    pub unit: String,
    pub new_quantity: f64,
    /// A new stock item was created rather than incremented
    pub created: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransferReport {
    pub transferred: Vec<TransferEntry>,
}

impl TransferReport {
    pub fn is_empty(&self) -> bool {
        self.transferred.is_empty()
    }
}

pub async fn transfer_purchased(repo: &PantryRepository) -> Result<TransferReport, PantryError> {
    let purchased = repo.purchased_want_items().await?;
    let mut report = TransferReport::default();
    if purchased.is_empty() {
        return Ok(report);
    }

    // Working copy so two purchases of the same thing merge into one item
    let mut stock = repo.list_stock().await?;

    for want in &purchased {
        let entry = match stock.iter_mut().find(|s| s.matches_name(&want.name)) {
            Some(existing) => {
                let new_quantity = existing.quantity + want.quantity;
                repo.set_stock_quantity(&existing.id, new_quantity).await?;
                existing.quantity = new_quantity;
                TransferEntry {
                    name: existing.name.clone(),
                    added: want.quantity,
                    unit: existing.unit.clone(),
                    new_quantity,
                    created: false,
                }
            }
            None => {
                let created = repo
                    .create_stock(
                        &NewStockItem::new(&want.name, want.quantity, &want.unit)
                            .with_category(&want.category),
                    )
                    .await?;
                let entry = TransferEntry {
                    name: created.name.clone(),
                    added: want.quantity,
                    unit: created.unit.clone(),
                    new_quantity: created.quantity,
                    created: true,
                };
                stock.push(created);
                entry
            }
        };

        repo.archive_want_item(&want.id).await?;
        info!(item = %entry.name, added = entry.added, created = entry.created, "Purchase moved to stock");
        report.transferred.push(entry);
    }

    Ok(report)
}
