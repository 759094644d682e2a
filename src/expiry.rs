//! # Expiry Sweep
//!
//! Finds stock items whose expiry date is on or before a cutoff and either
//! reports them or archives them. Archived staples can be put back on the
//! want list at High priority.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::PantryError;
use crate::models::{NewWantItem, Priority, StockItem};
use crate::repository::PantryRepository;

/// Sweep options
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExpirySweep {
    /// Defaults to today
    #[serde(default)]
    pub cutoff: Option<NaiveDate>,
    /// Report only, change nothing
    #[serde(default)]
    pub dry_run: bool,
    /// Re-order archived staples
    #[serde(default = "default_true")]
    pub add_replacements: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpiredItem {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub expiry_date: Option<NaiveDate>,
    pub is_staple: bool,
}

impl From<&StockItem> for ExpiredItem {
    fn from(item: &StockItem) -> Self {
        Self {
            name: item.name.clone(),
            quantity: item.quantity,
            unit: item.unit.clone(),
            expiry_date: item.expiry_date,
            is_staple: item.is_staple,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpiryReport {
    pub cutoff: NaiveDate,
    pub dry_run: bool,
    pub expired: Vec<ExpiredItem>,
    /// Names archived from stock
    pub removed: Vec<String>,
    /// Names re-ordered on the want list
    pub replacements: Vec<String>,
}

/// Quantity to re-order for an expired staple: its minimum, else what was
/// thrown away, else one
pub fn replacement_quantity(item: &StockItem) -> f64 {
    match item.min_quantity {
        Some(min) if min > 0.0 => min,
        _ if item.quantity > 0.0 => item.quantity,
        _ => 1.0,
    }
}

/// Run an expiry sweep as of `today`
pub async fn sweep_expired(
    repo: &PantryRepository,
    sweep: &ExpirySweep,
    today: NaiveDate,
) -> Result<ExpiryReport, PantryError> {
    let cutoff = sweep.cutoff.unwrap_or(today);
    let mut expired = repo.stock_expiring_by(cutoff).await?;
    expired.sort_by(|a, b| a.expiry_date.cmp(&b.expiry_date).then(a.name.cmp(&b.name)));

    info!(%cutoff, count = expired.len(), dry_run = sweep.dry_run, "Expiry sweep");

    let mut report = ExpiryReport {
        cutoff,
        dry_run: sweep.dry_run,
        expired: expired.iter().map(ExpiredItem::from).collect(),
        removed: Vec::new(),
        replacements: Vec::new(),
    };

    if sweep.dry_run {
        return Ok(report);
    }

    for item in &expired {
        repo.archive_stock(&item.id).await?;
        report.removed.push(item.name.clone());

        if sweep.add_replacements && item.is_staple {
            let expired_on = item
                .expiry_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| cutoff.to_string());
            let mut want = NewWantItem::replenish(
                item,
                Priority::High,
                format!("Replaces stock that expired on {expired_on}"),
            );
            want.quantity = replacement_quantity(item);
            repo.create_want_item(&want).await?;
            report.replacements.push(item.name.clone());
        }
    }

    Ok(report)
}
