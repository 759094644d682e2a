//! # Cooking Reconciliation
//!
//! Subtracts the ingredients used by a meal from the pantry and puts staples
//! that just ran low back on the want list.
//!
//! ## Rules
//!
//! - Ingredients match stock items by case-insensitive name; no unit conversion
//! - Stock never goes below zero: `after = max(0, before - used)`
//! - A staple is re-ordered only when this usage moves it from above its
//!   minimum to at-or-below it. Re-ordered quantity is the minimum itself.
//! - Optional ingredients are skipped, unknown ones are reported and skipped
//! - A recipe that drove the update is marked as tried
//!
//! The store has no transactions. Writes happen one at a time and the first
//! failure stops the run; [`ReconcileFailure`] carries what was already written.

use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

use crate::errors::PantryError;
use crate::models::{NewWantItem, Priority, RecipeIngredient, StockItem, UsageItem};
use crate::repository::{IngredientSource, PantryRepository};
use crate::units::format_quantity;

/// What was cooked: a recipe, an explicit ingredient list, or both
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
pub struct CookingRequest {
    #[serde(default)]
    pub recipe_id: Option<String>,
    #[serde(default)]
    pub ingredients: Option<Vec<UsageItem>>,
}

impl CookingRequest {
    pub fn for_recipe(recipe_id: &str) -> Self {
        Self {
            recipe_id: Some(recipe_id.to_string()),
            ingredients: None,
        }
    }

    pub fn for_ingredients(ingredients: Vec<UsageItem>) -> Self {
        Self {
            recipe_id: None,
            ingredients: Some(ingredients),
        }
    }
}

/// Before/after quantities of one stock item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuantityChange {
    pub name: String,
    pub unit: String,
    pub used: f64,
    pub before: f64,
    pub after: f64,
}

/// Everything a cooking update changed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CookingReport {
    pub recipe: Option<String>,
    pub ingredient_source: Option<IngredientSource>,
    pub changes: Vec<QuantityChange>,
    /// Names put on the want list by this run
    pub auto_added: Vec<String>,
    pub not_found: Vec<String>,
    pub skipped_optional: Vec<String>,
    pub recipe_marked_tried: bool,
}

/// A cooking update that stopped part-way
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileFailure {
    /// Writes that completed before the failure
    pub applied: CookingReport,
    pub error: PantryError,
}

impl ReconcileFailure {
    fn before_any_write(error: PantryError) -> Self {
        Self {
            applied: CookingReport::default(),
            error,
        }
    }

    /// Whether any stock or want-list write landed before the failure
    pub fn wrote_anything(&self) -> bool {
        !self.applied.changes.is_empty() || !self.applied.auto_added.is_empty()
    }
}

impl fmt::Display for ReconcileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} stock updates already applied)",
            self.error,
            self.applied.changes.len()
        )
    }
}

impl std::error::Error for ReconcileFailure {}

/// Remaining quantity after using `needed`, floored at zero
pub fn consume(current: f64, needed: f64) -> f64 {
    (current - needed.max(0.0)).max(0.0)
}

/// Whether going from `before` to `after` takes a staple across its minimum
pub fn crosses_minimum(item: &StockItem, before: f64, after: f64) -> bool {
    item.is_staple && item.min_quantity.is_some_and(|min| before > min && after <= min)
}

/// Apply a cooking request to the pantry
pub async fn update_after_cooking(
    repo: &PantryRepository,
    request: &CookingRequest,
) -> Result<CookingReport, ReconcileFailure> {
    let direct = request
        .ingredients
        .as_ref()
        .filter(|list| !list.is_empty());

    let recipe = match &request.recipe_id {
        Some(id) => Some(
            repo.get_recipe(id)
                .await
                .map_err(|e| ReconcileFailure::before_any_write(e.into()))?
                .ok_or_else(|| {
                    ReconcileFailure::before_any_write(PantryError::not_found("recipe", id))
                })?,
        ),
        None => None,
    };

    let mut report = CookingReport {
        recipe: recipe.as_ref().map(|r| r.name.clone()),
        ..Default::default()
    };

    let ingredients: Vec<RecipeIngredient> = match (direct, &recipe) {
        (Some(list), _) => list.iter().cloned().map(RecipeIngredient::from).collect(),
        (None, Some(recipe)) => {
            let (list, source) = repo
                .recipe_ingredients(recipe)
                .await
                .map_err(|e| ReconcileFailure::before_any_write(e.into()))?;
            report.ingredient_source = Some(source);
            list
        }
        (None, None) => {
            return Err(ReconcileFailure::before_any_write(PantryError::MissingInput(
                "provide a recipe_id or a list of ingredients".to_string(),
            )))
        }
    };

    let mut stock = repo
        .list_stock()
        .await
        .map_err(|e| ReconcileFailure::before_any_write(e.into()))?;

    info!(
        recipe = ?report.recipe,
        ingredients = ingredients.len(),
        stock_items = stock.len(),
        "Reconciling pantry after cooking"
    );

    for ingredient in &ingredients {
        if ingredient.optional {
            report.skipped_optional.push(ingredient.name.clone());
            continue;
        }

        let Some(item) = stock.iter_mut().find(|s| s.matches_name(&ingredient.name)) else {
            warn!(ingredient = %ingredient.name, "No stock item matches ingredient");
            report.not_found.push(ingredient.name.clone());
            continue;
        };

        let before = item.quantity;
        let after = consume(before, ingredient.quantity);

        if let Err(e) = repo.set_stock_quantity(&item.id, after).await {
            return Err(ReconcileFailure {
                applied: report,
                error: e.into(),
            });
        }
        item.quantity = after;

        info!(item = %item.name, before, after, "Stock decremented");
        report.changes.push(QuantityChange {
            name: item.name.clone(),
            unit: item.unit.clone(),
            used: ingredient.quantity,
            before,
            after,
        });

        if crosses_minimum(item, before, after) {
            let note = format!(
                "Auto-added after cooking: down to {} {} (minimum {})",
                format_quantity(after),
                item.unit,
                format_quantity(item.min_quantity.unwrap_or_default())
            );
            let want = NewWantItem::replenish(item, Priority::Medium, note);
            if let Err(e) = repo.create_want_item(&want).await {
                return Err(ReconcileFailure {
                    applied: report,
                    error: e.into(),
                });
            }
            report.auto_added.push(item.name.clone());
        }
    }

    if let Some(recipe) = recipe.filter(|r| !r.tried) {
        if let Err(e) = repo.mark_recipe_tried(&recipe.id).await {
            return Err(ReconcileFailure {
                applied: report,
                error: e.into(),
            });
        }
        report.recipe_marked_tried = true;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewStockItem;
    use crate::store::{Lifecycle, Record};

    fn staple(quantity: f64, min: f64) -> StockItem {
        let record = Record {
            id: "stock-1".to_string(),
            properties: NewStockItem::new("Eggs", quantity, "count")
                .staple(min)
                .to_properties(),
            lifecycle: Lifecycle::Active,
        };
        StockItem::from_record(&record)
    }

    #[test]
    fn test_consume_never_goes_negative() {
        let cases = [(12.0, 7.0, 5.0), (3.0, 5.0, 0.0), (0.0, 1.0, 0.0), (4.0, 0.0, 4.0)];
        for (current, needed, expected) in cases {
            assert_eq!(consume(current, needed), expected);
        }
        assert_eq!(consume(4.0, -2.0), 4.0);
    }

    #[test]
    fn test_crossing_is_edge_triggered() {
        let item = staple(6.0, 5.0);
        assert!(crosses_minimum(&item, 6.0, 4.0));
        assert!(crosses_minimum(&item, 6.0, 5.0));
        assert!(!crosses_minimum(&item, 4.0, 3.0));
        assert!(!crosses_minimum(&item, 8.0, 6.0));
    }

    #[test]
    fn test_non_staples_never_cross() {
        let mut item = staple(6.0, 5.0);
        item.is_staple = false;
        assert!(!crosses_minimum(&item, 6.0, 0.0));

        let mut no_min = staple(6.0, 5.0);
        no_min.min_quantity = None;
        assert!(!crosses_minimum(&no_min, 6.0, 0.0));
    }
}
