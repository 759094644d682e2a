//! # Pantry Repository
//!
//! Typed access to the pantry collections over any [`DocumentStore`].
//! Every method maps records to the structs in [`crate::models`]; name lookups
//! are done here, client-side and case-insensitively, because the remote
//! store only offers exact, case-sensitive title filters.

use anyhow::{Context, Result};
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, info};

use crate::models::{
    fields, NewStockItem, NewWantItem, Recipe, RecipeIngredient, StockItem, StockUpdate,
    WantListItem,
};
use crate::recipe_synth::generate_ingredients;
use crate::store::{Collection, DocumentStore, Filter, Properties, PropertyValue};

/// Where a recipe's ingredient list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngredientSource {
    /// Rows in the recipe-ingredient relation
    Relation,
    /// Placeholder generator
    Generated,
}

#[derive(Clone)]
pub struct PantryRepository {
    store: Arc<dyn DocumentStore>,
    /// Whether the ingredient and relation collections exist remotely
    has_relations: bool,
}

impl PantryRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            has_relations: true,
        }
    }

    /// Skip the relation lookup and always synthesize recipe ingredients
    pub fn without_relations(mut self) -> Self {
        self.has_relations = false;
        self
    }

    // ---- Stock ----

    pub async fn list_stock(&self) -> Result<Vec<StockItem>> {
        let records = self
            .store
            .query(Collection::Stock, None)
            .await
            .context("Failed to list stock items")?;
        Ok(records.iter().map(StockItem::from_record).collect())
    }

    pub async fn find_stock_by_name(&self, name: &str) -> Result<Option<StockItem>> {
        let items = self.list_stock().await?;
        Ok(items.into_iter().find(|item| item.matches_name(name)))
    }

    pub async fn create_stock(&self, item: &NewStockItem) -> Result<StockItem> {
        info!(item = %item.name, quantity = item.quantity, unit = %item.unit, "Creating stock item");
        let record = self
            .store
            .create(Collection::Stock, item.to_properties())
            .await
            .with_context(|| format!("Failed to create stock item '{}'", item.name))?;
        Ok(StockItem::from_record(&record))
    }

    pub async fn update_stock(&self, id: &str, update: &StockUpdate) -> Result<StockItem> {
        debug!(id, ?update, "Updating stock item");
        let record = self
            .store
            .update(Collection::Stock, id, update.to_properties())
            .await
            .with_context(|| format!("Failed to update stock item {id}"))?;
        Ok(StockItem::from_record(&record))
    }

    pub async fn set_stock_quantity(&self, id: &str, quantity: f64) -> Result<StockItem> {
        self.update_stock(id, &StockUpdate::quantity(quantity)).await
    }

    pub async fn archive_stock(&self, id: &str) -> Result<()> {
        info!(id, "Archiving stock item");
        self.store
            .archive(Collection::Stock, id)
            .await
            .with_context(|| format!("Failed to archive stock item {id}"))
    }

    /// Active stock whose expiry date is on or before `cutoff`
    pub async fn stock_expiring_by(&self, cutoff: chrono::NaiveDate) -> Result<Vec<StockItem>> {
        let filter = Filter::date_on_or_before(fields::EXPIRY_DATE, cutoff);
        let records = self
            .store
            .query(Collection::Stock, Some(&filter))
            .await
            .context("Failed to query expiring stock")?;
        Ok(records.iter().map(StockItem::from_record).collect())
    }

    // ---- Want list ----

    pub async fn list_want_items(&self) -> Result<Vec<WantListItem>> {
        let records = self
            .store
            .query(Collection::WantList, None)
            .await
            .context("Failed to list want-list items")?;
        Ok(records.iter().map(WantListItem::from_record).collect())
    }

    pub async fn purchased_want_items(&self) -> Result<Vec<WantListItem>> {
        let filter = Filter::checkbox(fields::PURCHASED, true);
        let records = self
            .store
            .query(Collection::WantList, Some(&filter))
            .await
            .context("Failed to query purchased want-list items")?;
        Ok(records.iter().map(WantListItem::from_record).collect())
    }

    pub async fn create_want_item(&self, item: &NewWantItem) -> Result<WantListItem> {
        info!(
            item = %item.name,
            quantity = item.quantity,
            priority = %item.priority,
            auto = item.is_auto_added,
            "Adding want-list item"
        );
        let record = self
            .store
            .create(Collection::WantList, item.to_properties())
            .await
            .with_context(|| format!("Failed to add '{}' to the want list", item.name))?;
        Ok(WantListItem::from_record(&record))
    }

    pub async fn mark_want_item_purchased(&self, id: &str) -> Result<WantListItem> {
        let mut props = Properties::new();
        props.insert(fields::PURCHASED.into(), PropertyValue::Checkbox(true));
        let record = self
            .store
            .update(Collection::WantList, id, props)
            .await
            .with_context(|| format!("Failed to mark want-list item {id} purchased"))?;
        Ok(WantListItem::from_record(&record))
    }

    pub async fn archive_want_item(&self, id: &str) -> Result<()> {
        self.store
            .archive(Collection::WantList, id)
            .await
            .with_context(|| format!("Failed to archive want-list item {id}"))
    }

    // ---- Recipes ----

    pub async fn list_recipes(&self) -> Result<Vec<Recipe>> {
        let records = self
            .store
            .query(Collection::Recipe, None)
            .await
            .context("Failed to list recipes")?;
        Ok(records.iter().map(Recipe::from_record).collect())
    }

    /// Active recipe by id; archived recipes read as missing
    pub async fn get_recipe(&self, id: &str) -> Result<Option<Recipe>> {
        let record = self
            .store
            .get(Collection::Recipe, id)
            .await
            .with_context(|| format!("Failed to fetch recipe {id}"))?;
        Ok(record
            .filter(|r| !r.is_archived())
            .map(|r| Recipe::from_record(&r)))
    }

    pub async fn mark_recipe_tried(&self, id: &str) -> Result<()> {
        let mut props = Properties::new();
        props.insert(fields::TRIED.into(), PropertyValue::Checkbox(true));
        self.store
            .update(Collection::Recipe, id, props)
            .await
            .with_context(|| format!("Failed to mark recipe {id} as tried"))?;
        Ok(())
    }

    /// Ingredient list for a recipe: relation rows when present, generated otherwise
    pub async fn recipe_ingredients(
        &self,
        recipe: &Recipe,
    ) -> Result<(Vec<RecipeIngredient>, IngredientSource)> {
        if self.has_relations {
            let related = self.related_ingredients(&recipe.id).await?;
            if !related.is_empty() {
                return Ok((related, IngredientSource::Relation));
            }
        }

        Ok((
            generate_ingredients(&recipe.name, &recipe.tags),
            IngredientSource::Generated,
        ))
    }

    async fn related_ingredients(&self, recipe_id: &str) -> Result<Vec<RecipeIngredient>> {
        let filter = Filter::relation_contains(fields::RECIPE, recipe_id);
        let rows = self
            .store
            .query(Collection::RecipeIngredient, Some(&filter))
            .await
            .with_context(|| format!("Failed to query ingredients of recipe {recipe_id}"))?;

        // Each row points at one ingredient record; fetch them together
        let lookups = rows.iter().map(|row| async move {
            let name = match row.relation(fields::INGREDIENT).first() {
                Some(ingredient_id) => self
                    .store
                    .get(Collection::Ingredient, ingredient_id)
                    .await
                    .with_context(|| format!("Failed to fetch ingredient {ingredient_id}"))?
                    .map(|record| record.text(fields::NAME))
                    .unwrap_or_default(),
                None => String::new(),
            };
            let name = if name.is_empty() {
                row.text(fields::NAME)
            } else {
                name
            };
            anyhow::Ok(RecipeIngredient {
                name,
                quantity: row.number(fields::QUANTITY),
                unit: row.text(fields::UNIT),
                optional: row.checkbox(fields::OPTIONAL),
            })
        });

        let ingredients = try_join_all(lookups).await?;
        Ok(ingredients
            .into_iter()
            .filter(|ingredient| !ingredient.name.trim().is_empty())
            .collect())
    }
}
