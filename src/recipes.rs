//! # Recipe Queries

use serde::Serialize;

use crate::errors::PantryError;
use crate::models::{Recipe, RecipeIngredient};
use crate::repository::{IngredientSource, PantryRepository};

/// Recipes sorted by name, optionally only untried ones or one tag
pub async fn list_recipes(
    repo: &PantryRepository,
    untried_only: bool,
    tag: Option<&str>,
) -> Result<Vec<Recipe>, PantryError> {
    let mut recipes = repo.list_recipes().await?;
    recipes.retain(|recipe| {
        (!untried_only || !recipe.tried) && tag.map_or(true, |tag| recipe.has_tag(tag))
    });
    recipes.sort_by_key(|recipe| recipe.name.to_lowercase());
    Ok(recipes)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeIngredients {
    pub recipe: String,
    pub source: IngredientSource,
    pub ingredients: Vec<RecipeIngredient>,
}

pub async fn recipe_ingredients(
    repo: &PantryRepository,
    recipe_id: &str,
) -> Result<RecipeIngredients, PantryError> {
    let recipe = repo
        .get_recipe(recipe_id)
        .await?
        .ok_or_else(|| PantryError::not_found("recipe", recipe_id))?;
    let (ingredients, source) = repo.recipe_ingredients(&recipe).await?;
    Ok(RecipeIngredients {
        recipe: recipe.name,
        source,
        ingredients,
    })
}
