//! # Cooking Reconciliation Tests
//!
//! End-to-end cooking updates against the in-memory store.

use anyhow::Result;
use std::sync::Arc;

use pantry::cooking::{update_after_cooking, CookingRequest};
use pantry::errors::PantryError;
use pantry::models::{fields, NewStockItem, Priority, UsageItem, WantListItem};
use pantry::repository::{IngredientSource, PantryRepository};
use pantry::store::{Collection, MemoryStore, Properties, PropertyValue};

fn setup() -> (Arc<MemoryStore>, PantryRepository) {
    let store = Arc::new(MemoryStore::new());
    let repo = PantryRepository::new(store.clone()).without_relations();
    (store, repo)
}

fn usage(name: &str, quantity: f64, unit: &str) -> UsageItem {
    UsageItem {
        name: name.to_string(),
        quantity,
        unit: unit.to_string(),
    }
}

async fn want_items(store: &MemoryStore) -> Vec<WantListItem> {
    store
        .snapshot(Collection::WantList)
        .await
        .iter()
        .map(WantListItem::from_record)
        .collect()
}

async fn seed_recipe(store: &MemoryStore, name: &str, tried: bool) -> String {
    let mut props = Properties::new();
    props.insert(fields::NAME.into(), PropertyValue::Title(name.to_string()));
    props.insert(fields::TRIED.into(), PropertyValue::Checkbox(tried));
    store.insert(Collection::Recipe, props).await
}

#[tokio::test]
async fn test_eggs_drop_below_minimum_and_get_reordered() -> Result<()> {
    let (store, repo) = setup();
    repo.create_stock(&NewStockItem::new("Eggs", 12.0, "count").staple(6.0))
        .await?;

    let request = CookingRequest::for_ingredients(vec![usage("Eggs", 7.0, "count")]);
    let report = update_after_cooking(&repo, &request).await?;

    assert_eq!(report.changes.len(), 1);
    assert_eq!(report.changes[0].before, 12.0);
    assert_eq!(report.changes[0].after, 5.0);
    assert_eq!(report.auto_added, vec!["Eggs".to_string()]);

    let eggs = repo.find_stock_by_name("eggs").await?.unwrap();
    assert_eq!(eggs.quantity, 5.0);

    let wants = want_items(&store).await;
    assert_eq!(wants.len(), 1);
    assert_eq!(wants[0].name, "Eggs");
    assert_eq!(wants[0].quantity, 6.0);
    assert_eq!(wants[0].priority, Priority::Medium);
    assert!(wants[0].is_auto_added);
    assert!(!wants[0].is_purchased);
    Ok(())
}

#[tokio::test]
async fn test_second_use_below_minimum_does_not_reorder_again() -> Result<()> {
    let (store, repo) = setup();
    repo.create_stock(&NewStockItem::new("Butter", 6.0, "tbsp").staple(5.0))
        .await?;

    let first = update_after_cooking(
        &repo,
        &CookingRequest::for_ingredients(vec![usage("Butter", 2.0, "tbsp")]),
    )
    .await?;
    assert_eq!(first.auto_added.len(), 1);

    let second = update_after_cooking(
        &repo,
        &CookingRequest::for_ingredients(vec![usage("Butter", 1.0, "tbsp")]),
    )
    .await?;
    assert!(second.auto_added.is_empty());
    assert_eq!(second.changes[0].after, 3.0);

    assert_eq!(want_items(&store).await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_restocked_staple_crossing_again_is_reordered_again() -> Result<()> {
    // Nothing de-duplicates against the want list across separate calls
    let (store, repo) = setup();
    let item = repo
        .create_stock(&NewStockItem::new("Milk", 2.0, "cup").staple(1.0))
        .await?;
    let use_milk = CookingRequest::for_ingredients(vec![usage("milk", 1.5, "cup")]);

    update_after_cooking(&repo, &use_milk).await?;
    repo.set_stock_quantity(&item.id, 2.0).await?;
    update_after_cooking(&repo, &use_milk).await?;

    assert_eq!(want_items(&store).await.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_overuse_clamps_at_zero() -> Result<()> {
    let (_store, repo) = setup();
    repo.create_stock(&NewStockItem::new("Flour", 1.0, "cup"))
        .await?;

    let report = update_after_cooking(
        &repo,
        &CookingRequest::for_ingredients(vec![usage("Flour", 3.0, "cup")]),
    )
    .await?;

    assert_eq!(report.changes[0].after, 0.0);
    assert_eq!(repo.find_stock_by_name("Flour").await?.unwrap().quantity, 0.0);
    assert!(report.auto_added.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_repeated_ingredient_sees_earlier_decrement() -> Result<()> {
    let (store, repo) = setup();
    repo.create_stock(&NewStockItem::new("Eggs", 12.0, "count").staple(6.0))
        .await?;

    let report = update_after_cooking(
        &repo,
        &CookingRequest::for_ingredients(vec![
            usage("Eggs", 4.0, "count"),
            usage("EGGS", 4.0, "count"),
        ]),
    )
    .await?;

    assert_eq!(report.changes[0].after, 8.0);
    assert_eq!(report.changes[1].before, 8.0);
    assert_eq!(report.changes[1].after, 4.0);
    assert_eq!(report.auto_added.len(), 1);
    assert_eq!(want_items(&store).await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_unknown_ingredients_are_reported_not_fatal() -> Result<()> {
    let (_store, repo) = setup();
    repo.create_stock(&NewStockItem::new("Tomato", 4.0, "count"))
        .await?;

    let report = update_after_cooking(
        &repo,
        &CookingRequest::for_ingredients(vec![
            usage("Tomatoes", 2.0, "count"),
            usage("Tomato", 1.0, "count"),
        ]),
    )
    .await?;

    assert_eq!(report.not_found, vec!["Tomatoes".to_string()]);
    assert_eq!(report.changes.len(), 1);
    assert_eq!(report.changes[0].after, 3.0);
    Ok(())
}

#[tokio::test]
async fn test_recipe_run_skips_optional_and_marks_tried_once() -> Result<()> {
    let (store, repo) = setup();
    let recipe_id = seed_recipe(&store, "Mystery Dish", false).await;
    for name in ["Olive Oil", "Onion", "Garlic", "Salt", "Black Pepper"] {
        repo.create_stock(&NewStockItem::new(name, 100.0, "count"))
            .await?;
    }

    let request = CookingRequest::for_recipe(&recipe_id);
    let report = update_after_cooking(&repo, &request).await?;

    assert_eq!(report.recipe.as_deref(), Some("Mystery Dish"));
    assert_eq!(report.ingredient_source, Some(IngredientSource::Generated));
    assert!(report.recipe_marked_tried);
    assert!(report.skipped_optional.contains(&"Salt".to_string()));
    assert_eq!(repo.find_stock_by_name("Salt").await?.unwrap().quantity, 100.0);
    assert!(repo.find_stock_by_name("Onion").await?.unwrap().quantity < 100.0);
    assert!(repo.get_recipe(&recipe_id).await?.unwrap().tried);

    let again = update_after_cooking(&repo, &request).await?;
    assert!(!again.recipe_marked_tried);
    Ok(())
}

#[tokio::test]
async fn test_explicit_ingredients_win_over_recipe_lookup() -> Result<()> {
    let (store, repo) = setup();
    let recipe_id = seed_recipe(&store, "Spaghetti", false).await;
    repo.create_stock(&NewStockItem::new("Pasta", 16.0, "oz"))
        .await?;

    let request = CookingRequest {
        recipe_id: Some(recipe_id.clone()),
        ingredients: Some(vec![usage("Pasta", 4.0, "oz")]),
    };
    let report = update_after_cooking(&repo, &request).await?;

    assert_eq!(report.ingredient_source, None);
    assert_eq!(report.changes.len(), 1);
    assert_eq!(report.changes[0].after, 12.0);
    assert!(report.recipe_marked_tried);
    Ok(())
}

#[tokio::test]
async fn test_missing_input_and_unknown_recipe() -> Result<()> {
    let (_store, repo) = setup();

    let failure = update_after_cooking(&repo, &CookingRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(failure.error, PantryError::MissingInput(_)));
    assert!(!failure.wrote_anything());

    let empty_list = CookingRequest::for_ingredients(vec![]);
    let failure = update_after_cooking(&repo, &empty_list).await.unwrap_err();
    assert!(matches!(failure.error, PantryError::MissingInput(_)));

    let failure = update_after_cooking(&repo, &CookingRequest::for_recipe("recipe-404"))
        .await
        .unwrap_err();
    assert_eq!(failure.error, PantryError::not_found("recipe", "recipe-404"));
    Ok(())
}

#[tokio::test]
async fn test_store_failure_reports_writes_already_applied() -> Result<()> {
    let (store, repo) = setup();
    repo.create_stock(&NewStockItem::new("Rice", 4.0, "cup"))
        .await?;
    repo.create_stock(&NewStockItem::new("Beans", 2.0, "can"))
        .await?;
    store.fail_after_writes(1);

    let failure = update_after_cooking(
        &repo,
        &CookingRequest::for_ingredients(vec![usage("Rice", 1.0, "cup"), usage("Beans", 1.0, "can")]),
    )
    .await
    .unwrap_err();

    assert!(failure.error.is_upstream());
    assert!(failure.wrote_anything());
    assert_eq!(failure.applied.changes.len(), 1);
    assert_eq!(failure.applied.changes[0].name, "Rice");
    assert!(failure.to_string().contains("1 stock updates already applied"));

    // Reads still work; only the first write landed
    assert_eq!(repo.find_stock_by_name("Rice").await?.unwrap().quantity, 3.0);
    assert_eq!(repo.find_stock_by_name("Beans").await?.unwrap().quantity, 2.0);
    Ok(())
}
