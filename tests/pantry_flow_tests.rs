//! # Pantry Flow Tests
//!
//! Expiry sweeps, purchase transfer, stock management and the want list,
//! run against the in-memory store.

use anyhow::Result;
use chrono::NaiveDate;
use std::sync::Arc;

use pantry::errors::PantryError;
use pantry::expiry::{sweep_expired, ExpirySweep};
use pantry::inventory::{add_stock_item, check_low_stock, list_stock, update_stock_item};
use pantry::models::{NewStockItem, NewWantItem, Priority, StockUpdate, WantListItem};
use pantry::repository::PantryRepository;
use pantry::shopping::{add_want_item, list_want_items, mark_purchased};
use pantry::store::{Collection, MemoryStore};
use pantry::transfer::transfer_purchased;

fn setup() -> (Arc<MemoryStore>, PantryRepository) {
    let store = Arc::new(MemoryStore::new());
    let repo = PantryRepository::new(store.clone()).without_relations();
    (store, repo)
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn all_want_items(store: &MemoryStore) -> Vec<WantListItem> {
    store
        .snapshot(Collection::WantList)
        .await
        .iter()
        .map(WantListItem::from_record)
        .collect()
}

// ---- Expiry ----

async fn seed_expiring(repo: &PantryRepository) -> Result<()> {
    repo.create_stock(
        &NewStockItem::new("Milk", 0.5, "gallon")
            .staple(1.0)
            .with_expiry(day(2024, 3, 1)),
    )
    .await?;
    repo.create_stock(&NewStockItem::new("Yogurt", 2.0, "count").with_expiry(day(2024, 3, 5)))
        .await?;
    repo.create_stock(&NewStockItem::new("Cheese", 1.0, "lb").with_expiry(day(2024, 4, 1)))
        .await?;
    repo.create_stock(&NewStockItem::new("Rice", 5.0, "cup"))
        .await?;
    Ok(())
}

#[tokio::test]
async fn test_expiry_dry_run_changes_nothing() -> Result<()> {
    let (store, repo) = setup();
    seed_expiring(&repo).await?;

    let sweep = ExpirySweep {
        cutoff: None,
        dry_run: true,
        add_replacements: true,
    };
    let report = sweep_expired(&repo, &sweep, day(2024, 3, 5)).await?;

    let names: Vec<&str> = report.expired.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Milk", "Yogurt"]);
    assert!(report.removed.is_empty());
    assert_eq!(repo.list_stock().await?.len(), 4);
    assert!(all_want_items(&store).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_expiry_archives_and_reorders_staples_at_high_priority() -> Result<()> {
    let (store, repo) = setup();
    seed_expiring(&repo).await?;

    let sweep = ExpirySweep {
        cutoff: Some(day(2024, 3, 10)),
        dry_run: false,
        add_replacements: true,
    };
    let report = sweep_expired(&repo, &sweep, day(2024, 1, 1)).await?;

    assert_eq!(report.cutoff, day(2024, 3, 10));
    assert_eq!(report.removed, vec!["Milk".to_string(), "Yogurt".to_string()]);
    assert_eq!(report.replacements, vec!["Milk".to_string()]);

    let remaining: Vec<String> = repo.list_stock().await?.into_iter().map(|s| s.name).collect();
    assert_eq!(remaining, vec!["Cheese".to_string(), "Rice".to_string()]);

    let archived = store
        .snapshot(Collection::Stock)
        .await
        .into_iter()
        .filter(|r| r.is_archived())
        .count();
    assert_eq!(archived, 2);

    let wants = all_want_items(&store).await;
    assert_eq!(wants.len(), 1);
    assert_eq!(wants[0].name, "Milk");
    assert_eq!(wants[0].quantity, 1.0);
    assert_eq!(wants[0].priority, Priority::High);
    assert!(wants[0].is_auto_added);
    assert!(wants[0].notes.as_deref().unwrap_or_default().contains("2024-03-01"));
    Ok(())
}

#[tokio::test]
async fn test_expiry_without_replacements() -> Result<()> {
    let (store, repo) = setup();
    seed_expiring(&repo).await?;

    let sweep = ExpirySweep {
        cutoff: None,
        dry_run: false,
        add_replacements: false,
    };
    let report = sweep_expired(&repo, &sweep, day(2024, 3, 1)).await?;

    assert_eq!(report.removed, vec!["Milk".to_string()]);
    assert!(all_want_items(&store).await.is_empty());
    Ok(())
}

// ---- Purchase transfer ----

#[tokio::test]
async fn test_transfer_merges_and_creates() -> Result<()> {
    let (store, repo) = setup();
    repo.create_stock(&NewStockItem::new("Eggs", 2.0, "count").staple(6.0))
        .await?;

    let eggs = repo.create_want_item(&NewWantItem::new("eggs", 12.0, "count")).await?;
    let basil = repo
        .create_want_item(&NewWantItem::new("Basil", 1.0, "bunch").with_category("Produce"))
        .await?;
    repo.create_want_item(&NewWantItem::new("Coffee", 1.0, "lb")).await?;
    repo.mark_want_item_purchased(&eggs.id).await?;
    repo.mark_want_item_purchased(&basil.id).await?;

    let report = transfer_purchased(&repo).await?;
    assert_eq!(report.transferred.len(), 2);

    let eggs = repo.find_stock_by_name("Eggs").await?.unwrap();
    assert_eq!(eggs.quantity, 14.0);
    assert!(eggs.is_staple);

    let basil = repo.find_stock_by_name("basil").await?.unwrap();
    assert_eq!(basil.quantity, 1.0);
    assert_eq!(basil.unit, "bunch");
    assert_eq!(basil.category, "Produce");
    assert!(!basil.is_staple);

    let pending: Vec<String> = repo
        .list_want_items()
        .await?
        .into_iter()
        .map(|w| w.name)
        .collect();
    assert_eq!(pending, vec!["Coffee".to_string()]);
    assert_eq!(all_want_items(&store).await.len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_duplicate_purchases_merge_into_one_new_item() -> Result<()> {
    let (_store, repo) = setup();
    for quantity in [1.0, 2.0] {
        let item = repo.create_want_item(&NewWantItem::new("Lemons", quantity, "count")).await?;
        repo.mark_want_item_purchased(&item.id).await?;
    }

    let report = transfer_purchased(&repo).await?;

    assert!(report.transferred[0].created);
    assert!(!report.transferred[1].created);
    let stock = repo.list_stock().await?;
    assert_eq!(stock.len(), 1);
    assert_eq!(stock[0].quantity, 3.0);
    Ok(())
}

#[tokio::test]
async fn test_transfer_with_nothing_purchased_is_idempotent() -> Result<()> {
    let (store, repo) = setup();
    repo.create_stock(&NewStockItem::new("Rice", 5.0, "cup")).await?;
    repo.create_want_item(&NewWantItem::new("Beans", 2.0, "can")).await?;
    let stock_before = store.snapshot(Collection::Stock).await;
    let wants_before = store.snapshot(Collection::WantList).await;

    for _ in 0..2 {
        let report = transfer_purchased(&repo).await?;
        assert!(report.is_empty());
    }

    assert_eq!(store.snapshot(Collection::Stock).await, stock_before);
    assert_eq!(store.snapshot(Collection::WantList).await, wants_before);
    Ok(())
}

// ---- Stock management ----

#[tokio::test]
async fn test_add_stock_merges_same_name() -> Result<()> {
    let (_store, repo) = setup();

    let first = add_stock_item(&repo, &NewStockItem::new("Olive Oil", 2.0, "cup")).await?;
    assert!(!first.merged);

    let second = add_stock_item(&repo, &NewStockItem::new("olive oil", 1.5, "cup")).await?;
    assert!(second.merged);
    assert_eq!(second.item.quantity, 3.5);
    assert_eq!(repo.list_stock().await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_add_stock_rejects_bad_input() -> Result<()> {
    let (_store, repo) = setup();

    let err = add_stock_item(&repo, &NewStockItem::new("  ", 1.0, "cup"))
        .await
        .unwrap_err();
    assert!(matches!(err, PantryError::InvalidArguments(_)));

    let mut negative = NewStockItem::new("Salt", 1.0, "tsp");
    negative.quantity = -1.0;
    let err = add_stock_item(&repo, &negative).await.unwrap_err();
    assert!(matches!(err, PantryError::InvalidArguments(_)));
    Ok(())
}

#[tokio::test]
async fn test_update_stock_item_by_name() -> Result<()> {
    let (_store, repo) = setup();
    repo.create_stock(&NewStockItem::new("Sugar", 3.0, "cup")).await?;

    let update = StockUpdate {
        is_staple: Some(true),
        min_quantity: Some(1.0),
        ..StockUpdate::quantity(2.0)
    };
    let item = update_stock_item(&repo, "SUGAR", &update).await?;

    assert_eq!(item.quantity, 2.0);
    assert!(item.is_staple);
    assert_eq!(item.min_quantity, Some(1.0));
    assert_eq!(item.unit, "cup");

    let err = update_stock_item(&repo, "Honey", &update).await.unwrap_err();
    assert_eq!(err, PantryError::not_found("stock item", "Honey"));

    let err = update_stock_item(&repo, "Sugar", &StockUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PantryError::MissingInput(_)));

    let err = update_stock_item(&repo, "Sugar", &StockUpdate::quantity(-2.0))
        .await
        .unwrap_err();
    assert!(matches!(err, PantryError::InvalidArguments(_)));
    Ok(())
}

#[tokio::test]
async fn test_list_stock_by_category() -> Result<()> {
    let (_store, repo) = setup();
    repo.create_stock(&NewStockItem::new("milk", 1.0, "gallon").with_category("Dairy"))
        .await?;
    repo.create_stock(&NewStockItem::new("Butter", 1.0, "lb").with_category("Dairy"))
        .await?;
    repo.create_stock(&NewStockItem::new("Rice", 1.0, "cup").with_category("Grains"))
        .await?;

    let dairy: Vec<String> = list_stock(&repo, Some("dairy"))
        .await?
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(dairy, vec!["Butter".to_string(), "milk".to_string()]);
    assert_eq!(list_stock(&repo, None).await?.len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_low_stock_report_and_top_up() -> Result<()> {
    let (store, repo) = setup();
    repo.create_stock(&NewStockItem::new("Flour", 1.0, "cup").staple(2.0)).await?;
    repo.create_stock(&NewStockItem::new("Sugar", 0.5, "cup").staple(1.0)).await?;
    repo.create_stock(&NewStockItem::new("Salt", 10.0, "tsp").staple(2.0)).await?;
    repo.create_stock(&NewStockItem::new("Paprika", 0.0, "tsp")).await?;
    repo.create_want_item(&NewWantItem::new("sugar", 1.0, "cup")).await?;

    let report = check_low_stock(&repo, false).await?;
    let names: Vec<&str> = report.low.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Flour", "Sugar"]);
    assert!(report.low[1].on_want_list);
    assert!(report.added.is_empty());

    let report = check_low_stock(&repo, true).await?;
    assert_eq!(report.added, vec!["Flour".to_string()]);

    let wants = all_want_items(&store).await;
    assert_eq!(wants.len(), 2);
    let flour = wants.iter().find(|w| w.name == "Flour").unwrap();
    assert_eq!(flour.quantity, 2.0);
    assert!(flour.is_auto_added);

    // Already queued now
    assert!(check_low_stock(&repo, true).await?.added.is_empty());
    Ok(())
}

// ---- Want list ----

#[tokio::test]
async fn test_want_list_sorted_by_priority_then_name() -> Result<()> {
    let (_store, repo) = setup();
    add_want_item(&repo, &NewWantItem::new("Bread", 1.0, "loaf").with_priority(Priority::Low)).await?;
    add_want_item(&repo, &NewWantItem::new("milk", 1.0, "gallon").with_priority(Priority::High)).await?;
    add_want_item(&repo, &NewWantItem::new("Apples", 6.0, "count")).await?;
    add_want_item(&repo, &NewWantItem::new("Coffee", 1.0, "lb").with_priority(Priority::High)).await?;

    let names: Vec<String> = list_want_items(&repo, false)
        .await?
        .into_iter()
        .map(|w| w.name)
        .collect();
    assert_eq!(names, vec!["Coffee", "milk", "Apples", "Bread"]);
    Ok(())
}

#[tokio::test]
async fn test_mark_purchased_by_name() -> Result<()> {
    let (_store, repo) = setup();
    add_want_item(&repo, &NewWantItem::new("Milk", 1.0, "gallon")).await?;

    let item = mark_purchased(&repo, "MILK").await?;
    assert!(item.is_purchased);

    assert!(list_want_items(&repo, false).await?.is_empty());
    assert_eq!(list_want_items(&repo, true).await?.len(), 1);

    let err = mark_purchased(&repo, "Milk").await.unwrap_err();
    assert_eq!(err, PantryError::not_found("want-list item", "Milk"));
    Ok(())
}

#[tokio::test]
async fn test_add_want_item_validates_quantity() -> Result<()> {
    let (_store, repo) = setup();
    let err = add_want_item(&repo, &NewWantItem::new("Milk", 0.0, "gallon"))
        .await
        .unwrap_err();
    assert!(matches!(err, PantryError::InvalidArguments(_)));
    Ok(())
}
