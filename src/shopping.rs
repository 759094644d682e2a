//! # Want List
//!
//! Manual want-list operations. Automatic additions happen in
//! [`crate::cooking`], [`crate::expiry`] and [`crate::inventory`].

use tracing::info;

use crate::errors::PantryError;
use crate::models::{NewWantItem, WantListItem};
use crate::repository::PantryRepository;

/// Want-list items, highest priority first, then by name
pub async fn list_want_items(
    repo: &PantryRepository,
    include_purchased: bool,
) -> Result<Vec<WantListItem>, PantryError> {
    let mut items = repo.list_want_items().await?;
    if !include_purchased {
        items.retain(|item| !item.is_purchased);
    }
    items.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    Ok(items)
}

pub async fn add_want_item(
    repo: &PantryRepository,
    item: &NewWantItem,
) -> Result<WantListItem, PantryError> {
    if item.name.trim().is_empty() {
        return Err(PantryError::InvalidArguments("name must not be empty".to_string()));
    }
    if item.quantity <= 0.0 {
        return Err(PantryError::InvalidArguments(
            "quantity must be greater than zero".to_string(),
        ));
    }
    Ok(repo.create_want_item(item).await?)
}

/// Flag the first unpurchased item called `name` as bought
pub async fn mark_purchased(
    repo: &PantryRepository,
    name: &str,
) -> Result<WantListItem, PantryError> {
    let item = repo
        .list_want_items()
        .await?
        .into_iter()
        .find(|item| !item.is_purchased && item.matches_name(name))
        .ok_or_else(|| PantryError::not_found("want-list item", name))?;

    info!(item = %item.name, "Marking want-list item purchased");
    Ok(repo.mark_want_item_purchased(&item.id).await?)
}
