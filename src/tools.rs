//! # Pantry Tools
//!
//! The tool catalog exposed to the assistant: names, JSON schemas, argument
//! bundles and dispatch. Every call produces a [`ToolResponse`]. Domain
//! outcomes such as "not found" are ordinary replies; only store failures
//! and unreadable arguments are flagged as errors.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::cooking::{update_after_cooking, CookingReport, CookingRequest, ReconcileFailure};
use crate::errors::PantryError;
use crate::expiry::{sweep_expired, ExpirySweep};
use crate::inventory;
use crate::localization::{t, t_args};
use crate::models::{NewStockItem, NewWantItem, Priority, StockUpdate};
use crate::recipes;
use crate::repository::{IngredientSource, PantryRepository};
use crate::shopping;
use crate::transfer::transfer_purchased;
use crate::units::{convert_detailed, format_quantity};

/// Source of "today" for expiry sweeps
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local calendar date of the host
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// Always the same day
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Text reply of a tool call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResponse {
    pub text: String,
    pub is_error: bool,
}

impl ToolResponse {
    fn ok(text: String) -> Self {
        Self {
            text,
            is_error: false,
        }
    }
}

/// Advertised tool metadata
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Advertised resource metadata
#[derive(Debug, Clone, Serialize)]
pub struct ResourceDefinition {
    pub uri: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "mimeType")]
    pub mime_type: &'static str,
}

pub const STOCK_RESOURCE: &str = "pantry://stock";
pub const WANT_LIST_RESOURCE: &str = "pantry://want-list";
pub const RECIPES_RESOURCE: &str = "pantry://recipes";

fn tool(name: &'static str, description: &'static str, input_schema: Value) -> ToolDefinition {
    ToolDefinition {
        name,
        description,
        input_schema,
    }
}

pub fn tool_definitions() -> Vec<ToolDefinition> {
    let usage_item = json!({
        "type": "object",
        "properties": {
            "name": { "type": "string" },
            "quantity": { "type": "number", "minimum": 0 },
            "unit": { "type": "string" }
        },
        "required": ["name", "quantity"]
    });

    vec![
        tool(
            "list_stock",
            "List pantry stock, optionally for one category",
            json!({
                "type": "object",
                "properties": { "category": { "type": "string" } }
            }),
        ),
        tool(
            "add_stock_item",
            "Add an item to the pantry; an existing item with the same name is topped up",
            json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "quantity": { "type": "number", "minimum": 0 },
                    "unit": { "type": "string" },
                    "category": { "type": "string" },
                    "is_staple": { "type": "boolean" },
                    "min_quantity": { "type": "number", "minimum": 0 },
                    "expiry_date": { "type": "string", "format": "date" },
                    "notes": { "type": "string" }
                },
                "required": ["name", "quantity", "unit"]
            }),
        ),
        tool(
            "update_stock_item",
            "Change fields of a stock item found by name",
            json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "quantity": { "type": "number", "minimum": 0 },
                    "unit": { "type": "string" },
                    "category": { "type": "string" },
                    "is_staple": { "type": "boolean" },
                    "min_quantity": { "type": "number", "minimum": 0 },
                    "expiry_date": { "type": "string", "format": "date" }
                },
                "required": ["name"]
            }),
        ),
        tool(
            "check_low_stock",
            "Report staples at or below their minimum and optionally add them to the want list",
            json!({
                "type": "object",
                "properties": { "add_to_want_list": { "type": "boolean", "default": false } }
            }),
        ),
        tool(
            "update_after_cooking",
            "Subtract what a meal used from the pantry, re-order staples that ran low and mark the recipe tried",
            json!({
                "type": "object",
                "properties": {
                    "recipe_id": { "type": "string" },
                    "ingredients": { "type": "array", "items": usage_item }
                }
            }),
        ),
        tool(
            "remove_expired",
            "Find expired stock and remove it, re-ordering expired staples",
            json!({
                "type": "object",
                "properties": {
                    "cutoff": { "type": "string", "format": "date" },
                    "dry_run": { "type": "boolean", "default": false },
                    "add_replacements": { "type": "boolean", "default": true }
                }
            }),
        ),
        tool(
            "get_want_list",
            "Show the want list, highest priority first",
            json!({
                "type": "object",
                "properties": { "include_purchased": { "type": "boolean", "default": false } }
            }),
        ),
        tool(
            "add_to_want_list",
            "Add an item to the want list",
            json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "quantity": { "type": "number", "exclusiveMinimum": 0, "default": 1 },
                    "unit": { "type": "string" },
                    "category": { "type": "string" },
                    "priority": { "type": "string", "enum": ["Low", "Medium", "High"] },
                    "notes": { "type": "string" }
                },
                "required": ["name"]
            }),
        ),
        tool(
            "mark_purchased",
            "Mark a want-list item as bought",
            json!({
                "type": "object",
                "properties": { "name": { "type": "string" } },
                "required": ["name"]
            }),
        ),
        tool(
            "transfer_purchased",
            "Move every purchased want-list item into pantry stock",
            json!({ "type": "object", "properties": {} }),
        ),
        tool(
            "list_recipes",
            "List recipes, optionally only untried ones or one tag",
            json!({
                "type": "object",
                "properties": {
                    "untried_only": { "type": "boolean", "default": false },
                    "tag": { "type": "string" }
                }
            }),
        ),
        tool(
            "get_recipe_ingredients",
            "Show the ingredient list of a recipe",
            json!({
                "type": "object",
                "properties": { "recipe_id": { "type": "string" } },
                "required": ["recipe_id"]
            }),
        ),
        tool(
            "convert_units",
            "Convert a quantity between cooking units",
            json!({
                "type": "object",
                "properties": {
                    "value": { "type": "number" },
                    "from_unit": { "type": "string" },
                    "to_unit": { "type": "string" },
                    "ingredient": { "type": "string" }
                },
                "required": ["value", "from_unit", "to_unit"]
            }),
        ),
    ]
}

pub fn resource_definitions() -> Vec<ResourceDefinition> {
    vec![
        ResourceDefinition {
            uri: STOCK_RESOURCE,
            name: "Pantry stock",
            description: "All active stock items",
            mime_type: "application/json",
        },
        ResourceDefinition {
            uri: WANT_LIST_RESOURCE,
            name: "Want list",
            description: "Unpurchased want-list items by priority",
            mime_type: "application/json",
        },
        ResourceDefinition {
            uri: RECIPES_RESOURCE,
            name: "Recipes",
            description: "All recipes",
            mime_type: "application/json",
        },
    ]
}

// ---- Argument bundles ----

#[derive(Debug, Default, Deserialize)]
struct ListStockArgs {
    #[serde(default)]
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdateStockArgs {
    name: String,
    #[serde(flatten)]
    update: StockUpdate,
}

#[derive(Debug, Default, Deserialize)]
struct LowStockArgs {
    #[serde(default)]
    add_to_want_list: bool,
}

#[derive(Debug, Default, Deserialize)]
struct WantListArgs {
    #[serde(default)]
    include_purchased: bool,
}

fn default_quantity() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
struct AddWantArgs {
    name: String,
    #[serde(default = "default_quantity")]
    quantity: f64,
    #[serde(default)]
    unit: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

impl AddWantArgs {
    fn into_item(self) -> NewWantItem {
        let mut item = NewWantItem::new(&self.name, self.quantity, &self.unit)
            .with_category(&self.category)
            .with_priority(self.priority.as_deref().map(Priority::parse).unwrap_or_default());
        if let Some(notes) = &self.notes {
            item = item.with_notes(notes);
        }
        item
    }
}

#[derive(Debug, Deserialize)]
struct NameArgs {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ListRecipesArgs {
    #[serde(default)]
    untried_only: bool,
    #[serde(default)]
    tag: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RecipeIdArgs {
    recipe_id: String,
}

#[derive(Debug, Deserialize)]
struct ConvertArgs {
    value: f64,
    from_unit: String,
    to_unit: String,
    #[serde(default)]
    ingredient: Option<String>,
}

fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T, PantryError> {
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|e| PantryError::InvalidArguments(e.to_string()))
}

// ---- Dispatch ----

/// Why a tool call did not produce a normal reply
#[derive(Debug)]
enum ToolFailure {
    Pantry(PantryError),
    Cooking(ReconcileFailure),
    UnknownTool(String),
}

impl From<PantryError> for ToolFailure {
    fn from(err: PantryError) -> Self {
        ToolFailure::Pantry(err)
    }
}

impl From<ReconcileFailure> for ToolFailure {
    fn from(failure: ReconcileFailure) -> Self {
        if !failure.wrote_anything() {
            ToolFailure::Pantry(failure.error)
        } else {
            ToolFailure::Cooking(failure)
        }
    }
}

/// Reply text for a domain error, and whether it counts as a failure
pub fn error_reply(err: &PantryError) -> ToolResponse {
    if err.is_upstream() {
        error!(error = %err, "Store call failed");
        return ToolResponse {
            text: t("error-upstream"),
            is_error: true,
        };
    }

    let (text, is_error) = match err {
        PantryError::NotFound { kind, key } => {
            (t_args("error-not-found", &[("kind", kind), ("key", key)]), false)
        }
        PantryError::NotConvertible { from, to } => {
            (t_args("error-not-convertible", &[("from", from), ("to", to)]), false)
        }
        PantryError::MissingInput(message) => {
            (t_args("error-missing-input", &[("message", message)]), false)
        }
        PantryError::InvalidArguments(message) => {
            (t_args("error-invalid-arguments", &[("message", message)]), true)
        }
        PantryError::Upstream(_) => (t("error-upstream"), true),
    };
    ToolResponse { text, is_error }
}

impl ToolFailure {
    fn into_response(self) -> ToolResponse {
        match self {
            ToolFailure::Pantry(err) => error_reply(&err),
            ToolFailure::Cooking(failure) => {
                let reason = error_reply(&failure.error);
                let summary = t_args(
                    "cooking-partial",
                    &[
                        ("applied", &failure.applied.changes.len().to_string()),
                        ("error", &reason.text),
                    ],
                );
                ToolResponse {
                    text: with_details(summary, &failure.applied),
                    is_error: reason.is_error,
                }
            }
            ToolFailure::UnknownTool(name) => ToolResponse {
                text: t_args("error-unknown-tool", &[("name", &name)]),
                is_error: true,
            },
        }
    }
}

fn with_details<T: Serialize>(summary: String, details: &T) -> String {
    match serde_json::to_string_pretty(details) {
        Ok(json) => format!("{summary}\n\n{json}"),
        Err(_) => summary,
    }
}

fn bulleted<T: std::fmt::Display>(header: String, items: &[T]) -> String {
    let mut text = header;
    for item in items {
        text.push_str(&format!("\n- {item}"));
    }
    text
}

fn joined(names: &[String]) -> String {
    names.join(", ")
}

/// Tool dispatcher over a pantry repository
#[derive(Clone)]
pub struct PantryTools {
    repo: PantryRepository,
    clock: Arc<dyn Clock>,
}

impl PantryTools {
    pub fn new(repo: PantryRepository) -> Self {
        Self {
            repo,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Run a tool by name; never fails
    pub async fn call(&self, name: &str, arguments: Value) -> ToolResponse {
        info!(tool = name, "Tool call");
        match self.dispatch(name, arguments).await {
            Ok(text) => ToolResponse::ok(text),
            Err(failure) => {
                let response = failure.into_response();
                if response.is_error {
                    warn!(tool = name, reply = %response.text, "Tool call failed");
                }
                response
            }
        }
    }

    async fn dispatch(&self, name: &str, arguments: Value) -> Result<String, ToolFailure> {
        let repo = &self.repo;
        let text = match name {
            "list_stock" => {
                let args: ListStockArgs = parse_args(arguments)?;
                let items = inventory::list_stock(repo, args.category.as_deref()).await?;
                match (&args.category, items.is_empty()) {
                    (Some(category), true) => {
                        t_args("stock-empty-category", &[("category", category)])
                    }
                    (None, true) => t("stock-empty"),
                    _ => bulleted(
                        t_args("stock-header", &[("count", &items.len().to_string())]),
                        &items,
                    ),
                }
            }
            "add_stock_item" => {
                let new_item: NewStockItem = parse_args(arguments)?;
                let added = inventory::add_stock_item(repo, &new_item).await?;
                let key = if added.merged {
                    "stock-merged"
                } else {
                    "stock-added"
                };
                let quantity = if added.merged {
                    added.item.quantity
                } else {
                    new_item.quantity
                };
                t_args(
                    key,
                    &[
                        ("name", &added.item.name),
                        ("quantity", &format_quantity(quantity)),
                        ("unit", &added.item.unit),
                    ],
                )
            }
            "update_stock_item" => {
                let args: UpdateStockArgs = parse_args(arguments)?;
                let item = inventory::update_stock_item(repo, &args.name, &args.update).await?;
                t_args("stock-updated", &[("item", &item.to_string())])
            }
            "check_low_stock" => {
                let args: LowStockArgs = parse_args(arguments)?;
                let report = inventory::check_low_stock(repo, args.add_to_want_list).await?;
                if report.low.is_empty() {
                    t("low-stock-none")
                } else {
                    let mut summary = t("low-stock-header");
                    for entry in &report.low {
                        summary.push_str(&format!(
                            "\n- {}: {} {} (min {})",
                            entry.name,
                            format_quantity(entry.quantity),
                            entry.unit,
                            format_quantity(entry.min_quantity)
                        ));
                    }
                    if !report.added.is_empty() {
                        summary.push('\n');
                        summary.push_str(&t_args(
                            "low-stock-added",
                            &[("names", &joined(&report.added))],
                        ));
                    }
                    summary
                }
            }
            "update_after_cooking" => {
                let request: CookingRequest = parse_args(arguments)?;
                let report = update_after_cooking(repo, &request).await?;
                with_details(cooking_summary(&report), &report)
            }
            "remove_expired" => {
                let sweep: ExpirySweep = parse_args(arguments)?;
                let report = sweep_expired(repo, &sweep, self.clock.today()).await?;
                let cutoff = report.cutoff.to_string();
                let count = report.expired.len().to_string();
                let summary = if report.expired.is_empty() {
                    t_args("expiry-none", &[("cutoff", &cutoff)])
                } else if report.dry_run {
                    t_args("expiry-dry-run", &[("count", &count), ("cutoff", &cutoff)])
                } else if report.replacements.is_empty() {
                    t_args("expiry-removed", &[("count", &count)])
                } else {
                    format!(
                        "{}\n{}",
                        t_args("expiry-removed", &[("count", &count)]),
                        t_args("expiry-replacements", &[("names", &joined(&report.replacements))])
                    )
                };
                with_details(summary, &report)
            }
            "get_want_list" => {
                let args: WantListArgs = parse_args(arguments)?;
                let items = shopping::list_want_items(repo, args.include_purchased).await?;
                if items.is_empty() {
                    t("want-list-empty")
                } else {
                    bulleted(
                        t_args("want-list-header", &[("count", &items.len().to_string())]),
                        &items,
                    )
                }
            }
            "add_to_want_list" => {
                let args: AddWantArgs = parse_args(arguments)?;
                let item = shopping::add_want_item(repo, &args.into_item()).await?;
                t_args(
                    "want-added",
                    &[
                        ("name", &item.name),
                        ("quantity", &format_quantity(item.quantity)),
                        ("unit", &item.unit),
                        ("priority", item.priority.as_str()),
                    ],
                )
            }
            "mark_purchased" => {
                let args: NameArgs = parse_args(arguments)?;
                let item = shopping::mark_purchased(repo, &args.name).await?;
                t_args("want-purchased", &[("name", &item.name)])
            }
            "transfer_purchased" => {
                let report = transfer_purchased(repo).await?;
                if report.is_empty() {
                    t("transfer-none")
                } else {
                    with_details(
                        t_args(
                            "transfer-done",
                            &[("count", &report.transferred.len().to_string())],
                        ),
                        &report,
                    )
                }
            }
            "list_recipes" => {
                let args: ListRecipesArgs = parse_args(arguments)?;
                let list = recipes::list_recipes(repo, args.untried_only, args.tag.as_deref()).await?;
                if list.is_empty() {
                    t("recipes-none")
                } else {
                    let lines: Vec<String> = list
                        .iter()
                        .map(|r| {
                            let mut line = format!("{} (id: {})", r.name, r.id);
                            if !r.tags.is_empty() {
                                line.push_str(&format!(" [{}]", r.tags.join(", ")));
                            }
                            if r.tried {
                                line.push_str(" tried");
                            }
                            line
                        })
                        .collect();
                    bulleted(
                        t_args("recipes-header", &[("count", &list.len().to_string())]),
                        &lines,
                    )
                }
            }
            "get_recipe_ingredients" => {
                let args: RecipeIdArgs = parse_args(arguments)?;
                let found = recipes::recipe_ingredients(repo, &args.recipe_id).await?;
                let mut text = bulleted(
                    t_args("recipe-ingredients-header", &[("recipe", &found.recipe)]),
                    &found.ingredients,
                );
                if found.source == IngredientSource::Generated {
                    text.push('\n');
                    text.push_str(&t("recipe-ingredients-generated"));
                }
                text
            }
            "convert_units" => {
                let args: ConvertArgs = parse_args(arguments)?;
                let conversion = convert_detailed(
                    args.value,
                    &args.from_unit,
                    &args.to_unit,
                    args.ingredient.as_deref(),
                )?;
                t_args(
                    "conversion-result",
                    &[
                        ("value", &format_quantity(args.value)),
                        ("from", &conversion.from),
                        ("result", &format_quantity(conversion.value)),
                        ("to", &conversion.to),
                        ("path", &conversion.path.to_string()),
                    ],
                )
            }
            other => return Err(ToolFailure::UnknownTool(other.to_string())),
        };
        Ok(text)
    }

    /// JSON snapshot behind a resource URI
    pub async fn read_resource(&self, uri: &str) -> Result<String, PantryError> {
        let snapshot = match uri {
            STOCK_RESOURCE => serde_json::to_value(inventory::list_stock(&self.repo, None).await?),
            WANT_LIST_RESOURCE => {
                serde_json::to_value(shopping::list_want_items(&self.repo, false).await?)
            }
            RECIPES_RESOURCE => {
                serde_json::to_value(recipes::list_recipes(&self.repo, false, None).await?)
            }
            _ => return Err(PantryError::not_found("resource", uri)),
        };
        let snapshot = snapshot.map_err(|e| PantryError::Upstream(e.to_string()))?;
        serde_json::to_string_pretty(&snapshot).map_err(|e| PantryError::Upstream(e.to_string()))
    }
}

fn cooking_summary(report: &CookingReport) -> String {
    let mut lines = vec![match &report.recipe {
        Some(recipe) => t_args("cooking-done", &[("recipe", recipe)]),
        None => t_args("cooking-done-manual", &[("count", &report.changes.len().to_string())]),
    }];
    for change in &report.changes {
        lines.push(t_args(
            "cooking-change",
            &[
                ("name", &change.name),
                ("before", &format_quantity(change.before)),
                ("after", &format_quantity(change.after)),
                ("unit", &change.unit),
            ],
        ));
    }
    if !report.auto_added.is_empty() {
        lines.push(t_args("cooking-auto-added", &[("names", &joined(&report.auto_added))]));
    }
    if !report.not_found.is_empty() {
        lines.push(t_args("cooking-not-found", &[("names", &joined(&report.not_found))]));
    }
    if report.recipe_marked_tried {
        if let Some(recipe) = &report.recipe {
            lines.push(t_args("cooking-marked-tried", &[("recipe", recipe)]));
        }
    }
    lines.join("\n")
}
