//! # Notion Store Adapter
//!
//! [`DocumentStore`] over the Notion REST API. Each collection is a Notion
//! database, each record a page. Archiving sets the page's `archived` flag.
//!
//! Only the property types listed in [`PropertyValue`] are decoded; anything
//! else on a page is ignored.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::config::{DatabaseIds, NotionConfig};
use crate::store::{Collection, DocumentStore, Filter, Lifecycle, Properties, PropertyValue, Record};

#[derive(Clone)]
pub struct NotionStore {
    client: Client,
    config: NotionConfig,
    databases: DatabaseIds,
}

impl NotionStore {
    pub fn new(config: NotionConfig, databases: DatabaseIds) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            config,
            databases,
        })
    }

    fn database_id(&self, collection: Collection) -> Result<&str> {
        let id = match collection {
            Collection::Stock => Some(&self.databases.stock),
            Collection::WantList => Some(&self.databases.want_list),
            Collection::Recipe => Some(&self.databases.recipes),
            Collection::Ingredient => self.databases.ingredients.as_ref(),
            Collection::RecipeIngredient => self.databases.recipe_ingredients.as_ref(),
        };
        match id {
            Some(id) => Ok(id.as_str()),
            None => bail!("No database configured for {collection}"),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.config.base_url, path))
            .bearer_auth(&self.config.api_key)
            .header("Notion-Version", &self.config.api_version)
    }

    async fn send(&self, builder: RequestBuilder, what: &str) -> Result<Value> {
        let response = builder
            .send()
            .await
            .with_context(|| format!("{what}: request failed"))?;
        read_json(response, what).await
    }
}

async fn read_json(response: Response, what: &str) -> Result<Value> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!("{what}: store responded {status}: {body}");
    }
    response
        .json::<Value>()
        .await
        .with_context(|| format!("{what}: invalid JSON response"))
}

#[async_trait]
impl DocumentStore for NotionStore {
    async fn query(&self, collection: Collection, filter: Option<&Filter>) -> Result<Vec<Record>> {
        let database_id = self.database_id(collection)?;
        let what = format!("Query {collection}");
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut body = json!({ "page_size": self.config.page_size });
            if let Some(filter) = filter {
                body["filter"] = encode_filter(filter);
            }
            if let Some(cursor) = &cursor {
                body["start_cursor"] = json!(cursor);
            }

            let page = self
                .send(
                    self.request(Method::POST, &format!("/databases/{database_id}/query"))
                        .json(&body),
                    &what,
                )
                .await?;

            for result in page["results"].as_array().into_iter().flatten() {
                let record = decode_page(result)?;
                if !record.is_archived() {
                    records.push(record);
                }
            }

            cursor = page["next_cursor"].as_str().map(str::to_string);
            if !page["has_more"].as_bool().unwrap_or(false) || cursor.is_none() {
                break;
            }
        }

        debug!(%collection, count = records.len(), "notion query");
        Ok(records)
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Record>> {
        let what = format!("Fetch page {id} from {collection}");
        let response = self
            .request(Method::GET, &format!("/pages/{id}"))
            .send()
            .await
            .with_context(|| format!("{what}: request failed"))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let page = read_json(response, &what).await?;
        if !belongs_to(&page, self.database_id(collection)?) {
            debug!(%collection, id, "Page belongs to another database");
            return Ok(None);
        }
        decode_page(&page).map(Some)
    }

    async fn create(&self, collection: Collection, properties: Properties) -> Result<Record> {
        let database_id = self.database_id(collection)?;
        let body = json!({
            "parent": { "database_id": database_id },
            "properties": encode_properties(&properties),
        });
        let page = self
            .send(
                self.request(Method::POST, "/pages").json(&body),
                &format!("Create page in {collection}"),
            )
            .await?;
        decode_page(&page)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        properties: Properties,
    ) -> Result<Record> {
        let body = json!({ "properties": encode_properties(&properties) });
        let page = self
            .send(
                self.request(Method::PATCH, &format!("/pages/{id}")).json(&body),
                &format!("Update page {id} in {collection}"),
            )
            .await?;
        decode_page(&page)
    }

    async fn archive(&self, collection: Collection, id: &str) -> Result<()> {
        self.send(
            self.request(Method::PATCH, &format!("/pages/{id}"))
                .json(&json!({ "archived": true })),
            &format!("Archive page {id} in {collection}"),
        )
        .await?;
        Ok(())
    }
}

/// Whether `page` lives in the database `database_id`; Notion ids compare
/// equal with or without hyphens
pub fn belongs_to(page: &Value, database_id: &str) -> bool {
    let strip = |id: &str| id.replace('-', "").to_lowercase();
    page["parent"]["database_id"]
        .as_str()
        .is_some_and(|parent| strip(parent) == strip(database_id))
}

/// Build a [`Record`] from a page object
pub fn decode_page(page: &Value) -> Result<Record> {
    let id = page["id"]
        .as_str()
        .context("Page object has no id")?
        .to_string();

    let archived = page["archived"].as_bool().unwrap_or(false)
        || page["in_trash"].as_bool().unwrap_or(false);

    let mut properties = Properties::new();
    if let Some(map) = page["properties"].as_object() {
        for (name, value) in map {
            match decode_property(value) {
                Some(decoded) => {
                    properties.insert(name.clone(), decoded);
                }
                None => debug!(property = %name, "Skipping unsupported property type"),
            }
        }
    }

    Ok(Record {
        id,
        properties,
        lifecycle: if archived {
            Lifecycle::Archived
        } else {
            Lifecycle::Active
        },
    })
}

fn plain_text(fragments: &Value) -> String {
    fragments
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|fragment| {
            fragment["plain_text"]
                .as_str()
                .or_else(|| fragment["text"]["content"].as_str())
        })
        .collect()
}

fn option_name(value: &Value) -> Option<String> {
    value["name"].as_str().map(str::to_string)
}

/// Decode one property object by its `type` tag
pub fn decode_property(value: &Value) -> Option<PropertyValue> {
    let kind = value["type"].as_str()?;
    let body = &value[kind];
    let decoded = match kind {
        "title" => PropertyValue::Title(plain_text(body)),
        "rich_text" => PropertyValue::RichText(plain_text(body)),
        "number" => PropertyValue::Number(body.as_f64()),
        "select" => PropertyValue::Select(option_name(body)),
        "multi_select" => PropertyValue::MultiSelect(
            body.as_array()
                .into_iter()
                .flatten()
                .filter_map(option_name)
                .collect(),
        ),
        "checkbox" => PropertyValue::Checkbox(body.as_bool().unwrap_or(false)),
        "date" => PropertyValue::Date(body["start"].as_str().and_then(parse_date)),
        "url" => PropertyValue::Url(body.as_str().map(str::to_string)),
        "relation" => PropertyValue::Relation(
            body.as_array()
                .into_iter()
                .flatten()
                .filter_map(|r| r["id"].as_str().map(str::to_string))
                .collect(),
        ),
        _ => return None,
    };
    Some(decoded)
}

/// Dates may carry a time part; only the calendar day is kept
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.get(..10).unwrap_or(raw);
    match NaiveDate::parse_from_str(day, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(e) => {
            warn!(raw, error = %e, "Unreadable date property");
            None
        }
    }
}

fn text_fragments(text: &str) -> Value {
    if text.is_empty() {
        json!([])
    } else {
        json!([{ "type": "text", "text": { "content": text } }])
    }
}

/// Encode properties into the shape page create/update expects
pub fn encode_properties(properties: &Properties) -> Value {
    let encoded: Map<String, Value> = properties
        .iter()
        .map(|(name, value)| {
            let body = match value {
                PropertyValue::Title(text) => json!({ "title": text_fragments(text) }),
                PropertyValue::RichText(text) => json!({ "rich_text": text_fragments(text) }),
                PropertyValue::Number(n) => json!({ "number": n }),
                PropertyValue::Select(option) => json!({
                    "select": option.as_ref().map(|name| json!({ "name": name }))
                }),
                PropertyValue::MultiSelect(options) => json!({
                    "multi_select": options.iter().map(|name| json!({ "name": name })).collect::<Vec<_>>()
                }),
                PropertyValue::Checkbox(flag) => json!({ "checkbox": flag }),
                PropertyValue::Date(date) => json!({
                    "date": date.map(|d| json!({ "start": d.format("%Y-%m-%d").to_string() }))
                }),
                PropertyValue::Url(url) => json!({ "url": url }),
                PropertyValue::Relation(ids) => json!({
                    "relation": ids.iter().map(|id| json!({ "id": id })).collect::<Vec<_>>()
                }),
            };
            (name.clone(), body)
        })
        .collect();
    Value::Object(encoded)
}

/// Encode a filter for the database query endpoint
pub fn encode_filter(filter: &Filter) -> Value {
    match filter {
        Filter::Checkbox { property, equals } => json!({
            "property": property,
            "checkbox": { "equals": equals }
        }),
        Filter::RelationContains { property, id } => json!({
            "property": property,
            "relation": { "contains": id }
        }),
        Filter::DateOnOrBefore { property, date } => json!({
            "property": property,
            "date": { "on_or_before": date.format("%Y-%m-%d").to_string() }
        }),
    }
}
