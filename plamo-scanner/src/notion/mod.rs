//! Notion record store
//!
//! The remote store is a set of databases (collections) holding pages
//! (records). Only three calls are needed: query a database with an exact
//! title filter, create a page, patch a page's properties.
//!
//! - [`RecordStore`] is the wire-level seam, implemented by [`NotionClient`]
//! - [`NotionRepository`] builds find-or-create, update-relation and
//!   fetch-by-key on top of any `RecordStore`

mod client;
mod repository;

pub use client::{NotionClient, NOTION_VERSION};
pub use repository::NotionRepository;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use thiserror::Error;

/// Property map sent on create/update, keyed by property name
pub type PropertyMap = serde_json::Map<String, Value>;

/// Notion client errors
///
/// Callers treat every variant as one generic failure; the variants exist for
/// logging and for the message shown to the user.
#[derive(Debug, Error)]
pub enum NotionError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Notion rejected the API key")]
    Unauthorized,

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// A Notion page (one record of a database)
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Page {
    /// Store-assigned page id
    pub id: String,
    /// Properties keyed by name
    #[serde(default)]
    pub properties: HashMap<String, PropertyValue>,
    /// Deep link for opening the page in Notion
    pub url: String,
}

impl Page {
    /// First plain-text fragment of a rich_text or title property
    ///
    /// Returns None when the property is missing or holds no non-empty text.
    pub fn text_value(&self, property: &str) -> Option<&str> {
        let value = self.properties.get(property)?;
        value
            .rich_text
            .as_deref()
            .and_then(|t| t.first())
            .or_else(|| value.title.as_deref().and_then(|t| t.first()))
            .map(|t| t.plain_text.as_str())
            .filter(|s| !s.is_empty())
    }

    /// Page ids referenced by a relation property
    pub fn relation_ids(&self, property: &str) -> Vec<&str> {
        self.properties
            .get(property)
            .and_then(|v| v.relation.as_deref())
            .map(|r| r.iter().map(|r| r.id.as_str()).collect())
            .unwrap_or_default()
    }
}

/// A typed property value as returned by Notion
///
/// Only the property types this crate reads are modelled; others decode with
/// all optional fields empty.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct PropertyValue {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Vec<RichText>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rich_text: Option<Vec<RichText>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation: Option<Vec<RelationRef>>,
}

/// One rich text fragment
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RichText {
    pub plain_text: String,
}

/// Relation target
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RelationRef {
    pub id: String,
}

/// Database query body: exact match on a title property
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryRequest {
    pub filter: TitleFilter,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TitleFilter {
    pub property: String,
    pub title: TextCondition,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextCondition {
    pub equals: String,
}

impl QueryRequest {
    pub fn title_equals(property: &str, value: &str) -> Self {
        Self {
            filter: TitleFilter {
                property: property.to_string(),
                title: TextCondition {
                    equals: value.to_string(),
                },
            },
        }
    }
}

/// Database query response (only the first page of results is consulted)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueryResponse {
    pub results: Vec<Page>,
}

/// Title property value for create/update
pub fn title_value(content: &str) -> Value {
    json!({ "title": [{ "text": { "content": content } }] })
}

/// Rich text property value for create/update
pub fn rich_text_value(content: &str) -> Value {
    json!({ "rich_text": [{ "text": { "content": content } }] })
}

/// Relation property value pointing at exactly the given pages
pub fn relation_value(page_ids: &[&str]) -> Value {
    let targets: Vec<Value> = page_ids.iter().map(|id| json!({ "id": id })).collect();
    json!({ "relation": targets })
}

/// Wire-level access to a Notion workspace
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Query a database; returns the first page of matches
    async fn query_database(
        &self,
        database_id: &str,
        query: &QueryRequest,
    ) -> Result<Vec<Page>, NotionError>;

    /// Create a page in a database
    async fn create_page(
        &self,
        database_id: &str,
        properties: PropertyMap,
    ) -> Result<Page, NotionError>;

    /// Patch properties of an existing page
    async fn update_page(
        &self,
        page_id: &str,
        properties: PropertyMap,
    ) -> Result<Page, NotionError>;
}
