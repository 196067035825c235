//! Record operations on top of a RecordStore
//!
//! find-or-create is query-then-create with no server-side uniqueness
//! constraint. Two concurrent calls for the same identifier can both miss and
//! both create; scans are serialized by the dispatcher lock, so within one
//! scanner this does not happen, but two devices scanning the same new tag
//! at once can still produce a duplicate record.

use super::{
    relation_value, rich_text_value, title_value, NotionError, Page, PropertyMap, QueryRequest,
    RecordStore,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Find-or-create, update-relation and fetch-by-key
#[derive(Clone)]
pub struct NotionRepository {
    store: Arc<dyn RecordStore>,
    relation_property: String,
}

impl NotionRepository {
    /// `relation_property` is the single-valued relation written by
    /// [`update_relation`](Self::update_relation)
    pub fn new(store: Arc<dyn RecordStore>, relation_property: impl Into<String>) -> Self {
        Self {
            store,
            relation_property: relation_property.into(),
        }
    }

    /// Return the first page whose `key_property` equals `identifier`,
    /// creating one if none exists
    ///
    /// A created page gets `key_property` = `identifier` (title) and
    /// `name_property` = `default_name` (rich text); the created page is
    /// returned exactly as the store reports it.
    pub async fn find_or_create(
        &self,
        database_id: &str,
        key_property: &str,
        identifier: &str,
        name_property: &str,
        default_name: &str,
    ) -> Result<Page, NotionError> {
        if let Some(page) = self.get_by_key(database_id, key_property, identifier).await? {
            debug!(database_id, identifier, page_id = %page.id, "Found existing record");
            return Ok(page);
        }

        let mut properties = PropertyMap::new();
        properties.insert(key_property.to_string(), title_value(identifier));
        properties.insert(name_property.to_string(), rich_text_value(default_name));

        let page = self.store.create_page(database_id, properties).await?;
        info!(database_id, identifier, page_id = %page.id, "Created record for new identifier");
        Ok(page)
    }

    /// Point the relation property of `source_page_id` at `target_page_id`,
    /// replacing any previous target
    pub async fn update_relation(
        &self,
        source_page_id: &str,
        target_page_id: &str,
    ) -> Result<Page, NotionError> {
        let mut properties = PropertyMap::new();
        properties.insert(
            self.relation_property.clone(),
            relation_value(&[target_page_id]),
        );

        let page = self.store.update_page(source_page_id, properties).await?;
        info!(
            source = source_page_id,
            target = target_page_id,
            relation = %self.relation_property,
            "Updated relation"
        );
        Ok(page)
    }

    /// First page whose `key_property` equals `identifier`, or None
    pub async fn get_by_key(
        &self,
        database_id: &str,
        key_property: &str,
        identifier: &str,
    ) -> Result<Option<Page>, NotionError> {
        let query = QueryRequest::title_equals(key_property, identifier);
        let results = self.store.query_database(database_id, &query).await?;
        Ok(results.into_iter().next())
    }
}
