//! Shared test fixtures: in-memory record store, recording page opener,
//! scanner construction

#![allow(dead_code)]

use async_trait::async_trait;
use plamo_common::events::EventBus;
use plamo_scanner::notion::{
    NotionError, NotionRepository, Page, PropertyMap, PropertyValue, QueryRequest, RecordStore,
    RelationRef, RichText,
};
use plamo_scanner::opener::{OpenError, PageOpener};
use plamo_scanner::scanner::{CollectionSchema, ScannerSettings};
use plamo_scanner::Scanner;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const BAG_DB: &str = "bag-db";
pub const BOX_DB: &str = "box-db";

/// One call made against the store
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Query {
        database_id: String,
        property: String,
        value: String,
    },
    Create {
        database_id: String,
        properties: PropertyMap,
    },
    Update {
        page_id: String,
        properties: PropertyMap,
    },
}

/// Notion stand-in keeping pages per database
#[derive(Default)]
pub struct InMemoryStore {
    pages: Mutex<HashMap<String, Vec<Page>>>,
    calls: Mutex<Vec<StoreCall>>,
    fail: AtomicBool,
    next_id: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every following call fail with a network error
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn create_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, StoreCall::Create { .. }))
            .count()
    }

    pub fn pages(&self, database_id: &str) -> Vec<Page> {
        self.pages
            .lock()
            .unwrap()
            .get(database_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn page(&self, page_id: &str) -> Option<Page> {
        self.pages
            .lock()
            .unwrap()
            .values()
            .flatten()
            .find(|p| p.id == page_id)
            .cloned()
    }

    /// Seed a record directly, bypassing call recording
    pub fn insert(
        &self,
        database_id: &str,
        key_property: &str,
        key: &str,
        name_property: &str,
        name: &str,
    ) -> Page {
        let mut properties = HashMap::new();
        properties.insert(key_property.to_string(), title_property(key));
        properties.insert(name_property.to_string(), rich_text_property(name));
        let page = self.new_page(properties);
        self.pages
            .lock()
            .unwrap()
            .entry(database_id.to_string())
            .or_default()
            .push(page.clone());
        page
    }

    fn new_page(&self, properties: HashMap<String, PropertyValue>) -> Page {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Page {
            id: format!("page-{}", n),
            properties,
            url: format!("https://www.notion.so/page-{}", n),
        }
    }

    fn check_failing(&self) -> Result<(), NotionError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(NotionError::NetworkError("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

fn title_property(text: &str) -> PropertyValue {
    PropertyValue {
        kind: "title".to_string(),
        title: Some(vec![RichText {
            plain_text: text.to_string(),
        }]),
        ..Default::default()
    }
}

fn rich_text_property(text: &str) -> PropertyValue {
    PropertyValue {
        kind: "rich_text".to_string(),
        rich_text: Some(vec![RichText {
            plain_text: text.to_string(),
        }]),
        ..Default::default()
    }
}

/// Turn a create/update request property into the form Notion returns
fn decode_request_property(value: &Value) -> PropertyValue {
    let texts = |key: &str| -> Option<Vec<RichText>> {
        value.get(key)?.as_array().map(|items| {
            items
                .iter()
                .filter_map(|item| item["text"]["content"].as_str())
                .map(|s| RichText {
                    plain_text: s.to_string(),
                })
                .collect()
        })
    };

    if let Some(title) = texts("title") {
        return PropertyValue {
            kind: "title".to_string(),
            title: Some(title),
            ..Default::default()
        };
    }
    if let Some(rich_text) = texts("rich_text") {
        return PropertyValue {
            kind: "rich_text".to_string(),
            rich_text: Some(rich_text),
            ..Default::default()
        };
    }
    let relation = value
        .get("relation")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["id"].as_str())
                .map(|id| RelationRef { id: id.to_string() })
                .collect()
        });
    PropertyValue {
        kind: "relation".to_string(),
        relation,
        ..Default::default()
    }
}

fn title_of(page: &Page, property: &str) -> Option<String> {
    page.properties
        .get(property)?
        .title
        .as_ref()?
        .first()
        .map(|t| t.plain_text.clone())
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn query_database(
        &self,
        database_id: &str,
        query: &QueryRequest,
    ) -> Result<Vec<Page>, NotionError> {
        self.calls.lock().unwrap().push(StoreCall::Query {
            database_id: database_id.to_string(),
            property: query.filter.property.clone(),
            value: query.filter.title.equals.clone(),
        });
        self.check_failing()?;

        Ok(self
            .pages(database_id)
            .into_iter()
            .filter(|p| {
                title_of(p, &query.filter.property).as_deref()
                    == Some(query.filter.title.equals.as_str())
            })
            .collect())
    }

    async fn create_page(
        &self,
        database_id: &str,
        properties: PropertyMap,
    ) -> Result<Page, NotionError> {
        self.calls.lock().unwrap().push(StoreCall::Create {
            database_id: database_id.to_string(),
            properties: properties.clone(),
        });
        self.check_failing()?;

        let decoded = properties
            .iter()
            .map(|(name, value)| (name.clone(), decode_request_property(value)))
            .collect();
        let page = self.new_page(decoded);
        self.pages
            .lock()
            .unwrap()
            .entry(database_id.to_string())
            .or_default()
            .push(page.clone());
        Ok(page)
    }

    async fn update_page(
        &self,
        page_id: &str,
        properties: PropertyMap,
    ) -> Result<Page, NotionError> {
        self.calls.lock().unwrap().push(StoreCall::Update {
            page_id: page_id.to_string(),
            properties: properties.clone(),
        });
        self.check_failing()?;

        let mut pages = self.pages.lock().unwrap();
        let page = pages
            .values_mut()
            .flatten()
            .find(|p| p.id == page_id)
            .ok_or_else(|| NotionError::ApiError(404, format!("page {} not found", page_id)))?;
        for (name, value) in &properties {
            page.properties
                .insert(name.clone(), decode_request_property(value));
        }
        Ok(page.clone())
    }
}

/// Page opener remembering every URL
#[derive(Default)]
pub struct RecordingOpener {
    urls: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl RecordingOpener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let opener = Self::default();
        opener.fail.store(true, Ordering::SeqCst);
        Arc::new(opener)
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageOpener for RecordingOpener {
    async fn open(&self, url: &str) -> Result<(), OpenError> {
        self.urls.lock().unwrap().push(url.to_string());
        if self.fail.load(Ordering::SeqCst) {
            Err(OpenError::NoViewer)
        } else {
            Ok(())
        }
    }
}

pub fn settings(scan_delay: Duration, cooldown: Duration) -> ScannerSettings {
    ScannerSettings {
        bags: CollectionSchema {
            database_id: BAG_DB.to_string(),
            key_property: "Bag ID".to_string(),
            name_property: "Product name".to_string(),
            default_name: "New part".to_string(),
        },
        boxes: CollectionSchema {
            database_id: BOX_DB.to_string(),
            key_property: "Box ID".to_string(),
            name_property: "Box name".to_string(),
            default_name: "New box".to_string(),
        },
        scan_delay,
        cooldown,
    }
}

/// Everything a scanner test needs to inspect
pub struct Harness {
    pub scanner: Scanner,
    pub store: Arc<InMemoryStore>,
    pub opener: Arc<RecordingOpener>,
    pub event_bus: EventBus,
}

/// Scanner with no delays over an empty in-memory store
pub fn harness() -> Harness {
    harness_with(
        RecordingOpener::new(),
        settings(Duration::ZERO, Duration::ZERO),
    )
}

pub fn harness_with(opener: Arc<RecordingOpener>, settings: ScannerSettings) -> Harness {
    let store = InMemoryStore::new();
    let event_bus = EventBus::new(100);
    let scanner = scanner_with(store.clone(), opener.clone(), event_bus.clone(), settings);
    Harness {
        scanner,
        store,
        opener,
        event_bus,
    }
}

/// Scanner over the given store with any page opener
pub fn scanner_with(
    store: Arc<InMemoryStore>,
    opener: Arc<dyn PageOpener>,
    event_bus: EventBus,
    settings: ScannerSettings,
) -> Scanner {
    let repository = NotionRepository::new(store, "Current box");
    Scanner::new(repository, opener, event_bus, settings)
}
