//! In-memory `RemoteStoreTrait` used by repository and API tests.
//!
//! Evaluates the subset of the query grammar the repositories emit, and
//! records every query so tests can assert on what would hit the wire.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::errors::{StoreError, StoreResult};
use crate::query::{Direction, Filter, InsertQuery, SelectQuery};
use crate::store::{RemoteStoreTrait, StoreProviderTrait};
use companions_core::identity::IdentityResolverTrait;

const EMBED_SUFFIX: &str = "(*)";

#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    selects: Mutex<Vec<SelectQuery>>,
    inserts: Mutex<Vec<InsertQuery>>,
    failure: Option<String>,
    empty_inserts: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with a store error carrying `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Inserts succeed but hand back no rows.
    pub fn returning_nothing() -> Self {
        Self {
            empty_inserts: true,
            ..Self::default()
        }
    }

    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    pub fn selects(&self) -> Vec<SelectQuery> {
        self.selects.lock().unwrap().clone()
    }

    pub fn inserts(&self) -> Vec<InsertQuery> {
        self.inserts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.selects.lock().unwrap().len() + self.inserts.lock().unwrap().len()
    }

    fn check_failure(&self) -> StoreResult<()> {
        match &self.failure {
            Some(message) => Err(StoreError::Api {
                status: 500,
                message: message.clone(),
                code: None,
                details: None,
                hint: None,
            }),
            None => Ok(()),
        }
    }
}

/// SQL LIKE with `%` and `_`, compared case-insensitively.
fn like(pattern: &[char], text: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some((&'%', rest)) => (0..=text.len()).any(|i| like(rest, &text[i..])),
        Some((&'_', rest)) => !text.is_empty() && like(rest, &text[1..]),
        Some((c, rest)) => match text.split_first() {
            Some((t, text_rest)) => c.eq_ignore_ascii_case(t) && like(rest, text_rest),
            None => false,
        },
    }
}

fn column_text(row: &Value, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn matches(filter: &Filter, row: &Value) -> bool {
    match filter {
        Filter::Eq { column, value } => column_text(row, column).as_deref() == Some(value.as_str()),
        Filter::ILike { column, pattern } => column_text(row, column)
            .map(|text| {
                let pattern: Vec<char> = pattern.chars().collect();
                let text: Vec<char> = text.chars().collect();
                like(&pattern, &text)
            })
            .unwrap_or(false),
        Filter::Or(filters) => filters.iter().any(|f| matches(f, row)),
    }
}

/// Parses `alias:fk_column(*)`.
fn embed_spec(columns: &str) -> Option<(&str, &str)> {
    let spec = columns.strip_suffix(EMBED_SUFFIX)?;
    spec.split_once(':')
}

#[async_trait]
impl RemoteStoreTrait for InMemoryStore {
    async fn select(&self, query: &SelectQuery) -> StoreResult<Vec<Value>> {
        self.selects.lock().unwrap().push(query.clone());
        self.check_failure()?;

        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<Value> = tables
            .get(query.table_name())
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|row| query.filters().iter().all(|f| matches(f, row)))
            .collect();

        for order in query.orders().iter().rev() {
            rows.sort_by(|a, b| {
                let ordering = column_text(a, &order.column).cmp(&column_text(b, &order.column));
                match order.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }

        let (offset, count) = query.window();
        let rows = rows
            .into_iter()
            .skip(offset as usize)
            .take(count.map(|c| c as usize).unwrap_or(usize::MAX));

        let rows = match embed_spec(query.columns()) {
            Some((alias, fk_column)) => {
                let targets = tables.get(alias).cloned().unwrap_or_default();
                rows.map(|row| {
                    let key = column_text(&row, fk_column);
                    let embedded = targets
                        .iter()
                        .find(|t| key.is_some() && column_text(t, "id") == key)
                        .cloned()
                        .unwrap_or(Value::Null);
                    let mut object = Map::new();
                    object.insert(alias.to_string(), embedded);
                    Value::Object(object)
                })
                .collect()
            }
            None => rows.collect(),
        };
        Ok(rows)
    }

    async fn insert(&self, query: &InsertQuery) -> StoreResult<Vec<Value>> {
        self.inserts.lock().unwrap().push(query.clone());
        self.check_failure()?;
        if self.empty_inserts {
            return Ok(Vec::new());
        }

        let mut tables = self.tables.lock().unwrap();
        let table = tables.entry(query.table_name().to_string()).or_default();
        let mut inserted = Vec::new();
        for row in query.rows() {
            let mut row = row.clone();
            let n = table.len() + 1;
            if let Value::Object(object) = &mut row {
                object
                    .entry("id")
                    .or_insert_with(|| json!(format!("{}-{}", query.table_name(), n)));
                object
                    .entry("created_at")
                    .or_insert_with(|| json!(format!("2025-01-01T00:00:{:02}+00:00", n % 60)));
            }
            table.push(row.clone());
            inserted.push(row);
        }
        Ok(inserted)
    }
}

/// Every caller shares the same tables.
impl StoreProviderTrait for Arc<InMemoryStore> {
    fn store_for(&self, _identity: Arc<dyn IdentityResolverTrait>) -> Arc<dyn RemoteStoreTrait> {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_like_matching() {
        assert!(like(&chars("%maths%"), &chars("Applied Maths")));
        assert!(like(&chars("a_c"), &chars("ABC")));
        assert!(!like(&chars("%maths%"), &chars("science")));
        assert!(like(&chars("%"), &chars("")));
    }
}
