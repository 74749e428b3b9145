//! Fluent query builder for PostgREST-style stores.
//!
//! Queries are plain values: repositories build them, the client renders
//! them to URL parameters, and tests inspect them directly.

use std::fmt;

use serde_json::Value;

/// A row filter. Top-level filters are AND-ed together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Eq { column: String, value: String },
    /// Case-insensitive pattern match; `%` matches any run of characters.
    ILike { column: String, pattern: String },
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn ilike(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Filter::ILike {
            column: column.into(),
            pattern: pattern.into(),
        }
    }

    /// Case-insensitive partial match: `column ILIKE '%needle%'`.
    pub fn contains(column: impl Into<String>, needle: &str) -> Self {
        Filter::ilike(column, format!("%{}%", needle))
    }

    pub fn any(filters: Vec<Filter>) -> Self {
        Filter::Or(filters)
    }

    /// Renders the filter as a URL parameter `(key, value)`.
    pub fn to_param(&self) -> (String, String) {
        match self {
            Filter::Eq { column, value } => (column.clone(), format!("eq.{}", value)),
            Filter::ILike { column, pattern } => (column.clone(), format!("ilike.{}", pattern)),
            Filter::Or(filters) => ("or".to_string(), logic_tree(filters)),
        }
    }

    /// Renders the filter inside a logic tree, e.g. `name.ilike.%x%`.
    fn to_nested(&self) -> String {
        match self {
            Filter::Eq { column, value } => format!("{}.eq.{}", column, quote_nested(value)),
            Filter::ILike { column, pattern } => {
                format!("{}.ilike.{}", column, quote_nested(pattern))
            }
            Filter::Or(filters) => format!("or{}", logic_tree(filters)),
        }
    }
}

fn logic_tree(filters: &[Filter]) -> String {
    let parts: Vec<String> = filters.iter().map(Filter::to_nested).collect();
    format!("({})", parts.join(","))
}

/// Double-quotes values holding whitespace or characters reserved by the
/// logic tree grammar.
fn quote_nested(value: &str) -> String {
    const RESERVED: [char; 6] = [',', '(', ')', '.', ':', '"'];
    if !value.contains(|c: char| RESERVED.contains(&c) || c == '\\' || c.is_whitespace()) {
        return value.to_string();
    }
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// SQL-like rendering, used in logs.
impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Eq { column, value } => write!(f, "{} = {}", column, sql_literal(value)),
            Filter::ILike { column, pattern } => {
                write!(f, "{} ILIKE {}", column, sql_literal(pattern))
            }
            Filter::Or(filters) => {
                let parts: Vec<String> = filters.iter().map(ToString::to_string).collect();
                write!(f, "({})", parts.join(" OR "))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

impl Order {
    fn to_param(&self) -> String {
        let direction = match self.direction {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        };
        format!("{}.{}", self.column, direction)
    }
}

/// Strips whitespace outside double quotes, so `a:fk (*)` becomes `a:fk(*)`.
fn clean_columns(columns: &str) -> String {
    let mut quoted = false;
    columns
        .chars()
        .filter(|c| {
            if *c == '"' {
                quoted = !quoted;
            }
            quoted || !c.is_whitespace()
        })
        .collect()
}

/// A read against one table, with optional embedded joins in `columns`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectQuery {
    table: String,
    columns: String,
    filters: Vec<Filter>,
    order: Vec<Order>,
    range: Option<(u64, u64)>,
    limit: Option<u64>,
}

impl SelectQuery {
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: "*".to_string(),
            filters: Vec::new(),
            order: Vec::new(),
            range: None,
            limit: None,
        }
    }

    /// Column list, including join-selects such as `alias:fk(*)`.
    pub fn select(mut self, columns: &str) -> Self {
        self.columns = clean_columns(columns);
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn eq(self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter(Filter::eq(column, value))
    }

    pub fn ilike(self, column: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.filter(Filter::ilike(column, pattern))
    }

    pub fn or(self, filters: Vec<Filter>) -> Self {
        self.filter(Filter::any(filters))
    }

    pub fn order(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order.push(Order {
            column: column.into(),
            direction,
        });
        self
    }

    /// Inclusive row range. Overrides `limit`.
    pub fn range(mut self, from: u64, to: u64) -> Self {
        self.range = Some((from, to.max(from)));
        self
    }

    pub fn limit(mut self, count: u64) -> Self {
        self.limit = Some(count);
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &str {
        &self.columns
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn orders(&self) -> &[Order] {
        &self.order
    }

    pub fn row_range(&self) -> Option<(u64, u64)> {
        self.range
    }

    /// Offset and row count the query resolves to.
    pub fn window(&self) -> (u64, Option<u64>) {
        match (self.range, self.limit) {
            (Some((from, to)), _) => (from, Some(to - from + 1)),
            (None, Some(limit)) => (0, Some(limit)),
            (None, None) => (0, None),
        }
    }

    /// `WHERE` clause equivalent of the filters, e.g. for logs.
    pub fn where_clause(&self) -> Option<String> {
        if self.filters.is_empty() {
            return None;
        }
        let parts: Vec<String> = self.filters.iter().map(ToString::to_string).collect();
        Some(parts.join(" AND "))
    }

    /// URL parameters in PostgREST form.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), self.columns.clone())];
        pairs.extend(self.filters.iter().map(Filter::to_param));
        if !self.order.is_empty() {
            let order: Vec<String> = self.order.iter().map(Order::to_param).collect();
            pairs.push(("order".to_string(), order.join(",")));
        }
        let (offset, count) = self.window();
        if self.range.is_some() {
            pairs.push(("offset".to_string(), offset.to_string()));
        }
        if let Some(count) = count {
            pairs.push(("limit".to_string(), count.to_string()));
        }
        pairs
    }
}

impl fmt::Display for SelectQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT {} FROM {}", self.columns, self.table)?;
        if let Some(clause) = self.where_clause() {
            write!(f, " WHERE {}", clause)?;
        }
        if !self.order.is_empty() {
            let order: Vec<String> = self.order.iter().map(Order::to_param).collect();
            write!(f, " ORDER BY {}", order.join(", "))?;
        }
        match self.window() {
            (offset, Some(count)) => write!(f, " OFFSET {} LIMIT {}", offset, count),
            _ => Ok(()),
        }
    }
}

/// An insert of one or more rows, returning the stored representation.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertQuery {
    table: String,
    rows: Vec<Value>,
    returning: String,
}

impl InsertQuery {
    pub fn new(table: impl Into<String>, rows: Vec<Value>) -> Self {
        Self {
            table: table.into(),
            rows,
            returning: "*".to_string(),
        }
    }

    pub fn returning(mut self, columns: &str) -> Self {
        self.returning = clean_columns(columns);
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn rows(&self) -> &[Value] {
        &self.rows
    }

    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        vec![("select".to_string(), self.returning.clone())]
    }
}
