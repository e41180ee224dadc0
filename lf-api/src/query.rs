//! Row queries against the hosted tables.
//!
//! A [`Query`] renders to PostgREST query parameters for the HTTP client and
//! can also be evaluated directly against JSON rows by the in-memory backend.

use std::cmp::Ordering;

use serde_json::Value;

/// A single row filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column = value`
    Eq(String, String),
    /// `column >= value`
    Gte(String, String),
    /// `column <= value`
    Lte(String, String),
    /// Case-insensitive substring match on any of the columns.
    AnyILike(Vec<String>, String),
}

impl Filter {
    /// Render as a `(key, value)` query parameter.
    pub fn to_param(&self) -> (String, String) {
        match self {
            Filter::Eq(col, v) => (col.clone(), format!("eq.{v}")),
            Filter::Gte(col, v) => (col.clone(), format!("gte.{v}")),
            Filter::Lte(col, v) => (col.clone(), format!("lte.{v}")),
            Filter::AnyILike(cols, term) => {
                let pattern = quote_or_value(&format!("*{term}*"));
                let parts: Vec<String> = cols
                    .iter()
                    .map(|c| format!("{c}.ilike.{pattern}"))
                    .collect();
                ("or".to_string(), format!("({})", parts.join(",")))
            }
        }
    }

    /// Evaluate the filter against a JSON row.
    pub fn matches(&self, row: &Value) -> bool {
        match self {
            Filter::Eq(col, v) => cell(row, col).is_some_and(|c| c == *v),
            Filter::Gte(col, v) => {
                cell(row, col).is_some_and(|c| c.as_str().cmp(v.as_str()) != Ordering::Less)
            }
            Filter::Lte(col, v) => cell(row, col)
                .is_some_and(|c| c.as_str().cmp(v.as_str()) != Ordering::Greater),
            Filter::AnyILike(cols, term) => {
                let needle = term.to_lowercase();
                cols.iter().any(|col| {
                    cell(row, col).is_some_and(|c| c.to_lowercase().contains(&needle))
                })
            }
        }
    }
}

/// Values inside `or=(...)` must be double-quoted when they contain
/// PostgREST reserved characters.
fn quote_or_value(raw: &str) -> String {
    let escaped = raw.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// Column value as a comparable string. `null` and missing cells are `None`.
fn cell(row: &Value, col: &str) -> Option<String> {
    match row.get(col)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Sort order on one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub descending: bool,
}

impl Order {
    fn to_param(&self) -> String {
        let dir = if self.descending { "desc" } else { "asc" };
        format!("{}.{dir}", self.column)
    }
}

/// A filtered, ordered and limited selection from one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: String,
    pub select: Option<String>,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    /// Start a query on `table` selecting all columns.
    pub fn table(table: &str) -> Self {
        Self {
            table: table.to_string(),
            select: None,
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Restrict the returned columns (PostgREST `select=`).
    pub fn select(mut self, columns: &str) -> Self {
        self.select = Some(columns.to_string());
        self
    }

    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters.push(Filter::Eq(column.to_string(), value.to_string()));
        self
    }

    pub fn gte(mut self, column: &str, value: impl ToString) -> Self {
        self.filters.push(Filter::Gte(column.to_string(), value.to_string()));
        self
    }

    pub fn lte(mut self, column: &str, value: impl ToString) -> Self {
        self.filters.push(Filter::Lte(column.to_string(), value.to_string()));
        self
    }

    /// Case-insensitive substring match over any of `columns`.
    pub fn ilike_any(mut self, columns: &[&str], term: &str) -> Self {
        self.filters.push(Filter::AnyILike(
            columns.iter().map(|c| c.to_string()).collect(),
            term.to_string(),
        ));
        self
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            descending: true,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Render as PostgREST query parameters.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![(
            "select".to_string(),
            self.select.clone().unwrap_or_else(|| "*".to_string()),
        )];
        params.extend(self.filters.iter().map(Filter::to_param));
        if let Some(order) = &self.order {
            params.push(("order".to_string(), order.to_param()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }

    /// Filter parameters only, for PATCH and DELETE targets.
    pub fn filter_params(&self) -> Vec<(String, String)> {
        self.filters.iter().map(Filter::to_param).collect()
    }

    /// Whether every filter matches the row.
    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }

    /// Apply filters, order and limit to a set of rows.
    pub fn apply<'a>(&self, rows: impl IntoIterator<Item = &'a Value>) -> Vec<Value> {
        let mut out: Vec<Value> = rows.into_iter().filter(|r| self.matches(r)).cloned().collect();
        if let Some(order) = &self.order {
            out.sort_by(|a, b| {
                let ord = cell(a, &order.column).cmp(&cell(b, &order.column));
                if order.descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }
        if let Some(limit) = self.limit {
            out.truncate(limit);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_params_rendering() {
        let q = Query::table("lost_items")
            .eq("status", "reported")
            .gte("date", "2024-01-01")
            .order_desc("created_at")
            .limit(5);
        assert_eq!(
            q.to_params(),
            vec![
                ("select".to_string(), "*".to_string()),
                ("status".to_string(), "eq.reported".to_string()),
                ("date".to_string(), "gte.2024-01-01".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
                ("limit".to_string(), "5".to_string()),
            ]
        );
    }

    #[test]
    fn test_or_rendering_quotes_term() {
        let q = Query::table("found_items").ilike_any(&["name", "location"], "gate, \"B\"");
        let (key, value) = q.filter_params().remove(0);
        assert_eq!(key, "or");
        assert_eq!(
            value,
            r#"(name.ilike."*gate, \"B\"*",location.ilike."*gate, \"B\"*")"#
        );
    }

    #[test]
    fn test_in_memory_evaluation() {
        let rows = vec![
            json!({"id": "1", "name": "Black Umbrella", "date": "2024-03-01", "created_at": "2024-03-01T00:00:00+00:00"}),
            json!({"id": "2", "name": "Phone", "date": "2024-03-10", "created_at": "2024-03-10T00:00:00+00:00"}),
            json!({"id": "3", "name": "umbrella stand", "date": "2024-04-02", "created_at": "2024-04-02T00:00:00+00:00"}),
        ];
        let q = Query::table("t")
            .ilike_any(&["name"], "UMBRELLA")
            .lte("date", "2024-03-31")
            .order_desc("created_at");
        let out = q.apply(&rows);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["id"], "1");

        let all = Query::table("t").order_desc("created_at").limit(2).apply(&rows);
        assert_eq!(all[0]["id"], "3");
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_null_cells_never_match() {
        let row = json!({"user_id": null, "id": 4});
        assert!(!Filter::Eq("user_id".into(), "null".into()).matches(&row));
        assert!(Filter::Eq("id".into(), "4".into()).matches(&row));
    }
}
