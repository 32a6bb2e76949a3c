//! PostgREST query builder.
//!
//! Builds the query-string half of a row request: column selection,
//! horizontal filters, ordering and limits. Filter values are rendered in
//! PostgREST operator syntax (`col=eq.value`, `col=is.null`, `or=(...)`).

use std::fmt::Display;

/// A filtered, ordered view over one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    table: String,
    select: String,
    params: Vec<(String, String)>,
    order: Vec<String>,
    limit: Option<u64>,
}

impl Query {
    /// Start a query over `table`, selecting every column.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            select: "*".to_string(),
            params: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    /// Table name.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Restrict the selected columns.
    #[must_use]
    pub fn select(mut self, columns: impl Into<String>) -> Self {
        self.select = columns.into();
        self
    }

    /// `column = value`.
    #[must_use]
    pub fn eq(self, column: &str, value: impl Display) -> Self {
        self.filter(column, format!("eq.{value}"))
    }

    /// `column <> value`.
    #[must_use]
    pub fn neq(self, column: &str, value: impl Display) -> Self {
        self.filter(column, format!("neq.{value}"))
    }

    /// `column > value`.
    #[must_use]
    pub fn gt(self, column: &str, value: impl Display) -> Self {
        self.filter(column, format!("gt.{value}"))
    }

    /// `column IS NULL`.
    #[must_use]
    pub fn is_null(self, column: &str) -> Self {
        self.filter(column, "is.null".to_string())
    }

    /// `column IS NOT NULL`.
    #[must_use]
    pub fn not_null(self, column: &str) -> Self {
        self.filter(column, "not.is.null".to_string())
    }

    /// `column IN (values...)`.
    #[must_use]
    pub fn in_list<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Display,
    {
        let joined = values
            .into_iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.filter(column, format!("in.({joined})"))
    }

    /// Disjunction of raw PostgREST conditions, e.g. `expiry_date.is.null`.
    #[must_use]
    pub fn or<I, S>(mut self, conditions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = conditions
            .into_iter()
            .map(|c| c.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.params.push(("or".to_string(), format!("({joined})")));
        self
    }

    /// Order ascending by a column.
    #[must_use]
    pub fn order_asc(mut self, column: &str) -> Self {
        self.order.push(format!("{column}.asc"));
        self
    }

    /// Order descending by a column.
    #[must_use]
    pub fn order_desc(mut self, column: &str) -> Self {
        self.order.push(format!("{column}.desc"));
        self
    }

    /// Return at most `limit` rows.
    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether any horizontal filter is present.
    #[must_use]
    pub fn has_filters(&self) -> bool {
        !self.params.is_empty()
    }

    fn filter(mut self, column: &str, expr: String) -> Self {
        self.params.push((column.to_string(), expr));
        self
    }

    /// Query pairs for a read request.
    #[must_use]
    pub fn read_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), self.select.clone())];
        pairs.extend(self.filter_pairs());
        if !self.order.is_empty() {
            pairs.push(("order".to_string(), self.order.join(",")));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs
    }

    /// Query pairs for an update or delete; only filters apply.
    #[must_use]
    pub fn filter_pairs(&self) -> Vec<(String, String)> {
        self.params.clone()
    }
}
