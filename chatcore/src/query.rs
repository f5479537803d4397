//! Builder for row selects against the hosted relational store's REST surface.

use crate::thread::ConversationPair;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

impl Order {
    fn suffix(self) -> &'static str {
        match self {
            Order::Ascending => "asc",
            Order::Descending => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Select {
    table: String,
    columns: String,
    params: Vec<(String, String)>,
}

impl Select {
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: "*".to_string(),
            params: Vec::new(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(mut self, columns: impl Into<String>) -> Self {
        self.columns = columns.into();
        self
    }

    pub fn eq(self, column: &str, value: impl AsRef<str>) -> Self {
        self.filter(column, "eq", value.as_ref())
    }

    pub fn neq(self, column: &str, value: impl AsRef<str>) -> Self {
        self.filter(column, "neq", value.as_ref())
    }

    /// Adds a raw `or=(...)` expression.
    pub fn or(mut self, expression: impl Into<String>) -> Self {
        self.params.push(("or".to_string(), expression.into()));
        self
    }

    pub fn order(mut self, column: &str, order: Order) -> Self {
        self.params
            .push(("order".to_string(), format!("{column}.{}", order.suffix())));
        self
    }

    fn filter(mut self, column: &str, op: &str, value: &str) -> Self {
        self.params.push((column.to_string(), format!("{op}.{value}")));
        self
    }

    /// Renders `table?select=..&filters..` with every value percent-encoded.
    pub fn to_path(&self) -> String {
        let mut path = format!(
            "{}?select={}",
            self.table,
            urlencoding::encode(&self.columns)
        );
        for (key, value) in &self.params {
            path.push('&');
            path.push_str(&urlencoding::encode(key));
            path.push('=');
            path.push_str(&urlencoding::encode(value));
        }
        path
    }
}

/// OR-combined filter admitting both directions of a conversation pair.
pub fn pair_filter(pair: &ConversationPair) -> String {
    format!(
        "(and(sender_id.eq.{me},receiver_id.eq.{contact}),and(sender_id.eq.{contact},receiver_id.eq.{me}))",
        me = pair.me,
        contact = pair.contact
    )
}
