//! CQL query builders
//!
//! Builders render a statement template with positional `?` placeholders and
//! return the bind-marker names in placeholder order, so a statement's values
//! can be checked against the text that binds them.
//!
//! ```
//! use cql_twin::query::{Query, Relation, SelectBuilder};
//!
//! let query = Query::Select(
//!     SelectBuilder::new("ks1.table1")
//!         .where_(Relation::eq("pk0"))
//!         .where_(Relation::in_tuple("pk1", 2)),
//! );
//! let (text, names) = query.to_cql();
//! assert_eq!(text, "SELECT * FROM ks1.table1 WHERE pk0=? AND pk1 IN (?,?)");
//! assert_eq!(names, vec!["pk0", "pk1", "pk1"]);
//! ```

mod delete;
mod insert;
mod select;
mod update;

pub use delete::DeleteBuilder;
pub use insert::{InsertBuilder, InsertColumn};
pub use select::SelectBuilder;
pub use update::{Assignment, UpdateBuilder};

/// A renderable statement template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Insert(InsertBuilder),
    Update(UpdateBuilder),
    Delete(DeleteBuilder),
    Select(SelectBuilder),
    /// Schema statement text with no bind markers
    Raw(String),
}

impl Query {
    /// Statement text and the bind-marker names in placeholder order
    pub fn to_cql(&self) -> (String, Vec<String>) {
        match self {
            Query::Insert(b) => b.to_cql(),
            Query::Update(b) => b.to_cql(),
            Query::Delete(b) => b.to_cql(),
            Query::Select(b) => b.to_cql(),
            Query::Raw(stmt) => (stmt.clone(), Vec::new()),
        }
    }
}

/// Comparison operator of a WHERE relation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    Eq,
    Lt,
    LtOrEq,
    Gt,
    GtOrEq,
    /// `IN` with the given number of placeholders
    In(usize),
}

/// One `column <op> ?` relation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub column: String,
    pub cmp: Cmp,
}

impl Relation {
    pub fn new(column: impl Into<String>, cmp: Cmp) -> Self {
        Self {
            column: column.into(),
            cmp,
        }
    }

    pub fn eq(column: impl Into<String>) -> Self {
        Self::new(column, Cmp::Eq)
    }

    pub fn lt(column: impl Into<String>) -> Self {
        Self::new(column, Cmp::Lt)
    }

    pub fn lt_or_eq(column: impl Into<String>) -> Self {
        Self::new(column, Cmp::LtOrEq)
    }

    pub fn gt(column: impl Into<String>) -> Self {
        Self::new(column, Cmp::Gt)
    }

    pub fn gt_or_eq(column: impl Into<String>) -> Self {
        Self::new(column, Cmp::GtOrEq)
    }

    pub fn in_tuple(column: impl Into<String>, n: usize) -> Self {
        Self::new(column, Cmp::In(n))
    }

    fn render(&self, names: &mut Vec<String>) -> String {
        let op = match self.cmp {
            Cmp::Eq => "=",
            Cmp::Lt => "<",
            Cmp::LtOrEq => "<=",
            Cmp::Gt => ">",
            Cmp::GtOrEq => ">=",
            Cmp::In(n) => {
                names.extend(std::iter::repeat(self.column.clone()).take(n));
                return format!("{} IN ({})", self.column, placeholders(n));
            }
        };
        names.push(self.column.clone());
        format!("{}{op}?", self.column)
    }
}

/// Render ` WHERE a=? AND b>?`, or nothing for an empty relation list
pub(crate) fn render_where(relations: &[Relation], names: &mut Vec<String>) -> String {
    if relations.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = relations.iter().map(|r| r.render(names)).collect();
    format!(" WHERE {}", parts.join(" AND "))
}

pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(",")
}
