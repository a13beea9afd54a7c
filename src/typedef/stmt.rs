//! Generated statements

use super::types::ColumnType;
use super::value::{ValueWithToken, Values};
use crate::query::Query;

/// Statement shape, used by the executor to pick execution semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementType {
    Select,
    SelectRange,
    SelectByIndex,
    SelectFromMaterializedView,
    Delete,
    Insert,
    InsertJson,
    Update,
    AlterColumn,
    DropColumn,
    AddColumn,
}

impl StatementType {
    pub const ALL: [StatementType; 11] = [
        StatementType::Select,
        StatementType::SelectRange,
        StatementType::SelectByIndex,
        StatementType::SelectFromMaterializedView,
        StatementType::Delete,
        StatementType::Insert,
        StatementType::InsertJson,
        StatementType::Update,
        StatementType::AlterColumn,
        StatementType::DropColumn,
        StatementType::AddColumn,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StatementType::Select => "SelectStatement",
            StatementType::SelectRange => "SelectRangeStatement",
            StatementType::SelectByIndex => "SelectByIndexStatement",
            StatementType::SelectFromMaterializedView => "SelectFromMaterializedViewStatement",
            StatementType::Delete => "DeleteStatement",
            StatementType::Insert => "InsertStatement",
            StatementType::InsertJson => "InsertJSONStatement",
            StatementType::Update => "UpdateStatement",
            StatementType::AlterColumn => "AlterColumnStatement",
            StatementType::DropColumn => "DropColumnStatement",
            StatementType::AddColumn => "AddColumnStatement",
        }
    }

    /// Reads served by eventually consistent structures
    ///
    /// Secondary indexes and materialized views may legitimately lag behind
    /// the base table, so diverging results for these are best-effort.
    pub fn possible_async_operation(self) -> bool {
        match self {
            StatementType::SelectByIndex | StatementType::SelectFromMaterializedView => true,
            StatementType::Select
            | StatementType::SelectRange
            | StatementType::Delete
            | StatementType::Insert
            | StatementType::InsertJson
            | StatementType::Update
            | StatementType::AlterColumn
            | StatementType::DropColumn
            | StatementType::AddColumn => false,
        }
    }

    pub fn is_ddl(self) -> bool {
        matches!(
            self,
            StatementType::AlterColumn | StatementType::DropColumn | StatementType::AddColumn
        )
    }
}

impl std::fmt::Display for StatementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prebuilt per-table statement templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementCacheType {
    Insert,
    InsertIfNotExists,
    Update,
    Delete,
}

impl StatementCacheType {
    pub const ALL: [StatementCacheType; 4] = [
        StatementCacheType::Insert,
        StatementCacheType::InsertIfNotExists,
        StatementCacheType::Update,
        StatementCacheType::Delete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StatementCacheType::Insert => "CacheInsert",
            StatementCacheType::InsertIfNotExists => "CacheInsertIfNotExists",
            StatementCacheType::Update => "CacheUpdate",
            StatementCacheType::Delete => "CacheDelete",
        }
    }

    /// Position in a `[StmtCache; 4]`
    pub fn index(self) -> usize {
        match self {
            StatementCacheType::Insert => 0,
            StatementCacheType::InsertIfNotExists => 1,
            StatementCacheType::Update => 2,
            StatementCacheType::Delete => 3,
        }
    }
}

/// Query template and type list shared by every statement of one cache type
#[derive(Debug, Clone, PartialEq)]
pub struct StmtCache {
    pub query: Query,
    pub types: Vec<ColumnType>,
    pub query_type: StatementType,
    /// Number of bound values the template expects
    pub len_value: usize,
}

/// A generated statement ready for execution
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub query: Query,
    pub values: Values,
    /// One entry per bound column, in value order; tuple entries cover several values
    pub types: Vec<ColumnType>,
    pub query_type: StatementType,
    /// The partition this statement targets; `None` for multi-partition reads and DDL
    pub value_with_token: Option<ValueWithToken>,
    /// Tokens this statement took ownership of; each must be released once after execution
    pub leased_tokens: Vec<u64>,
}

impl Stmt {
    pub fn new(query: Query, query_type: StatementType) -> Self {
        Self {
            query,
            values: Vec::new(),
            types: Vec::new(),
            query_type,
            value_with_token: None,
            leased_tokens: Vec::new(),
        }
    }

    /// Schema statement without bound values
    pub fn raw(stmt: impl Into<String>, query_type: StatementType) -> Self {
        Self::new(Query::Raw(stmt.into()), query_type)
    }

    pub fn with_values(mut self, values: Values, types: Vec<ColumnType>) -> Self {
        self.values = values;
        self.types = types;
        self
    }

    /// Statement text and bind-marker names
    pub fn to_cql(&self) -> (String, Vec<String>) {
        self.query.to_cql()
    }

    /// The statement with every bound value substituted as a CQL literal
    pub fn pretty_cql(&self) -> String {
        let (mut query, _) = self.query.to_cql();
        let mut values: &[crate::typedef::Value] = &self.values;
        if values.is_empty() {
            return query;
        }
        for typ in &self.types {
            let (rendered, replaced) = typ.cql_pretty(&query, values);
            query = rendered;
            if values.len() >= replaced {
                values = &values[replaced..];
            } else {
                break;
            }
        }
        query
    }
}
