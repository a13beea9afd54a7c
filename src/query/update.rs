use super::{placeholders, render_where, Relation};

/// One SET clause entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    /// `column=?`
    Value(String),
    /// `column=(?,?,...)`
    Tuple(String, usize),
    /// `column=<expression>`, nothing bound
    Literal(String, String),
}

/// `UPDATE table SET ... WHERE ...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateBuilder {
    table: String,
    set: Vec<Assignment>,
    relations: Vec<Relation>,
}

impl UpdateBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            set: Vec::new(),
            relations: Vec::new(),
        }
    }

    pub fn set(mut self, column: impl Into<String>) -> Self {
        self.set.push(Assignment::Value(column.into()));
        self
    }

    pub fn set_tuple(mut self, column: impl Into<String>, n: usize) -> Self {
        self.set.push(Assignment::Tuple(column.into(), n));
        self
    }

    pub fn set_lit(mut self, column: impl Into<String>, expr: impl Into<String>) -> Self {
        self.set.push(Assignment::Literal(column.into(), expr.into()));
        self
    }

    pub fn where_(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn to_cql(&self) -> (String, Vec<String>) {
        let mut names = Vec::new();
        let set: Vec<String> = self
            .set
            .iter()
            .map(|a| match a {
                Assignment::Value(column) => {
                    names.push(column.clone());
                    format!("{column}=?")
                }
                Assignment::Tuple(column, n) => {
                    names.extend(std::iter::repeat(column.clone()).take(*n));
                    format!("{column}=({})", placeholders(*n))
                }
                Assignment::Literal(column, expr) => format!("{column}={expr}"),
            })
            .collect();
        let text = format!(
            "UPDATE {} SET {}{}",
            self.table,
            set.join(","),
            render_where(&self.relations, &mut names)
        );
        (text, names)
    }
}
