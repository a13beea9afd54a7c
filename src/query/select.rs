use super::{render_where, Relation};

/// `SELECT * FROM table WHERE ... [ALLOW FILTERING]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectBuilder {
    table: String,
    relations: Vec<Relation>,
    allow_filtering: bool,
}

impl SelectBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            relations: Vec::new(),
            allow_filtering: false,
        }
    }

    pub fn where_(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn allow_filtering(mut self) -> Self {
        self.allow_filtering = true;
        self
    }

    pub fn to_cql(&self) -> (String, Vec<String>) {
        let mut names = Vec::new();
        let mut text = format!(
            "SELECT * FROM {}{}",
            self.table,
            render_where(&self.relations, &mut names)
        );
        if self.allow_filtering {
            text.push_str(" ALLOW FILTERING");
        }
        (text, names)
    }
}
