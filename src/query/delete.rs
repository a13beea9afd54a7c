use super::{render_where, Relation};

/// `DELETE FROM table WHERE ...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteBuilder {
    table: String,
    relations: Vec<Relation>,
}

impl DeleteBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            relations: Vec::new(),
        }
    }

    pub fn where_(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn to_cql(&self) -> (String, Vec<String>) {
        let mut names = Vec::new();
        let text = format!(
            "DELETE FROM {}{}",
            self.table,
            render_where(&self.relations, &mut names)
        );
        (text, names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_range() {
        let (text, _) = DeleteBuilder::new("ks.t")
            .where_(Relation::eq("pk0"))
            .where_(Relation::gt_or_eq("ck0"))
            .where_(Relation::lt_or_eq("ck0"))
            .to_cql();
        assert_eq!(text, "DELETE FROM ks.t WHERE pk0=? AND ck0>=? AND ck0<=?");
    }
}
