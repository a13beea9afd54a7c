use super::placeholders;

/// A column slot of an INSERT
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertColumn {
    Single(String),
    /// Tuple column bound as `(?,?,...)`
    Tuple(String, usize),
}

/// `INSERT INTO table (...) VALUES (...)`, optionally `JSON ?` and `IF NOT EXISTS`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertBuilder {
    table: String,
    columns: Vec<InsertColumn>,
    json: bool,
    unique: bool,
}

impl InsertBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            json: false,
            unique: false,
        }
    }

    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.columns.push(InsertColumn::Single(name.into()));
        self
    }

    pub fn tuple_column(mut self, name: impl Into<String>, n: usize) -> Self {
        self.columns.push(InsertColumn::Tuple(name.into(), n));
        self
    }

    /// Bind the whole row as a single JSON document; explicit columns are ignored
    pub fn json(mut self) -> Self {
        self.json = true;
        self
    }

    /// Turn the insert into a lightweight transaction (`IF NOT EXISTS`)
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn to_cql(&self) -> (String, Vec<String>) {
        let mut names = Vec::new();
        let mut text = if self.json {
            names.push("[json]".to_string());
            format!("INSERT INTO {} JSON ?", self.table)
        } else {
            let mut columns = Vec::with_capacity(self.columns.len());
            let mut holders = Vec::with_capacity(self.columns.len());
            for column in &self.columns {
                match column {
                    InsertColumn::Single(name) => {
                        columns.push(name.as_str());
                        holders.push("?".to_string());
                        names.push(name.clone());
                    }
                    InsertColumn::Tuple(name, n) => {
                        columns.push(name.as_str());
                        holders.push(format!("({})", placeholders(*n)));
                        names.extend(std::iter::repeat(name.clone()).take(*n));
                    }
                }
            }
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                self.table,
                columns.join(","),
                holders.join(",")
            )
        };
        if self.unique {
            text.push_str(" IF NOT EXISTS");
        }
        (text, names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_with_tuple() {
        let (text, names) = InsertBuilder::new("ks.t")
            .column("pk0")
            .tuple_column("col0", 2)
            .unique()
            .to_cql();
        assert_eq!(
            text,
            "INSERT INTO ks.t (pk0,col0) VALUES (?,(?,?)) IF NOT EXISTS"
        );
        assert_eq!(names, vec!["pk0", "col0", "col0"]);
    }

    #[test]
    fn test_insert_json() {
        let (text, names) = InsertBuilder::new("ks.t").json().to_cql();
        assert_eq!(text, "INSERT INTO ks.t JSON ?");
        assert_eq!(names.len(), 1);
    }
}
