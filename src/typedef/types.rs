//! Column types
//!
//! [`ColumnType`] is a closed sum over the kinds a column can have. Every
//! capability the statement engine needs (definition text, placeholder text,
//! pretty-printing, value generation, index eligibility, wire tag) is an
//! exhaustive `match`, so a new kind fails to compile until it is handled
//! everywhere.

use super::simple::SimpleType;
use super::value::Value;
use crate::schema::PartitionRangeConfig;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// CQL native protocol type option id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum WireType {
    Ascii = 0x0001,
    BigInt = 0x0002,
    Blob = 0x0003,
    Boolean = 0x0004,
    Counter = 0x0005,
    Decimal = 0x0006,
    Double = 0x0007,
    Float = 0x0008,
    Int = 0x0009,
    Timestamp = 0x000B,
    Uuid = 0x000C,
    Varchar = 0x000D,
    Varint = 0x000E,
    TimeUuid = 0x000F,
    Inet = 0x0010,
    Date = 0x0011,
    Time = 0x0012,
    SmallInt = 0x0013,
    TinyInt = 0x0014,
    Duration = 0x0015,
    Udt = 0x0030,
    Tuple = 0x0031,
}

impl WireType {
    pub fn id(self) -> u16 {
        self as u16
    }
}

/// Fixed-arity tuple of simple types, always frozen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TupleType {
    pub types: Vec<SimpleType>,
}

/// User-defined type, bound as a single frozen value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UdtType {
    pub type_name: String,
    pub fields: BTreeMap<String, SimpleType>,
}

impl UdtType {
    /// `CREATE TYPE` statement for this type in `keyspace`
    pub fn create_statement(&self, keyspace: &str) -> String {
        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|(name, t)| format!("{name} {}", t.name()))
            .collect();
        format!(
            "CREATE TYPE IF NOT EXISTS {keyspace}.{} ({})",
            self.type_name,
            fields.join(",")
        )
    }
}

/// Counter column; only ever incremented through a literal set-expression
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "type", rename_all = "lowercase")]
pub enum ColumnType {
    Simple(SimpleType),
    Tuple(TupleType),
    Udt(UdtType),
    Counter(CounterType),
}

impl From<SimpleType> for ColumnType {
    fn from(t: SimpleType) -> Self {
        ColumnType::Simple(t)
    }
}

impl ColumnType {
    pub fn name(&self) -> String {
        match self {
            ColumnType::Simple(t) => t.name().to_string(),
            ColumnType::Tuple(t) => format!("tuple<{}>", simple_names(&t.types)),
            ColumnType::Udt(t) => t.type_name.clone(),
            ColumnType::Counter(_) => "counter".to_string(),
        }
    }

    /// Type text used in column definitions
    pub fn cql_def(&self) -> String {
        match self {
            ColumnType::Udt(t) => format!("frozen<{}>", t.type_name),
            ColumnType::Simple(_) | ColumnType::Tuple(_) | ColumnType::Counter(_) => self.name(),
        }
    }

    /// Placeholder text bound for one value of this type
    pub fn cql_holder(&self) -> String {
        match self {
            ColumnType::Tuple(t) => format!("({})", vec!["?"; t.types.len()].join(",")),
            ColumnType::Simple(_) | ColumnType::Udt(_) | ColumnType::Counter(_) => "?".to_string(),
        }
    }

    /// Number of bound values one value of this type occupies
    pub fn len_value(&self) -> usize {
        match self {
            ColumnType::Tuple(t) => t.types.len(),
            ColumnType::Simple(_) | ColumnType::Udt(_) | ColumnType::Counter(_) => 1,
        }
    }

    /// Substitute the leading bound values into `query`
    ///
    /// Replaces the next [`len_value`](Self::len_value) placeholders with
    /// literals and returns the rewritten query and the number of values
    /// consumed. Stops early if `values` runs out.
    pub fn cql_pretty(&self, query: &str, values: &[Value]) -> (String, usize) {
        let take = self.len_value().min(values.len());
        let mut out = query.to_string();
        for v in &values[..take] {
            out = out.replacen('?', &v.to_cql_literal(), 1);
        }
        (out, take)
    }

    /// Random value for this type, flattened into its bound slots
    pub fn gen_value<R: Rng + ?Sized>(&self, rng: &mut R, p: &PartitionRangeConfig) -> Vec<Value> {
        match self {
            ColumnType::Simple(t) => vec![t.gen_value(rng, p)],
            ColumnType::Tuple(t) => t.types.iter().map(|t| t.gen_value(rng, p)).collect(),
            ColumnType::Udt(t) => {
                let fields = t
                    .fields
                    .iter()
                    .map(|(name, t)| (name.clone(), t.gen_value(rng, p)))
                    .collect();
                vec![Value::Udt(fields)]
            }
            ColumnType::Counter(_) => vec![Value::Counter(rng.gen_range(0..i64::from(u32::MAX)))],
        }
    }

    pub fn indexable(&self) -> bool {
        match self {
            ColumnType::Simple(t) => t.indexable(),
            ColumnType::Tuple(_) | ColumnType::Udt(_) | ColumnType::Counter(_) => false,
        }
    }

    pub fn wire_type(&self) -> WireType {
        match self {
            ColumnType::Simple(t) => t.wire_type(),
            ColumnType::Tuple(_) => WireType::Tuple,
            ColumnType::Udt(_) => WireType::Udt,
            ColumnType::Counter(_) => WireType::Counter,
        }
    }

    /// Whether the type may appear in a primary key
    pub fn is_key_eligible(&self) -> bool {
        match self {
            ColumnType::Simple(t) => t.is_key_eligible(),
            ColumnType::Tuple(_) | ColumnType::Udt(_) | ColumnType::Counter(_) => false,
        }
    }

    pub fn is_counter(&self) -> bool {
        matches!(self, ColumnType::Counter(_))
    }

    pub fn is_tuple(&self) -> bool {
        matches!(self, ColumnType::Tuple(_))
    }
}

fn simple_names(types: &[SimpleType]) -> String {
    types.iter().map(|t| t.name()).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn tuple() -> ColumnType {
        ColumnType::Tuple(TupleType {
            types: vec![SimpleType::Int, SimpleType::Text, SimpleType::Boolean],
        })
    }

    fn udt() -> ColumnType {
        let mut fields = BTreeMap::new();
        fields.insert("f0".to_string(), SimpleType::Int);
        fields.insert("f1".to_string(), SimpleType::Ascii);
        ColumnType::Udt(UdtType {
            type_name: "udt_7".to_string(),
            fields,
        })
    }

    #[test]
    fn test_definitions() {
        assert_eq!(ColumnType::Simple(SimpleType::BigInt).cql_def(), "bigint");
        assert_eq!(tuple().cql_def(), "tuple<int,text,boolean>");
        assert_eq!(udt().cql_def(), "frozen<udt_7>");
        assert_eq!(ColumnType::Counter(CounterType).cql_def(), "counter");
    }

    #[test]
    fn test_tuple_binds_multiple_slots() {
        let t = tuple();
        assert_eq!(t.cql_holder(), "(?,?,?)");
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(t.gen_value(&mut rng, &PartitionRangeConfig::default()).len(), 3);
    }

    #[test]
    fn test_udt_binds_single_value() {
        let mut rng = StdRng::seed_from_u64(6);
        let values = udt().gen_value(&mut rng, &PartitionRangeConfig::default());
        assert_eq!(values.len(), 1);
        assert!(matches!(&values[0], Value::Udt(f) if f.len() == 2));
    }

    #[test]
    fn test_pretty_consumes_len_value() {
        let (query, used) = tuple().cql_pretty(
            "INSERT INTO ks.t (c) VALUES ((?,?,?))",
            &[
                Value::Int(1),
                Value::Text("a".into()),
                Value::Boolean(true),
                Value::Int(9),
            ],
        );
        assert_eq!(used, 3);
        assert_eq!(query, "INSERT INTO ks.t (c) VALUES ((1,'a',true))");
    }

    #[test]
    fn test_pretty_stops_when_values_run_out() {
        let (query, used) = tuple().cql_pretty("(?,?,?)", &[Value::Int(1)]);
        assert_eq!(used, 1);
        assert_eq!(query, "(1,?,?)");
    }

    #[test]
    fn test_udt_create_statement() {
        assert_eq!(
            match udt() {
                ColumnType::Udt(u) => u.create_statement("ks1"),
                _ => unreachable!(),
            },
            "CREATE TYPE IF NOT EXISTS ks1.udt_7 (f0 int,f1 ascii)"
        );
    }

    #[test]
    fn test_serde_round_trip_shape() {
        let json = serde_json::to_value(ColumnType::Simple(SimpleType::Uuid)).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "simple", "type": "uuid"}));
    }

    #[test]
    fn test_wire_ids() {
        assert_eq!(ColumnType::Simple(SimpleType::Text).wire_type().id(), 0x000D);
        assert_eq!(tuple().wire_type().id(), 0x0031);
    }
}
