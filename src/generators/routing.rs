//! Partition tokens
//!
//! A token identifies the partition a set of partition-key values lands in.
//! Values are serialized into the composite routing-key layout used by CQL
//! drivers and hashed with xxh3. Single-component keys are the raw
//! serialized bytes. Composite keys concatenate, per component, a big-endian
//! `u16` length, the bytes and a `0x00` terminator.

use crate::schema::ColumnDef;
use crate::typedef::{ColumnType, Value};
use xxhash_rust::xxh3::xxh3_64;

/// Token derivation for one table's partition key
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingKey {
    types: Vec<ColumnType>,
}

impl RoutingKey {
    pub fn new(types: Vec<ColumnType>) -> Self {
        Self { types }
    }

    pub fn for_partition_keys(partition_keys: &[ColumnDef]) -> Self {
        Self::new(partition_keys.iter().map(|c| c.column_type.clone()).collect())
    }

    /// Routing-key bytes for flattened partition-key `values`
    pub fn serialize(&self, values: &[Value]) -> Vec<u8> {
        let mut components = Vec::with_capacity(self.types.len());
        let mut rest = values;
        for typ in &self.types {
            let take = typ.len_value().min(rest.len());
            let bytes: Vec<u8> = rest[..take].iter().flat_map(Value::to_bytes).collect();
            components.push(bytes);
            rest = &rest[take..];
        }

        if components.len() == 1 {
            return components.pop().unwrap_or_default();
        }
        let mut out = Vec::new();
        for c in &components {
            // Components past the u16 limit keep a saturated length prefix.
            let len = u16::try_from(c.len()).unwrap_or(u16::MAX);
            out.extend_from_slice(&len.to_be_bytes());
            out.extend_from_slice(c);
            out.push(0);
        }
        out
    }

    pub fn token(&self, values: &[Value]) -> u64 {
        xxh3_64(&self.serialize(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typedef::SimpleType;

    #[test]
    fn test_single_component_is_raw() {
        let key = RoutingKey::new(vec![SimpleType::Int.into()]);
        assert_eq!(key.serialize(&[Value::Int(1)]), vec![0, 0, 0, 1]);
    }

    #[test]
    fn test_composite_layout() {
        let key = RoutingKey::new(vec![SimpleType::TinyInt.into(), SimpleType::Text.into()]);
        assert_eq!(
            key.serialize(&[Value::TinyInt(5), Value::Text("ab".into())]),
            vec![0, 1, 5, 0, 0, 2, b'a', b'b', 0]
        );
    }

    #[test]
    fn test_oversized_component_length_saturates() {
        let key = RoutingKey::new(vec![SimpleType::Blob.into(), SimpleType::TinyInt.into()]);
        let bytes = key.serialize(&[Value::Blob(vec![7; 70_000]), Value::TinyInt(1)]);
        assert_eq!(bytes[..2], [0xff, 0xff]);
        assert_eq!(bytes.len(), 2 + 70_000 + 1 + 2 + 1 + 1);
        assert_eq!(bytes[bytes.len() - 4..], [0, 1, 1, 0]);
    }

    #[test]
    fn test_token_is_deterministic() {
        let key = RoutingKey::new(vec![SimpleType::BigInt.into(), SimpleType::Int.into()]);
        let values = [Value::BigInt(10), Value::Int(3)];
        assert_eq!(key.token(&values), key.token(&values));
        assert_ne!(key.token(&values), key.token(&[Value::BigInt(10), Value::Int(4)]));
    }
}
