//! Simple scalar CQL types

use super::random::{
    rand_bytes, rand_date, rand_duration, rand_int_range, rand_ipv4, rand_string, rand_time,
    rand_time_uuid, rand_timestamp, rand_uuid,
};
use super::value::Value;
use super::WireType;
use crate::schema::PartitionRangeConfig;
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Native scalar column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimpleType {
    Ascii,
    BigInt,
    Blob,
    Boolean,
    Date,
    Decimal,
    Double,
    Duration,
    Float,
    Inet,
    Int,
    SmallInt,
    Text,
    Time,
    Timestamp,
    TimeUuid,
    TinyInt,
    Uuid,
    Varchar,
    Varint,
}

impl SimpleType {
    pub const ALL: [SimpleType; 20] = [
        SimpleType::Ascii,
        SimpleType::BigInt,
        SimpleType::Blob,
        SimpleType::Boolean,
        SimpleType::Date,
        SimpleType::Decimal,
        SimpleType::Double,
        SimpleType::Duration,
        SimpleType::Float,
        SimpleType::Inet,
        SimpleType::Int,
        SimpleType::SmallInt,
        SimpleType::Text,
        SimpleType::Time,
        SimpleType::Timestamp,
        SimpleType::TimeUuid,
        SimpleType::TinyInt,
        SimpleType::Uuid,
        SimpleType::Varchar,
        SimpleType::Varint,
    ];

    /// Types usable in partition and clustering keys
    pub const KEY_ELIGIBLE: [SimpleType; 18] = [
        SimpleType::Ascii,
        SimpleType::BigInt,
        SimpleType::Blob,
        SimpleType::Date,
        SimpleType::Decimal,
        SimpleType::Double,
        SimpleType::Float,
        SimpleType::Inet,
        SimpleType::Int,
        SimpleType::SmallInt,
        SimpleType::Text,
        SimpleType::Time,
        SimpleType::Timestamp,
        SimpleType::TimeUuid,
        SimpleType::TinyInt,
        SimpleType::Uuid,
        SimpleType::Varchar,
        SimpleType::Varint,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SimpleType::Ascii => "ascii",
            SimpleType::BigInt => "bigint",
            SimpleType::Blob => "blob",
            SimpleType::Boolean => "boolean",
            SimpleType::Date => "date",
            SimpleType::Decimal => "decimal",
            SimpleType::Double => "double",
            SimpleType::Duration => "duration",
            SimpleType::Float => "float",
            SimpleType::Inet => "inet",
            SimpleType::Int => "int",
            SimpleType::SmallInt => "smallint",
            SimpleType::Text => "text",
            SimpleType::Time => "time",
            SimpleType::Timestamp => "timestamp",
            SimpleType::TimeUuid => "timeuuid",
            SimpleType::TinyInt => "tinyint",
            SimpleType::Uuid => "uuid",
            SimpleType::Varchar => "varchar",
            SimpleType::Varint => "varint",
        }
    }

    pub fn is_key_eligible(self) -> bool {
        !matches!(self, SimpleType::Boolean | SimpleType::Duration)
    }

    /// Secondary indexes cannot be built on durations
    pub fn indexable(self) -> bool {
        self != SimpleType::Duration
    }

    pub fn wire_type(self) -> WireType {
        match self {
            SimpleType::Ascii => WireType::Ascii,
            SimpleType::BigInt => WireType::BigInt,
            SimpleType::Blob => WireType::Blob,
            SimpleType::Boolean => WireType::Boolean,
            SimpleType::Date => WireType::Date,
            SimpleType::Decimal => WireType::Decimal,
            SimpleType::Double => WireType::Double,
            SimpleType::Duration => WireType::Duration,
            SimpleType::Float => WireType::Float,
            SimpleType::Inet => WireType::Inet,
            SimpleType::Int => WireType::Int,
            SimpleType::SmallInt => WireType::SmallInt,
            SimpleType::Text | SimpleType::Varchar => WireType::Varchar,
            SimpleType::Time => WireType::Time,
            SimpleType::Timestamp => WireType::Timestamp,
            SimpleType::TimeUuid => WireType::TimeUuid,
            SimpleType::TinyInt => WireType::TinyInt,
            SimpleType::Uuid => WireType::Uuid,
            SimpleType::Varint => WireType::Varint,
        }
    }

    /// Types an `ALTER ... TYPE` may switch this type to
    pub fn compatible_types(self) -> &'static [SimpleType] {
        match self {
            SimpleType::Ascii | SimpleType::Varchar => &[SimpleType::Text, SimpleType::Blob],
            SimpleType::Int => &[SimpleType::Varint, SimpleType::Blob],
            SimpleType::TimeUuid => &[SimpleType::Uuid, SimpleType::Blob],
            SimpleType::BigInt
            | SimpleType::Boolean
            | SimpleType::Decimal
            | SimpleType::Float
            | SimpleType::Inet
            | SimpleType::Timestamp
            | SimpleType::Uuid
            | SimpleType::Varint => &[SimpleType::Blob],
            SimpleType::Blob
            | SimpleType::Date
            | SimpleType::Double
            | SimpleType::Duration
            | SimpleType::SmallInt
            | SimpleType::Text
            | SimpleType::Time
            | SimpleType::TinyInt => &[],
        }
    }

    pub fn gen_value<R: Rng + ?Sized>(self, rng: &mut R, p: &PartitionRangeConfig) -> Value {
        match self {
            SimpleType::Ascii => Value::Ascii(gen_string(rng, p)),
            SimpleType::Text => Value::Text(gen_string(rng, p)),
            SimpleType::Varchar => Value::Varchar(gen_string(rng, p)),
            SimpleType::Blob => {
                let len = rand_int_range(rng, p.min_blob_length, p.max_blob_length);
                Value::Blob(rand_bytes(rng, len))
            }
            SimpleType::BigInt => Value::BigInt(rng.gen()),
            SimpleType::Boolean => Value::Boolean(rng.gen()),
            SimpleType::Date => Value::Date(rand_date(rng)),
            SimpleType::Decimal => {
                Value::Decimal(Decimal::new(rng.gen_range(-1_000_000_000..1_000_000_000), rng.gen_range(0..6)))
            }
            SimpleType::Double => Value::Double(rng.gen_range(-1.0e12..1.0e12)),
            SimpleType::Duration => Value::Duration(rand_duration(rng)),
            SimpleType::Float => Value::Float(rng.gen_range(-1.0e6_f32..1.0e6_f32)),
            SimpleType::Inet => Value::Inet(rand_ipv4(rng)),
            SimpleType::Int => Value::Int(rng.gen()),
            SimpleType::SmallInt => Value::SmallInt(rng.gen()),
            SimpleType::Time => Value::Time(rand_time(rng)),
            SimpleType::Timestamp => Value::Timestamp(rand_timestamp(rng)),
            SimpleType::TimeUuid => Value::TimeUuid(rand_time_uuid(rng)),
            SimpleType::TinyInt => Value::TinyInt(rng.gen()),
            SimpleType::Uuid => Value::Uuid(rand_uuid(rng)),
            SimpleType::Varint => Value::Varint(rng.gen_range(0..i64::MAX)),
        }
    }
}

fn gen_string<R: Rng + ?Sized>(rng: &mut R, p: &PartitionRangeConfig) -> String {
    let len = rand_int_range(rng, p.min_string_length, p.max_string_length);
    rand_string(rng, len)
}
