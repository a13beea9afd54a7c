//! Bound CQL values
//!
//! `Value` is what a statement binds for a single placeholder. Tuple columns
//! bind one `Value` per element, UDT columns bind one [`Value::Udt`].

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::net::IpAddr;
use uuid::Uuid;

/// A single bound value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Ascii(String),
    BigInt(i64),
    Blob(Vec<u8>),
    Boolean(bool),
    Counter(i64),
    Date(NaiveDate),
    Decimal(Decimal),
    Double(f64),
    /// CQL duration literal, e.g. `3h12m5s`
    Duration(String),
    Float(f32),
    Inet(IpAddr),
    Int(i32),
    SmallInt(i16),
    Text(String),
    /// Nanoseconds since midnight
    Time(i64),
    /// Milliseconds since the unix epoch
    Timestamp(i64),
    TimeUuid(Uuid),
    TinyInt(i8),
    Uuid(Uuid),
    Varchar(String),
    Varint(i64),
    Udt(BTreeMap<String, Value>),
}

/// Ordered bound values of one statement
pub type Values = Vec<Value>;

impl Value {
    /// Render the value as a CQL literal
    pub fn to_cql_literal(&self) -> String {
        match self {
            Value::Ascii(s) | Value::Text(s) | Value::Varchar(s) => quote(s),
            Value::BigInt(v) | Value::Counter(v) | Value::Varint(v) => v.to_string(),
            Value::Blob(b) => format!("0x{}", hex(b)),
            Value::Boolean(v) => v.to_string(),
            Value::Date(d) => quote(&d.format("%Y-%m-%d").to_string()),
            Value::Decimal(d) => d.to_string(),
            Value::Double(v) => v.to_string(),
            Value::Duration(d) => d.clone(),
            Value::Float(v) => v.to_string(),
            Value::Inet(ip) => quote(&ip.to_string()),
            Value::Int(v) => v.to_string(),
            Value::SmallInt(v) => v.to_string(),
            Value::Time(v) | Value::Timestamp(v) => v.to_string(),
            Value::TimeUuid(u) | Value::Uuid(u) => u.to_string(),
            Value::TinyInt(v) => v.to_string(),
            Value::Udt(fields) => {
                let parts: Vec<String> = fields
                    .iter()
                    .map(|(name, v)| format!("{name}:{}", v.to_cql_literal()))
                    .collect();
                format!("{{{}}}", parts.join(","))
            }
        }
    }

    /// Render the value for an `INSERT ... JSON` document
    ///
    /// Blobs become `"0x<hex>"`, dates `"YYYY-MM-DD"`, and every type without a
    /// native JSON representation is sent as its string form.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Ascii(s) | Value::Text(s) | Value::Varchar(s) | Value::Duration(s) => {
                Json::String(s.clone())
            }
            Value::BigInt(v) | Value::Counter(v) | Value::Varint(v) => Json::from(*v),
            Value::Time(v) | Value::Timestamp(v) => Json::from(*v),
            Value::Blob(b) => Json::String(format!("0x{}", hex(b))),
            Value::Boolean(v) => Json::Bool(*v),
            Value::Date(d) => Json::String(d.format("%Y-%m-%d").to_string()),
            Value::Decimal(d) => Json::String(d.to_string()),
            Value::Double(v) => serde_json::Number::from_f64(*v)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Float(v) => serde_json::Number::from_f64(f64::from(*v))
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Inet(ip) => Json::String(ip.to_string()),
            Value::Int(v) => Json::from(*v),
            Value::SmallInt(v) => Json::from(*v),
            Value::TinyInt(v) => Json::from(*v),
            Value::TimeUuid(u) | Value::Uuid(u) => Json::String(u.to_string()),
            Value::Udt(fields) => Json::Object(
                fields
                    .iter()
                    .map(|(name, v)| (name.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Serialized form used to build routing keys
    ///
    /// Fixed-width numbers are big-endian as on the wire, variable-width
    /// values are their raw bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Value::Ascii(s) | Value::Text(s) | Value::Varchar(s) | Value::Duration(s) => {
                s.as_bytes().to_vec()
            }
            Value::BigInt(v) | Value::Counter(v) | Value::Varint(v) => v.to_be_bytes().to_vec(),
            Value::Time(v) | Value::Timestamp(v) => v.to_be_bytes().to_vec(),
            Value::Blob(b) => b.clone(),
            Value::Boolean(v) => vec![u8::from(*v)],
            Value::Date(d) => {
                // CQL dates are days since the epoch centred on 2^31.
                let days = d.signed_duration_since(NaiveDate::default()).num_days();
                ((days + (1_i64 << 31)) as u32).to_be_bytes().to_vec()
            }
            Value::Decimal(d) => d.serialize().to_vec(),
            Value::Double(v) => v.to_be_bytes().to_vec(),
            Value::Float(v) => v.to_be_bytes().to_vec(),
            Value::Inet(IpAddr::V4(ip)) => ip.octets().to_vec(),
            Value::Inet(IpAddr::V6(ip)) => ip.octets().to_vec(),
            Value::Int(v) => v.to_be_bytes().to_vec(),
            Value::SmallInt(v) => v.to_be_bytes().to_vec(),
            Value::TinyInt(v) => v.to_be_bytes().to_vec(),
            Value::TimeUuid(u) | Value::Uuid(u) => u.as_bytes().to_vec(),
            Value::Udt(fields) => {
                let mut out = Vec::new();
                for v in fields.values() {
                    let bytes = v.to_bytes();
                    out.extend_from_slice(&(bytes.len() as i32).to_be_bytes());
                    out.extend_from_slice(&bytes);
                }
                out
            }
        }
    }
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

/// Partition-key values and the routing token derived from them
///
/// Two values with the same token address the same partition and are
/// mutually exclusive while in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueWithToken {
    pub value: Values,
    pub token: u64,
}

impl ValueWithToken {
    pub fn new(value: Values, token: u64) -> Self {
        Self { value, token }
    }
}
