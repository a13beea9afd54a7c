//! Random primitives shared by the value generators

use chrono::{DateTime, NaiveDate};
use rand::Rng;
use std::net::{IpAddr, Ipv4Addr};
use uuid::Uuid;

/// Milliseconds of 9999-12-31T00:00:00Z, the last supported CQL date
pub const MAX_DATE_MS: i64 = 253_402_214_400_000;

const NANOS_PER_DAY: i64 = 86_400_000_000_000;

// 100ns intervals between 1582-10-15 (UUID epoch) and 1970-01-01.
const UUID_EPOCH_OFFSET: u64 = 0x01B2_1DD2_1381_4000;

/// Uniform integer in `[min, max)`, or `min` when the range is empty
pub fn rand_int_range<R: Rng + ?Sized>(rng: &mut R, min: usize, max: usize) -> usize {
    if max <= min {
        return min;
    }
    rng.gen_range(min..max)
}

/// Hex string of exactly `len` characters
///
/// At most 32 random characters are drawn; longer strings repeat that block.
pub fn rand_string<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let block_len = len.min(32);
    let block: Vec<u8> = (0..block_len)
        .map(|_| HEX[rng.gen_range(0..HEX.len())])
        .collect();
    if block.is_empty() {
        return String::new();
    }
    block
        .iter()
        .cycle()
        .take(len)
        .map(|b| char::from(*b))
        .collect()
}

pub fn rand_bytes<R: Rng + ?Sized>(rng: &mut R, len: usize) -> Vec<u8> {
    let mut out = vec![0_u8; len];
    rng.fill(out.as_mut_slice());
    out
}

pub fn rand_date<R: Rng + ?Sized>(rng: &mut R) -> NaiveDate {
    DateTime::from_timestamp_millis(rng.gen_range(0..MAX_DATE_MS))
        .map(|dt| dt.date_naive())
        .unwrap_or_default()
}

pub fn rand_timestamp<R: Rng + ?Sized>(rng: &mut R) -> i64 {
    rng.gen_range(0..MAX_DATE_MS)
}

/// Nanosecond of the day
pub fn rand_time<R: Rng + ?Sized>(rng: &mut R) -> i64 {
    rng.gen_range(0..NANOS_PER_DAY)
}

pub fn rand_duration<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "{}h{}m{}s{}ms",
        rng.gen_range(0..1000),
        rng.gen_range(0..60),
        rng.gen_range(0..60),
        rng.gen_range(0..1000)
    )
}

pub fn rand_ipv4<R: Rng + ?Sized>(rng: &mut R) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(rng.gen(), rng.gen(), rng.gen(), rng.gen()))
}

/// Version 4 uuid drawn from `rng` so runs are reproducible from a seed
pub fn rand_uuid<R: Rng + ?Sized>(rng: &mut R) -> Uuid {
    uuid::Builder::from_random_bytes(rng.gen()).into_uuid()
}

/// Version 1 uuid for a random timestamp in the supported date range
pub fn rand_time_uuid<R: Rng + ?Sized>(rng: &mut R) -> Uuid {
    let ms = rand_timestamp(rng) as u64;
    let ticks = ms * 10_000 + rng.gen_range(0..10_000) + UUID_EPOCH_OFFSET;
    let time_low = (ticks & 0xFFFF_FFFF) as u32;
    let time_mid = ((ticks >> 32) & 0xFFFF) as u16;
    let time_hi = (((ticks >> 48) & 0x0FFF) as u16) | 0x1000;
    let clock_seq: u16 = rng.gen_range(0..0x4000);
    let mut tail = [0_u8; 8];
    tail[0] = 0x80 | (clock_seq >> 8) as u8;
    tail[1] = (clock_seq & 0xFF) as u8;
    // Node id fixed to 127.0.0.1 so equal timestamps stay comparable across clusters.
    tail[2..].copy_from_slice(&[0x7f, 0x00, 0x00, 0x01, 0x00, 0x00]);
    Uuid::from_fields(time_low, time_mid, time_hi, &tail)
}
