//! Server info and record descriptors

use crate::{ClientError, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Snapshot of the server state returned by `GET /info`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServerInfo {
    /// Server version
    pub version: String,
    /// Number of buckets
    pub bucket_count: u64,
    /// Disk usage in bytes
    pub usage_bytes: u64,
    /// Server uptime
    pub uptime: Duration,
    /// Timestamp of the oldest stored record
    pub oldest_record: DateTime<Utc>,
    /// Timestamp of the latest stored record
    pub latest_record: DateTime<Utc>,
}

/// Descriptor of a stored record, without its payload
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordInfo {
    /// Entry the record belongs to
    pub entry_name: String,
    /// Record timestamp, the record identity within its entry
    pub timestamp: DateTime<Utc>,
    /// Payload size in bytes
    pub size: u64,
}

/// 64-bit integers travel as decimal strings to survive JSON number precision.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireInt<T> {
    Number(T),
    Text(String),
}

impl<T> WireInt<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    fn parse(self, field: &str) -> Result<T> {
        match self {
            Self::Number(n) => Ok(n),
            Self::Text(s) => s.trim().parse().map_err(|e| {
                ClientError::client(format!("Invalid value '{}' for '{}': {}", s, field, e))
            }),
        }
    }
}

type WireU64 = WireInt<u64>;

// Record timestamps are signed: records may predate the epoch.
type WireI64 = WireInt<i64>;

#[derive(Deserialize)]
struct RawServerInfo {
    version: String,
    bucket_count: WireU64,
    usage: WireU64,
    #[serde(default)]
    uptime: Option<WireU64>,
    oldest_record: WireU64,
    latest_record: WireU64,
}

#[derive(Deserialize)]
struct RawRecordList {
    #[serde(default)]
    records: Vec<RawRecord>,
}

#[derive(Deserialize)]
struct RawRecord {
    ts: WireI64,
    #[serde(default)]
    size: Option<WireU64>,
}

impl ServerInfo {
    pub(crate) fn parse(json: &[u8]) -> Result<Self> {
        let raw: RawServerInfo = serde_json::from_slice(json)?;
        let uptime = match raw.uptime {
            Some(uptime) => Duration::from_secs(uptime.parse("uptime")?),
            None => Duration::ZERO,
        };

        Ok(Self {
            version: raw.version,
            bucket_count: raw.bucket_count.parse("bucket_count")?,
            usage_bytes: raw.usage.parse("usage")?,
            uptime,
            oldest_record: from_unix_secs(raw.oldest_record.parse("oldest_record")?)?,
            latest_record: from_unix_secs(raw.latest_record.parse("latest_record")?)?,
        })
    }
}

/// Parse a list response into descriptors sorted ascending and kept within `[start, stop)`
pub(crate) fn parse_record_list(
    entry_name: &str,
    json: &[u8],
    start: DateTime<Utc>,
    stop: DateTime<Utc>,
) -> Result<Vec<RecordInfo>> {
    let raw: RawRecordList = serde_json::from_slice(json)?;

    let mut records = raw
        .records
        .into_iter()
        .map(|r| {
            let size = match r.size {
                Some(size) => size.parse("size")?,
                None => 0,
            };
            Ok(RecordInfo {
                entry_name: entry_name.to_string(),
                timestamp: from_unix_micros(r.ts.parse("ts")?)?,
                size,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    // compare at wire precision so sub-microsecond bounds do not drop records
    let range = to_unix_micros(&start)..to_unix_micros(&stop);
    records.retain(|r| range.contains(&to_unix_micros(&r.timestamp)));
    records.sort_by_key(|r| r.timestamp);
    Ok(records)
}

/// Record timestamps are Unix microseconds on the wire
pub(crate) fn to_unix_micros(ts: &DateTime<Utc>) -> i64 {
    ts.timestamp_micros()
}

fn from_unix_micros(micros: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| ClientError::client(format!("Timestamp {} is out of range", micros)))
}

fn from_unix_secs(secs: u64) -> Result<DateTime<Utc>> {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or_else(|| ClientError::client(format!("Timestamp {} is out of range", secs)))
}
