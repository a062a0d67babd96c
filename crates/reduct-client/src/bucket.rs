//! Bucket handle: settings management and record access

use crate::{
    transport::{HttpTransport, MIME_JSON, MIME_OCTET_STREAM},
    types::{parse_record_list, to_unix_micros},
    ClientError, RecordInfo, Result, Settings,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use tracing::instrument;

/// Handle to one bucket on the server.
///
/// The handle only carries the bucket identity and a shared transport, so it
/// is cheap to clone and safe to use from several tasks. Removing the bucket
/// does not invalidate the handle locally; later calls fail with 404.
#[derive(Clone)]
pub struct Bucket {
    base_url: String,
    name: String,
    path: String,
    http: Arc<dyn HttpTransport>,
}

impl fmt::Debug for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bucket")
            .field("base_url", &self.base_url)
            .field("name", &self.name)
            .finish()
    }
}

impl Bucket {
    pub(crate) fn new(base_url: &str, name: &str, http: Arc<dyn HttpTransport>) -> Self {
        Self {
            base_url: base_url.to_string(),
            name: name.to_string(),
            path: format!("/b/{}", name),
            http,
        }
    }

    /// Bucket name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// URL of the server holding the bucket
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ==================== Settings ====================

    /// Fetch the current bucket settings
    #[instrument(skip(self), fields(bucket = %self.name))]
    pub async fn get_settings(&self) -> Result<Settings> {
        let body = self.http.get(&self.path).await?;
        Settings::parse_slice(&body)
    }

    /// Change the fields present in `patch`, keeping the others.
    ///
    /// The server replaces the whole settings object on PUT, so this reads
    /// the current settings, merges `patch` into them and writes the result
    /// back. The read and the write are not atomic: two concurrent updates of
    /// the same bucket can race and the last PUT wins.
    #[instrument(skip(self), fields(bucket = %self.name))]
    pub async fn update_settings(&self, patch: &Settings) -> Result<()> {
        let current = self.get_settings().await?;
        let merged = current.merge(patch);
        self.http
            .put(&self.path, Bytes::from(merged.to_json_string()), MIME_JSON)
            .await
    }

    /// Remove the bucket and all of its entries
    #[instrument(skip(self), fields(bucket = %self.name))]
    pub async fn remove(&self) -> Result<()> {
        self.http.delete(&self.path).await
    }

    // ==================== Records ====================

    /// Store `data` under `entry_name` at `ts`, or now when `ts` is `None`.
    ///
    /// An existing record with the same timestamp is overwritten. `data` is
    /// taken by value so owned buffers are sent without a copy; borrowed
    /// slices go through `Bytes::copy_from_slice` or `to_vec()`.
    #[instrument(skip(self, data), fields(bucket = %self.name))]
    pub async fn write(
        &self,
        entry_name: &str,
        data: impl Into<Bytes>,
        ts: Option<DateTime<Utc>>,
    ) -> Result<()> {
        validate_name("Entry", entry_name)?;
        let ts = ts.unwrap_or_else(Utc::now);
        let path = format!("{}/{}?ts={}", self.path, entry_name, to_unix_micros(&ts));
        self.http.post(&path, data.into(), MIME_OCTET_STREAM).await
    }

    /// Read the record stored at exactly `ts`
    #[instrument(skip(self), fields(bucket = %self.name))]
    pub async fn read(&self, entry_name: &str, ts: DateTime<Utc>) -> Result<Bytes> {
        validate_name("Entry", entry_name)?;
        let path = format!("{}/{}?ts={}", self.path, entry_name, to_unix_micros(&ts));
        self.http.get(&path).await
    }

    /// List descriptors of records with `start <= ts < stop`, oldest first.
    ///
    /// Payloads are not included; fetch them one by one with [`Bucket::read`].
    #[instrument(skip(self), fields(bucket = %self.name))]
    pub async fn list(
        &self,
        entry_name: &str,
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
    ) -> Result<Vec<RecordInfo>> {
        validate_name("Entry", entry_name)?;
        if start >= stop {
            return Ok(Vec::new());
        }

        let path = format!(
            "{}/{}/list?start={}&stop={}",
            self.path,
            entry_name,
            to_unix_micros(&start),
            to_unix_micros(&stop)
        );
        let body = self.http.get(&path).await?;
        parse_record_list(entry_name, &body, start, stop)
    }
}

/// Names become path segments, so they must be non-empty, free of URL
/// delimiters and escapes, and never a dot-segment that URL normalization
/// would collapse into another resource
pub(crate) fn validate_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ClientError::client(format!("{} name must not be empty", kind)));
    }
    if name == "." || name == ".." {
        return Err(ClientError::client(format!(
            "{} name '{}' is not allowed",
            kind, name
        )));
    }
    if name.contains(['/', '?', '#', '%']) {
        return Err(ClientError::client(format!(
            "{} name '{}' must not contain '/', '?', '#' or '%'",
            kind, name
        )));
    }
    Ok(())
}
