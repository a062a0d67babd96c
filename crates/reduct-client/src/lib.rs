//! # Reduct Client
//!
//! An async client for the Reduct time-series blob storage HTTP API.
//!
//! A server holds named buckets. Each bucket groups records under entry
//! names, and a record is a binary payload identified by its timestamp
//! within the entry.
//!
//! Every operation returns [`Result`]; a [`ClientError`] carries either the
//! HTTP status the server answered with or `-1` for client-side failures.
//!
//! ## Example
//!
//! ```rust,ignore
//! use reduct_client::{ReductClient, QuotaType, Settings};
//!
//! #[tokio::main]
//! async fn main() -> reduct_client::Result<()> {
//!     let client = ReductClient::with_url("http://127.0.0.1:8383")?;
//!
//!     let bucket = client
//!         .create_bucket("bucket", Settings::new().with_quota_type(QuotaType::Fifo))
//!         .await?;
//!
//!     let start = chrono::Utc::now();
//!     bucket.write("entry-1", "some data", None).await?;
//!
//!     for record in bucket.list("entry-1", start, chrono::Utc::now()).await? {
//!         let blob = bucket.read("entry-1", record.timestamp).await?;
//!         println!("{} bytes", blob.len());
//!     }
//!     Ok(())
//! }
//! ```

mod bucket;
mod client;
mod config;
mod error;
mod settings;
pub mod transport;
mod types;

pub use bucket::Bucket;
pub use client::ReductClient;
pub use config::{Config, DEFAULT_URL};
pub use error::{ClientError, Result};
pub use settings::{QuotaType, Settings};
pub use transport::HttpTransport;
pub use types::{RecordInfo, ServerInfo};
