//! Usage example for the Reduct client
//!
//! This example demonstrates:
//! - Reading server information
//! - Creating a bucket with a FIFO quota
//! - Writing records to an entry
//! - Walking an entry: list descriptors, then read each blob
//!
//! Run with: cargo run --example usage
//! The server URL and token are taken from REDUCT_URL / REDUCT_API_TOKEN.

use chrono::Utc;
use reduct_client::{Config, QuotaType, ReductClient, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let client = ReductClient::new(Config::from_env()?)?;

    // Get information about the server
    let info = client.get_info().await?;
    println!("Server version: {}", info.version);
    println!("Buckets: {}, usage: {} bytes", info.bucket_count, info.usage_bytes);

    // Create a bucket
    let settings = Settings::new()
        .with_quota_type(QuotaType::Fifo)
        .with_quota_size(1_000_000);
    let bucket = client.create_bucket("bucket", settings).await?;
    println!("Created bucket '{}' with {}", bucket.name(), bucket.get_settings().await?);

    // Write some data
    let start = Utc::now();
    for data in ["some_data1", "some_data2", "some_data3"] {
        bucket.write("entry-1", data, None).await?;
    }

    // Walk through the data
    let records = bucket.list("entry-1", start, Utc::now()).await?;
    for record in records {
        match bucket.read("entry-1", record.timestamp).await {
            Ok(blob) => println!("Read blob: {}", String::from_utf8_lossy(&blob)),
            Err(e) => println!("Failed to read {}: {}", record.timestamp, e),
        }
    }

    Ok(())
}
