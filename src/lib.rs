//! Reduct storage client SDK
//!
//! Re-exports [`reduct_client`] so applications can depend on a single crate.
//! See `demos/usage.rs` for a walk through bucket creation, writing records
//! and reading them back.

pub use reduct_client::*;
