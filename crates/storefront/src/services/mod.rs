//! Outbound integrations.
//!
//! - [`meta`] - Conversions API relay with identifier hashing
//! - [`bling`] - Bling ERP OAuth code exchange
//! - [`tracking`] - Queue and background task feeding cart events to [`meta`]

pub mod bling;
pub mod meta;
pub mod tracking;

pub use bling::{BlingClient, BlingError};
pub use meta::{CapiClient, CapiError, CapiRequest, UpstreamResponse};
pub use tracking::CapiTracker;
