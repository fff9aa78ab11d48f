//! Network-level PGD magnitude core for GNSS monitoring stations.
//!
//! Station buffers hold displacement samples, the network object tracks the
//! event geometry, and the magnitude module turns per-station peak ground
//! displacement into a single time-resolved Mw estimate.

pub mod magnitude;
pub mod math;
pub mod network;
pub mod prelude;
pub mod station;
pub mod telemetry;
pub mod units;

#[cfg(test)]
pub(crate) mod testing;

pub use magnitude::{aggregate_mw, MwSeriesOptions, NetworkMwSeries, ScalingLaw};
pub use network::{NetworkConfig, NetworkTimeSeries};
pub use prelude::{GeoPoint, Hypocenter, NetworkError, NetworkResult, ReferenceOptions, StationRef};
pub use station::{StationBuffer, WindowedBuffer};
