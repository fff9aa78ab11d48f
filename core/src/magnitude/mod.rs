pub mod aggregate;
pub mod scaling;

pub use aggregate::{aggregate_mw, MwSeriesOptions, NetworkMwSeries, MW_FLOOR};
pub use scaling::{mw_crowell, mw_from_pgd, mw_melgar, MwEstimate, ScalingLaw};
