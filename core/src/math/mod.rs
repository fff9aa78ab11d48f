pub mod projection;
pub mod stats;

pub use projection::{Projector, TransverseMercator};
pub use stats::StatsHelper;
