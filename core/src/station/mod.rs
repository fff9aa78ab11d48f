pub mod buffer;
pub mod registry;
pub mod windowed;

pub use buffer::{
    BufferConfig, DisplacementSeries, Layer, LayerSamples, Offset, PgdQuery, PgdSeries, PgdValue,
    PointSample, Sample, SeriesInput, StationBuffer,
};
pub use registry::{BoundingRange, Station, StationRegistry};
pub use windowed::WindowedBuffer;
