//! Transform stage: region aggregation and consolidation with the CO2
//! reading.

mod aggregate;
mod merge;

pub use aggregate::aggregate_by_region;
pub use merge::merge_run;
