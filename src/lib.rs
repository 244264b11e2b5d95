//! Goal computation core for commitment tracking: the road a goal must stay on, the data
//! aggregated against it, how many days remain before derailment and the isolines drawn
//! around the road.
pub mod aggregator;
pub mod brain_errors;
pub mod constants;
pub mod derail;
pub mod goal;
pub mod isoline;
pub mod num_core;
pub mod road;
pub mod time;
