pub mod aggregator;
pub mod next_races;
pub mod racing_api;
pub mod store;
pub mod timer;
