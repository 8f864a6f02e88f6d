pub mod interval_map;

pub use interval_map::{Error, Interval, IntervalMap};
