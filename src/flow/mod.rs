pub mod detectors;
pub mod flow_model;
pub mod live;
pub mod pattern;
pub mod report;
pub mod values;
