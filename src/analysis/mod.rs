pub mod analysis_model;
pub mod error;
pub mod session;
