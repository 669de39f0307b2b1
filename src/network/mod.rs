pub mod api_model;
pub mod mock;
pub mod recorder;
