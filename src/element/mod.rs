pub mod classifier;
pub mod element_model;
pub mod selector;
