pub mod script;
pub mod snapshot;
