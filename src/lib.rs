//! Rendered-page analysis: element extraction and classification, selector
//! synthesis, API call recording and user-flow inference.

pub mod analysis;
pub mod browser;
pub mod cli;
pub mod dom;
pub mod element;
pub mod extract;
pub mod flow;
pub mod logging;
pub mod network;
