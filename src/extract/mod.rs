pub mod extractor;
pub mod navigation;
pub mod sections;
