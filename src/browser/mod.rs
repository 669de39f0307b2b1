pub mod fixture;
pub mod page;
pub mod session;
