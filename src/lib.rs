pub mod app;
pub mod audit;
pub mod core;
pub mod scanner;
pub mod store;
