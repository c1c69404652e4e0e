pub mod extract;
pub mod fetcher;
pub mod models;
pub mod parser;
pub mod service;
