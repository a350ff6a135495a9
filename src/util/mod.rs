pub mod fetcher;
pub mod parser;
pub mod sink;
