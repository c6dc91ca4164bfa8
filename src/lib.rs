pub mod annotation;
pub mod app;
pub mod archive;
pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod geo;
pub mod loader;
pub mod output;
pub mod sample_file;
pub mod sample_index;
pub mod section;
pub mod store;
pub mod table;
