pub mod config;
pub mod db;
pub mod errors;
pub mod index;
pub mod project;
pub mod query;
pub mod resolution;
pub mod types;
