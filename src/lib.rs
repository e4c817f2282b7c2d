pub mod apps;
pub mod config;
pub mod env;
pub mod error;
pub mod http;
pub mod report;
pub mod snyk;
pub mod types;
