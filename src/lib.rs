pub mod config;
pub mod error;
pub mod fallback;
pub mod forecast;
pub mod geocoder;
pub mod models;
pub mod report;
pub mod session;
