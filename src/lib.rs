pub mod config;
pub mod crawler;
pub mod logger;
pub mod utils;

pub use config::SiteConfig;
pub use crawler::{EstarCrawler, ScrapeReport, StopReason};
