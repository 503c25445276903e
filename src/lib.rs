pub mod cli;
pub mod config;
pub mod error;
pub mod logger;

pub mod domain_utils;
pub mod email;
pub mod search;
pub mod store;
pub mod strategy;
pub mod web_source;

pub mod embedding;
pub mod known_domains;
pub mod page_fetcher;
pub mod sector;

pub mod company;
pub mod domain_type;
pub mod person_name;
pub mod university;

pub mod enricher;

pub mod batch;
pub mod cache_commands;
pub mod export;

pub use config::AppConfig;
pub use enricher::{Enricher, EnrichmentFailure, EnrichmentOutcome, EnrichmentRecord};
pub use error::EnrichError;
pub use web_source::{HttpWebSource, WebSource};
