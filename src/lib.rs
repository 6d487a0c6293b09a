//! Cleaning and SQLite loading for scraped Telegram channel exports.
//!
//! The scraper and the object detector are external; they plug in through
//! [`ingest::MessageSource`] and [`detection::Detector`].

pub mod cleaning;
pub mod cli;
pub mod commands;
pub mod config;
pub mod detection;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod store;
pub mod table;
pub mod text;
pub mod util;
