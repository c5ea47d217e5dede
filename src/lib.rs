pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod prompt;
pub mod redis;
pub mod repository;
pub mod repository_traits;
pub mod runs;
pub mod sentiment;
pub mod service;
pub mod threads;
pub mod transport;

pub use config::Config;
pub use error::{NavigatorError, Result};
pub use models::{Outcome, QueryContext, QueryType, Sentiment};
pub use service::NavigatorService;
