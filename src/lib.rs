pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::{cli::LocalStorage, CliConfig};
pub use core::{
    engine::HarvestEngine,
    fetch::{FetchPolicy, HttpFetcher},
    pipeline::{CommentPipeline, LogProgress},
    rate::RateController,
};
pub use utils::error::{HarvestError, Result};
