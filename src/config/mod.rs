pub mod cli;

use crate::core::ConfigProvider;
use crate::domain::model::SortOrder;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};

pub const MAX_NUM_POSTS: usize = 2000;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "moescape-comments")]
#[command(about = "Fetch a Moescape user's posts and comments into a CSV export")]
pub struct CliConfig {
    #[arg(long)]
    pub user_id: String,

    #[arg(long, default_value = "10")]
    pub num_posts: usize,

    #[arg(long, value_enum, default_value = "newest-first")]
    pub sort_order: SortOrder,

    #[arg(long, default_value = "https://api.moescape.ai")]
    pub api_base: String,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl ConfigProvider for CliConfig {
    fn api_base(&self) -> &str {
        &self.api_base
    }

    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn num_posts(&self) -> usize {
        self.num_posts
    }

    fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("user_id", &self.user_id)?;
        validation::validate_range("num_posts", self.num_posts, 1, MAX_NUM_POSTS)?;
        validation::validate_url("api_base", &self.api_base)?;
        validation::validate_path("output_path", &self.output_path)?;
        Ok(())
    }
}
