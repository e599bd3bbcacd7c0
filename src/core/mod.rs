pub mod engine;
pub mod fetch;
pub mod normalize;
pub mod paginate;
pub mod pipeline;
pub mod rate;

pub use crate::domain::model::{Comment, CommentRow, HarvestResult, Post, SortOrder};
pub use crate::domain::ports::{ConfigProvider, Pipeline, ProgressSink, Storage};
pub use crate::utils::error::Result;
