pub mod model;
pub mod ports;

pub use model::{Comment, CommentAuthor, CommentRow, HarvestResult, Post, SortOrder};
pub use ports::{ConfigProvider, Pipeline, ProgressSink, Storage};
