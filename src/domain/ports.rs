use crate::domain::model::{HarvestResult, Post, SortOrder};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn api_base(&self) -> &str;
    fn user_id(&self) -> &str;
    fn num_posts(&self) -> usize;
    fn sort_order(&self) -> SortOrder;
    fn output_path(&self) -> &str;
}

/// 呈現層透過這個 port 接收進度，數值落在 [0, 1]
pub trait ProgressSink: Send + Sync {
    fn report(&self, fraction: f64);
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<Post>>;
    async fn transform(&self, posts: Vec<Post>) -> Result<HarvestResult>;
    async fn load(&self, result: HarvestResult) -> Result<String>;
}
