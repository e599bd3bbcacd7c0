use crate::core::fetch::HttpFetcher;
use crate::core::normalize::normalize_comments;
use crate::core::paginate::{PostPages, POSTS_FETCH_CAP};
use crate::core::rate::RateController;
use crate::domain::model::{Comment, CommentRow, HarvestResult, Post, SortOrder};
use crate::domain::ports::{ConfigProvider, Pipeline, ProgressSink, Storage};
use crate::utils::error::{HarvestError, Result};

/// 留言端點一次拉好拉滿,小分頁會默默截斷留言
pub const COMMENTS_PAGE_SIZE: usize = 500;
pub const EXPORT_FILE_NAME: &str = "moescape_comments.csv";
const CSV_HEADER: [&str; 6] = ["name", "comment", "date", "likes", "post_title", "post_link"];

/// 預設的進度接收端,直接寫日誌
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&self, fraction: f64) {
        tracing::info!("🔄 Progress: {:.0}%", fraction * 100.0);
    }
}

pub struct CommentPipeline<S: Storage, C: ConfigProvider, P: ProgressSink> {
    storage: S,
    config: C,
    fetcher: HttpFetcher,
    progress: P,
}

impl<S: Storage, C: ConfigProvider, P: ProgressSink> CommentPipeline<S, C, P> {
    pub fn new(storage: S, config: C, progress: P) -> Self {
        Self::with_fetcher(
            storage,
            config,
            HttpFetcher::new(RateController::default()),
            progress,
        )
    }

    pub fn with_fetcher(storage: S, config: C, fetcher: HttpFetcher, progress: P) -> Self {
        Self {
            storage,
            config,
            fetcher,
            progress,
        }
    }

    async fn harvest_post(&self, url: &str, post: &Post) -> Result<Vec<CommentRow>> {
        let payload = self.fetcher.fetch(url).await?;
        let raw = payload
            .get("comments")
            .cloned()
            .ok_or_else(|| HarvestError::MalformedData {
                context: format!("comment payload for post {} has no 'comments' key", post.uuid),
            })?;
        let comments: Vec<Comment> =
            serde_json::from_value(raw).map_err(|e| HarvestError::MalformedData {
                context: format!("comments for post {} failed to decode: {}", post.uuid, e),
            })?;
        normalize_comments(&comments, &post.uuid, &post.title)
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, P: ProgressSink> Pipeline for CommentPipeline<S, C, P> {
    /// 逐頁消化惰性翻頁來源;翻到一半失敗就保留已收集的部分
    async fn extract(&self) -> Result<Vec<Post>> {
        let mut pages = PostPages::new(
            &self.fetcher,
            self.config.api_base(),
            self.config.user_id(),
            POSTS_FETCH_CAP,
        );
        let mut posts: Vec<Post> = Vec::new();
        let mut page_no = 0usize;

        while let Some(page) = pages.next_page().await {
            match page {
                Ok(batch) => {
                    page_no += 1;
                    tracing::debug!("📥 Page {}: {} posts", page_no, batch.len());
                    posts.extend(batch);
                }
                Err(e) if posts.is_empty() => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        "🔶 Pagination halted early, keeping {} posts: {}",
                        posts.len(),
                        e
                    );
                    break;
                }
            }
        }

        tracing::info!("📥 Found {} posts in total", posts.len());
        Ok(posts)
    }

    async fn transform(&self, mut posts: Vec<Post>) -> Result<HarvestResult> {
        // sort_by 是穩定排序,同時間戳保留抓取順序
        match self.config.sort_order() {
            SortOrder::NewestFirst => posts.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            SortOrder::OldestFirst => posts.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        }
        posts.truncate(self.config.num_posts());

        let total = posts.len();
        tracing::info!(
            "🔄 Analyzing the {} {} posts",
            match self.config.sort_order() {
                SortOrder::NewestFirst => "most recent",
                SortOrder::OldestFirst => "oldest",
            },
            total
        );

        let api_base = self.config.api_base().trim_end_matches('/').to_string();
        let mut rows = Vec::new();
        let mut posts_failed = 0usize;

        for (index, post) in posts.iter().enumerate() {
            let url = format!(
                "{}/v1/posts/{}/comments?offset=0&limit={}",
                api_base, post.uuid, COMMENTS_PAGE_SIZE
            );

            match self.harvest_post(&url, post).await {
                Ok(mut post_rows) => {
                    tracing::debug!("🔄 '{}': {} rows", post.title, post_rows.len());
                    rows.append(&mut post_rows);
                }
                Err(HarvestError::ChallengeDetected { url }) => {
                    posts_failed += 1;
                    tracing::error!(
                        "❌ Anti-bot challenge at {}; skipping comments for '{}'",
                        url,
                        post.title
                    );
                }
                Err(e) => {
                    posts_failed += 1;
                    tracing::warn!("🔶 Skipping comments for '{}': {}", post.title, e);
                }
            }

            self.progress.report((index + 1) as f64 / total as f64);
        }

        tracing::debug!("📡 Request rate is now {:.2} calls/s", self.fetcher.current_rate());

        Ok(HarvestResult {
            rows,
            posts_scanned: total,
            posts_failed,
        })
    }

    async fn load(&self, result: HarvestResult) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        if result.rows.is_empty() {
            // serialize 才會帶出標頭,空結果要自己補一行
            writer.write_record(CSV_HEADER)?;
        } else {
            for row in &result.rows {
                writer.serialize(row)?;
            }
        }
        let data = writer.into_inner().map_err(|e| {
            HarvestError::IoError(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
        })?;

        self.storage.write_file(EXPORT_FILE_NAME, &data).await?;

        let output_path = format!(
            "{}/{}",
            self.config.output_path().trim_end_matches('/'),
            EXPORT_FILE_NAME
        );
        tracing::info!("💾 Wrote {} rows to {}", result.rows.len(), output_path);
        Ok(output_path)
    }
}
