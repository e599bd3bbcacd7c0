use crate::core::fetch::HttpFetcher;
use crate::domain::model::Post;
use crate::utils::error::{HarvestError, Result};

/// API 允許的最大單頁筆數
pub const POSTS_PAGE_SIZE: usize = 500;
/// 單次執行最多掃的貼文數
pub const POSTS_FETCH_CAP: usize = 2000;

/// 惰性翻頁來源:一次一頁,走完或失敗就結束,不可重放
pub struct PostPages<'a> {
    fetcher: &'a HttpFetcher,
    api_base: String,
    user_id: String,
    limit: usize,
    page_size: usize,
    offset: usize,
    yielded: usize,
    done: bool,
}

impl<'a> PostPages<'a> {
    pub fn new(fetcher: &'a HttpFetcher, api_base: &str, user_id: &str, limit: usize) -> Self {
        Self {
            fetcher,
            api_base: api_base.trim_end_matches('/').to_string(),
            user_id: user_id.to_string(),
            limit,
            page_size: POSTS_PAGE_SIZE,
            offset: 0,
            yielded: 0,
            done: false,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// 伺服器回傳順序原樣保留;短頁或收滿 limit 就收工
    pub async fn next_page(&mut self) -> Option<Result<Vec<Post>>> {
        if self.done {
            return None;
        }

        let url = format!(
            "{}/v1/users/{}/posts?offset={}&limit={}",
            self.api_base, self.user_id, self.offset, self.page_size
        );

        let payload = match self.fetcher.fetch(&url).await {
            Ok(value) => value,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };

        let batch: Vec<Post> = match serde_json::from_value(payload) {
            Ok(batch) => batch,
            Err(e) => {
                self.done = true;
                return Some(Err(HarvestError::MalformedData {
                    context: format!(
                        "posts page at offset {} is not a post array: {}",
                        self.offset, e
                    ),
                }));
            }
        };

        if batch.len() < self.page_size {
            self.done = true;
        }
        self.offset += self.page_size;

        let remaining = self.limit - self.yielded;
        let page: Vec<Post> = batch.into_iter().take(remaining).collect();
        self.yielded += page.len();
        if self.yielded >= self.limit {
            self.done = true;
        }

        Some(Ok(page))
    }

    /// 吃完整個序列;中途失敗保留已收集的部分,錯誤一併帶回
    pub async fn collect(mut self) -> FetchedPosts {
        let mut posts = Vec::new();

        while let Some(page) = self.next_page().await {
            match page {
                Ok(batch) => posts.extend(batch),
                Err(e) => {
                    tracing::warn!(
                        "🔶 Pagination stopped early with {} posts collected: {}",
                        posts.len(),
                        e
                    );
                    return FetchedPosts {
                        posts,
                        error: Some(e),
                    };
                }
            }
        }

        FetchedPosts { posts, error: None }
    }
}

#[derive(Debug)]
pub struct FetchedPosts {
    pub posts: Vec<Post>,
    pub error: Option<HarvestError>,
}

pub async fn fetch_all_posts(
    fetcher: &HttpFetcher,
    api_base: &str,
    user_id: &str,
    limit: usize,
) -> FetchedPosts {
    PostPages::new(fetcher, api_base, user_id, limit)
        .collect()
        .await
}
