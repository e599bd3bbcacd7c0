use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// 貼文端點回傳的單筆貼文，未知欄位一律忽略
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub uuid: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentAuthor {
    pub name: String,
}

/// 留言樹只建模到第一層回覆；replies 內允許 null 空位
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub profile: CommentAuthor,
    pub text: String,
    // 原始 ISO8601 字串，轉換階段才解析，壞掉的時間戳會變成型別化錯誤
    pub created_at: String,
    pub likes: i64,
    #[serde(default)]
    pub replies: Option<Vec<Option<Comment>>>,
}

/// 匯出表格的一列。欄位順序就是 CSV 標頭順序。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRow {
    pub name: String,
    pub comment: String,
    pub date: String,
    pub likes: i64,
    pub post_title: String,
    pub post_link: String,
}

#[derive(Debug, Clone)]
pub struct HarvestResult {
    pub rows: Vec<CommentRow>,
    pub posts_scanned: usize,
    pub posts_failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum SortOrder {
    NewestFirst,
    OldestFirst,
}
