use crate::domain::model::{Comment, CommentRow};
use crate::utils::error::{HarvestError, Result};
use chrono::DateTime;
use chrono_tz::Tz;

pub const REPLY_MARKER: &str = "↳ ";
pub const POST_LINK_BASE: &str = "https://moescape.ai/posts";
const TARGET_TZ: Tz = chrono_tz::Europe::Helsinki;

/// ISO8601 時間 (Z 結尾或帶明確偏移都收) 轉成赫爾辛基當地時間字串,
/// 格式 `YYYY-MM-DD HH:MM:SS EET|EEST`
pub fn to_helsinki_timestamp(raw: &str) -> Result<String> {
    let parsed = DateTime::parse_from_rfc3339(raw).map_err(|e| HarvestError::MalformedData {
        context: format!("invalid timestamp '{}': {}", raw, e),
    })?;
    Ok(parsed
        .with_timezone(&TARGET_TZ)
        .format("%Y-%m-%d %H:%M:%S %Z")
        .to_string())
}

/// 巢狀留言攤平成輸出列:每則留言一列,其下每個非 null 回覆緊接一列,
/// 回覆文字加上視覺標記。時間戳壞掉就整批失敗,不做靜默補值。
pub fn normalize_comments(
    comments: &[Comment],
    post_uuid: &str,
    post_title: &str,
) -> Result<Vec<CommentRow>> {
    let post_link = format!("{}/{}", POST_LINK_BASE, post_uuid);
    let mut rows = Vec::new();

    for comment in comments {
        rows.push(CommentRow {
            name: comment.profile.name.clone(),
            comment: comment.text.clone(),
            date: to_helsinki_timestamp(&comment.created_at)?,
            likes: comment.likes,
            post_title: post_title.to_string(),
            post_link: post_link.clone(),
        });

        for reply in comment.replies.iter().flatten().flatten() {
            rows.push(CommentRow {
                name: reply.profile.name.clone(),
                comment: format!("{}{}", REPLY_MARKER, reply.text),
                date: to_helsinki_timestamp(&reply.created_at)?,
                likes: reply.likes,
                post_title: post_title.to_string(),
                post_link: post_link.clone(),
            });
        }
    }

    Ok(rows)
}
