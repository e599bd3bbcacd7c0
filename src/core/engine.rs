use crate::domain::ports::Pipeline;
use crate::utils::error::Result;

pub struct HarvestEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> HarvestEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        println!("Starting comment harvest...");

        println!("Fetching posts...");
        let posts = self.pipeline.extract().await?;
        println!("Found {} posts in total", posts.len());
        if posts.is_empty() {
            println!("No posts found for this user.");
        }

        println!("Fetching and flattening comments...");
        let result = self.pipeline.transform(posts).await?;
        println!(
            "Collected {} comment rows from {} posts ({} skipped)",
            result.rows.len(),
            result.posts_scanned,
            result.posts_failed
        );
        if result.rows.is_empty() {
            println!("No comments found for this user's posts.");
        }

        println!("Exporting CSV...");
        let output_path = self.pipeline.load(result).await?;
        println!("Output saved to: {}", output_path);

        Ok(output_path)
    }
}
