use std::path::PathBuf;

use anyhow::Result;
use bytes::Bytes;
use tokio::fs;
use tracing::{info, instrument};

pub struct Processor {
    story_dir: PathBuf,
    image_dir: PathBuf,
}

impl Processor {
    pub fn new(story_dir: PathBuf, image_dir: PathBuf) -> Self {
        Self {
            story_dir,
            image_dir,
        }
    }

    /// 写入一页的文本文件: 标题行, 等长的 = 下划线, 空行, 正文; 已存在则直接覆盖
    #[instrument(skip_all)]
    pub async fn write_page(&self, index: u32, title: &str, content: &str) -> Result<PathBuf> {
        let mut artifact = String::new();
        artifact.push_str(title);
        artifact.push('\n');
        artifact.push_str(&"=".repeat(title.chars().count()));
        artifact.push_str("\n\n");
        artifact.push_str(content);

        let page_path = self.story_dir.join(format!("page_{:03}.txt", index));
        fs::write(&page_path, artifact).await?;

        info!("页面已保存到: {}", page_path.display());
        Ok(page_path)
    }

    /// 同名文件已存在视为已缓存, 本次运行内不再下载
    pub fn image_exists(&self, filename: &str) -> bool {
        self.image_dir.join(filename).exists()
    }

    #[instrument(skip_all)]
    pub async fn write_image(&self, filename: &str, image_bytes: Bytes) -> Result<()> {
        let image_path = self.image_dir.join(filename);
        fs::write(&image_path, &image_bytes).await?;
        info!("图片已保存到: {}", image_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn page_artifact_has_title_underline_and_content() {
        let dir = tempfile::tempdir().unwrap();
        let processor = Processor::new(dir.path().to_path_buf(), dir.path().join("images"));

        let path = processor.write_page(1, "テスト物語", "本文").await.unwrap();
        assert_eq!(path.file_name().unwrap(), "page_001.txt");

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "テスト物語\n=====\n\n本文");
    }

    #[tokio::test]
    async fn write_page_overwrites_existing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let processor = Processor::new(dir.path().to_path_buf(), dir.path().join("images"));

        processor.write_page(12, "t", "旧").await.unwrap();
        let path = processor.write_page(12, "t", "新").await.unwrap();
        assert_eq!(path.file_name().unwrap(), "page_012.txt");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "t\n=\n\n新");
    }
}
