pub mod downloader;
pub mod parser;
pub mod processor;

pub use downloader::{Downloader, PageSource};
pub use processor::Processor;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{info, instrument, warn};

use crate::config::SiteConfig;
use crate::utils::{image_basename, image_target, sanitize_filename};
use parser::FrontMatter;

/// 在站点声明的总页数之外额外探测的页数, 容忍页数标签偏小。
/// 与查重停止条件配套, 不要调整
static OVERSCAN_PAGES: u32 = 2;

/// 明确定义的停止条件; 除网络错误外都是正常翻到末页的信号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    NetworkError,
    NoBody,
    EmptyPage,
    DuplicateContent,
    PagesExhausted,
}

enum PageStep {
    /// 本页已写入, 携带标准化正文供下一页查重
    Written(String),
    Stop(StopReason),
}

pub struct ScrapeReport {
    pub story_title: String,
    pub pages_scraped: u32,
    pub folder: PathBuf,
    pub stop: StopReason,
}

pub struct EstarCrawler<S = Downloader> {
    source: S,
    delay: Duration,
    out_dir: PathBuf,
}

impl EstarCrawler<Downloader> {
    pub fn new(config: SiteConfig, delay: Duration) -> Result<Self> {
        Ok(Self::with_source(
            Downloader::new(config)?,
            delay,
            PathBuf::from("."),
        ))
    }
}

impl<S: PageSource> EstarCrawler<S> {
    pub fn with_source(source: S, delay: Duration, out_dir: PathBuf) -> Self {
        Self {
            source,
            delay,
            out_dir,
        }
    }

    #[instrument(skip(self))]
    pub async fn scrape_story(&self, story_id: &str) -> Result<ScrapeReport> {
        info!("开始抓取 ID为 {} 的小说", story_id);

        let front_html = self
            .source
            .page(story_id, 1)
            .await
            .context("无法获取第一页")?;
        let front = parser::front_matter(&front_html)?;
        info!("站点声明的总页数: {}", front.total_pages);

        let folder = self.out_dir.join(format!(
            "{} - {}",
            sanitize_filename(&front.title),
            story_id
        ));
        let image_dir = folder.join("images");
        fs::create_dir_all(&image_dir)
            .await
            .context("输出目录创建失败")?;
        info!("输出目录: {}", folder.display());

        let processor = Processor::new(folder.clone(), image_dir);
        let mut last_text: Option<String> = None;
        let mut pages_scraped = 0;
        let mut stop = StopReason::PagesExhausted;

        for page in 1..=front.total_pages + OVERSCAN_PAGES {
            info!("正在抓取第 {}/{} 页", page, front.total_pages);

            let html = match self.source.page(story_id, page).await {
                Ok(html) => html,
                Err(e) => {
                    warn!("第 {} 页网络错误: {:#}", page, e);
                    stop = StopReason::NetworkError;
                    break;
                }
            };

            match self
                .process_page(&processor, &front, page, &html, last_text.as_deref())
                .await
            {
                Ok(PageStep::Written(text)) => {
                    last_text = Some(text);
                    pages_scraped += 1;
                    tokio::time::sleep(self.delay).await;
                }
                Ok(PageStep::Stop(reason)) => {
                    info!("第 {} 页触发停止条件: {:?}", page, reason);
                    stop = reason;
                    break;
                }
                // 未分类的单页错误只跳过该页, 不中断整个任务
                Err(e) => warn!("处理第 {} 页时出错: {:#}", page, e),
            }
        }

        info!("小说《{}》抓取完成, 共 {} 页", front.title, pages_scraped);
        info!("已保存到: {}", folder.display());

        Ok(ScrapeReport {
            story_title: front.title,
            pages_scraped,
            folder,
            stop,
        })
    }

    async fn process_page(
        &self,
        processor: &Processor,
        front: &FrontMatter,
        page: u32,
        html: &str,
        last_text: Option<&str>,
    ) -> Result<PageStep> {
        let Some(content) = parser::page_content(html) else {
            return Ok(PageStep::Stop(StopReason::NoBody));
        };

        let text = content.text();
        if text.trim().is_empty() {
            return Ok(PageStep::Stop(StopReason::EmptyPage));
        }
        if last_text == Some(text.as_str()) {
            return Ok(PageStep::Stop(StopReason::DuplicateContent));
        }

        let title = content
            .title
            .clone()
            .unwrap_or_else(|| format!("{} - Page {}", front.title, page));

        let srcs = content.image_srcs();
        if !srcs.is_empty() {
            info!("发现 {} 张图片", srcs.len());
        }
        let mut resolved = Vec::with_capacity(srcs.len());
        for src in &srcs {
            resolved.push(self.resolve_image(processor, src).await);
        }

        processor
            .write_page(page, &title, &content.render(&resolved))
            .await?;

        Ok(PageStep::Written(text))
    }

    /// 解析并缓存一张图片, 返回本地文件名; 任何失败都退化为占位文本, 不影响整页
    async fn resolve_image(&self, processor: &Processor, src: &str) -> String {
        let Some((url, filename)) = image_target(src) else {
            warn!("无法解析图片地址: {}", src);
            return format!("[Failed to download: {}]", image_basename(src));
        };

        if processor.image_exists(&filename) {
            return filename;
        }

        info!("下载图片: {}", filename);
        let image_bytes = match self.source.image(url.as_str()).await {
            Ok(image_bytes) => image_bytes,
            Err(e) => {
                warn!("图片下载失败 {}: {:#}", src, e);
                return format!("[Failed to download: {}]", image_basename(src));
            }
        };

        if let Err(e) = processor.write_image(&filename, image_bytes).await {
            warn!("图片保存失败 {}: {:#}", src, e);
            return format!("[Failed to download: {}]", image_basename(src));
        }

        filename
    }
}
