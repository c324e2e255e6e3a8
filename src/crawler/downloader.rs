use std::time::Duration;

use anyhow::{Context, Result};
use bytes::Bytes;
use reqwest::Client;

use crate::config::SiteConfig;

/// 页面与图片数据的来源, 测试里用内存数据代替真实站点
#[allow(async_fn_in_trait)]
pub trait PageSource {
    async fn page(&self, story_id: &str, page: u32) -> Result<String>;

    async fn image(&self, url: &str) -> Result<Bytes>;
}

pub struct Downloader {
    client: Client,
    config: SiteConfig,
}

impl Downloader {
    pub fn new(config: SiteConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("HTTP客户端构建失败")?;
        Ok(Self { client, config })
    }
}

impl PageSource for Downloader {
    async fn page(&self, story_id: &str, page: u32) -> Result<String> {
        let url = self.config.page_url(story_id);
        let response = self
            .client
            .get(&url)
            .query(&[("page", page)])
            .send()
            .await
            .with_context(|| format!("请求第 {} 页失败", page))?
            .error_for_status()
            .with_context(|| format!("第 {} 页返回错误状态", page))?;

        response
            .text()
            .await
            .with_context(|| format!("读取第 {} 页响应失败", page))
    }

    async fn image(&self, url: &str) -> Result<Bytes> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("下载失败: {}", url))?
            .error_for_status()
            .with_context(|| format!("下载返回错误状态: {}", url))?;

        response
            .bytes()
            .await
            .with_context(|| format!("读取响应失败: {}", url))
    }
}
