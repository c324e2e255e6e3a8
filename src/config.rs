use std::path::Path;

use anyhow::Result;
use serde::Deserialize;

static CONFIG_FILE: &str = "estar.toml";

static DEFAULT_BASE_URL: &str = "https://estar.jp/novels/{story_id}/viewer";

static DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// 站点配置, 作为不可变值传给下载器, 不使用全局状态
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_owned()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl SiteConfig {
    pub fn load(config_path: &Path) -> Result<Self> {
        let file_content = std::fs::read_to_string(config_path)?;

        config::Config::builder()
            .add_source(config::File::from_str(
                &file_content,
                config::FileFormat::Toml,
            ))
            .build()?
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("{}文件反序列化失败: {}", config_path.display(), e))
    }

    /// 存在 estar.toml 时读取它, 否则使用内置默认值
    pub fn load_or_default() -> Result<Self> {
        let config_path = Path::new(CONFIG_FILE);
        if config_path.is_file() {
            Self::load(config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn page_url(&self, story_id: &str) -> String {
        self.base_url.replace("{story_id}", story_id)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn page_url_fills_in_story_id() {
        let config = SiteConfig::default();
        assert_eq!(
            config.page_url("17418503"),
            "https://estar.jp/novels/17418503/viewer"
        );
    }

    #[test]
    fn partial_config_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timeout_secs = 10").unwrap();

        let config = SiteConfig::load(file.path()).unwrap();
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }
}
