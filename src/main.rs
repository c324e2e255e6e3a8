use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;

use estar_fetch::{EstarCrawler, SiteConfig, logger, utils};

/// estar.jp 小说备份工具
#[derive(Parser)]
#[command(name = "estar-fetch", version)]
struct Args {
    /// 小说ID, 纯数字 (例: 17418503)
    story_id: String,

    /// 每页之间的等待秒数
    #[arg(long, default_value_t = 0.5)]
    delay: f64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    logger::init();
    let args = Args::parse();

    if !utils::is_valid_story_id(&args.story_id) {
        anyhow::bail!("小说ID必须为纯数字: {}", args.story_id);
    }

    let config = SiteConfig::load_or_default()?;
    let delay = Duration::from_secs_f64(args.delay.max(0.0));
    let crawler = EstarCrawler::new(config, delay)?;

    let start = Instant::now();
    crawler.scrape_story(&args.story_id).await?;
    utils::display_elapsed_time(start.elapsed());

    Ok(())
}
