use tracing::info;
use url::Url;

static INVALID_FILENAME_CHARS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// 小说ID必须为非空纯数字, 在发起任何网络请求之前校验
pub fn is_valid_story_id(story_id: &str) -> bool {
    !story_id.is_empty() && story_id.chars().all(|c| c.is_ascii_digit())
}

/// 替换目录名中非法的字符
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if INVALID_FILENAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect::<String>()
        .trim()
        .to_owned()
}

/// 由图片地址得到下载地址与本地文件名: 去掉查询串, 取路径最后一段
pub fn image_target(src: &str) -> Option<(Url, String)> {
    let mut url = Url::parse(src).ok()?;
    url.set_query(None);
    let filename = url
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .next_back()?
        .to_owned();
    Some((url, filename))
}

/// 原始地址的最后一段, 仅用于下载失败时的占位文本
pub fn image_basename(src: &str) -> &str {
    src.rsplit('/').next().unwrap_or(src)
}

pub fn display_elapsed_time(duration: std::time::Duration) {
    let total_ms = duration.as_millis();

    if total_ms >= 60000 {
        let mins = total_ms / 60000;
        let secs = (total_ms % 60000) / 1000;
        info!("✅ 抓取完成！耗时: {}分{}秒", mins, secs);
    } else if total_ms >= 1000 {
        let secs = total_ms / 1000;
        let ms_remaining = total_ms % 1000;
        info!("✅ 抓取完成！耗时: {}秒{}毫秒", secs, ms_remaining);
    } else {
        info!("✅ 抓取完成！耗时: {}毫秒", total_ms);
    }
}
