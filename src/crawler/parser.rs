use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use scraper::{Html, Node, Selector};

static TITLE_MARKER: &str = "【本文】";

/// 标题按此顺序依次截断, 去掉站点附加的后缀
static TITLE_SEPARATORS: [&str; 4] = ["|", "｜", " - 小説投稿エブリスタ", "ページ"];

static PAGE_COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(\d+)ページ").expect("页数正则编译失败"));

static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("无法创建title选择器"));

static PAGE_COUNT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.partition.singlePage").expect("无法创建页数选择器"));

static BODY_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.mainBody").expect("无法创建正文选择器"));

/// 第一页独有的元信息
pub struct FrontMatter {
    pub title: String,
    pub total_pages: u32,
}

/// 正文里按文档顺序排列的片段
pub enum Segment {
    Text(String),
    Image(String),
}

pub struct PageContent {
    pub title: Option<String>,
    pub segments: Vec<Segment>,
}

impl PageContent {
    /// 标准化正文: 仅文本片段, 逐段去空白后以换行连接, 用于查重与空页判断
    pub fn text(&self) -> String {
        let mut blocks = Vec::new();
        for segment in &self.segments {
            if let Segment::Text(text) = segment {
                blocks.push(text.as_str());
            }
        }
        blocks.join("\n")
    }

    pub fn image_srcs(&self) -> Vec<&str> {
        let mut srcs = Vec::new();
        for segment in &self.segments {
            if let Segment::Image(src) = segment {
                srcs.push(src.as_str());
            }
        }
        srcs
    }

    /// 渲染写入文件的正文, 图片按文档顺序替换为对应的本地占位文本
    pub fn render(&self, resolved: &[String]) -> String {
        let mut blocks = Vec::new();
        let mut image_index = 0;
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => blocks.push(text.clone()),
                Segment::Image(_) => {
                    if let Some(filename) = resolved.get(image_index) {
                        blocks.push(format!("[Image: images/{}]", filename));
                    }
                    image_index += 1;
                }
            }
        }
        blocks.join("\n")
    }
}

/// 解析第一页的标题与站点声明的总页数; 两者缺一不可, 失败时整个任务中止
pub fn front_matter(markup: &str) -> Result<FrontMatter> {
    let document = Html::parse_document(markup);

    let span = document
        .select(&PAGE_COUNT_SELECTOR)
        .next()
        .context("无法找到页数元素")?;
    let span_text = span.text().collect::<String>();
    let span_text = span_text.trim();
    let captures = PAGE_COUNT_RE
        .captures(span_text)
        .with_context(|| format!("页数格式异常: {}", span_text))?;
    let total_pages = captures[1].parse::<u32>().context("页数解析失败")?;

    let title_elem = document
        .select(&TITLE_SELECTOR)
        .next()
        .context("无法找到页面标题")?;
    let title = extract_story_title(&title_elem.text().collect::<String>());

    Ok(FrontMatter { title, total_pages })
}

/// 提取一页的标题与正文; 正文容器缺失说明已翻过末页, 返回 None
pub fn page_content(markup: &str) -> Option<PageContent> {
    let document = Html::parse_document(markup);
    let body = document.select(&BODY_SELECTOR).next()?;

    let mut segments = Vec::new();
    for node in body.descendants() {
        match node.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    segments.push(Segment::Text(trimmed.to_owned()));
                }
            }
            Node::Element(element) if element.name() == "img" => {
                if let Some(src) = element.attr("src") {
                    if !src.is_empty() {
                        segments.push(Segment::Image(src.to_owned()));
                    }
                }
            }
            _ => {}
        }
    }

    let title = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|elem| extract_story_title(elem.text().collect::<String>().trim()));

    Some(PageContent { title, segments })
}

/// 从 <title> 文本得到稳定的标题: 去掉正文标记, 再按固定顺序截断各分隔符
pub fn extract_story_title(raw_title: &str) -> String {
    let mut title = raw_title.replace(TITLE_MARKER, "").trim().to_owned();
    for separator in TITLE_SEPARATORS {
        if let Some(pos) = title.find(separator) {
            title.truncate(pos);
            title = title.trim().to_owned();
        }
    }
    title
}

#[cfg(test)]
mod tests {
    use super::*;

    static FRONT_PAGE: &str = r#"<html><head><title>【本文】テスト物語 | 小説投稿エブリスタ</title></head>
<body><span class="partition singlePage">1/3ページ</span>
<div class="mainBody"><p>第一行</p><p>第二行</p></div></body></html>"#;

    #[test]
    fn front_matter_reads_title_and_total_pages() {
        let front = front_matter(FRONT_PAGE).unwrap();
        assert_eq!(front.title, "テスト物語");
        assert_eq!(front.total_pages, 3);
    }

    #[test]
    fn front_matter_fails_without_page_count_element() {
        let markup = "<html><head><title>t</title></head><body></body></html>";
        assert!(front_matter(markup).is_err());
    }

    #[test]
    fn front_matter_fails_on_unexpected_page_count_format() {
        let markup = r#"<html><head><title>t</title></head>
<body><span class="partition singlePage">ページ数不明</span></body></html>"#;
        assert!(front_matter(markup).is_err());
    }

    #[test]
    fn title_rule_strips_marker_and_suffixes() {
        assert_eq!(extract_story_title("【本文】物語 | 何か"), "物語");
        assert_eq!(extract_story_title("物語｜全角区切り"), "物語");
        assert_eq!(extract_story_title("物語 - 小説投稿エブリスタ"), "物語");
        assert_eq!(extract_story_title("物語 3ページ"), "物語 3");
    }

    #[test]
    fn title_rule_is_idempotent() {
        for raw in ["【本文】物語 | 小説投稿エブリスタ", "物語｜x", "物語"] {
            let once = extract_story_title(raw);
            assert_eq!(extract_story_title(&once), once);
        }
    }

    #[test]
    fn missing_body_container_yields_none() {
        let markup = "<html><head><title>t</title></head><body><p>footer</p></body></html>";
        assert!(page_content(markup).is_none());
    }

    #[test]
    fn text_joins_trimmed_blocks_with_newlines() {
        let content = page_content(FRONT_PAGE).unwrap();
        assert_eq!(content.text(), "第一行\n第二行");
    }

    #[test]
    fn images_become_ordered_slots() {
        let markup = r#"<html><head><title>t</title></head><body><div class="mainBody">
<p>前</p><img src="https://cdn.example.jp/img/x.png?token=1"><p>後</p></div></body></html>"#;
        let content = page_content(markup).unwrap();
        assert_eq!(
            content.image_srcs(),
            vec!["https://cdn.example.jp/img/x.png?token=1"]
        );
        assert_eq!(
            content.render(&["x.png".to_owned()]),
            "前\n[Image: images/x.png]\n後"
        );
        // 查重用的文本不含图片占位
        assert_eq!(content.text(), "前\n後");
    }

    #[test]
    fn images_without_src_are_ignored() {
        let markup = r#"<html><body><div class="mainBody"><img><img src=""><p>本文</p></div></body></html>"#;
        let content = page_content(markup).unwrap();
        assert!(content.image_srcs().is_empty());
        assert_eq!(content.render(&[]), "本文");
    }
}
