//! Markdown to HTML for article bodies.
//!
//! Rendering differs from plain CommonMark output in three ways:
//! - headings carry an `id` derived from their text, for anchors and the
//!   table of contents
//! - `http(s)` links open in a new tab without referrer or opener
//! - raw HTML in the source is escaped and shown as text

use pulldown_cmark::{CowStr, Event, HeadingLevel, LinkType, Options, Parser, Tag, TagEnd, html};

/// Heading included in the table of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub level: u8,
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct RenderedMarkdown {
    pub html: String,
    pub toc: Vec<TocEntry>,
}

// The page title is the h1, so only h2 and h3 make it into the TOC
const TOC_LEVELS: std::ops::RangeInclusive<u8> = 2..=3;

struct OpenHeading<'a> {
    level: HeadingLevel,
    events: Vec<Event<'a>>,
    text: String,
}

pub fn render_markdown(source: &str) -> RenderedMarkdown {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES;

    let mut out: Vec<Event> = Vec::new();
    let mut toc = Vec::new();
    let mut heading: Option<OpenHeading> = None;

    for event in Parser::new_ext(source, options) {
        let event = match event {
            Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                ..
            }) => Event::InlineHtml(open_link(link_type, &dest_url, &title).into()),
            Event::End(TagEnd::Link) => Event::InlineHtml(CowStr::Borrowed("</a>")),
            other => other,
        };

        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                heading = Some(OpenHeading {
                    level,
                    events: Vec::new(),
                    text: String::new(),
                });
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(open) = heading.take() {
                    out.push(close_heading(open, &mut toc));
                }
            }
            other => match heading.as_mut() {
                Some(open) => {
                    if let Event::Text(t) | Event::Code(t) = &other {
                        open.text.push_str(t);
                    }
                    open.events.push(other);
                }
                None => out.push(other),
            },
        }
    }

    let mut html_out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut html_out, out.into_iter());
    RenderedMarkdown {
        html: html_out,
        toc,
    }
}

fn close_heading<'a>(open: OpenHeading<'a>, toc: &mut Vec<TocEntry>) -> Event<'a> {
    let depth = open.level as u8;
    let id = heading_id(&open.text);

    let mut inner = String::new();
    html::push_html(&mut inner, open.events.into_iter());

    if TOC_LEVELS.contains(&depth) && !id.is_empty() {
        toc.push(TocEntry {
            level: depth,
            id: id.clone(),
            text: open.text.trim().to_string(),
        });
    }

    Event::Html(format!("<h{depth} id=\"{id}\">{inner}</h{depth}>\n").into())
}

/// Anchor id for a heading: lowercased, whitespace runs become `-`, and
/// anything outside `[a-z0-9_-]` is dropped.
pub fn heading_id(text: &str) -> String {
    let mut id = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.to_lowercase().chars() {
        if c.is_whitespace() {
            if !in_space {
                id.push('-');
                in_space = true;
            }
            continue;
        }
        in_space = false;
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            id.push(c);
        }
    }
    id
}

pub fn is_external(href: &str) -> bool {
    href.starts_with("http://") || href.starts_with("https://")
}

fn open_link(link_type: LinkType, dest: &str, title: &str) -> String {
    let href = match link_type {
        LinkType::Email => format!("mailto:{}", dest),
        _ => dest.to_string(),
    };
    let href = if is_script_url(&href) { "#".to_string() } else { href };

    let title_attr = if title.is_empty() {
        String::new()
    } else {
        format!(" title=\"{}\"", escape_html(title))
    };

    if is_external(&href) {
        format!(
            "<a href=\"{}\"{} target=\"_blank\" rel=\"noopener noreferrer\">",
            escape_html(&href),
            title_attr
        )
    } else {
        format!("<a href=\"{}\"{}>", escape_html(&href), title_attr)
    }
}

fn is_script_url(href: &str) -> bool {
    let lower = href.trim_start().to_ascii_lowercase();
    lower.starts_with("javascript:") || lower.starts_with("vbscript:") || lower.starts_with("data:")
}

pub(crate) fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
