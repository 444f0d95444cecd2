//! HTML shells for the documentation pages.
//!
//! Deliberately bare: a header, the folder sidebar, the article and its
//! table of contents. Styling is left to whatever stylesheet is deployed
//! alongside.

use chrono::{DateTime, NaiveDateTime};
use std::fmt::Write;

use crate::markdown::{RenderedMarkdown, TocEntry, escape_html};
use crate::models::Article;
use crate::nav::NavSection;

const SITE_NAME: &str = "Documentation";

fn layout(
    title: &str,
    sections: &[NavSection],
    current_path: &str,
    main: &str,
    toc: &[TocEntry],
) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<meta name=\"description\" content=\"{title}\">\n\
         <link rel=\"stylesheet\" href=\"/static/site.css\">\n</head>\n<body>\n\
         <header class=\"docs-header\"><a href=\"/\">{site}</a>\
         <form class=\"docs-search\" data-endpoint=\"/api/search\">\
         <input type=\"search\" name=\"query\" maxlength=\"500\" placeholder=\"Search\"></form>\
         </header>\n<div class=\"docs-layout\">\n\
         {sidebar}<main>\n{main}</main>\n{toc}</div>\n</body>\n</html>\n",
        title = escape_html(title),
        site = SITE_NAME,
        sidebar = sidebar(sections, current_path),
        main = main,
        toc = table_of_contents(toc),
    )
}

fn sidebar(sections: &[NavSection], current_path: &str) -> String {
    let mut html = String::from("<aside id=\"docs-sidebar\"><nav>\n");
    for section in sections {
        let _ = write!(
            html,
            "<details open><summary>{}</summary>\n<ul>\n",
            escape_html(&section.label)
        );
        for link in &section.links {
            let class = if link.is_active(current_path) {
                " class=\"active\" aria-current=\"page\""
            } else {
                ""
            };
            let _ = writeln!(
                html,
                "<li><a href=\"{}\"{}>{}</a></li>",
                escape_html(&link.href()),
                class,
                escape_html(&link.title)
            );
        }
        html.push_str("</ul>\n</details>\n");
    }
    html.push_str("</nav></aside>\n");
    html
}

fn table_of_contents(entries: &[TocEntry]) -> String {
    if entries.is_empty() {
        return String::new();
    }
    let mut html = String::from("<aside id=\"docs-toc\"><p>On this page</p>\n<ul>\n");
    for entry in entries {
        let _ = writeln!(
            html,
            "<li class=\"toc-h{}\"><a href=\"#{}\">{}</a></li>",
            entry.level,
            entry.id,
            escape_html(&entry.text)
        );
    }
    html.push_str("</ul></aside>\n");
    html
}

pub fn home_page(sections: &[NavSection]) -> String {
    let main = "<article>\n<h1 id=\"welcome\">Welcome to Your Documentation</h1>\n\
                <p>Your content is powered by libSQL with vector search capabilities.</p>\n\
                <section id=\"getting-started\"><h2>Getting Started</h2>\n\
                <p>Select an article from the sidebar or use the search bar for semantic search.</p>\n\
                </section>\n</article>\n";
    let toc = [TocEntry {
        level: 2,
        id: "getting-started".to_string(),
        text: "Getting Started".to_string(),
    }];
    layout(SITE_NAME, sections, "/", main, &toc)
}

pub fn article_page(
    article: &Article,
    rendered: &RenderedMarkdown,
    sections: &[NavSection],
    current_path: &str,
) -> String {
    let mut main = String::from("<article>\n<header>\n");
    let _ = writeln!(main, "<h1>{}</h1>", escape_html(&article.title));
    if !article.tags.is_empty() {
        main.push_str("<ul class=\"tags\">");
        for tag in &article.tags {
            let _ = write!(main, "<li>{}</li>", escape_html(tag));
        }
        main.push_str("</ul>\n");
    }
    main.push_str("</header>\n<div class=\"article-content\">\n");
    main.push_str(&rendered.html);
    main.push_str("</div>\n");
    let _ = writeln!(
        main,
        "<footer><p>Last updated: {}</p></footer>",
        escape_html(&format_updated(&article.updated_at))
    );
    main.push_str("</article>\n");

    layout(&article.title, sections, current_path, &main, &rendered.toc)
}

pub fn not_found_page(sections: &[NavSection], current_path: &str) -> String {
    let main = "<article>\n<h1>Not Found</h1>\n\
                <p>No article exists at this address. Pick one from the sidebar.</p>\n</article>\n";
    layout("Not Found", sections, current_path, main, &[])
}

/// Long US date ("March 5, 2026") for a stored timestamp. Accepts RFC 3339
/// and SQLite's `YYYY-MM-DD HH:MM:SS`; anything else is shown as stored.
pub fn format_updated(updated_at: &str) -> String {
    const LONG_DATE: &str = "%B %-d, %Y";

    if let Ok(dt) = DateTime::parse_from_rfc3339(updated_at) {
        return dt.format(LONG_DATE).to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(updated_at, "%Y-%m-%d %H:%M:%S") {
        return dt.format(LONG_DATE).to_string();
    }
    updated_at.to_string()
}
