//! Sidebar navigation: articles grouped by folder.

use serde::Serialize;

use crate::models::Article;

/// Folder marker for articles that sit at the top level.
pub const ROOT_FOLDER: &str = "root";
const ROOT_LABEL: &str = "Documentation";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    pub slug: String,
    pub title: String,
}

impl NavLink {
    pub fn href(&self) -> String {
        format!("/content/{}", self.slug)
    }

    /// Active when the current path is this article or lives under it.
    pub fn is_active(&self, current_path: &str) -> bool {
        let href = self.href();
        current_path == href || current_path.starts_with(&format!("{}/", href))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavSection {
    pub folder: String,
    pub label: String,
    pub links: Vec<NavLink>,
}

/// Group articles by folder. Sections appear in the order their folder is
/// first seen; links keep the order they arrived in.
pub fn build_sections(articles: &[Article]) -> Vec<NavSection> {
    let mut sections: Vec<NavSection> = Vec::new();

    for article in articles {
        let folder = match article.folder.as_deref() {
            Some(f) if !f.is_empty() => f,
            _ => ROOT_FOLDER,
        };

        let link = NavLink {
            slug: article.slug.clone(),
            title: article.title.clone(),
        };

        match sections.iter_mut().find(|s| s.folder == folder) {
            Some(section) => section.links.push(link),
            None => sections.push(NavSection {
                folder: folder.to_string(),
                label: format_folder_name(folder),
                links: vec![link],
            }),
        }
    }

    sections
}

/// "getting-started" -> "Getting Started"; the root folder has a fixed name.
pub fn format_folder_name(folder: &str) -> String {
    if folder == ROOT_FOLDER {
        return ROOT_LABEL.to_string();
    }
    folder
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
