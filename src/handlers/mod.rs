mod api;
mod content;
mod health;
mod metrics;
mod search;

pub use api::{folder_articles, get_article, list_articles, list_folders};
pub use content::{article_handler, home_handler, not_found_handler};
pub use health::health_handler;
pub use metrics::metrics_handler;
pub use search::{search_handler, search_method_not_allowed};
