//! HTTP request handlers.
//!
//! - [`public`], [`track`], [`sitemap`], [`public_api`] - anonymous surface
//! - [`smartlinks`] - authenticated admin API
//! - [`health`] - component health

pub mod health;
pub mod public;
pub mod public_api;
pub mod sitemap;
pub mod smartlinks;
pub mod track;

pub use health::health_handler;
pub use public::{short_id_page_handler, smartlink_page_handler};
pub use public_api::public_smartlink_handler;
pub use sitemap::sitemap_handler;
pub use smartlinks::{
    create_smartlink_handler, delete_smartlink_handler, fetch_platform_links_handler,
    get_smartlink_handler, list_smartlinks_handler, publish_smartlink_handler,
    smartlink_analytics_handler, unpublish_smartlink_handler, update_smartlink_handler,
};
pub use track::track_click_handler;
