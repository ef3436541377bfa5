//! Server-side HTML and XML rendering for the public surface.
//!
//! - [`page`] - SmartLink landing page and the 404 page
//! - [`analytics`] - tracker bootstrap snippets
//! - [`seo`] - title, description and social meta values
//! - [`css`] - inline stylesheet parameterized by the design config
//! - [`structured_data`] - schema.org JSON-LD
//! - [`sitemap`] - XML sitemap
//! - [`bot`] - crawler detection

pub mod analytics;
pub mod bot;
pub mod css;
pub mod escape;
pub mod page;
pub mod seo;
pub mod sitemap;
pub mod structured_data;

pub use bot::is_bot;
pub use page::{NotFoundPage, RenderContext, render_smartlink};
pub use sitemap::render_sitemap;
pub use structured_data::structured_data;
