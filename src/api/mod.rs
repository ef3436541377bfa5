//! HTTP surface: public pages, click tracking, sitemap, health and the
//! owner-scoped admin API.
//!
//! Handlers stay thin. They parse and validate input, call
//! [`crate::application::services::SmartLinkService`] or the renderer and
//! map [`crate::error::AppError`] to a response.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
