//! Shared application state injected into every handler.

use axum::http::HeaderMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::services::{IdentityProvider, SmartLinkService};
use crate::domain::platform_lookup::PlatformLookup;
use crate::domain::repositories::SmartLinkRepository;
use crate::domain::view_event::ViewEvent;
use crate::infrastructure::cache::CacheService;
use crate::utils::base_url::request_base_url;

#[derive(Clone)]
pub struct AppState {
    pub smartlink_service: Arc<SmartLinkService<dyn SmartLinkRepository>>,
    pub identity: Arc<dyn IdentityProvider>,
    pub platform_lookup: Arc<dyn PlatformLookup>,
    pub cache: Arc<dyn CacheService>,
    pub view_sender: mpsc::Sender<ViewEvent>,
    /// Overrides the request-derived base URL when set.
    pub public_base_url: Option<String>,
    pub default_country: String,
    /// Trust `X-Forwarded-*` headers (`BEHIND_PROXY`).
    pub behind_proxy: bool,
}

impl AppState {
    /// Base URL for links generated while answering this request.
    pub fn base_url(&self, headers: &HeaderMap) -> String {
        request_base_url(headers, self.public_base_url.as_deref(), self.behind_proxy)
    }
}
