//! Core domain entities.
//!
//! - [`SmartLink`] - A landing page aggregating streaming links for one track
//! - [`User`] - The owner of SmartLinks
//!
//! Creation uses separate input structs (`NewSmartLink`, `NewUser`) and edits
//! go through [`SmartLinkPatch`]. [`SmartLinkDefaults`] fills the optional
//! configuration blocks once, when a record is constructed.

pub mod defaults;
pub mod smartlink;
pub mod user;

pub use defaults::{DEFAULT_OG_TYPE, DEFAULT_TWITTER_CARD, SmartLinkDefaults};
pub use smartlink::{
    AnalyticsConfig, ClickCounters, ColorScheme, CustomScript, DesignConfig, DesignTemplate,
    GLOBAL_COUNTRY, NewSmartLink, Platform, PlatformLink, ScriptPosition, SeoConfig, SmartLink,
    SmartLinkPatch, SmartLinkStatus, TrackerConfig, conversion_rate,
};
pub use user::{NewUser, User, UserRole};
