//! Domain layer: entities, repository contracts and the rules that do not
//! depend on infrastructure.
//!
//! - [`entities`] - SmartLink and User data model plus creation defaults
//! - [`repositories`] - Data access trait definitions
//! - [`authorization`] - The single ownership predicate for admin operations
//! - [`platform_lookup`] - Contract for the external link resolver
//! - [`view_event`] / [`view_worker`] - Fire-and-forget view counting
//!
//! # View Processing Flow
//!
//! 1. A public page handler resolves a visible SmartLink
//! 2. A [`view_event::ViewEvent`] is pushed to a bounded channel (dropped when full)
//! 3. [`view_worker::run_view_worker`] applies the atomic increment with retry

pub mod authorization;
pub mod entities;
pub mod platform_lookup;
pub mod repositories;
pub mod view_event;
pub mod view_worker;
