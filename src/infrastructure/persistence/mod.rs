//! Repository implementations.
//!
//! - [`PgSmartLinkRepository`] - SmartLink storage, counters and identifier checks
//! - [`PgUserRepository`] - Users
//! - [`PgTokenRepository`] - API token storage and validation
//! - [`MemorySmartLinkRepository`] - In-process SmartLink store with the same constraints

pub mod memory_smartlink_repository;
pub mod pg_smartlink_repository;
pub mod pg_token_repository;
pub mod pg_user_repository;

pub use memory_smartlink_repository::MemorySmartLinkRepository;
pub use pg_smartlink_repository::PgSmartLinkRepository;
pub use pg_token_repository::PgTokenRepository;
pub use pg_user_repository::PgUserRepository;
