pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod event_repo;
pub mod memory;
pub mod user_repo;

pub use booking_repo::PgBookingLedger;
pub use database::DbClient;
pub use event_repo::PgEventRepository;
pub use memory::MemoryStore;
pub use user_repo::PgUserRepository;
