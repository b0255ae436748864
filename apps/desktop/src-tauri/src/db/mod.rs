//! Local SQLite database operations.

pub mod date_utils;
pub mod error;
pub mod repository;
pub mod schema;

pub use error::DbError;
pub use repository::{
    CalendarData, CardRepository, DeckRepository, DeckStats, LocalDeviceInfo, LocalSyncState,
    MdFileInfo, PendingReview, SettingsRepository, SqliteRepository, StateRepository,
    StatsRepository, StudyStats, SyncRepository,
};
