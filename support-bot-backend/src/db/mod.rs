mod sqlite;
pub mod tables;

pub use sqlite::{Database, DbError, DbResult};
pub use tables::bots::{LogoChange, SaveBotError};
