pub mod convert;
mod postgres;

pub use postgres::{Db, QueryOutput, DEFAULT_MAX_CONNECTIONS, DEFAULT_STATEMENT_TIMEOUT_MS};
