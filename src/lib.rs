pub mod config;
pub mod context;
pub mod db;
pub mod dispatch;
pub mod embed;
pub mod error;
pub mod mcp;
pub mod query;
pub mod report;
pub mod rules;
pub mod smartcode;
pub mod types;
pub mod whitelist;
