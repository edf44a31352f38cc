mod compiler;
mod engine;

pub use compiler::{build_select, DEFAULT_LIMIT, MAX_LIMIT};
pub use engine::run_select;
