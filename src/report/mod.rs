mod csv;
mod registry;
mod runner;

pub use csv::to_csv;
pub use registry::{catalog, is_safe_select, ReportDef, ReportRegistry};
pub use runner::{bind_report_params, run_report};
