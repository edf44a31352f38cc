mod report;
mod select;

pub use report::{ReportExplain, ReportFormat, ReportMeta, ReportParams, ReportResponse};
pub use select::{
  CompiledSelect, EmbedFlags, OrderBy, SelectMeta, SelectParams, SelectResponse,
};
