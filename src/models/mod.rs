pub mod grade;
pub mod loaders;
pub mod merge;
pub mod reference;
pub mod submission;

pub use grade::{AggregateScore, GradeRecord, GradingStats, MAX_SCORE, MIN_SCORE};
pub use loaders::{load_table, RawTable};
pub use merge::MergeReport;
pub use reference::ReferenceItem;
pub use submission::SubmissionTable;
