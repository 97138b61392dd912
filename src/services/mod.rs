pub mod journal_merger;
pub mod oracle;
pub mod reference_bank;
pub mod result_sink;
pub mod submission_parser;

pub use oracle::{LlmOracle, ScoringOracle, Verdict};
pub use reference_bank::ReferenceBank;
pub use result_sink::{ResultArtifacts, ResultSink};
