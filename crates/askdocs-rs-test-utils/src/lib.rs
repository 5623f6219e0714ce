//! Test helpers shared across askdocs crates.

pub mod knowledge_base;
pub mod secrets;
pub mod sinks;

pub use knowledge_base::ScriptedKnowledgeBase;
pub use secrets::StaticSecretsProvider;
pub use sinks::{RecordingAttemptSink, RecordingNoticeSink};
