//! NL2SQL Pipeline - Orchestration
//!
//! Ties generation, validation, and correction together: a natural-language
//! question goes in, a validated SQL statement with its full correction
//! audit trail comes out. Model output is never trusted; every candidate is
//! re-validated from scratch.

pub mod orchestrator;
pub mod pipeline;

pub use orchestrator::{CorrectionOrchestrator, OrchestratorState};
pub use pipeline::{Nl2SqlPipeline, PipelineOutput};
