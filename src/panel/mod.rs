//! The core transformation: LLM panel records -> expanded, identifier-resolved,
//! India-favored, cleaned rows -> per-company CSV.

pub mod clean;
pub mod expand;
pub mod format;
pub mod guo;
pub mod resolve;
