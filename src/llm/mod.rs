pub mod client;
pub mod pricing;
pub mod prompts;

pub use client::{extract_output_text, load_envelope, save_envelope, OpenAiClient, ResponseEnvelope, ResponsesPort};
