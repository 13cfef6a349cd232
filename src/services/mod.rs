pub mod gemini;
pub mod progress;
