//! Concrete provider adapters.

mod anthropic;
mod gemini;
mod openai;

pub use anthropic::AnthropicClient;
pub use gemini::GeminiClient;
pub use openai::OpenAiCompatibleClient;
