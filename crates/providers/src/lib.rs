pub mod openai_compat;
pub mod registry;
pub mod traits;
pub mod wire;
pub(crate) mod util;

// Re-exports for convenience.
pub use registry::ProviderRegistry;
pub use traits::{ChatRequest, ChatResponse, LlmProvider};
pub use wire::convert_to_wire_format;
