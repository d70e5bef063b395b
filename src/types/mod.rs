// Public modules
pub mod chat_completion;
pub mod chat_completion_chunk;
pub mod chat_completion_create_params;
pub mod chat_message;
pub mod model;
pub mod usage;

// Re-exports
pub use chat_completion::{ChatCompletion, Choice, FinishReason, ResponseMessage};
pub use chat_completion_chunk::{ChatCompletionChunk, ChoiceDelta, ChunkChoice, GroqChunkExtension};
pub use chat_completion_create_params::ChatCompletionCreateParams;
pub use chat_message::{ChatMessage, ChatRole};
pub use model::{DEFAULT_MODEL_ALIAS, KnownModel, Model, model_aliases};
pub use usage::Usage;
