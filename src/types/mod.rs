// Public modules
pub mod content;
pub mod generate_content;
pub mod model;
pub mod model_info;
pub mod model_list_response;

// Re-exports
pub use content::{Content, Part, Role};
pub use generate_content::{
    Candidate, GenerateContentRequest, GenerateContentResponse, PromptFeedback, UsageMetadata,
};
pub use model::{KnownModel, Model};
pub use model_info::ModelInfo;
pub use model_list_response::ModelListResponse;
