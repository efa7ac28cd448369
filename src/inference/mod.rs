pub mod backend;
pub mod error;
pub mod gateway;
pub mod reliability;
pub mod types;

pub use backend::{InferenceBackend, OpenAiCompatibleBackend};
pub use error::{InferenceError, InferenceErrorKind};
pub use gateway::InferenceGateway;
pub use reliability::ReliabilityLayer;
pub use types::{InferenceConfig, ReliabilityConfig};
