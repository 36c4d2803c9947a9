pub mod config;
pub mod error;
pub mod state;
pub mod types;

pub use config::{ApiConfig, AppConfig, CallConfig, GeneralConfig};
pub use error::{ApiError, ConfigError, SessionError};
pub use state::{Action, CallView, Effect, SimulationState, Step};
pub use types::{
    AnalysisRequest, CallEvent, ConversationLog, ConversationTurn, FunctionCall, ImagePayload,
    Message, TranscriptionRequest,
};
