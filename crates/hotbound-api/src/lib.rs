pub mod client;
pub mod host;
pub mod http;
pub mod multipart;
pub mod payload;
pub mod recording;
pub mod transport;

pub use client::ApiClient;
pub use host::{ApiHost, Completion, Operation, OperationKind};
pub use http::HttpTransport;
pub use multipart::MultipartBody;
pub use recording::{RecordedRequest, RecordingTransport};
pub use transport::{FormPart, Transport};
