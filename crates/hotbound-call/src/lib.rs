pub mod adapter;
pub mod normalize;
pub mod scripted;
pub mod sdk;

pub use adapter::CallSessionAdapter;
pub use normalize::normalize;
pub use scripted::{ScriptControl, ScriptedSdk};
pub use sdk::{RawSignal, VoiceSdk};
