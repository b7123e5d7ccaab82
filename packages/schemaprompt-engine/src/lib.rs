pub mod adapters;
pub mod cancel;
pub mod collector;
pub mod compat;
pub mod config;
pub mod error;
pub mod interaction;
pub mod label;
pub mod logging;
pub mod message;
pub mod schema;
pub mod session;
pub mod validator;
pub mod walker;

pub use error::{EngineError, Incompatibility, IncompatibleReason, PromptError};
pub use label::LabelSpec;
pub use schema::{SchemaKind, SchemaNode};
pub use session::Session;
