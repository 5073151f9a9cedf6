//! Small shared utilities: id generation and display-safety redaction.

pub mod ids;
pub mod redact;

pub use ids::IdGenerator;
pub use redact::{REDACTED_PLACEHOLDER, redact_state, strip_markup};
