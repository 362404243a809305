//! These models represent the objects passed around by the agent
//!
//! The conversation is kept in one internal shape and converted to the wire format of the
//! model backend only at the provider boundary (see `providers::utils`). Tool requests keep
//! the raw argument text the model produced, so a request whose arguments do not parse can
//! still be echoed back to the model next to the error it caused.
pub mod message;
pub mod role;
pub mod tool;
