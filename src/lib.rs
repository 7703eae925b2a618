// Bidirectional codec between kik stanzas and typed domain events
pub mod config;
pub mod models;
pub mod utils;
pub mod xmpp;

// Re-export main types for convenience
pub use models::*;
pub use xmpp::{decode, decode_str, encode, Clock, DecodeError, Decoded, EncodeError, FixedClock, SystemClock};
