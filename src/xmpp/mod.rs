// Stanza codec for the kik flavour of XMPP
// Outbound events are serialized by `encoder`, inbound trees are classified
// by `classify` and mapped to events by `decoder`.

use thiserror::Error;

pub mod accessors;
pub mod classify;
pub mod decoder;
pub mod encoder;

pub use classify::{classify, StanzaKind};
pub use decoder::{decode, decode_str, Decoded};
pub use encoder::encode;

// Custom namespaces
pub mod custom_ns {
    pub const JABBER_CLIENT: &str = "jabber:client";
    pub const GROUPS: &str = "kik:groups";
    pub const RECEIPTS: &str = "kik:message:receipt";
}

// Content `app-id` values that select a media variant
pub mod app_ids {
    pub const CARDS: &str = "com.kik.cards";
    pub const STICKERS: &str = "com.kik.ext.stickers";
    pub const GIF: &str = "com.kik.ext.gif";
    pub const VIDEO_CAMERA: &str = "com.kik.ext.video-camera";
    pub const VIDEO_GALLERY: &str = "com.kik.ext.video-gallery";
    pub const CAMERA: &str = "com.kik.ext.camera";
    pub const GALLERY: &str = "com.kik.ext.gallery";
}

/// Domain that hosts every group jid.
pub const GROUPS_DOMAIN: &str = "groups.kik.com";

/// Fallback shown by clients that cannot render a card.
pub const UNSUPPORTED_CARD_URI: &str = "http://cdn.kik.com/cards/unsupported.html";

/// Errors raised while serializing an outbound event
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Message id must not be empty")]
    EmptyMessageId,

    #[error("Required field '{0}' is empty")]
    EmptyField(&'static str),

    #[error("XML write error: {0}")]
    Xml(#[from] xml::writer::Error),

    #[error("Serialized stanza is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Errors raised while extracting an inbound event from a classified stanza
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Missing element: {path}")]
    MissingElement { path: String },

    #[error("Missing attribute '{attribute}' on {path}")]
    MissingAttribute { path: String, attribute: String },

    #[error("Invalid value '{value}' at {path}")]
    InvalidValue { path: String, value: String },

    #[error("XML parsing error: {0}")]
    Parse(#[from] roxmltree::Error),
}

/// Source of the millisecond timestamps stamped on outbound stanzas.
pub trait Clock {
    fn now_millis(&self) -> u64;
}

/// Wall clock, milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        chrono::Utc::now().timestamp_millis().max(0) as u64
    }
}

/// Clock that always reports the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        self.0
    }
}

/// Whether a peer jid addresses a group, judged by its domain part.
pub fn is_group_jid(jid: &str) -> bool {
    let bare = jid.split('/').next().unwrap_or(jid);
    match bare.rsplit_once('@') {
        Some((_, domain)) => domain.eq_ignore_ascii_case(GROUPS_DOMAIN),
        None => false,
    }
}
