// Common test utilities for integration tests
// Not every test binary uses every helper
#![allow(dead_code)]

use std::sync::Once;

use log::LevelFilter;
use roxmltree::Document;

use kik_stanza::xmpp::encoder::encode_to_string;
use kik_stanza::{FixedClock, OutboundEvent};

// Initialize logging once
static INIT_LOGGER: Once = Once::new();

/// Fixed instant used by every encoder test
pub const NOW: u64 = 1_650_000_000_123;

pub fn setup_logging() {
    INIT_LOGGER.call_once(|| {
        let _ = env_logger::Builder::new()
            .filter_level(LevelFilter::Debug)
            .is_test(true)
            .try_init();
    });
}

/// Encode with the fixed clock, panicking on failure
pub fn encode_fixed(event: impl Into<OutboundEvent>, message_id: &str) -> String {
    setup_logging();
    encode_to_string(&event.into(), message_id, &FixedClock(NOW)).expect("encoding failed")
}

/// Self-closing tags are written as `<x />`; fold them so expectations stay compact
pub fn compact(stanza: &str) -> String {
    stanza.replace(" />", "/>")
}

/// Names of the direct child elements of the root, in order
pub fn child_names(stanza: &str) -> Vec<String> {
    let doc = Document::parse(stanza).expect("stanza is not well-formed");
    doc.root_element()
        .children()
        .filter(|n| n.is_element())
        .map(|n| n.tag_name().name().to_string())
        .collect()
}

/// Turn an outbound stanza into what the peer receives: the server adds `from`
pub fn relayed_from(stanza: &str, from: &str) -> String {
    stanza.replacen("<message ", &format!("<message from=\"{}\" ", from), 1)
}

/// Group stanzas also gain a `g` element naming the group they were relayed through
pub fn relayed_to_group(stanza: &str, from: &str, group_jid: &str) -> String {
    let relayed = relayed_from(stanza, from);
    let open_end = relayed.find('>').expect("stanza has no opening tag") + 1;
    format!(
        "{}<g jid=\"{}\" />{}",
        &relayed[..open_end],
        group_jid,
        &relayed[open_end..]
    )
}
