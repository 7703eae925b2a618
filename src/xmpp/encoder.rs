// Outbound stanza serialization
// One rule per outbound event. Every user supplied string goes through
// `escape_xml` here, so the writer itself runs with escaping disabled.

use log::debug;
use xml::writer::{EmitterConfig, EventWriter, XmlEvent};

use super::{custom_ns, is_group_jid, app_ids, Clock, EncodeError, UNSUPPORTED_CARD_URI};
use crate::models::{ChatMessage, DeliveredReceipt, LinkShare, OutboundEvent, ReadReceipt, TypingStatus};
use crate::utils::{escape_xml, preview_of};

/// Serialize `event` with the caller's `message_id`, stamped with `clock`'s current time.
pub fn encode(event: &OutboundEvent, message_id: &str, clock: &dyn Clock) -> Result<Vec<u8>, EncodeError> {
    let now = clock.now_millis();
    let bytes = match event {
        OutboundEvent::ChatMessage(e) => encode_chat_message(e, message_id, now)?,
        OutboundEvent::ReadReceipt(e) => encode_read_receipt(e, message_id, now)?,
        OutboundEvent::DeliveredReceipt(e) => encode_delivered_receipt(e, message_id, now)?,
        OutboundEvent::TypingStatus(e) => encode_typing_status(e, message_id, now)?,
        OutboundEvent::LinkShare(e) => encode_link_share(e, message_id, now)?,
    };
    debug!("Encoded stanza {} ({} bytes)", message_id, bytes.len());
    Ok(bytes)
}

/// Same as [`encode`], returned as a `String`.
pub fn encode_to_string(event: &OutboundEvent, message_id: &str, clock: &dyn Clock) -> Result<String, EncodeError> {
    Ok(String::from_utf8(encode(event, message_id, clock)?)?)
}

pub fn encode_chat_message(message: &ChatMessage, message_id: &str, now: u64) -> Result<Vec<u8>, EncodeError> {
    check_preconditions(message_id, &message.peer_id)?;
    let timestamp = now.to_string();
    let message_type = if message.is_group { "groupchat" } else { "chat" };

    let mut stanza = StanzaWriter::new();
    stanza.start("message", &[
        ("type", message_type),
        ("to", message.peer_id.as_str()),
        ("id", message_id),
        ("cts", timestamp.as_str()),
    ])?;
    stanza.text_element("body", &[], &message.body)?;
    if let Some(bot) = message.bot_mention_id.as_deref().filter(|b| !b.is_empty()) {
        stanza.start("mention", &[])?;
        stanza.text_element("bot", &[], bot)?;
        stanza.end()?;
    }
    stanza.text_element("preview", &[], preview_of(&message.body))?;
    stanza.empty("kik", &[("push", "true"), ("qos", "true"), ("timestamp", timestamp.as_str())])?;
    stanza.empty("request", &[("xmlns", custom_ns::RECEIPTS), ("r", "true"), ("d", "true")])?;
    stanza.empty("ri", &[])?;
    stanza.end()?;
    Ok(stanza.finish())
}

pub fn encode_read_receipt(receipt: &ReadReceipt, message_id: &str, now: u64) -> Result<Vec<u8>, EncodeError> {
    check_preconditions(message_id, &receipt.peer_id)?;
    let mut stanza = receipt_stanza(&receipt.peer_id, message_id, now, "read", &receipt.receipt_target_id)?;
    if let Some(group_id) = &receipt.group_id {
        stanza.empty("g", &[("jid", group_id.as_str())])?;
    }
    stanza.end()?;
    Ok(stanza.finish())
}

pub fn encode_delivered_receipt(receipt: &DeliveredReceipt, message_id: &str, now: u64) -> Result<Vec<u8>, EncodeError> {
    check_preconditions(message_id, &receipt.peer_id)?;
    let mut stanza = receipt_stanza(&receipt.peer_id, message_id, now, "delivered", &receipt.receipt_target_id)?;
    stanza.end()?;
    Ok(stanza.finish())
}

pub fn encode_typing_status(status: &TypingStatus, message_id: &str, now: u64) -> Result<Vec<u8>, EncodeError> {
    check_preconditions(message_id, &status.peer_id)?;
    let timestamp = now.to_string();
    let message_type = if status.is_group { "groupchat" } else { "chat" };

    let mut stanza = StanzaWriter::new();
    stanza.start("message", &[("type", message_type), ("to", status.peer_id.as_str()), ("id", message_id)])?;
    if status.is_group {
        stanza.empty("pb", &[])?;
    }
    stanza.empty("kik", &[("push", "false"), ("qos", "false"), ("timestamp", timestamp.as_str())])?;
    stanza.empty("is-typing", &[("val", if status.is_typing { "true" } else { "false" })])?;
    stanza.end()?;
    Ok(stanza.finish())
}

pub fn encode_link_share(share: &LinkShare, message_id: &str, now: u64) -> Result<Vec<u8>, EncodeError> {
    check_preconditions(message_id, &share.peer_id)?;
    let timestamp = now.to_string();

    let mut stanza = StanzaWriter::new();
    if is_group_jid(&share.peer_id) {
        stanza.start("message", &[
            ("type", "groupchat"),
            ("xmlns", custom_ns::GROUPS),
            ("to", share.peer_id.as_str()),
            ("id", message_id),
            ("cts", timestamp.as_str()),
        ])?;
    } else {
        stanza.start("message", &[
            ("type", "chat"),
            ("to", share.peer_id.as_str()),
            ("id", message_id),
            ("cts", timestamp.as_str()),
        ])?;
    }
    stanza.empty("pb", &[])?;
    stanza.empty("kik", &[("push", "true"), ("qos", "true"), ("timestamp", timestamp.as_str())])?;
    stanza.empty("request", &[("xmlns", custom_ns::RECEIPTS), ("r", "true"), ("d", "true")])?;

    stanza.start("content", &[("id", message_id), ("app-id", app_ids::CARDS), ("v", "2")])?;
    stanza.start("strings", &[])?;
    stanza.text_element("app-name", &[], &share.app_name)?;
    stanza.text_element("layout", &[], "article")?;
    stanza.text_element("title", &[], &share.title)?;
    stanza.text_element("text", &[], &share.text)?;
    stanza.text_element("allow-forward", &[], "true")?;
    stanza.end()?;
    stanza.empty("extras", &[])?;
    stanza.empty("hashes", &[])?;
    stanza.empty("images", &[])?;
    stanza.start("uris", &[])?;
    stanza.text_element("uri", &[("platform", "cards")], &share.link)?;
    stanza.text_element("uri", &[], "")?;
    stanza.text_element("uri", &[], UNSUPPORTED_CARD_URI)?;
    stanza.end()?;
    stanza.end()?;

    stanza.end()?;
    Ok(stanza.finish())
}

fn check_preconditions(message_id: &str, peer_id: &str) -> Result<(), EncodeError> {
    if message_id.is_empty() {
        return Err(EncodeError::EmptyMessageId);
    }
    if peer_id.is_empty() {
        return Err(EncodeError::EmptyField("peer_id"));
    }
    Ok(())
}

// Shared prefix of read and delivered receipts, left open for an optional group marker
fn receipt_stanza(
    peer_id: &str,
    message_id: &str,
    now: u64,
    receipt_type: &str,
    target_id: &str,
) -> Result<StanzaWriter, EncodeError> {
    if target_id.is_empty() {
        return Err(EncodeError::EmptyField("receipt_target_id"));
    }
    let timestamp = now.to_string();

    let mut stanza = StanzaWriter::new();
    stanza.start("message", &[("type", "receipt"), ("id", message_id), ("to", peer_id), ("cts", timestamp.as_str())])?;
    stanza.empty("kik", &[("push", "false"), ("qos", "true"), ("timestamp", timestamp.as_str())])?;
    stanza.start("receipt", &[("xmlns", custom_ns::RECEIPTS), ("type", receipt_type)])?;
    stanza.empty("msgid", &[("id", target_id)])?;
    stanza.end()?;
    Ok(stanza)
}

/// Thin wrapper over the xml-rs writer that escapes every attribute value and text node.
struct StanzaWriter {
    writer: EventWriter<Vec<u8>>,
}

impl StanzaWriter {
    fn new() -> Self {
        let mut config = EmitterConfig::new()
            .write_document_declaration(false)
            .perform_indent(false)
            .normalize_empty_elements(true);
        // Values arrive already escaped by `escape_xml`
        config.perform_escaping = false;
        StanzaWriter {
            writer: EventWriter::new_with_config(Vec::new(), config),
        }
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), EncodeError> {
        let escaped: Vec<(&str, String)> = attrs
            .iter()
            .map(|(key, value)| (*key, escape_xml(value)))
            .collect();

        let mut start = XmlEvent::start_element(name);
        for (key, value) in &escaped {
            start = start.attr(*key, value.as_str());
        }
        self.writer.write(start)?;
        Ok(())
    }

    fn end(&mut self) -> Result<(), EncodeError> {
        self.writer.write(XmlEvent::end_element())?;
        Ok(())
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), EncodeError> {
        self.start(name, attrs)?;
        self.end()
    }

    fn text_element(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> Result<(), EncodeError> {
        self.start(name, attrs)?;
        let escaped = escape_xml(text);
        if !escaped.is_empty() {
            self.writer.write(XmlEvent::characters(&escaped))?;
        }
        self.end()
    }

    fn finish(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}
