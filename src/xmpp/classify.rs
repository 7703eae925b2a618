// Stanza classification
// Picks the inbound variant for a message stanza before any field is extracted.
// Markers that own the whole stanza (receipt, sysmsg, content) come first. A body wins
// over is-typing and status, which chat messages may carry alongside it.

use log::debug;
use roxmltree::Node;

use super::accessors::NodeExt;
use super::app_ids;

/// Variant tag chosen for an inbound stanza.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StanzaKind {
    ChatMessage,
    GroupChatMessage,
    MessageRead,
    MessageDelivered,
    Typing,
    GroupTyping,
    GroupStatus,
    GroupSystemMessage,
    GroupReceipts,
    FriendAttribution,
    StatusResponse,
    Image,
    GroupSticker,
    Gif,
    Video,
    Card,
}

/// Classify a stanza by root name, `type` attribute and well-known children.
///
/// Returns `None` for stanzas that match no known variant.
pub fn classify(stanza: Node<'_, '_>) -> Option<StanzaKind> {
    if !stanza.is_element() || stanza.tag_name().name() != "message" {
        return None;
    }

    let kind = match stanza.attr("type") {
        Some("receipt") => classify_receipt(stanza),
        Some("chat") => classify_chat(stanza),
        Some("groupchat") => classify_groupchat(stanza),
        _ => None,
    };

    debug!(
        "Classified message type={:?} id={:?} as {:?}",
        stanza.attr("type"),
        stanza.attr("id"),
        kind
    );
    kind
}

fn classify_receipt(stanza: Node<'_, '_>) -> Option<StanzaKind> {
    let receipt = stanza.child("receipt")?;
    match receipt.attr("type") {
        Some("read") => Some(StanzaKind::MessageRead),
        Some("delivered") => Some(StanzaKind::MessageDelivered),
        _ => None,
    }
}

fn classify_chat(stanza: Node<'_, '_>) -> Option<StanzaKind> {
    if stanza.child("receipt").is_some() {
        return classify_receipt(stanza);
    }
    if stanza.child("friend-attribution").is_some() {
        return Some(StanzaKind::FriendAttribution);
    }
    if let Some(content) = stanza.child("content") {
        return Some(classify_content(content, false));
    }
    if stanza.child("body").is_some() {
        return Some(StanzaKind::ChatMessage);
    }
    if stanza.child("is-typing").is_some() {
        return Some(StanzaKind::Typing);
    }
    if stanza.child("status").is_some() {
        return Some(StanzaKind::StatusResponse);
    }
    None
}

fn classify_groupchat(stanza: Node<'_, '_>) -> Option<StanzaKind> {
    if stanza.child("receipt").is_some() {
        return Some(StanzaKind::GroupReceipts);
    }
    if stanza.child("sysmsg").is_some() {
        return Some(StanzaKind::GroupSystemMessage);
    }
    if let Some(content) = stanza.child("content") {
        return Some(classify_content(content, true));
    }
    if stanza.child("body").is_some() {
        return Some(StanzaKind::GroupChatMessage);
    }
    if stanza.child("is-typing").is_some() {
        return Some(StanzaKind::GroupTyping);
    }
    if stanza.child("status").is_some() {
        return Some(StanzaKind::GroupStatus);
    }
    None
}

// Stickers only arrive through groups; a sticker app-id elsewhere renders as a plain card.
fn classify_content(content: Node<'_, '_>, in_group: bool) -> StanzaKind {
    match content.attr("app-id") {
        Some(app_ids::STICKERS) if in_group => StanzaKind::GroupSticker,
        Some(app_ids::GIF) => StanzaKind::Gif,
        Some(app_ids::VIDEO_CAMERA) | Some(app_ids::VIDEO_GALLERY) => StanzaKind::Video,
        Some(app_ids::CAMERA) | Some(app_ids::GALLERY) => StanzaKind::Image,
        _ => StanzaKind::Card,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roxmltree::Document;

    fn kind_of(xml: &str) -> Option<StanzaKind> {
        let doc = Document::parse(xml).unwrap();
        classify(doc.root_element())
    }

    #[test]
    fn test_receipts_never_cross_classify() {
        let read = r#"<message type="receipt" id="1" from="a@talk.kik.com"><receipt xmlns="kik:message:receipt" type="read"><msgid id="m"/></receipt></message>"#;
        let delivered = r#"<message type="receipt" id="1" from="a@talk.kik.com"><receipt xmlns="kik:message:receipt" type="delivered"><msgid id="m"/></receipt></message>"#;
        let other = r#"<message type="receipt" id="1" from="a@talk.kik.com"><receipt type="pushed"/></message>"#;

        assert_eq!(kind_of(read), Some(StanzaKind::MessageRead));
        assert_eq!(kind_of(delivered), Some(StanzaKind::MessageDelivered));
        assert_eq!(kind_of(other), None);
    }

    #[test]
    fn test_chat_priority() {
        assert_eq!(
            kind_of(r#"<message type="chat"><body>hi</body><is-typing val="false"/></message>"#),
            Some(StanzaKind::ChatMessage)
        );
        assert_eq!(
            kind_of(r#"<message type="chat"><is-typing val="true"/></message>"#),
            Some(StanzaKind::Typing)
        );
        assert_eq!(
            kind_of(r#"<message type="chat"><body>hi</body><status>x</status></message>"#),
            Some(StanzaKind::ChatMessage)
        );
        assert_eq!(
            kind_of(r#"<message type="chat"><status jid="b@talk.kik.com">x</status></message>"#),
            Some(StanzaKind::StatusResponse)
        );
        assert_eq!(
            kind_of(r#"<message type="chat"><friend-attribution/><body>hi</body></message>"#),
            Some(StanzaKind::FriendAttribution)
        );
    }

    #[test]
    fn test_groupchat_priority() {
        assert_eq!(
            kind_of(r#"<message type="groupchat"><g jid="g@groups.kik.com"/><sysmsg>joined</sysmsg><status>s</status></message>"#),
            Some(StanzaKind::GroupSystemMessage)
        );
        assert_eq!(
            kind_of(r#"<message type="groupchat"><g jid="g@groups.kik.com"/><status>s</status></message>"#),
            Some(StanzaKind::GroupStatus)
        );
        assert_eq!(
            kind_of(r#"<message type="groupchat"><body>hi</body></message>"#),
            Some(StanzaKind::GroupChatMessage)
        );
        assert_eq!(
            kind_of(r#"<message type="groupchat"><g jid="g@groups.kik.com"/><body>hi</body><is-typing val="false"/></message>"#),
            Some(StanzaKind::GroupChatMessage)
        );
        assert_eq!(
            kind_of(r#"<message type="groupchat"><g jid="g@groups.kik.com"/><is-typing val="true"/></message>"#),
            Some(StanzaKind::GroupTyping)
        );
        assert_eq!(
            kind_of(r#"<message type="groupchat"><receipt type="read"/></message>"#),
            Some(StanzaKind::GroupReceipts)
        );
    }

    #[test]
    fn test_content_app_ids() {
        let content = |kind: &str, app: &str| {
            kind_of(&format!(
                r#"<message type="{}"><content app-id="{}"/></message>"#,
                kind, app
            ))
        };

        assert_eq!(content("groupchat", app_ids::STICKERS), Some(StanzaKind::GroupSticker));
        assert_eq!(content("chat", app_ids::STICKERS), Some(StanzaKind::Card));
        assert_eq!(content("chat", app_ids::GIF), Some(StanzaKind::Gif));
        assert_eq!(content("groupchat", app_ids::VIDEO_GALLERY), Some(StanzaKind::Video));
        assert_eq!(content("chat", app_ids::CAMERA), Some(StanzaKind::Image));
        assert_eq!(content("chat", app_ids::CARDS), Some(StanzaKind::Card));
    }

    #[test]
    fn test_unknown_shapes() {
        assert_eq!(kind_of(r#"<iq type="result"/>"#), None);
        assert_eq!(kind_of(r#"<message type="headline"><body>x</body></message>"#), None);
        assert_eq!(kind_of(r#"<message><body>x</body></message>"#), None);
        assert_eq!(kind_of(r#"<message type="chat"><kik timestamp="1"/></message>"#), None);
    }
}
