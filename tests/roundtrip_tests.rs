// Encode outbound events, read the bytes back, and compare field values.
// The server relays stanzas with a `from` attribute, which is added here so
// the inbound decoder can be used on the result.

mod common;
use common::{encode_fixed, relayed_from, relayed_to_group, NOW};

use roxmltree::Document;

use kik_stanza::utils::{escape_xml, unescape_xml};
use kik_stanza::xmpp::accessors::NodeExt;
use kik_stanza::{
    decode_str, ChatMessage, Decoded, DeliveredReceipt, InboundEvent, LinkShare, ReadReceipt,
    TypingStatus,
};

const ME: &str = "me@talk.kik.com";
const GROUP: &str = "1100_g@groups.kik.com";

fn decode_relayed(stanza: &str) -> InboundEvent {
    match decode_str(&relayed_from(stanza, ME)) {
        Ok(Decoded::Event(event)) => event,
        other => panic!("Expected an event, got {:?}", other),
    }
}

#[test]
fn test_chat_message_roundtrip() {
    let bodies = [
        "plain",
        "",
        "<tag attr=\"v\">&amp; 'quoted'</tag>",
        "emoji 🎉🎉🎉 and accents àéîõü repeated beyond twenty characters",
    ];

    for body in bodies {
        let stanza = encode_fixed(ChatMessage::direct("friend@talk.kik.com", body), "rt-chat");
        match decode_relayed(&stanza) {
            InboundEvent::ChatMessage(msg) => {
                assert_eq!(msg.body.as_deref(), Some(body));
                assert_eq!(msg.preview, Some(body.chars().take(20).collect::<String>()));
                assert_eq!(msg.header.message_id, "rt-chat");
                assert_eq!(msg.header.to_jid.as_deref(), Some("friend@talk.kik.com"));
                assert_eq!(msg.header.timestamp, Some(NOW));
                assert!(msg.request_delivered_receipt);
                assert!(msg.request_read_receipt);
            }
            other => panic!("Expected chat message, got {:?}", other),
        }
    }
}

#[test]
fn test_group_chat_message_fields_survive() {
    let event = ChatMessage::group("1100_g@groups.kik.com", "to the group").with_bot_mention("bot@talk.kik.com");
    let stanza = encode_fixed(event.clone(), "rt-group");
    let doc = Document::parse(&stanza).unwrap();
    let root = doc.root_element();

    assert_eq!(root.attr("to"), Some(event.peer_id.as_str()));
    assert_eq!(root.attr("type"), Some("groupchat"));
    assert_eq!(root.child_text("body"), Some(event.body.clone()));
    assert_eq!(root.child_text_at(&["mention", "bot"]), event.bot_mention_id);
    let cts: u64 = root.attr("cts").unwrap().parse().unwrap();
    assert_eq!(cts, NOW);
}

fn decode_in_group(stanza: &str) -> InboundEvent {
    match decode_str(&relayed_to_group(stanza, ME, GROUP)) {
        Ok(Decoded::Event(event)) => event,
        other => panic!("Expected an event, got {:?}", other),
    }
}

#[test]
fn test_group_chat_message_roundtrip() {
    let event = ChatMessage::group(GROUP, "Fish & chips <tonight>");
    let stanza = encode_fixed(event.clone(), "rt-group-2");

    match decode_in_group(&stanza) {
        InboundEvent::GroupChatMessage(msg) => {
            assert_eq!(msg.group_jid, GROUP);
            assert_eq!(msg.message.body.as_deref(), Some(event.body.as_str()));
            assert_eq!(msg.message.header.message_id, "rt-group-2");
            assert_eq!(msg.message.header.timestamp, Some(NOW));
            assert!(msg.message.request_read_receipt);
        }
        other => panic!("Expected group chat message, got {:?}", other),
    }
}

#[test]
fn test_group_typing_roundtrip() {
    for is_typing in [true, false] {
        let stanza = encode_fixed(
            TypingStatus {
                peer_id: GROUP.to_string(),
                is_group: true,
                is_typing,
            },
            "rt-group-typing",
        );
        match decode_in_group(&stanza) {
            InboundEvent::GroupTyping(event) => {
                assert_eq!(event.is_typing, is_typing);
                assert_eq!(event.group_jid, GROUP);
                assert_eq!(event.header.timestamp, Some(NOW));
            }
            other => panic!("Expected group typing event, got {:?}", other),
        }
    }
}

#[test]
fn test_group_link_share_roundtrip() {
    let share = LinkShare {
        peer_id: GROUP.to_string(),
        link: "https://example.com/news?id=7&lang=en".to_string(),
        title: "Group <read>".to_string(),
        text: "Worth it & more".to_string(),
        app_name: "News".to_string(),
    };
    let stanza = encode_fixed(share.clone(), "rt-group-link");

    match decode_in_group(&stanza) {
        InboundEvent::Card(card) => {
            assert_eq!(card.group_jid.as_deref(), Some(GROUP));
            assert_eq!(card.title.as_deref(), Some(share.title.as_str()));
            assert_eq!(card.text.as_deref(), Some(share.text.as_str()));
            assert_eq!(card.app_name.as_deref(), Some(share.app_name.as_str()));
            assert_eq!(card.uri.as_deref(), Some(share.link.as_str()));
        }
        other => panic!("Expected card, got {:?}", other),
    }
}

#[test]
fn test_receipts_roundtrip() {
    let read = encode_fixed(
        ReadReceipt::in_group("friend@talk.kik.com", "target-9", "1100_g@groups.kik.com"),
        "rt-read",
    );
    match decode_relayed(&read) {
        InboundEvent::MessageRead(event) => {
            assert_eq!(event.receipt_message_id, "target-9");
            assert_eq!(event.group_jid.as_deref(), Some("1100_g@groups.kik.com"));
        }
        other => panic!("Expected read receipt, got {:?}", other),
    }

    let read_direct = encode_fixed(ReadReceipt::direct("friend@talk.kik.com", "target-10"), "rt-read-2");
    match decode_relayed(&read_direct) {
        InboundEvent::MessageRead(event) => assert_eq!(event.group_jid, None),
        other => panic!("Expected read receipt, got {:?}", other),
    }

    let delivered = encode_fixed(
        DeliveredReceipt {
            peer_id: "friend@talk.kik.com".to_string(),
            receipt_target_id: "target-11".to_string(),
        },
        "rt-delivered",
    );
    match decode_relayed(&delivered) {
        InboundEvent::MessageDelivered(event) => {
            assert_eq!(event.receipt_message_id, "target-11");
            assert_eq!(event.header.timestamp, Some(NOW));
        }
        other => panic!("Expected delivered receipt, got {:?}", other),
    }
}

#[test]
fn test_typing_roundtrip() {
    for is_typing in [true, false] {
        let stanza = encode_fixed(
            TypingStatus {
                peer_id: "friend@talk.kik.com".to_string(),
                is_group: false,
                is_typing,
            },
            "rt-typing",
        );
        match decode_relayed(&stanza) {
            InboundEvent::Typing(event) => assert_eq!(event.is_typing, is_typing),
            other => panic!("Expected typing event, got {:?}", other),
        }
    }
}

#[test]
fn test_link_share_roundtrip() {
    let share = LinkShare {
        peer_id: "friend@talk.kik.com".to_string(),
        link: "https://example.com/a?b=1&c=2".to_string(),
        title: "Title with <angle> brackets".to_string(),
        text: "Body & \"quotes\"".to_string(),
        app_name: "Reader's Digest".to_string(),
    };
    let stanza = encode_fixed(share.clone(), "rt-link");

    match decode_relayed(&stanza) {
        InboundEvent::Card(card) => {
            assert_eq!(card.title.as_deref(), Some(share.title.as_str()));
            assert_eq!(card.text.as_deref(), Some(share.text.as_str()));
            assert_eq!(card.app_name.as_deref(), Some(share.app_name.as_str()));
            assert_eq!(card.uri.as_deref(), Some(share.link.as_str()));
            assert_eq!(card.layout.as_deref(), Some("article"));
            assert_eq!(card.allow_forward, Some(true));
            assert!(card.request_read_receipt);
        }
        other => panic!("Expected card, got {:?}", other),
    }
}

#[test]
fn test_unescape_inverts_escape() {
    let samples = ["&<>\"'", "a&&b<<c>>d\"\"e''", "&amp; is already an entity", "ünïcødé & <emoji 🎉>"];
    for sample in samples {
        assert_eq!(unescape_xml(&escape_xml(sample)), sample);
    }
}
