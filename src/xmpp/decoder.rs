//! Inbound extraction rules
//!
//! Each rule maps fixed tree paths onto one [`InboundEvent`] variant using the
//! accessors in [`super::accessors`]. Required paths fail with a
//! [`DecodeError`]; optional ones come back as `None`.

use log::debug;
use roxmltree::{Document, Node};

use super::accessors::{extras_table, optional_number_at, parse_number, path_of, NodeExt};
use super::classify::{classify, StanzaKind};
use super::DecodeError;
use crate::models::*;

/// Result of decoding one stanza.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Event(InboundEvent),
    /// Valid XML that matches no known variant
    Unknown {
        element: String,
        stanza_type: Option<String>,
    },
}

impl Decoded {
    pub fn event(self) -> Option<InboundEvent> {
        match self {
            Decoded::Event(event) => Some(event),
            Decoded::Unknown { .. } => None,
        }
    }
}

/// Classify `stanza` and run the matching extraction rule.
pub fn decode(stanza: Node<'_, '_>) -> Result<Decoded, DecodeError> {
    match classify(stanza) {
        Some(kind) => extract(kind, stanza).map(Decoded::Event),
        None => {
            debug!("Unrecognized stanza <{}>", stanza.tag_name().name());
            Ok(Decoded::Unknown {
                element: stanza.tag_name().name().to_string(),
                stanza_type: stanza.attr("type").map(str::to_string),
            })
        }
    }
}

/// Parse `xml` with roxmltree and decode its root element.
pub fn decode_str(xml: &str) -> Result<Decoded, DecodeError> {
    let document = Document::parse(xml)?;
    decode(document.root_element())
}

/// Run the extraction rule for an already classified stanza.
pub fn extract(kind: StanzaKind, stanza: Node<'_, '_>) -> Result<InboundEvent, DecodeError> {
    let event = match kind {
        StanzaKind::ChatMessage => InboundEvent::ChatMessage(chat_message(stanza)?),
        StanzaKind::GroupChatMessage => InboundEvent::GroupChatMessage(IncomingGroupChatMessage {
            message: chat_message(stanza)?,
            group_jid: group_jid(stanza)?,
        }),
        StanzaKind::MessageRead => {
            let (header, receipt_message_id, group_jid) = receipt_fields(stanza)?;
            InboundEvent::MessageRead(MessageReadEvent {
                header,
                receipt_message_id,
                group_jid,
            })
        }
        StanzaKind::MessageDelivered => {
            let (header, receipt_message_id, group_jid) = receipt_fields(stanza)?;
            InboundEvent::MessageDelivered(MessageDeliveredEvent {
                header,
                receipt_message_id,
                group_jid,
            })
        }
        StanzaKind::Typing => InboundEvent::Typing(TypingEvent {
            header: header(stanza)?,
            is_typing: stanza.require_child("is-typing")?.flag("val"),
        }),
        StanzaKind::GroupTyping => InboundEvent::GroupTyping(GroupTypingEvent {
            header: header(stanza)?,
            group_jid: group_jid(stanza)?,
            is_typing: stanza.require_child("is-typing")?.flag("val"),
        }),
        StanzaKind::GroupStatus => InboundEvent::GroupStatus(group_status(stanza)?),
        StanzaKind::GroupSystemMessage => {
            InboundEvent::GroupSystemMessage(group_system_message(stanza)?)
        }
        StanzaKind::GroupReceipts => InboundEvent::GroupReceipts(group_receipts(stanza)?),
        StanzaKind::FriendAttribution => {
            InboundEvent::FriendAttribution(friend_attribution(stanza)?)
        }
        StanzaKind::StatusResponse => InboundEvent::StatusResponse(status_response(stanza)?),
        StanzaKind::Image => InboundEvent::Image(image(stanza)?),
        StanzaKind::GroupSticker => InboundEvent::GroupSticker(group_sticker(stanza)?),
        StanzaKind::Gif => InboundEvent::Gif(gif(stanza)?),
        StanzaKind::Video => InboundEvent::Video(video(stanza)?),
        StanzaKind::Card => InboundEvent::Card(card(stanza)?),
    };
    Ok(event)
}

fn header(stanza: Node<'_, '_>) -> Result<StanzaHeader, DecodeError> {
    let kik_timestamp = stanza
        .child("kik")
        .and_then(|kik| kik.attr("timestamp").map(|raw| (kik, raw)));
    let timestamp = match kik_timestamp {
        Some((kik, raw)) => Some(parse_number(&format!("{}@timestamp", path_of(kik)), raw)?),
        None => None,
    };

    Ok(StanzaHeader {
        message_id: stanza.require_attr("id")?.to_string(),
        from_jid: stanza.require_attr("from")?.to_string(),
        to_jid: stanza.attr("to").map(str::to_string),
        timestamp,
    })
}

/// `(delivered, read)` acknowledgement requests; both false without a `request` child.
fn receipt_requests(stanza: Node<'_, '_>) -> (bool, bool) {
    match stanza.child("request") {
        Some(request) => (request.flag("d"), request.flag("r")),
        None => (false, false),
    }
}

fn group_jid(stanza: Node<'_, '_>) -> Result<String, DecodeError> {
    Ok(stanza.require_child("g")?.require_attr("jid")?.to_string())
}

fn optional_group_jid(stanza: Node<'_, '_>) -> Option<String> {
    stanza.child("g").and_then(|g| g.attr("jid")).map(str::to_string)
}

fn chat_message(stanza: Node<'_, '_>) -> Result<IncomingChatMessage, DecodeError> {
    let (request_delivered_receipt, request_read_receipt) = receipt_requests(stanza);

    Ok(IncomingChatMessage {
        header: header(stanza)?,
        body: stanza.child_text("body"),
        preview: stanza.child_text("preview"),
        status: stanza.child_text("status"),
        request_delivered_receipt,
        request_read_receipt,
        is_typing: stanza.child("is-typing").map(|n| n.flag("val")),
    })
}

fn receipt_fields(
    stanza: Node<'_, '_>,
) -> Result<(StanzaHeader, String, Option<String>), DecodeError> {
    let msgid = stanza.require_child_at(&["receipt", "msgid"])?;
    Ok((
        header(stanza)?,
        msgid.require_attr("id")?.to_string(),
        optional_group_jid(stanza),
    ))
}

/// Group container content; `None` for an empty `<g jid="..."/>` marker.
fn group_snapshot(stanza: Node<'_, '_>) -> Result<Option<GroupSnapshot>, DecodeError> {
    let g = match stanza.child("g") {
        Some(g) if g.children().any(|n| n.is_element()) => g,
        _ => return Ok(None),
    };

    let members = g
        .children_named("m")
        .into_iter()
        .map(|m| GroupMember {
            jid: m.text_content(),
            is_admin: m.attr("a") == Some("1"),
            is_owner: m.attr("s") == Some("1"),
        })
        .collect();

    Ok(Some(GroupSnapshot {
        jid: g.require_attr("jid")?.to_string(),
        code: g.child_text("code"),
        name: g.child_text("n"),
        members,
    }))
}

fn group_status(stanza: Node<'_, '_>) -> Result<GroupStatusEvent, DecodeError> {
    let header = header(stanza)?;
    let (request_delivered_receipt, request_read_receipt) = receipt_requests(stanza);
    let status = stanza.child("status");

    Ok(GroupStatusEvent {
        group_jid: header.from_jid.clone(),
        header,
        request_delivered_receipt,
        request_read_receipt,
        status: status.map(|s| s.text_content()),
        status_jid: status.and_then(|s| s.attr("jid")).map(str::to_string),
        group: group_snapshot(stanza)?,
    })
}

fn group_system_message(stanza: Node<'_, '_>) -> Result<GroupSystemMessageEvent, DecodeError> {
    let header = header(stanza)?;
    let (request_delivered_receipt, request_read_receipt) = receipt_requests(stanza);
    let sysmsg = stanza.child("sysmsg");

    Ok(GroupSystemMessageEvent {
        group_jid: header.from_jid.clone(),
        header,
        request_delivered_receipt,
        request_read_receipt,
        sysmsg: sysmsg.map(|s| s.text_content()),
        sysmsg_xmlns: sysmsg.and_then(|s| s.namespace()),
        group: group_snapshot(stanza)?,
    })
}

fn group_receipts(stanza: Node<'_, '_>) -> Result<GroupReceiptsEvent, DecodeError> {
    let receipt = stanza.require_child("receipt")?;
    let receipt_ids = receipt
        .children_named("msgid")
        .into_iter()
        .map(|msgid| msgid.require_attr("id").map(str::to_string))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(GroupReceiptsEvent {
        header: header(stanza)?,
        group_jid: group_jid(stanza)?,
        receipt_type: receipt.require_attr("type")?.to_string(),
        receipt_ids,
    })
}

fn friend_attribution(stanza: Node<'_, '_>) -> Result<FriendAttributionEvent, DecodeError> {
    let attribution = stanza.require_child("friend-attribution")?;
    let context = attribution.require_child("context")?;

    Ok(FriendAttributionEvent {
        header: header(stanza)?,
        context_type: context.require_attr("type")?.to_string(),
        referrer_jid: context.require_attr("referrer")?.to_string(),
        reply: context.flag("reply"),
        body: attribution.require_child_text("body")?,
    })
}

fn status_response(stanza: Node<'_, '_>) -> Result<StatusResponseEvent, DecodeError> {
    let status = stanza.require_child("status")?;

    Ok(StatusResponseEvent {
        header: header(stanza)?,
        status: status.text_content(),
        status_jid: status.require_attr("jid")?.to_string(),
        special_visibility: status.flag("special-visibility"),
    })
}

fn image(stanza: Node<'_, '_>) -> Result<ImageMessage, DecodeError> {
    let (request_delivered_receipt, request_read_receipt) = receipt_requests(stanza);

    Ok(ImageMessage {
        header: header(stanza)?,
        request_delivered_receipt,
        request_read_receipt,
        image_url: stanza.child_text_at(&["content", "strings", "file-url"]),
        status: stanza.child_text("status"),
        group_jid: optional_group_jid(stanza),
    })
}

fn content_uris(content: Node<'_, '_>) -> Vec<ContentUri> {
    content
        .child("uris")
        .map(|uris| {
            uris.children_named("uri")
                .into_iter()
                .map(|uri| ContentUri {
                    platform: uri.attr("platform").map(str::to_string),
                    url: uri.text_content(),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn group_sticker(stanza: Node<'_, '_>) -> Result<GroupStickerMessage, DecodeError> {
    let content = stanza.require_child("content")?;
    let extras = content.child("extras").map(extras_table).unwrap_or_default();
    let named = |key: &str| extras.get(key).cloned();

    Ok(GroupStickerMessage {
        header: header(stanza)?,
        group_jid: group_jid(stanza)?,
        sticker_pack_id: named("sticker_pack_id"),
        sticker_id: named("sticker_id"),
        sticker_source: named("sticker_source"),
        sticker_url: named("sticker_url"),
        png_preview: content.child_text_at(&["images", "png-preview"]),
        uris: content_uris(content),
        extras,
    })
}

fn gif(stanza: Node<'_, '_>) -> Result<GifMessage, DecodeError> {
    let (request_delivered_receipt, request_read_receipt) = receipt_requests(stanza);
    let uris = stanza
        .require_child_at(&["content", "uris"])?
        .children_named("uri")
        .into_iter()
        .map(|uri| GifUri {
            file_content_type: uri.attr("file-content-type").map(str::to_string),
            kind: uri.attr("type").map(str::to_string),
            url: uri.text_content(),
        })
        .collect();

    Ok(GifMessage {
        header: header(stanza)?,
        request_delivered_receipt,
        request_read_receipt,
        status: stanza.child_text("status"),
        group_jid: optional_group_jid(stanza),
        uris,
    })
}

fn video(stanza: Node<'_, '_>) -> Result<VideoMessage, DecodeError> {
    let (request_delivered_receipt, request_read_receipt) = receipt_requests(stanza);
    let strings = stanza.require_child_at(&["content", "strings"])?;
    let file_size = strings.require_child("file-size")?;

    Ok(VideoMessage {
        header: header(stanza)?,
        request_delivered_receipt,
        request_read_receipt,
        video_url: strings.require_child_text("file-url")?,
        file_content_type: strings.child_text("file-content-type"),
        duration_milliseconds: optional_number_at(strings, &["duration"])?,
        file_size: parse_number(&path_of(file_size), &file_size.text_content())?,
        group_jid: optional_group_jid(stanza),
    })
}

fn card(stanza: Node<'_, '_>) -> Result<CardMessage, DecodeError> {
    let (request_delivered_receipt, request_read_receipt) = receipt_requests(stanza);
    let content = stanza.require_child("content")?;
    let string = |name: &str| content.child_text_at(&["strings", name]);
    let uris = content_uris(content);

    Ok(CardMessage {
        header: header(stanza)?,
        request_delivered_receipt,
        request_read_receipt,
        group_jid: optional_group_jid(stanza),
        app_name: string("app-name"),
        card_icon: string("card-icon"),
        layout: string("layout"),
        title: string("title"),
        text: string("text"),
        allow_forward: string("allow-forward").map(|v| v == "true"),
        icon: content.child_text_at(&["images", "icon"]),
        uri: uris.first().map(|u| u.url.clone()),
        uris,
    })
}
