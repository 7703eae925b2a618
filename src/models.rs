use std::collections::BTreeMap;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Outbound events
// ---------------------------------------------------------------------------

/// A domain event that can be serialized into an outgoing stanza.
///
/// The message id and timestamp are not part of the event: both are supplied
/// at encode time by the caller and the clock respectively.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    ChatMessage(ChatMessage),
    ReadReceipt(ReadReceipt),
    DeliveredReceipt(DeliveredReceipt),
    TypingStatus(TypingStatus),
    LinkShare(LinkShare),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub peer_id: String,
    pub body: String,
    pub is_group: bool,
    pub bot_mention_id: Option<String>,
}

impl ChatMessage {
    pub fn direct(peer_id: impl Into<String>, body: impl Into<String>) -> Self {
        ChatMessage {
            peer_id: peer_id.into(),
            body: body.into(),
            is_group: false,
            bot_mention_id: None,
        }
    }

    pub fn group(group_id: impl Into<String>, body: impl Into<String>) -> Self {
        ChatMessage {
            peer_id: group_id.into(),
            body: body.into(),
            is_group: true,
            bot_mention_id: None,
        }
    }

    pub fn with_bot_mention(mut self, bot_id: impl Into<String>) -> Self {
        self.bot_mention_id = Some(bot_id.into());
        self
    }
}

/// Read acknowledgement for one received message.
///
/// `group_id` is the group-membership flag: a receipt for a group
/// conversation carries `Some(group)`, a one-to-one receipt carries `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadReceipt {
    pub peer_id: String,
    pub receipt_target_id: String,
    pub group_id: Option<String>,
}

impl ReadReceipt {
    pub fn direct(peer_id: impl Into<String>, receipt_target_id: impl Into<String>) -> Self {
        ReadReceipt {
            peer_id: peer_id.into(),
            receipt_target_id: receipt_target_id.into(),
            group_id: None,
        }
    }

    pub fn in_group(
        peer_id: impl Into<String>,
        receipt_target_id: impl Into<String>,
        group_id: impl Into<String>,
    ) -> Self {
        ReadReceipt {
            peer_id: peer_id.into(),
            receipt_target_id: receipt_target_id.into(),
            group_id: Some(group_id.into()),
        }
    }

    pub fn is_group(&self) -> bool {
        self.group_id.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeliveredReceipt {
    pub peer_id: String,
    pub receipt_target_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypingStatus {
    pub peer_id: String,
    pub is_group: bool,
    pub is_typing: bool,
}

/// A shared web link rendered by the receiving client as an article card.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkShare {
    pub peer_id: String,
    pub link: String,
    pub title: String,
    pub text: String,
    pub app_name: String,
}

impl From<ChatMessage> for OutboundEvent {
    fn from(value: ChatMessage) -> Self {
        OutboundEvent::ChatMessage(value)
    }
}

impl From<ReadReceipt> for OutboundEvent {
    fn from(value: ReadReceipt) -> Self {
        OutboundEvent::ReadReceipt(value)
    }
}

impl From<DeliveredReceipt> for OutboundEvent {
    fn from(value: DeliveredReceipt) -> Self {
        OutboundEvent::DeliveredReceipt(value)
    }
}

impl From<TypingStatus> for OutboundEvent {
    fn from(value: TypingStatus) -> Self {
        OutboundEvent::TypingStatus(value)
    }
}

impl From<LinkShare> for OutboundEvent {
    fn from(value: LinkShare) -> Self {
        OutboundEvent::LinkShare(value)
    }
}

// ---------------------------------------------------------------------------
// Inbound events
// ---------------------------------------------------------------------------

/// Fields every inbound message stanza carries on its root element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StanzaHeader {
    pub message_id: String,
    pub from_jid: String,
    pub to_jid: Option<String>,
    /// Server timestamp from the `kik` element, milliseconds since the epoch
    pub timestamp: Option<u64>,
}

/// A decoded inbound stanza, one variant per recognised shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InboundEvent {
    ChatMessage(IncomingChatMessage),
    GroupChatMessage(IncomingGroupChatMessage),
    MessageRead(MessageReadEvent),
    MessageDelivered(MessageDeliveredEvent),
    Typing(TypingEvent),
    GroupTyping(GroupTypingEvent),
    GroupStatus(GroupStatusEvent),
    GroupSystemMessage(GroupSystemMessageEvent),
    GroupReceipts(GroupReceiptsEvent),
    FriendAttribution(FriendAttributionEvent),
    StatusResponse(StatusResponseEvent),
    Image(ImageMessage),
    GroupSticker(GroupStickerMessage),
    Gif(GifMessage),
    Video(VideoMessage),
    Card(CardMessage),
}

impl InboundEvent {
    pub fn header(&self) -> &StanzaHeader {
        match self {
            InboundEvent::ChatMessage(e) => &e.header,
            InboundEvent::GroupChatMessage(e) => &e.message.header,
            InboundEvent::MessageRead(e) => &e.header,
            InboundEvent::MessageDelivered(e) => &e.header,
            InboundEvent::Typing(e) => &e.header,
            InboundEvent::GroupTyping(e) => &e.header,
            InboundEvent::GroupStatus(e) => &e.header,
            InboundEvent::GroupSystemMessage(e) => &e.header,
            InboundEvent::GroupReceipts(e) => &e.header,
            InboundEvent::FriendAttribution(e) => &e.header,
            InboundEvent::StatusResponse(e) => &e.header,
            InboundEvent::Image(e) => &e.header,
            InboundEvent::GroupSticker(e) => &e.header,
            InboundEvent::Gif(e) => &e.header,
            InboundEvent::Video(e) => &e.header,
            InboundEvent::Card(e) => &e.header,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomingChatMessage {
    pub header: StanzaHeader,
    pub body: Option<String>,
    pub preview: Option<String>,
    pub status: Option<String>,
    pub request_delivered_receipt: bool,
    pub request_read_receipt: bool,
    pub is_typing: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomingGroupChatMessage {
    #[serde(flatten)]
    pub message: IncomingChatMessage,
    pub group_jid: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageReadEvent {
    pub header: StanzaHeader,
    pub receipt_message_id: String,
    pub group_jid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageDeliveredEvent {
    pub header: StanzaHeader,
    pub receipt_message_id: String,
    pub group_jid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypingEvent {
    pub header: StanzaHeader,
    pub is_typing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTypingEvent {
    pub header: StanzaHeader,
    pub group_jid: String,
    pub is_typing: bool,
}

/// One member entry of a group container.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMember {
    pub jid: String,
    pub is_admin: bool,
    pub is_owner: bool,
}

/// Group metadata embedded in status and system messages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSnapshot {
    pub jid: String,
    pub code: Option<String>,
    pub name: Option<String>,
    pub members: Vec<GroupMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStatusEvent {
    pub header: StanzaHeader,
    pub group_jid: String,
    pub request_delivered_receipt: bool,
    pub request_read_receipt: bool,
    pub status: Option<String>,
    pub status_jid: Option<String>,
    pub group: Option<GroupSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSystemMessageEvent {
    pub header: StanzaHeader,
    pub group_jid: String,
    pub request_delivered_receipt: bool,
    pub request_read_receipt: bool,
    pub sysmsg: Option<String>,
    pub sysmsg_xmlns: Option<String>,
    pub group: Option<GroupSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupReceiptsEvent {
    pub header: StanzaHeader,
    pub group_jid: String,
    pub receipt_type: String,
    pub receipt_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FriendAttributionEvent {
    pub header: StanzaHeader,
    pub context_type: String,
    pub referrer_jid: String,
    pub reply: bool,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusResponseEvent {
    pub header: StanzaHeader,
    pub status: String,
    pub status_jid: String,
    pub special_visibility: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageMessage {
    pub header: StanzaHeader,
    pub request_delivered_receipt: bool,
    pub request_read_receipt: bool,
    pub image_url: Option<String>,
    pub status: Option<String>,
    pub group_jid: Option<String>,
}

/// A URI alternative attached to content messages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentUri {
    pub platform: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStickerMessage {
    pub header: StanzaHeader,
    pub group_jid: String,
    pub sticker_pack_id: Option<String>,
    pub sticker_id: Option<String>,
    pub sticker_source: Option<String>,
    pub sticker_url: Option<String>,
    pub png_preview: Option<String>,
    pub uris: Vec<ContentUri>,
    /// Every extras item, including keys with no named field above
    pub extras: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GifUri {
    pub file_content_type: Option<String>,
    pub kind: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GifMessage {
    pub header: StanzaHeader,
    pub request_delivered_receipt: bool,
    pub request_read_receipt: bool,
    pub status: Option<String>,
    pub group_jid: Option<String>,
    pub uris: Vec<GifUri>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoMessage {
    pub header: StanzaHeader,
    pub request_delivered_receipt: bool,
    pub request_read_receipt: bool,
    pub video_url: String,
    pub file_content_type: Option<String>,
    pub duration_milliseconds: Option<u64>,
    pub file_size: u64,
    pub group_jid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardMessage {
    pub header: StanzaHeader,
    pub request_delivered_receipt: bool,
    pub request_read_receipt: bool,
    pub group_jid: Option<String>,
    pub app_name: Option<String>,
    pub card_icon: Option<String>,
    pub layout: Option<String>,
    pub title: Option<String>,
    pub text: Option<String>,
    pub allow_forward: Option<bool>,
    pub icon: Option<String>,
    pub uri: Option<String>,
    pub uris: Vec<ContentUri>,
}
