//! Inbound messages and delivery receipts.
//!
//! A [`Message`] carries a `type` discriminator plus, in practice, exactly one
//! sub-object named after it (`"type": "text"` comes with `"text": {...}`).
//! Every sub-object is an independent optional field here; [`Message::content`]
//! gives the one the discriminator points at, and [`Message::mismatch`] reports
//! payloads where the two disagree.
//!
//! A [`StatusUpdate`] is the provider telling you what happened to a message
//! *you* sent: sent, delivered, read or failed.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::{de, payload::WebhookErrorDetail, Timestamp};

string_enum! {
    /// The `type` discriminator of an inbound message.
    pub enum MessageKind {
        Text => "text",
        Image => "image",
        Audio => "audio",
        Video => "video",
        Document => "document",
        Sticker => "sticker",
        Location => "location",
        Contacts => "contacts",
        Reaction => "reaction",
        Button => "button",
        Interactive => "interactive",
        Order => "order",
        System => "system",
        /// Meta could not represent the message; see [`Message::errors`].
        Unsupported => "unsupported",
        /// Older spelling of [`MessageKind::Unsupported`].
        Unknown => "unknown",
    }
}

impl MessageKind {
    /// Whether messages of this kind carry a sub-object modelled by this crate.
    pub fn has_content(&self) -> bool {
        matches!(
            self,
            Self::Text
                | Self::Image
                | Self::Audio
                | Self::Video
                | Self::Document
                | Self::Sticker
                | Self::Location
                | Self::Reaction
                | Self::Button
                | Self::Interactive
        )
    }
}

string_enum! {
    /// The delivery state reported by a [`StatusUpdate`].
    ///
    /// For a status to be read, it must have been delivered. When a user is in
    /// the chat screen as a message arrives, Meta may skip `delivered` and only
    /// send `read`.
    pub enum StatusKind {
        /// Message accepted by WhatsApp.
        Sent => "sent",
        /// Message delivered to the device.
        Delivered => "delivered",
        /// Message read by the recipient.
        Read => "read",
        /// Message failed to send; see [`StatusUpdate::errors`].
        Failed => "failed",
        /// Message was deleted by the sender.
        Deleted => "deleted",
        /// A catalog item in the message is unavailable.
        Warning => "warning",
    }
}

/// An inbound message from a WhatsApp user.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
#[serde(default)]
#[non_exhaustive]
pub struct Message {
    /// Provider message id (`wamid.…`). Use it to mark the message as read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// The sender's phone number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    /// When the user sent the message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<MessageKind>,

    /// Present when the message replies to, or was forwarded from, another message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<MessageContext>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Text>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<MediaReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<MediaReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<MediaReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<MediaReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sticker: Option<MediaReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reaction: Option<Reaction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button: Option<Button>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interactive: Option<Interactive>,

    /// Set when `type` is `unsupported`/`unknown`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<WebhookErrorDetail>>,
}

/// A borrowed view of the sub-object a [`Message`]'s `type` points at.
#[derive(PartialEq, Clone, Copy, Debug)]
#[non_exhaustive]
pub enum Content<'a> {
    Text(&'a Text),
    Image(&'a MediaReference),
    Audio(&'a MediaReference),
    Video(&'a MediaReference),
    Document(&'a MediaReference),
    Sticker(&'a MediaReference),
    Location(&'a Location),
    Reaction(&'a Reaction),
    Button(&'a Button),
    Interactive(&'a Interactive),
}

impl<'a> Content<'a> {
    /// Returns the media handle for image, audio, video, document and sticker content.
    pub fn media(&self) -> Option<&'a MediaReference> {
        match *self {
            Self::Image(media)
            | Self::Audio(media)
            | Self::Video(media)
            | Self::Document(media)
            | Self::Sticker(media) => Some(media),
            _ => None,
        }
    }
}

impl Message {
    /// Returns the sub-object matching this message's `type`.
    ///
    /// `None` when `type` is absent, names a kind without a modelled
    /// sub-object, or names a kind whose sub-object was not sent. The last case
    /// is a data-quality issue worth logging (see [`Message::mismatch`]), not an
    /// error.
    pub fn content(&self) -> Option<Content<'_>> {
        match self.kind.as_ref()? {
            MessageKind::Text => self.text.as_ref().map(Content::Text),
            MessageKind::Image => self.image.as_ref().map(Content::Image),
            MessageKind::Audio => self.audio.as_ref().map(Content::Audio),
            MessageKind::Video => self.video.as_ref().map(Content::Video),
            MessageKind::Document => self.document.as_ref().map(Content::Document),
            MessageKind::Sticker => self.sticker.as_ref().map(Content::Sticker),
            MessageKind::Location => self.location.as_ref().map(Content::Location),
            MessageKind::Reaction => self.reaction.as_ref().map(Content::Reaction),
            MessageKind::Button => self.button.as_ref().map(Content::Button),
            MessageKind::Interactive => self.interactive.as_ref().map(Content::Interactive),
            _ => None,
        }
    }

    /// Shortcut for the body of a text message.
    pub fn text_body(&self) -> Option<&str> {
        match self.content()? {
            Content::Text(text) => text.body.as_deref(),
            _ => None,
        }
    }

    /// Returns the media handle carried by this message, if its `type` is a media kind.
    pub fn media(&self) -> Option<&MediaReference> {
        self.content()?.media()
    }

    /// Lists the kinds whose sub-object is present, in declaration order.
    pub fn populated_kinds(&self) -> Vec<MessageKind> {
        [
            (self.text.is_some(), MessageKind::Text),
            (self.image.is_some(), MessageKind::Image),
            (self.audio.is_some(), MessageKind::Audio),
            (self.video.is_some(), MessageKind::Video),
            (self.document.is_some(), MessageKind::Document),
            (self.sticker.is_some(), MessageKind::Sticker),
            (self.location.is_some(), MessageKind::Location),
            (self.reaction.is_some(), MessageKind::Reaction),
            (self.button.is_some(), MessageKind::Button),
            (self.interactive.is_some(), MessageKind::Interactive),
        ]
        .into_iter()
        .filter_map(|(present, kind)| present.then_some(kind))
        .collect()
    }

    /// Checks that `type` agrees with the sub-objects actually present.
    ///
    /// A disagreement is reported when `type` names a modelled kind whose
    /// sub-object is missing, or when a sub-object other than the one named by
    /// `type` is present. Kinds this crate does not model never disagree.
    pub fn mismatch(&self) -> Option<ContentMismatch> {
        let populated = self.populated_kinds();
        let declared_missing = self
            .kind
            .as_ref()
            .is_some_and(|kind| kind.has_content() && !populated.contains(kind));
        let foreign_present = populated
            .iter()
            .any(|kind| self.kind.as_ref() != Some(kind));

        (declared_missing || foreign_present).then(|| ContentMismatch {
            declared: self.kind.clone(),
            populated,
        })
    }
}

/// A message whose `type` disagrees with the sub-objects it carries.
#[derive(PartialEq, Eq, Clone, Debug)]
#[non_exhaustive]
pub struct ContentMismatch {
    pub declared: Option<MessageKind>,
    pub populated: Vec<MessageKind>,
}

impl fmt::Display for ContentMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.declared {
            Some(kind) => write!(f, "message declares type '{kind}'")?,
            None => f.write_str("message declares no type")?,
        }

        if self.populated.is_empty() {
            f.write_str(" but carries no content")
        } else {
            f.write_str(" but carries ")?;
            for (i, kind) in self.populated.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "'{kind}'")?;
            }
            f.write_str(" content")
        }
    }
}

impl std::error::Error for ContentMismatch {}

/// Text message content.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
#[serde(default)]
#[non_exhaustive]
pub struct Text {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// An opaque handle to binary content hosted by Meta.
///
/// Turning the `id` into bytes takes an authenticated request against the
/// Graph API media endpoint; this crate only carries the handle.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
#[serde(default)]
#[non_exhaustive]
pub struct MediaReference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Hex SHA-256 of the media bytes, to check a download against.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Documents only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Audio only: `true` for voice notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<bool>,
    /// Stickers only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animated: Option<bool>,
}

/// A location shared by the user.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
#[serde(default)]
#[non_exhaustive]
pub struct Location {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<Coordinate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<Coordinate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// One coordinate of a [`Location`], in decimal degrees.
///
/// Sent as a JSON number or a string holding one. A decoded coordinate
/// re-encodes in the form it was received in, digits included.
#[derive(Clone, Debug)]
pub struct Coordinate {
    degrees: f64,
    form: de::WireForm,
}

impl Coordinate {
    /// Creates a coordinate that encodes as a JSON number.
    ///
    /// Non-finite values are not coordinates and are replaced by `0.0`.
    pub fn from_degrees(degrees: f64) -> Self {
        Self {
            degrees: if degrees.is_finite() { degrees } else { 0.0 },
            form: de::WireForm::Number,
        }
    }

    #[inline]
    pub fn degrees(&self) -> f64 {
        self.degrees
    }
}

impl PartialEq for Coordinate {
    fn eq(&self, other: &Self) -> bool {
        self.degrees == other.degrees
    }
}

impl PartialEq<f64> for Coordinate {
    fn eq(&self, other: &f64) -> bool {
        self.degrees == *other
    }
}

impl Serialize for Coordinate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        de::serialize_lenient(&self.degrees, &self.form, serializer)
    }
}

impl<'de> Deserialize<'de> for Coordinate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (degrees, form) = de::deserialize_lenient::<f64, D>(deserializer)?;
        Ok(Self { degrees, form })
    }
}

/// A reaction to an earlier message. An empty `emoji` removes the reaction.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
#[serde(default)]
#[non_exhaustive]
pub struct Reaction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
}

/// A tap on a quick-reply button of a template message.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
#[serde(default)]
#[non_exhaustive]
pub struct Button {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

/// A reply to an interactive message (reply button or list row).
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
#[serde(default)]
#[non_exhaustive]
pub struct Interactive {
    /// `button_reply` or `list_reply`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button_reply: Option<InteractiveReply>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_reply: Option<InteractiveReply>,
}

impl Interactive {
    /// Returns whichever reply was sent.
    pub fn reply(&self) -> Option<&InteractiveReply> {
        self.button_reply.as_ref().or(self.list_reply.as_ref())
    }
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
#[serde(default)]
#[non_exhaustive]
pub struct InteractiveReply {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Reply/forward context of an inbound message.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
#[serde(default)]
#[non_exhaustive]
pub struct MessageContext {
    /// Sender of the message being replied to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Id of the message being replied to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forwarded: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequently_forwarded: Option<bool>,
}

/// A delivery or read receipt for a message sent by the business.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
#[serde(default)]
#[non_exhaustive]
pub struct StatusUpdate {
    /// Id of the message this status refers to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
    /// The customer's WhatsApp ID. It may not match the phone number the
    /// message was sent to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation: Option<Conversation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pricing: Option<Pricing>,
    /// Set when `status` is `failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<WebhookErrorDetail>>,
    /// Echo of the opaque string attached when the message was sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub biz_opaque_callback_data: Option<String>,
}

impl StatusUpdate {
    #[inline]
    pub fn is_sent(&self) -> bool {
        matches!(self.status, Some(StatusKind::Sent))
    }

    #[inline]
    pub fn is_delivered(&self) -> bool {
        matches!(self.status, Some(StatusKind::Delivered))
    }

    #[inline]
    pub fn is_read(&self) -> bool {
        matches!(self.status, Some(StatusKind::Read))
    }

    #[inline]
    pub fn is_failed(&self) -> bool {
        matches!(self.status, Some(StatusKind::Failed))
    }
}

/// The billing conversation a status belongs to.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
#[serde(default)]
#[non_exhaustive]
pub struct Conversation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_timestamp: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<ConversationOrigin>,
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
#[serde(default)]
#[non_exhaustive]
pub struct ConversationOrigin {
    /// `marketing`, `utility`, `authentication`, `service`, `referral_conversion`…
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
#[serde(default)]
#[non_exhaustive]
pub struct Pricing {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pricing_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}
