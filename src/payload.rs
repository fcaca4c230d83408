//! Webhook payload structures.
//!
//! The provider nests events as `payload → entry[] → changes[] → value`. One
//! entry is one business account's batch; one change is one field-level update
//! whose [`Value`] holds the actual messages or statuses.
//!
//! Order matters at every level: entries and changes are kept in delivery order.

use serde::{Deserialize, Serialize};

use crate::{
    message::{Message, StatusUpdate},
    Timestamp,
};

/// The `object` discriminator of payloads this crate describes.
pub const WHATSAPP_BUSINESS_ACCOUNT: &str = "whatsapp_business_account";

/// The root event envelope of a webhook `POST`.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
#[serde(default)]
#[non_exhaustive]
pub struct WebhookPayload {
    /// The webhook the business is subscribed to; `whatsapp_business_account`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,

    /// Changes batched by the provider, in delivery order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<Vec<Entry>>,
}

impl WebhookPayload {
    /// Whether `object` is `whatsapp_business_account`.
    ///
    /// Payloads for any other object are outside this model and should be
    /// rejected by the caller without looking at `entry`.
    #[inline]
    pub fn is_whatsapp_business_account(&self) -> bool {
        self.object.as_deref() == Some(WHATSAPP_BUSINESS_ACCOUNT)
    }

    /// The entries of this payload, empty if none were sent.
    #[inline]
    pub fn entries(&self) -> &[Entry] {
        self.entry.as_deref().unwrap_or_default()
    }

    /// Walks every change of every entry, in delivery order.
    pub fn changes(&self) -> impl Iterator<Item = (&Entry, &Change)> + '_ {
        self.entries()
            .iter()
            .flat_map(|entry| entry.changes().iter().map(move |change| (entry, change)))
    }

    /// Every inbound message in the payload, in delivery order.
    pub fn messages(&self) -> impl Iterator<Item = &Message> + '_ {
        self.changes()
            .flat_map(|(_, change)| change.variants().messages.unwrap_or_default())
    }

    /// Every status update in the payload, in delivery order.
    pub fn statuses(&self) -> impl Iterator<Item = &StatusUpdate> + '_ {
        self.changes()
            .flat_map(|(_, change)| change.variants().statuses.unwrap_or_default())
    }
}

/// One business account's batch of changes.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
#[serde(default)]
#[non_exhaustive]
pub struct Entry {
    /// The WhatsApp Business Account id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// When the notification was sent, not when the change happened.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<Timestamp>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<Vec<Change>>,
}

impl Entry {
    /// The changes of this entry, empty if none were sent.
    #[inline]
    pub fn changes(&self) -> &[Change] {
        self.changes.as_deref().unwrap_or_default()
    }
}

/// One field-level update.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
#[serde(default)]
#[non_exhaustive]
pub struct Change {
    /// The subscribed field that changed, e.g. `messages`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Change {
    /// Classifies the change's value. A change without a value has no variants.
    pub fn variants(&self) -> Variants<'_> {
        self.value
            .as_ref()
            .map(Value::variants)
            .unwrap_or_default()
    }
}

/// The polymorphic container of a [`Change`].
///
/// Each known variant is an independent optional field. In practice at most one
/// of `messages`/`statuses` is non-empty, but nothing here enforces it: kinds
/// added later by the provider simply leave both unset.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
#[serde(default)]
#[non_exhaustive]
pub struct Value {
    /// Always `whatsapp` so far.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messaging_product: Option<String>,

    /// The business phone number that received the event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,

    /// Profiles of the users who sent `messages`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contacts: Option<Vec<Contact>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<Message>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub statuses: Option<Vec<StatusUpdate>>,

    /// Errors not tied to a single message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<WebhookErrorDetail>>,
}

impl Value {
    /// Whether `messages` is present and non-empty.
    #[inline]
    pub fn has_messages(&self) -> bool {
        self.messages.as_ref().is_some_and(|m| !m.is_empty())
    }

    /// Whether `statuses` is present and non-empty.
    #[inline]
    pub fn has_statuses(&self) -> bool {
        self.statuses.as_ref().is_some_and(|s| !s.is_empty())
    }

    /// Reports every populated known variant in a single pass.
    ///
    /// If both `messages` and `statuses` are populated, both are reported and
    /// the caller picks the priority.
    pub fn variants(&self) -> Variants<'_> {
        Variants {
            messages: self.messages.as_deref().filter(|m| !m.is_empty()),
            statuses: self.statuses.as_deref().filter(|s| !s.is_empty()),
        }
    }
}

/// The known variants of a [`Value`].
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub enum VariantKind {
    Messages,
    Statuses,
}

/// Which variants of a [`Value`] are populated. `None` means absent or empty.
#[derive(PartialEq, Clone, Copy, Debug, Default)]
pub struct Variants<'a> {
    pub messages: Option<&'a [Message]>,
    pub statuses: Option<&'a [StatusUpdate]>,
}

impl Variants<'_> {
    /// No known variant is populated. Callers treat this as a no-op.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_none() && self.statuses.is_none()
    }

    /// Both `messages` and `statuses` are populated.
    #[inline]
    pub fn is_ambiguous(&self) -> bool {
        self.messages.is_some() && self.statuses.is_some()
    }

    #[inline]
    pub fn contains(&self, kind: VariantKind) -> bool {
        match kind {
            VariantKind::Messages => self.messages.is_some(),
            VariantKind::Statuses => self.statuses.is_some(),
        }
    }

    /// The populated variant kinds, messages first.
    pub fn kinds(&self) -> impl Iterator<Item = VariantKind> {
        let messages = self.messages.map(|_| VariantKind::Messages);
        let statuses = self.statuses.map(|_| VariantKind::Statuses);
        messages.into_iter().chain(statuses)
    }
}

/// A metadata object describing the business subscribed to the webhook.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
#[serde(default)]
#[non_exhaustive]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_phone_number: Option<String>,

    /// ID for the phone number. A business replies using this ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number_id: Option<String>,
}

/// The customer who sent a message.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
#[serde(default)]
#[non_exhaustive]
pub struct Contact {
    /// The customer's WhatsApp ID. May not match their phone number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wa_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
#[serde(default)]
#[non_exhaustive]
pub struct Profile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// An error object as embedded in webhook payloads.
///
/// ```json
/// {
///   "code": 131051,
///   "title": "Unsupported message type",
///   "message": "Message type unknown",
///   "error_data": { "details": "Message type is not currently supported" }
/// }
/// ```
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
#[serde(default)]
#[non_exhaustive]
pub struct WebhookErrorDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_data: Option<ErrorData>,
    #[serde(rename = "href", skip_serializing_if = "Option::is_none")]
    pub support: Option<String>,
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
#[serde(default)]
#[non_exhaustive]
pub struct ErrorData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
