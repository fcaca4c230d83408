// --- CONSTANTS ---
#[allow(dead_code)]
pub const WABA_ID: &str = "987654321098765";
#[allow(dead_code)]
pub const PHONE_ID: &str = "phone_id_222";
#[allow(dead_code)]
pub const SENDER: &str = "16505551234";
#[allow(dead_code)]
pub const VERIFY_TOKEN: &str = "T1";
#[allow(dead_code)]
pub const APP_SECRET: &str = "a1b2c3d4e5f6";

use serde_json::{json, Value};

// --- FIXTURES ---

/// A payload with one entry, one change and one text message.
#[allow(dead_code)]
pub fn text_message_payload(body: &str) -> Value {
    json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "id": WABA_ID,
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "metadata": {
                        "display_phone_number": "15550001111",
                        "phone_number_id": PHONE_ID
                    },
                    "contacts": [{ "profile": { "name": "Kerry Fisher" }, "wa_id": SENDER }],
                    "messages": [{
                        "from": SENDER,
                        "id": "wamid.HBgLMTY1MDUwNzY1MjAVAgASGBQzQTRBNjU5OUFFRTAzODEwMTQ0RgA=",
                        "timestamp": "1749416383",
                        "type": "text",
                        "text": { "body": body }
                    }]
                }
            }]
        }]
    })
}

/// A payload with one delivery receipt.
#[allow(dead_code)]
pub fn status_payload(status: &str) -> Value {
    json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "id": WABA_ID,
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "metadata": {
                        "display_phone_number": "15550001111",
                        "phone_number_id": PHONE_ID
                    },
                    "statuses": [{
                        "id": "wamid.gBGGSFcCNEOPAgkO_KJ55r4w_ww",
                        "status": status,
                        "timestamp": "1749416400",
                        "recipient_id": SENDER
                    }]
                }
            }]
        }]
    })
}

#[allow(dead_code)]
pub fn to_body(value: &Value) -> Vec<u8> {
    serde_json::to_vec(value).unwrap()
}
