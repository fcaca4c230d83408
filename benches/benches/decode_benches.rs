use criterion::{black_box, Criterion, Throughput};
use serde_json::json;
use whatsapp_webhook_rs::{decode_payload, decode_verification, WebhookPayload};

const SENDER: &str = "16505551234";

fn batch(messages: usize) -> serde_json::Value {
    let messages: Vec<_> = (0..messages)
        .map(|i| {
            json!({
                "from": SENDER,
                "id": format!("wamid.{i}"),
                "timestamp": "1749416383",
                "type": "text",
                "text": { "body": format!("message number {i}") }
            })
        })
        .collect();

    json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "id": "987654321098765",
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "metadata": { "display_phone_number": "15550001111", "phone_number_id": "phone_id_222" },
                    "messages": messages
                }
            }]
        }]
    })
}

fn batch_body(messages: usize) -> Vec<u8> {
    serde_json::to_vec(&batch(messages)).unwrap()
}

pub fn bench_decode_payload(c: &mut Criterion) {
    let mut group = c.benchmark_group("Payload Decoding");

    for size in [1, 50] {
        let body = batch_body(size);
        group.throughput(Throughput::Bytes(body.len() as u64));

        group.bench_function(format!("text_messages_{size}"), |b| {
            b.iter(|| {
                let payload: WebhookPayload = decode_payload(black_box(&body)).unwrap();
                black_box(payload.messages().count())
            });
        });
    }

    let mut bad = batch(50);
    bad["entry"][0]["changes"][0]["value"]["messages"][49]["timestamp"] = json!(true);
    let bad = serde_json::to_vec(&bad).unwrap();

    group.bench_function("type_mismatch_50", |b| {
        b.iter(|| decode_payload(black_box(&bad)).unwrap_err());
    });

    group.finish();
}

pub fn bench_decode_verification(c: &mut Criterion) {
    let params = [
        ("hub.mode", "subscribe"),
        ("hub.verify_token", "T1"),
        ("hub.challenge", "1158201444"),
    ];

    c.bench_function("decode_verification", |b| {
        b.iter(|| {
            let request = decode_verification(black_box(params));
            black_box(request.verify("T1").is_ok())
        });
    });
}
