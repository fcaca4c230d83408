mod decode_benches;

use criterion::{criterion_group, criterion_main};

use decode_benches::{bench_decode_payload, bench_decode_verification};

criterion_group!(benches, bench_decode_payload, bench_decode_verification);
criterion_main!(benches);
