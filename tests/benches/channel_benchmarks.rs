//! # Vault Channel Benchmarks
//!
//! Hot paths every bus message goes through:
//!
//! | Path | Work |
//! |------|------|
//! | Seal / open | ChaCha20-Poly1305 + JSON |
//! | Codec | Envelope <-> bus bytes |
//! | Replay guard | Cache lookup, sweep, insert |
//! | Handshake | X25519 + HKDF-SHA256 |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;
use shared_crypto::KeyPair;
use shared_types::{
    Clock, EnvelopeCodec, ManualClock, RequestId, SessionId, SharedClock, VaultResponse,
    WireEnvelope,
};
use std::time::Duration;
use vc_01_secure_session::SessionCrypto;
use vc_02_replay_guard::{MessageCheck, ReplayGuard, ReplayGuardConfig};

fn session_pair(clock: &SharedClock) -> (SessionCrypto, SessionCrypto) {
    let app = KeyPair::generate();
    let vault = KeyPair::generate();
    let expires_at = clock.now() + chrono::Duration::hours(1);
    let make = |own: &KeyPair, peer: &KeyPair| {
        SessionCrypto::from_key_exchange(
            SessionId::new("bench"),
            own.private_key(),
            own.public_key(),
            peer.public_key(),
            expires_at,
            clock.clone(),
        )
        .unwrap()
    };
    (make(&app, &vault), make(&vault, &app))
}

fn bench_session_crypto(c: &mut Criterion) {
    let clock: SharedClock = ManualClock::starting_now();
    let (app, vault) = session_pair(&clock);

    let mut group = c.benchmark_group("vc-01-session-crypto");
    for size in [64usize, 1024, 16 * 1024] {
        let plaintext = vec![0x5Au8; size];
        let sealed = app.encrypt(&plaintext).unwrap();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("encrypt", size), &plaintext, |b, p| {
            b.iter(|| black_box(app.encrypt(p).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("decrypt", size), &sealed, |b, s| {
            b.iter(|| black_box(vault.decrypt(s).unwrap()))
        });
    }
    group.finish();

    c.bench_function("vc-01-handshake", |b| {
        b.iter(|| black_box(session_pair(&clock)))
    });
}

fn bench_response_pipeline(c: &mut Criterion) {
    let clock: SharedClock = ManualClock::starting_now();
    let (app, vault) = session_pair(&clock);
    let codec = EnvelopeCodec::new();
    let response = VaultResponse::success(RequestId::new(), json!({"status": "ok"}))
        .with_event_id("evt")
        .with_timestamp(clock.now());
    let bytes = codec
        .encode(&WireEnvelope::new(vault.encrypt_structured(&response).unwrap()))
        .unwrap();

    c.bench_function("decode-open-response", |b| {
        b.iter(|| {
            let wire = codec.decode(black_box(&bytes)).unwrap();
            let opened: VaultResponse = app.decrypt_structured(&wire.envelope).unwrap();
            black_box(opened)
        })
    });
}

fn bench_replay_guard(c: &mut Criterion) {
    let clock: SharedClock = ManualClock::starting_now();
    let mut group = c.benchmark_group("vc-02-replay-guard");
    group.measurement_time(Duration::from_secs(5));

    for capacity in [1_000usize, 10_000] {
        let config = ReplayGuardConfig {
            max_entries: capacity,
            ..ReplayGuardConfig::default()
        };
        let guard = ReplayGuard::new(config, clock.clone()).unwrap();
        let now = clock.now();
        let mut n = 0u64;

        group.bench_function(BenchmarkId::new("validate_fresh", capacity), |b| {
            b.iter(|| {
                n += 1;
                let check = MessageCheck::new(format!("evt-{n}")).with_timestamp(now);
                black_box(guard.validate_message(&check))
            })
        });

        let duplicate = MessageCheck::new("evt-1").with_timestamp(now);
        group.bench_function(BenchmarkId::new("validate_duplicate", capacity), |b| {
            b.iter(|| black_box(guard.validate_message(&duplicate)))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_session_crypto,
    bench_response_pipeline,
    bench_replay_guard
);
criterion_main!(benches);
