//! Benchmarks for manifest resolution
//!
//! This benchmark measures:
//! - New-format resolution as the asset list grows
//! - Legacy resolution including base-URL computation
//! - Structured header parsing

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ota_manifest::utils::structured_header;
use ota_manifest::{ManifestExtensions, ResponseHeaderData, UpdateResolver, UpdatesConfig};
use serde_json::{json, Value};
use url::Url;

const SERVER_DEFINED_HEADERS: &str =
    r#"expo-channel-name="main", expo-runtime="1.0", shadow=?1, rollout=0.25;pct"#;

fn resolver() -> UpdateResolver {
    UpdateResolver::new(
        UpdatesConfig::new()
            .with_scope_key("@bench/app")
            .with_update_url(Url::parse("https://updates.bench.test/app/manifest").unwrap()),
    )
}

fn new_manifest(asset_count: usize) -> Value {
    let assets: Vec<Value> = (0..asset_count)
        .map(|i| {
            json!({
                "key": format!("asset-{}", i),
                "url": format!("https://cdn.bench.test/assets/{}", i),
                "hash": format!("hash-{}", i),
                "fileExtension": ".png",
                "contentType": "image/png"
            })
        })
        .collect();
    json!({
        "id": "0754dad0-d200-4634-8d6a-4ab7ab2c2fd6",
        "createdAt": "2020-11-11T00:17:54.797Z",
        "runtimeVersion": "1",
        "launchAsset": {
            "key": "bundle",
            "url": "https://cdn.bench.test/bundle.js",
            "hash": "bundle-hash"
        },
        "assets": assets,
        "metadata": { "branchName": "main" }
    })
}

fn legacy_manifest(asset_count: usize) -> Value {
    let bundled: Vec<String> = (0..asset_count)
        .map(|i| format!("asset_{:032x}.png", i))
        .collect();
    json!({
        "releaseId": "0eef8214-4833-4089-9dff-b4138a14f196",
        "commitTime": "2020-11-11T00:17:54.797Z",
        "sdkVersion": "49.0.0",
        "bundleUrl": "https://updates.bench.test/app/bundle.js",
        "bundleKey": "bundle",
        "bundledAssets": bundled,
        "assetUrlOverride": "../static"
    })
}

fn bench_new_format(c: &mut Criterion) {
    let resolver = resolver();
    let response = ResponseHeaderData::new()
        .with_protocol_version(1)
        .with_server_defined_headers(SERVER_DEFINED_HEADERS)
        .with_manifest_filters(r#"branchname="main""#);
    let extensions = ManifestExtensions::new();

    let mut group = c.benchmark_group("new_format_resolution");
    for size in [0usize, 10, 100, 1000] {
        let manifest = new_manifest(size);
        group.throughput(Throughput::Elements(size as u64 + 1));
        group.bench_with_input(BenchmarkId::from_parameter(size), &manifest, |b, m| {
            b.iter(|| {
                let update = resolver
                    .resolve(black_box(m.clone()), &response, &extensions)
                    .unwrap();
                black_box(update)
            })
        });
    }
    group.finish();
}

fn bench_legacy_format(c: &mut Criterion) {
    let resolver = resolver();

    let mut group = c.benchmark_group("legacy_resolution");
    for size in [10usize, 100, 1000] {
        let manifest = legacy_manifest(size);
        group.throughput(Throughput::Elements(size as u64 + 1));
        group.bench_with_input(BenchmarkId::from_parameter(size), &manifest, |b, m| {
            b.iter(|| black_box(resolver.resolve_legacy(black_box(m.clone())).unwrap()))
        });
    }
    group.finish();
}

fn bench_structured_headers(c: &mut Criterion) {
    let mut group = c.benchmark_group("structured_header");
    group.throughput(Throughput::Bytes(SERVER_DEFINED_HEADERS.len() as u64));

    group.bench_function("parse_dictionary", |b| {
        b.iter(|| black_box(structured_header::parse_dictionary(black_box(SERVER_DEFINED_HEADERS))))
    });

    group.bench_function("parse_to_json", |b| {
        b.iter(|| {
            let dict = structured_header::parse_dictionary(black_box(SERVER_DEFINED_HEADERS)).unwrap();
            black_box(dict.to_json_map())
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_new_format,
    bench_legacy_format,
    bench_structured_headers,
);
criterion_main!(benches);
