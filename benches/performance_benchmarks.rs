//! Performance benchmarks for wxcomp

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use wxcomp::config::{LibraryPattern, ManifestScope};
use wxcomp::core::jsonc;
use wxcomp::manifest::{ComponentId, ManifestFile, UsingComponents};
use wxcomp::resolver::{ReferenceResolver, TagScanner};

fn patterns() -> Vec<LibraryPattern> {
    vec![
        LibraryPattern::new("@vant/weapp", "van"),
        LibraryPattern::new("lx-ui", "lx"),
        LibraryPattern::new("lx-ui-pro", "lx-pro"),
    ]
}

fn large_markup() -> String {
    let mut markup = String::new();
    for i in 0..500 {
        markup.push_str(&format!(
            "<view class=\"row-{}\"><van-cell title=\"{}\" /><lx-pro-table-{} /><text>{}</text></view>\n",
            i,
            i,
            i % 20,
            i
        ));
    }
    markup
}

fn benchmark_tag_scanning(c: &mut Criterion) {
    let scanner = TagScanner::new(&patterns()).unwrap();
    let markup = large_markup();

    c.bench_function("scan_markup_tags", |b| {
        b.iter(|| {
            scanner.scan(black_box(&markup));
        })
    });
}

fn benchmark_component_id_parsing(c: &mut Criterion) {
    let patterns = patterns();

    c.bench_function("parse_component_id", |b| {
        b.iter(|| {
            ComponentId::parse(black_box("van-goods-action-icon"), &patterns);
            ComponentId::parse(black_box("lx-pro-table"), &patterns);
            ComponentId::parse(black_box("my-card"), &patterns);
        })
    });
}

fn large_manifest() -> String {
    let mut usings = String::new();
    for i in 0..200 {
        usings.push_str(&format!(
            "    // component {}\n    \"van-c{}\": \"/wxcomponents/@vant/weapp/c{}/index\",\n",
            i, i, i
        ));
    }
    format!(
        "{{\n  \"pages\": [\"pages/index/index\"],\n  \"usingComponents\": {{\n{}    \"my-card\": \"/components/card/index\"\n  }}\n}}\n",
        usings
    )
}

fn benchmark_manifest_round_trip(c: &mut Criterion) {
    let source = large_manifest();

    c.bench_function("strip_comments", |b| {
        b.iter(|| {
            jsonc::strip_comments(black_box(&source));
        })
    });

    let manifest = ManifestFile::from_source(Path::new("app.json"), ManifestScope::App, source.clone()).unwrap();
    let mut usings = manifest.using_components().unwrap();
    usings.insert("lx-a", "/wxcomponents/lx-ui/a/index");

    c.bench_function("render_manifest", |b| {
        b.iter(|| {
            manifest.render(black_box(&usings)).unwrap();
        })
    });
}

fn benchmark_reference_closure(c: &mut Criterion) {
    // Chain of 100 components, each using the next
    let temp = tempfile::TempDir::new().unwrap();
    let output = temp.path();
    let mut usings = UsingComponents::new();
    for i in 0..100 {
        let dir = output.join("wxcomponents/lx-ui").join(format!("c{}", i));
        fs::create_dir_all(&dir).unwrap();
        let descriptor = if i < 99 {
            format!(r#"{{ "component": true, "usingComponents": {{ "c{}": "../c{}/index" }} }}"#, i + 1, i + 1)
        } else {
            r#"{ "component": true }"#.to_string()
        };
        fs::write(dir.join("index.json"), descriptor).unwrap();
        usings.insert(format!("lx-c{}", i), format!("/wxcomponents/lx-ui/c{}/index", i));
    }

    let resolver = ReferenceResolver::new(output, "wxcomponents", &patterns(), "json");
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let seeds: BTreeSet<ComponentId> = [ComponentId::new("lx", "c0")].into_iter().collect();

    c.bench_function("resolve_reference_chain", |b| {
        b.iter(|| {
            runtime.block_on(resolver.resolve(black_box(seeds.clone()), &usings));
        })
    });
}

criterion_group!(
    benches,
    benchmark_tag_scanning,
    benchmark_component_id_parsing,
    benchmark_manifest_round_trip,
    benchmark_reference_closure
);
criterion_main!(benches);
