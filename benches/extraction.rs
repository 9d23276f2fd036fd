//! Benchmarks for selector synthesis and style extraction.
//!
//! Run with: cargo bench

use criterion::{Criterion, criterion_group, criterion_main};

use css_scan::{Document, NodeId, extract, extract_multi, synthesize};

/// A page with a few hundred styled cards and a handful of state rules.
fn sample_page() -> String {
    let mut html = String::from(
        r#"<html><head><style>
             body { font-family: system-ui, sans-serif; color: #222 }
             .grid { display: grid; gap: 12px; padding: 16px }
             .card { padding: 12px 16px; border-radius: 8px; background-color: #fff }
             .card.featured { border: 2px solid gold }
             .card:hover { box-shadow: 0 2px 8px rgba(0, 0, 0, 0.2) }
             .card a { color: teal; text-decoration: none }
             .card a:hover { text-decoration: underline }
             .card a:focus { outline: 2px solid teal }
           </style></head><body><main class="grid">"#,
    );
    for i in 0..300 {
        let featured = if i % 7 == 0 { " featured" } else { "" };
        html.push_str(&format!(
            r#"<article class="card{featured}"><h3>Card {i}</h3><p>Body</p><a href="/c/{i}">More</a></article>"#
        ));
    }
    html.push_str("</main></body></html>");
    html
}

fn targets(doc: &Document, query: &str) -> Vec<NodeId> {
    doc.query_selector_all(query).unwrap()
}

// ============================================================================
// Selector Benchmarks
// ============================================================================

fn bench_synthesize(c: &mut Criterion) {
    let doc = Document::parse(&sample_page());
    let cards = targets(&doc, ".card");

    c.bench_function("synthesize_cards", |b| {
        b.iter(|| cards.iter().map(|&n| synthesize(&doc, n)).count());
    });
}

// ============================================================================
// Extraction Benchmarks
// ============================================================================

fn bench_parse_page(c: &mut Criterion) {
    let html = sample_page();

    c.bench_function("parse_page", |b| {
        b.iter(|| Document::parse(&html));
    });
}

fn bench_extract(c: &mut Criterion) {
    let doc = Document::parse(&sample_page());
    let link = targets(&doc, ".card a")[150];

    c.bench_function("extract_link", |b| {
        b.iter(|| extract(&doc, link));
    });
}

fn bench_extract_multi(c: &mut Criterion) {
    let doc = Document::parse(&sample_page());
    let cards: Vec<NodeId> = targets(&doc, ".card").into_iter().take(10).collect();

    c.bench_function("extract_multi_10", |b| {
        b.iter(|| extract_multi(&doc, &cards));
    });
}

criterion_group!(
    benches,
    // Selectors
    bench_synthesize,
    // Extraction
    bench_parse_page,
    bench_extract,
    bench_extract_multi,
);
criterion_main!(benches);
