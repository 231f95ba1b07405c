//! Benchmarks for the collector and sinks.
//!
//! Run with: cargo bench

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use folio::import::{self, ParagraphBreak, TextConfig, TextImporter};
use folio::sink::{HtmlSink, RawSink, RecordingSink};
use folio::{Collector, PropertyList};

/// A few hundred paragraphs of plain text.
fn sample_text() -> String {
    (0..400)
        .map(|i| format!("Paragraph {i} has\ta few words in it and ends here.\n"))
        .collect()
}

/// Loose text with no explicit containers; every run needs auto-created
/// page span, paragraph and span.
fn feed_loose(collector: &mut Collector) {
    for i in 0..2000 {
        collector.collect_text(if i % 2 == 0 { "word" } else { "other" });
        collector.collect_space();
    }
}

/// Spans opened inside lists inside spans: each list suspends the spans and
/// paragraph around it.
fn feed_suspending(collector: &mut Collector) {
    let empty = PropertyList::new();
    for _ in 0..200 {
        collector.open_paragraph(&empty);
        collector.open_span(&empty);
        collector.collect_text("before");
        collector.open_unordered_list(&empty);
        collector.collect_text("item");
        collector.close_unordered_list();
        collector.collect_text("after");
        collector.close_span();
        collector.close_paragraph();
    }
}

// ============================================================================
// Collector Benchmarks
// ============================================================================

fn bench_collect_loose(c: &mut Criterion) {
    c.bench_function("collect_loose", |b| {
        b.iter(|| {
            let mut collector = Collector::new();
            feed_loose(&mut collector);
            let mut sink = RecordingSink::new();
            collector.finish(&mut sink).unwrap();
            black_box(sink.events().len())
        });
    });
}

fn bench_collect_suspending(c: &mut Criterion) {
    c.bench_function("collect_suspending", |b| {
        b.iter(|| {
            let mut collector = Collector::new();
            feed_suspending(&mut collector);
            let mut sink = RecordingSink::new();
            collector.finish(&mut sink).unwrap();
            black_box(sink.events().len())
        });
    });
}

// ============================================================================
// Sink Benchmarks
// ============================================================================

fn bench_write_html(c: &mut Criterion) {
    let text = sample_text();
    let importer = TextImporter::from_bytes(text.as_bytes(), TextConfig::default());

    c.bench_function("write_html", |b| {
        b.iter(|| {
            let mut sink = HtmlSink::new();
            import::convert(&importer, &mut sink).unwrap();
            black_box(sink.into_string())
        });
    });
}

fn bench_write_raw(c: &mut Criterion) {
    let text = sample_text();
    let config = TextConfig {
        paragraphs: ParagraphBreak::BlankLine,
        ..TextConfig::default()
    };
    let importer = TextImporter::from_bytes(text.as_bytes(), config);

    c.bench_function("write_raw", |b| {
        b.iter(|| {
            let mut sink = RawSink::new();
            import::convert(&importer, &mut sink).unwrap();
            black_box(sink.into_string())
        });
    });
}

criterion_group!(
    benches,
    // Collector
    bench_collect_loose,
    bench_collect_suspending,
    // Sinks
    bench_write_html,
    bench_write_raw,
);
criterion_main!(benches);
