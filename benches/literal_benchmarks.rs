use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use optree_core::{catalog, lexer::Lexer, parser::Parser, EmitOptions, Marshaller};

// ============================================================================
// Test Data: Varying Complexity and Size
// ============================================================================

const TINY_LITERAL: &str = r#"{ value: 42 }"#;

const SMALL_LITERAL: &str = r#"{
    title: { text: 'Sales', align: 'left' },
    credits: false,
    colors: ['#2caffe', '#544fc5', '#00e272']
}"#;

const MEDIUM_LITERAL: &str = r#"const options = {
    chart: { type: 'line', margin: [10, 20, 30, 40], zoomType: 'x' },
    title: { text: 'Solar Employment', useHTML: true },
    tooltip: {
        shared: true,
        formatter: function () {
            var label = '{' + this.x + '}';
            return label + ': ' + this.y;
        }
    },
    series: [
        { type: 'line', name: 'Installation', data: [43934, 48656, 65165, 81827, 112143] },
        { type: 'area', name: 'Manufacturing', fillOpacity: 0.4, data: [24916, 37941, 29742] },
        { type: 'boxplot', data: [[760, 801, 848, 895, 965], [1, 733, 853, 939, 980, 1080]] }
    ]
};"#;

fn generate_series_literal(points: usize) -> String {
    let data: Vec<String> = (0..points)
        .map(|i| match i % 3 {
            0 => format!("{}", i * 7),
            1 => format!("[{}, {}]", i, i * 3),
            _ => format!("{{ x: {}, y: {}, name: 'p{}' }}", i, i * 5, i),
        })
        .collect();
    format!(
        "{{ series: [{{ type: 'line', name: 'generated', data: [{}] }}] }}",
        data.join(", ")
    )
}

const SIZES: [(&str, &str); 3] = [
    ("tiny", TINY_LITERAL),
    ("small", SMALL_LITERAL),
    ("medium", MEDIUM_LITERAL),
];

// ============================================================================
// Lexer
// ============================================================================

fn bench_lexer_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer");
    for (name, source) in SIZES {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), source, |b, src| {
            b.iter(|| Lexer::new(black_box(src)).lex());
        });
    }
    group.finish();
}

// ============================================================================
// Parser
// ============================================================================

fn bench_parser_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser");
    for (name, source) in SIZES {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), source, |b, src| {
            b.iter(|| Parser::new(black_box(src)).parse_document());
        });
    }
    group.finish();
}

fn bench_parser_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser_scaling");
    for size in [100, 1_000, 10_000] {
        let source = generate_series_literal(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &source, |b, src| {
            b.iter(|| Parser::new(black_box(src)).parse_document());
        });
    }
    group.finish();
}

// ============================================================================
// Marshalling
// ============================================================================

fn bench_decode_options(c: &mut Criterion) {
    let marshaller = Marshaller::new(catalog::builtin());
    let mut group = c.benchmark_group("decode");
    for size in [100, 1_000, 10_000] {
        let source = generate_series_literal(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &source, |b, src| {
            b.iter(|| marshaller.from_literal("Options", black_box(src)));
        });
    }
    group.finish();
}

fn bench_round_trip(c: &mut Criterion) {
    let marshaller = Marshaller::new(catalog::builtin());
    let options = marshaller
        .from_literal("Options", MEDIUM_LITERAL)
        .expect("benchmark input decodes");
    let emit_options = EmitOptions::default();

    c.bench_function("emit_medium", |b| {
        b.iter(|| marshaller.to_literal_with(black_box(&options), &emit_options));
    });
    c.bench_function("round_trip_medium", |b| {
        b.iter(|| {
            let text = marshaller.to_literal_with(black_box(&options), &emit_options);
            marshaller.from_literal("Options", &text)
        });
    });
}

criterion_group!(lexer_benches, bench_lexer_sizes);
criterion_group!(parser_benches, bench_parser_sizes, bench_parser_scaling);
criterion_group!(marshal_benches, bench_decode_options, bench_round_trip);
criterion_main!(lexer_benches, parser_benches, marshal_benches);
