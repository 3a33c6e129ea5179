use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use gfm_inline::{Options, parse_inline};

fn parse_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("inline");

    let prose = "The quick brown fox jumps over the lazy dog near the river bank. ".repeat(64);
    let emphatic = "some *emphasis*, **strong _mixed_ text**, and `a code span` too ".repeat(64);
    let linky = "[text](http://example.com \"title\") with ![an image](pic.png) inline ".repeat(64);
    let markup_heavy = "<div class=\"x\"> &amp; <http://a.example> \\* &#35; <!-- c --> ".repeat(64);
    // Unmatched openers in bulk: stresses the delimiter stack cut-offs.
    let pathological = "*a **b ".repeat(512);

    let inputs = [
        ("prose", &prose),
        ("emphatic", &emphatic),
        ("links", &linky),
        ("markup_heavy", &markup_heavy),
        ("pathological", &pathological),
    ];

    let options = Options::default();
    for (name, input) in inputs {
        group.bench_with_input(BenchmarkId::new("parse_inline", name), input, |b, input| {
            b.iter(|| black_box(parse_inline(black_box(input), &options)));
        });
    }

    group.finish();
}

criterion_group!(benches, parse_benchmark);
criterion_main!(benches);
