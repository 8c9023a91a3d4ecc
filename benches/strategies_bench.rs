//! Criterion benchmarks for the individual strategies.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pcfg_chart::{
    CellCrossHash, CellCrossList, ExhaustiveParser, ExtentFiltered, FrontierKind, Grammar, GrammarBuilder,
    GrammarLoop, Objective, ParserBuilder, PriorFom, Sentence, Strategy, Unconstrained,
};

fn pp_grammar() -> Grammar {
    GrammarBuilder::new()
        .start("ROOT")
        .unary("ROOT", "S", 0.0)
        .binary("S", "NP", "VP", 0.0)
        .binary("NP", "Det", "N", -0.693147)
        .binary("NP", "NP", "PP", -0.693147)
        .binary("VP", "V", "NP", -0.693147)
        .binary("VP", "VP", "PP", -0.693147)
        .binary("PP", "P", "NP", 0.0)
        .lexical("Det", "the", 0.0)
        .lexical("N", "man", -1.098612)
        .lexical("N", "dog", -1.098612)
        .lexical("N", "telescope", -1.098612)
        .lexical("V", "saw", 0.0)
        .lexical("P", "with", 0.0)
        .build()
        .unwrap()
}

fn sentence(grammar: &Grammar, pps: usize) -> Sentence {
    let mut words = vec!["the", "man", "saw", "the", "dog"];
    for _ in 0..pps {
        words.extend_from_slice(&["with", "the", "telescope"]);
    }
    Sentence::from_words(grammar, words)
}

fn bench_exhaustive(c: &mut Criterion) {
    let g = pp_grammar();
    let mut group = c.benchmark_group("exhaustive");
    for pps in [1, 3, 5] {
        let s = sentence(&g, pps);
        group.bench_with_input(BenchmarkId::new("grammar_loop", s.len()), &s, |b, s| {
            let mut parser = ExhaustiveParser::new(&g, GrammarLoop);
            b.iter(|| parser.parse(black_box(s), &Unconstrained))
        });
        group.bench_with_input(BenchmarkId::new("cell_cross_list", s.len()), &s, |b, s| {
            let mut parser = ExhaustiveParser::new(&g, CellCrossList::default());
            b.iter(|| parser.parse(black_box(s), &Unconstrained))
        });
        group.bench_with_input(BenchmarkId::new("cell_cross_hash", s.len()), &s, |b, s| {
            let mut parser = ExhaustiveParser::new(&g, CellCrossHash::default());
            b.iter(|| parser.parse(black_box(s), &Unconstrained))
        });
        group.bench_with_input(BenchmarkId::new("extent", s.len()), &s, |b, s| {
            let mut parser = ExhaustiveParser::new(&g, ExtentFiltered::new());
            b.iter(|| parser.parse(black_box(s), &Unconstrained))
        });
    }
    group.finish();
}

fn bench_agenda(c: &mut Criterion) {
    let g = pp_grammar();
    let s = sentence(&g, 4);
    let mut group = c.benchmark_group("agenda");
    for (name, frontier) in [("scan", FrontierKind::Scan), ("ghost", FrontierKind::Ghost)] {
        for memoize in [false, true] {
            let parser = ParserBuilder::new()
                .strategy(Strategy::Agenda {
                    frontier,
                    objective: Objective::Inside,
                })
                .memoize(memoize)
                .build(&g);
            let id = format!("{}{}", name, if memoize { "_memo" } else { "" });
            group.bench_function(id, |b| b.iter(|| parser.parse(black_box(&s))));
        }
    }
    group.finish();
}

fn bench_coarse(c: &mut Criterion) {
    let g = pp_grammar();
    let s = sentence(&g, 4);
    let mut group = c.benchmark_group("coarse");
    for cap in [0, 2, 8] {
        let parser = ParserBuilder::new()
            .strategy(Strategy::CoarseCell)
            .max_local_edges(cap)
            .build(&g);
        group.bench_with_input(BenchmarkId::new("local_edges", cap), &s, |b, s| {
            b.iter(|| {
                let mut fom = PriorFom::from_grammar(&g);
                parser.parse_with(black_box(s), &Unconstrained, &mut fom)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_exhaustive, bench_agenda, bench_coarse);
criterion_main!(benches);
