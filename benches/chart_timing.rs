//! Wall-clock comparison of every parsing strategy on growing sentences.
//!
//! Run with: cargo bench --bench chart_timing

use std::time::Instant;

use pcfg_chart::{
    read_grammar, FrontierKind, Grammar, Intersection, Objective, ParserBuilder, Sentence, Strategy,
};

/// PP-attachment grammar: every extra "with the telescope" multiplies the
/// number of derivations.
const GRAMMAR: &str = "
ROOT
ROOT -> S 0
S -> NP VP 0
NP -> Det N -0.693147
NP -> NP PP -0.693147
VP -> V NP -0.693147
VP -> VP PP -0.693147
PP -> P NP 0
===== LEXICON =====
Det -> the 0
N -> man -1.098612
N -> dog -1.098612
N -> telescope -1.098612
V -> saw 0
P -> with 0
";

fn generate_sentence(n: usize) -> Vec<&'static str> {
    let mut words: Vec<&'static str> = vec!["the", "man", "saw", "the", "dog"];
    while words.len() < n {
        words.extend_from_slice(&["with", "the", "telescope"]);
    }
    words.truncate(n);
    words
}

fn time_strategy(grammar: &Grammar, strategy: Strategy, n: usize, iterations: usize) -> f64 {
    let parser = ParserBuilder::new().strategy(strategy).memoize(true).build(grammar);
    let sentence = Sentence::from_words(grammar, generate_sentence(n));

    let mut total_time = 0.0;
    for _ in 0..iterations {
        let start = Instant::now();
        let _ = parser.parse(&sentence);
        total_time += start.elapsed().as_secs_f64();
    }
    total_time / iterations as f64
}

fn main() {
    let grammar = match read_grammar(GRAMMAR) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("bad benchmark grammar: {}", e);
            return;
        }
    };

    let strategies = [
        ("loop", Strategy::Exhaustive(Intersection::GrammarLoop)),
        ("list", Strategy::Exhaustive(Intersection::CellCrossList)),
        ("hash", Strategy::Exhaustive(Intersection::CellCrossHash)),
        ("extent", Strategy::Exhaustive(Intersection::ExtentFiltered)),
        (
            "scan",
            Strategy::Agenda {
                frontier: FrontierKind::Scan,
                objective: Objective::Inside,
            },
        ),
        (
            "ghost",
            Strategy::Agenda {
                frontier: FrontierKind::Ghost,
                objective: Objective::Inside,
            },
        ),
        ("coarse", Strategy::CoarseCell),
    ];

    // (sentence length, iterations)
    let test_cases = [(5, 1000), (8, 500), (11, 200), (14, 100), (17, 50), (20, 20), (29, 5)];

    print!("{:>8}", "Length");
    for (name, _) in &strategies {
        print!(" {:>10}", name);
    }
    println!("   (ms per sentence)");

    for (n, iterations) in test_cases {
        print!("{:>8}", n);
        for (_, strategy) in &strategies {
            let t = time_strategy(&grammar, *strategy, n, iterations);
            print!(" {:>10.4}", t * 1000.0);
        }
        println!();
    }
}
