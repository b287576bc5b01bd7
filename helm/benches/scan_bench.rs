use criterion::{black_box, criterion_group, criterion_main, Criterion};
use helm::scanner::Scanner;
use helm::token::TokenKind;

fn make_script(repeats: usize) -> String {
    let chunk = "set throttle to 0.5.\n\
                 set apo to alt + 42000.\n\
                 print \"stage \" + stage.\n\
                 toggle sas. // hold attitude\n\
                 if apo > 70000 { print \"coasting\". wait 1. }\n\
                 until done { print (apo - peri) / 2 ^ 2. wait 0.1. }\n";
    chunk.repeat(repeats)
}

/// Full-table pass recording each committed kind, used to replay the same
/// token stream through the narrowed path.
fn token_kinds(input: &str) -> Vec<TokenKind> {
    let mut scanner = Scanner::new(input, "bench");
    let mut kinds = Vec::new();
    loop {
        let tok = scanner.scan(&[]);
        kinds.push(tok.kind);
        if tok.kind == TokenKind::EndOfFile {
            return kinds;
        }
    }
}

fn full_table(input: &str) -> usize {
    let mut scanner = Scanner::new(input, "bench");
    let mut count = 0;
    loop {
        let tok = scanner.scan(&[]);
        count += 1;
        if tok.kind == TokenKind::EndOfFile {
            return count;
        }
    }
}

fn narrowed(input: &str, kinds: &[TokenKind]) -> usize {
    let mut scanner = Scanner::new(input, "bench");
    let mut count = 0;
    for &kind in kinds {
        scanner.scan(&[kind]);
        count += 1;
    }
    count
}

fn bench_scan(c: &mut Criterion) {
    let script_small = make_script(10); // ~2.5k
    let script_med = make_script(100); // ~25k
    let script_large = make_script(1000); // ~250k

    let kinds_small = token_kinds(&script_small);
    let kinds_med = token_kinds(&script_med);
    let kinds_large = token_kinds(&script_large);

    let mut g = c.benchmark_group("scan_compare");

    g.bench_function("full_table_small", |b| {
        b.iter(|| full_table(black_box(&script_small)))
    });
    g.bench_function("narrowed_small", |b| {
        b.iter(|| narrowed(black_box(&script_small), black_box(&kinds_small)))
    });

    g.bench_function("full_table_med", |b| {
        b.iter(|| full_table(black_box(&script_med)))
    });
    g.bench_function("narrowed_med", |b| {
        b.iter(|| narrowed(black_box(&script_med), black_box(&kinds_med)))
    });

    g.bench_function("full_table_large", |b| {
        b.iter(|| full_table(black_box(&script_large)))
    });
    g.bench_function("narrowed_large", |b| {
        b.iter(|| narrowed(black_box(&script_large), black_box(&kinds_large)))
    });

    g.finish();
}

criterion_group!(benches, bench_scan);
criterion_main!(benches);
