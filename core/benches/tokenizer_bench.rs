use criterion::{criterion_group, criterion_main, Criterion};
use index_core::tokenizer::{stems, unique_stems};
use index_core::InvertedIndex;

const TEXT: &str = "The platypus is a semiaquatic, egg-laying mammal endemic to eastern \
Australia. Together with the four species of echidna, it is one of the five extant species \
of monotremes, the only mammals that lay eggs instead of giving birth to live young.";

fn bench_tokenize(c: &mut Criterion) {
    c.bench_function("stem_paragraph", |b| b.iter(|| stems(TEXT)));
}

fn bench_search(c: &mut Criterion) {
    let mut index = InvertedIndex::new();
    for doc in 0..200 {
        let location = format!("doc{doc}.txt");
        for (i, term) in stems(TEXT).iter().enumerate() {
            index.add(term, &location, i + 1);
        }
    }
    let query = unique_stems("mammal eggs spe");
    c.bench_function("exact_search", |b| b.iter(|| index.exact_search(&query)));
    c.bench_function("partial_search", |b| b.iter(|| index.partial_search(&query)));
}

criterion_group!(benches, bench_tokenize, bench_search);
criterion_main!(benches);
