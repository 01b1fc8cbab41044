use criterion::{criterion_group, criterion_main, Criterion};
use serde_json::json;
use time::macros::date;
use unicore::catalog::{filter_records, sort_by_deadline, FilterSpec};
use unicore::index::builtin_corpus;
use unicore::record::{RawUniversity, UniversityRecord};
use unicore::tokenizer::tokenize;
use unicore::KnowledgeBase;

fn sample_catalog(n: usize) -> Vec<UniversityRecord> {
    let cities = ["Lahore,Punjab", "Karachi,Sindh", "Islamabad,Punjab", "Peshawar,KPK", "Quetta,Balochistan"];
    (0..n)
        .map(|i| {
            let raw: RawUniversity = serde_json::from_value(json!({
                "name": format!("University {i}"),
                "admissionOpen": i % 2 == 0,
                "basic_info": {
                    "Location": cities[i % cities.len()],
                    "Sector": if i % 3 == 0 { "Public" } else { "Private" },
                    "Deadline to Apply": format!("{} May 2025", i % 28 + 1),
                },
                "programs": {"BSPrograms": ["CS"], "MSPrograms": ["DS"]},
            }))
            .expect("valid record");
            UniversityRecord::from_raw(raw, i)
        })
        .collect()
}

fn bench_tokenize(c: &mut Criterion) {
    let text: String = builtin_corpus().iter().map(|d| format!("{} {}\n", d.title, d.content)).collect();
    c.bench_function("tokenize_corpus", |b| b.iter(|| tokenize(&text)));
    let kb = KnowledgeBase::new(builtin_corpus());
    c.bench_function("kb_search", |b| b.iter(|| kb.search("Which programs does NUST offer in Islamabad?")));
}

fn bench_catalog(c: &mut Criterion) {
    let records = sample_catalog(300);
    let today = date!(2025 - 05 - 10);
    let spec = FilterSpec { sector: vec!["public".into()], province: vec!["punjab".into()], ..Default::default() };
    c.bench_function("filter_and_sort_300", |b| {
        b.iter(|| sort_by_deadline(filter_records(&records, "university", &spec, today), today))
    });
}

criterion_group!(benches, bench_tokenize, bench_catalog);
criterion_main!(benches);
