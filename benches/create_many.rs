//! Creates many gifts in quick succession.
//!
//! Most creations land in the same millisecond, so identifier assignment has
//! to walk past the ones already taken.

#![allow(missing_docs)]

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use giftdesk::{CatalogRepository, GiftDraft, JsonCatalog, MemoryCatalog};
use tempfile::TempDir;

fn draft(i: usize) -> GiftDraft {
    GiftDraft::named(format!("Gift {i}"))
        .unwrap()
        .with_prices(100, 500)
        .with_occasions(["Diwali", "Corporate Gifts"])
}

fn create_in_memory(c: &mut Criterion) {
    c.bench_function("create 500 gifts in memory", |b| {
        b.iter_batched(
            || MemoryCatalog::new(Vec::new()),
            |mut catalog| {
                for i in 0..500 {
                    catalog.create(draft(i)).unwrap();
                }
                catalog
            },
            BatchSize::SmallInput,
        );
    });
}

fn create_in_file(c: &mut Criterion) {
    c.bench_function("create 50 gifts in a json file", |b| {
        b.iter_batched(
            || {
                let tmp_dir = TempDir::new().unwrap();
                let catalog = JsonCatalog::open(tmp_dir.path().join("gifts.json")).unwrap();
                (tmp_dir, catalog)
            },
            |(tmp_dir, mut catalog)| {
                for i in 0..50 {
                    catalog.create(draft(i)).unwrap();
                }
                tmp_dir
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, create_in_memory, create_in_file);
criterion_main!(benches);
