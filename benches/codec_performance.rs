use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use invbackup::codec;
use invbackup::host::{ItemBlob, Slots};

/// A main inventory with `filled` of 36 slots holding `item_len`-byte items.
fn inventory(filled: usize, item_len: usize) -> Slots {
    (0..36)
        .map(|slot| (slot < filled).then(|| ItemBlob::new(vec![slot as u8; item_len])))
        .collect()
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    for filled in [0, 18, 36] {
        let slots = inventory(filled, 256);
        group.bench_with_input(BenchmarkId::from_parameter(filled), &slots, |b, slots| {
            b.iter(|| codec::encode(Some(black_box(slots.as_slice()))).unwrap());
        });
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for filled in [0, 18, 36] {
        let text = codec::encode(Some(inventory(filled, 256).as_slice())).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(filled), &text, |b, text| {
            b.iter(|| codec::decode(black_box(text.as_deref())).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
