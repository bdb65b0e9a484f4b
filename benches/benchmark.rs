use criterion::{Criterion, black_box, criterion_group, criterion_main};

use scriptorium::canon::BibleStructure;
use scriptorium::clock::{TimeFormat, TimeSlot};
use scriptorium::select;

fn resolution_benchmark(c: &mut Criterion) {
    let structure = BibleStructure::embedded().unwrap();

    c.bench_function("slot target", |b| {
        b.iter(|| {
            let slot = TimeSlot::new(black_box(14), black_box(16), black_box(73));
            slot.target(TimeFormat::TwelveHour)
        })
    });

    c.bench_function("candidate enumeration", |b| {
        b.iter(|| select::candidates(&structure, black_box(2), black_box(16)))
    });

    c.bench_function("candidate choice", |b| {
        let slot = TimeSlot::new(2, 16, 73);
        let found = select::candidates(&structure, 2, 16);
        b.iter(|| select::choose(slot, black_box(&found)))
    });

    c.bench_function("summary shuffle", |b| {
        let slot = TimeSlot::new(3, 55, 311);
        b.iter(|| black_box(slot).shuffle(66))
    });
}

criterion_group!(benches, resolution_benchmark);
criterion_main!(benches);
