use criterion::{criterion_group, criterion_main, Criterion};
use rust_udcn_face::{fast_retransmit_window, grow_window};

fn bench_window_adjustments(c: &mut Criterion) {
    c.bench_function("grow_window", |b| {
        b.iter(|| {
            let mut wnd = 1u64;
            for _ in 0..32 {
                wnd = grow_window(wnd);
            }
            wnd
        })
    });

    c.bench_function("fast_retransmit_window", |b| {
        b.iter(|| {
            let mut wnd = 32u64;
            for _ in 0..32 {
                wnd = fast_retransmit_window(wnd);
            }
            wnd
        })
    });
}

criterion_group!(benches, bench_window_adjustments);
criterion_main!(benches);
