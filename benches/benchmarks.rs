use criterion::{black_box, criterion_group, criterion_main, Criterion};
use l0dulator::events::{DataInjection, EventRecord};
use l0dulator::l0du::emulator::L0duEmulator;
use l0dulator::l0du::report::L0duReport;
use l0dulator::recipe::{Recipe, RECIPE_TEMPLATE};
use std::sync::Arc;

fn template_event() -> EventRecord {
    EventRecord {
        bcid: 1234,
        data: vec![
            DataInjection {
                name: "M0(Pt)".to_string(),
                bx: 0,
                value: 15,
            },
            DataInjection {
                name: "M1(Pt)".to_string(),
                bx: 0,
                value: 7,
            },
            DataInjection {
                name: "Sum(Et)".to_string(),
                bx: 0,
                value: 620,
            },
            DataInjection {
                name: "Spd(Mult)".to_string(),
                bx: 0,
                value: 100,
            },
        ],
    }
}

fn bench_process_event(c: &mut Criterion) {
    let config = Arc::new(Recipe::from_toml_str(RECIPE_TEMPLATE).unwrap().build().unwrap());
    let mut emulator = L0duEmulator::new(config);
    let event = template_event();
    let _ = c.bench_function("process_event", |b| {
        b.iter(|| emulator.process_event(black_box(&event)))
    });
}

fn bench_summary_bit_packing(c: &mut Criterion) {
    let _ = c.bench_function("summary_bit_packing", |b| {
        b.iter(|| {
            let mut report = L0duReport::default();
            for bx in -2..=2 {
                for id in 0..256u32 {
                    report.set_channel_decision(id, bx, id % 3 == 0);
                }
            }
            for bx in -2..=2 {
                for id in 0..256u32 {
                    let _ = black_box(report.channel_decision(id, bx));
                }
            }
            report
        })
    });
}

criterion_group!(benches, bench_process_event, bench_summary_bit_packing);
criterion_main!(benches);
