use criterion::{black_box, criterion_group, criterion_main, Criterion};

use wallcal::{render, CalendarConfig, Theme};

fn bench_plain(c: &mut Criterion) {
    let config = CalendarConfig::for_year(2024);
    c.bench_function("render_plain", |b| b.iter(|| render(black_box(&config))));
}

fn bench_full_featured(c: &mut Criterion) {
    let config = CalendarConfig {
        theme: Theme::VermontWeekends,
        highlight_weekends: true,
        show_day_names: true,
        rotate_month_names: true,
        show_grid: true,
        show_moon_illumination: true,
        show_moon_phase: true,
        ..CalendarConfig::for_year(2024)
    };
    c.bench_function("render_full_featured", |b| b.iter(|| render(black_box(&config))));
}

fn bench_request(c: &mut Criterion) {
    let body = r#"{"startDate":"2024-01-01","theme":"rainbowDays3","optShowMoonPhase":true}"#;
    c.bench_function("render_request", |b| {
        b.iter(|| wallcal::render_request(black_box(body)).unwrap())
    });
}

criterion_group!(benches, bench_plain, bench_full_featured, bench_request);
criterion_main!(benches);
