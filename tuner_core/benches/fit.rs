use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use tuner_core::{FitWindow, SampleSeries, TunerCfg, compute_parameters, fit_line};

// Synthetic step test: flat PV, CV step at 40% of the run, PV ramp after a fixed delay,
// plus white noise on PV
fn synth_step_test(n: usize, noise_amp: f64, seed: u32) -> SampleSeries {
    // tiny PRNG
    let mut state = seed.max(1);
    let mut next_f64 = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state = x;
        f64::from(x) / (f64::from(u32::MAX) + 1.0)
    };
    let dt = 0.1;
    let step_at = n as f64 * 0.4 * dt;
    let t_pv = step_at + 2.0;
    let mut time = Vec::with_capacity(n);
    let mut pv = Vec::with_capacity(n);
    let mut cv = Vec::with_capacity(n);
    for i in 0..n {
        let t = i as f64 * dt;
        let ramp = if t > t_pv { 0.5 * (t - t_pv) } else { 0.0 };
        let noise = (next_f64() * 2.0 - 1.0) * noise_amp;
        time.push(t);
        pv.push(20.0 + ramp + noise);
        cv.push(if t <= step_at { 30.0 } else { 45.0 });
    }
    SampleSeries::new(time, pv, cv).unwrap()
}

pub fn bench_fit(c: &mut Criterion) {
    let mut g = c.benchmark_group("fit");
    // Allow quick tweaking without CLI flags (Criterion 0.5):
    //   BENCH_SAMPLE_SIZE=10 BENCH_MEAS_MS=50 cargo bench -p tuner_core --bench fit
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE") {
        if let Ok(n) = ss.parse::<usize>() {
            g.sample_size(n.max(1));
        }
    } else {
        g.sample_size(50);
    }
    if let Ok(ms) = std::env::var("BENCH_MEAS_MS")
        && let Ok(ms_u64) = ms.parse::<u64>()
    {
        g.measurement_time(std::time::Duration::from_millis(ms_u64));
    }

    for &n in &[1_000usize, 50_000] {
        let series = synth_step_test(n, 0.05, 0xC0FFEE);
        let (t0, t1) = series.time_span();
        let window = FitWindow::new(2, t0 + (t1 - t0) * 0.6, t1);
        g.bench_function(format!("fit_line_{n}"), |b| {
            b.iter(|| black_box(fit_line(black_box(&series), window).ok()))
        });

        let step_at = (t1 - t0) * 0.4;
        let cursors = [t0, step_at, window.start, window.end];
        let cfg = TunerCfg::default();
        g.bench_function(format!("compute_parameters_{n}"), |b| {
            b.iter_batched(
                || cursors,
                |xs| black_box(compute_parameters(black_box(&series), xs, &cfg).ok()),
                BatchSize::SmallInput,
            )
        });
    }
    g.finish();
}

criterion_group!(fit, bench_fit);
criterion_main!(fit);
