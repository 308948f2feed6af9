//! Fixed-point quality: projector isometry, idempotence at convergence, and
//! the overall decay of the spectrum distance.

use ctmrg::backend::Cpu;
use ctmrg::config::CtmConfig;
use ctmrg::ctm::{sweep, ConvergenceMonitor, CtmDriver, Environment, ProjectorBuilder, SiteTensor};
use ctmrg::tensor::Tensor;
use num_complex::Complex64;

#[test]
fn test_projector_isometry_for_various_shapes() {
    for (m, n, chi) in [(6, 6, 3), (12, 8, 5), (16, 16, 16)] {
        let upper_data: Vec<f64> = (0..m * n).map(|x| ((x * 7 % 13) as f64).sin()).collect();
        let lower_data: Vec<f64> = (0..m * n).map(|x| ((x * 5 % 11) as f64).cos()).collect();
        let upper = Tensor::<f64, Cpu>::from_data(&upper_data, &[m, n]);
        let lower = Tensor::<f64, Cpu>::from_data(&lower_data, &[m, n]);

        let builder = ProjectorBuilder::from_halves(&upper, &lower).unwrap();
        let keep = chi.min(builder.available_rank());
        let pair = builder.isometries(keep).unwrap();

        for p in [&pair.lower, &pair.upper] {
            let gram = p.conj().contract(p, &[0, 1], &[0, 2], &[1, 2]);
            let g = gram.to_vec();
            for c1 in 0..keep {
                for c2 in 0..keep {
                    let expect = if c1 == c2 { 1.0 } else { 0.0 };
                    assert!(
                        (g[c2 * keep + c1] - expect).abs() < 1e-10,
                        "({}, {}, chi {}): gram ({}, {}) = {}",
                        m,
                        n,
                        chi,
                        c1,
                        c2,
                        g[c2 * keep + c1]
                    );
                }
            }
        }
    }
}

#[test]
fn test_projector_isometry_complex() {
    let m = 9;
    let data_u: Vec<Complex64> = (0..m * m)
        .map(|x| Complex64::new((x as f64).sin(), (x as f64 * 0.3).cos()))
        .collect();
    let data_l: Vec<Complex64> = (0..m * m)
        .map(|x| Complex64::new((x as f64 * 0.7).cos(), (x as f64 * 1.1).sin()))
        .collect();
    let upper = Tensor::<Complex64, Cpu>::from_data(&data_u, &[m, m]);
    let lower = Tensor::<Complex64, Cpu>::from_data(&data_l, &[m, m]);

    let builder = ProjectorBuilder::from_halves(&upper, &lower).unwrap();
    let pair = builder.isometries(4).unwrap();

    let gram = pair.upper.conj().contract(&pair.upper, &[0, 1], &[0, 2], &[1, 2]);
    let g = gram.to_vec();
    for c1 in 0..4 {
        for c2 in 0..4 {
            let expect = if c1 == c2 { 1.0 } else { 0.0 };
            assert!((g[c2 * 4 + c1] - Complex64::new(expect, 0.0)).norm() < 1e-10);
        }
    }
}

#[test]
fn test_projector_values_are_descending() {
    let data: Vec<f64> = (0..64).map(|x| ((x % 9) as f64) - 4.0).collect();
    let upper = Tensor::<f64, Cpu>::from_data(&data, &[8, 8]);
    let lower = upper.t().contiguous();

    let builder = ProjectorBuilder::from_halves(&upper, &lower).unwrap();
    for w in builder.values().windows(2) {
        assert!(w[0] >= w[1]);
    }
}

#[test]
fn test_converged_environment_is_idempotent() {
    // One extra sweep on a converged environment must not move the spectra
    // by more than the convergence tolerance.
    let tol = 1e-5;
    let config = CtmConfig::new(8, 2).with_conv_tol(tol).with_max_iter(300);
    let driver = CtmDriver::<f64, Cpu>::new(config).unwrap();

    let site = SiteTensor::random(2, 2, 42, Cpu);
    let report = driver.run(&site).unwrap();
    assert!(
        report.termination.is_converged(),
        "run must converge within the budget (distance {:?})",
        report.distance
    );

    let a2 = site.double_layer();
    let before = report.env.corner_spectra().unwrap();
    let after_env = sweep(&report.env, &a2, 8).unwrap();
    let after = after_env.corner_spectra().unwrap();

    let drift = ConvergenceMonitor::distance(&before, &after);
    assert!(
        drift <= tol,
        "post-convergence sweep moved the spectra by {}",
        drift
    );
}

#[test]
fn test_spectrum_distance_decays_overall() {
    // Regression property, not a hard invariant: truncation noise may cause
    // local wiggles, but over the run the distance must come down.
    let site = SiteTensor::<f64, Cpu>::random(2, 2, 13, Cpu);
    let a2 = site.double_layer();
    let chi = 8;

    let mut env = Environment::from_site_reduction(&a2, chi);
    let mut monitor = ConvergenceMonitor::new(0.0);
    let mut distances = Vec::new();

    for _ in 0..12 {
        env = sweep(&env, &a2, chi).unwrap();
        if let Some(d) = monitor.observe(env.corner_spectra().unwrap()) {
            distances.push(d);
        }
    }

    assert_eq!(distances.len(), 11);
    let first = distances.first().unwrap();
    let last = distances.last().unwrap();
    assert!(
        last <= first,
        "distance grew over the run: first {} last {}",
        first,
        last
    );
    assert!(*last < 0.5, "distance failed to decay: {}", last);
}
