//! End-to-end driver runs: termination states, budgets, and the
//! configuration fail-fast contract.

use ctmrg::backend::{Cpu, Device};
use ctmrg::config::{CtmConfig, EnvInit};
use ctmrg::ctm::{Corner, CtmDriver, SiteTensor, Termination};
use ctmrg::error::CtmError;
use ctmrg::scalar::DType;
use num_complex::Complex64;

#[test]
fn test_zero_tolerance_runs_exactly_the_budget() {
    // tol = 0 means "never converge early": the driver must perform exactly
    // max_iter sweeps and stop with the budget exhausted.
    let config = CtmConfig::new(16, 2).with_conv_tol(0.0).with_max_iter(10);
    let driver = CtmDriver::<f64, Cpu>::new(config).unwrap();

    let site = SiteTensor::random(2, 2, 42, Cpu);
    let report = driver.run(&site).unwrap();

    assert!(matches!(report.termination, Termination::MaxIterReached));
    assert_eq!(report.sweeps, 10);
    assert!(report.distance.is_some());
}

#[test]
fn test_single_sweep_budget_skips_convergence_check() {
    let config = CtmConfig::new(8, 2).with_conv_tol(1e-8).with_max_iter(1);
    let driver = CtmDriver::<f64, Cpu>::new(config).unwrap();

    let site = SiteTensor::random(2, 2, 7, Cpu);
    let report = driver.run(&site).unwrap();

    assert!(matches!(report.termination, Termination::MaxIterReached));
    assert_eq!(report.sweeps, 1);
    // One sweep has no predecessor spectrum: no distance was ever computed.
    assert!(report.distance.is_none());
}

#[test]
fn test_bondim_mismatch_rejected_before_any_tensor_work() {
    let config = CtmConfig::new(8, 3);
    let driver = CtmDriver::<f64, Cpu>::new(config).unwrap();

    let site = SiteTensor::random(2, 2, 1, Cpu);
    assert!(matches!(
        driver.run(&site),
        Err(CtmError::Configuration(_))
    ));
}

#[test]
fn test_product_state_reaches_rank_one_environment() {
    // A bond-dimension-1 site is a product state: the environment is rank 1
    // after the first sweep and the spectra never move again, so the driver
    // converges on the first comparable sweep for any chi >= 1.
    let config = CtmConfig::new(4, 1).with_conv_tol(1e-8).with_max_iter(10);
    let driver = CtmDriver::<f64, Cpu>::new(config).unwrap();

    let site = SiteTensor::product_state(&[0.6, 0.8], Cpu).unwrap();
    let report = driver.run(&site).unwrap();

    assert!(report.termination.is_converged());
    assert_eq!(report.sweeps, 2);
    assert!(report.distance.unwrap() < 1e-12);

    for which in [
        Corner::NorthWest,
        Corner::NorthEast,
        Corner::SouthEast,
        Corner::SouthWest,
    ] {
        assert_eq!(report.env.corner(which).shape(), &[1, 1]);
    }
}

#[test]
fn test_rank_deficient_site_degrades_chi_gracefully() {
    // A product state embedded at bond dimension 2: every enlarged bond has
    // numerical rank 1, so each move degrades to the available rank instead
    // of aborting, and the run still converges.
    let mut data = vec![0.0f64; 2 * 2 * 2 * 2 * 2];
    data[0] = 0.6; // a[0, 0, 0, 0, 0]
    data[1] = 0.8; // a[1, 0, 0, 0, 0]
    let site = SiteTensor::from_data(&data, 2, 2, Cpu).unwrap();

    let config = CtmConfig::new(8, 2).with_conv_tol(1e-8).with_max_iter(20);
    let driver = CtmDriver::<f64, Cpu>::new(config).unwrap();
    let report = driver.run(&site).unwrap();

    assert!(report.termination.is_converged());
    assert_eq!(report.env.corner(Corner::NorthWest).shape(), &[1, 1]);
}

#[test]
fn test_complex_dtype_runs_end_to_end() {
    let config = CtmConfig::new(8, 2)
        .with_dtype(DType::Complex128)
        .with_conv_tol(0.0)
        .with_max_iter(3);
    let driver = CtmDriver::<Complex64, Cpu>::new(config).unwrap();

    let site = SiteTensor::<Complex64, Cpu>::random(2, 2, 23, Cpu);
    let report = driver.run(&site).unwrap();

    assert!(matches!(report.termination, Termination::MaxIterReached));
    assert_eq!(report.sweeps, 3);

    let c = report.env.corner(Corner::SouthEast);
    assert!(c.shape()[0] <= 8 && c.shape()[1] <= 8);
}

#[test]
fn test_random_environment_init() {
    let config = CtmConfig::new(6, 2)
        .with_init(EnvInit::Random { seed: 99 })
        .with_conv_tol(0.0)
        .with_max_iter(2);
    let driver = CtmDriver::<f64, Cpu>::new(config).unwrap();

    let site = SiteTensor::random(2, 2, 3, Cpu);
    let report = driver.run(&site).unwrap();

    assert_eq!(report.sweeps, 2);
    let c = report.env.corner(Corner::NorthWest);
    assert!(c.shape()[0] <= 6 && c.shape()[1] <= 6);
}

#[test]
fn test_driver_is_reusable_across_runs() {
    let config = CtmConfig::new(6, 2).with_conv_tol(0.0).with_max_iter(2);
    let driver = CtmDriver::<f64, Cpu>::new(config).unwrap();

    let first = driver.run(&SiteTensor::random(2, 2, 1, Cpu)).unwrap();
    let second = driver.run(&SiteTensor::random(2, 2, 2, Cpu)).unwrap();

    assert_eq!(first.sweeps, 2);
    assert_eq!(second.sweeps, 2);
}

#[test]
fn test_zero_site_fails_with_partial_state() {
    // An identically zero site collapses the half-system spectrum in the
    // very first move: the run must end in Failed, carrying the seed
    // environment for diagnosis.
    let config = CtmConfig::new(4, 2).with_max_iter(5);
    let driver = CtmDriver::<f64, Cpu>::new(config).unwrap();

    let site = SiteTensor::from_data(&[0.0; 32], 2, 2, Cpu).unwrap();
    let report = driver.run(&site).unwrap();

    assert!(report.termination.is_failed());
    assert!(matches!(
        report.termination,
        Termination::Failed(CtmError::Numerical(_))
    ));
    assert_eq!(report.sweeps, 0);
    assert!(report.distance.is_none());
    // Partial state is the untouched seed environment
    assert_eq!(report.env.corner(Corner::NorthWest).shape(), &[4, 4]);
}

#[test]
fn test_accelerator_request_surfaces_device_error() {
    let config = CtmConfig::new(8, 2).with_device(Device::Accelerator(1));
    match CtmDriver::<f64, Cpu>::new(config) {
        Err(CtmError::Device { device, .. }) => {
            assert_eq!(device, Device::Accelerator(1));
        }
        _ => panic!("expected a device error"),
    }
}
