//! Converge the environment of a random iPEPS site and print the corner
//! spectra.
//!
//! Run with: cargo run --example converge_random

use ctmrg::backend::Cpu;
use ctmrg::config::CtmConfig;
use ctmrg::ctm::{Corner, CtmDriver, SiteTensor};

fn main() {
    let chi = 16;
    let bondim = 2;

    println!("=== CTMRG on a random iPEPS site ===");
    println!("chi = {}, bondim = {}\n", chi, bondim);

    let config = CtmConfig::new(chi, bondim)
        .with_conv_tol(1e-8)
        .with_max_iter(200);
    let driver = CtmDriver::<f64, Cpu>::new(config).expect("valid configuration");

    let site = SiteTensor::random(2, bondim, 42, driver.backend().clone());
    let report = driver.run(&site).expect("run starts");

    println!(
        "terminated: {:?} after {} sweeps, final spectrum distance {:?}\n",
        report.termination, report.sweeps, report.distance
    );

    let spectra = report.env.corner_spectra().expect("finite spectra");
    for (which, spectrum) in [
        Corner::NorthWest,
        Corner::NorthEast,
        Corner::SouthEast,
        Corner::SouthWest,
    ]
    .into_iter()
    .zip(spectra.iter())
    {
        println!("corner {:?} spectrum:", which);
        for (i, sv) in spectrum.iter().enumerate() {
            println!("  {:2}  {:.6e}", i, sv);
        }
        println!();
    }
}
