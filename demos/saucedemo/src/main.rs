//! Runs the storefront features from `features/`.

use std::process::ExitCode;

use saucedemo::SauceDemo;

fn main() -> ExitCode {
    pagewright_cli::run(&SauceDemo::new())
}
