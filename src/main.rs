mod cli;

use std::error::Error;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info, warn};

use cli::{Cli, Command};
use simd_calc::harness::config::{HarnessConfig, VerifyConfig};
use simd_calc::harness::input::{self, MultiplyInput};
use simd_calc::harness::{read_json, verify};
use simd_calc::ops::cpu_features::CpuFeatures;
use simd_calc::simd::REGISTER_BYTES;
use simd_calc::ElementType;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn Error>> {
    let config = HarnessConfig::load_or_default(cli.config.as_deref())?;
    match cli.command {
        Command::Info => cmd_info(),
        Command::Verify(args) => {
            let json = args.json;
            cmd_verify(&args.apply(config.verify), json)
        }
        Command::Multiply(args) => {
            let input: MultiplyInput = read_json(&args.input)?;
            let output = input::multiply(&input, args.precision)?;
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn cmd_info() -> Result<ExitCode, Box<dyn Error>> {
    let features = CpuFeatures::detect();
    println!("CPU features:   {}", features.describe());
    println!("Backend:        {}", features.backend());
    println!("Register width: {} bytes", REGISTER_BYTES);
    for kind in [ElementType::F32, ElementType::F64] {
        println!("{kind} lanes:      {}", kind.lanes());
    }
    if features.sse3_unused() {
        warn!("host supports SSE3; rebuild with -C target-feature=+sse3 for hardware horizontal adds");
    }
    if !features.has_simd() {
        info!("no native 128-bit unit detected, kernels run on the portable backend");
    }

    if verify::smoke() {
        Ok(ExitCode::SUCCESS)
    } else {
        error!("kernel smoke check failed on the {} backend", features.backend());
        Ok(ExitCode::FAILURE)
    }
}

fn cmd_verify(config: &VerifyConfig, json: bool) -> Result<ExitCode, Box<dyn Error>> {
    let report = verify::run(config)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for kernel in &report.kernels {
            println!(
                "{:<18} {:<4} {:>5} cases  max rel error {:>10.3e}  {}",
                kernel.kernel,
                kernel.precision,
                kernel.cases,
                kernel.max_rel_error,
                if kernel.passed { "ok" } else { "FAIL" }
            );
        }
    }

    if report.passed() {
        info!("all {} kernel checks passed", report.kernels.len());
        Ok(ExitCode::SUCCESS)
    } else {
        error!("{} kernel checks failed", report.failures().count());
        Ok(ExitCode::FAILURE)
    }
}
