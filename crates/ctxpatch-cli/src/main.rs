mod config;

use anyhow::{Context, Result};
use clap::Parser;
use config::{load_config, Args, ConfigOrigin};
use ctxpatch_core::{ContextualPatch, PatchReport, PatchStatus};
use log::debug;
use std::fs;
use std::io::{self, Read};
use std::process;

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

/// Returns whether every patch in the input was applied.
fn run(args: &Args) -> Result<bool> {
    let (config, origin) = load_config(args).context("Error loading config")?;
    match &origin {
        ConfigOrigin::Created(path) => println!("Created default config at {}", path.display()),
        ConfigOrigin::File(path) => debug!("Using config {:?}", path),
        ConfigOrigin::BuiltIn => debug!("Using built-in defaults"),
    }
    let options = config.patch_options(args);

    let patch_bytes = read_patch_input(args)?;
    if patch_bytes.is_empty() {
        anyhow::bail!("Empty patch content.");
    }

    let reports = ContextualPatch::from_bytes(&patch_bytes, &args.dir)
        .with_options(options)
        .patch(args.dry_run)
        .context("Failed to parse patch")?;

    if reports.is_empty() {
        println!("No patches found in the input.");
        return Ok(true);
    }

    for report in &reports {
        print_report(report);
    }

    let count = |status: PatchStatus| reports.iter().filter(|r| r.status == status).count();
    let patched = count(PatchStatus::Patched);

    println!("\n--- Summary{} ---", if args.dry_run { " (dry run)" } else { "" });
    println!("Total patches:        {}", reports.len());
    println!("Successfully applied: {}", patched);
    println!("Missing files:        {}", count(PatchStatus::Missing));
    println!("Failed to apply:      {}", count(PatchStatus::Failure));

    Ok(patched == reports.len())
}

fn read_patch_input(args: &Args) -> Result<Vec<u8>> {
    if let Some(path) = &args.patch_file {
        return fs::read(path).with_context(|| format!("Patch file not found at {:?}", path));
    }

    if atty::is(atty::Stream::Stdin) {
        anyhow::bail!("No patch file specified and no data piped from stdin.");
    }
    let mut buffer = Vec::new();
    io::stdin()
        .read_to_end(&mut buffer)
        .context("Failed to read patch from stdin")?;
    Ok(buffer)
}

fn print_report(report: &PatchReport) {
    let kind = if report.binary { " (binary)" } else { "" };
    println!(
        "[{}] {}{}",
        report.status.to_string().to_uppercase(),
        report.file.display(),
        kind
    );

    if let Some(err) = &report.failure {
        println!("    {}", err);
    }
    if let Some(backup) = report.backup_file.as_ref().filter(|p| p.exists()) {
        println!("    backup: {}", backup.display());
    }
}
