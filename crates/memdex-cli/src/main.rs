use anyhow::{Result, bail};
use clap::Parser;
use memdex_core::{ScanConfig, builtin_signatures, load_signatures, run_scan};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "memdex")]
#[command(about = "Extract in-memory DEX containers from a running process")]
struct Args {
    /// Target process id
    pid: u32,

    /// Directory extracted payloads are written into
    #[arg(short, long, env = "MEMDEX_OUTPUT", default_value = "dex-out")]
    output: PathBuf,

    /// JSON signature set replacing the builtin one
    #[arg(long)]
    signatures: Option<PathBuf>,

    /// Signature entry to scan for
    #[arg(long, default_value = "dex")]
    format: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("memdex=info".parse()?)
                .add_directive("memdex_core=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let signatures = match &args.signatures {
        Some(path) => {
            let set = load_signatures(path)?;
            info!(
                "Loaded signature set version {} from {}",
                set.version,
                path.display()
            );
            set
        }
        None => builtin_signatures(),
    };

    let Some(signature) = signatures.entry(&args.format) else {
        bail!("Unknown signature entry: {}", args.format);
    };

    info!("Scanning pid {} for '{}' payloads...", args.pid, signature.name);

    let config = ScanConfig::new(signature.clone(), &args.output);
    let report = match run_scan(args.pid, &config) {
        Ok(report) => report,
        Err(e) if e.is_process_gone() => {
            bail!("No running process with pid {}", args.pid);
        }
        Err(e) => return Err(e.into()),
    };

    println!(
        "Scanned {} readable regions of {} total ({} raced away mid-scan)",
        report.regions_readable, report.regions_total, report.regions_skipped
    );
    println!(
        "Stored {} payloads in {}",
        report.payloads_stored,
        args.output.display()
    );
    if report.store_failures > 0 {
        warn!("{} payloads could not be written", report.store_failures);
    }

    Ok(())
}
