use anyhow::Context;
use api_bridge::bridge::ApiBridge;
use clap::Parser;
use generator::phantom::{build_disc_payload_from_config, PhantomConfig};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::WorkflowConfig;
use workflow::runner::{ReconOutcome, Runner};

mod api_bridge;
mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Workflow driver for the Rust CT reconstruction core")]
struct Args {
    /// Sinogram image file to reconstruct
    #[arg(long)]
    input: Option<PathBuf>,
    /// Run an offline phantom reconstruction and emit a baseline summary
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    #[arg(long, default_value = "ramp")]
    filter: String,
    #[arg(long, default_value_t = 256)]
    output_size: usize,
    #[arg(long, default_value_t = 180.0)]
    angle_range: f32,
    /// Reject unrecognized filter names instead of falling back to ramp
    #[arg(long, default_value_t = false)]
    strict_filter: bool,
    /// Directory receiving the reconstructed images and the run log
    #[arg(long, default_value = "tools/data")]
    output_dir: PathBuf,
    /// Keep the HTTP bridge alive for incoming reconstruction requests
    #[arg(long, default_value_t = false)]
    serve: bool,
}

fn write_outputs(output_dir: &PathBuf, outcome: &ReconOutcome) -> anyhow::Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;

    let recon_path = output_dir.join("reconstruction.png");
    outcome
        .reconstruction
        .save(&recon_path)
        .with_context(|| format!("writing {}", recon_path.display()))?;

    let filtered_path = output_dir.join("filtered_sinogram.png");
    outcome
        .filtered_view
        .save(&filtered_path)
        .with_context(|| format!("writing {}", filtered_path.display()))?;

    let report = format!(
        "filter={} detectors={} angles={} size={} degenerate={}\n",
        outcome.resolved_filter,
        outcome.num_detectors,
        outcome.num_angles,
        outcome.output_size,
        outcome.degenerate_contrast
    );
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(output_dir.join("reconstruction.log"))?;
    file.write_all(report.as_bytes())?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let workflow_config = if let Some(path) = args.workflow {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig {
            strict_filter: args.strict_filter,
            ..WorkflowConfig::from_args(&args.filter, args.output_size, args.angle_range)
        }
    };

    let runner = Runner::new(workflow_config.clone());
    let bridge = ApiBridge::new(Arc::new(runner.clone()));

    if let Some(input) = args.input.as_ref() {
        let encoded =
            fs::read(input).with_context(|| format!("reading sinogram {}", input.display()))?;
        let outcome = runner.execute_bytes(&encoded)?;

        println!(
            "Reconstructed {} -> {}x{} from {} detectors x {} angles ({})",
            input.display(),
            outcome.output_size,
            outcome.output_size,
            outcome.num_detectors,
            outcome.num_angles,
            outcome.resolved_filter
        );
        write_outputs(&args.output_dir, &outcome)?;
        bridge.publish_outcome(&outcome)?;
        bridge.publish_status("Reconstruction results ready.");
    } else if args.offline {
        let phantom = PhantomConfig::default();
        let payload = build_disc_payload_from_config(&phantom)?;
        let shape = (payload.detectors(), payload.num_angles());
        let outcome = runner.execute_payload(payload, shape)?;

        println!(
            "Offline run -> {} detectors x {} angles, output {}x{}, degenerate {}",
            outcome.num_detectors,
            outcome.num_angles,
            outcome.output_size,
            outcome.output_size,
            outcome.degenerate_contrast
        );
        write_outputs(&args.output_dir, &outcome)?;
        bridge.publish_outcome(&outcome)?;
        bridge.publish_status("Offline phantom baseline ready.");
    }

    if args.serve {
        bridge.publish_status("HTTP bridge running (Ctrl+C to stop)...");
        let runtime = TokioBuilder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for signal handling")?;
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
    }

    Ok(())
}
