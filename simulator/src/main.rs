use anyhow::Context;
use clap::{Parser, ValueEnum};
use http_bridge::bridge::{bridge_bind_address, MagnitudeBridge};
use http_bridge::model::MagnitudeModel;
use pgdcore::ScalingLaw;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;

mod generator;
mod http_bridge;
mod workflow;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LawArg {
    Melgar,
    Crowell,
}

impl From<LawArg> for ScalingLaw {
    fn from(arg: LawArg) -> Self {
        match arg {
            LawArg::Melgar => ScalingLaw::Melgar2015,
            LawArg::Crowell => ScalingLaw::Crowell2013,
        }
    }
}

#[derive(Parser)]
#[command(author, version, about = "GNSS network PGD magnitude scenario driver")]
struct Args {
    /// Run one synthetic event through the network and emit a summary
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Load a workflow config from YAML
    #[arg(long)]
    scenario: Option<PathBuf>,
    #[arg(long, default_value_t = 24)]
    stations: usize,
    #[arg(long, default_value_t = 7.5)]
    magnitude: f64,
    /// Hypocentral depth in km
    #[arg(long, default_value_t = 25.0)]
    depth: f64,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    #[arg(long, value_enum, default_value_t = LawArg::Melgar)]
    law: LawArg,
    /// Keep the HTTP bridge alive for scenario requests
    #[arg(long, default_value_t = false)]
    serve: bool,
    #[arg(long, default_value = "tools/data/offline_mw.log")]
    report: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let workflow_config = if let Some(path) = args.scenario.as_ref() {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::from_args(
            args.stations,
            args.magnitude,
            args.depth,
            args.seed,
            args.law.into(),
        )
    };

    let runner = Runner::new(workflow_config);
    let bridge = MagnitudeBridge::new(Arc::new(runner.clone()));

    if args.offline {
        let generator = &runner.config().generator;
        let result = runner.execute_config(generator)?;

        println!(
            "Offline run -> stations {}, in range {}, baselines {}, final Mw {}, peak Mw {}",
            result.stations_registered,
            result.stations_in_range,
            result.baselines,
            format_mw(result.final_mw()),
            format_mw(result.peak_mw()),
        );
        for (code, estimate) in &result.station_mw {
            println!(
                "  {:<6} r={:>7.1} km  Mw={:.2}",
                code, estimate.distance_km, estimate.mw
            );
        }

        let model = MagnitudeModel::from_result(
            &result,
            generator.scenario.clone(),
            generator.description.clone(),
        );
        bridge.publish(&model)?;
        bridge.publish_status("Offline magnitude results ready.");

        let report = format!(
            "magnitude={} law={:?} stations={} in_range={} final_mw={} peak_mw={} failed={}\n",
            generator.magnitude,
            runner.config().aggregation.law,
            result.stations_registered,
            result.stations_in_range,
            format_mw(result.final_mw()),
            format_mw(result.peak_mw()),
            result.metrics.failed
        );
        if let Some(parent) = args.report.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating report directory {}", parent.display()))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&args.report)
            .with_context(|| format!("opening report {}", args.report.display()))?;
        file.write_all(report.as_bytes())?;
    }
    if args.serve {
        bridge.spawn_server(bridge_bind_address());
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

fn format_mw(mw: Option<f64>) -> String {
    mw.map_or_else(|| "n/a".to_string(), |mw| format!("{:.2}", mw))
}
