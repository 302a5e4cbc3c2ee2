use std::process::ExitCode;
use std::sync::Arc;

use colored::*;
use sweepr_common::config::Config;
use sweepr_common::error::ConfigError;
use sweepr_common::network::list::TargetList;
use sweepr_core::report::Report;
use sweepr_core::sweep::sweep_with;
use sweepr_core::worker::{AnnounceWorker, LineSink, TcpConnectWorker, UdpProbeWorker};
use sweepr_core::{DispatchOptions, Dispatcher, Enumerator, UnitReport, Worker};
use tracing::{Instrument, info_span, warn};

use crate::commands::{ProbeArgs, SweepArgs};
use crate::sprint;
use crate::terminal::{colors, format, print, spinner};

const SUMMARY_KEY_WIDTH: usize = 10;
const EXIT_CONFIG_ERROR: u8 = 2;

pub enum Mode {
    Announce,
    Tcp(ProbeArgs),
    Udp(ProbeArgs),
}

struct Plan {
    enumerator: Enumerator,
    worker: Arc<dyn Worker>,
}

pub async fn sweep(mode: Mode, args: &SweepArgs, quiet: u8) -> ExitCode {
    let cfg: Config = args.to_config(quiet);

    let plan = match plan(mode, args, &cfg) {
        Ok(plan) => plan,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let report: Report = run(plan, &cfg).await;
    ExitCode::from(report.exit_code())
}

fn plan(mode: Mode, args: &SweepArgs, cfg: &Config) -> Result<Plan, ConfigError> {
    cfg.validate()?;
    let addresses = TargetList::parse_addresses(&args.addresses, cfg.expand)?;
    let ports = TargetList::parse_ports(&args.ports, cfg.expand)?;

    let worker: Arc<dyn Worker> = match mode {
        Mode::Announce => Arc::new(AnnounceWorker::new(announce_sink(cfg.quiet))),
        Mode::Tcp(probe) => {
            let mut worker = TcpConnectWorker::new().with_read_limit(probe.read_limit);
            if let Some(payload) = probe.payload_bytes() {
                worker = worker.with_payload(payload);
            }
            Arc::new(worker)
        }
        Mode::Udp(probe) => Arc::new(
            UdpProbeWorker::new(probe.payload_bytes().unwrap_or_default())
                .with_read_limit(probe.read_limit),
        ),
    };

    Ok(Plan {
        enumerator: Enumerator::new(addresses, ports),
        worker,
    })
}

async fn run(plan: Plan, cfg: &Config) -> Report {
    let total: usize = plan.enumerator.len();
    print::banner(cfg.quiet);
    print::header(&format!("starting {} sweep", plan.worker.name()), cfg.quiet);
    if cfg.quiet == 0 {
        print::aligned_line("Addresses", plan.enumerator.addresses().len().to_string(), SUMMARY_KEY_WIDTH);
        print::aligned_line("Ports", plan.enumerator.ports().len().to_string(), SUMMARY_KEY_WIDTH);
        print::aligned_line("Targets", total.to_string(), SUMMARY_KEY_WIDTH);
        print::aligned_line("Workers", cfg.concurrency.to_string(), SUMMARY_KEY_WIDTH);
        sprint!();
    }

    spinner::start(total, cfg.quiet);

    let verbose: bool = cfg.verbose;
    let quiet: u8 = cfg.quiet;
    let dispatcher = Arc::new(
        Dispatcher::new(DispatchOptions::from(cfg))
            .with_callback(Box::new(move |unit: &UnitReport| render_unit(unit, verbose, quiet))),
    );

    let interrupt = {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, waiting for in-flight targets to drain");
                dispatcher.cancel();
            }
        })
    };

    let report: Report = sweep_with(&dispatcher, plan.enumerator, plan.worker)
        .instrument(info_span!("sweep", targets = total))
        .await;
    interrupt.abort();
    spinner::finish();

    print_summary(&report, cfg);
    report
}

fn announce_sink(quiet: u8) -> LineSink {
    Arc::new(move |line: String| {
        spinner::set_status(&line);
        if quiet < 2 {
            print::print_status(line);
        }
    })
}

fn render_unit(unit: &UnitReport, verbose: bool, quiet: u8) {
    spinner::report_progress(&unit.target.to_string());
    if quiet >= 2 {
        return;
    }
    if let Some(line) = format::unit_line(unit) {
        print::print_status(line);
    }
    if verbose {
        if let Some(detail) = format::unit_detail(unit) {
            print::detail(detail);
        }
    }
}

fn print_summary(report: &Report, cfg: &Config) {
    let finished: ColoredString = format!("{} targets", report.dispatched).bold().green();
    let total_time: ColoredString = format!("{:.2}s", report.elapsed.as_secs_f64()).bold().yellow();
    let output: String = format!("All work finished: {finished} processed in {total_time}")
        .color(colors::TEXT_DEFAULT)
        .to_string();

    if cfg.quiet == 0 {
        sprint!();
        print::header("sweep summary", cfg.quiet);
        print::aligned_line("Succeeded", report.succeeded().to_string().green(), SUMMARY_KEY_WIDTH);
        for (kind, count) in report.failure_counts() {
            print::aligned_line(kind, count.to_string().red(), SUMMARY_KEY_WIDTH);
        }
        print::aligned_line("Stopped", format!("{:?}", report.stop), SUMMARY_KEY_WIDTH);
        print::fat_separator();
        print::centerln(&output);
        print::end_of_program();
    } else {
        print::print(&output);
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
