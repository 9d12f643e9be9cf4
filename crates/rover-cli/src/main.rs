use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use rover_proto::HeartbeatSnapshot;
use rover_safety::{doctor as safety_doctor, Actuation, ActuationError, DriverConfig, Heartbeat, SessionHub};
use rover_telemetry::{doctor as telemetry_doctor, LightsFlag, LightsStatus, Sampler, TelemetryConfig, TelemetrySources};

#[derive(Debug, Parser)]
#[command(name = "rover", version, about = "Rover driver - heartbeat watchdog & telemetry")]
struct Cli {
    #[arg(long)]
    config: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate the config and check the telemetry sources once.
    Doctor,
    /// Take one telemetry sample and print it as JSON.
    Sample,
    /// Run a heartbeat session driven by stdin (`hb`, `start`, `end`, `state`,
    /// `lights on|off`, `quit`). Keeps running after stdin closes, until `quit`
    /// or Ctrl-C.
    Run,
}

#[derive(Debug, serde::Deserialize)]
struct Config {
    driver: DriverConfig,
    #[serde(default)]
    telemetry: TelemetryConfig,
}

fn load_config(path: &str) -> Result<Config> {
    let s = std::fs::read_to_string(path).with_context(|| format!("read config {}", path))?;
    toml::from_str(&s).context("parse config toml")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let cfg = load_config(&cli.config)?;

    match cli.cmd {
        Command::Doctor => doctor(&cfg).await?,
        Command::Sample => sample(&cfg).await?,
        Command::Run => run(&cfg).await?,
    }
    Ok(())
}

fn build_sampler(cfg: &Config, lights: Arc<dyn LightsStatus>) -> Sampler {
    Sampler::from_config(&cfg.telemetry, TelemetrySources::linux(&cfg.telemetry, lights))
}

async fn doctor(cfg: &Config) -> Result<()> {
    info!("doctor: starting");

    safety_doctor::check_driver(&cfg.driver)?;
    telemetry_doctor::check_telemetry(&cfg.telemetry)?;

    let sampler = build_sampler(cfg, Arc::new(LightsFlag::default()));
    match sampler.collect().await {
        Ok(s) => info!(
            "doctor: telemetry OK (ssid={} quality={} volume={} battery={}%)",
            s.ssid, s.link_quality, s.volume, s.battery_percent
        ),
        // not fatal: the loop runs fine with invalid snapshots
        Err(e) => warn!("doctor: telemetry sources not ready: {:#}", e),
    }

    info!("doctor: OK");
    Ok(())
}

async fn sample(cfg: &Config) -> Result<()> {
    let sampler = build_sampler(cfg, Arc::new(LightsFlag::default()));

    // cpu usage needs a measurement window
    tokio::time::sleep(Duration::from_millis(250)).await;

    let snap = sampler.sample(&HeartbeatSnapshot::default()).await;
    println!("{}", serde_json::to_string_pretty(&snap)?);
    Ok(())
}

async fn run(cfg: &Config) -> Result<()> {
    let hb_cfg = cfg.driver.heartbeat_config()?;
    info!("run: starting (max heartbeat interval {:?})", hb_cfg.max_heartbeat_interval);

    let lights = Arc::new(LightsFlag::default());
    let sampler = build_sampler(cfg, lights.clone());
    let hb = Arc::new(Heartbeat::new(hb_cfg, Arc::new(LoggingActuation), sampler));

    let hub = SessionHub::new();
    let watcher = hb.watch_sessions(&hub);
    hub.started();

    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("run: cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("run: interrupted");
    };
    serve(BufReader::new(tokio::io::stdin()), ctrl_c, &hb, &hub, &lights).await?;

    // Ended is queued ahead of the close, so the watcher resets before exiting.
    hub.ended();
    drop(hub);
    watcher.await.context("session watcher")?;

    info!("run: done");
    Ok(())
}

/// Handles console commands until `quit` or `shutdown` resolves. Closed input
/// does not end the session, so the driver keeps running when detached.
async fn serve<R, F>(input: R, shutdown: F, hb: &Heartbeat, hub: &SessionHub, lights: &LightsFlag) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut lines = input.lines();
    let mut input_open = true;
    loop {
        tokio::select! {
            _ = &mut shutdown => return Ok(()),
            line = lines.next_line(), if input_open => {
                let Some(line) = line.context("read stdin")? else {
                    info!("run: stdin closed; running until interrupted");
                    input_open = false;
                    continue;
                };
                match line.trim() {
                    "" => {}
                    "hb" => println!("{}", serde_json::to_string(&hb.report_signal_received())?),
                    "start" => { hub.started(); }
                    "end" => { hub.ended(); }
                    "state" => println!("state={:?} running={}", hb.state(), hb.is_running()),
                    "lights on" => lights.set(true),
                    "lights off" => lights.set(false),
                    "quit" => return Ok(()),
                    other => warn!("run: unknown command {:?}", other),
                }
            }
        }
    }
}

/// Stand-in for the motor/servo controllers on a bench without hardware.
struct LoggingActuation;

#[async_trait]
impl Actuation for LoggingActuation {
    fn set_bearing(&self, bearing: &str, immediate: bool) -> Result<(), ActuationError> {
        info!("actuation: set bearing {} (immediate={})", bearing, immediate);
        Ok(())
    }

    async fn look_stop(&self) -> Result<(), ActuationError> {
        info!("actuation: look servo to stop position");
        Ok(())
    }
}
