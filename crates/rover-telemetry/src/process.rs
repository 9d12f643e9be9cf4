use anyhow::{Context, Result};
use std::process::Output;
use tokio::process::Command;
use tracing::debug;

/// Runs an OS tool to completion and captures its output.
///
/// The child is killed if the returned future is dropped (timeout or loop
/// cancellation), so a hung tool never outlives the tick that started it.
pub(crate) async fn run_tool(program: &str, args: &[&str]) -> Result<Output> {
    let mut cmd = Command::new(program);
    cmd.args(args).kill_on_drop(true);

    debug!("telemetry: {} {}", program, args.join(" "));
    cmd.output().await
        .with_context(|| format!("run {} {}", program, args.join(" ")))
}
