use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::process::run_tool;
use crate::sources::VolumeSource;

/// First `[NN%]` token of `amixer get` output.
pub fn parse_amixer_volume(text: &str) -> Option<i32> {
    text.split('[')
        .skip(1)
        .find_map(|chunk| chunk.split_once("%]").and_then(|(n, _)| n.trim().parse().ok()))
}

#[derive(Debug, Clone)]
pub struct Amixer {
    program: String,
    control: String,
}

impl Amixer {
    pub fn new(control: impl Into<String>) -> Self {
        Self::with_program("amixer", control)
    }

    pub fn with_program(program: impl Into<String>, control: impl Into<String>) -> Self {
        Self { program: program.into(), control: control.into() }
    }
}

#[async_trait]
impl VolumeSource for Amixer {
    async fn volume(&self) -> Result<i32> {
        let out = run_tool(&self.program, &["get", self.control.as_str()]).await?;
        anyhow::ensure!(out.status.success(), "{} get {} failed: {}", self.program, self.control, out.status);

        let text = String::from_utf8_lossy(&out.stdout);
        parse_amixer_volume(&text)
            .with_context(|| format!("no volume in amixer output for {}", self.control))
    }
}
