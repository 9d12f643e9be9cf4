use anyhow::Result;
use std::sync::Mutex;
use sysinfo::System;

use crate::sources::CpuProbe;

/// Global CPU usage measured between consecutive probes.
///
/// The first probe after construction reports usage since `new()`, so keep one
/// instance alive for the whole process.
pub struct SysinfoCpu {
    sys: Mutex<System>,
}

impl SysinfoCpu {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_usage();
        Self { sys: Mutex::new(sys) }
    }
}

impl Default for SysinfoCpu {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuProbe for SysinfoCpu {
    fn cpu_percent(&self) -> Result<f32> {
        let mut sys = self.sys.lock()
            .map_err(|_| anyhow::anyhow!("cpu probe lock poisoned"))?;
        sys.refresh_cpu_usage();
        Ok(sys.global_cpu_info().cpu_usage())
    }
}
