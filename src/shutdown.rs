use crate::system::{is_privileged, shutdown_command};
use anyhow::{Context, Result};
use std::process::Command;
use tracing::{info, warn};

/// The irreversible OS call.
pub trait PowerOff {
    fn power_off(&mut self) -> Result<()>;
}

/// Spawns the platform shutdown command and does not wait for it.
pub struct SystemPowerOff;

impl PowerOff for SystemPowerOff {
    fn power_off(&mut self) -> Result<()> {
        let (program, args) = shutdown_command(std::env::consts::OS);
        info!("Running {} {}", program, args.join(" "));
        Command::new(program)
            .args(args)
            .spawn()
            .with_context(|| format!("Failed to run {}", program))?;
        Ok(())
    }
}

pub struct Executor<P: PowerOff> {
    power: P,
    fired: bool,
}

impl<P: PowerOff> Executor<P> {
    pub fn new(power: P) -> Self {
        if !is_privileged() {
            warn!("Not running as root; the shutdown command may be refused");
        }
        Self { power, fired: false }
    }

    /// Issues the shutdown at most once. Failures are logged and dropped,
    /// the window is already gone by now.
    pub fn execute(&mut self) {
        if self.fired {
            return;
        }
        self.fired = true;
        if let Err(e) = self.power.power_off() {
            warn!("Shutdown command failed: {:#}", e);
        }
    }

    #[cfg(test)]
    pub fn fired(&self) -> bool {
        self.fired
    }

    #[cfg(test)]
    pub fn power(&self) -> &P {
        &self.power
    }
}

#[cfg(test)]
pub mod testing {
    use super::PowerOff;
    use anyhow::{bail, Result};

    #[derive(Default)]
    pub struct CountingPowerOff {
        pub calls: usize,
        pub fail: bool,
    }

    impl PowerOff for CountingPowerOff {
        fn power_off(&mut self) -> Result<()> {
            self.calls += 1;
            if self.fail {
                bail!("permission denied");
            }
            Ok(())
        }
    }
}
