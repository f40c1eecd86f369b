//! Infrastructure implementation of the `RuntimeEnv` port: a Python venv.

use std::path::Path;

use anyhow::Result;

use crate::application::ports::{CommandRunner, RuntimeEnv};
use crate::infra::command_runner::ensure_status;

/// Interpreter used to create the environment.
pub const SYSTEM_PYTHON: &str = "python3";

/// `python3 -m venv` plus pip.
pub struct PythonVenv<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> PythonVenv<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    async fn run(&self, program: &str, args: &[&str]) -> Result<()> {
        let status = self.runner.run_status(program, args).await?;
        ensure_status(program, args, status)
    }
}

impl<R: CommandRunner> RuntimeEnv for PythonVenv<R> {
    async fn create(&self, venv: &Path) -> Result<()> {
        let venv = venv.display().to_string();
        self.run(SYSTEM_PYTHON, &["-m", "venv", &venv]).await
    }

    async fn install_requirements(&self, venv: &Path, manifest: &Path) -> Result<()> {
        let python = venv.join("bin").join("python").display().to_string();
        let manifest = manifest.display().to_string();
        self.run(&python, &["-m", "pip", "install", "-r", &manifest])
            .await
    }
}
