//! `zavod-install install`: the full provisioning pipeline.

use std::path::Path;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::ports::{ConfigStore, Prompter, SourceAcquirer};
use crate::application::services::configure::{configure_install, remember_choices};
use crate::application::services::probe::probe_host;
use crate::application::services::provision::{GitSource, LocalSource, ProvisionRequest, provision};
use crate::application::services::secrets::persist_install_secrets;
use crate::commands::autostart::register;
use crate::domain::plan::Source;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::git::GitClient;
use crate::infra::packages::AptPackages;
use crate::infra::python::PythonVenv;
use crate::output::{TerminalReporter, progress};

/// Run the install command.
///
/// # Errors
///
/// Returns an error on the first failed or declined step.
pub async fn run(app: &AppContext) -> Result<()> {
    let ctx = &app.output;
    let reporter = TerminalReporter::new(ctx);
    ctx.header("Zavod installer");

    let mut config = app.config.load()?;
    let host = probe_host(&app.host, app.sudo_user.as_deref()).await?;
    ctx.success(&format!("{} detected", host.os.pretty_name()));

    ctx.header("Configuration");
    let plan = configure_install(&app.prompter, &app.fs, &reporter, &config, &app.defaults)?;
    remember_choices(&mut config, &plan);
    app.config.save(&config)?;

    ctx.header("Provisioning");
    let runner = TokioCommandRunner::default();
    let packages = AptPackages::new(&runner, host.elevation);
    let runtime = PythonVenv::new(&runner);
    let vcs = GitClient::new(&runner);
    let request = ProvisionRequest {
        layout: &plan.layout,
        packages: &config.packages,
    };
    match &plan.source {
        Source::Git { url, branch } => {
            let source = GitSource::new(&vcs, url, branch, plan.credentials.as_ref());
            let acquirer = Spinning::new(source, ctx.show_progress());
            provision(&packages, &runtime, &app.fs, &app.prompter, &reporter, &acquirer, request)
                .await?;
        }
        Source::Local { path } => {
            let acquirer = LocalSource::new(&app.fs, path.clone());
            provision(&packages, &runtime, &app.fs, &app.prompter, &reporter, &acquirer, request)
                .await?;
        }
    }

    ctx.header("Secrets");
    persist_install_secrets(&app.fs, &plan)?;
    ctx.success(&format!(
        "Secrets written to {} (mode 0600)",
        plan.layout.secrets_file().display()
    ));

    let question = format!("Register {} as a systemd service?", config.service.name);
    if app.prompter.confirm(&question, true)? {
        let username = plan.credentials.as_ref().map(|c| c.username.as_str());
        register(app, &host, &plan.layout, &config, username).await?;
    } else {
        ctx.info("Run 'zavod-install autostart' later to register the service.");
    }

    ctx.header("Done");
    ctx.success(&format!("Zavod installed in {}", plan.layout.root.display()));
    Ok(())
}

/// Shows a spinner while the wrapped acquirer runs.
struct Spinning<A> {
    inner: A,
    show: bool,
}

impl<A: SourceAcquirer> Spinning<A> {
    fn new(inner: A, show: bool) -> Self {
        Self { inner, show }
    }
}

impl<A: SourceAcquirer> SourceAcquirer for Spinning<A> {
    fn describe(&self) -> String {
        self.inner.describe()
    }

    async fn preflight(&self, target: &Path) -> Result<()> {
        self.inner.preflight(target).await
    }

    async fn acquire(&self, target: &Path) -> Result<()> {
        let msg = self.inner.describe();
        progress::with_spinner(self.show, &msg, self.inner.acquire(target)).await
    }
}
