//! `zavod-install autostart`: register an existing installation with systemd.

use anyhow::Result;
use chrono::Utc;

use crate::app::AppContext;
use crate::application::ports::ConfigStore;
use crate::application::services::configure::ask_install_dir;
use crate::application::services::probe::probe_host;
use crate::application::services::registrar::{
    RegistrarOptions, RegistrationOutcome, check_installation, register_service,
};
use crate::application::services::secrets::load_secrets;
use crate::domain::config::InstallerConfig;
use crate::domain::host::HostContext;
use crate::domain::plan::InstallLayout;
use crate::domain::secrets::GITHUB_USERNAME;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::git::GitClient;
use crate::infra::host::SystemAccounts;
use crate::infra::systemd::SystemdManager;
use crate::output::TerminalReporter;

/// Run the autostart command.
///
/// # Errors
///
/// Returns an error if the host is unsupported, the installation is
/// incomplete, or registering the service fails.
pub async fn run(app: &AppContext) -> Result<()> {
    let ctx = &app.output;
    ctx.header("Zavod autostart");

    let config = app.config.load()?;
    let host = probe_host(&app.host, app.sudo_user.as_deref()).await?;
    ctx.success(&format!("{} detected", host.os.pretty_name()));

    let layout = ask_install_dir(&app.prompter, &config, &app.defaults)?;
    check_installation(&app.fs, &layout)?;

    let username = load_secrets(&app.fs, &layout.secrets_file())?
        .and_then(|s| s.get_non_empty(GITHUB_USERNAME).map(str::to_string));
    register(app, &host, &layout, &config, username.as_deref()).await?;
    Ok(())
}

/// Build the elevated adapters and run the registrar. Shared with `install`.
///
/// # Errors
///
/// Returns whatever the registrar returns.
pub async fn register(
    app: &AppContext,
    host: &HostContext,
    layout: &InstallLayout,
    config: &InstallerConfig,
    github_username: Option<&str>,
) -> Result<RegistrationOutcome> {
    app.output.header("Service");
    let reporter = TerminalReporter::new(&app.output);
    let runner = TokioCommandRunner::default();
    let accounts = SystemAccounts::new(&runner, host.elevation);
    let services = SystemdManager::new(&runner, host.elevation);
    let vcs = GitClient::new(&runner);

    let opts = RegistrarOptions {
        host,
        layout,
        service: &config.service,
        github_username,
        header: unit_header(),
    };
    register_service(
        &app.prompter,
        &accounts,
        &services,
        &vcs,
        &app.fs,
        &reporter,
        opts,
    )
    .await
}

fn unit_header() -> String {
    format!(
        "Generated by zavod-install on {}",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )
}
