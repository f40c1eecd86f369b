//! Command lines produced by the process-backed adapters.

#![allow(clippy::expect_used)]

use std::path::Path;

use zavod_installer::application::ports::{Accounts, PackageManager, RuntimeEnv, ServiceManager};
use zavod_installer::domain::error::InstallError;
use zavod_installer::domain::host::Elevation;
use zavod_installer::infra::host::SystemAccounts;
use zavod_installer::infra::packages::AptPackages;
use zavod_installer::infra::python::PythonVenv;
use zavod_installer::infra::systemd::SystemdManager;

use crate::mocks::RecordingRunner;

fn packages() -> Vec<String> {
    vec!["python3".to_string(), "git".to_string()]
}

#[tokio::test]
async fn apt_runs_update_then_install_through_sudo() {
    let runner = RecordingRunner::default();
    AptPackages::new(&runner, Elevation::Sudo)
        .install(&packages())
        .await
        .expect("install");

    assert_eq!(
        runner.calls(),
        vec![
            "sudo env DEBIAN_FRONTEND=noninteractive apt-get update",
            "sudo env DEBIAN_FRONTEND=noninteractive apt-get install -y python3 git",
        ]
    );
}

#[tokio::test]
async fn apt_as_root_runs_directly() {
    let runner = RecordingRunner::default();
    AptPackages::new(&runner, Elevation::Root)
        .install(&packages())
        .await
        .expect("install");

    assert_eq!(
        runner.calls()[0],
        "env DEBIAN_FRONTEND=noninteractive apt-get update"
    );
}

#[tokio::test]
async fn failing_update_stops_before_install() {
    let runner =
        RecordingRunner::default().failing("sudo env DEBIAN_FRONTEND=noninteractive apt-get update");
    let err = AptPackages::new(&runner, Elevation::Sudo)
        .install(&packages())
        .await
        .expect_err("update fails");

    assert!(matches!(
        err.downcast_ref::<InstallError>(),
        Some(InstallError::CommandFailed { command, .. }) if command.ends_with("apt-get update")
    ));
    assert_eq!(runner.calls().len(), 1);
}

#[tokio::test]
async fn systemd_lifecycle_commands() {
    let runner = RecordingRunner::default();
    let systemd = SystemdManager::new(&runner, Elevation::Sudo);

    systemd
        .install_unit(Path::new("/etc/systemd/system/zavod-bot.service"), "[Unit]\n")
        .await
        .expect("install");
    systemd.reload().await.expect("reload");
    systemd.enable("zavod-bot").await.expect("enable");
    systemd.restart("zavod-bot").await.expect("restart");

    let calls = runner.calls();
    assert!(calls[0].starts_with("sudo install -m 644 "), "{}", calls[0]);
    assert!(calls[0].ends_with(" /etc/systemd/system/zavod-bot.service"));
    assert_eq!(
        &calls[1..],
        &[
            "sudo systemctl daemon-reload",
            "sudo systemctl enable zavod-bot",
            "sudo systemctl restart zavod-bot",
        ]
    );
}

#[tokio::test]
async fn staged_unit_is_removed_after_install() {
    let runner = RecordingRunner::default();
    SystemdManager::new(&runner, Elevation::Root)
        .install_unit(Path::new("/etc/systemd/system/zavod-bot.service"), "[Unit]\n")
        .await
        .expect("install");

    let call = runner.calls()[0].clone();
    let staged = call
        .split_whitespace()
        .nth(3)
        .expect("staged path argument");
    assert!(!Path::new(staged).exists());
}

#[tokio::test]
async fn accounts_queries_and_chown() {
    let runner = RecordingRunner::default()
        .with_reply("stat", "alice:staff\n")
        .with_reply("id -gn", "staff\n");
    let accounts = SystemAccounts::new(&runner, Elevation::Sudo);

    let owner = accounts.owner_of(Path::new("/srv/zavod")).await.expect("stat");
    let group = accounts.primary_group("alice").await.expect("id");
    assert!(accounts.user_exists("alice").await.expect("id"));
    accounts
        .chown_recursive(Path::new("/srv/zavod"), "alice", "staff")
        .await
        .expect("chown");

    assert_eq!(owner, ("alice".to_string(), "staff".to_string()));
    assert_eq!(group, "staff");
    assert_eq!(
        runner.calls(),
        vec![
            "stat -c %U:%G -- /srv/zavod",
            "id -gn -- alice",
            "id -u -- alice",
            "sudo chown -R -- alice:staff /srv/zavod",
        ]
    );
}

#[tokio::test]
async fn missing_user_is_reported_as_absent() {
    let runner = RecordingRunner::default().failing("id -u");
    let accounts = SystemAccounts::new(&runner, Elevation::Root);

    assert!(!accounts.user_exists("mallory").await.expect("id"));
}

#[tokio::test]
async fn venv_creation_and_requirements() {
    let runner = RecordingRunner::default();
    let venv = PythonVenv::new(&runner);

    venv.create(Path::new("/srv/zavod/.venv")).await.expect("venv");
    venv.install_requirements(
        Path::new("/srv/zavod/.venv"),
        Path::new("/srv/zavod/requirements.txt"),
    )
    .await
    .expect("pip");

    assert_eq!(
        runner.calls(),
        vec![
            "python3 -m venv /srv/zavod/.venv",
            "/srv/zavod/.venv/bin/python -m pip install -r /srv/zavod/requirements.txt",
        ]
    );
}
