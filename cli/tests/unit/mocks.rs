//! Shared mock infrastructure for unit tests.
//!
//! Hand-written fakes for every application port. State lives in `RefCell`s
//! so the fakes can be shared by reference the way services receive ports.

#![allow(dead_code, clippy::expect_used)]

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};
use std::time::Duration;

use anyhow::{Result, bail};
use zavod_installer::application::ports::{
    Accounts, CommandRunner, HostInspector, LocalFs, PackageManager, ProgressReporter, Prompter,
    RuntimeEnv, ServiceManager, VersionControl,
};
use zavod_installer::domain::credentials::GitCredentials;

// ── Exit status / output constructors ────────────────────────────────────────

#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

pub fn ok_output(stdout: &[u8]) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.to_vec(),
        stderr: Vec::new(),
    }
}

pub fn err_output(code: i32, stderr: &[u8]) -> Output {
    Output {
        status: exit_status(code),
        stdout: Vec::new(),
        stderr: stderr.to_vec(),
    }
}

// ── Recording command runner ─────────────────────────────────────────────────

/// Records every command line. Commands succeed with empty output unless a
/// canned reply matches their prefix.
#[derive(Default)]
pub struct RecordingRunner {
    pub calls: RefCell<Vec<String>>,
    /// `(command prefix, stdout)`
    pub replies: Vec<(String, String)>,
    /// Commands starting with this prefix exit 1.
    pub fail_prefix: Option<String>,
}

impl RecordingRunner {
    pub fn with_reply(mut self, prefix: &str, stdout: &str) -> Self {
        self.replies.push((prefix.to_string(), stdout.to_string()));
        self
    }

    pub fn failing(mut self, prefix: &str) -> Self {
        self.fail_prefix = Some(prefix.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, program: &str, args: &[&str]) -> Output {
        let line = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.borrow_mut().push(line.clone());
        if self
            .fail_prefix
            .as_deref()
            .is_some_and(|p| line.starts_with(p))
        {
            return err_output(1, b"simulated failure");
        }
        let stdout = self
            .replies
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, out)| out.as_bytes())
            .unwrap_or_default();
        ok_output(stdout)
    }
}

impl CommandRunner for RecordingRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        Ok(self.record(program, args))
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        _timeout: Duration,
    ) -> Result<Output> {
        Ok(self.record(program, args))
    }

    async fn run_with_env(
        &self,
        program: &str,
        args: &[&str],
        _env: &[(&str, &str)],
    ) -> Result<Output> {
        Ok(self.record(program, args))
    }

    async fn run_status(&self, program: &str, args: &[&str]) -> Result<ExitStatus> {
        Ok(self.record(program, args).status)
    }
}

// ── Scripted prompter ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Secret(String),
    /// `None` is a blank answer, which resolves to the caller's default.
    Confirm(Option<bool>),
}

pub fn text(s: &str) -> Reply {
    Reply::Text(s.to_string())
}

pub fn secret(s: &str) -> Reply {
    Reply::Secret(s.to_string())
}

pub fn yes() -> Reply {
    Reply::Confirm(Some(true))
}

pub fn no() -> Reply {
    Reply::Confirm(Some(false))
}

pub fn enter() -> Reply {
    Reply::Confirm(None)
}

/// Answers prompts from a fixed script. Running out of replies, or a reply of
/// the wrong kind, is an error.
#[derive(Default)]
pub struct ScriptedPrompter {
    replies: RefCell<VecDeque<Reply>>,
    /// Every prompt shown, with its default as `label [default]`.
    pub asked: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: RefCell::new(replies.into_iter().collect()),
            asked: RefCell::new(Vec::new()),
        }
    }

    pub fn remaining(&self) -> usize {
        self.replies.borrow().len()
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }

    fn next(&self, prompt: String) -> Result<Reply> {
        self.asked.borrow_mut().push(prompt.clone());
        match self.replies.borrow_mut().pop_front() {
            Some(reply) => Ok(reply),
            None => bail!("no scripted reply for '{prompt}'"),
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn input(&self, prompt: &str, default: Option<&str>) -> Result<String> {
        let shown = match default {
            Some(d) => format!("{prompt} [{d}]"),
            None => prompt.to_string(),
        };
        match self.next(shown)? {
            Reply::Text(s) => Ok(s),
            other => bail!("expected a text reply for '{prompt}', got {other:?}"),
        }
    }

    fn secret(&self, prompt: &str) -> Result<String> {
        match self.next(prompt.to_string())? {
            Reply::Secret(s) => Ok(s),
            other => bail!("expected a secret reply for '{prompt}', got {other:?}"),
        }
    }

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        match self.next(prompt.to_string())? {
            Reply::Confirm(answer) => Ok(answer.unwrap_or(default)),
            other => bail!("expected a confirmation for '{prompt}', got {other:?}"),
        }
    }
}

// ── Recording reporter ───────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingReporter {
    pub events: RefCell<Vec<(&'static str, String)>>,
}

impl RecordingReporter {
    pub fn of_kind(&self, kind: &str) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.of_kind("warn")
    }

    pub fn infos(&self) -> Vec<String> {
        self.of_kind("info")
    }

    pub fn all_text(&self) -> String {
        self.events
            .borrow()
            .iter()
            .map(|(_, m)| m.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.events.borrow_mut().push(("step", message.to_string()));
    }
    fn success(&self, message: &str) {
        self.events.borrow_mut().push(("success", message.to_string()));
    }
    fn warn(&self, message: &str) {
        self.events.borrow_mut().push(("warn", message.to_string()));
    }
    fn info(&self, message: &str) {
        self.events.borrow_mut().push(("info", message.to_string()));
    }
}

// ── In-memory filesystem ─────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemFs {
    pub files: RefCell<BTreeMap<PathBuf, String>>,
    pub dirs: RefCell<BTreeSet<PathBuf>>,
    pub modes: RefCell<HashMap<PathBuf, u32>>,
    pub removed: RefCell<Vec<PathBuf>>,
}

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dir(self, path: impl AsRef<Path>) -> Self {
        self.add_dirs(path.as_ref());
        self
    }

    pub fn with_file(self, path: impl AsRef<Path>, content: &str) -> Self {
        self.put(path.as_ref(), content);
        self
    }

    pub fn put(&self, path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            self.add_dirs(parent);
        }
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), content.to_string());
    }

    pub fn file(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.borrow().get(path.as_ref()).cloned()
    }

    pub fn exists_path(&self, path: impl AsRef<Path>) -> bool {
        LocalFs::exists(self, path.as_ref())
    }

    pub fn mode(&self, path: impl AsRef<Path>) -> Option<u32> {
        self.modes.borrow().get(path.as_ref()).copied()
    }

    fn add_dirs(&self, path: &Path) {
        let mut dirs = self.dirs.borrow_mut();
        for ancestor in path.ancestors() {
            if !ancestor.as_os_str().is_empty() {
                dirs.insert(ancestor.to_path_buf());
            }
        }
    }
}

impl LocalFs for MemFs {
    fn exists(&self, path: &Path) -> bool {
        self.files.borrow().contains_key(path) || self.dirs.borrow().contains(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.borrow().contains(path)
    }

    fn is_empty_dir(&self, path: &Path) -> Result<bool> {
        if !self.is_dir(path) {
            bail!("{} is not a directory", path.display());
        }
        let has_file = self
            .files
            .borrow()
            .keys()
            .any(|p| p.parent() == Some(path));
        let has_dir = self.dirs.borrow().iter().any(|d| d.parent() == Some(path));
        Ok(!has_file && !has_dir)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.add_dirs(path);
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        self.files.borrow_mut().retain(|p, _| !p.starts_with(path));
        self.dirs.borrow_mut().retain(|d| !d.starts_with(path));
        self.removed.borrow_mut().push(path.to_path_buf());
        Ok(())
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        match self.file(path) {
            Some(content) => Ok(content),
            None => bail!("reading file {}: not found", path.display()),
        }
    }

    fn write_private(&self, path: &Path, content: &str, mode: u32) -> Result<()> {
        let parent_exists = path.parent().is_none_or(|p| self.is_dir(p));
        if !parent_exists {
            bail!("writing file {}: parent missing", path.display());
        }
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), content.to_string());
        self.modes.borrow_mut().insert(path.to_path_buf(), mode);
        Ok(())
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        if !self.exists(path) {
            bail!("resolving {}: not found", path.display());
        }
        Ok(path.to_path_buf())
    }

    fn copy_tree(&self, from: &Path, to: &Path, exclude: fn(&str) -> bool) -> Result<u64> {
        let excluded = |rel: &Path| {
            rel.components()
                .any(|c| c.as_os_str().to_str().is_some_and(exclude))
        };
        let files: Vec<(PathBuf, String)> = self
            .files
            .borrow()
            .iter()
            .filter_map(|(p, c)| {
                let rel = p.strip_prefix(from).ok()?;
                (!excluded(rel)).then(|| (to.join(rel), c.clone()))
            })
            .collect();
        let dirs: Vec<PathBuf> = self
            .dirs
            .borrow()
            .iter()
            .filter_map(|d| {
                let rel = d.strip_prefix(from).ok()?;
                (!excluded(rel)).then(|| to.join(rel))
            })
            .collect();
        for dir in dirs {
            self.add_dirs(&dir);
        }
        let copied = files.len() as u64;
        for (path, content) in files {
            self.put(&path, &content);
        }
        Ok(copied)
    }
}

// ── Host and accounts ────────────────────────────────────────────────────────

pub const UBUNTU_OS_RELEASE: &str = "NAME=\"Ubuntu\"\nID=ubuntu\nID_LIKE=debian\nPRETTY_NAME=\"Ubuntu 24.04.1 LTS\"\n";
pub const DEBIAN_OS_RELEASE: &str = "NAME=\"Debian GNU/Linux\"\nID=debian\nPRETTY_NAME=\"Debian GNU/Linux 12 (bookworm)\"\n";
pub const MINT_OS_RELEASE: &str = "NAME=\"Linux Mint\"\nID=linuxmint\nID_LIKE=\"ubuntu debian\"\nPRETTY_NAME=\"Linux Mint 22\"\n";

pub struct FakeHost {
    pub os_release: String,
    pub uid: u32,
    pub login: String,
    pub sudo: bool,
}

impl FakeHost {
    pub fn ubuntu_user(login: &str) -> Self {
        Self {
            os_release: UBUNTU_OS_RELEASE.to_string(),
            uid: 1000,
            login: login.to_string(),
            sudo: true,
        }
    }
}

impl HostInspector for FakeHost {
    fn os_release(&self) -> Result<String> {
        Ok(self.os_release.clone())
    }
    async fn effective_uid(&self) -> Result<u32> {
        Ok(self.uid)
    }
    async fn login_name(&self) -> Result<String> {
        Ok(self.login.clone())
    }
    async fn sudo_available(&self) -> bool {
        self.sudo
    }
}

pub struct FakeAccounts {
    /// user -> primary group
    pub users: HashMap<String, String>,
    pub owner: RefCell<(String, String)>,
    pub chowns: RefCell<Vec<(PathBuf, String, String)>>,
}

impl FakeAccounts {
    pub fn new(users: &[(&str, &str)], owner: (&str, &str)) -> Self {
        Self {
            users: users
                .iter()
                .map(|(u, g)| ((*u).to_string(), (*g).to_string()))
                .collect(),
            owner: RefCell::new((owner.0.to_string(), owner.1.to_string())),
            chowns: RefCell::new(Vec::new()),
        }
    }
}

impl Accounts for FakeAccounts {
    async fn user_exists(&self, user: &str) -> Result<bool> {
        Ok(self.users.contains_key(user))
    }
    async fn primary_group(&self, user: &str) -> Result<String> {
        match self.users.get(user) {
            Some(group) => Ok(group.clone()),
            None => bail!("id: '{user}': no such user"),
        }
    }
    async fn owner_of(&self, _path: &Path) -> Result<(String, String)> {
        Ok(self.owner.borrow().clone())
    }
    async fn chown_recursive(&self, path: &Path, user: &str, group: &str) -> Result<()> {
        self.chowns
            .borrow_mut()
            .push((path.to_path_buf(), user.to_string(), group.to_string()));
        *self.owner.borrow_mut() = (user.to_string(), group.to_string());
        Ok(())
    }
}

// ── Packages, runtime, git, systemd ──────────────────────────────────────────

#[derive(Default)]
pub struct FakePackages {
    pub installs: RefCell<Vec<Vec<String>>>,
}

impl PackageManager for FakePackages {
    async fn install(&self, packages: &[String]) -> Result<()> {
        self.installs.borrow_mut().push(packages.to_vec());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeRuntime {
    pub calls: RefCell<Vec<String>>,
}

impl RuntimeEnv for FakeRuntime {
    async fn create(&self, venv: &Path) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(format!("create {}", venv.display()));
        Ok(())
    }
    async fn install_requirements(&self, venv: &Path, manifest: &Path) -> Result<()> {
        self.calls.borrow_mut().push(format!(
            "install {} into {}",
            manifest.display(),
            venv.display()
        ));
        Ok(())
    }
}

/// Git fake that "clones" by writing `populate` into the destination.
pub struct FakeVcs<'a> {
    pub fs: &'a MemFs,
    pub populate: Vec<(String, String)>,
    pub clones: RefCell<Vec<(String, String, PathBuf, Option<GitCredentials>)>>,
    pub remote: RefCell<Option<String>>,
    pub fail_set_url: bool,
}

impl<'a> FakeVcs<'a> {
    pub fn new(fs: &'a MemFs) -> Self {
        Self {
            fs,
            populate: vec![
                ("requirements.txt".to_string(), "discord.py\n".to_string()),
                ("bot.py".to_string(), "print('zavod')\n".to_string()),
            ],
            clones: RefCell::new(Vec::new()),
            remote: RefCell::new(None),
            fail_set_url: false,
        }
    }

    pub fn with_populate(mut self, files: &[(&str, &str)]) -> Self {
        self.populate = files
            .iter()
            .map(|(p, c)| ((*p).to_string(), (*c).to_string()))
            .collect();
        self
    }

    pub fn with_remote(self, url: &str) -> Self {
        *self.remote.borrow_mut() = Some(url.to_string());
        self
    }
}

impl VersionControl for FakeVcs<'_> {
    async fn clone_repo(
        &self,
        url: &str,
        branch: &str,
        dest: &Path,
        credentials: Option<&GitCredentials>,
    ) -> Result<()> {
        self.clones.borrow_mut().push((
            url.to_string(),
            branch.to_string(),
            dest.to_path_buf(),
            credentials.cloned(),
        ));
        for (rel, content) in &self.populate {
            self.fs.put(&dest.join(rel), content);
        }
        self.fs.add_dirs(&dest.join(".git"));
        Ok(())
    }

    async fn remote_url(&self, _repo: &Path) -> Result<Option<String>> {
        Ok(self.remote.borrow().clone())
    }

    async fn set_remote_url(&self, _repo: &Path, url: &str) -> Result<()> {
        if self.fail_set_url {
            bail!("git remote set-url failed");
        }
        *self.remote.borrow_mut() = Some(url.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeServices {
    pub calls: RefCell<Vec<String>>,
    pub units: RefCell<Vec<(PathBuf, String)>>,
}

impl ServiceManager for FakeServices {
    async fn install_unit(&self, unit_path: &Path, content: &str) -> Result<()> {
        self.units
            .borrow_mut()
            .push((unit_path.to_path_buf(), content.to_string()));
        self.calls
            .borrow_mut()
            .push(format!("install {}", unit_path.display()));
        Ok(())
    }
    async fn reload(&self) -> Result<()> {
        self.calls.borrow_mut().push("daemon-reload".to_string());
        Ok(())
    }
    async fn enable(&self, name: &str) -> Result<()> {
        self.calls.borrow_mut().push(format!("enable {name}"));
        Ok(())
    }
    async fn restart(&self, name: &str) -> Result<()> {
        self.calls.borrow_mut().push(format!("restart {name}"));
        Ok(())
    }
}
