//! Application service: provisioning the install directory.
//!
//! Installs OS packages, recreates the target directory (only after the
//! user confirms), fills it through a pluggable `SourceAcquirer`, then builds
//! the Python runtime from the dependency manifest.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::application::ports::{
    LocalFs, PackageManager, ProgressReporter, Prompter, RuntimeEnv, SourceAcquirer,
    VersionControl,
};
use crate::domain::credentials::GitCredentials;
use crate::domain::error::InstallError;
use crate::domain::plan::{
    InstallLayout, MANIFEST_FILE, is_copy_excluded, is_within, normalize_path,
};

/// What to provision.
pub struct ProvisionRequest<'a> {
    pub layout: &'a InstallLayout,
    pub packages: &'a [String],
}

/// Run the whole provisioning stage.
///
/// # Errors
///
/// Returns an error if any step fails; nothing is rolled back.
pub async fn provision(
    packages: &impl PackageManager,
    runtime: &impl RuntimeEnv,
    fs: &impl LocalFs,
    prompter: &impl Prompter,
    reporter: &impl ProgressReporter,
    acquirer: &impl SourceAcquirer,
    request: ProvisionRequest<'_>,
) -> Result<()> {
    let target = &request.layout.root;
    acquirer.preflight(target).await?;

    install_packages(packages, reporter, request.packages).await?;
    prepare_target(fs, prompter, reporter, target)?;

    reporter.step(&format!("Fetching code: {}", acquirer.describe()));
    acquirer.acquire(target).await?;
    reporter.success("Code in place");

    let manifest = ensure_manifest(fs, request.layout)?;
    create_runtime(runtime, reporter, request.layout, &manifest).await
}

/// Install OS packages. Safe to repeat: installed packages are left as is.
///
/// # Errors
///
/// Returns an error if the package manager fails.
pub async fn install_packages(
    packages: &impl PackageManager,
    reporter: &impl ProgressReporter,
    names: &[String],
) -> Result<()> {
    reporter.step(&format!("Installing packages: {}", names.join(" ")));
    packages.install(names).await?;
    reporter.success("System packages installed");
    Ok(())
}

/// Make sure `target` exists and is empty.
///
/// A non-empty directory is deleted and recreated only after an explicit
/// "yes"; any other answer aborts the run.
///
/// # Errors
///
/// Returns [`InstallError::DirectoryNotCleared`] when the user declines, or
/// an error if `target` is not a directory or cannot be recreated.
pub fn prepare_target(
    fs: &impl LocalFs,
    prompter: &impl Prompter,
    reporter: &impl ProgressReporter,
    target: &Path,
) -> Result<()> {
    if !fs.exists(target) {
        return fs.create_dir_all(target);
    }
    anyhow::ensure!(
        fs.is_dir(target),
        "{} exists and is not a directory",
        target.display()
    );
    if fs.is_empty_dir(target)? {
        return Ok(());
    }

    let question = format!(
        "{} is not empty. Delete its contents and reinstall?",
        target.display()
    );
    if !prompter.confirm(&question, false)? {
        return Err(InstallError::DirectoryNotCleared(target.to_path_buf()).into());
    }
    reporter.step(&format!("Removing {}", target.display()));
    fs.remove_dir_all(target)?;
    fs.create_dir_all(target)
}

/// Path of the dependency manifest, which must exist.
///
/// # Errors
///
/// Returns [`InstallError::ManifestMissing`] if the file is absent.
pub fn ensure_manifest(fs: &impl LocalFs, layout: &InstallLayout) -> Result<PathBuf> {
    let manifest = layout.manifest();
    if !fs.exists(&manifest) {
        return Err(InstallError::ManifestMissing(manifest).into());
    }
    Ok(manifest)
}

/// Create the virtual environment and install the manifest into it.
///
/// # Errors
///
/// Returns an error if either step fails.
pub async fn create_runtime(
    runtime: &impl RuntimeEnv,
    reporter: &impl ProgressReporter,
    layout: &InstallLayout,
    manifest: &Path,
) -> Result<()> {
    let venv = layout.venv();
    reporter.step(&format!("Creating virtual environment in {}", venv.display()));
    runtime.create(&venv).await?;
    reporter.step("Installing Python dependencies");
    runtime.install_requirements(&venv, manifest).await?;
    reporter.success("Python environment ready");
    Ok(())
}

// ── Source strategies ─────────────────────────────────────────────────────────

/// Clone a git repository.
pub struct GitSource<'a, V: VersionControl> {
    vcs: &'a V,
    url: &'a str,
    branch: &'a str,
    credentials: Option<&'a GitCredentials>,
}

impl<'a, V: VersionControl> GitSource<'a, V> {
    pub fn new(
        vcs: &'a V,
        url: &'a str,
        branch: &'a str,
        credentials: Option<&'a GitCredentials>,
    ) -> Self {
        Self {
            vcs,
            url,
            branch,
            credentials,
        }
    }
}

impl<V: VersionControl> SourceAcquirer for GitSource<'_, V> {
    fn describe(&self) -> String {
        format!("clone {} ({})", self.url, self.branch)
    }

    async fn preflight(&self, _target: &Path) -> Result<()> {
        Ok(())
    }

    async fn acquire(&self, target: &Path) -> Result<()> {
        self.vcs
            .clone_repo(self.url, self.branch, target, self.credentials)
            .await
    }
}

/// Copy a local source tree, leaving out virtualenvs, caches and installer
/// scripts.
pub struct LocalSource<'a, F: LocalFs> {
    fs: &'a F,
    path: PathBuf,
}

impl<'a, F: LocalFs> LocalSource<'a, F> {
    pub fn new(fs: &'a F, path: PathBuf) -> Self {
        Self { fs, path }
    }
}

impl<F: LocalFs> SourceAcquirer for LocalSource<'_, F> {
    fn describe(&self) -> String {
        format!("copy {}", self.path.display())
    }

    async fn preflight(&self, target: &Path) -> Result<()> {
        if !self.fs.is_dir(&self.path) {
            return Err(InstallError::SourceMissing(self.path.clone()).into());
        }
        let source = self.fs.canonicalize(&self.path)?;
        let manifest = source.join(MANIFEST_FILE);
        if !self.fs.exists(&manifest) {
            return Err(InstallError::ManifestMissing(manifest).into());
        }
        let target = resolve_target(self.fs, target)?;
        if is_within(&target, &source) || is_within(&source, &target) {
            return Err(InstallError::SourceTargetOverlap {
                from: source,
                into: target,
            }
            .into());
        }
        Ok(())
    }

    async fn acquire(&self, target: &Path) -> Result<()> {
        let copied = self.fs.copy_tree(&self.path, target, is_copy_excluded)?;
        tracing::debug!(files = copied, "source tree copied");
        Ok(())
    }
}

/// Absolute form of a target that may not exist yet: the nearest existing
/// ancestor is canonicalized and the remaining components are re-appended.
fn resolve_target(fs: &impl LocalFs, target: &Path) -> Result<PathBuf> {
    for base in target.ancestors() {
        if fs.exists(base) {
            let rest = target.strip_prefix(base).unwrap_or(Path::new(""));
            return Ok(normalize_path(&fs.canonicalize(base)?.join(rest)));
        }
    }
    Ok(normalize_path(target))
}
