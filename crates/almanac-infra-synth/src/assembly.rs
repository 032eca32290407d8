//! Cloud assembly output directory
//!
//! Writes one template per stack plus `manifest.json` into an output
//! directory (`cdk.out` by default). The previous manifest is kept as
//! `manifest.json.backup`, and a `lock.json` keeps two runs from writing the
//! same directory at once.

use crate::error::{Result, SynthError};
use crate::manifest::{AssemblyManifest, MANIFEST_VERSION, StackArtifact};
use crate::target::{ProvisioningTarget, SubmitResult};
use crate::template::{TemplateFormat, render_stack};
use almanac_infra_core::{Assembly, ResourceTopology};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs;
use tokio::io::AsyncWriteExt;

pub const DEFAULT_OUT_DIR: &str = "cdk.out";
const MANIFEST_FILE: &str = "manifest.json";
const MANIFEST_BACKUP: &str = "manifest.json.backup";
const LOCK_FILE: &str = "lock.json";

/// Writes assemblies to a directory
pub struct CloudAssemblyWriter {
    out_dir: PathBuf,
    format: TemplateFormat,
}

impl CloudAssemblyWriter {
    pub fn new(out_dir: impl AsRef<Path>, format: TemplateFormat) -> Self {
        Self {
            out_dir: out_dir.as_ref().to_path_buf(),
            format,
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.out_dir.join(MANIFEST_FILE)
    }

    fn backup_path(&self) -> PathBuf {
        self.out_dir.join(MANIFEST_BACKUP)
    }

    fn lock_path(&self) -> PathBuf {
        self.out_dir.join(LOCK_FILE)
    }

    async fn ensure_out_dir(&self) -> Result<()> {
        if !self.out_dir.exists() {
            fs::create_dir_all(&self.out_dir).await?;
            tracing::debug!("Created assembly directory: {}", self.out_dir.display());
        }
        Ok(())
    }

    /// Load the manifest of the last run, if any
    pub async fn load_manifest(&self) -> Result<Option<AssemblyManifest>> {
        let path = self.manifest_path();
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).await?;
        let manifest: AssemblyManifest = serde_json::from_str(&content)?;

        if manifest.version > MANIFEST_VERSION {
            return Err(SynthError::ManifestError(format!(
                "Manifest version {} is newer than supported version {}",
                manifest.version, MANIFEST_VERSION
            )));
        }

        Ok(Some(manifest))
    }

    async fn save_manifest(&self, manifest: &AssemblyManifest) -> Result<()> {
        let path = self.manifest_path();
        let backup = self.backup_path();

        if path.exists() {
            if backup.exists() {
                fs::remove_file(&backup).await?;
            }
            fs::rename(&path, &backup).await?;
            tracing::debug!("Backed up previous manifest");
        }

        let content = serde_json::to_string_pretty(manifest)?;
        fs::write(&path, content).await?;
        tracing::debug!("Saved manifest with {} stacks", manifest.stacks.len());
        Ok(())
    }

    /// Render every stack in memory. Nothing touches the disk here.
    fn render_all(&self, assembly: &Assembly) -> Result<Vec<(StackArtifact, String)>> {
        assembly
            .stacks()
            .iter()
            .map(|stack| {
                let content = render_stack(stack, self.format).inspect_err(|e| {
                    tracing::error!(stack = %stack.stack_name(), error = %e, "Failed to render template");
                })?;
                Ok((StackArtifact::from_topology(stack, self.format), content))
            })
            .collect()
    }

    /// Write every rendered template to a temporary file next to its
    /// destination. On error the temporaries written so far are removed.
    async fn stage_templates(&self, rendered: &[(StackArtifact, String)]) -> Result<Vec<PathBuf>> {
        let mut staged = Vec::with_capacity(rendered.len());
        for (artifact, content) in rendered {
            match self.stage_template(artifact, content).await {
                Ok(tmp) => staged.push(tmp),
                Err(e) => {
                    tracing::error!(stack = %artifact.stack_name, error = %e, "Failed to write template");
                    discard(&staged).await;
                    return Err(e);
                }
            }
        }
        Ok(staged)
    }

    async fn stage_template(&self, artifact: &StackArtifact, content: &str) -> Result<PathBuf> {
        let dest = self.out_dir.join(&artifact.template_file);
        if dest.is_dir() {
            return Err(SynthError::Io(std::io::Error::new(
                std::io::ErrorKind::IsADirectory,
                format!("{} is a directory", dest.display()),
            )));
        }
        let tmp = self.out_dir.join(format!(".{}.tmp", artifact.template_file));
        if let Err(e) = fs::write(&tmp, content).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(tmp)
    }

    /// Acquire the directory lock.
    ///
    /// The lock file is created with `create_new`, so two writers racing for
    /// an unlocked directory cannot both win. A lock older than an hour is
    /// treated as abandoned and taken over.
    pub async fn acquire_lock(&self) -> Result<AssemblyLock> {
        self.ensure_out_dir().await?;
        let lock_path = self.lock_path();

        match LockInfo::current().create_at(&lock_path).await {
            Err(SynthError::Io(e)) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            other => return other.map(|()| AssemblyLock::held(lock_path)),
        }

        let holder = match serde_json::from_str::<LockInfo>(&fs::read_to_string(&lock_path).await?) {
            Ok(holder) => holder,
            // unreadable: still being written, or left behind by a crashed writer
            Err(_) => LockInfo {
                holder: "unknown".to_string(),
                acquired_at: fs::metadata(&lock_path).await?.modified()?.into(),
            },
        };
        if !holder.is_stale(Utc::now()) {
            return Err(SynthError::LockError(format!(
                "{} is locked by {} since {}",
                self.out_dir.display(),
                holder.holder,
                holder.acquired_at
            )));
        }

        tracing::warn!(holder = %holder.holder, since = %holder.acquired_at, "Taking over stale assembly lock");
        fs::remove_file(&lock_path).await?;
        // a writer that slipped in between the removal and here keeps the lock
        match LockInfo::current().create_at(&lock_path).await {
            Err(SynthError::Io(e)) if e.kind() == std::io::ErrorKind::AlreadyExists => Err(
                SynthError::LockError(format!("{} was locked by another writer", self.out_dir.display())),
            ),
            other => other.map(|()| AssemblyLock::held(lock_path)),
        }
    }
}

async fn discard(paths: &[PathBuf]) {
    for path in paths {
        let _ = fs::remove_file(path).await;
    }
}

#[async_trait]
impl ProvisioningTarget for CloudAssemblyWriter {
    fn name(&self) -> &str {
        "cloud-assembly"
    }

    /// Write every stack and then the manifest, or nothing at all.
    ///
    /// Templates are rendered in memory and staged as temporary files before
    /// any destination is replaced, so a failure leaves the previous
    /// templates and manifest as they were.
    async fn submit(&self, assembly: &Assembly) -> Result<SubmitResult> {
        let started = Instant::now();
        let lock = self.acquire_lock().await?;

        // refuse to overwrite output from a newer tool
        self.load_manifest().await?;

        let rendered = self.render_all(assembly)?;
        let staged = self.stage_templates(&rendered).await?;

        let mut result = SubmitResult::new();
        let mut artifacts = Vec::with_capacity(rendered.len());
        for (i, ((artifact, _), tmp)) in rendered.into_iter().zip(&staged).enumerate() {
            if let Err(e) = fs::rename(tmp, self.out_dir.join(&artifact.template_file)).await {
                discard(&staged[i..]).await;
                return Err(e.into());
            }
            tracing::info!(
                stack = %artifact.stack_name,
                file = %artifact.template_file,
                resources = artifact.resource_count,
                "Wrote template"
            );
            result.add_success(artifact.stack_name.clone(), artifact.template_file.clone());
            artifacts.push(artifact);
        }

        self.save_manifest(&AssemblyManifest::new(artifacts)).await?;
        lock.release().await?;

        result.duration_ms = started.elapsed().as_millis() as u64;
        Ok(result)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    holder: String,
    acquired_at: DateTime<Utc>,
}

impl LockInfo {
    fn current() -> Self {
        Self {
            holder: std::env::var("HOSTNAME")
                .or_else(|_| std::env::var("HOST"))
                .unwrap_or_else(|_| "unknown".to_string()),
            acquired_at: Utc::now(),
        }
    }

    fn is_stale(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.acquired_at) >= chrono::Duration::hours(1)
    }

    /// Create the lock file, failing with `AlreadyExists` if it is taken
    async fn create_at(&self, path: &Path) -> Result<()> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await?;
        file.write_all(serde_json::to_string_pretty(self)?.as_bytes())
            .await?;
        file.flush().await?;
        tracing::debug!(path = %path.display(), "Acquired assembly lock");
        Ok(())
    }
}

/// RAII guard for the directory lock
pub struct AssemblyLock {
    lock_path: PathBuf,
    released: bool,
}

impl AssemblyLock {
    fn held(lock_path: PathBuf) -> Self {
        Self {
            lock_path,
            released: false,
        }
    }

    pub async fn release(mut self) -> Result<()> {
        self.released = true;
        match fs::remove_file(&self.lock_path).await {
            Ok(()) => {
                tracing::debug!("Released assembly lock");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for AssemblyLock {
    fn drop(&mut self) {
        if !self.released {
            let _ = std::fs::remove_file(&self.lock_path);
        }
    }
}
