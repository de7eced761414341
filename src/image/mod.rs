use crate::constants;
use crate::error::HarnessError;
use crate::runtime::{BuildRequest, ContainerRuntime};
use crate::tag::Tag;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info};


/// Builds the image under test from `<images_dir>/<tag>/Dockerfile` plus the dependencies directory
pub struct ImageBuilder {
    images_dir: PathBuf,
    dependencies_dir: PathBuf,
    tag: Tag,
    timeout: Duration,
}

/// Staged build context; the directory is removed when this is dropped
pub struct BuildContext {
    pub dockerfile: PathBuf,
    temp_dir: TempDir,
}

impl BuildContext {
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }
}

impl ImageBuilder {
    pub fn new(images_dir: impl AsRef<Path>, dependencies_dir: impl AsRef<Path>, tag: Tag) -> Self {
        Self {
            images_dir: images_dir.as_ref().to_path_buf(),
            dependencies_dir: dependencies_dir.as_ref().to_path_buf(),
            tag,
            timeout: Duration::from_secs(constants::timeout::BUILD_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn image_id(&self) -> String {
        format!("{}:{}", constants::image::REPOSITORY, self.tag)
    }

    pub fn dockerfile_path(&self) -> PathBuf {
        self.images_dir
            .join(self.tag.as_str())
            .join(constants::image::DOCKERFILE)
    }

    /// Copy the Dockerfile and dependencies into a fresh temporary directory
    pub fn stage(&self) -> Result<BuildContext> {
        let dockerfile = self.dockerfile_path();
        if !dockerfile.is_file() {
            return Err(HarnessError::InvalidPath {
                path: dockerfile,
                message: "expected a Dockerfile".to_string(),
            }
            .into());
        }
        if !self.dependencies_dir.is_dir() {
            return Err(HarnessError::InvalidPath {
                path: self.dependencies_dir.clone(),
                message: "expected a dependencies directory".to_string(),
            }
            .into());
        }

        let temp_dir = tempfile::Builder::new()
            .prefix("build")
            .tempdir()
            .context("Failed to create temporary directory")?;

        let staged_dockerfile = temp_dir.path().join(constants::image::DOCKERFILE);
        fs::copy(&dockerfile, &staged_dockerfile)
            .with_context(|| format!("Failed to copy {:?}", dockerfile))?;

        copy_dir_contents(&self.dependencies_dir, temp_dir.path())?;
        debug!("Staged build context at {:?}", temp_dir.path());

        Ok(BuildContext {
            dockerfile: staged_dockerfile,
            temp_dir,
        })
    }

    /// Stage the context and run `docker build`, returning the image id
    pub async fn build(&self, runtime: &dyn ContainerRuntime) -> Result<String> {
        let image_id = self.image_id();
        info!("Building {} from {:?}", image_id, self.dockerfile_path());

        let context = self.stage()?;
        runtime
            .build(BuildRequest {
                dockerfile: context.dockerfile.clone(),
                context: context.path().to_path_buf(),
                tag: image_id.clone(),
                timeout: self.timeout,
            })
            .await
            .with_context(|| format!("Failed to build {}", image_id))?;

        info!("Successfully built image: {}", image_id);
        Ok(image_id)
    }
}

fn copy_dir_contents(from: &Path, to: &Path) -> Result<()> {
    for entry in fs::read_dir(from).with_context(|| format!("Failed to read {:?}", from))? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            fs::create_dir_all(&target)?;
            copy_dir_contents(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)
                .with_context(|| format!("Failed to copy {:?}", entry.path()))?;
        }
    }
    Ok(())
}
