//! SMB share mounting from inside the container

use super::CheckContext;
use crate::constants::container_env;
use crate::error::HarnessError;
use crate::runtime::{ContainerRuntime, RunRequest};
use anyhow::{bail, Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, info};

/// Mounts `SHARE_UNC`, writes a file, reads it back and removes it
pub const CONTAINER_TEST_SCRIPT: &str = include_str!("../../scripts/container-test.ps1");

/// One container mount of a share with one set of credentials
#[derive(Debug, Clone)]
pub struct MountAttempt {
    pub unc: String,
    pub username: String,
    pub password: String,
}

impl MountAttempt {
    pub fn request(&self, image: &str, timeout: Duration) -> RunRequest {
        RunRequest::new(image, ["powershell"], timeout)
            .with_env(container_env::SHARE_UNC, &self.unc)
            .with_env(container_env::SHARE_USERNAME, &self.username)
            .with_env(container_env::SHARE_PASSWORD, &self.password)
            .with_stdin(CONTAINER_TEST_SCRIPT)
    }
}

pub async fn mount(
    runtime: &dyn ContainerRuntime,
    image: &str,
    attempt: &MountAttempt,
    timeout: Duration,
) -> Result<(), HarnessError> {
    debug!("Mounting {} as {}", attempt.unc, attempt.username);
    runtime.run(attempt.request(image, timeout)).await?;
    Ok(())
}

pub async fn write_to_share(ctx: &CheckContext, unc: &str) -> Result<()> {
    let attempt = MountAttempt {
        unc: unc.to_string(),
        username: ctx.config.share_username.clone(),
        password: ctx.config.share_password.clone(),
    };
    mount(
        ctx.runtime.as_ref(),
        &ctx.image,
        &attempt,
        ctx.settings.timeouts.mount(),
    )
    .await
    .with_context(|| format!("Failed to write to {}", unc))
}

/// Many simultaneous mounts of the IP-based share with the first user
pub async fn concurrent_mounts(ctx: &CheckContext) -> Result<()> {
    let attempt = MountAttempt {
        unc: ctx.config.ip_share_unc(),
        username: ctx.config.share_username.clone(),
        password: ctx.config.share_password.clone(),
    };
    let count = ctx.settings.concurrent_mounts.max(1);
    mount_in_parallel(ctx, vec![attempt; count]).await
}

/// Two simultaneous mounts of the IP-based share, one per user
pub async fn multi_credential_mounts(ctx: &CheckContext) -> Result<()> {
    let unc = ctx.config.ip_share_unc();
    let attempts = [&ctx.config.share_username, &ctx.config.share_username2]
        .into_iter()
        .map(|username| MountAttempt {
            unc: unc.clone(),
            username: username.clone(),
            password: ctx.config.share_password.clone(),
        })
        .collect();
    mount_in_parallel(ctx, attempts).await
}

/// Run every attempt at once and wait for all of them; any failure fails the whole set
pub async fn mount_in_parallel(ctx: &CheckContext, attempts: Vec<MountAttempt>) -> Result<()> {
    let total = attempts.len();
    let timeout = ctx.settings.timeouts.mount();
    info!("Starting {} parallel mounts", total);

    let mut tasks = JoinSet::new();
    for (index, attempt) in attempts.into_iter().enumerate() {
        let runtime = Arc::clone(&ctx.runtime);
        let image = ctx.image.clone();
        tasks.spawn(async move {
            let result = mount(runtime.as_ref(), &image, &attempt, timeout).await;
            (index, attempt.username, result)
        });
    }

    let mut failures = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((_, _, Ok(()))) => {}
            Ok((index, username, Err(e))) => {
                failures.push((index, format!("mount #{} as {}: {}", index, username, e)));
            }
            Err(e) => failures.push((total, format!("mount task aborted: {}", e))),
        }
    }

    if !failures.is_empty() {
        failures.sort_by_key(|(index, _)| *index);
        let lines: Vec<_> = failures.into_iter().map(|(_, line)| line).collect();
        bail!("{} of {} mounts failed:\n{}", lines.len(), total, lines.join("\n"));
    }

    info!("All {} mounts succeeded", total);
    Ok(())
}
