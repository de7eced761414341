//! The checklist every image must pass.
//!
//! Each [`Check`] runs one or more containers through the [`ContainerRuntime`]
//! held by the [`CheckContext`] and turns the output into a pass or a failure.

use crate::config::{HarnessConfig, Settings};
use crate::fixtures::FixtureSet;
use crate::runtime::ContainerRuntime;
use crate::tag::Tag;
use anyhow::Result;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub mod services;
pub mod smb;
pub mod system;

#[cfg(test)]
mod tests;

/// Everything a check needs to talk to the image under test
#[derive(Clone)]
pub struct CheckContext {
    pub runtime: Arc<dyn ContainerRuntime>,
    pub config: Arc<HarnessConfig>,
    pub image: String,
    pub fixtures: FixtureSet,
    pub settings: Settings,
}

impl CheckContext {
    pub fn tag(&self) -> Tag {
        self.config.tag
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Check {
    SmbIp,
    SmbFqdn,
    SmbConcurrent,
    SmbMultiCredential,
    Services,
    Dotnet,
    RegistryImport,
    VcRuntime,
}

impl Check {
    /// Every check, in the order the suite runs them
    pub const ALL: [Check; 8] = [
        Check::SmbIp,
        Check::SmbFqdn,
        Check::SmbConcurrent,
        Check::SmbMultiCredential,
        Check::Services,
        Check::Dotnet,
        Check::RegistryImport,
        Check::VcRuntime,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Check::SmbIp => "smb-ip",
            Check::SmbFqdn => "smb-fqdn",
            Check::SmbConcurrent => "smb-concurrent",
            Check::SmbMultiCredential => "smb-multi-credential",
            Check::Services => "services",
            Check::Dotnet => "dotnet",
            Check::RegistryImport => "registry-import",
            Check::VcRuntime => "vc-runtime",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Check::SmbIp => "can write to an IP-based smb share",
            Check::SmbFqdn => "can write to an FQDN-based smb share",
            Check::SmbConcurrent => "can mount one share from many containers at once",
            Check::SmbMultiCredential => {
                "can access one share multiple times, with multiple different credentials on the same VM"
            }
            Check::Services => "has expected list of services",
            Check::Dotnet => "has expected version of .NET Framework",
            Check::RegistryImport => "can import registry files",
            Check::VcRuntime => "has the Visual C++ runtime DLLs",
        }
    }

    pub async fn run(&self, ctx: &CheckContext) -> Result<()> {
        match self {
            Check::SmbIp => smb::write_to_share(ctx, &ctx.config.ip_share_unc()).await,
            Check::SmbFqdn => smb::write_to_share(ctx, &ctx.config.fqdn_share_unc()).await,
            Check::SmbConcurrent => smb::concurrent_mounts(ctx).await,
            Check::SmbMultiCredential => smb::multi_credential_mounts(ctx).await,
            Check::Services => services::expected_services(ctx).await,
            Check::Dotnet => system::dotnet_release(ctx).await,
            Check::RegistryImport => system::registry_import(ctx).await,
            Check::VcRuntime => system::vc_runtime(ctx).await,
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Check {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Check::ALL
            .into_iter()
            .find(|check| check.name() == s)
            .ok_or_else(|| {
                let known: Vec<_> = Check::ALL.iter().map(Check::name).collect();
                anyhow::anyhow!("unknown check '{}' (expected one of: {})", s, known.join(", "))
            })
    }
}

/// Trimmed stdout of a finished container, for checks that compare plain text
pub(crate) fn trimmed_stdout(output: &crate::runtime::ProcessOutput) -> String {
    output.stdout_text().trim().to_string()
}
