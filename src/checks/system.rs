//! Checks against OS components baked into the image

use super::{trimmed_stdout, CheckContext};
use crate::runtime::RunRequest;
use anyhow::{bail, Context, Result};
use tracing::info;

pub const DOTNET_RELEASE: &str = r"Get-ChildItem 'HKLM:\SOFTWARE\Microsoft\NET Framework Setup\NDP\v4\Full\' | Get-ItemPropertyValue -Name Release";

/// Registry key and value written by [`REGISTRY_IMPORT`]
pub const REGISTRY_PROBE_KEY: &str = r"HKLM:\SOFTWARE\WinfsCi";
pub const REGISTRY_PROBE_VALUE: &str = "imported";

/// Writes a `.reg` file, imports it with `reg import` and prints the imported value
pub const REGISTRY_IMPORT: &str = concat!(
    r#"$reg = Join-Path $env:TEMP 'winfs-ci.reg'; "#,
    r#"Set-Content -Path $reg -Encoding Unicode -Value "Windows Registry Editor Version 5.00`r`n`r`n[HKEY_LOCAL_MACHINE\SOFTWARE\WinfsCi]`r`n`"Probe`"=`"imported`"`r`n"; "#,
    r#"reg import $reg 2>&1 | Out-Null; "#,
    r#"if ($LASTEXITCODE -ne 0) { exit $LASTEXITCODE }; "#,
    r#"Get-ItemPropertyValue -Path 'HKLM:\SOFTWARE\WinfsCi' -Name Probe"#
);

pub async fn dotnet_release(ctx: &CheckContext) -> Result<()> {
    let expected = ctx.tag().dotnet_release();
    let output = ctx
        .runtime
        .run(RunRequest::new(
            &ctx.image,
            ["powershell", DOTNET_RELEASE],
            ctx.settings.timeouts.query(),
        ))
        .await
        .context("Failed to query the .NET Framework release")?;

    let actual = trimmed_stdout(&output);
    if actual != expected {
        bail!(
            ".NET Framework release mismatch for {}: expected {}, got {:?}",
            ctx.tag(),
            expected,
            actual
        );
    }

    info!(".NET Framework release {} as expected", actual);
    Ok(())
}

pub async fn registry_import(ctx: &CheckContext) -> Result<()> {
    let output = ctx
        .runtime
        .run(RunRequest::new(
            &ctx.image,
            ["powershell", REGISTRY_IMPORT],
            ctx.settings.timeouts.query(),
        ))
        .await
        .context("Failed to import a registry file")?;

    let actual = trimmed_stdout(&output);
    if actual != REGISTRY_PROBE_VALUE {
        bail!(
            "{}\\Probe should be {:?} after reg import, got {:?}",
            REGISTRY_PROBE_KEY,
            REGISTRY_PROBE_VALUE,
            actual
        );
    }
    Ok(())
}

/// PowerShell that prints each DLL from `dlls` missing from System32, one per line
pub fn missing_dlls_script(dlls: &[&str]) -> String {
    let list = dlls
        .iter()
        .map(|dll| format!("'{}'", dll))
        .collect::<Vec<_>>()
        .join(",");
    format!(
        r#"@({}) | Where-Object {{ -not (Test-Path (Join-Path $env:SystemRoot "System32\$_")) }}"#,
        list
    )
}

pub async fn vc_runtime(ctx: &CheckContext) -> Result<()> {
    let dlls = ctx.tag().required_vc_runtime_dlls();
    let output = ctx
        .runtime
        .run(RunRequest::new(
            &ctx.image,
            ["powershell".to_string(), missing_dlls_script(dlls)],
            ctx.settings.timeouts.query(),
        ))
        .await
        .context("Failed to look for the Visual C++ runtime")?;

    let missing: Vec<String> = output
        .stdout_text()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    if !missing.is_empty() {
        bail!("missing Visual C++ runtime DLLs: {}", missing.join(", "));
    }

    info!("Found {}", dlls.join(", "));
    Ok(())
}
