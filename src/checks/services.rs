//! Service list check

use super::CheckContext;
use crate::runtime::RunRequest;
use crate::services::{compare_diffs, diff, parse_services};
use anyhow::{bail, Result};
use tracing::{debug, info};

pub const LIST_SERVICES: &str = "Get-Service | ConvertTo-JSON";

pub async fn expected_services(ctx: &CheckContext) -> Result<()> {
    let tag = ctx.tag();
    let baseline = ctx.fixtures.baseline(tag)?;
    let expected = ctx.fixtures.expected_diff(tag)?;

    let output = ctx
        .runtime
        .run(RunRequest::new(
            &ctx.image,
            ["powershell", LIST_SERVICES],
            ctx.settings.timeouts.query(),
        ))
        .await?;
    let actual = parse_services(&output.stdout, "Get-Service output")?;
    debug!("Image reports {} services", actual.len());

    let observed = diff(&baseline, &actual);
    let mismatch = compare_diffs(&expected, &observed);
    if !mismatch.is_empty() {
        bail!(
            "services differ from the expected {} drift ({} observed, {} expected):\n{}",
            tag,
            observed.len(),
            expected.len(),
            mismatch
        );
    }

    info!(
        "Service drift matches expectations for {} ({} entries)",
        tag,
        observed.len()
    );
    Ok(())
}
