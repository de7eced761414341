use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use winfs_ci::{
    checks::{Check, CheckContext},
    cli::{Cli, Commands},
    config::{HarnessConfig, Settings},
    fixtures::{load_expected_diff, load_services, FixtureSet},
    image::ImageBuilder,
    runtime::{ContainerRuntime, DockerCli},
    services::{compare_diffs, diff},
    suite::Suite,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging to stderr
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            tag,
            image,
            skip_build,
            images_dir,
            fixtures_dir,
            only,
            docker_host,
            report,
        } => {
            let mut settings = Settings::load().context("Failed to load settings")?;
            if let Some(dir) = images_dir {
                settings.images_dir = dir;
            }
            if let Some(dir) = fixtures_dir {
                settings.fixtures_dir = dir;
            }

            let mut config = HarnessConfig::from_env()?;
            if let Some(tag) = tag {
                config = config.with_tag(tag);
            }
            info!("Testing tag {}", config.tag);

            let mut docker = DockerCli::locate()?;
            if let Some(host) = docker_host {
                docker = docker.with_global_args(vec!["-H".to_string(), host]);
            }
            let runtime: Arc<dyn ContainerRuntime> = Arc::new(docker);

            let image = match image {
                Some(image) => image,
                None if skip_build => config.image_id(),
                None => {
                    ImageBuilder::new(&settings.images_dir, &config.dependencies_dir, config.tag)
                        .with_timeout(settings.timeouts.build())
                        .build(runtime.as_ref())
                        .await?
                }
            };

            let context = CheckContext {
                runtime,
                image,
                config: Arc::new(config),
                fixtures: FixtureSet::new(&settings.fixtures_dir),
                settings,
            };
            let report_data = Suite::new(context).with_filter(only).run().await;

            if let Some(path) = report {
                report_data.write_json(&path)?;
            }
            if !report_data.succeeded() {
                std::process::exit(1);
            }
        }
        Commands::Diff {
            baseline,
            actual,
            expected,
        } => {
            let result = diff(&load_services(&baseline)?, &load_services(&actual)?);

            // Only the diff goes to stdout
            println!("{}", serde_json::to_string_pretty(&result)?);

            if let Some(expected) = expected {
                if !matches_expected(&result, &expected)? {
                    std::process::exit(1);
                }
            }
        }
        Commands::Checks => {
            for check in Check::ALL {
                println!("{:<22} {}", check.name(), check.description());
            }
        }
        Commands::Version => {
            println!("winfs-ci {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

fn matches_expected(result: &winfs_ci::services::BaselineDiff, expected_path: &Path) -> Result<bool> {
    let expected = load_expected_diff(expected_path)?;
    let mismatch = compare_diffs(&expected, result);
    if mismatch.is_empty() {
        info!("Diff matches {:?}", expected_path);
        Ok(true)
    } else {
        error!("Diff does not match {:?}:\n{}", expected_path, mismatch);
        Ok(false)
    }
}
