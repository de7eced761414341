//! Tests for the checklist, run against a scripted runtime

use super::*;
use crate::config::Timeouts;
use crate::constants::env;
use crate::runtime::fake::{failed, FakeRuntime};
use crate::runtime::{ProcessOutput, RunRequest};
use crate::services::ServiceState;
use std::collections::HashMap;
use std::path::Path;

fn config(tag: &str) -> HarnessConfig {
    let vars = HashMap::from([
        (env::SHARE_NAME, "winfs"),
        (env::SHARE_USERNAME, "alice"),
        (env::SHARE_USERNAME2, "bob"),
        (env::SHARE_PASSWORD, "hunter2"),
        (env::SHARE_FQDN, "smb.example.internal"),
        (env::SHARE_IP, "10.0.0.5"),
        (env::VERSION_TAG, tag),
        (env::DEPENDENCIES_DIR, "deps"),
    ]);
    HarnessConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap()
}

fn context(runtime: Arc<FakeRuntime>, tag: &str) -> CheckContext {
    let config = config(tag);
    CheckContext {
        runtime: runtime as Arc<dyn ContainerRuntime>,
        image: config.image_id(),
        config: Arc::new(config),
        fixtures: FixtureSet::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")),
        settings: Settings {
            concurrent_mounts: 10,
            timeouts: Timeouts {
                build_secs: 600,
                mount_secs: 300,
                query_secs: 30,
            },
            ..Settings::default()
        },
    }
}

fn env_of<'a>(request: &'a RunRequest, key: &str) -> Option<&'a str> {
    request
        .env
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn baseline_json(tag: Tag) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(tag.as_str())
        .join("baseline-services.json");
    std::fs::read_to_string(path).unwrap()
}

#[test]
fn test_check_names_round_trip() {
    for check in Check::ALL {
        assert_eq!(check.name().parse::<Check>().unwrap(), check);
    }
    let err = "smb".parse::<Check>().unwrap_err();
    assert!(err.to_string().contains("smb-ip"));
}

#[tokio::test]
async fn test_smb_ip_mounts_with_script_on_stdin() {
    let runtime = Arc::new(FakeRuntime::answering(""));
    let ctx = context(runtime.clone(), "1709");

    Check::SmbIp.run(&ctx).await.unwrap();

    let runs = runtime.runs();
    assert_eq!(runs.len(), 1);
    let run = &runs[0];
    assert_eq!(run.image, "windows2016fs-ci:1709");
    assert_eq!(run.command, vec!["powershell"]);
    assert_eq!(env_of(run, "SHARE_UNC"), Some(r"\\10.0.0.5\winfs"));
    assert_eq!(env_of(run, "SHARE_USERNAME"), Some("alice"));
    assert_eq!(env_of(run, "SHARE_PASSWORD"), Some("hunter2"));
    assert_eq!(run.stdin.as_deref(), Some(smb::CONTAINER_TEST_SCRIPT.as_bytes()));
    assert_eq!(run.timeout, std::time::Duration::from_secs(300));
}

#[tokio::test]
async fn test_smb_fqdn_uses_fqdn_share() {
    let runtime = Arc::new(FakeRuntime::answering(""));
    let ctx = context(runtime.clone(), "1709");

    Check::SmbFqdn.run(&ctx).await.unwrap();

    let runs = runtime.runs();
    assert_eq!(env_of(&runs[0], "SHARE_UNC"), Some(r"\\smb.example.internal\winfs"));
}

#[tokio::test]
async fn test_smb_mount_failure_fails_check() {
    let runtime = Arc::new(FakeRuntime::new(|_| Err(failed(2, "System error 53"))));
    let ctx = context(runtime, "1803");

    let err = Check::SmbIp.run(&ctx).await.unwrap_err();
    assert!(format!("{:#}", err).contains("System error 53"));
}

#[tokio::test]
async fn test_concurrent_mounts_run_all_attempts() {
    let runtime = Arc::new(FakeRuntime::answering(""));
    let ctx = context(runtime.clone(), "2019");

    Check::SmbConcurrent.run(&ctx).await.unwrap();

    let runs = runtime.runs();
    assert_eq!(runs.len(), 10);
    assert!(runs
        .iter()
        .all(|run| env_of(run, "SHARE_USERNAME") == Some("alice")));
}

#[tokio::test]
async fn test_multi_credential_uses_both_users() {
    let runtime = Arc::new(FakeRuntime::answering(""));
    let ctx = context(runtime.clone(), "2019");

    Check::SmbMultiCredential.run(&ctx).await.unwrap();

    let mut users: Vec<String> = runtime
        .runs()
        .iter()
        .filter_map(|run| env_of(run, "SHARE_USERNAME").map(str::to_string))
        .collect();
    users.sort();
    assert_eq!(users, vec!["alice", "bob"]);
}

#[tokio::test]
async fn test_one_failed_mount_fails_the_set_after_all_finish() {
    let runtime = Arc::new(FakeRuntime::new(|request| {
        if env_of(request, "SHARE_USERNAME") == Some("bob") {
            Err(failed(5, "Access is denied."))
        } else {
            Ok(ProcessOutput::success(Vec::<u8>::new()))
        }
    }));
    let ctx = context(runtime.clone(), "1803");

    let err = Check::SmbMultiCredential.run(&ctx).await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("1 of 2 mounts failed"));
    assert!(message.contains("as bob"));
    assert!(message.contains("Access is denied."));
    assert_eq!(runtime.runs().len(), 2);
}

#[tokio::test]
async fn test_services_identical_snapshot_passes_for_1709() {
    let runtime = Arc::new(FakeRuntime::answering(&baseline_json(Tag::V1709)));
    let ctx = context(runtime.clone(), "1709");

    Check::Services.run(&ctx).await.unwrap();

    let runs = runtime.runs();
    assert_eq!(runs[0].command, vec!["powershell", "Get-Service | ConvertTo-JSON"]);
    assert_eq!(runs[0].timeout, std::time::Duration::from_secs(30));
}

#[tokio::test]
async fn test_services_unexpected_drift_fails() {
    // 1803 expects drift, so an untouched baseline is a mismatch
    let runtime = Arc::new(FakeRuntime::answering(&baseline_json(Tag::V1803)));
    let ctx = context(runtime, "1803");

    let err = Check::Services.run(&ctx).await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("services differ from the expected 1803 drift"));
    assert!(message.contains("- ssh-agent"));
    assert!(message.contains("- mpssvc"));
}

#[tokio::test]
async fn test_services_new_service_on_1709_fails() {
    let mut services: Vec<ServiceState> =
        serde_json::from_str(&baseline_json(Tag::V1709)).unwrap();
    services.push(ServiceState::new("ssh-agent", 4));
    let json = serde_json::to_string(&services).unwrap();

    let runtime = Arc::new(FakeRuntime::answering(&json));
    let ctx = context(runtime, "1709");

    let err = Check::Services.run(&ctx).await.unwrap_err();
    assert!(err.to_string().contains("+ ssh-agent"));
}

#[tokio::test]
async fn test_services_malformed_output_fails() {
    let runtime = Arc::new(FakeRuntime::answering("not json"));
    let ctx = context(runtime, "1709");

    let err = Check::Services.run(&ctx).await.unwrap_err();
    assert!(err.to_string().contains("Get-Service output"));
}

#[tokio::test]
async fn test_dotnet_release_matches_tag() {
    let runtime = Arc::new(FakeRuntime::answering("461814\r\n"));
    let ctx = context(runtime.clone(), "2019");

    Check::Dotnet.run(&ctx).await.unwrap();
    assert_eq!(runtime.runs()[0].command[1], system::DOTNET_RELEASE);
}

#[tokio::test]
async fn test_dotnet_release_mismatch() {
    let runtime = Arc::new(FakeRuntime::answering("461308\r\n"));
    let ctx = context(runtime, "1803");

    let err = Check::Dotnet.run(&ctx).await.unwrap_err();
    assert!(err.to_string().contains("expected 461808"));
}

#[tokio::test]
async fn test_registry_import() {
    let runtime = Arc::new(FakeRuntime::answering("imported\r\n"));
    let ctx = context(runtime.clone(), "1803");
    Check::RegistryImport.run(&ctx).await.unwrap();
    assert!(runtime.runs()[0].command[1].contains("reg import"));

    let runtime = Arc::new(FakeRuntime::answering(""));
    let ctx = context(runtime, "1803");
    assert!(Check::RegistryImport.run(&ctx).await.is_err());
}

#[tokio::test]
async fn test_vc_runtime_present() {
    let runtime = Arc::new(FakeRuntime::answering("\r\n"));
    let ctx = context(runtime.clone(), "2019");

    Check::VcRuntime.run(&ctx).await.unwrap();
    let runs = runtime.runs();
    assert!(runs[0].command[1].contains("'vcruntime140_1.dll'"));
}

#[tokio::test]
async fn test_vc_runtime_missing() {
    let runtime = Arc::new(FakeRuntime::answering("msvcp140.dll\r\nvcruntime140.dll\r\n"));
    let ctx = context(runtime, "1709");

    let err = Check::VcRuntime.run(&ctx).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "missing Visual C++ runtime DLLs: msvcp140.dll, vcruntime140.dll"
    );
}

#[test]
fn test_missing_dlls_script() {
    let script = system::missing_dlls_script(&["a.dll", "b.dll"]);
    assert!(script.starts_with("@('a.dll','b.dll') | Where-Object"));
    assert!(script.contains(r#""System32\$_""#));
}
