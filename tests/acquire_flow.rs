//! End-to-end tests for the acquisition pipeline.
//!
//! These run the real HTTP transport against a local mock release feed and keep
//! every install path inside a temporary home directory.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::fs;
use std::path::Path;
use std::time::Duration;

use sidestep::{acquire, Acquired, AcquireError, Config, Diagnostics, Endpoint, HttpTransport, Platform};

const ASSET: &str = "sidestepper-linux-x86_64";

fn platform() -> Platform {
    Platform::from_raw("linux", "x86_64")
}

fn transport() -> HttpTransport {
    HttpTransport::new("sidestep-e2e", Duration::from_secs(5)).unwrap()
}

fn config(home: &Path, server: &mockito::ServerGuard) -> Config {
    let mut config = Config::with_home(home, platform());
    config.endpoints = vec![
        Endpoint::new("primary", format!("{}/forge/releases/latest", server.url())),
        Endpoint::new("secondary", format!("{}/github/releases/latest", server.url())),
    ];
    config
}

fn release_body(server: &mockito::ServerGuard, tag: &str) -> String {
    format!(
        r#"{{"tag_name": "{tag}", "assets": [
            {{"name": "sidestepper-windows-x86_64.exe", "browser_download_url": "{url}/dl/win.exe"}},
            {{"name": "{ASSET}", "browser_download_url": "{url}/dl/{tag}/{ASSET}"}}
        ]}}"#,
        url = server.url()
    )
}

#[test]
fn fresh_install_then_idempotent_rerun() {
    let mut server = mockito::Server::new();
    let tmp = tempfile::tempdir().unwrap();
    let repo = tmp.path().join("repo");
    fs::create_dir_all(repo.join(".git")).unwrap();
    let config = config(&tmp.path().join("home"), &server);

    let feed = server
        .mock("GET", "/forge/releases/latest")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(release_body(&server, "v1.4.0"))
        .expect(2)
        .create();
    let download = server
        .mock("GET", format!("/dl/v1.4.0/{ASSET}").as_str())
        .with_status(200)
        .with_body("ELF-payload")
        .expect(1)
        .create();

    let mut diag = Diagnostics::new();
    let first = acquire(Some(&repo), &config, platform(), &transport(), &mut diag).unwrap();
    assert_eq!(first, Acquired::Installed(config.global_binary.clone()));
    assert_eq!(fs::read(&config.global_binary).unwrap(), b"ELF-payload");
    assert_eq!(fs::read_to_string(&config.version_file).unwrap(), "v1.4.0");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(&config.global_binary).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111, "binary should have executable bits set");
    }

    let second = acquire(Some(&repo), &config, platform(), &transport(), &mut diag).unwrap();
    assert_eq!(second, Acquired::Global(config.global_binary.clone()));

    feed.assert();
    download.assert();
}

#[test]
fn primary_outage_falls_back_to_secondary() {
    let mut server = mockito::Server::new();
    let tmp = tempfile::tempdir().unwrap();
    let config = config(&tmp.path().join("home"), &server);

    let _primary = server
        .mock("GET", "/forge/releases/latest")
        .with_status(502)
        .create();
    let _secondary = server
        .mock("GET", "/github/releases/latest")
        .with_status(200)
        .with_body(release_body(&server, "v2.0.0"))
        .create();
    let _download = server
        .mock("GET", format!("/dl/v2.0.0/{ASSET}").as_str())
        .with_status(200)
        .with_body("payload")
        .create();

    let mut diag = Diagnostics::new();
    let acquired = acquire(None, &config, platform(), &transport(), &mut diag).unwrap();

    assert_eq!(acquired.path(), config.global_binary);
    assert_eq!(fs::read_to_string(&config.version_file).unwrap(), "v2.0.0");
    assert_eq!(diag.warnings().len(), 1);
    assert!(diag.warnings()[0].contains("primary"));
}

#[test]
fn pinned_local_binary_is_never_updated() {
    let mut server = mockito::Server::new();
    let tmp = tempfile::tempdir().unwrap();
    let repo = tmp.path().join("repo");
    let local = repo.join("Tooling").join(ASSET);
    fs::create_dir_all(local.parent().unwrap()).unwrap();
    fs::write(&local, "pinned").unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&local, fs::Permissions::from_mode(0o755)).unwrap();
    }
    let config = config(&tmp.path().join("home"), &server);
    let feed = server.mock("GET", mockito::Matcher::Any).expect(0).create();

    let acquired =
        acquire(Some(&repo), &config, platform(), &transport(), &mut Diagnostics::new()).unwrap();

    assert_eq!(acquired, Acquired::Local(local));
    assert!(!config.global_binary.exists());
    assert!(!config.version_file.exists());
    feed.assert();
}

#[test]
fn download_failure_leaves_record_untouched() {
    let mut server = mockito::Server::new();
    let tmp = tempfile::tempdir().unwrap();
    let config = config(&tmp.path().join("home"), &server);
    fs::create_dir_all(config.version_file.parent().unwrap()).unwrap();
    fs::write(&config.version_file, "v1.0.0").unwrap();

    let _feed = server
        .mock("GET", "/forge/releases/latest")
        .with_status(200)
        .with_body(release_body(&server, "v1.1.0"))
        .create();
    let _download = server
        .mock("GET", format!("/dl/v1.1.0/{ASSET}").as_str())
        .with_status(500)
        .create();

    let err = acquire(None, &config, platform(), &transport(), &mut Diagnostics::new()).unwrap_err();

    assert!(matches!(err, AcquireError::Update(_)));
    assert_eq!(err.exit_code(), 3);
    assert_eq!(fs::read_to_string(&config.version_file).unwrap(), "v1.0.0");
    assert!(!config.global_binary.exists());
}

#[test]
fn corrupt_override_is_a_hard_error() {
    let server = mockito::Server::new();
    let tmp = tempfile::tempdir().unwrap();
    let repo = tmp.path().join("repo");
    fs::create_dir_all(repo.join("Tooling").join("sidestepper")).unwrap();
    let config = config(&tmp.path().join("home"), &server);

    let err = acquire(Some(&repo), &config, platform(), &transport(), &mut Diagnostics::new())
        .unwrap_err();

    assert!(matches!(err, AcquireError::Locate(_)));
    assert!(err.to_string().contains("is not a file"));
}
