use std::io::Write;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};

use crate::config::Endpoint;
use crate::diagnostics::Diagnostics;

/// Network access needed by the update pipeline.
pub trait Transport {
    /// GET `url` and return the response body as text.
    fn get_text(&self, url: &str) -> Result<String, String>;

    /// GET `url` and stream the body into `out`, returning the number of bytes written.
    fn download(&self, url: &str, out: &mut dyn Write) -> Result<u64, String>;
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, String> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| format!("failed to build HTTP client: {e}"))?;
        Ok(Self { client })
    }

    fn send(&self, request: RequestBuilder, url: &str) -> Result<Response, String> {
        let resp = request
            .send()
            .map_err(|e| format!("request to {url} failed: {e}"))?;

        if !resp.status().is_success() {
            return Err(format!("{url} returned {}", resp.status()));
        }
        Ok(resp)
    }
}

impl Transport for HttpTransport {
    fn get_text(&self, url: &str) -> Result<String, String> {
        let request = self.client.get(url).header("Accept", "application/json");
        self.send(request, url)?
            .text()
            .map_err(|e| format!("failed to read response body: {e}"))
    }

    fn download(&self, url: &str, out: &mut dyn Write) -> Result<u64, String> {
        self.send(self.client.get(url), url)?
            .copy_to(out)
            .map_err(|e| format!("failed to read download body: {e}"))
    }
}

/// The newest release and where to fetch the asset for this platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    pub tag: String,
    pub asset_url: String,
}

/// Extract the release tag and the matching asset's download URL from a feed response.
///
/// Asset names are compared case-insensitively.
pub fn parse_release(body: &str, asset_name: &str) -> Result<ReleaseInfo, String> {
    let json: serde_json::Value =
        serde_json::from_str(body).map_err(|e| format!("failed to parse release JSON: {e}"))?;

    let tag = json["tag_name"]
        .as_str()
        .filter(|t| !t.is_empty())
        .ok_or("release has no tag_name")?;

    let assets = json["assets"]
        .as_array()
        .ok_or("release has no assets list")?;

    let asset_url = assets
        .iter()
        .filter(|a| {
            a["name"]
                .as_str()
                .is_some_and(|n| n.eq_ignore_ascii_case(asset_name))
        })
        .find_map(|a| a["browser_download_url"].as_str().filter(|u| !u.is_empty()))
        .ok_or_else(|| format!("release {tag} has no asset named {asset_name}"))?;

    Ok(ReleaseInfo {
        tag: tag.to_string(),
        asset_url: asset_url.to_string(),
    })
}

/// Query each endpoint once, in order, and return the first usable release.
///
/// Failed endpoints are recorded as warnings in `diag`.
pub fn fetch_release(
    transport: &dyn Transport,
    endpoints: &[Endpoint],
    asset_name: &str,
    diag: &mut Diagnostics,
) -> Result<ReleaseInfo, String> {
    for endpoint in endpoints {
        tracing::debug!("checking {} api endpoint {}", endpoint.name, endpoint.url);

        let result = transport
            .get_text(&endpoint.url)
            .and_then(|body| parse_release(&body, asset_name));

        match result {
            Ok(info) => {
                tracing::debug!("retrieval successful; using {} api endpoint", endpoint.name);
                diag.record("endpoint", endpoint.url.clone());
                diag.record("remote tag", info.tag.clone());
                return Ok(info);
            }
            Err(e) => diag.warn(format!(
                "could not fetch latest sidestepper release from {} api endpoint {} ({e})",
                endpoint.name, endpoint.url
            )),
        }
    }

    Err("could not fetch latest sidestepper release from any api endpoint".to_string())
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::significant_drop_tightening
)]
mod tests {
    use super::*;

    const ASSET: &str = "sidestepper-linux-x86_64";

    const RELEASE: &str = r#"{
        "tag_name": "v2.1.0",
        "assets": [
            {"name": "sidestepper-windows-x86_64.exe", "browser_download_url": "https://dl/win"},
            {"name": "Sidestepper-Linux-X86_64", "browser_download_url": "https://dl/linux"}
        ]
    }"#;

    fn transport() -> HttpTransport {
        HttpTransport::new("sidestep-test", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn parse_release_matches_case_insensitively() {
        let info = parse_release(RELEASE, ASSET).unwrap();
        assert_eq!(info.tag, "v2.1.0");
        assert_eq!(info.asset_url, "https://dl/linux");
    }

    #[test]
    fn parse_release_missing_asset() {
        let err = parse_release(RELEASE, "sidestepper-macos-aarch64").unwrap_err();
        assert!(err.contains("has no asset named sidestepper-macos-aarch64"));
    }

    #[test]
    fn parse_release_requires_name_match_not_substring() {
        let body = r#"{"tag_name": "v1", "assets": [
            {"name": "sidestepper-linux-x86_64.sha256", "browser_download_url": "https://dl/sum"}
        ]}"#;
        assert!(parse_release(body, ASSET).is_err());
    }

    #[test]
    fn parse_release_missing_tag() {
        let body = r#"{"assets": []}"#;
        assert!(parse_release(body, ASSET).unwrap_err().contains("no tag_name"));
        let body = r#"{"tag_name": "", "assets": []}"#;
        assert!(parse_release(body, ASSET).unwrap_err().contains("no tag_name"));
    }

    #[test]
    fn parse_release_skips_asset_without_url() {
        let body = r#"{"tag_name": "v1", "assets": [
            {"name": "sidestepper-linux-x86_64", "browser_download_url": ""}
        ]}"#;
        assert!(parse_release(body, ASSET).is_err());
    }

    #[test]
    fn parse_release_invalid_json() {
        let err = parse_release("<html>", ASSET).unwrap_err();
        assert!(err.contains("failed to parse release JSON"));
    }

    #[test]
    fn fetch_falls_back_to_secondary() {
        let mut server = mockito::Server::new();
        let primary = server
            .mock("GET", "/primary")
            .with_status(503)
            .create();
        let secondary = server
            .mock("GET", "/secondary")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(RELEASE)
            .create();

        let endpoints = [
            Endpoint::new("primary", format!("{}/primary", server.url())),
            Endpoint::new("secondary", format!("{}/secondary", server.url())),
        ];
        let mut diag = Diagnostics::new();
        let info = fetch_release(&transport(), &endpoints, ASSET, &mut diag).unwrap();

        assert_eq!(info.tag, "v2.1.0");
        assert_eq!(info.asset_url, "https://dl/linux");
        assert_eq!(diag.warnings().len(), 1);
        assert!(diag.warnings()[0].contains("primary api endpoint"));
        primary.assert();
        secondary.assert();
    }

    #[test]
    fn fetch_stops_at_first_success() {
        let mut server = mockito::Server::new();
        let primary = server
            .mock("GET", "/primary")
            .match_header("accept", "application/json")
            .with_status(200)
            .with_body(RELEASE)
            .create();
        let secondary = server.mock("GET", "/secondary").expect(0).create();

        let endpoints = [
            Endpoint::new("primary", format!("{}/primary", server.url())),
            Endpoint::new("secondary", format!("{}/secondary", server.url())),
        ];
        let mut diag = Diagnostics::new();
        fetch_release(&transport(), &endpoints, ASSET, &mut diag).unwrap();

        assert!(diag.warnings().is_empty());
        assert_eq!(diag.get("remote tag"), Some("v2.1.0"));
        primary.assert();
        secondary.assert();
    }

    #[test]
    fn fetch_skips_feed_without_matching_asset() {
        let mut server = mockito::Server::new();
        let _primary = server
            .mock("GET", "/primary")
            .with_status(200)
            .with_body(r#"{"tag_name": "v9.0.0", "assets": []}"#)
            .create();
        let _secondary = server
            .mock("GET", "/secondary")
            .with_status(200)
            .with_body("not-json")
            .create();

        let endpoints = [
            Endpoint::new("primary", format!("{}/primary", server.url())),
            Endpoint::new("secondary", format!("{}/secondary", server.url())),
        ];
        let mut diag = Diagnostics::new();
        let err = fetch_release(&transport(), &endpoints, ASSET, &mut diag).unwrap_err();

        assert!(err.contains("from any api endpoint"));
        assert_eq!(diag.warnings().len(), 2);
        assert!(diag.warnings()[0].contains("has no asset named"));
        assert!(diag.warnings()[1].contains("failed to parse release JSON"));
    }

    #[test]
    fn download_streams_body_without_json_accept() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/asset")
            .match_header("accept", "*/*")
            .with_status(200)
            .with_body("binary-bytes")
            .create();

        let mut out = Vec::new();
        let n = transport()
            .download(&format!("{}/asset", server.url()), &mut out)
            .unwrap();

        assert_eq!(n, 12);
        assert_eq!(out, b"binary-bytes");
        mock.assert();
    }

    #[test]
    fn download_rejects_error_status() {
        let mut server = mockito::Server::new();
        let _mock = server.mock("GET", "/asset").with_status(404).create();

        let mut out = Vec::new();
        let err = transport()
            .download(&format!("{}/asset", server.url()), &mut out)
            .unwrap_err();
        assert!(err.contains("404"));
        assert!(out.is_empty());
    }
}
