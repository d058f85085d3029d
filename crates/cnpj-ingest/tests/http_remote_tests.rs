//! Tests for the HTTP remote against a mock directory server

mod common;

use cnpj_ingest::error::IngestError;
use cnpj_ingest::remote::http::part_path;
use cnpj_ingest::remote::{HttpRemote, RemoteArtifact, RemoteSource};
use common::{zip_bytes, COMPANY_ROWS};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

const LISTING: &str = r#"<html><head><title>Index of /dados/2025-11</title></head><body>
<table>
<tr><td><a href="Empresas1.zip">Empresas1.zip</a></td><td>2025-11-09 10:31</td><td>48M</td></tr>
<tr><td><a href="Empresas0.zip">Empresas0.zip</a></td><td>2025-11-09 10:29</td><td>47M</td></tr>
<tr><td><a href="/dados/2025-11/Paises.ZIP">Paises.ZIP</a></td><td>2025-11-09 10:40</td><td>2.8K</td></tr>
<tr><td><a href="LEIAME.pdf">LEIAME.pdf</a></td><td>2025-11-09 10:40</td><td>120K</td></tr>
</table></body></html>"#;

fn remote_for(server: &MockServer) -> (HttpRemote, String) {
    let base_url = format!("{}/dados/2025-11/", server.uri());
    let remote = HttpRemote::new(&base_url, Duration::from_secs(5)).expect("Failed to build client");
    (remote, base_url)
}

#[tokio::test]
async fn test_list_archives_from_directory_index() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dados/2025-11/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LISTING))
        .mount(&server)
        .await;

    let (remote, base_url) = remote_for(&server);
    let artifacts = remote.list_archives().await.expect("listing failed");

    let names: Vec<_> = artifacts.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["Empresas0.zip", "Empresas1.zip", "Paises.ZIP"]);
    assert_eq!(artifacts[0].url, format!("{}Empresas0.zip", base_url));
}

#[tokio::test]
async fn test_listing_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dados/2025-11/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (remote, _) = remote_for(&server);
    let err = remote.list_archives().await.unwrap_err();

    assert!(matches!(err, IngestError::RemoteStatus { status: 503, .. }), "{}", err);
}

#[tokio::test]
async fn test_download_writes_archive() {
    let server = MockServer::start().await;
    let archive = zip_bytes(&[("K3241.K03200Y0.D50125.EMPRECSV", COMPANY_ROWS)]);
    Mock::given(method("GET"))
        .and(path("/dados/2025-11/EMPRESA1.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(archive.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let (remote, base_url) = remote_for(&server);
    let dir = TempDir::new().expect("tempdir");
    let dest = dir.path().join("EMPRESA1.zip");
    let artifact = RemoteArtifact::new(&base_url, "EMPRESA1.zip");

    let written = remote.download(&artifact, &dest).await.expect("download failed");

    assert_eq!(written, archive.len() as u64);
    assert_eq!(std::fs::read(&dest).expect("read"), archive);
    assert!(!part_path(&dest).exists());
}

#[tokio::test]
async fn test_failed_download_leaves_nothing_behind() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dados/2025-11/Socios9.zip"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (remote, base_url) = remote_for(&server);
    let dir = TempDir::new().expect("tempdir");
    let dest = dir.path().join("Socios9.zip");
    let artifact = RemoteArtifact::new(&base_url, "Socios9.zip");

    let err = remote.download(&artifact, &dest).await.unwrap_err();

    assert!(matches!(err, IngestError::RemoteStatus { status: 404, .. }), "{}", err);
    assert!(!dest.exists());
    assert!(!part_path(&dest).exists());
}

#[tokio::test]
async fn test_size_check_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/dados/2025-11/Empresas0.zip"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (remote, base_url) = remote_for(&server);
    let artifact = RemoteArtifact::new(&base_url, "Empresas0.zip");

    assert!(remote.probe_size(&artifact).await.is_err());
}

#[tokio::test]
async fn test_size_check_reads_content_length() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/dados/2025-11/Empresas0.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 1234]))
        .mount(&server)
        .await;

    let (remote, base_url) = remote_for(&server);
    let artifact = RemoteArtifact::new(&base_url, "Empresas0.zip");

    let size = remote.probe_size(&artifact).await.expect("size check failed");

    assert_eq!(size, Some(1234));
}

#[tokio::test]
async fn test_stalled_listing_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dados/2025-11/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LISTING).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let base_url = format!("{}/dados/2025-11/", server.uri());
    let remote = HttpRemote::new(&base_url, Duration::from_millis(300)).expect("Failed to build client");

    let err = remote.list_archives().await.unwrap_err();

    assert!(matches!(err, IngestError::Http(ref e) if e.is_timeout()), "{}", err);
}
