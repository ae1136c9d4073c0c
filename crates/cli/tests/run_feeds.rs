// Integration tests for the `carfeed` binary.
// Run with: cargo test -p carfeed-cli --test run_feeds

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use httpmock::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

/// Binary with an empty environment rooted in `dir`, so no real feeds,
/// settings or .env files leak into the run.
fn carfeed(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_carfeed"));
    cmd.current_dir(dir);
    cmd.env_clear();
    cmd.env("HOME", dir);
    cmd.env("XDG_CONFIG_HOME", dir.join("config"));
    cmd
}

fn read_doc(path: &Path) -> Value {
    let text = fs::read_to_string(path).expect("output file missing");
    serde_json::from_str(&text).expect("output is not JSON")
}

fn assert_exit(output: &Output, code: i32) {
    assert_eq!(
        output.status.code(),
        Some(code),
        "expected exit {}, got {:?}\nstderr: {}",
        code,
        output.status.code(),
        String::from_utf8_lossy(&output.stderr),
    );
}

#[test]
fn single_object_feed_plus_failing_feed() {
    let server = MockServer::start();
    let ok = server.mock(|when, then| {
        when.method(GET).path("/a.json");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"codigo": "A1", "marca": "Chevrolet", "modelo": "Onix LT", "valor": "R$ 72.490,00", "fotos": "http://img/1.jpg"}"#);
    });
    let broken = server.mock(|when, then| {
        when.method(GET).path("/b.json");
        then.status(500);
    });

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("vehicles.json");
    let output = carfeed(dir.path())
        .args(["--url", &server.url("/a.json"), "--url", &server.url("/b.json")])
        .arg("--out")
        .arg(&out)
        .output()
        .expect("failed to run carfeed");

    assert_exit(&output, 0);
    ok.assert();
    broken.assert();

    let doc = read_doc(&out);
    assert_eq!(doc["total_count"], 1);
    assert!(doc.get("error").is_none());
    let vehicle = &doc["vehicles"][0];
    assert_eq!(vehicle["id"], "A1");
    assert_eq!(vehicle["brand"], "Chevrolet");
    assert_eq!(vehicle["price"], 72490.0);
    assert_eq!(vehicle["category"], "Hatch");
    assert_eq!(vehicle["displacement"], 1.0);
    assert_eq!(vehicle["photos"], serde_json::json!(["http://img/1.jpg"]));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("HTTP 500"), "stderr: {}", stderr);
    assert!(stderr.contains("Done: 1 vehicles"), "stderr: {}", stderr);
}

#[test]
fn xml_feed_from_environment() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/estoque.xml");
        then.status(200).header("content-type", "text/xml; charset=utf-8").body(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <estoque>\
               <veiculo><codigo>10</codigo><modelo>Compass Longitude</modelo><preco>159900.50</preco></veiculo>\
               <veiculo><codigo>11</codigo><modelo>Strada Freedom</modelo>\
                 <fotos><foto>http://img/11a.jpg</foto><foto>http://img/11b.jpg</foto></fotos></veiculo>\
             </estoque>",
        );
    });

    let dir = TempDir::new().unwrap();
    let output = carfeed(dir.path())
        .env("XML_URL", server.url("/estoque.xml"))
        .env("JSON_FILE", "stock.json")
        .arg("--quiet")
        .output()
        .expect("failed to run carfeed");

    assert_exit(&output, 0);
    let doc = read_doc(&dir.path().join("stock.json"));
    assert_eq!(doc["total_count"], 2);
    assert_eq!(doc["vehicles"][0]["category"], "SUV");
    assert_eq!(doc["vehicles"][0]["price"], 159900.5);
    assert_eq!(doc["vehicles"][1]["category"], "Picape");
    assert_eq!(
        doc["vehicles"][1]["photos"],
        serde_json::json!(["http://img/11a.jpg", "http://img/11b.jpg"])
    );
    assert!(!String::from_utf8_lossy(&output.stderr).contains("Fetching"));
}

#[test]
fn no_sources_exits_60_and_writes_failed_document() {
    let dir = TempDir::new().unwrap();
    let output = carfeed(dir.path()).output().expect("failed to run carfeed");

    assert_exit(&output, 60);
    let doc = read_doc(&dir.path().join("vehicles.json"));
    assert_eq!(doc["vehicles"], serde_json::json!([]));
    assert_eq!(doc["total_count"], 0);
    assert!(doc["error"].as_str().unwrap().contains("no feed sources"));
    assert!(doc["generated_at"].as_str().unwrap().ends_with('Z'));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error: config error: no feed sources"), "stderr: {}", stderr);
    assert!(!stderr.contains("Done:"), "stderr: {}", stderr);
}

#[test]
fn invalid_settings_file_exits_61() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("carfeed.toml");
    fs::write(&config, "feeds = [\"http://x\"]\n").unwrap();

    let output = carfeed(dir.path())
        .arg("--config")
        .arg(&config)
        .output()
        .expect("failed to run carfeed");

    assert_exit(&output, 61);
    assert!(!dir.path().join("vehicles.json").exists());
}

#[test]
fn settings_file_sources_and_print() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/feed");
        then.status(200).body(r#"{"veiculos": [{"id": 1}, {"id": 2}, "junk"]}"#);
    });

    let dir = TempDir::new().unwrap();
    let config = dir.path().join("carfeed.toml");
    fs::write(
        &config,
        format!("sources = [\"{}\"]\noutput = \"out/feed.json\"\n", server.url("/feed")),
    )
    .unwrap();

    let output = carfeed(dir.path())
        .args(["--print", "--quiet"])
        .arg("--config")
        .arg(&config)
        .output()
        .expect("failed to run carfeed");

    assert_exit(&output, 0);
    let printed: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(printed["total_count"], 2);
    assert_eq!(printed, read_doc(&dir.path().join("out/feed.json")));
}

#[test]
fn unknown_flag_is_usage_error() {
    let dir = TempDir::new().unwrap();
    let output = carfeed(dir.path())
        .arg("--frobnicate")
        .output()
        .expect("failed to run carfeed");
    assert_exit(&output, 2);
}
