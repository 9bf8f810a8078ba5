//! Workspace integration tests for the six numbered end-to-end scenarios in
//! spec.md §8, run through the real parser/classifier/store pipeline
//! `vantage-cli` wires together (no mocking of any component boundary).

use vantage_classify::ClassifierTables;
use vantage_parser::{predefined_format, tokenize, ParseOptions, PredefinedFormat};
use vantage_store::Store;
use vantage_types::{GeoRecord, Module};

struct UnknownGeo;
impl vantage_classify::GeoLookup for UnknownGeo {
    fn lookup(&self, _host: &str) -> GeoRecord {
        GeoRecord::unknown()
    }
}

fn ingest_line(store: &mut Store, line: &str) {
    let tokens = tokenize(predefined_format(PredefinedFormat::Combined)).unwrap();
    let opts = ParseOptions::default();
    let classifiers = ClassifierTables::default();
    let geo = UnknownGeo;

    let item = vantage_parser::parse_line(&tokens, line.as_bytes(), &opts).expect("line parses under COMBINED");
    store.ingest(&item, &classifiers, &geo);
}

/// Scenario 1: a single COMBINED-format line populates VISITORS, REQUESTS,
/// HOSTS, and BROWSERS exactly as spec.md §8 enumerates.
#[test]
fn scenario_one_single_line_populates_expected_modules() {
    let mut store = Store::new();
    ingest_line(
        &mut store,
        r#"127.0.0.1 - - [10/Jan/2015:12:34:56 +0000] "GET /x HTTP/1.1" 200 42 "-" "curl/7.0""#,
    );

    let visitors = &store.module(Module::Visitors).unwrap()["20150110"];
    assert_eq!(visitors.hits, 1);
    assert_eq!(visitors.visitors, 1);
    assert_eq!(visitors.bandwidth, 42);

    let requests = &store.module(Module::Requests).unwrap()["/x"];
    assert_eq!(requests.hits, 1);
    assert_eq!(requests.method.as_deref(), Some("GET"));
    assert_eq!(requests.protocol.as_deref(), Some("HTTP/1.1"));

    let hosts = &store.module(Module::Hosts).unwrap()["127.0.0.1"];
    assert_eq!(hosts.hits, 1);
    assert_eq!(hosts.bandwidth, 42);

    let browsers = store.module(Module::Browsers).unwrap();
    let others = &browsers["Others"];
    assert_eq!(others.hits, 1);
    assert!(others.sub_items.iter().any(|s| s.data == "curl"));
}

/// Scenario 2: the same line twice bumps hits but not unique visitors.
#[test]
fn scenario_two_repeat_line_bumps_hits_not_visitors() {
    let mut store = Store::new();
    let line = r#"127.0.0.1 - - [10/Jan/2015:12:34:56 +0000] "GET /x HTTP/1.1" 200 42 "-" "curl/7.0""#;
    ingest_line(&mut store, line);
    ingest_line(&mut store, line);

    let visitors = &store.module(Module::Visitors).unwrap()["20150110"];
    assert_eq!(visitors.hits, 2);
    assert_eq!(visitors.visitors, 1);

    let hosts = &store.module(Module::Hosts).unwrap()["127.0.0.1"];
    assert_eq!(hosts.hits, 2);
}

/// Scenario 3: a 404 populates NOT_FOUND and leaves REQUESTS untouched.
#[test]
fn scenario_three_404_goes_to_not_found() {
    let mut store = Store::new();
    ingest_line(
        &mut store,
        r#"127.0.0.1 - - [10/Jan/2015:12:34:56 +0000] "GET /x HTTP/1.1" 404 42 "-" "curl/7.0""#,
    );

    assert!(store.module(Module::NotFound).unwrap().contains_key("/x"));
    assert!(store.module(Module::Requests).is_none());
}

/// Scenario 4: a static-extension URL with a 200 goes to REQUESTS_STATIC,
/// not REQUESTS.
#[test]
fn scenario_four_static_extension_goes_to_requests_static() {
    let mut store = Store::new();
    ingest_line(
        &mut store,
        r#"127.0.0.1 - - [10/Jan/2015:12:34:56 +0000] "GET /img.png HTTP/1.1" 200 42 "-" "curl/7.0""#,
    );

    assert!(store.module(Module::RequestsStatic).unwrap().contains_key("/img.png"));
    assert!(store.module(Module::Requests).is_none());
}

/// Scenario 5: a Google search referrer populates KEYPHRASES and
/// REFERRING_SITES.
#[test]
fn scenario_five_google_referrer_populates_keyphrases_and_referring_sites() {
    let mut store = Store::new();
    ingest_line(
        &mut store,
        r#"127.0.0.1 - - [10/Jan/2015:12:34:56 +0000] "GET /x HTTP/1.1" 200 42 "https://www.google.com/search?q=hello+world" "curl/7.0""#,
    );

    let keyphrases = &store.module(Module::Keyphrases).unwrap()["hello world"];
    assert_eq!(keyphrases.hits, 1);

    let sites = &store.module(Module::ReferringSites).unwrap()["https://www.google.com"];
    assert_eq!(sites.hits, 1);
}

/// Scenario 6 (WS handshake/frame reassembly) lives in `vantage-ws`'s own
/// `handshake.rs`/`frame.rs` unit tests, which assert the exact RFC 6455
/// test vector and masked-frame reassembly named in spec.md §8.

/// Monotonicity + visitor-bound property (spec §8): across a stream of
/// distinct visitors hitting the same URL, hits and visitors both only grow,
/// and visitors never exceeds hits.
#[test]
fn hits_and_visitors_are_monotonic_and_bounded() {
    let mut store = Store::new();
    let mut last_hits = 0;
    let mut last_visitors = 0;

    for i in 0..5 {
        let line = format!(
            r#"127.0.0.1 - - [10/Jan/2015:12:34:56 +0000] "GET /x HTTP/1.1" 200 10 "-" "curl/7.{i}""#
        );
        ingest_line(&mut store, &line);

        let record = &store.module(Module::Requests).unwrap()["/x"];
        assert!(record.hits >= last_hits);
        assert!(record.visitors >= last_visitors);
        assert!(record.visitors <= record.hits);
        last_hits = record.hits;
        last_visitors = record.visitors;
    }

    assert_eq!(last_hits, 5);
    assert_eq!(last_visitors, 5);
}
