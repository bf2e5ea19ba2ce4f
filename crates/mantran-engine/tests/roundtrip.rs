//! End-to-end tests: whole pages through extract and inject, plus the
//! round-trip properties of the transform pipeline.

use std::collections::HashMap;

use mantran_engine::{ExtractCatalog, MapCatalog, Options, ParseError, Parser};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("reading {path}: {e}"))
}

fn extract(input: &str) -> ExtractCatalog {
    let mut catalog = ExtractCatalog::new();
    let mut parser = Parser::new(Options::default());
    parser
        .process_str("test.1", input, &mut catalog)
        .expect("parse failure");
    catalog
}

#[test]
fn fixture_simple_page_reproduces_itself() {
    let cat = extract(&fixture("simple.man"));
    assert_eq!(cat.output, fixture("simple.expected.man"));
}

#[test]
fn fixture_simple_page_extracts_the_expected_units() {
    let cat = extract(&fixture("simple.man"));
    assert_eq!(
        cat.msgids(),
        vec![
            "FOO",
            "March 2024",
            "foo 1.0",
            "User Commands",
            "NAME",
            "foo - frobnicate the bar",
            "DESCRIPTION",
            "The\nB<foo>\ncommand frobnicates the bar library.",
            "B<-v>",
            "Increase verbosity.",
            "See the files foo.conf and\nI<bar.conf>\nfor details.",
        ]
    );
}

#[test]
fn fixture_verbatim_region_passes_through_unwrapped() {
    let cat = extract(&fixture("verbatim.man"));
    assert!(cat.output.contains(".nf\nkey = value\n# comment lines stay put\n.fi\n"));
    let block = cat
        .units
        .iter()
        .find(|u| u.msgid.starts_with("key = value"))
        .unwrap();
    assert!(!block.wrap);
    let tail = cat
        .units
        .iter()
        .find(|u| u.msgid == "Back to flowing text.")
        .unwrap();
    assert!(tail.wrap);
}

#[rstest]
#[case::bold(".B hello world\n", "B<hello world>", "\\fBhello world\\fR\n")]
#[case::alternating(
    ".BI foo bar baz\n",
    "B<foo>I<bar>B<baz>",
    "\\fBfoo\\fR\\fIbar\\fR\\fBbaz\\fR\n"
)]
#[case::angle_brackets("a < b > c\n", "a E<lt> b E<gt> c", "a < b > c\n")]
#[case::hyphens("use \\-\\-force here\n", "use --force here", "use \\-\\-force here\n")]
#[case::quotes("\\*(lqquote\\*(rq\n", "``quote''", "\\*(lqquote\\*(rq\n")]
fn extraction_and_identity_injection(
    #[case] input: &str,
    #[case] msgid: &str,
    #[case] output: &str,
) {
    let cat = extract(input);
    assert_eq!(cat.msgids(), vec![msgid]);
    assert_eq!(cat.output, output);
}

#[test]
fn translated_injection_rewrites_the_page() {
    let mut entries = HashMap::new();
    entries.insert("B<hello world>".to_string(), "B<bonjour monde>".to_string());
    let mut catalog = MapCatalog::new(entries);
    let mut parser = Parser::new(Options::default());
    parser
        .process_str("hello.1", ".B hello world\n", &mut catalog)
        .unwrap();
    assert_eq!(catalog.output, "\\fBbonjour monde\\fR\n");
}

#[test]
fn translation_starting_with_a_dot_is_guarded() {
    let mut entries = HashMap::new();
    entries.insert("see below".to_string(), ".config is the file".to_string());
    let mut catalog = MapCatalog::new(entries);
    let mut parser = Parser::new(Options::default());
    parser
        .process_str("t.1", "see below\n", &mut catalog)
        .unwrap();
    assert_eq!(catalog.output, "\\&.config is the file\n");
}

#[test]
fn unbalanced_translation_markup_is_rejected() {
    let mut entries = HashMap::new();
    entries.insert("B<hello world>".to_string(), "B<oops".to_string());
    let mut catalog = MapCatalog::new(entries);
    let mut parser = Parser::new(Options::default());
    let err = parser
        .process_str("t.1", ".B hello world\n", &mut catalog)
        .unwrap_err();
    assert!(matches!(err, ParseError::UnbalancedMarkup { .. }));
}

#[test]
fn generated_pod_man_page_maps_to_exit_254() {
    let mut catalog = ExtractCatalog::new();
    let mut parser = Parser::new(Options::default());
    let err = parser
        .process_str(
            "gen.1",
            ".\\\" Automatically generated by Pod::Man 4.14 (Pod::Simple 3.43)\n",
            &mut catalog,
        )
        .unwrap_err();
    assert!(matches!(err, ParseError::GeneratedFile { .. }));
    assert_eq!(err.exit_code(), 254);
}

#[test]
fn so_inclusion_stops_the_document() {
    let mut catalog = ExtractCatalog::new();
    let mut parser = Parser::new(Options::default());
    let err = parser
        .process_str("t.1", "intro text\n\n.so man7/other.7\n", &mut catalog)
        .unwrap_err();
    assert!(matches!(err, ParseError::Inclusion { .. }));
    // Lines flushed before the failure stay flushed, nothing more.
    assert_eq!(catalog.output, "intro text\n\n");
}

/// The emitted text always ends any font excursion back at the regular
/// font, with no two consecutive identical selectors.
#[test]
fn font_events_collapse_and_close() {
    let cat = extract(".B a\n.B b\n\\fB\\fBdouble\\fR\n");
    let events: Vec<&str> = cat
        .output
        .match_indices("\\f")
        .map(|(i, _)| &cat.output[i + 2..i + 3])
        .collect();
    assert!(!events.is_empty());
    assert_eq!(*events.last().unwrap(), "R");
    for pair in events.windows(2) {
        assert_ne!(pair[0], pair[1], "consecutive identical font selectors");
    }
}

/// Every surface-form unit balances its markup brackets.
#[test]
fn extracted_units_balance_their_brackets() {
    let cat = extract(&fixture("simple.man"));
    for unit in &cat.units {
        let mut depth = 0i32;
        for c in unit.msgid.chars() {
            match c {
                '<' => depth += 1,
                '>' => depth -= 1,
                _ => {}
            }
            assert!(depth >= 0, "stray '>' in {:?}", unit.msgid);
        }
        assert_eq!(depth, 0, "unbalanced '<' in {:?}", unit.msgid);
    }
}
