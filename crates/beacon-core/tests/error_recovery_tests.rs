//! Error recovery tests
//!
//! Every condition met while scanning a stream is recorded and skipped;
//! nothing short of direct API misuse aborts a pass.

use beacon_core::{BeaconReader, RecordedErrorKind};

#[test]
fn test_malformed_header_line_is_skipped() {
    let mut reader = BeaconReader::new("#COUNT: nope\n#NAME: kept\nid:1\n");
    assert!(!reader.parse());
    assert_eq!(reader.error_count(), 1);
    // scanning continued past the bad line
    assert_eq!(reader.meta().get("NAME"), Some("kept"));
    assert_eq!(reader.count(), 1);
}

#[test]
fn test_bad_header_name_is_recorded_not_raised() {
    let mut reader = BeaconReader::new("#~bad~: value\nid:1\n");
    assert!(!reader.parse());
    let err = reader.last_error().unwrap();
    assert_eq!(err.kind, RecordedErrorKind::Validation);
    assert_eq!(err.line, 1);
    assert_eq!(err.raw, "#~bad~: value");
    assert_eq!(reader.count(), 1);
}

#[test]
fn test_header_line_without_colon() {
    let mut reader = BeaconReader::new("#justacomment\nid:1\n");
    assert!(!reader.parse());
    assert_eq!(reader.error_count(), 1);
    assert_eq!(reader.count(), 1);
}

#[test]
fn test_too_many_parts_then_valid_line() {
    let mut reader = BeaconReader::new("a|b|c|d:e|f\nid:1\n");
    assert!(!reader.parse());
    assert_eq!(reader.error_count(), 1);
    // the malformed line was skipped, not fatal
    assert_eq!(reader.count(), 1);
    assert_eq!(reader.last_link().unwrap().id, "id:1");

    let err = reader.last_error().unwrap();
    assert_eq!(
        err.message,
        "found too many parts (>4), divided by '|' characters"
    );
    assert_eq!(err.line, 1);
    assert_eq!(err.raw, "a|b|c|d:e|f");
}

#[test]
fn test_invalid_fourth_field_is_skipped() {
    let mut reader = BeaconReader::new("qid|lab|dsc|abc\nid:1\n");
    assert!(!reader.parse());
    assert_eq!(reader.last_error().unwrap().message, "URI part has not valid URI form");
    assert_eq!(reader.count(), 1);
}

#[test]
fn test_non_uri_id_is_skipped() {
    let mut reader = BeaconReader::new("justaword\nid:1\n");
    assert!(!reader.parse());
    let err = reader.last_error().unwrap();
    assert_eq!(err.message, "link id must be URI");
    assert_eq!(err.kind, RecordedErrorKind::Parse);
    assert_eq!(reader.count(), 1);
}

#[test]
fn test_prefix_makes_bare_ids_valid() {
    // the same bare id that fails alone passes once PREFIX expansion applies
    let mut reader = BeaconReader::new("#PREFIX: http://example.org/\njustaword\n");
    assert!(reader.parse());
    assert_eq!(
        reader.last_link().unwrap().full_id,
        "http://example.org/justaword"
    );
}

#[test]
fn test_blank_and_comment_lines_are_not_errors() {
    let mut reader = BeaconReader::new("\n   \n|ignored\n#also: ignored\nid:1\n\n");
    assert!(reader.parse());
    assert_eq!(reader.error_count(), 0);
    assert_eq!(reader.count(), 1);
    assert_eq!(reader.line(), 6);
}

#[test]
fn test_errors_accumulate_across_lines() {
    let mut reader = BeaconReader::new("bad one\nid:1\nbad two\nid:2\n");
    assert!(!reader.parse());
    assert_eq!(reader.error_count(), 2);
    assert_eq!(reader.count(), 2);
    // last error points at the later bad line
    assert_eq!(reader.last_error().unwrap().line, 3);
    assert_eq!(reader.last_error().unwrap().raw, "bad two");
}

#[test]
fn test_both_deferred_checks_can_fire() {
    let mut reader = BeaconReader::new("#COUNT: 2\n#EXAMPLES: missing:one\nid:1\n");
    assert!(!reader.parse());
    assert_eq!(reader.error_count(), 2);
    // examples check runs after the count check
    assert_eq!(
        reader.last_error().unwrap().message,
        "examples not found: missing:one"
    );
}

#[test]
fn test_deferred_error_line_is_end_of_stream() {
    let mut reader = BeaconReader::new("#COUNT: 3\nid:1\nid:2\n");
    assert!(!reader.parse());
    let err = reader.last_error().unwrap();
    assert_eq!(err.message, "expected 3 links, but got 2");
    assert_eq!(err.line, 3);
    assert_eq!(err.raw, "");
}
