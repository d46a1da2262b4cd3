//! End-to-end extraction behaviour against scripted transports.

use jsonlink_core::{BraceMatching, FrameKind};
use jsonlink_serial::{ExtractorConfig, FrameExtractor, MockTransport, Op};

const WIFI_REQUEST: &str = r#"{"T":65}"#;

fn extractor() -> FrameExtractor {
    FrameExtractor::new(ExtractorConfig::default())
}

#[test]
fn single_response_frame_is_returned_unchanged() {
    let frame = r#"{"T":74,"MAC":"de:ad:be:ef:00:01"}"#;
    let mut port = MockTransport::repeating(frame);

    let got = extractor().extract(&mut port, r#"{"T":74}"#, FrameKind::Response).unwrap();

    assert_eq!(got.as_deref(), Some(frame));
    assert_eq!(port.writes(), &[br#"{"T":74}"#.to_vec()]);
}

#[test]
fn heartbeat_request_ignores_response_frames_until_exhausted() {
    let mut port = MockTransport::repeating(r#"{"T":74,"MAC":"aa"}"#);

    let got = extractor().extract(&mut port, "", FrameKind::Heartbeat).unwrap();

    assert_eq!(got, None);
    assert_eq!(port.reads(), 3);
}

#[test]
fn kind_selection_is_independent_of_frame_order() {
    let heartbeat = r#"{"pa":12}"#;
    let response = r#"{"T":70,"load_V":12.1}"#;

    for chunk in [format!("{heartbeat}{response}"), format!("{response}{heartbeat}")] {
        let mut port = MockTransport::repeating(chunk.clone());
        assert_eq!(
            extractor().extract(&mut port, r#"{"T":70}"#, FrameKind::Response).unwrap().as_deref(),
            Some(response),
            "chunk {chunk}"
        );

        let mut port = MockTransport::repeating(chunk.clone());
        assert_eq!(
            extractor().extract(&mut port, "", FrameKind::Heartbeat).unwrap().as_deref(),
            Some(heartbeat),
            "chunk {chunk}"
        );
    }
}

#[test]
fn frameless_chunks_consume_one_retry_each() {
    for chunk in ["", "garbage with no braces", "}{"] {
        let mut port = MockTransport::repeating(chunk);

        let got = extractor().extract(&mut port, WIFI_REQUEST, FrameKind::Response).unwrap();

        assert_eq!(got, None, "chunk {chunk:?}");
        assert_eq!(port.flushes(), 3);
        assert_eq!(port.writes().len(), 3);
        assert_eq!(port.reads(), 3);
    }
}

#[test]
fn each_attempt_flushes_before_writing_and_reading() {
    let mut port = MockTransport::new();

    extractor().extract(&mut port, WIFI_REQUEST, FrameKind::Response).unwrap();

    let attempt = [Op::Flush, Op::Write, Op::Read];
    assert_eq!(port.ops(), attempt.repeat(3).as_slice());
}

#[test]
fn listen_only_attempts_flush_then_read() {
    let mut port = MockTransport::new();

    extractor().heartbeat(&mut port).unwrap();

    let attempt = [Op::Flush, Op::Read];
    assert_eq!(port.ops(), attempt.repeat(3).as_slice());
}

#[test]
fn matched_attempt_stops_after_its_read() {
    let mut port = MockTransport::new()
        .with_chunk(r#"{"pa":1}"#)
        .with_chunk(r#"{"T":65,"AP_NAME":"x"}"#);

    extractor().extract(&mut port, WIFI_REQUEST, FrameKind::Response).unwrap();

    assert_eq!(
        port.ops(),
        &[Op::Flush, Op::Write, Op::Read, Op::Flush, Op::Write, Op::Read]
    );
}

#[test]
fn empty_reads_for_every_retry_return_nothing() {
    let mut port = MockTransport::new();

    assert_eq!(extractor().extract(&mut port, WIFI_REQUEST, FrameKind::Response).unwrap(), None);
    assert_eq!(port.flushes(), 3);
    assert_eq!(port.writes().len(), 3);
}

#[test]
fn retry_budget_follows_configuration() {
    let extractor = FrameExtractor::new(ExtractorConfig {
        max_retries: 5,
        ..ExtractorConfig::default()
    });
    let mut port = MockTransport::new();

    assert_eq!(extractor.extract(&mut port, WIFI_REQUEST, FrameKind::Response).unwrap(), None);
    assert_eq!(port.flushes(), 5);
    assert_eq!(port.writes().len(), 5);
}

#[test]
fn listen_only_never_writes() {
    let mut port = MockTransport::new().with_chunk("").with_chunk(r#"{"pa":3,"v":1}"#);

    let got = extractor().heartbeat(&mut port).unwrap();

    assert_eq!(got.as_deref(), Some(r#"{"pa":3,"v":1}"#));
    assert!(port.writes().is_empty());
    assert_eq!(port.flushes(), 2);
}

#[test]
fn heartbeat_only_chunk_is_retried_for_a_response() {
    let mut port = MockTransport::new()
        .with_chunk(r#"{"pa":1}{"pa":2}"#)
        .with_chunk(r#"{"pa":3}{"T":71,"temp":31.5}"#);

    let got = extractor().extract(&mut port, r#"{"T":71}"#, FrameKind::Response).unwrap();

    assert_eq!(got.as_deref(), Some(r#"{"T":71,"temp":31.5}"#));
    assert_eq!(port.reads(), 2);
}

#[test]
fn noisy_chunk_yields_the_response_frame() {
    let mut port = MockTransport::repeating(r#"foo{"pa":1}bar{"T":65,"AP_NAME":"x"}baz"#);

    let got = extractor().extract(&mut port, WIFI_REQUEST, FrameKind::Response).unwrap();

    assert_eq!(got.as_deref(), Some(r#"{"T":65,"AP_NAME":"x"}"#));
}

#[test]
fn nested_object_is_cut_at_first_closing_brace() {
    let mut port = MockTransport::repeating(r#"{"a":{"b":1}}"#);

    let got = extractor().extract(&mut port, WIFI_REQUEST, FrameKind::Response).unwrap();

    assert_eq!(got.as_deref(), Some(r#"{"a":{"b":1}"#));
}

#[test]
fn balanced_matching_returns_nested_object_whole() {
    let extractor = FrameExtractor::new(ExtractorConfig {
        brace_matching: BraceMatching::Balanced,
        ..ExtractorConfig::default()
    });
    let mut port = MockTransport::repeating(r#"{"a":{"b":1}}"#);

    let got = extractor.extract(&mut port, WIFI_REQUEST, FrameKind::Response).unwrap();

    assert_eq!(got.as_deref(), Some(r#"{"a":{"b":1}}"#));
}

#[test]
fn repeated_calls_on_same_chunk_agree() {
    let chunk = r#"xx{"pa":9}{"T":70,"shunt_mV":0.4}{"T":70}"#;
    let mut port = MockTransport::repeating(chunk);
    let extractor = extractor();

    let first = extractor.extract(&mut port, r#"{"T":70}"#, FrameKind::Response).unwrap();
    for _ in 0..4 {
        assert_eq!(extractor.extract(&mut port, r#"{"T":70}"#, FrameKind::Response).unwrap(), first);
    }
    assert_eq!(first.as_deref(), Some(r#"{"T":70,"shunt_mV":0.4}"#));
}

#[test]
fn returned_frame_is_a_contiguous_slice_of_the_chunk() {
    let chunk = b"\x00\xfe{\"T\":71, \"temp\" : 30}\r\n{\"pa\":1}".to_vec();
    let mut port = MockTransport::repeating(chunk.clone());

    let frame = extractor()
        .extract(&mut port, r#"{"T":71}"#, FrameKind::Response)
        .unwrap()
        .expect("frame");

    let raw: Vec<u8> = frame.chars().map(|c| c as u8).collect();
    assert!(chunk.windows(raw.len()).any(|w| w == raw.as_slice()));
    assert_eq!(frame, r#"{"T":71, "temp" : 30}"#);
}

#[test]
fn oversized_chunk_is_truncated_to_the_read_limit() {
    let extractor = FrameExtractor::new(ExtractorConfig {
        max_chunk_bytes: 8,
        ..ExtractorConfig::default()
    });
    let mut port = MockTransport::repeating(r#"{"T":74,"MAC":"aa"}"#);

    // Each attempt sees only the first 8 bytes and the rest is flushed.
    assert_eq!(extractor.extract(&mut port, "", FrameKind::Response).unwrap(), None);
    assert_eq!(port.reads(), 3);
}
