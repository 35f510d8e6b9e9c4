use super::*;

#[test]
fn parses_file_header() {
    let record = ControlRecord::parse(b"C0644 12 notes.txt").expect("file header");
    assert_eq!(
        record,
        ControlRecord::File {
            mode: 0o644,
            size: 12,
            name: "notes.txt".to_owned(),
        }
    );
}

#[test]
fn parses_directory_header_and_ignores_size() {
    let record = ControlRecord::parse(b"D0755 4096 photos").expect("directory header");
    assert_eq!(
        record,
        ControlRecord::Directory {
            mode: 0o755,
            name: "photos".to_owned(),
        }
    );
}

#[test]
fn names_may_contain_spaces() {
    let record = ControlRecord::parse(b"C0600 3 two words.txt").expect("file header");
    match record {
        ControlRecord::File { name, .. } => assert_eq!(name, "two words.txt"),
        other => panic!("unexpected record {other:?}"),
    }
}

#[test]
fn parses_end_directory_and_times() {
    assert_eq!(
        ControlRecord::parse(b"E").expect("end record"),
        ControlRecord::EndDirectory
    );
    assert_eq!(
        ControlRecord::parse(b"T1700000000 0 1700000100 0").expect("times record"),
        ControlRecord::Times {
            mtime: 1_700_000_000,
            atime: 1_700_000_100,
        }
    );
}

#[test]
fn rejects_names_that_escape_the_directory() {
    for line in [
        &b"C0644 1 ../passwd"[..],
        b"C0644 1 ..",
        b"D0755 0 .",
        b"C0644 1 ",
        b"D0755 0 a/b",
    ] {
        let error = ControlRecord::parse(line).expect_err("name must be rejected");
        assert!(matches!(error, ScpError::Protocol(_)), "{error}");
    }
}

#[test]
fn rejects_malformed_numbers() {
    assert!(ControlRecord::parse(b"C0844 1 a").is_err());
    assert!(ControlRecord::parse(b"C06440 1 a").is_err());
    assert!(ControlRecord::parse(b"C0644 -1 a").is_err());
    assert!(ControlRecord::parse(b"C0644 99999999999999999999999 a").is_err());
    assert!(ControlRecord::parse(b"C0644").is_err());
}

#[test]
fn rejects_unknown_tags_and_trailing_data() {
    assert!(ControlRecord::parse(b"X0644 1 a").is_err());
    assert!(ControlRecord::parse(b"E extra").is_err());
    assert!(ControlRecord::parse(b"").is_err());
}

#[test]
fn encodes_records_with_four_digit_modes() {
    let file = ControlRecord::File {
        mode: 0o100_644,
        size: 10,
        name: "f1".to_owned(),
    };
    assert_eq!(file.encode(), b"C0644 10 f1\n");

    let dir = ControlRecord::Directory {
        mode: 0o40_755,
        name: "sub".to_owned(),
    };
    assert_eq!(dir.encode(), b"D0755 0 sub\n");
    assert_eq!(ControlRecord::EndDirectory.encode(), b"E\n");
}

#[test]
fn encoded_file_header_parses_back() {
    let record = ControlRecord::File {
        mode: 0o4755,
        size: 123_456,
        name: "setuid tool".to_owned(),
    };
    let encoded = record.encode();
    let line = encoded.strip_suffix(b"\n").expect("newline terminated");
    assert_eq!(ControlRecord::parse(line).expect("reparse"), record);
}

#[test]
fn responses_frame_messages() {
    assert_eq!(Response::Ok.encode(), vec![0]);
    assert_eq!(
        Response::Warning("scp: x: No such file".to_owned()).encode(),
        b"\x01scp: x: No such file\n"
    );
    assert_eq!(
        Response::Error("line\nbreak".to_owned()).encode(),
        b"\x02linebreak\n"
    );
}

#[test]
fn response_into_result_marks_fatality() {
    assert!(Response::Ok.into_result().is_ok());
    match Response::Warning("careful".to_owned()).into_result() {
        Err(ScpError::Remote { fatal, message }) => {
            assert!(!fatal);
            assert_eq!(message, "careful");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(matches!(
        Response::Error("boom".to_owned()).into_result(),
        Err(ScpError::Remote { fatal: true, .. })
    ));
}

#[test]
fn quotes_remote_paths_for_the_shell() {
    assert_eq!(quote_remote_path("/srv/data"), "'/srv/data'");
    assert_eq!(quote_remote_path("it's here"), "'it'\\''s here'");
    assert_eq!(quote_remote_path(""), "''");
}

mod properties {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn arbitrary_lines_never_panic(line in proptest::collection::vec(any::<u8>(), 0..64)) {
            let _ = ControlRecord::parse(&line);
        }

        #[test]
        fn file_headers_survive_the_wire(
            mode in 0u32..=0o7777,
            size in any::<u64>(),
            name in "[A-Za-z0-9_][A-Za-z0-9 ._-]{0,24}",
        ) {
            let record = ControlRecord::File { mode, size, name };
            let encoded = record.encode();
            let line = encoded.strip_suffix(b"\n").expect("newline");
            prop_assert_eq!(ControlRecord::parse(line).expect("parse"), record);
        }
    }
}
