use crate::common::harness::BufferHarness;
use chunkpad::{Buffer, BufferConfig, BufferError};
use std::io::{self, Read};

#[test]
fn test_edit_save_reopen() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("notes.txt");
    let config = BufferConfig::with_chunks(16, 64);

    let mut harness = BufferHarness::from_buffer(Buffer::open_file(&path, &config).unwrap());
    assert!(!harness.buffer().is_dirty());
    harness.type_text("line one\nline two\n").unwrap();
    assert!(harness.buffer().is_dirty());

    let written = harness.buffer_mut().save().unwrap();
    assert_eq!(written, 18);
    assert!(!harness.buffer().is_dirty());

    let reopened = Buffer::open_file(&path, &config).unwrap();
    assert_eq!(reopened.contents(), b"line one\nline two\n");
    assert_eq!(reopened.line_count(), 3);
    assert_eq!(reopened.cursor_offset(), 0);
}

#[test]
fn test_persisted_form_is_raw_bytes() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("raw.bin");
    let content: Vec<u8> = (0u8..=255).chain(b"\r\n\r\n".iter().copied()).collect();
    std::fs::write(&path, &content).unwrap();

    let mut buffer = Buffer::open_file(&path, &BufferConfig::with_chunks(5, 128)).unwrap();
    assert_eq!(buffer.total_size(), content.len());
    assert!(buffer.chunk_sizes().iter().all(|&len| len == 5 || len == content.len() % 5));

    let copy = temp_dir.path().join("copy.bin");
    buffer.save_to_file(&copy).unwrap();
    assert_eq!(std::fs::read(&copy).unwrap(), content);
    assert_eq!(buffer.file_path(), Some(copy.as_path()));
}

#[test]
fn test_load_stops_when_pool_is_full() {
    let mut buffer = Buffer::new(&BufferConfig::with_chunks(4, 3)).unwrap();
    let err = buffer
        .load_from_reader(&b"0123456789abcdefghij"[..])
        .unwrap_err();
    assert!(err.is_out_of_memory());
    assert_eq!(buffer.contents(), b"0123456789ab");
    assert_eq!(buffer.cursor_offset(), 0);
    assert!(buffer.is_dirty());
}

struct FailingReader {
    sent: bool,
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.sent {
            return Err(io::Error::other("device gone"));
        }
        self.sent = true;
        buf[..3].copy_from_slice(b"abc");
        Ok(3)
    }
}

#[test]
fn test_load_reports_read_errors() {
    let mut buffer = Buffer::new(&BufferConfig::with_chunks(4, 8)).unwrap();
    let err = buffer
        .load_from_reader(FailingReader { sent: false })
        .unwrap_err();
    assert!(matches!(err, BufferError::Io(_)));
    assert_eq!(buffer.contents(), b"abc");
}

#[test]
fn test_load_replaces_previous_content() {
    let mut harness = BufferHarness::new(4, 16);
    harness.type_text("old text").unwrap();

    let loaded = harness
        .buffer_mut()
        .load_from_reader(&b"new"[..])
        .unwrap();
    assert_eq!(loaded, 3);
    assert_eq!(harness.text(), "new");
    assert_eq!(harness.cursor(), (0, 0, 0));
    harness.assert_valid();
}

#[test]
fn test_config_file_drives_buffer() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("buffer.json");
    std::fs::write(&config_path, r#"{"chunk_capacity": 4, "chunk_count": 8, "tab_stop": 4}"#).unwrap();

    let config = BufferConfig::load_from_file(&config_path).unwrap();
    let mut harness = BufferHarness::with_config(&config);
    harness.type_text("a\tb").unwrap();
    assert_eq!(harness.cursor(), (3, 0, 5));
    assert_eq!(harness.buffer().pool_stats().chunk_capacity, 4);
}
