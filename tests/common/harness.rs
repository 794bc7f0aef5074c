use chunkpad::{Buffer, BufferConfig, BufferError, Direction};
use tracing_subscriber::EnvFilter;

/// Install a test subscriber once; `RUST_LOG=trace` shows chunk activity
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Drives a buffer the way a key loop would
pub struct BufferHarness {
    buffer: Buffer,
}

impl BufferHarness {
    /// Harness over a fresh buffer with `chunk_count` chunks of `chunk_capacity` bytes
    pub fn new(chunk_capacity: usize, chunk_count: usize) -> Self {
        Self::with_config(&BufferConfig::with_chunks(chunk_capacity, chunk_count))
    }

    pub fn with_config(config: &BufferConfig) -> Self {
        init_tracing();
        Self {
            buffer: Buffer::new(config).unwrap(),
        }
    }

    pub fn from_buffer(buffer: Buffer) -> Self {
        init_tracing();
        Self { buffer }
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut Buffer {
        &mut self.buffer
    }

    pub fn type_text(&mut self, text: &str) -> Result<(), BufferError> {
        self.buffer.insert_bytes(text.as_bytes())
    }

    pub fn press(&mut self, direction: Direction) {
        self.buffer.move_cursor(direction);
    }

    pub fn press_n(&mut self, direction: Direction, times: usize) {
        for _ in 0..times {
            self.press(direction);
        }
    }

    pub fn backspace(&mut self, times: usize) {
        for _ in 0..times {
            self.buffer.delete_before_cursor();
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.buffer.contents()).unwrap()
    }

    /// (offset, line, column) of the cursor
    pub fn cursor(&self) -> (usize, usize, usize) {
        (
            self.buffer.cursor_offset(),
            self.buffer.cursor_line(),
            self.buffer.cursor_column(),
        )
    }

    /// Scroll to the cursor and render the visible window, one row per line
    pub fn screen(&mut self) -> String {
        self.buffer.scroll();
        let left = self.buffer.viewport().left_column;
        let width = self.buffer.viewport().width;
        let rows: Vec<String> = self
            .buffer
            .visible_lines()
            .into_iter()
            .map(|range| {
                let line = self.buffer.display_text(range).unwrap();
                line.chars().skip(left).take(width).collect()
            })
            .collect();
        rows.join("\n")
    }

    pub fn assert_valid(&self) {
        if let Err(e) = self.buffer.validate() {
            panic!("buffer invariants broken: {}\n{:?}", e, self.buffer);
        }
    }
}
