use std::{
    fmt,
    fs::OpenOptions,
    io::{self, Write},
    path::Path,
};

/// Line-oriented sink for per-playout timings: `count, depth, nanoseconds`.
pub struct IterationLog {
    sink: Box<dyn Write + Send>,
}

impl IterationLog {
    pub fn new(sink: impl Write + Send + 'static) -> Self {
        IterationLog {
            sink: Box::new(sink),
        }
    }

    /// Append to the file at `path`, creating it if needed.
    pub fn to_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(IterationLog::new(io::BufWriter::new(file)))
    }

    pub fn record(&mut self, count: u64, depth: u64, nanos: u128) -> io::Result<()> {
        writeln!(self.sink, "{count}, {depth}, {nanos}")
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}

impl fmt::Debug for IterationLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterationLog").finish_non_exhaustive()
    }
}
