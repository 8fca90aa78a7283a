//! Loader contract: how an operation stream reaches a store.
//!
//! The generator never talks to a database. A [`BatchLoader`] feeds
//! operations to an [`OperationSink`] and commits every `batch_size`
//! operations plus once at the end.

use std::io::Write;

use anyhow::{anyhow, Context, Result};
use sha2::{Digest, Sha256};
use socialgraph_model::MutationOp;

/// Destination of a mutation stream.
pub trait OperationSink {
    fn apply(&mut self, op: &MutationOp) -> Result<()>;

    /// Make everything applied so far durable.
    fn commit(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub operations: usize,
    /// Entities plus relations created; attribute attachments excluded.
    pub instances: usize,
    pub commits: usize,
}

pub struct BatchLoader<S: OperationSink> {
    sink: S,
    batch_size: usize,
    pending: usize,
    report: LoadReport,
}

impl<S: OperationSink> BatchLoader<S> {
    pub fn new(sink: S, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(anyhow!("batch size must be > 0"));
        }
        Ok(Self {
            sink,
            batch_size,
            pending: 0,
            report: LoadReport::default(),
        })
    }

    pub fn load<'a, I>(&mut self, ops: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a MutationOp>,
    {
        for op in ops {
            if self.pending == self.batch_size {
                self.commit()?;
            }
            self.sink
                .apply(op)
                .with_context(|| format!("failed to apply operation {}", self.report.operations))?;
            self.pending += 1;
            self.report.operations += 1;
            if op.creates_instance() {
                self.report.instances += 1;
            }
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.sink.commit()?;
        self.pending = 0;
        self.report.commits += 1;
        tracing::debug!(
            commits = self.report.commits,
            operations = self.report.operations,
            "committed batch"
        );
        Ok(())
    }

    /// Commit the tail and hand back the sink.
    pub fn finish(mut self) -> Result<(S, LoadReport)> {
        self.commit()?;
        tracing::info!(
            operations = self.report.operations,
            instances = self.report.instances,
            commits = self.report.commits,
            "load complete"
        );
        Ok((self.sink, self.report))
    }
}

/// One JSON-serialised operation per line, hashed as it is written.
pub struct JsonLinesSink<W: Write> {
    writer: W,
    hasher: Sha256,
    lines: usize,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            hasher: Sha256::new(),
            lines: 0,
        }
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Hex SHA-256 of every byte written so far.
    pub fn digest(&self) -> String {
        self.hasher
            .clone()
            .finalize()
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OperationSink for JsonLinesSink<W> {
    fn apply(&mut self, op: &MutationOp) -> Result<()> {
        let mut line = serde_json::to_string(op)?;
        line.push('\n');
        self.writer.write_all(line.as_bytes())?;
        self.hasher.update(line.as_bytes());
        self.lines += 1;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use socialgraph_model::{EntityRef, Fields};

    #[derive(Default)]
    struct Recording {
        applied: usize,
        commits: Vec<usize>,
    }

    impl OperationSink for Recording {
        fn apply(&mut self, _op: &MutationOp) -> Result<()> {
            self.applied += 1;
            Ok(())
        }

        fn commit(&mut self) -> Result<()> {
            self.commits.push(self.applied);
            Ok(())
        }
    }

    fn ops(count: usize) -> Vec<MutationOp> {
        (0..count)
            .map(|i| MutationOp::entity("person", format!("p{i}"), Fields::new()))
            .collect()
    }

    #[test]
    fn commits_every_batch_and_at_the_end() {
        let mut loader = BatchLoader::new(Recording::default(), 50).unwrap();
        loader.load(&ops(120)).unwrap();
        let (sink, report) = loader.finish().unwrap();
        assert_eq!(sink.commits, [50, 100, 120]);
        assert_eq!(report.operations, 120);
        assert_eq!(report.commits, 3);
    }

    #[test]
    fn exact_multiple_does_not_commit_an_empty_batch_early() {
        let mut loader = BatchLoader::new(Recording::default(), 2).unwrap();
        loader.load(&ops(4)).unwrap();
        let (sink, _) = loader.finish().unwrap();
        assert_eq!(sink.commits, [2, 4]);
    }

    #[test]
    fn attachments_are_not_instances() {
        let mut stream = ops(2);
        stream.push(MutationOp::attach(
            EntityRef::new("person", "p0"),
            Fields::new().text("relationship-status", "single"),
        ));
        let mut loader = BatchLoader::new(Recording::default(), 10).unwrap();
        loader.load(&stream).unwrap();
        let (_, report) = loader.finish().unwrap();
        assert_eq!(report.operations, 3);
        assert_eq!(report.instances, 2);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        assert!(BatchLoader::new(Recording::default(), 0).is_err());
    }

    #[test]
    fn json_lines_digest_tracks_content() {
        let mut sink = JsonLinesSink::new(Vec::new());
        let empty = sink.digest();
        sink.apply(&ops(1)[0]).unwrap();
        assert_ne!(sink.digest(), empty);
        assert_eq!(sink.lines(), 1);

        let written = String::from_utf8(sink.into_inner()).unwrap();
        let parsed: MutationOp = serde_json::from_str(written.trim_end()).unwrap();
        assert_eq!(parsed, ops(1)[0]);
    }
}
