use crate::config::{ByteRange, GeneratorConfig};
use crate::profile::{LatencyBand, LatencyProfileTable};
use crate::record::JtlRecord;
use anyhow::Result;
use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::debug;

/// Shape of a simulated run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunParams {
    /// Target run length; the end time is `start + duration_secs`
    pub duration_secs: i64,
    pub label_count: usize,
    pub thread_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub name: String,
    pub latency_range: LatencyBand,
}

/// Simulated clock and label rotation for one virtual user.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadState {
    pub thread_index: usize,
    /// Epoch seconds
    pub clock: f64,
    pub label_cursor: usize,
    pub finished: bool,
}

impl ThreadState {
    fn new(thread_index: usize, start_time: f64) -> Self {
        Self {
            thread_index,
            clock: start_time,
            label_cursor: 0,
            finished: false,
        }
    }

    pub fn name(&self) -> String {
        format!("Thread-{}", self.thread_index)
    }
}

/// Round-robin record generator.
///
/// Each call to `next` advances exactly one unfinished thread: its clock
/// moves forward by a latency sampled from its current label's band plus up
/// to one second of jitter, and the record is stamped with the advanced
/// clock. Threads are visited in index order, one record per thread per pass,
/// and a thread stops once its clock is past the end time. Output is ordered
/// per thread, not globally.
pub struct RecordGenerator<R: Rng> {
    labels: Vec<Label>,
    threads: Vec<ThreadState>,
    start_time: f64,
    end_time: f64,
    next_thread: usize,
    unfinished: usize,
    bytes: ByteRange,
    sent_bytes: ByteRange,
    rng: R,
}

impl<R: Rng> RecordGenerator<R> {
    pub fn new(
        params: RunParams,
        config: &GeneratorConfig,
        start: DateTime<Utc>,
        mut rng: R,
    ) -> Result<Self> {
        if params.label_count == 0 && params.thread_count > 0 {
            anyhow::bail!("label_count must be at least 1 when thread_count > 0");
        }
        config.validate()?;

        let table = LatencyProfileTable::from_config(&config.profile)?;
        let labels: Vec<Label> = (0..params.label_count)
            .map(|i| Label {
                name: format!("label{}", i),
                latency_range: table.sample_range(&mut rng),
            })
            .collect();

        let start_time = start.timestamp_micros() as f64 / 1_000_000.0;
        let end_time = start_time + params.duration_secs as f64;
        let threads = (0..params.thread_count)
            .map(|i| ThreadState::new(i, start_time))
            .collect();

        Ok(Self {
            labels,
            threads,
            start_time,
            end_time,
            next_thread: 0,
            unfinished: params.thread_count,
            bytes: config.bytes,
            sent_bytes: config.sent_bytes,
            rng,
        })
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn threads(&self) -> &[ThreadState] {
        &self.threads
    }

    pub fn start_time_ms(&self) -> i64 {
        (self.start_time * 1000.0).round() as i64
    }

    pub fn end_time_ms(&self) -> i64 {
        (self.end_time * 1000.0).round() as i64
    }

    pub fn is_finished(&self) -> bool {
        self.unfinished == 0
    }

    fn emit(&mut self, idx: usize) -> JtlRecord {
        let all_threads = self.threads.len() as u64;
        let thread = &mut self.threads[idx];
        let label = &self.labels[thread.label_cursor];

        // Band sample plus up to a second of uniform jitter; both terms shape the output.
        let latency_secs = label.latency_range.sample(&mut self.rng) + self.rng.gen::<f64>();
        let elapsed = (latency_secs * 1000.0).round() as u64;
        thread.clock += latency_secs;

        let record = JtlRecord::success(
            (thread.clock * 1000.0).round() as i64,
            elapsed,
            label.name.clone(),
            thread.name(),
            self.rng.gen_range(self.bytes.min..=self.bytes.max),
            self.rng.gen_range(self.sent_bytes.min..=self.sent_bytes.max),
            all_threads,
        );

        thread.label_cursor = (thread.label_cursor + 1) % self.labels.len();
        if thread.clock > self.end_time {
            thread.finished = true;
            self.unfinished -= 1;
            debug!("{} finished", thread.name());
        }

        record
    }
}

impl<R: Rng> Iterator for RecordGenerator<R> {
    type Item = JtlRecord;

    fn next(&mut self) -> Option<JtlRecord> {
        if self.unfinished == 0 {
            return None;
        }

        // At least one thread is unfinished, so this scan terminates.
        loop {
            if self.next_thread >= self.threads.len() {
                self.next_thread = 0;
            }
            let idx = self.next_thread;
            self.next_thread += 1;

            if !self.threads[idx].finished {
                return Some(self.emit(idx));
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.unfinished, None)
    }
}
