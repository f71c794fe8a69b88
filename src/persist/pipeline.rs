//! Ordered, single-worker frame persistence.
//!
//! Sensor-side callers must never block: `submit` is an atomic counter
//! bump plus an unbounded channel send. The actual encoding and file I/O
//! happen on one dedicated blocking worker, so writes execute strictly in
//! submission order and the finish barrier drains after every write
//! submitted before it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::{OutputBatch, PersistedOutput, RawFrameBundle};

use super::writer::OutputWriter;

/// Events emitted by the pipeline worker
#[derive(Debug)]
pub enum PipelineEvent {
    /// All outputs accumulated since the last finish barrier, in
    /// submission order
    BatchReady(OutputBatch),
}

enum Job {
    Write(Box<RawFrameBundle>),
    Finish,
}

/// Single-worker ordered persistence queue.
///
/// The worker exclusively owns the batch accumulator; callers interact
/// only through the channel endpoints and the shared frame counter.
pub struct PersistencePipeline {
    job_tx: mpsc::UnboundedSender<Job>,
    captured_frames: Arc<AtomicUsize>,
    worker: JoinHandle<()>,
}

impl PersistencePipeline {
    /// Spawn the worker and return the pipeline handle plus its event
    /// stream. Must be called within a tokio runtime.
    pub fn spawn(writer: OutputWriter) -> (Self, mpsc::UnboundedReceiver<PipelineEvent>) {
        let (job_tx, job_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let captured_frames = Arc::new(AtomicUsize::new(0));

        let worker = tokio::task::spawn_blocking(move || run_worker(writer, job_rx, event_tx));

        (
            Self {
                job_tx,
                captured_frames,
                worker,
            },
            event_rx,
        )
    }

    /// Queue a bundle for persistence.
    ///
    /// The captured-frame counter is bumped synchronously so progress
    /// reads are accurate immediately, before the write lands.
    pub fn submit(&self, bundle: RawFrameBundle) {
        self.captured_frames.fetch_add(1, Ordering::SeqCst);
        if self.job_tx.send(Job::Write(Box::new(bundle))).is_err() {
            warn!("persistence queue closed; dropping frame");
        }
    }

    /// Queue the finish barrier: once every previously submitted write has
    /// completed, one `BatchReady` event fires and the accumulator clears.
    pub fn finish(&self) {
        if self.job_tx.send(Job::Finish).is_err() {
            warn!("persistence queue closed; finish barrier dropped");
        }
    }

    /// Zero the captured-frame counter for a new session. In-flight queue
    /// work is untouched; callers ensure `finish` preceded this.
    pub fn reset(&self) {
        self.captured_frames.store(0, Ordering::SeqCst);
    }

    /// Frames submitted since the last reset (includes writes still in
    /// flight)
    pub fn captured_frames(&self) -> usize {
        self.captured_frames.load(Ordering::SeqCst)
    }

    /// Close the queue and wait for the worker to drain
    pub async fn shutdown(self) {
        let Self { job_tx, worker, .. } = self;
        drop(job_tx);
        if let Err(e) = worker.await {
            warn!(error = %e, "persistence worker did not shut down cleanly");
        }
    }
}

fn run_worker(
    writer: OutputWriter,
    mut job_rx: mpsc::UnboundedReceiver<Job>,
    event_tx: mpsc::UnboundedSender<PipelineEvent>,
) {
    let mut completed: Vec<PersistedOutput> = Vec::new();

    while let Some(job) = job_rx.blocking_recv() {
        match job {
            Job::Write(bundle) => match writer.write_bundle(&bundle) {
                Ok(output) => {
                    debug!(index = output.index, "artifacts written");
                    completed.push(output);
                }
                Err(e) => {
                    // The bundle is abandoned; the queue keeps going
                    warn!(index = bundle.index, error = %e, "failed to persist bundle");
                }
            },
            Job::Finish => {
                let batch = OutputBatch {
                    outputs: std::mem::take(&mut completed),
                    finished_at: Utc::now(),
                };
                info!(outputs = batch.len(), "capture batch complete");
                if event_tx.send(PipelineEvent::BatchReady(batch)).is_err() {
                    debug!("pipeline event receiver dropped");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ColorImage, DepthMap};
    use nalgebra::{Matrix3, Matrix4};
    use tempfile::TempDir;
    use uuid::Uuid;

    fn bundle(index: i32) -> RawFrameBundle {
        RawFrameBundle {
            index,
            target_id: Some(Uuid::new_v4()),
            color: ColorImage::new(4, 4),
            depth: DepthMap::filled(4, 4, 1.0),
            intrinsics: Matrix3::identity(),
            extrinsics: Matrix4::identity(),
        }
    }

    /// Bundle whose depth map is too small to persist (border trim fails)
    fn doomed_bundle(index: i32) -> RawFrameBundle {
        RawFrameBundle {
            depth: DepthMap::filled(2, 2, 1.0),
            ..bundle(index)
        }
    }

    #[tokio::test]
    async fn test_counter_is_synchronous() {
        let temp = TempDir::new().unwrap();
        let (pipeline, _events) = PersistencePipeline::spawn(OutputWriter::new(temp.path()).unwrap());

        for expected in 1..=3 {
            pipeline.submit(bundle(expected as i32 - 1));
            assert_eq!(pipeline.captured_frames(), expected);
        }

        pipeline.shutdown().await;
    }

    #[tokio::test]
    async fn test_batch_preserves_submission_order() {
        let temp = TempDir::new().unwrap();
        let (pipeline, mut events) =
            PersistencePipeline::spawn(OutputWriter::new(temp.path()).unwrap());

        // Deliberately out-of-index-order submissions
        for index in [4, 0, 2, 1, 3] {
            pipeline.submit(bundle(index));
        }
        pipeline.finish();

        let PipelineEvent::BatchReady(batch) = events.recv().await.unwrap();
        let indices: Vec<i32> = batch.outputs.iter().map(|o| o.index).collect();
        assert_eq!(indices, vec![4, 0, 2, 1, 3]);

        pipeline.shutdown().await;
    }

    #[tokio::test]
    async fn test_failed_write_skips_bundle_but_not_queue() {
        let temp = TempDir::new().unwrap();
        let (pipeline, mut events) =
            PersistencePipeline::spawn(OutputWriter::new(temp.path()).unwrap());

        pipeline.submit(bundle(0));
        pipeline.submit(doomed_bundle(1));
        pipeline.submit(bundle(2));
        pipeline.finish();

        let PipelineEvent::BatchReady(batch) = events.recv().await.unwrap();
        let indices: Vec<i32> = batch.outputs.iter().map(|o| o.index).collect();
        assert_eq!(indices, vec![0, 2]);

        // The counter still counts every submission
        assert_eq!(pipeline.captured_frames(), 3);

        pipeline.shutdown().await;
    }

    #[tokio::test]
    async fn test_finish_clears_accumulator() {
        let temp = TempDir::new().unwrap();
        let (pipeline, mut events) =
            PersistencePipeline::spawn(OutputWriter::new(temp.path()).unwrap());

        pipeline.submit(bundle(0));
        pipeline.finish();
        let PipelineEvent::BatchReady(first) = events.recv().await.unwrap();
        assert_eq!(first.len(), 1);

        pipeline.submit(bundle(1));
        pipeline.finish();
        let PipelineEvent::BatchReady(second) = events.recv().await.unwrap();
        // Only the output submitted after the previous barrier
        assert_eq!(second.len(), 1);
        assert_eq!(second.outputs[0].index, 1);

        pipeline.shutdown().await;
    }

    #[tokio::test]
    async fn test_reset_zeroes_counter_only() {
        let temp = TempDir::new().unwrap();
        let (pipeline, mut events) =
            PersistencePipeline::spawn(OutputWriter::new(temp.path()).unwrap());

        pipeline.submit(bundle(0));
        pipeline.finish();
        let PipelineEvent::BatchReady(batch) = events.recv().await.unwrap();
        assert_eq!(batch.len(), 1);

        pipeline.reset();
        assert_eq!(pipeline.captured_frames(), 0);

        pipeline.shutdown().await;
    }
}
