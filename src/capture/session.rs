//! One capture session: ring generation, live matching, persistence.
//!
//! The session owns the tracker, classifier and persistence pipeline and
//! exposes a single event stream to the caller. Sensor callbacks feed
//! `handle_frame` directly: everything on that path is O(ring size) pure
//! computation plus a non-blocking enqueue.

use nalgebra::Point3;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::CaptureSettings;
use crate::domain::{OutputBatch, SensorFrame, TargetPose};
use crate::persist::{OutputWriter, PersistencePipeline, PipelineEvent};

use super::classifier::{CaptureMode, FrameClassifier};
use super::ring::PoseRing;
use super::tracker::CaptureTracker;

/// Errors that prevent a session from starting
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("required sensor capability not supported: {0}")]
    UnsupportedCapability(&'static str),
}

/// What the sensor collaborator reports about the device.
///
/// Checked once, before any capture starts; an unsupported device fails
/// the whole session rather than degrading mid-capture.
#[derive(Debug, Clone, Copy)]
pub struct SensorCapabilities {
    pub world_tracking: bool,
    pub scene_depth: bool,
}

impl SensorCapabilities {
    /// Capabilities of a fully equipped device
    pub fn full() -> Self {
        Self {
            world_tracking: true,
            scene_depth: true,
        }
    }

    fn validate(&self) -> Result<(), CaptureError> {
        if !self.world_tracking {
            return Err(CaptureError::UnsupportedCapability("world tracking"));
        }
        if !self.scene_depth {
            return Err(CaptureError::UnsupportedCapability("scene depth"));
        }
        Ok(())
    }
}

/// Events emitted over the lifetime of a session
#[derive(Debug)]
pub enum SessionEvent {
    /// A new target ring was generated (ring sessions only)
    TargetsGenerated { targets: Vec<TargetPose> },

    /// A frame was accepted and queued for persistence
    FrameCaptured {
        index: i32,
        target_id: Option<Uuid>,
        captured_frames: usize,
    },

    /// The finish barrier drained; all session outputs are on disk
    BatchReady(OutputBatch),
}

/// Drives one ring or free capture session end to end.
pub struct CaptureSession {
    settings: CaptureSettings,
    ring: PoseRing,
    tracker: CaptureTracker,
    classifier: FrameClassifier,
    pipeline: PersistencePipeline,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
    forwarder: JoinHandle<()>,
    finishing: bool,
}

impl CaptureSession {
    /// Start a session, validating device capabilities first.
    ///
    /// Must be called within a tokio runtime; the returned receiver is the
    /// session's only output channel.
    pub fn start(
        mode: CaptureMode,
        capabilities: &SensorCapabilities,
        settings: CaptureSettings,
        writer: OutputWriter,
    ) -> Result<(Self, mpsc::UnboundedReceiver<SessionEvent>), CaptureError> {
        capabilities.validate()?;

        let (pipeline, mut pipeline_rx) = PersistencePipeline::spawn(writer);
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        // Forward pipeline batches into the session event stream
        let batch_tx = event_tx.clone();
        let forwarder = tokio::spawn(async move {
            while let Some(PipelineEvent::BatchReady(batch)) = pipeline_rx.recv().await {
                if batch_tx.send(SessionEvent::BatchReady(batch)).is_err() {
                    break;
                }
            }
        });

        info!(?mode, "capture session started");

        Ok((
            Self {
                ring: PoseRing::new(&settings),
                tracker: CaptureTracker::new(settings.position_tolerance),
                classifier: FrameClassifier::new(mode),
                settings,
                pipeline,
                event_tx,
                forwarder,
                finishing: false,
            },
            event_rx,
        ))
    }

    /// Generate a fresh target ring around `pivot` and reset session state.
    ///
    /// Also the restart path: skipping or re-centering a scan calls this
    /// again and every prior target is forgotten.
    pub fn start_ring(&mut self, pivot: Point3<f32>, rotation_offset: f32) {
        let targets = self
            .ring
            .generate(pivot, rotation_offset, self.settings.ring_count);
        info!(count = targets.len(), "target ring generated");

        self.tracker.reset(targets.clone());
        self.pipeline.reset();
        self.finishing = false;
        let _ = self.event_tx.send(SessionEvent::TargetsGenerated { targets });
    }

    /// Feed one sensor frame through classification.
    ///
    /// Safe to call from the sensor callback: never blocks, never errors.
    pub fn handle_frame(&mut self, frame: &SensorFrame) {
        if self.finishing {
            return;
        }

        let Some(bundle) = self.classifier.classify(frame, &mut self.tracker) else {
            return;
        };

        let index = bundle.index;
        let target_id = bundle.target_id;
        self.pipeline.submit(bundle);

        let captured_frames = self.pipeline.captured_frames();
        debug!(index, captured_frames, "frame captured");
        let _ = self.event_tx.send(SessionEvent::FrameCaptured {
            index,
            target_id,
            captured_frames,
        });

        if captured_frames >= self.required_captures() {
            self.complete();
        }
    }

    /// Arm the free-mode capture trigger (voice command edge)
    pub fn trigger_capture(&mut self) {
        self.classifier.trigger_capture();
    }

    /// Finish the session: queue the barrier that emits the output batch
    pub fn complete(&mut self) {
        if self.finishing {
            return;
        }
        self.finishing = true;
        self.pipeline.finish();
    }

    /// Frames captured so far (synchronous, includes in-flight writes)
    pub fn captured_frames(&self) -> usize {
        self.pipeline.captured_frames()
    }

    /// Ring targets not yet captured
    pub fn pending_targets(&self) -> &[TargetPose] {
        self.tracker.pending()
    }

    /// Close the persistence queue and wait for in-flight work to drain
    pub async fn shutdown(self) {
        let Self {
            pipeline,
            forwarder,
            event_tx,
            ..
        } = self;
        pipeline.shutdown().await;
        drop(event_tx);
        let _ = forwarder.await;
    }

    fn required_captures(&self) -> usize {
        match self.classifier.mode() {
            CaptureMode::Ring => self.settings.ring_count,
            CaptureMode::Free => self.settings.required_sole_captures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_validation() {
        assert!(SensorCapabilities::full().validate().is_ok());

        let no_tracking = SensorCapabilities {
            world_tracking: false,
            scene_depth: true,
        };
        assert!(matches!(
            no_tracking.validate(),
            Err(CaptureError::UnsupportedCapability("world tracking"))
        ));

        let no_depth = SensorCapabilities {
            world_tracking: true,
            scene_depth: false,
        };
        assert!(matches!(
            no_depth.validate(),
            Err(CaptureError::UnsupportedCapability("scene depth"))
        ));
    }
}
