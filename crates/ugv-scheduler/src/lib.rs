//! Refresh scheduler driving the console's update cycle.
//!
//! One multiplexed timer polls every frame source per tick and forwards
//! decoded frames to the presentation layer through the narrow
//! [`ConsolePresenter`] seam. Telemetry samples arrive asynchronously over a
//! channel and are drained once per tick, keeping only the newest
//! (last-write-wins). Nothing here ever blocks on a source: polls are
//! bounded and the channel drain is non-blocking.

use std::{collections::HashMap, time::Duration};

use tokio::sync::{
    mpsc::{error::TryRecvError, UnboundedReceiver},
    watch,
};
use tokio::time::MissedTickBehavior;
use tracing::info;
use ugv_sources::FrameSource;
use ugv_types::{
    camera::{CameraId, SourceStatus},
    frame::VideoFrame,
    telemetry::TimestampedSample,
};

/// The presentation layer's view of the core. Implementations render; the
/// scheduler never touches widgets directly.
pub trait ConsolePresenter: Send {
    fn frame_ready(&mut self, camera: CameraId, frame: VideoFrame);
    fn orientation(&mut self, sample: TimestampedSample);
    fn source_status(&mut self, camera: CameraId, status: SourceStatus);
}

pub struct RefreshScheduler<P: ConsolePresenter> {
    sources: Vec<Box<dyn FrameSource>>,
    telemetry_rx: UnboundedReceiver<TimestampedSample>,
    presenter: P,
    poll_interval: Duration,
    reported_status: HashMap<CameraId, SourceStatus>,
}

impl<P: ConsolePresenter> RefreshScheduler<P> {
    pub fn new(
        sources: Vec<Box<dyn FrameSource>>,
        telemetry_rx: UnboundedReceiver<TimestampedSample>,
        presenter: P,
        poll_interval: Duration,
    ) -> Self {
        Self {
            sources,
            telemetry_rx,
            presenter,
            poll_interval,
            reported_status: HashMap::new(),
        }
    }

    /// One refresh cycle: poll every source once, then apply the newest
    /// telemetry sample if any arrived since the last tick.
    pub async fn tick(&mut self) {
        for source in &mut self.sources {
            let camera = source.id();
            if let Some(frame) = source.poll_frame().await {
                self.presenter.frame_ready(camera, frame);
            }
            let status = source.status();
            if self.reported_status.get(&camera) != Some(&status) {
                self.reported_status.insert(camera, status);
                self.presenter.source_status(camera, status);
            }
        }

        let mut latest = None;
        loop {
            match self.telemetry_rx.try_recv() {
                Ok(sample) => latest = Some(sample),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        if let Some(sample) = latest {
            self.presenter.orientation(sample);
        }
    }

    /// Run ticks on the configured cadence until the shutdown flag flips.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick().await,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("refresh scheduler stopping");
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio::sync::mpsc;
    use ugv_types::telemetry::OrientationSample;

    /// Yields one frame every `period`-th poll, tagged by poll count.
    struct EveryNthSource {
        id: CameraId,
        period: u32,
        polls: u32,
    }

    #[async_trait]
    impl FrameSource for EveryNthSource {
        fn id(&self) -> CameraId {
            self.id
        }

        fn status(&self) -> SourceStatus {
            if self.polls == 0 {
                SourceStatus::Waiting
            } else {
                SourceStatus::Live
            }
        }

        async fn poll_frame(&mut self) -> Option<VideoFrame> {
            self.polls += 1;
            if self.polls % self.period == 0 {
                let mut frame = VideoFrame::empty();
                frame.width = self.polls; // tag for ordering checks
                Some(frame)
            } else {
                None
            }
        }
    }

    #[derive(Default)]
    struct RecordingPresenter {
        frames: Vec<(CameraId, u32)>,
        orientations: Vec<OrientationSample>,
        statuses: Vec<(CameraId, SourceStatus)>,
    }

    impl ConsolePresenter for &mut RecordingPresenter {
        fn frame_ready(&mut self, camera: CameraId, frame: VideoFrame) {
            self.frames.push((camera, frame.width));
        }

        fn orientation(&mut self, sample: TimestampedSample) {
            self.orientations.push(sample.sample);
        }

        fn source_status(&mut self, camera: CameraId, status: SourceStatus) {
            self.statuses.push((camera, status));
        }
    }

    fn scheduler<'a>(
        sources: Vec<Box<dyn FrameSource>>,
        presenter: &'a mut RecordingPresenter,
    ) -> (
        RefreshScheduler<&'a mut RecordingPresenter>,
        mpsc::UnboundedSender<TimestampedSample>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            RefreshScheduler::new(sources, rx, presenter, Duration::from_millis(30)),
            tx,
        )
    }

    #[tokio::test]
    async fn hundred_polls_forward_every_third_frame_in_order() {
        let mut presenter = RecordingPresenter::default();
        let source = EveryNthSource {
            id: CameraId::Turret,
            period: 3,
            polls: 0,
        };
        let (mut sched, _tx) = scheduler(vec![Box::new(source)], &mut presenter);

        for _ in 0..100 {
            sched.tick().await;
        }
        drop(sched);

        assert_eq!(presenter.frames.len(), 33);
        let tags: Vec<u32> = presenter.frames.iter().map(|(_, tag)| *tag).collect();
        let expected: Vec<u32> = (1..=33).map(|n| n * 3).collect();
        assert_eq!(tags, expected);
    }

    #[tokio::test]
    async fn telemetry_drain_is_last_write_wins() {
        let mut presenter = RecordingPresenter::default();
        let (mut sched, tx) = scheduler(Vec::new(), &mut presenter);

        for alpha in [1.0, 2.0, 3.0] {
            tx.send(TimestampedSample::now(OrientationSample::new(
                alpha, 0.0, 0.0,
            )))
            .expect("send sample");
        }
        sched.tick().await;
        drop(sched);

        assert_eq!(presenter.orientations.len(), 1);
        assert_eq!(presenter.orientations[0].alpha, 3.0);
    }

    #[tokio::test]
    async fn status_changes_are_reported_once() {
        let mut presenter = RecordingPresenter::default();
        let source = EveryNthSource {
            id: CameraId::Rear,
            period: 2,
            polls: 0,
        };
        let (mut sched, _tx) = scheduler(vec![Box::new(source)], &mut presenter);

        for _ in 0..6 {
            sched.tick().await;
        }
        drop(sched);

        // Waiting is never observed (the first poll flips it to Live), so a
        // single Live report covers all six ticks.
        assert_eq!(presenter.statuses, vec![(CameraId::Rear, SourceStatus::Live)]);
    }
}
