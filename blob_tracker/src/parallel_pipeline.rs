// THEORY:
// Whole frames are independent (no blob identity survives a frame), so a stream
// of frames can be spread over several engines at once. Within a frame nothing
// changes: each worker runs the usual sequential row linking on its own engine.
//
// - A single dispatcher task receives every frame and hands it to the workers
//   round-robin, each over its own channel. A worker whose channel is gone leaves
//   the rotation; once none are left the dispatcher stops and the pool is closed.
// - Workers run on tokio's blocking pool, since a frame scan is CPU-bound and
//   never awaits. Each owns a private `BlobTracker`.
// - Every frame carries a oneshot sender for its report; the frame index is
//   assigned at submission so reports keep the caller's order.

use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::join_all;
use image::RgbImage;
use log::{debug, warn};
use tokio::sync::mpsc::error::SendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{BlobError, Result};
use crate::pipeline::{BlobTracker, FrameReport, TrackerConfig};

struct FrameTask {
    frame_index: u64,
    image: RgbImage,
    result_sender: oneshot::Sender<Result<FrameReport>>,
}

/// Hands frames to the workers round-robin until the pool shuts down or no
/// worker is left. A frame dropped here reaches its caller as `WorkerPoolClosed`.
async fn dispatch(
    mut task_receiver: mpsc::UnboundedReceiver<FrameTask>,
    mut workers: Vec<mpsc::UnboundedSender<FrameTask>>,
) {
    let mut next = 0;
    while let Some(mut task) = task_receiver.recv().await {
        loop {
            if workers.is_empty() {
                warn!("every worker is gone, closing the pool");
                return;
            }
            next %= workers.len();
            match workers[next].send(task) {
                Ok(()) => {
                    next += 1;
                    break;
                }
                Err(SendError(returned)) => {
                    warn!("worker {next} is gone, removing it from the rotation");
                    workers.remove(next);
                    task = returned;
                }
            }
        }
    }
}

/// A pool of trackers processing whole frames concurrently.
///
/// Must be created from within a tokio runtime.
pub struct ParallelTracker {
    task_sender: Option<mpsc::UnboundedSender<FrameTask>>,
    workers: Vec<JoinHandle<()>>,
    next_frame: AtomicU64,
}

impl ParallelTracker {
    /// Starts `workers` trackers built from `config`. Zero means one per CPU.
    pub fn new(config: TrackerConfig, workers: usize) -> Result<Self> {
        let worker_count = match workers {
            0 => num_cpus::get(),
            workers => workers,
        };
        // Fail here rather than inside every worker.
        let tracker = BlobTracker::new(config)?;

        let (task_sender, task_receiver) = mpsc::unbounded_channel::<FrameTask>();
        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..worker_count)
            .map(|_| mpsc::unbounded_channel::<FrameTask>())
            .unzip();

        let mut handles = Vec::with_capacity(worker_count + 1);
        handles.push(tokio::spawn(dispatch(task_receiver, worker_senders)));

        for (worker_idx, mut worker_receiver) in worker_receivers.into_iter().enumerate() {
            let mut tracker = tracker.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                while let Some(task) = worker_receiver.blocking_recv() {
                    let mut result = tracker.process_frame(&task.image);
                    if let Ok(report) = &mut result {
                        report.frame_index = task.frame_index;
                    }
                    // The caller may have stopped waiting.
                    let _ = task.result_sender.send(result);
                }
                debug!("worker {worker_idx} stopped");
            }));
        }

        debug!("started blob tracker pool with {worker_count} workers");
        Ok(Self {
            task_sender: Some(task_sender),
            workers: handles,
            next_frame: AtomicU64::new(0),
        })
    }

    /// One worker per CPU.
    pub fn with_default_workers(config: TrackerConfig) -> Result<Self> {
        Self::new(config, num_cpus::get())
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len().saturating_sub(1)
    }

    fn submit(&self, image: RgbImage) -> Result<oneshot::Receiver<Result<FrameReport>>> {
        let Some(sender) = &self.task_sender else {
            return Err(BlobError::WorkerPoolClosed);
        };
        let (result_sender, result_receiver) = oneshot::channel();
        let task = FrameTask {
            frame_index: self.next_frame.fetch_add(1, Ordering::Relaxed),
            image,
            result_sender,
        };
        sender.send(task).map_err(|_| BlobError::WorkerPoolClosed)?;
        Ok(result_receiver)
    }

    async fn receive(receiver: oneshot::Receiver<Result<FrameReport>>) -> Result<FrameReport> {
        receiver.await.map_err(|_| BlobError::WorkerPoolClosed)?
    }

    pub async fn process_frame(&self, image: RgbImage) -> Result<FrameReport> {
        let receiver = self.submit(image)?;
        Self::receive(receiver).await
    }

    /// Processes every image concurrently. Results are in input order.
    pub async fn process_batch(&self, images: Vec<RgbImage>) -> Vec<Result<FrameReport>> {
        let pending: Vec<_> = images
            .into_iter()
            .map(|image| self.submit(image))
            .collect();
        join_all(pending.into_iter().map(|submitted| async move {
            match submitted {
                Ok(receiver) => Self::receive(receiver).await,
                Err(err) => Err(err),
            }
        }))
        .await
    }

    /// Stops accepting frames. Frames already queued still complete.
    pub fn shutdown(&mut self) {
        if self.task_sender.take().is_some() {
            debug!("blob tracker pool shutting down");
        }
    }

    /// True after `shutdown`, or once every worker is gone.
    pub fn is_closed(&self) -> bool {
        match &self.task_sender {
            Some(sender) => sender.is_closed(),
            None => true,
        }
    }

    /// Shuts down and waits for the dispatcher and every worker to exit.
    pub async fn join(mut self) {
        self.shutdown();
        for handle in self.workers.drain(..) {
            if let Err(err) = handle.await {
                warn!("blob tracker worker failed: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_task(frame_index: u64) -> (FrameTask, oneshot::Receiver<Result<FrameReport>>) {
        let (result_sender, result_receiver) = oneshot::channel();
        let task = FrameTask {
            frame_index,
            image: RgbImage::new(1, 1),
            result_sender,
        };
        (task, result_receiver)
    }

    #[tokio::test]
    async fn dispatcher_skips_workers_that_are_gone() {
        let (task_sender, task_receiver) = mpsc::unbounded_channel();
        let (dead, dead_receiver) = mpsc::unbounded_channel();
        let (alive, mut alive_receiver) = mpsc::unbounded_channel();
        drop(dead_receiver);
        let dispatcher = tokio::spawn(dispatch(task_receiver, vec![dead, alive]));

        let mut replies = Vec::new();
        for frame_index in 0..3 {
            let (task, reply) = frame_task(frame_index);
            task_sender.send(task).unwrap();
            replies.push(reply);
        }
        for expected in 0..3 {
            let task = alive_receiver.recv().await.unwrap();
            assert_eq!(task.frame_index, expected);
        }

        drop(task_sender);
        dispatcher.await.unwrap();
        assert_eq!(replies.len(), 3);
    }

    #[tokio::test]
    async fn dispatcher_closes_the_pool_when_every_worker_is_gone() {
        let (task_sender, task_receiver) = mpsc::unbounded_channel();
        let (dead, dead_receiver) = mpsc::unbounded_channel();
        drop(dead_receiver);
        let dispatcher = tokio::spawn(dispatch(task_receiver, vec![dead]));

        let (task, reply) = frame_task(0);
        task_sender.send(task).unwrap();
        dispatcher.await.unwrap();

        assert!(reply.await.is_err());
        assert!(task_sender.is_closed());
        let (task, _reply) = frame_task(1);
        assert!(task_sender.send(task).is_err());
    }
}
