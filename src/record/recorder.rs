//! Concurrent accumulator for crawl observations
//!
//! Crawl tasks of one site submit their observations through a [`Recorder`]
//! handle. A single background task owns the accumulating state and is the
//! only code that ever mutates it; every other task talks to it through a
//! bounded message channel. A full channel makes the submitting task wait,
//! so nothing is ever dropped.

use crate::record::entities::{BrokenLink, BrokenLinkDetails, Link, Recording};
use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};

/// Number of messages buffered before producers have to wait
const RECORDER_BUFFER: usize = 64;

enum Command {
    RecordLink(Link),
    RecordBrokenLink(BrokenLink),
    Stop(oneshot::Sender<Recording>),
}

/// Handle to the accumulator of one site crawl
///
/// Cloning the handle is cheap; all clones feed the same accumulator.
#[derive(Debug, Clone)]
pub struct Recorder {
    command_tx: mpsc::Sender<Command>,
}

impl Recorder {
    /// Creates a recorder and spawns its owning task
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new() -> Self {
        let (command_tx, mut command_rx) = mpsc::channel(RECORDER_BUFFER);

        tokio::spawn(async move {
            let mut links: Vec<Link> = Vec::with_capacity(64);
            let mut broken_links: HashMap<String, BrokenLinkDetails> = HashMap::with_capacity(16);

            while let Some(command) = command_rx.recv().await {
                match command {
                    Command::RecordLink(link) => links.push(link),
                    Command::RecordBrokenLink(broken) => {
                        broken_links.insert(broken.absolute_url, broken.details);
                    }
                    Command::Stop(reply) => {
                        // Messages queued behind the stop request were sent
                        // after the caller asked to stop.
                        command_rx.close();
                        let recording = Recording {
                            links,
                            broken_link_by_abs_url: broken_links,
                        };
                        if reply.send(recording).is_err() {
                            tracing::warn!("Recorder stopped but nobody waited for the recording");
                        }
                        return;
                    }
                }
            }
        });

        Self { command_tx }
    }

    /// Records a link observation
    pub async fn record_link(&self, link: Link) {
        if self.command_tx.send(Command::RecordLink(link)).await.is_err() {
            tracing::warn!("Link submitted to a stopped recorder, discarding");
        }
    }

    /// Records the failure of a link, replacing earlier details for the same URL
    pub async fn record_broken_link(&self, broken: BrokenLink) {
        if self
            .command_tx
            .send(Command::RecordBrokenLink(broken))
            .await
            .is_err()
        {
            tracing::warn!("Broken link submitted to a stopped recorder, discarding");
        }
    }

    /// Stops the recorder and returns everything recorded so far
    ///
    /// Every submission completed before this call is part of the returned
    /// recording. The caller must make sure all producers are done, the
    /// recorder cannot detect the end of a crawl by itself. Stopping twice
    /// yields an empty recording.
    pub async fn stop(&self) -> Recording {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.command_tx.send(Command::Stop(reply_tx)).await.is_err() {
            tracing::warn!("Recorder already stopped");
            return Recording::default();
        }
        reply_rx.await.unwrap_or_default()
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}
