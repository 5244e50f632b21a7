//! Timer-driven preview rendering on a background task.

use crate::renderer::render_preview;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

/// Debounced renderer running on its own tokio task.
///
/// Edits are sent with [`PreviewPipeline::submit`]; the rendered HTML is
/// published on a `watch` channel once no edit has arrived for the quiet
/// window. Only the most recent content is ever rendered. Dropping the
/// pipeline stops the task, and anything still pending is discarded.
pub struct PreviewPipeline {
    edits: mpsc::UnboundedSender<String>,
    html: watch::Receiver<String>,
    task: JoinHandle<()>,
}

impl PreviewPipeline {
    /// Must be called from within a tokio runtime.
    pub fn spawn(quiet: Duration) -> Self {
        let (edits, edit_rx) = mpsc::unbounded_channel();
        let (html_tx, html) = watch::channel(String::new());
        let task = tokio::spawn(run(edit_rx, html_tx, quiet));
        Self { edits, html, task }
    }

    /// Queue new content. Returns `false` if the render task has stopped.
    pub fn submit(&self, content: impl Into<String>) -> bool {
        self.edits.send(content.into()).is_ok()
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.html.clone()
    }

    /// Most recently published HTML; empty until the first render.
    pub fn latest(&self) -> String {
        self.html.borrow().clone()
    }
}

impl Drop for PreviewPipeline {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    mut edits: mpsc::UnboundedReceiver<String>,
    html: watch::Sender<String>,
    quiet: Duration,
) {
    let mut pending: Option<String> = None;

    loop {
        match pending.take() {
            None => match edits.recv().await {
                Some(content) => pending = Some(content),
                None => break,
            },
            Some(content) => {
                tokio::select! {
                    next = edits.recv() => match next {
                        Some(newer) => pending = Some(newer),
                        // Owner went away mid-window; nothing to publish to.
                        None => break,
                    },
                    _ = tokio::time::sleep(quiet) => {
                        let rendered = render_preview(&content);
                        debug!(bytes = rendered.len(), "Preview rendered");
                        if html.send(rendered).is_err() {
                            break;
                        }
                    }
                }
            }
        }
    }

    debug!("Preview pipeline stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[tokio::test(start_paused = true)]
    async fn test_edits_within_window_collapse() {
        let pipeline = PreviewPipeline::spawn(ms(500));
        let mut rx = pipeline.subscribe();

        pipeline.submit("<mj-text>0</mj-text>");
        sleep(ms(100)).await;
        pipeline.submit("<mj-text>100</mj-text>");
        sleep(ms(100)).await;
        pipeline.submit("<mj-text>200</mj-text>");
        sleep(ms(400)).await;
        pipeline.submit("<mj-text>600</mj-text>");

        sleep(ms(499)).await;
        assert!(!rx.has_changed().unwrap());

        sleep(ms(2)).await;
        rx.changed().await.unwrap();
        assert_eq!(
            *rx.borrow_and_update(),
            r#"<div style="line-height: 1.6; color: #333;">600</div>"#
        );

        sleep(ms(2_000)).await;
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_quiet_periods_render_twice() {
        let pipeline = PreviewPipeline::spawn(ms(500));
        let mut rx = pipeline.subscribe();

        pipeline.submit("first");
        sleep(ms(600)).await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), "first");

        pipeline.submit("   ");
        sleep(ms(600)).await;
        assert_eq!(*rx.borrow_and_update(), crate::PLACEHOLDER_HTML);
        assert_eq!(pipeline.latest(), crate::PLACEHOLDER_HTML);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_discards_pending_render() {
        let pipeline = PreviewPipeline::spawn(ms(500));
        let rx = pipeline.subscribe();

        pipeline.submit("<mj-text>late</mj-text>");
        sleep(ms(100)).await;
        drop(pipeline);

        sleep(ms(1_000)).await;
        assert_eq!(*rx.borrow(), "");
    }
}
