//! Async decode-then-diff with last-request-wins semantics.
//!
//! Every submission gets a fresh [`RequestId`]. Completions travel back over
//! a channel tagged with their id; anything that is not the latest request
//! by the time it arrives is dropped. No cancellation is sent to in-flight
//! work, it simply finishes and is ignored.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::decode::{self, RawImage};
use crate::decoded::DecodedImage;
use crate::diff::{self, DiffResult};

/// Monotonically increasing identity of a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

/// Tracks the newest outstanding request.
#[derive(Debug, Default)]
pub struct DiffRequests {
    latest: u64,
}

impl DiffRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new id, making every earlier id stale.
    pub fn issue(&mut self) -> RequestId {
        self.latest += 1;
        RequestId(self.latest)
    }

    pub fn latest(&self) -> Option<RequestId> {
        (self.latest > 0).then_some(RequestId(self.latest))
    }

    pub fn is_current(&self, id: RequestId) -> bool {
        id.0 == self.latest
    }

    /// Pass `value` through only if `id` is still the latest request.
    pub fn accept<T>(&self, id: RequestId, value: T) -> Option<T> {
        self.is_current(id).then_some(value)
    }
}

/// Work for one request: the raw sides plus the sensitivity to diff at.
#[derive(Clone, Debug)]
pub struct DiffJob {
    pub previous: Option<RawImage>,
    pub current: Option<RawImage>,
    pub sensitivity: u8,
    /// Only diff mode wants the diff; other modes just need decoding.
    pub compute_diff: bool,
}

/// Result of a job. `diff` is set only when requested and both sides decoded.
#[derive(Clone, Debug)]
pub struct Completion {
    pub id: RequestId,
    pub previous: Option<Arc<DecodedImage>>,
    pub current: Option<Arc<DecodedImage>>,
    pub sensitivity: u8,
    pub diff: Option<Arc<DiffResult>>,
}

/// Channel capacity for completions waiting to be applied.
const COMPLETION_BUFFER: usize = 16;

pub struct DiffPipeline {
    requests: DiffRequests,
    in_flight: usize,
    tx: mpsc::Sender<Completion>,
    rx: mpsc::Receiver<Completion>,
}

impl Default for DiffPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl DiffPipeline {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(COMPLETION_BUFFER);
        Self {
            requests: DiffRequests::new(),
            in_flight: 0,
            tx,
            rx,
        }
    }

    /// Start decoding (and optionally diffing) `job` in the background.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&mut self, job: DiffJob) -> RequestId {
        let id = self.requests.issue();
        self.in_flight += 1;
        debug!(?id, sensitivity = job.sensitivity, diff = job.compute_diff, "submitting");
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let completion = run(id, job).await;
            // The receiver only goes away with the pipeline itself.
            let _ = tx.send(completion).await;
        });
        id
    }

    /// Mark every in-flight request stale without starting new work
    /// (e.g. the user switched away before decoding finished).
    pub fn invalidate(&mut self) -> RequestId {
        self.requests.issue()
    }

    pub fn is_current(&self, id: RequestId) -> bool {
        self.requests.is_current(id)
    }

    /// Wait for the latest request's completion, discarding stale ones.
    ///
    /// Returns `None` once nothing is in flight and the latest request has
    /// either been delivered or was invalidated.
    pub async fn recv_latest(&mut self) -> Option<Completion> {
        while self.in_flight > 0 {
            let completion = self.rx.recv().await?;
            self.in_flight -= 1;
            match self.requests.accept(completion.id, completion) {
                Some(c) => return Some(c),
                None => debug!("discarding stale completion"),
            }
        }
        None
    }
}

async fn run(id: RequestId, job: DiffJob) -> Completion {
    let DiffJob {
        previous,
        current,
        sensitivity,
        compute_diff,
    } = job;

    let (previous, current) = tokio::join!(decode_blocking(previous), decode_blocking(current));

    let diff = match (&previous, &current) {
        (Some(p), Some(c)) if compute_diff => {
            let (p, c) = (p.clone(), c.clone());
            match tokio::task::spawn_blocking(move || diff::diff(&p, &c, sensitivity)).await {
                Ok(result) => Some(Arc::new(result)),
                Err(e) => {
                    warn!(error = %e, "diff task panicked");
                    None
                }
            }
        }
        _ => None,
    };

    Completion {
        id,
        previous,
        current,
        sensitivity,
        diff,
    }
}

async fn decode_blocking(raw: Option<RawImage>) -> Option<Arc<DecodedImage>> {
    let raw = raw?;
    match tokio::task::spawn_blocking(move || decode::decode_side(Some(&raw))).await {
        Ok(img) => img.map(Arc::new),
        Err(e) => {
            warn!(error = %e, "decode task panicked");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgba, RgbaImage};

    use super::*;
    use crate::decode::Declared;

    fn raw_png(color: [u8; 4]) -> RawImage {
        let img = RgbaImage::from_pixel(4, 4, Rgba(color));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        RawImage::new("test.png", buf, Some(Declared::Raster(ImageFormat::Png)))
    }

    fn job(sensitivity: u8, compute_diff: bool) -> DiffJob {
        DiffJob {
            previous: Some(raw_png([0, 0, 0, 255])),
            current: Some(raw_png([255, 255, 255, 255])),
            sensitivity,
            compute_diff,
        }
    }

    // -- request tracking --

    #[test]
    fn only_latest_request_is_accepted() {
        let mut r = DiffRequests::new();
        assert_eq!(r.latest(), None);
        let first = r.issue();
        let second = r.issue();
        assert!(first < second);
        assert_eq!(r.accept(first, "old"), None);
        assert_eq!(r.accept(second, "new"), Some("new"));
        assert_eq!(r.latest(), Some(second));
    }

    // -- pipeline --

    #[tokio::test]
    async fn delivers_decoded_pair_and_diff() {
        let mut p = DiffPipeline::new();
        let id = p.submit(job(10, true));
        let c = p.recv_latest().await.unwrap();
        assert_eq!(c.id, id);
        assert!(c.previous.is_some() && c.current.is_some());
        let d = c.diff.unwrap();
        assert_eq!(d.changed_pixels, 16);
        assert_eq!(d.total_pixels, 16);
    }

    #[tokio::test]
    async fn skips_diff_when_not_requested() {
        let mut p = DiffPipeline::new();
        p.submit(job(10, false));
        let c = p.recv_latest().await.unwrap();
        assert!(c.diff.is_none());
        assert!(c.current.is_some());
    }

    #[tokio::test]
    async fn stale_completion_is_discarded() {
        let mut p = DiffPipeline::new();
        let stale = p.submit(job(0, true));
        let fresh = p.submit(job(50, true));
        let c = p.recv_latest().await.unwrap();
        assert_eq!(c.id, fresh);
        assert_ne!(c.id, stale);
        assert_eq!(c.sensitivity, 50);
        // Whatever is left is stale and must not surface.
        assert!(p.recv_latest().await.is_none());
    }

    #[tokio::test]
    async fn invalidate_drops_in_flight_work() {
        let mut p = DiffPipeline::new();
        let id = p.submit(job(10, true));
        p.invalidate();
        assert!(!p.is_current(id));
        assert!(p.recv_latest().await.is_none());
    }

    #[tokio::test]
    async fn decode_failure_degrades_to_absent_side() {
        let mut p = DiffPipeline::new();
        p.submit(DiffJob {
            previous: Some(RawImage::new("bad.png", b"nope".to_vec(), None)),
            current: Some(raw_png([1, 1, 1, 255])),
            sensitivity: 10,
            compute_diff: true,
        });
        let c = p.recv_latest().await.unwrap();
        assert!(c.previous.is_none());
        assert!(c.current.is_some());
        assert!(c.diff.is_none());
    }
}
