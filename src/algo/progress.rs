//! Progress reporting for long-running algorithms.
//!
//! Subdivision, remeshing and generation accept an optional [`Progress`] and
//! call it between stages so a front-end can draw a bar.
//!
//! # Example
//!
//! ```
//! use bonemesh::algo::Progress;
//!
//! let progress = Progress::new(|current, total, stage| {
//!     println!("[{}/{}] {}", current, total, stage);
//! });
//! progress.report(0, 4, "split");
//! ```

/// A progress callback that receives updates during long-running operations.
///
/// The callback receives the current step, the total number of steps and a
/// short label for the stage being run.
pub struct Progress {
    callback: Box<dyn Fn(usize, usize, &str) + Send + Sync>,
}

impl Progress {
    /// Create a new progress reporter with the given callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(usize, usize, &str) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Report progress.
    #[inline]
    pub fn report(&self, current: usize, total: usize, stage: &str) {
        (self.callback)(current, total, stage);
    }

    /// Create a reporter that discards all updates.
    pub fn none() -> Self {
        Self::new(|_, _, _| {})
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress").finish_non_exhaustive()
    }
}

/// Report through an optional reporter.
#[inline]
pub(crate) fn report(progress: Option<&Progress>, current: usize, total: usize, stage: &str) {
    if let Some(p) = progress {
        p.report(current, total, stage);
    }
}
