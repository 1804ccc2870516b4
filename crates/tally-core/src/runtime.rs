//! # Batches and turns
//!
//! Requests made through [`StateCell::request_update`](crate::StateCell::request_update)
//! are queued on the cell and the cell is scheduled here. Nothing is
//! committed until the current turn ends:
//!
//! - [`batch`] / [`turn`] run a closure as one turn. Nested calls join the
//!   outer turn; when the outermost one returns, the runtime flushes.
//! - [`flush`] commits every scheduled cell right away.
//!
//! Each scheduled cell is committed once per pass, in the order it was first
//! scheduled. Requests made by observers while a pass runs are picked up by
//! a follow‑up pass of the same flush, bounded by
//! [`RuntimeConfig::max_flush_passes`](crate::RuntimeConfig).

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use slotmap::{SlotMap, new_key_type};

use crate::config::runtime_config;
use crate::error::StateError;

new_key_type! {
    pub struct ListenerId;
}

/// What a single commit did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommitInfo {
    pub label: &'static str,
    /// Number of requests folded; zero means there was nothing to commit.
    pub requests: usize,
    /// Whether observers were notified.
    pub changed: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub passes: usize,
    pub commits: usize,
    pub notified: usize,
}

impl FlushReport {
    fn absorb(&mut self, info: &CommitInfo) {
        if info.requests > 0 {
            self.commits += 1;
            if info.changed {
                self.notified += 1;
            }
        }
    }
}

/// Type-erased view of a cell the runtime can commit.
pub(crate) trait Commit {
    fn commit(&self) -> CommitInfo;
    /// Called when the runtime takes the cell's queue entry; the next
    /// request schedules it again.
    fn unschedule(&self);
}

thread_local! {
    static RUNTIME: RefCell<Runtime> = RefCell::new(Runtime::default());
}

#[derive(Default)]
struct Runtime {
    depth: usize,
    flushing: bool,
    queue: VecDeque<Weak<dyn Commit>>,
    listeners: SlotMap<ListenerId, Rc<dyn Fn(&CommitInfo)>>,
}

pub(crate) fn schedule(cell: Weak<dyn Commit>) {
    RUNTIME.with(|rt| rt.borrow_mut().queue.push_back(cell));
}

/// Commits one cell and reports it to listeners.
pub(crate) fn commit_one(cell: &dyn Commit) -> CommitInfo {
    let info = cell.commit();
    if info.requests == 0 {
        return info;
    }
    if runtime_config().trace_commits {
        log::debug!(
            "commit `{}`: {} request(s), changed = {}",
            info.label,
            info.requests,
            info.changed
        );
    }
    let listeners: Vec<Rc<dyn Fn(&CommitInfo)>> =
        RUNTIME.with(|rt| rt.borrow().listeners.values().cloned().collect());
    for listener in listeners {
        listener(&info);
    }
    info
}

pub fn in_batch() -> bool {
    RUNTIME.with(|rt| rt.borrow().depth > 0)
}

/// Number of scheduled entries waiting for the next flush.
pub fn scheduled_len() -> usize {
    RUNTIME.with(|rt| rt.borrow().queue.len())
}

fn enter<R>(f: impl FnOnce() -> R) -> (R, Option<Result<FlushReport, StateError>>) {
    struct Depth;
    impl Drop for Depth {
        fn drop(&mut self) {
            RUNTIME.with(|rt| rt.borrow_mut().depth -= 1);
        }
    }

    RUNTIME.with(|rt| rt.borrow_mut().depth += 1);
    let out = {
        let _depth = Depth;
        f()
    };

    if in_batch() {
        (out, None)
    } else {
        (out, Some(flush()))
    }
}

/// Runs `f` as one turn and flushes when the outermost turn ends.
///
/// A flush failure is logged; use [`turn`] to observe it.
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    let (out, flushed) = enter(f);
    if let Some(Err(e)) = flushed {
        log::error!("batch: {e}");
    }
    out
}

/// Handles one external trigger: runs `f`, then resolves the batch.
///
/// Inside an enclosing turn nothing is flushed yet and an empty report is
/// returned.
pub fn turn(f: impl FnOnce()) -> Result<FlushReport, StateError> {
    let ((), flushed) = enter(f);
    flushed.unwrap_or(Ok(FlushReport::default()))
}

/// Commits every scheduled cell, repeating while observers schedule more.
pub fn flush() -> Result<FlushReport, StateError> {
    let already = RUNTIME.with(|rt| std::mem::replace(&mut rt.borrow_mut().flushing, true));
    if already {
        // the running flush picks up anything scheduled from here
        return Ok(FlushReport::default());
    }

    struct Flushing;
    impl Drop for Flushing {
        fn drop(&mut self) {
            RUNTIME.with(|rt| rt.borrow_mut().flushing = false);
        }
    }
    let _flushing = Flushing;

    // a panicking observer or update fn leaves the rest of its pass queued
    struct Requeue(VecDeque<Weak<dyn Commit>>);
    impl Drop for Requeue {
        fn drop(&mut self) {
            if self.0.is_empty() {
                return;
            }
            let rest = std::mem::take(&mut self.0);
            RUNTIME.with(|rt| {
                let mut rt = rt.borrow_mut();
                for cell in rest.into_iter().rev() {
                    rt.queue.push_front(cell);
                }
            });
        }
    }

    let limit = runtime_config().max_flush_passes;
    let mut report = FlushReport::default();
    loop {
        let pass: Vec<Weak<dyn Commit>> =
            RUNTIME.with(|rt| rt.borrow_mut().queue.drain(..).collect());
        if pass.is_empty() {
            break;
        }
        if report.passes >= limit {
            RUNTIME.with(|rt| {
                let mut rt = rt.borrow_mut();
                for cell in pass.into_iter().rev() {
                    rt.queue.push_front(cell);
                }
            });
            log::error!("flush: still scheduling after {limit} passes; leaving requests pending");
            return Err(StateError::FlushLimit { passes: limit });
        }

        report.passes += 1;
        log::trace!("flush pass {}: {} cell(s)", report.passes, pass.len());
        let mut rest = Requeue(pass.into());
        while let Some(cell) = rest.0.pop_front() {
            // dropped cells just fall out of the queue
            if let Some(cell) = cell.upgrade() {
                cell.unschedule();
                let info = commit_one(cell.as_ref());
                report.absorb(&info);
            }
        }
    }
    Ok(report)
}

/// Registers a listener called after every non-empty commit.
pub fn on_commit(f: impl Fn(&CommitInfo) + 'static) -> ListenerId {
    RUNTIME.with(|rt| rt.borrow_mut().listeners.insert(Rc::new(f)))
}

pub fn remove_commit_listener(id: ListenerId) -> bool {
    RUNTIME.with(|rt| rt.borrow_mut().listeners.remove(id).is_some())
}
