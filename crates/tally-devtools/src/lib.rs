use std::cell::RefCell;
use std::rc::Rc;

use web_time::Instant;

use tally_core::{CommitInfo, FlushReport, ListenerId, StateError, on_commit, remove_commit_listener};

/// Running totals collected from commit events.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Metrics {
    pub turns: u64,
    pub commits: u64,
    pub notified: u64,
    pub unchanged: u64,
    pub requests: u64,
    pub last_label: Option<&'static str>,
    pub last_passes: usize,
    pub last_turn_ms: f32,
}

/// Watches every commit on the current thread while installed.
pub struct Inspector {
    metrics: Rc<RefCell<Metrics>>,
    listener: Option<ListenerId>,
    turn_started: Option<Instant>,
}

impl Default for Inspector {
    fn default() -> Self {
        Self::new()
    }
}

impl Inspector {
    pub fn new() -> Self {
        Self {
            metrics: Rc::new(RefCell::new(Metrics::default())),
            listener: None,
            turn_started: None,
        }
    }

    pub fn install(&mut self) {
        if self.listener.is_some() {
            return;
        }
        let metrics = self.metrics.clone();
        self.listener = Some(on_commit(move |info: &CommitInfo| {
            let mut m = metrics.borrow_mut();
            m.commits += 1;
            m.requests += info.requests as u64;
            if info.changed {
                m.notified += 1;
            } else {
                m.unchanged += 1;
            }
            m.last_label = Some(info.label);
        }));
    }

    pub fn uninstall(&mut self) {
        if let Some(id) = self.listener.take() {
            remove_commit_listener(id);
        }
    }

    pub fn is_installed(&self) -> bool {
        self.listener.is_some()
    }

    pub fn begin_turn(&mut self) {
        self.turn_started = Some(Instant::now());
    }

    pub fn end_turn(&mut self, report: &FlushReport) {
        let mut m = self.metrics.borrow_mut();
        m.turns += 1;
        m.last_passes = report.passes;
        if let Some(start) = self.turn_started.take() {
            m.last_turn_ms = start.elapsed().as_secs_f32() * 1000.0;
        }
    }

    /// Times one turn. A click on a missing button is not a turn and is not
    /// counted; failed flushes are.
    pub fn time_turn(
        &mut self,
        f: impl FnOnce() -> Result<FlushReport, StateError>,
    ) -> Result<FlushReport, StateError> {
        self.begin_turn();
        let result = f();
        match &result {
            Ok(report) => self.end_turn(report),
            Err(StateError::NoSuchTarget(label)) => {
                log::debug!("inspector: no button `{label}`; not counted");
                self.turn_started = None;
            }
            Err(e) => {
                log::warn!("inspector: turn failed: {e}");
                self.end_turn(&FlushReport::default());
            }
        }
        result
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics.borrow().clone()
    }

    pub fn reset(&mut self) {
        *self.metrics.borrow_mut() = Metrics::default();
    }

    pub fn hud_line(&self) -> String {
        let m = self.metrics.borrow();
        let mut lines = vec![
            format!("turns: {}", m.turns),
            format!("commits: {}", m.commits),
            format!("notified: {}", m.notified),
        ];
        if m.unchanged > 0 {
            lines.push(format!("unchanged: {}", m.unchanged));
        }
        if let Some(label) = m.last_label {
            lines.push(format!("last: {label}"));
        }
        lines.push(format!("turn: {:.2} ms", m.last_turn_ms));
        lines.join("  |  ")
    }
}

impl Drop for Inspector {
    fn drop(&mut self) {
        self.uninstall();
    }
}
