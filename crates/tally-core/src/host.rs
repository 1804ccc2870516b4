use std::cell::Cell;
use std::rc::Rc;

use crate::composer::Composer;
use crate::error::StateError;
use crate::runtime::{FlushReport, turn};
use crate::scope::Scope;
use crate::view::View;

/// Drives a root view function: composes it, dispatches clicks as turns and
/// recomposes once after any turn in which a remembered cell changed.
pub struct Host {
    root: Box<dyn Fn() -> View>,
    composer: Composer,
    scope: Scope,
    dirty: Rc<Cell<bool>>,
    view: View,
    renders: usize,
}

impl Host {
    pub fn new(root: impl Fn() -> View + 'static) -> Self {
        let dirty = Rc::new(Cell::new(false));
        let composer = Composer::with_invalidate({
            let dirty = dirty.clone();
            move || dirty.set(true)
        });
        let mut host = Self {
            root: Box::new(root),
            composer,
            scope: Scope::new(),
            dirty,
            view: View::Column(Vec::new()),
            renders: 0,
        };
        host.recompose();
        host
    }

    fn recompose(&mut self) {
        self.dirty.set(false);
        let root = &self.root;
        let composer = &mut self.composer;
        self.view = self.scope.run(|| composer.compose(|| root()));
        self.renders += 1;
        log::trace!("host: render #{}", self.renders);
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn renders(&self) -> usize {
        self.renders
    }

    /// Runs the handler of the button labelled `label` as one turn.
    pub fn click(&mut self, label: &str) -> Result<FlushReport, StateError> {
        let handler = self
            .view
            .find_button(label)
            .ok_or_else(|| StateError::NoSuchTarget(label.to_string()))?;
        let report = turn(|| handler());
        self.settle();
        report
    }

    /// Recomposes if a remembered cell changed since the last render.
    pub fn settle(&mut self) -> bool {
        if self.dirty.get() {
            self.recompose();
            true
        } else {
            false
        }
    }

    /// Tears down every cell and effect created during composition.
    pub fn dispose(self) {
        self.scope.dispose();
    }
}
