use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;

use crate::equality::{Equality, ShallowEq};
use crate::error::StateError;
use crate::runtime::{self, Commit, CommitInfo};
use crate::scope::current_scope;
use crate::update::{Initial, Update, fold};

new_key_type! {
    pub struct SubId;
}

const UNLABELLED: &str = "cell";

/// A single value with batched, deferred updates.
///
/// `read` always returns the committed value. Requests queue up until the
/// batch is committed, either by the runtime at the end of a turn or by an
/// explicit [`commit_batch`](Self::commit_batch). Clones share the cell.
pub struct StateCell<T: 'static>(Rc<RefCell<Inner<T>>>);

struct Inner<T> {
    value: T,
    pending: SmallVec<[Update<T>; 4]>,
    subs: SlotMap<SubId, Rc<dyn Fn(&T)>>,
    equality: Equality<T>,
    label: &'static str,
    scheduled: bool,
    disposed: bool,
}

impl<T> Inner<T> {
    fn dispose(&mut self) {
        self.disposed = true;
        self.pending.clear();
        self.subs.clear();
    }
}

impl<T: Clone + 'static> Commit for RefCell<Inner<T>> {
    fn commit(&self) -> CommitInfo {
        let (start, requests, equality, label) = {
            let mut inner = self.borrow_mut();
            let label = inner.label;
            if inner.disposed || inner.pending.is_empty() {
                return CommitInfo {
                    label,
                    requests: 0,
                    changed: false,
                };
            }
            let requests = std::mem::take(&mut inner.pending);
            (inner.value.clone(), requests, inner.equality, label)
        };
        let count = requests.len();

        // fold without holding the borrow; update fns may read the cell
        let next = fold(start, requests);

        let (subs, snapshot) = {
            let mut inner = self.borrow_mut();
            if inner.disposed {
                return CommitInfo {
                    label,
                    requests: count,
                    changed: false,
                };
            }
            let changed = !equality.same(&inner.value, &next);
            inner.value = next;
            if !changed {
                return CommitInfo {
                    label,
                    requests: count,
                    changed: false,
                };
            }
            let subs: Vec<Rc<dyn Fn(&T)>> = inner.subs.values().cloned().collect();
            (subs, inner.value.clone())
        };

        for sub in subs {
            sub(&snapshot);
        }
        CommitInfo {
            label,
            requests: count,
            changed: true,
        }
    }

    fn unschedule(&self) {
        self.borrow_mut().scheduled = false;
    }
}

impl<T: Clone + ShallowEq + 'static> StateCell<T> {
    pub fn new(value: T) -> Self {
        Self::create(Initial::Value(value), Equality::shallow())
    }

    /// `init` runs once, here.
    pub fn new_with(init: impl FnOnce() -> T) -> Self {
        Self::create(Initial::Value(init()), Equality::shallow())
    }
}

impl<T: Clone + 'static> StateCell<T> {
    /// Builds a cell with an explicit comparison policy.
    pub fn create(initial: Initial<T>, equality: Equality<T>) -> Self {
        let cell = Self(Rc::new(RefCell::new(Inner {
            value: initial.resolve(),
            pending: SmallVec::new(),
            subs: SlotMap::with_key(),
            equality,
            label: UNLABELLED,
            scheduled: false,
            disposed: false,
        })));

        if let Some(scope) = current_scope() {
            let weak = Rc::downgrade(&cell.0);
            scope.add_disposer(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.borrow_mut().dispose();
                }
            });
        }
        cell
    }

    pub fn label(self, label: &'static str) -> Self {
        self.0.borrow_mut().label = label;
        self
    }

    /// Compare with `PartialEq` instead of the shallow default.
    pub fn structural(self) -> Self
    where
        T: PartialEq,
    {
        self.0.borrow_mut().equality = Equality::structural();
        self
    }

    /// Notify on every non-empty commit.
    pub fn always_notify(self) -> Self {
        self.0.borrow_mut().equality = Equality::never();
        self
    }

    pub fn name(&self) -> &'static str {
        self.0.borrow().label
    }

    /// The last committed value.
    pub fn read(&self) -> T {
        self.0.borrow().value.clone()
    }

    pub fn try_request_update(&self, update: impl Into<Update<T>>) -> Result<(), StateError> {
        let schedule = {
            let mut inner = self.0.borrow_mut();
            if inner.disposed {
                return Err(StateError::Disposed { label: inner.label });
            }
            inner.pending.push(update.into());
            !std::mem::replace(&mut inner.scheduled, true)
        };
        if schedule {
            let erased: Rc<dyn Commit> = self.0.clone();
            runtime::schedule(Rc::downgrade(&erased));
        }
        Ok(())
    }

    /// Queues `update` for the current batch. Requests on a disposed cell
    /// are dropped with a warning.
    pub fn request_update(&self, update: impl Into<Update<T>>) {
        if let Err(e) = self.try_request_update(update) {
            log::warn!("request_update: {e}; request dropped");
        }
    }

    /// Literal request: the batch result becomes `value`.
    pub fn set(&self, value: T) {
        self.request_update(Update::Replace(value));
    }

    /// Functional request: maps the value left by the previous request.
    pub fn update(&self, f: impl FnOnce(&T) -> T + 'static) {
        self.request_update(Update::apply(f));
    }

    /// Folds the queued requests into a new committed value. Returns whether
    /// observers were notified.
    pub fn commit_batch(&self) -> bool {
        runtime::commit_one(&*self.0).changed
    }

    pub fn has_pending(&self) -> bool {
        !self.0.borrow().pending.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.0.borrow().pending.len()
    }

    pub fn is_disposed(&self) -> bool {
        self.0.borrow().disposed
    }

    /// `f` runs after each commit that changed the value.
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> SubId {
        self.0.borrow_mut().subs.insert(Rc::new(f))
    }

    pub fn unsubscribe(&self, id: SubId) -> bool {
        self.0.borrow_mut().subs.remove(id).is_some()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: 'static> Clone for StateCell<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for StateCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.0.borrow();
        f.debug_struct("StateCell")
            .field("label", &inner.label)
            .field("value", &inner.value)
            .field("pending", &inner.pending.len())
            .field("equality", &inner.equality)
            .finish()
    }
}

pub fn create_state_cell<T: Clone + ShallowEq + 'static>(initial: Initial<T>) -> StateCell<T> {
    StateCell::create(initial, Equality::shallow())
}

pub fn state_cell<T: Clone + ShallowEq + 'static>(value: T) -> StateCell<T> {
    StateCell::new(value)
}

pub fn state_cell_with<T: Clone + ShallowEq + 'static>(init: impl FnOnce() -> T) -> StateCell<T> {
    StateCell::new_with(init)
}
