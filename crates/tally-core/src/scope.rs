use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

thread_local! {
    static CURRENT_SCOPE: RefCell<Option<Weak<ScopeInner>>> = const { RefCell::new(None) };
}

/// Owner of the cells and effects created while it is current.
///
/// Disposing a scope (explicitly, or by dropping its last handle) disposes
/// its children first, then runs its own disposers newest first. Cells owned
/// by a disposed scope drop their queue and observers and reject further
/// requests.
pub struct Scope {
    inner: Rc<ScopeInner>,
}

struct ScopeInner {
    disposed: Cell<bool>,
    disposers: RefCell<Vec<Box<dyn FnOnce()>>>,
    children: RefCell<Vec<Scope>>,
}

impl ScopeInner {
    fn teardown(&self) {
        if self.disposed.replace(true) {
            return;
        }
        let children = std::mem::take(&mut *self.children.borrow_mut());
        for child in children {
            child.inner.teardown();
        }
        let disposers = std::mem::take(&mut *self.disposers.borrow_mut());
        for disposer in disposers.into_iter().rev() {
            disposer();
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Scope {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ScopeInner {
                disposed: Cell::new(false),
                disposers: RefCell::new(Vec::new()),
                children: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Runs `f` with this scope as the current one.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        struct Restore(Option<Weak<ScopeInner>>);
        impl Drop for Restore {
            fn drop(&mut self) {
                let prev = self.0.take();
                CURRENT_SCOPE.with(|current| *current.borrow_mut() = prev);
            }
        }

        let prev = CURRENT_SCOPE.with(|current| {
            current
                .borrow_mut()
                .replace(Rc::downgrade(&self.inner))
        });
        let _restore = Restore(prev);
        f()
    }

    /// Runs immediately if the scope is already disposed.
    pub fn add_disposer(&self, disposer: impl FnOnce() + 'static) {
        if self.inner.disposed.get() {
            disposer();
            return;
        }
        self.inner.disposers.borrow_mut().push(Box::new(disposer));
    }

    pub fn child(&self) -> Scope {
        let child = Scope::new();
        if self.inner.disposed.get() {
            child.inner.teardown();
        } else {
            self.inner.children.borrow_mut().push(child.clone());
        }
        child
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    pub fn dispose(self) {
        self.inner.teardown();
    }
}

impl Clone for Scope {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

pub fn current_scope() -> Option<Scope> {
    CURRENT_SCOPE.with(|current| {
        current
            .borrow()
            .as_ref()
            .and_then(|weak| weak.upgrade().map(|inner| Scope { inner }))
    })
}

/// Runs `f` now and hands its cleanup to the current scope.
pub fn scoped_effect<F>(f: F)
where
    F: FnOnce() -> Box<dyn FnOnce()> + 'static,
{
    let cleanup = f();
    match current_scope() {
        Some(scope) => scope.add_disposer(cleanup),
        None => log::warn!("scoped_effect: no current scope; cleanup will never run"),
    }
}

/// Boxes a cleanup for [`scoped_effect`].
pub fn on_dispose(f: impl FnOnce() + 'static) -> Box<dyn FnOnce()> {
    Box::new(f)
}

impl Drop for ScopeInner {
    fn drop(&mut self) {
        self.teardown();
    }
}
