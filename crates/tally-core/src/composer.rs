use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::cell::StateCell;
use crate::equality::ShallowEq;

thread_local! {
    static COMPOSER: RefCell<Composer> = RefCell::new(Composer::default());
}

/// Slot storage that outlives a single composition pass.
///
/// A host owns one `Composer` and installs it for the duration of each pass
/// with [`Composer::compose`]. Outside of any pass, `remember*` calls use an
/// ambient per-thread composer.
#[derive(Default)]
pub struct Composer {
    slots: Vec<Box<dyn Any>>,
    cursor: usize,
    keyed_slots: HashMap<String, Box<dyn Any>>,
    invalidate: Option<Rc<dyn Fn()>>,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cells remembered in this composer call `f` whenever they notify.
    pub fn with_invalidate(f: impl Fn() + 'static) -> Self {
        Self {
            invalidate: Some(Rc::new(f)),
            ..Self::default()
        }
    }

    /// Runs one composition pass with this composer installed.
    pub fn compose<R>(&mut self, f: impl FnOnce() -> R) -> R {
        struct Restore<'a> {
            dst: &'a mut Composer,
            prev: Option<Composer>,
        }
        impl Drop for Restore<'_> {
            fn drop(&mut self) {
                if let Some(prev) = self.prev.take() {
                    *self.dst = COMPOSER.with(|c| c.replace(prev));
                }
            }
        }

        self.cursor = 0;
        let prev = COMPOSER.with(|c| c.replace(std::mem::take(self)));
        let _restore = Restore {
            dst: self,
            prev: Some(prev),
        };
        f()
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len() + self.keyed_slots.len()
    }
}

/// Order-based remember: the Nth call of a pass returns the Nth slot.
pub fn remember<T: 'static>(init: impl FnOnce() -> T) -> Rc<T> {
    let (cursor, existing) = COMPOSER.with(|c| {
        let mut c = c.borrow_mut();
        let cursor = c.cursor;
        c.cursor += 1;

        let existing = match c.slots.get(cursor) {
            Some(slot) => match slot.downcast_ref::<Rc<T>>() {
                Some(rc) => Some(rc.clone()),
                None => {
                    log::warn!(
                        "remember: slot {} type changed; replacing. \
                         If this is due to conditional composition, prefer remember_with_key.",
                        cursor
                    );
                    None
                }
            },
            None => {
                // reserve the position so nested remembers in `init` land after it
                c.slots.push(Box::new(()));
                None
            }
        };
        (cursor, existing)
    });
    if let Some(rc) = existing {
        return rc;
    }

    let rc: Rc<T> = Rc::new(init());
    COMPOSER.with(|c| c.borrow_mut().slots[cursor] = Box::new(rc.clone()));
    rc
}

/// Key-based remember, stable across conditional branches.
pub fn remember_with_key<T: 'static>(key: impl Into<String>, init: impl FnOnce() -> T) -> Rc<T> {
    let key = key.into();
    let existing = COMPOSER.with(|c| {
        let c = c.borrow();
        let slot = c.keyed_slots.get(&key)?;
        let rc = slot.downcast_ref::<Rc<T>>();
        if rc.is_none() {
            log::warn!(
                "remember_with_key: key '{}' reused with a different type; replacing.",
                key
            );
        }
        rc.cloned()
    });
    if let Some(rc) = existing {
        return rc;
    }

    let rc: Rc<T> = Rc::new(init());
    COMPOSER.with(|c| c.borrow_mut().keyed_slots.insert(key, Box::new(rc.clone())));
    rc
}

fn watch<T: Clone + 'static>(cell: StateCell<T>) -> StateCell<T> {
    let invalidate = COMPOSER.with(|c| c.borrow().invalidate.clone());
    if let Some(invalidate) = invalidate {
        cell.subscribe(move |_| invalidate());
    }
    cell
}

/// A state cell that survives recomposition. `init` runs only when the slot
/// is first filled; the cell invalidates the composing host on change.
pub fn remember_cell<T: Clone + ShallowEq + 'static>(init: impl FnOnce() -> T) -> StateCell<T> {
    let cell = remember(|| watch(StateCell::new_with(init)));
    StateCell::clone(&cell)
}

pub fn remember_cell_with_key<T: Clone + ShallowEq + 'static>(
    key: impl Into<String>,
    init: impl FnOnce() -> T,
) -> StateCell<T> {
    let cell = remember_with_key(key, || watch(StateCell::new_with(init)));
    StateCell::clone(&cell)
}

/// Drops the ambient composer's slots.
pub fn reset_ambient_slots() {
    COMPOSER.with(|c| {
        let mut c = c.borrow_mut();
        c.slots.clear();
        c.keyed_slots.clear();
        c.cursor = 0;
    });
}
