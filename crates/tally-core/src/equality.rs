//! Change detection for commits.
//!
//! A commit notifies observers only when the new value differs from the
//! pre-batch value. The default check is *shallow*: plain values compare by
//! value, shared handles (`Rc`, `Arc`) compare by pointer. A value rebuilt
//! with equal contents behind a fresh `Rc` therefore counts as a change.
//! Cells holding large structures can opt into a structural `PartialEq`
//! comparison with [`StateCell::structural`](crate::StateCell::structural).

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// Cheap identity-style equality.
pub trait ShallowEq {
    fn shallow_eq(&self, other: &Self) -> bool;
}

macro_rules! shallow_by_value {
    ($($t:ty),* $(,)?) => {
        $(
            impl ShallowEq for $t {
                #[inline]
                fn shallow_eq(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

shallow_by_value!(
    (),
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    String,
    &'static str,
);

impl<T: ?Sized> ShallowEq for Rc<T> {
    fn shallow_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }
}

impl<T: ?Sized> ShallowEq for Arc<T> {
    fn shallow_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

impl<T: ShallowEq> ShallowEq for Option<T> {
    fn shallow_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.shallow_eq(b),
            (None, None) => true,
            _ => false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EqualityKind {
    Shallow,
    Structural,
    Never,
}

/// The comparison a cell runs at commit time.
pub struct Equality<T> {
    kind: EqualityKind,
    same: fn(&T, &T) -> bool,
}

impl<T> Clone for Equality<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Equality<T> {}

impl<T> fmt::Debug for Equality<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Equality::{:?}", self.kind)
    }
}

impl<T: ShallowEq> Equality<T> {
    pub fn shallow() -> Self {
        Self {
            kind: EqualityKind::Shallow,
            same: <T as ShallowEq>::shallow_eq,
        }
    }
}

impl<T: PartialEq> Equality<T> {
    pub fn structural() -> Self {
        Self {
            kind: EqualityKind::Structural,
            same: <T as PartialEq>::eq,
        }
    }
}

impl<T> Equality<T> {
    /// Every commit counts as a change.
    pub fn never() -> Self {
        Self {
            kind: EqualityKind::Never,
            same: |_, _| false,
        }
    }

    pub fn kind(&self) -> EqualityKind {
        self.kind
    }

    #[inline]
    pub fn same(&self, a: &T, b: &T) -> bool {
        (self.same)(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rc_compares_by_pointer() {
        let a = Rc::new(vec![1, 2, 3]);
        let b = Rc::new(vec![1, 2, 3]);
        let eq = Equality::<Rc<Vec<i32>>>::shallow();
        assert!(eq.same(&a, &a.clone()));
        assert!(!eq.same(&a, &b));

        let deep = Equality::<Rc<Vec<i32>>>::structural();
        assert!(deep.same(&a, &b));
    }

    #[test]
    fn never_reports_change() {
        let eq = Equality::<i32>::never();
        assert!(!eq.same(&1, &1));
        assert_eq!(eq.kind(), EqualityKind::Never);
    }
}
