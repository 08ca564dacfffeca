use std::cell::RefCell;

use parking_lot::Mutex;

mod private {
    pub trait Sealed {}

    impl Sealed for super::Synchronized {}
    impl Sealed for super::Unsynchronized {}
}

/// How a [`crate::PolicyCache`] guards the policy it owns.
///
/// The mode is picked once when the cache is built and fixed in its type.
pub trait Mode: private::Sealed {
    type Cell<T>;

    fn wrap<T>(value: T) -> Self::Cell<T>;

    /// Run `f` with exclusive access to the guarded value.
    fn with<T, R>(cell: &Self::Cell<T>, f: impl FnOnce(&mut T) -> R) -> R;

    fn get_mut<T>(cell: &mut Self::Cell<T>) -> &mut T;

    fn into_inner<T>(cell: Self::Cell<T>) -> T;
}

/// Every operation takes one exclusive lock for its whole duration.
///
/// Reads need the exclusive lock too, since every policy but FIFO updates its ordering on
/// `get`. This is the default, and the resulting cache is `Send + Sync` when its keys and
/// values are `Send`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Synchronized;

/// No lock at all.
///
/// The cache can still be used through `&self` on one thread, but it is not `Sync`, so
/// sharing it across threads requires the caller to add their own synchronization.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unsynchronized;

impl Mode for Synchronized {
    type Cell<T> = Mutex<T>;

    #[inline]
    fn wrap<T>(value: T) -> Mutex<T> {
        Mutex::new(value)
    }

    #[inline]
    fn with<T, R>(cell: &Mutex<T>, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut *cell.lock())
    }

    #[inline]
    fn get_mut<T>(cell: &mut Mutex<T>) -> &mut T {
        cell.get_mut()
    }

    fn into_inner<T>(cell: Mutex<T>) -> T {
        cell.into_inner()
    }
}

impl Mode for Unsynchronized {
    type Cell<T> = RefCell<T>;

    #[inline]
    fn wrap<T>(value: T) -> RefCell<T> {
        RefCell::new(value)
    }

    #[inline]
    fn with<T, R>(cell: &RefCell<T>, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut *cell.borrow_mut())
    }

    #[inline]
    fn get_mut<T>(cell: &mut RefCell<T>) -> &mut T {
        cell.get_mut()
    }

    fn into_inner<T>(cell: RefCell<T>) -> T {
        cell.into_inner()
    }
}
