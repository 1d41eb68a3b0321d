use core::mem;
use core::ops::Deref;
use shared_handle::SharedHandle;
use std::rc::Rc;

/// The operations both shared pointers expose to the scenarios. Assignment
/// is `Clone::clone_from`.
pub trait SharedPointer<T>: Clone + Deref<Target = T> {
    const NAME: &'static str;

    fn new(data: T) -> Self;
    fn null() -> Self;
    fn use_count(&self) -> usize;
    fn is_some(&self) -> bool;
    fn reset(&mut self);
    fn reset_to(&mut self, data: T);
    fn swap(&mut self, other: &mut Self);
}

impl<T> SharedPointer<T> for SharedHandle<T> {
    const NAME: &'static str = "SharedHandle";

    fn new(data: T) -> Self {
        SharedHandle::new(data)
    }

    fn null() -> Self {
        SharedHandle::from_box(None)
    }

    fn use_count(&self) -> usize {
        SharedHandle::use_count(self)
    }

    fn is_some(&self) -> bool {
        SharedHandle::is_some(self)
    }

    fn reset(&mut self) {
        SharedHandle::reset(self)
    }

    fn reset_to(&mut self, data: T) {
        SharedHandle::reset_to(self, data)
    }

    fn swap(&mut self, other: &mut Self) {
        SharedHandle::swap(self, other)
    }
}

/// `Rc` with a null state, counted the way the standard shared pointers
/// count: a null pointer reports 0.
pub struct StdShared<T>(Option<Rc<T>>);

impl<T> Clone for StdShared<T> {
    fn clone(&self) -> Self {
        StdShared(self.0.clone())
    }

    fn clone_from(&mut self, source: &Self) {
        self.0.clone_from(&source.0)
    }
}

impl<T> Deref for StdShared<T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self.0 {
            Some(ref data) => data,
            None => panic!("dereferenced an empty StdShared"),
        }
    }
}

impl<T> SharedPointer<T> for StdShared<T> {
    const NAME: &'static str = "Rc";

    fn new(data: T) -> Self {
        StdShared(Some(Rc::new(data)))
    }

    fn null() -> Self {
        StdShared(None)
    }

    fn use_count(&self) -> usize {
        self.0.as_ref().map_or(0, Rc::strong_count)
    }

    fn is_some(&self) -> bool {
        self.0.is_some()
    }

    fn reset(&mut self) {
        self.0 = None;
    }

    fn reset_to(&mut self, data: T) {
        self.0 = Some(Rc::new(data));
    }

    fn swap(&mut self, other: &mut Self) {
        mem::swap(&mut self.0, &mut other.0)
    }
}
