use core::borrow;
use core::cell::Cell;
use core::fmt;
use core::isize;
use core::marker::PhantomData;
use core::mem;
use core::ops::{Deref, Drop};
use core::ptr::{self, NonNull};
use std::process;
use tracing::{event, Level};

const MAX_REFCOUNT: usize = (isize::MAX) as usize;

// Lives in its own allocation, apart from the resource. Every handle aliasing
// a resource points at the same one; an empty handle owns a private one at 0.
type Counter = Cell<usize>;

/// Single-threaded shared ownership of one boxed `T`, or of nothing.
///
/// The resource is dropped exactly once, by whichever handle gives up the
/// last claim on it. The counter allocation goes with it. Handles are neither
/// `Send` nor `Sync`: the count is a plain cell.
pub struct SharedHandle<T> {
    resource: Option<NonNull<T>>,
    counter: NonNull<Counter>,
    phantom: PhantomData<T>,
}

#[inline]
fn alloc_counter(count: usize) -> NonNull<Counter> {
    Box::leak(Box::new(Cell::new(count))).into()
}

#[inline]
unsafe fn drop_ref<T>(resource: Option<NonNull<T>>, counter: NonNull<Counter>) {
    let count = (*counter.as_ptr()).get();
    if count > 1 {
        (*counter.as_ptr()).set(count - 1);
        event!(Level::TRACE, remaining = count - 1, "more than one ref, no need to drop");
        return;
    }
    drop_slow(resource, counter)
}

// count is 1 (last owner) or 0 (empty handle, resource is None)
#[inline(never)]
unsafe fn drop_slow<T>(resource: Option<NonNull<T>>, counter: NonNull<Counter>) {
    // counter first, so a panicking destructor in T can't leak it
    drop(Box::from_raw(counter.as_ptr()));
    event!(Level::TRACE, "counter freed");
    if let Some(resource) = resource {
        event!(Level::TRACE, "last ref so have to drop the resource");
        drop(Box::from_raw(resource.as_ptr()));
    }
}

impl<T> SharedHandle<T> {
    /// A handle that owns nothing. `use_count()` is 0.
    #[inline]
    pub fn empty() -> SharedHandle<T> {
        SharedHandle {
            resource: None,
            counter: alloc_counter(0),
            phantom: PhantomData,
        }
    }

    #[inline]
    pub fn new(data: T) -> SharedHandle<T> {
        SharedHandle::from_box(Some(Box::new(data)))
    }

    /// Takes over `resource` with a fresh count of 1, or gives an empty
    /// handle when there is nothing to take.
    pub fn from_box(resource: Option<Box<T>>) -> SharedHandle<T> {
        SharedHandle::bind(resource.map(|data| NonNull::from(Box::leak(data))))
    }

    /// Takes over a raw resource pointer. A null pointer gives an empty handle.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or come from [`Box::into_raw`], and no other owner
    /// may free it or hand it to another `SharedHandle::from_raw`.
    pub unsafe fn from_raw(ptr: *mut T) -> SharedHandle<T> {
        SharedHandle::bind(NonNull::new(ptr))
    }

    fn bind(resource: Option<NonNull<T>>) -> SharedHandle<T> {
        let count = if resource.is_some() { 1 } else { 0 };
        SharedHandle {
            resource,
            counter: alloc_counter(count),
            phantom: PhantomData,
        }
    }

    #[inline]
    fn count(&self) -> &Counter {
        // SAFETY: every live handle holds a claim on its counter
        unsafe { self.counter.as_ref() }
    }

    /// Number of handles sharing this resource, 0 for an empty handle.
    pub fn use_count(&self) -> usize {
        self.count().get()
    }

    pub fn is_some(&self) -> bool {
        self.resource.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.resource.is_none()
    }

    pub fn get(&self) -> Option<&T> {
        self.resource.map(|ptr| unsafe { &*ptr.as_ptr() })
    }

    /// Mutable access, only while this is the one handle owning the resource.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        if self.use_count() != 1 {
            return None;
        }
        self.resource.map(|ptr| unsafe { &mut *ptr.as_ptr() })
    }

    /// Raw pointer to the resource, null when empty.
    pub fn as_ptr(&self) -> *const T {
        self.resource
            .map_or(ptr::null(), |ptr| ptr.as_ptr() as *const T)
    }

    /// True if both handles own the same resource.
    pub fn ptr_eq(&self, other: &SharedHandle<T>) -> bool {
        self.resource.is_some() && self.resource == other.resource
    }

    /// Drops this handle's claim and leaves it empty.
    #[inline]
    pub fn reset(&mut self) {
        self.reset_boxed(None)
    }

    #[inline]
    pub fn reset_to(&mut self, data: T) {
        self.reset_boxed(Some(Box::new(data)))
    }

    /// Drops this handle's claim, then owns `resource` alone (count 1), or
    /// nothing (count 0).
    pub fn reset_boxed(&mut self, resource: Option<Box<T>>) {
        event!(Level::TRACE, with_resource = resource.is_some(), "reset");
        // self is rebound before the old claim goes, so it stays valid even
        // if the old resource panics on drop
        drop(mem::replace(self, SharedHandle::from_box(resource)));
    }

    /// Like [`reset_boxed`](Self::reset_boxed), from a raw pointer. Null
    /// leaves the handle empty.
    ///
    /// # Safety
    ///
    /// Same contract as [`from_raw`](Self::from_raw).
    pub unsafe fn reset_raw(&mut self, ptr: *mut T) {
        event!(Level::TRACE, with_resource = !ptr.is_null(), "reset");
        drop(mem::replace(self, SharedHandle::from_raw(ptr)));
    }

    /// Exchanges resource and counter with `other`. Counts don't change.
    #[inline]
    pub fn swap(&mut self, other: &mut SharedHandle<T>) {
        mem::swap(&mut self.resource, &mut other.resource);
        mem::swap(&mut self.counter, &mut other.counter);
    }
}

pub fn swap<T>(lhs: &mut SharedHandle<T>, rhs: &mut SharedHandle<T>) {
    lhs.swap(rhs)
}

impl<T> Clone for SharedHandle<T> {
    #[inline]
    fn clone(&self) -> Self {
        if self.resource.is_none() {
            // empty handles never share a counter
            return SharedHandle::empty();
        }
        let old_size = self.count().get();
        if old_size > MAX_REFCOUNT {
            process::abort();
        }
        self.count().set(old_size + 1);
        SharedHandle {
            resource: self.resource,
            counter: self.counter,
            phantom: PhantomData,
        }
    }

    /// Assignment: `self` ends up sharing `source`'s resource, or empty.
    fn clone_from(&mut self, source: &Self) {
        if self.counter == source.counter {
            // same binding, releasing first would free what we're about to alias
            return;
        }
        drop(mem::replace(self, source.clone()));
    }
}

impl<T> Drop for SharedHandle<T> {
    fn drop(&mut self) {
        unsafe { drop_ref(self.resource, self.counter) };
    }
}

impl<T> Deref for SharedHandle<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        match self.get() {
            Some(data) => data,
            None => panic!("dereferenced an empty SharedHandle"),
        }
    }
}

impl<T> borrow::Borrow<T> for SharedHandle<T> {
    fn borrow(&self) -> &T {
        &**self
    }
}

impl<T> AsRef<T> for SharedHandle<T> {
    fn as_ref(&self) -> &T {
        &**self
    }
}

impl<T> Default for SharedHandle<T> {
    fn default() -> Self {
        SharedHandle::empty()
    }
}

impl<T> From<Box<T>> for SharedHandle<T> {
    fn from(data: Box<T>) -> Self {
        SharedHandle::from_box(Some(data))
    }
}

impl<T: fmt::Debug> fmt::Debug for SharedHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedHandle")
            .field("ptr", &self.as_ptr())
            .field("count", &self.use_count())
            .field("data", &self.get())
            .finish()
    }
}
