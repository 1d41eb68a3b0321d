use std::cell::Cell;
use tracing::{event, Level};

thread_local! {
    static LIVE: Cell<isize> = Cell::new(0);
}

/// Test resource that counts its live instances on the current thread.
#[derive(Debug)]
pub struct Tracked {
    value: Cell<i32>,
}

impl Tracked {
    pub fn new(value: i32) -> Tracked {
        LIVE.with(|live| live.set(live.get() + 1));
        event!(Level::TRACE, value, "Tracked constructed");
        Tracked {
            value: Cell::new(value),
        }
    }

    pub fn value(&self) -> i32 {
        self.value.get()
    }

    pub fn set_value(&self, value: i32) {
        self.value.set(value)
    }

    /// Instances constructed and not yet dropped on this thread.
    pub fn live() -> isize {
        LIVE.with(|live| live.get())
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        LIVE.with(|live| live.set(live.get() - 1));
        event!(Level::TRACE, value = self.value.get(), "Tracked dropped");
    }
}
