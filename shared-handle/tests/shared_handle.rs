#[cfg(test)]
mod tests {
    use shared_handle::{swap, SharedHandle};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use tracing::{event, instrument, Level};
    use tracing_subscriber;

    const TEST_LEVEL: Level = Level::TRACE;

    type DropLog = Rc<RefCell<Vec<i32>>>;

    #[derive(Debug)]
    struct DropTest {
        value: Cell<i32>,
        log: DropLog,
    }

    impl DropTest {
        fn new(value: i32, log: &DropLog) -> DropTest {
            DropTest {
                value: Cell::new(value),
                log: log.clone(),
            }
        }
    }

    impl Drop for DropTest {
        #[instrument(skip(self))]
        fn drop(&mut self) {
            event!(Level::TRACE, value = self.value.get(), "dropping test");
            self.log.borrow_mut().push(self.value.get());
        }
    }

    fn trace() {
        let _ = tracing_subscriber::fmt()
            .with_max_level(TEST_LEVEL)
            .with_test_writer()
            .try_init();
    }

    fn new_log() -> DropLog {
        Rc::new(RefCell::new(Vec::new()))
    }

    #[test]
    fn sole_owner_drops_once() {
        trace();
        let log = new_log();
        {
            let v = SharedHandle::new(DropTest::new(1, &log));
            assert_eq!(v.use_count(), 1);
            assert!(v.is_some());
            v.value.set(10);
            assert_eq!(v.value.get(), 10);
        }
        assert_eq!(*log.borrow(), vec![10]);
    }

    #[test]
    fn copies_share_count() {
        trace();
        let log = new_log();
        {
            let v = SharedHandle::new(DropTest::new(3, &log));
            {
                let v2 = v.clone();
                assert_eq!(v.use_count(), 2);
                assert_eq!(v2.use_count(), 2);
                assert!(v.ptr_eq(&v2));
                v2.value.set(30);
                assert_eq!(v.value.get(), 30);
                let v3 = v2.clone();
                assert_eq!(v3.use_count(), 3);
            }
            assert_eq!(v.use_count(), 1);
            assert!(log.borrow().is_empty());
        }
        assert_eq!(*log.borrow(), vec![30]);
    }

    #[test]
    fn reset_drops_sole_owned() {
        trace();
        let log = new_log();
        let mut v = SharedHandle::new(DropTest::new(5, &log));
        v.reset_to(DropTest::new(50, &log));
        assert_eq!(*log.borrow(), vec![5]);
        assert_eq!(v.value.get(), 50);
        assert_eq!(v.use_count(), 1);

        v.reset();
        assert_eq!(*log.borrow(), vec![5, 50]);
        assert!(v.is_empty());
        assert!(!v.is_some());
        assert_eq!(v.use_count(), 0);
        assert!(v.as_ptr().is_null());
    }

    #[test]
    fn reset_keeps_shared_alive() {
        trace();
        let log = new_log();
        let mut v = SharedHandle::new(DropTest::new(5, &log));
        let v2 = v.clone();
        v.reset_boxed(Some(Box::new(DropTest::new(6, &log))));
        assert!(log.borrow().is_empty());
        assert_eq!(v.use_count(), 1);
        assert_eq!(v2.use_count(), 1);
        assert_eq!(v2.value.get(), 5);
        drop(v2);
        assert_eq!(*log.borrow(), vec![5]);
    }

    #[test]
    fn reset_empty_handle() {
        let mut v = SharedHandle::<i32>::empty();
        v.reset();
        assert_eq!(v.use_count(), 0);
        v.reset_to(4);
        assert_eq!(v.use_count(), 1);
        assert_eq!(*v, 4);
    }

    #[test]
    fn swap_exchanges_bindings() {
        trace();
        let log = new_log();
        {
            let mut a = SharedHandle::new(DropTest::new(9, &log));
            let mut b = SharedHandle::new(DropTest::new(10, &log));
            let b2 = b.clone();
            swap(&mut a, &mut b);
            assert_eq!(a.value.get(), 10);
            assert_eq!(b.value.get(), 9);
            assert_eq!(a.use_count(), 2);
            assert_eq!(b.use_count(), 1);
            assert!(a.ptr_eq(&b2));
            b.swap(&mut a);
            assert_eq!(a.value.get(), 9);
            assert_eq!(b.value.get(), 10);
            assert!(log.borrow().is_empty());
        }
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn swap_with_empty() {
        let mut a = SharedHandle::new(1);
        let mut b = SharedHandle::empty();
        a.swap(&mut b);
        assert!(a.is_empty());
        assert_eq!(a.use_count(), 0);
        assert_eq!(*b, 1);
        assert_eq!(b.use_count(), 1);
    }

    #[test]
    fn assign_drops_overwritten() {
        trace();
        let log = new_log();
        let mut a = SharedHandle::new(DropTest::new(13, &log));
        let b = SharedHandle::new(DropTest::new(14, &log));
        a.clone_from(&b);
        assert_eq!(*log.borrow(), vec![13]);
        assert_eq!(a.use_count(), 2);
        assert_eq!(b.use_count(), 2);
        assert_eq!(a.value.get(), 14);
        drop(a);
        drop(b);
        assert_eq!(*log.borrow(), vec![13, 14]);
    }

    #[test]
    fn self_assign_is_noop() {
        trace();
        let log = new_log();
        let mut v = SharedHandle::new(DropTest::new(16, &log));
        let alias = v.clone();
        v.clone_from(&alias);
        assert_eq!(v.use_count(), 2);
        drop(alias);
        let copy = v.clone();
        v.clone_from(&copy);
        drop(copy);
        assert_eq!(v.use_count(), 1);
        assert_eq!(v.value.get(), 16);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn assign_empty_over_sole_owner() {
        trace();
        let log = new_log();
        let mut v = SharedHandle::new(DropTest::new(2, &log));
        let null = SharedHandle::from_box(None);
        v.clone_from(&null);
        assert_eq!(*log.borrow(), vec![2]);
        assert!(v.is_empty());
        assert_eq!(v.use_count(), 0);
        assert_eq!(null.use_count(), 0);
    }

    #[test]
    fn assign_owned_over_empty() {
        let mut v = SharedHandle::<i32>::from_box(None);
        let owned = SharedHandle::new(6);
        v.clone_from(&owned);
        assert_eq!(v.use_count(), 2);
        assert_eq!(owned.use_count(), 2);
        assert_eq!(v.get(), Some(&6));
    }

    #[test]
    fn assign_empty_over_empty() {
        let mut a = SharedHandle::<i32>::empty();
        let b = SharedHandle::<i32>::default();
        a.clone_from(&b);
        assert_eq!(a.use_count(), 0);
        assert_eq!(b.use_count(), 0);
        assert!(a.get().is_none());
    }

    #[test]
    fn null_construct_and_copy() {
        let v = unsafe { SharedHandle::<i32>::from_raw(std::ptr::null_mut()) };
        assert_eq!(v.use_count(), 0);
        assert!(v.is_empty());
        let v2 = v.clone();
        assert_eq!(v.use_count(), 0);
        assert_eq!(v2.use_count(), 0);
    }

    #[test]
    fn from_raw_takes_ownership() {
        let log = new_log();
        let raw = Box::into_raw(Box::new(DropTest::new(8, &log)));
        let v = unsafe { SharedHandle::from_raw(raw) };
        assert_eq!(v.use_count(), 1);
        assert_eq!(v.as_ptr(), raw as *const DropTest);
        drop(v);
        assert_eq!(*log.borrow(), vec![8]);
    }

    #[test]
    fn reset_raw_takes_ownership() {
        trace();
        let log = new_log();
        let mut v = SharedHandle::new(DropTest::new(5, &log));
        let raw = Box::into_raw(Box::new(DropTest::new(60, &log)));
        unsafe { v.reset_raw(raw) };
        assert_eq!(*log.borrow(), vec![5]);
        assert_eq!(v.use_count(), 1);
        assert_eq!(v.as_ptr(), raw as *const DropTest);
        unsafe { v.reset_raw(std::ptr::null_mut()) };
        assert_eq!(*log.borrow(), vec![5, 60]);
        assert!(v.is_empty());
        assert_eq!(v.use_count(), 0);
    }

    #[test]
    fn get_mut_only_when_unique() {
        let mut v = SharedHandle::new(1);
        *v.get_mut().unwrap() = 2;
        let v2 = v.clone();
        assert!(v.get_mut().is_none());
        drop(v2);
        assert_eq!(v.get_mut(), Some(&mut 2));
        let mut e = SharedHandle::<i32>::empty();
        assert!(e.get_mut().is_none());
    }

    #[test]
    #[should_panic(expected = "empty SharedHandle")]
    fn deref_empty_panics() {
        let v = SharedHandle::<i32>::empty();
        assert_eq!(*v, 0);
    }

    #[test]
    fn end_to_end() {
        trace();
        let log = new_log();
        {
            let mut a = SharedHandle::new(DropTest::new(5, &log));
            assert_eq!(a.use_count(), 1);
            {
                let b = a.clone();
                assert_eq!(a.use_count(), 2);
                assert_eq!(b.use_count(), 2);
            }
            assert_eq!(a.use_count(), 1);
            a.reset_to(DropTest::new(50, &log));
            assert_eq!(*log.borrow(), vec![5]);
            assert_eq!(a.use_count(), 1);
            a.reset();
            assert_eq!(*log.borrow(), vec![5, 50]);
            assert_eq!(a.use_count(), 0);
            assert!(!a.is_some());
        }
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn debug_shows_count() {
        let v = SharedHandle::new(3);
        let _v2 = v.clone();
        let out = format!("{:?}", v);
        assert!(out.contains("count: 2"));
        assert!(out.contains("Some(3)"));
    }
}
