use docstore::doc;
use docstore::errors::ErrorKind;
use docstore::filter::all;
use docstore_int_test::test_util::{cleanup, create_test_context, open_store, run_test};

#[test]
fn test_second_instance_is_locked_out() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            store.insert("departments", doc! { "_id": "D1" })?;

            let err = open_store(ctx.path()).err().unwrap();
            assert_eq!(err.kind(), &ErrorKind::StoreLocked);

            // the refused open leaves the live instance untouched
            store.insert("departments", doc! { "_id": "D2" })?;
            assert_eq!(store.count("departments", &all())?, 2);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_lock_is_released_on_close() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.store();
            store.insert("departments", doc! { "_id": "D1" })?;
            store.close()?;
            assert!(store.is_closed());

            let reopened = open_store(ctx.path())?;
            assert_eq!(reopened.count("departments", &all())?, 1);
            assert_eq!(open_store(ctx.path()).err().unwrap().kind(), &ErrorKind::StoreLocked);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_lock_is_released_when_last_handle_drops() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.store().close()?;
            {
                let first = open_store(ctx.path())?;
                let second = first.clone();
                drop(first);
                assert!(!second.is_closed());
                assert_eq!(open_store(ctx.path()).err().unwrap().kind(), &ErrorKind::StoreLocked);
            }
            let reopened = open_store(ctx.path())?;
            assert!(!reopened.is_closed());
            Ok(())
        },
        cleanup,
    )
}
