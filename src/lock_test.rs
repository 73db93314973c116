use super::*;

#[test]
fn test_nested_write_lock_same_handle() {
    let dir = tempfile::tempdir().unwrap();
    let path: ffi::OsString = dir.path().join("lock").into();
    let table = LockTable::new();
    let g1 = table.lock_write(&path).unwrap();
    let g2 = table.lock_write(&path).unwrap(); // nested, same handle
    drop(g2);
    drop(g1);
}

#[test]
fn test_exclusive_across_handles() {
    let dir = tempfile::tempdir().unwrap();
    let path: ffi::OsString = dir.path().join("lock").into();
    let a = LockTable::new();
    let b = LockTable::new();
    let _guard = a.lock_write(&path).unwrap();
    assert!(b.lock_write(&path).is_err());
}

#[test]
fn test_write_then_read_same_handle_is_implicit() {
    let dir = tempfile::tempdir().unwrap();
    let path: ffi::OsString = dir.path().join("lock").into();
    let table = LockTable::new();
    let _w = table.lock_write(&path).unwrap();
    let _r = table.lock_read(&path).unwrap();
}
