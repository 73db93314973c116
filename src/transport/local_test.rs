use super::*;

#[test]
fn test_put_get_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let t = LocalTransport::new(dir.path());
    t.put_file("a.txt", b"hello").unwrap();
    let mut fd = t.get("a.txt").unwrap();
    let mut buf = vec![];
    fd.read_to_end(&mut buf).unwrap();
    assert_eq!(buf, b"hello");
}

#[test]
fn test_get_missing_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let t = LocalTransport::new(dir.path());
    let err = t.get("nope.txt").unwrap_err();
    assert_eq!(err.kind, crate::ErrorKind::NotFound);
}

#[test]
fn test_rename_fails_if_target_exists() {
    let dir = tempfile::tempdir().unwrap();
    let t = LocalTransport::new(dir.path());
    t.put_file("a.txt", b"a").unwrap();
    t.put_file("b.txt", b"b").unwrap();
    assert!(t.rename("a.txt", "b.txt").is_err());
}

#[test]
fn test_append_creates_then_appends() {
    let dir = tempfile::tempdir().unwrap();
    let t = LocalTransport::new(dir.path());
    t.append("log.dat", b"one").unwrap();
    t.append("log.dat", b"two").unwrap();
    let mut fd = t.get("log.dat").unwrap();
    let mut buf = vec![];
    fd.read_to_end(&mut buf).unwrap();
    assert_eq!(buf, b"onetwo");
}

#[test]
fn test_readv_batched_ranges() {
    let dir = tempfile::tempdir().unwrap();
    let t = LocalTransport::new(dir.path());
    t.put_file("data.bin", b"0123456789").unwrap();
    let out = t
        .readv(
            "data.bin",
            &[Range { offset: 0, length: 3 }, Range { offset: 7, length: 3 }],
        )
        .unwrap();
    assert_eq!(out, vec![b"012".to_vec(), b"789".to_vec()]);
}

#[test]
fn test_list_dir() {
    let dir = tempfile::tempdir().unwrap();
    let t = LocalTransport::new(dir.path());
    t.put_file("a.txt", b"a").unwrap();
    t.put_file("b.txt", b"b").unwrap();
    let mut names = t.list_dir("").unwrap();
    names.sort();
    assert_eq!(names, vec!["a.txt".to_string(), "b.txt".to_string()]);
}
