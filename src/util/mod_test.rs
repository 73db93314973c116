use super::*;

#[test]
fn test_sha1_of_lines() {
    let lines: Vec<&[u8]> = vec![b"L1\n", b"L2\n", b"L3\n"];
    let got = sha1_of_lines(lines.iter().copied());
    assert_eq!(got.len(), 40);
    // deterministic for the same input
    let again = sha1_of_lines(lines.iter().copied());
    assert_eq!(got, again);
}

#[test]
fn test_sha1_differs_on_content() {
    let a = sha1_of_lines(vec![b"L1\n".as_ref()]);
    let b = sha1_of_lines(vec![b"L2\n".as_ref()]);
    assert_ne!(a, b);
}

#[test]
fn test_atomic_publish_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("thing.dat");
    atomic::publish(path.as_os_str(), b"hello world").unwrap();
    let got = std::fs::read(&path).unwrap();
    assert_eq!(got, b"hello world");

    // republish overwrites
    atomic::publish(path.as_os_str(), b"v2").unwrap();
    let got = std::fs::read(&path).unwrap();
    assert_eq!(got, b"v2");
}
