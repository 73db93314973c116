use super::*;
use crate::transport::local::LocalTransport;

fn sample() -> Weave {
    let mut w = Weave::new();
    w.add_version(RevId::from("v1"), vec![], vec![b"one\n".to_vec(), b"two\n".to_vec()]).unwrap();
    w.add_version(
        RevId::from("v2"),
        vec![RevId::from("v1")],
        vec![b"one\n".to_vec(), b"two-mod\n".to_vec()],
    )
    .unwrap();
    w
}

#[test]
fn test_roundtrip_in_memory() {
    let w = sample();
    let data = to_bytes(&w).unwrap();
    let back = from_bytes(&data).unwrap();
    assert_eq!(back.get_lines(&RevId::from("v1")).unwrap(), w.get_lines(&RevId::from("v1")).unwrap());
    assert_eq!(back.get_lines(&RevId::from("v2")).unwrap(), w.get_lines(&RevId::from("v2")).unwrap());
}

#[test]
fn test_roundtrip_through_transport() {
    let dir = tempfile::tempdir().unwrap();
    let transport = LocalTransport::new(dir.path());
    let w = sample();

    write_to(&transport, "history.weave", &w).unwrap();
    let back = read_from(&transport, "history.weave").unwrap();

    assert_eq!(back.versions(), w.versions());
    assert_eq!(back.get_lines(&RevId::from("v2")).unwrap(), w.get_lines(&RevId::from("v2")).unwrap());
}
