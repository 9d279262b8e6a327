use super::*;

#[test]
fn put_list_fetch_delete() {
    let store = MemoryBlobStore::new();
    let a = store.put("settings/a", b"A", "image/png").unwrap();
    store.put("settings/b", b"B", "image/jpeg").unwrap();
    store.put("other/c", b"C", "text/plain").unwrap();

    let listed = store.list("settings/").unwrap();
    let keys: Vec<_> = listed.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, ["settings/a", "settings/b"]);

    let blob = store.fetch(&a.url).unwrap();
    assert_eq!(blob.bytes, b"A");
    assert_eq!(blob.content_type, "image/png");

    store.delete(&a.url).unwrap();
    assert!(store.fetch(&a.url).is_err());
    assert_eq!(store.len(), 2);

    // deleting twice is fine
    store.delete(&a.url).unwrap();
}

#[test]
fn put_overwrites_same_key() {
    let store = MemoryBlobStore::new();
    store.put("k", b"1", "a/b").unwrap();
    let e = store.put("./k", b"2", "a/b").unwrap();
    assert_eq!(e.key, "k");
    assert_eq!(store.fetch(&e.url).unwrap().bytes, b"2");
    assert_eq!(store.len(), 1);
}

#[test]
fn foreign_urls_are_rejected() {
    let store = MemoryBlobStore::new();
    assert!(store.fetch("http://elsewhere/k").is_err());
    assert!(store.delete("http://elsewhere/k").is_err());
}
