use super::*;

#[test]
fn directories_are_implied_by_files() {
    let mut store = MemoryStore::new();
    store.write(Path::new("out/a/x.tif"), b"x").unwrap();
    assert!(store.is_dir(Path::new("out")));
    assert!(store.is_dir(Path::new("out/a")));
    assert!(store.is_file(Path::new("out/a/x.tif")));
    assert!(!store.is_dir(Path::new("out/a/x.tif")));
    assert!(!store.exists(Path::new("elsewhere")));
}

#[test]
fn list_archives_is_sorted_and_shallow() {
    let mut store = MemoryStore::new();
    store.insert("d/b.tif", vec![]);
    store.insert("d/a.TIFF", vec![]);
    store.insert("d/c.png", vec![]);
    store.insert("d/sub/e.tif", vec![]);
    let listed = store.list_archives(Path::new("d")).unwrap();
    assert_eq!(
        listed,
        vec![PathBuf::from("d/a.TIFF"), PathBuf::from("d/b.tif")]
    );
}

#[test]
fn read_missing_is_not_found() {
    let store = MemoryStore::new();
    let err = store.read(Path::new("nope.tif")).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}

#[test]
fn insert_does_not_count_as_write() {
    let mut store = MemoryStore::new();
    store.insert("seed.tif", vec![1]);
    assert_eq!(store.write_count(), 0);
    store.write(Path::new("out.png"), &[2]).unwrap();
    assert_eq!(store.write_count(), 1);
}

#[test]
fn videos_record_frames() {
    let mut store = MemoryStore::new();
    let frames = vec![Frame::new(2, 2, 3, vec![9; 12]).unwrap(); 3];
    store
        .write_video(Path::new("out/v.mp4"), &frames, 10)
        .unwrap();
    assert_eq!(store.videos().len(), 1);
    assert_eq!(store.videos()[0].1.len(), 3);
}
