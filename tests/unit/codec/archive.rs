use super::*;
use crate::OutputShape;
use crate::io::MemoryStore;
use crate::latent::LatentState;

fn gradient_frame(h: u32, w: u32, c: u32) -> Frame {
    let data = (0..h * w * c).map(|i| (i * 7 % 251) as u8).collect();
    Frame::new(h, w, c, data).unwrap()
}

fn sample_metadata(shape: OutputShape) -> Metadata {
    let mut md = Metadata::identity(42, 8, 1.0, shape, "cpu");
    md.device = "cpu:0 ünïcode".to_owned();
    md.final_activation = Some("sigmoid".to_owned());
    md.latents = Some(LatentState::row(vec![0.25; 8]));
    md
}

#[test]
fn rgb_archive_roundtrips_pixels_and_metadata() {
    let frame = gradient_frame(5, 7, 3);
    let md = sample_metadata(frame.shape());
    let bytes = encode_archive(&frame, Some(&md)).unwrap();
    let decoded = decode_archive(&bytes).unwrap();
    assert_eq!(decoded.frame, frame);
    assert_eq!(decoded.metadata.seed, 42);
    assert_eq!(decoded.metadata.device, md.device);
    assert_eq!(decoded.metadata.latents, md.latents);
    assert_eq!(decoded.metadata.final_activation.as_deref(), Some("sigmoid"));
}

#[test]
fn gray_archive_roundtrips() {
    let frame = gradient_frame(4, 3, 1);
    let md = sample_metadata(frame.shape());
    let decoded = decode_archive(&encode_archive(&frame, Some(&md)).unwrap()).unwrap();
    assert_eq!(decoded.frame, frame);
}

#[test]
fn archive_without_metadata_reports_missing_block() {
    let frame = gradient_frame(2, 2, 3);
    let bytes = encode_archive(&frame, None).unwrap();
    assert_eq!(
        decode_archive(&bytes).unwrap_err(),
        MetadataDecodeError::MissingBlock
    );
}

#[test]
fn garbage_bytes_are_unreadable() {
    assert!(matches!(
        decode_archive(b"definitely not a tiff"),
        Err(MetadataDecodeError::Unreadable(_))
    ));
}

#[test]
fn unsupported_channel_count_is_a_format_error() {
    let frame = Frame {
        height: 1,
        width: 1,
        channels: 4,
        data: vec![0; 4],
    };
    assert!(matches!(
        encode_archive(&frame, None),
        Err(InrError::UnsupportedFormat(_))
    ));
}

#[test]
fn load_soft_returns_none_for_missing_and_bad_files() {
    let mut store = MemoryStore::new();
    store.insert("bad.tif", b"nope".to_vec());
    assert!(load_soft(&store, Path::new("missing.tif")).is_none());
    assert!(load_soft(&store, Path::new("bad.tif")).is_none());
    assert!(matches!(
        load(&store, Path::new("missing.tif")),
        Err(MetadataDecodeError::Unreadable(_))
    ));
}

#[test]
fn load_reads_through_store() {
    let frame = gradient_frame(3, 3, 3);
    let md = sample_metadata(frame.shape());
    let mut store = MemoryStore::new();
    store.insert("a.tif", encode_archive(&frame, Some(&md)).unwrap());
    let decoded = load_soft(&store, Path::new("a.tif")).unwrap();
    assert_eq!(decoded.frame, frame);
}

#[test]
fn ascii_json_escapes_non_ascii() {
    let v = serde_json::json!({"k": "é"});
    let s = ascii_json(&v);
    assert!(s.is_ascii());
    let back: serde_json::Value = serde_json::from_str(&s).unwrap();
    assert_eq!(back, v);
}
