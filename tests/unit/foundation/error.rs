use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        InrError::precondition("x")
            .to_string()
            .contains("precondition failed:")
    );
    assert!(
        InrError::unsupported("x")
            .to_string()
            .contains("unsupported operation:")
    );
    assert!(InrError::path("x").to_string().contains("path error:"));
    assert!(
        InrError::format("x")
            .to_string()
            .contains("unsupported format:")
    );
    assert!(
        InrError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(InrError::encode("x").to_string().contains("encode error:"));
}

#[test]
fn decode_errors_stay_distinguishable() {
    let unreadable: InrError = MetadataDecodeError::Unreadable("bad magic".to_owned()).into();
    let missing: InrError = MetadataDecodeError::MissingBlock.into();
    assert!(unreadable.to_string().contains("unreadable"));
    assert!(missing.to_string().contains("no metadata block"));
    assert!(matches!(
        missing,
        InrError::MetadataDecode(MetadataDecodeError::MissingBlock)
    ));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = InrError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
