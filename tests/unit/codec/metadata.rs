use super::*;
use crate::OutputShape;

fn identity_only() -> Metadata {
    Metadata::identity(
        42,
        8,
        1.0,
        OutputShape::new(64, 64, 3).unwrap(),
        "cpu",
    )
}

fn decode(md: &Metadata) -> DecodedMetadata {
    Metadata::from_json(&md.to_json()).unwrap()
}

#[test]
fn identity_only_roundtrip_applies_defaults() {
    let decoded = decode(&identity_only());
    let md = &decoded.metadata;
    assert_eq!(md.seed, 42);
    assert_eq!(md.latent_dim, 8);
    assert_eq!(md.latent_scale, 1.0);
    assert_eq!((md.x_dim, md.y_dim, md.c_dim), (64, 64, 3));
    assert_eq!(md.device, "cpu");
    assert_eq!(md.z_dim, Some(64));
    assert_eq!(md.input_encoding_dim, Some(1));

    assert_eq!(md.mlp_layer_width, None);
    assert_eq!(md.conv_feature_map_size, None);
    assert_eq!(md.num_graph_nodes, None);
    assert_eq!(md.weight_init_mean, None);
    assert_eq!(md.weight_init_std, None);
    assert_eq!(md.weight_init_max, None);
    assert_eq!(md.weight_init_min, None);
    assert_eq!(md.activations, None);
    assert_eq!(md.graph, None);
    assert_eq!(md.final_activation, None);
    assert_eq!(md.weight_init, None);
    assert_eq!(md.graph_topology, None);
    assert_eq!(md.latents, None);

    // 4 ints + 4 floats + 5 strings + latents
    assert_eq!(decoded.warnings.len(), 14);
    assert!(
        decoded
            .warnings
            .iter()
            .any(|w| w.contains("mlp_layer_width"))
    );
}

#[test]
fn basic_activations_alias_to_fixed() {
    let mut md = identity_only();
    md.activations = Some("basic".to_owned());
    assert_eq!(decode(&md).metadata.activations.as_deref(), Some("fixed"));
}

#[test]
fn full_metadata_roundtrips_bit_exact() {
    let mut md = identity_only();
    md.latent_scale = 0.1 + 0.2;
    md.z_dim = Some(32);
    md.mlp_layer_width = Some(24);
    md.input_encoding_dim = Some(3);
    md.weight_init = Some("normal".to_owned());
    md.weight_init_mean = Some(-0.0123456789);
    md.weight_init_std = Some(1.0 / 3.0);
    md.activations = Some("random".to_owned());
    md.final_activation = Some("tanh".to_owned());
    md.graph_topology = Some("mlp".to_owned());
    md.latents = Some(
        LatentState::new(
            vec![0.1, -0.333_333_34, 1e-7, 7.25, f32::MIN_POSITIVE, -2.5],
            vec![1, 2, 3],
        )
        .unwrap(),
    );

    let decoded = decode(&md);
    let back = decoded.metadata;
    assert_eq!(back.latent_scale.to_bits(), md.latent_scale.to_bits());
    assert_eq!(
        back.weight_init_std.map(f64::to_bits),
        md.weight_init_std.map(f64::to_bits)
    );
    let (a, b) = (back.latents.as_ref().unwrap(), md.latents.as_ref().unwrap());
    assert_eq!(a.sample_shape(), b.sample_shape());
    for (x, y) in a.sample().iter().zip(b.sample()) {
        assert_eq!(x.to_bits(), y.to_bits());
    }
    assert_eq!(back, md);
}

#[test]
fn legacy_latent_key_is_accepted_with_warning() {
    let mut obj = identity_only().to_json();
    obj.insert("latent".into(), serde_json::json!([[0.5, -0.5]]));
    let decoded = Metadata::from_json(&obj).unwrap();
    let latents = decoded.metadata.latents.unwrap();
    assert_eq!(latents.sample(), &[0.5, -0.5]);
    assert_eq!(latents.sample_shape(), &[1, 2]);
    assert!(decoded.warnings.iter().any(|w| w.contains("legacy")));
}

#[test]
fn missing_required_field_is_malformed() {
    let mut obj = identity_only().to_json();
    obj.remove("device");
    assert!(matches!(
        Metadata::from_json(&obj),
        Err(MetadataDecodeError::Malformed(_))
    ));
}

#[test]
fn mistyped_optional_field_is_malformed() {
    let mut obj = identity_only().to_json();
    obj.insert("mlp_layer_width".into(), serde_json::json!("wide"));
    assert!(Metadata::from_json(&obj).is_err());
}

#[test]
fn integral_floats_are_accepted_for_ints() {
    let mut obj = identity_only().to_json();
    obj.insert("seed".into(), serde_json::json!(42.0));
    assert_eq!(Metadata::from_json(&obj).unwrap().metadata.seed, 42);
}

#[test]
fn ragged_latents_are_rejected() {
    assert!(latents_from_json(&serde_json::json!([[1.0, 2.0], [3.0]])).is_err());
    assert!(latents_from_json(&serde_json::json!([[1.0], 2.0])).is_err());
}
