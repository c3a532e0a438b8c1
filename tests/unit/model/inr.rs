use super::*;

fn small(seed: u64) -> RandomInr {
    let cfg = InrConfig {
        shape: OutputShape::new(6, 5, 3).unwrap(),
        latent_dim: 4,
        latent_scale: 2.0,
        seed,
        device: "cpu".to_owned(),
    };
    RandomInr::new(cfg, MapConfig::default()).unwrap()
}

#[test]
fn same_seed_same_weights_and_latents() {
    let mut a = small(7);
    let mut b = small(7);
    let ia = a.init_latent_inputs(LatentRequest::default()).unwrap();
    let ib = b.init_latent_inputs(LatentRequest::default()).unwrap();
    assert_eq!(ia.latents, ib.latents);
    let va = a.generate(&ia.latents, &ia.inputs, 1).unwrap();
    let vb = b.generate(&ib.latents, &ib.inputs, 1).unwrap();
    assert_eq!(va, vb);
    assert_eq!(va.len(), 6 * 5 * 3);
}

#[test]
fn fresh_latents_stay_within_scale() {
    let mut m = small(3);
    for _ in 0..5 {
        let li = m.init_latent_inputs(LatentRequest::default()).unwrap();
        assert_eq!(li.latents.sample_shape(), &[1, 4]);
        assert!(li.latents.sample().iter().all(|v| v.abs() <= 2.0));
        assert_eq!(li.latents, li.meta_latents);
    }
}

#[test]
fn generation_is_independent_of_splits() {
    let mut m = small(11);
    let li = m.init_latent_inputs(LatentRequest::default()).unwrap();
    let one = m.generate(&li.latents, &li.inputs, 1).unwrap();
    for splits in [2, 3, 7, 64] {
        assert_eq!(m.generate(&li.latents, &li.inputs, splits).unwrap(), one);
    }
}

#[test]
fn sigmoid_output_stays_in_unit_range() {
    let mut m = small(5);
    let li = m.init_latent_inputs(LatentRequest::default()).unwrap();
    let v = m.generate(&li.latents, &li.inputs, 1).unwrap();
    assert!(v.iter().all(|x| (0.0..=1.0).contains(x)));
}

#[test]
fn output_shape_override_changes_grid_only() {
    let mut m = small(5);
    let li = m
        .init_latent_inputs(LatentRequest {
            output_shape: Some(OutputShape::new(12, 10, 3).unwrap()),
            ..LatentRequest::default()
        })
        .unwrap();
    assert_eq!(li.inputs.points(), 120);
    assert_eq!(m.generate(&li.latents, &li.inputs, 4).unwrap().len(), 360);
    assert_eq!(m.shape(), OutputShape::new(6, 5, 3).unwrap());
}

#[test]
fn wrong_latent_width_is_rejected() {
    let mut m = small(1);
    let res = m.init_latent_inputs(LatentRequest {
        latents: Some(LatentState::row(vec![0.0; 3])),
        ..LatentRequest::default()
    });
    assert!(matches!(res, Err(InrError::Precondition(_))));
}

#[test]
fn non_mlp_topology_is_unsupported() {
    let map = MapConfig {
        graph_topology: "WS".to_owned(),
        ..MapConfig::default()
    };
    assert!(matches!(
        RandomInr::new(InrConfig::default(), map),
        Err(InrError::UnsupportedOperation(_))
    ));
}

#[test]
fn metadata_rebuilds_an_identical_model() {
    let map = MapConfig {
        activations: ActivationMode::Random,
        final_activation: FinalActivation::Tanh,
        input_encoding_dim: 3,
        weight_init: WeightInit::Uniform { min: -2.0, max: 2.0 },
        ..MapConfig::default()
    };
    let cfg = InrConfig {
        shape: OutputShape::new(4, 4, 1).unwrap(),
        latent_dim: 3,
        seed: 99,
        ..InrConfig::default()
    };
    let shape = cfg.shape;
    let mut a = RandomInr::new(cfg, map).unwrap();
    let li = a.init_latent_inputs(LatentRequest::default()).unwrap();
    let md = a.metadata(&li.meta_latents);
    assert_eq!(md.activations.as_deref(), Some("random"));
    assert_eq!(md.latents.as_ref(), Some(&li.meta_latents));

    let mut b = InrFactory.build(&md, shape).unwrap();
    let lb = b
        .init_latent_inputs(LatentRequest {
            latents: md.latents.clone(),
            ..LatentRequest::default()
        })
        .unwrap();
    assert_eq!(
        a.generate(&li.latents, &li.inputs, 1).unwrap(),
        b.generate(&lb.latents, &lb.inputs, 2).unwrap()
    );
}

#[test]
fn random_inr_is_not_trainable() {
    let mut m = small(1);
    assert!(m.as_trainable().is_none());
}
