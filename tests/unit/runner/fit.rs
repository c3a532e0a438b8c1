use rand::SeedableRng;
use rand::rngs::StdRng;

use super::*;
use crate::io::MemoryStore;
use crate::model::{InrConfig, MapConfig, RandomInr, TrainableInr};
use crate::runner::RunnerOpts;

fn cfg() -> InrConfig {
    InrConfig {
        shape: OutputShape::new(4, 4, 3).unwrap(),
        latent_dim: 2,
        seed: 5,
        ..InrConfig::default()
    }
}

fn runner() -> Runner<MemoryStore> {
    Runner::with_rng(
        MemoryStore::new(),
        RunnerOpts {
            output_dir: "fit".into(),
            ..RunnerOpts::default()
        },
        StdRng::seed_from_u64(0),
    )
}

fn short_opts() -> FitOpts {
    let target = Frame::new(4, 4, 3, vec![180; 48]).unwrap();
    FitOpts {
        num_epochs: 2,
        num_iters_per_epoch: 5,
        ..FitOpts::new(
            target,
            OutputShape::new(8, 8, 3).unwrap(),
            LossWeights::parse("l1=1,l2=1").unwrap(),
        )
    }
}

#[test]
fn non_trainable_model_is_rejected() {
    let mut r = runner().with_model(Box::new(RandomInr::new(cfg(), MapConfig::default()).unwrap()));
    assert!(matches!(
        r.fit(short_opts()),
        Err(InrError::UnsupportedOperation(_))
    ));
}

#[test]
fn fit_writes_checkpoints_and_returns_losses() {
    let mut r =
        runner().with_model(Box::new(TrainableInr::new(cfg(), MapConfig::default()).unwrap()));
    let report = r.fit(short_opts()).unwrap();
    assert_eq!(report.losses.len(), 2);
    assert!(report.losses.iter().all(|l| l.is_finite()));
    for name in [
        "fit/fit_0.png",
        "fit/fit_0.tif",
        "fit/fit_0_test.png",
        "fit/fit_1_test.tif",
    ] {
        assert!(r.store().get(Path::new(name)).is_some(), "{name}");
    }
    assert_eq!(report.written.len(), 8);
}

#[test]
fn target_must_match_training_shape() {
    let mut r =
        runner().with_model(Box::new(TrainableInr::new(cfg(), MapConfig::default()).unwrap()));
    let mut opts = short_opts();
    opts.target = Frame::new(2, 2, 3, vec![0; 12]).unwrap();
    assert!(matches!(r.fit(opts), Err(InrError::Precondition(_))));
}

#[test]
fn load_target_checks_size_and_writes_copy() {
    let mut store = MemoryStore::new();
    let img = Frame::new(4, 4, 3, (0..48).collect()).unwrap();
    store.insert("in/target.png", encode_preview(&img, PreviewFormat::Png).unwrap());

    let shape = OutputShape::new(4, 4, 3).unwrap();
    let frame = load_target(&mut store, Path::new("in/target.png"), Path::new("out"), shape).unwrap();
    assert_eq!(frame, img);
    assert!(store.get(Path::new("out/target.jpg")).is_some());

    let wrong = OutputShape::new(8, 4, 3).unwrap();
    assert!(load_target(&mut store, Path::new("in/target.png"), Path::new("out"), wrong).is_err());
    assert!(matches!(
        load_target(&mut store, Path::new("in/missing.png"), Path::new("out"), shape),
        Err(InrError::Path(_))
    ));
}
