use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use rand::SeedableRng;
use rand::rngs::StdRng;

use super::*;
use crate::codec::{Colormap, decode_archive};
use crate::foundation::core::OutputShape;
use crate::io::MemoryStore;
use crate::model::{CoordGrid, FinalActivation, Generative, LatentInputs};
use crate::runner::RunnerOpts;

/// Sample `i` renders a frame spanning `levels[i]`.
struct Scripted {
    shape: OutputShape,
    levels: Vec<(u8, u8)>,
    calls: usize,
    seen: Rc<RefCell<Vec<(Zoom, Pan)>>>,
    act: FinalActivation,
}

impl Scripted {
    fn new(levels: Vec<(u8, u8)>) -> Self {
        Self {
            shape: OutputShape::new(2, 3, 3).unwrap(),
            levels,
            calls: 0,
            seen: Rc::default(),
            act: FinalActivation::Sigmoid,
        }
    }
}

fn level(b: u8) -> f32 {
    (f32::from(b) + 0.5) / 255.0
}

impl Generative for Scripted {
    fn shape(&self) -> OutputShape {
        self.shape
    }
    fn latent_dim(&self) -> usize {
        1
    }
    fn latent_scale(&self) -> f64 {
        1.0
    }
    fn seed(&self) -> u64 {
        7
    }
    fn final_activation(&self) -> &FinalActivation {
        &self.act
    }

    fn init_latent_inputs(&mut self, req: LatentRequest) -> InrResult<LatentInputs> {
        self.seen.borrow_mut().push((req.zoom, req.pan));
        let latents = LatentState::row(vec![self.calls as f32]);
        self.calls += 1;
        let shape = req.output_shape.unwrap_or(self.shape);
        Ok(LatentInputs {
            meta_latents: latents.clone(),
            latents,
            inputs: CoordGrid::new(shape, 1, vec![0.0; shape.points()])?,
        })
    }

    fn generate(
        &self,
        latents: &LatentState,
        inputs: &CoordGrid,
        _splits: usize,
    ) -> InrResult<Vec<f32>> {
        let (lo, hi) = self.levels[latents.sample()[0] as usize];
        let n = inputs.points() * self.shape.c_dim as usize;
        let mut v = vec![level(hi); n];
        v[0] = level(lo);
        Ok(v)
    }

    fn metadata(&self, meta_latents: &LatentState) -> Metadata {
        let mut md = Metadata::identity(7, 1, 1.0, self.shape, "cpu".to_owned());
        md.latents = Some(meta_latents.clone());
        md
    }
}

fn runner(model: Scripted, opts: RunnerOpts) -> Runner<MemoryStore> {
    Runner::with_rng(MemoryStore::new(), opts, StdRng::seed_from_u64(1)).with_model(Box::new(model))
}

fn opts() -> RunnerOpts {
    RunnerOpts {
        output_dir: "out".into(),
        ..RunnerOpts::default()
    }
}

#[test]
fn blank_frames_are_dropped_from_both_lists() {
    let mut r = runner(Scripted::new(vec![(0, 255), (200, 205), (10, 90)]), opts());
    let out = r
        .run_frames(RunFramesOpts {
            num_samples: 3,
            ..RunFramesOpts::default()
        })
        .unwrap();
    assert_eq!(out.frames.len(), 2);
    assert_eq!(out.metadata.len(), 2);
    assert_eq!(out.rejected, 1);
    assert_eq!(out.frames[1].value_span(), 80);
    assert_eq!(
        out.metadata[1].latents.as_ref().map(|l| l.sample().to_vec()),
        Some(vec![2.0])
    );

    let prefix = format!("out/gen_image_{}", out.run_id);
    let store = r.store();
    assert!(store.get(Path::new(&format!("{prefix}_0.png"))).is_some());
    assert!(store.get(Path::new(&format!("{prefix}_1.png"))).is_none());
    assert!(store.get(Path::new(&format!("{prefix}_2.tif"))).is_some());
    assert_eq!(out.written.len(), 4);
}

#[test]
fn archives_embed_the_frame_metadata() {
    let mut r = runner(Scripted::new(vec![(0, 255)]), opts());
    let out = r.run_frames(RunFramesOpts::default()).unwrap();
    let path = format!("out/gen_image_{}_0.tif", out.run_id);
    let bytes = r.store().get(Path::new(&path)).unwrap();
    let decoded = decode_archive(bytes).unwrap();
    assert_eq!(decoded.metadata.seed, 7);
    assert_eq!(decoded.metadata.latents, out.metadata[0].latents);
    assert_eq!(decoded.metadata.z_dim, Some(2));
    assert_eq!(decoded.frame, out.frames[0]);
}

#[test]
fn rejection_can_be_disabled() {
    let mut r = runner(
        Scripted::new(vec![(200, 205)]),
        RunnerOpts {
            skip_blank_generations: false,
            ..opts()
        },
    );
    let out = r
        .run_frames(RunFramesOpts {
            autosave: false,
            ..RunFramesOpts::default()
        })
        .unwrap();
    assert_eq!(out.frames.len(), 1);
    assert_eq!(r.store().write_count(), 0);
}

#[test]
fn unbound_runner_is_a_precondition_error() {
    let mut r = Runner::with_rng(MemoryStore::new(), opts(), StdRng::seed_from_u64(0));
    assert!(matches!(
        r.run_frames(RunFramesOpts::default()),
        Err(InrError::Precondition(_))
    ));
}

#[test]
fn schedules_are_followed_per_sample() {
    let model = Scripted::new(vec![(0, 255), (0, 255)]);
    let seen = model.seen.clone();
    let mut r = runner(model, opts());
    r.run_frames(RunFramesOpts {
        num_samples: 2,
        zoom_schedule: Some(vec![Zoom(1.0, 1.0), Zoom(2.0, 3.0)]),
        autosave: false,
        ..RunFramesOpts::default()
    })
    .unwrap();
    let seen = seen.borrow();
    assert_eq!(seen[0], (Zoom(1.0, 1.0), Pan::default()));
    assert_eq!(seen[1], (Zoom(2.0, 3.0), Pan(2.0, 2.0)));
}

#[test]
fn short_schedule_is_rejected() {
    let mut r = runner(Scripted::new(vec![(0, 255); 3]), opts());
    let res = r.run_frames(RunFramesOpts {
        num_samples: 3,
        pan_schedule: Some(vec![Pan(0.0, 0.0)]),
        ..RunFramesOpts::default()
    });
    assert!(matches!(res, Err(InrError::Precondition(_))));
}

#[test]
fn injected_rng_fixes_the_run_id() {
    let a = runner(Scripted::new(vec![(0, 255)]), opts())
        .run_frames(RunFramesOpts::default())
        .unwrap()
        .run_id;
    let b = runner(Scripted::new(vec![(0, 255)]), opts())
        .run_frames(RunFramesOpts::default())
        .unwrap()
        .run_id;
    assert_eq!(a, b);
    assert!(a < RUN_ID_BOUND);
}

#[test]
fn verbose_names_and_colormap_fan_out() {
    let mut r = runner(
        Scripted::new(vec![(0, 255)]),
        RunnerOpts {
            save_verbose: true,
            colormaps: vec![Colormap::Gray],
            ..opts()
        },
    );
    let out = r.run_frames(RunFramesOpts::default()).unwrap();
    let base = format!("out/z-1_scale-1.0-7_{}_0", out.run_id);
    let names: Vec<String> = out
        .written
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            format!("{base}_rgb.png"),
            format!("{base}_gray.png"),
            format!("{base}.tif"),
        ]
    );
}
