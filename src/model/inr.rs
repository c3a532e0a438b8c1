//! Seeded CPPN-style mapping: coordinates + latent -> MLP -> color.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal, Uniform};

use crate::codec::metadata::Metadata;
use crate::foundation::core::{OutputShape, Pan, Zoom};
use crate::foundation::error::{InrError, InrResult};
use crate::foundation::math::linspace;
use crate::latent::LatentState;
use crate::model::{
    CoordGrid, FinalActivation, Generative, LatentInputs, LatentRequest, ModelFactory,
    split_ranges,
};

const HIDDEN_LAYERS: usize = 3;
const LATENT_STREAM: u64 = 0x9E37_79B9_7F4A_7C15;

/// Identity parameters of a model.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct InrConfig {
    pub shape: OutputShape,
    pub latent_dim: usize,
    pub latent_scale: f64,
    pub seed: u64,
    pub device: String,
}

impl Default for InrConfig {
    fn default() -> Self {
        Self {
            shape: OutputShape {
                x_dim: 256,
                y_dim: 256,
                c_dim: 3,
            },
            latent_dim: 8,
            latent_scale: 1.0,
            seed: 0,
            device: "cpu".to_owned(),
        }
    }
}

/// How hidden-layer activations are chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationMode {
    /// tanh, sin, tanh.
    #[default]
    Fixed,
    /// One seeded draw per hidden layer.
    Random,
}

impl ActivationMode {
    pub fn name(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Random => "random",
        }
    }
}

/// Weight initialization scheme.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum WeightInit {
    Normal { mean: f64, std: f64 },
    Uniform { min: f64, max: f64 },
}

impl Default for WeightInit {
    fn default() -> Self {
        Self::Normal {
            mean: 0.0,
            std: 1.0,
        }
    }
}

/// Architecture of the mapping function.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub mlp_layer_width: usize,
    pub input_encoding_dim: usize,
    pub activations: ActivationMode,
    pub final_activation: FinalActivation,
    pub weight_init: WeightInit,
    pub graph_topology: String,
    /// Recorded for reproducibility; unused by the MLP topology.
    pub num_graph_nodes: Option<usize>,
    pub graph: Option<String>,
    pub conv_feature_map_size: Option<usize>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            mlp_layer_width: 32,
            input_encoding_dim: 1,
            activations: ActivationMode::Fixed,
            final_activation: FinalActivation::Sigmoid,
            weight_init: WeightInit::default(),
            graph_topology: "mlp".to_owned(),
            num_graph_nodes: None,
            graph: None,
            conv_feature_map_size: None,
        }
    }
}

impl MapConfig {
    /// Rebuild from decoded metadata, defaulting fields that older files lack.
    pub fn from_metadata(md: &Metadata) -> InrResult<Self> {
        let defaults = Self::default();
        let activations = match md.activations.as_deref() {
            None | Some("fixed") => ActivationMode::Fixed,
            Some("random") => ActivationMode::Random,
            Some(other) => {
                return Err(InrError::unsupported(format!(
                    "activation mode '{other}' is not supported"
                )));
            }
        };
        let weight_init = match md.weight_init.as_deref() {
            None | Some("normal") => WeightInit::Normal {
                mean: md.weight_init_mean.unwrap_or(0.0),
                std: md.weight_init_std.unwrap_or(1.0),
            },
            Some("uniform") => WeightInit::Uniform {
                min: md.weight_init_min.unwrap_or(-1.0),
                max: md.weight_init_max.unwrap_or(1.0),
            },
            Some(other) => {
                return Err(InrError::unsupported(format!(
                    "weight init '{other}' is not supported"
                )));
            }
        };
        Ok(Self {
            mlp_layer_width: md.mlp_layer_width.unwrap_or(defaults.mlp_layer_width),
            input_encoding_dim: md.input_encoding_dim.unwrap_or(1),
            activations,
            final_activation: md
                .final_activation
                .as_deref()
                .map(FinalActivation::from_name)
                .unwrap_or_default(),
            weight_init,
            graph_topology: md
                .graph_topology
                .clone()
                .unwrap_or(defaults.graph_topology),
            num_graph_nodes: md.num_graph_nodes,
            graph: md.graph.clone(),
            conv_feature_map_size: md.conv_feature_map_size,
        })
    }

    fn validate(&self) -> InrResult<()> {
        if !self.graph_topology.eq_ignore_ascii_case("mlp") {
            return Err(InrError::unsupported(format!(
                "graph topology '{}' is not supported by the MLP mapping",
                self.graph_topology
            )));
        }
        if self.mlp_layer_width == 0 || self.input_encoding_dim == 0 {
            return Err(InrError::validation(
                "mlp_layer_width and input_encoding_dim must be >= 1",
            ));
        }
        if let FinalActivation::Other(name) = &self.final_activation {
            return Err(InrError::unsupported(format!(
                "final activation '{name}' is not supported"
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Activation {
    Tanh,
    Sin,
    Cos,
    Gauss,
    Softplus,
    Sigmoid,
}

impl Activation {
    const HIDDEN_CHOICES: [Self; 5] = [Self::Tanh, Self::Sin, Self::Cos, Self::Gauss, Self::Softplus];

    pub(crate) fn apply(self, x: f32) -> f32 {
        match self {
            Self::Tanh => x.tanh(),
            Self::Sin => x.sin(),
            Self::Cos => x.cos(),
            Self::Gauss => (-x * x).exp(),
            Self::Softplus => x.exp().ln_1p(),
            Self::Sigmoid => 1.0 / (1.0 + (-x).exp()),
        }
    }

    /// Derivative expressed through the activation's output `y = apply(x)`.
    pub(crate) fn grad_from_output(self, y: f32) -> Option<f32> {
        match self {
            Self::Tanh => Some(1.0 - y * y),
            Self::Sigmoid => Some(y * (1.0 - y)),
            _ => None,
        }
    }

    fn output(final_activation: &FinalActivation) -> Self {
        match final_activation {
            FinalActivation::Tanh => Self::Tanh,
            _ => Self::Sigmoid,
        }
    }
}

/// Dense layer. `params` holds the `out x inp` weights followed by `out` biases.
#[derive(Clone, Debug)]
pub(crate) struct Layer {
    pub(crate) inp: usize,
    pub(crate) out: usize,
    pub(crate) params: Vec<f32>,
    pub(crate) act: Activation,
}

impl Layer {
    fn init(
        inp: usize,
        out: usize,
        act: Activation,
        init: WeightInit,
        rng: &mut StdRng,
    ) -> InrResult<Self> {
        let n = out * inp + out;
        let params = match init {
            WeightInit::Normal { mean, std } => {
                let dist = Normal::new(mean, std)
                    .map_err(|e| InrError::validation(format!("normal weight init: {e}")))?;
                (0..n).map(|_| dist.sample(rng) as f32).collect()
            }
            WeightInit::Uniform { min, max } => {
                if !(min < max) {
                    return Err(InrError::validation(
                        "uniform weight init needs min < max",
                    ));
                }
                let dist = Uniform::new(min, max);
                (0..n).map(|_| dist.sample(rng) as f32).collect()
            }
        };
        Ok(Self {
            inp,
            out,
            params,
            act,
        })
    }

    /// `out = act(W x + b + extra)`; `extra` carries the precomputed latent term.
    pub(crate) fn forward(&self, x: &[f32], extra: Option<&[f32]>, out: &mut Vec<f32>) {
        out.clear();
        let bias = &self.params[self.out * self.inp..];
        for o in 0..self.out {
            let row = &self.params[o * self.inp..(o + 1) * self.inp];
            let mut acc = bias[o];
            for (w, v) in row.iter().zip(x) {
                acc += w * v;
            }
            if let Some(e) = extra {
                acc += e[o];
            }
            out.push(self.act.apply(acc));
        }
    }
}

/// Randomly initialized, seeded CPPN mapping. Capability: [`Generative`].
#[derive(Clone, Debug)]
pub struct RandomInr {
    cfg: InrConfig,
    map: MapConfig,
    /// Splits the first layer's weights: the latent block is applied once per generation.
    coord_layer: Layer,
    latent_layer: Layer,
    hidden: Vec<Layer>,
    pub(crate) head: Layer,
    latent_rng: StdRng,
}

impl RandomInr {
    pub fn new(cfg: InrConfig, map: MapConfig) -> InrResult<Self> {
        OutputShape::new(cfg.shape.x_dim, cfg.shape.y_dim, cfg.shape.c_dim)?;
        if cfg.latent_dim == 0 {
            return Err(InrError::validation("latent_dim must be >= 1"));
        }
        map.validate()?;

        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let width = map.mlp_layer_width;
        let feat_dim = 3 * map.input_encoding_dim;

        let mut acts = match map.activations {
            ActivationMode::Fixed => vec![Activation::Tanh, Activation::Sin, Activation::Tanh],
            ActivationMode::Random => (0..HIDDEN_LAYERS)
                .map(|_| Activation::HIDDEN_CHOICES[rng.gen_range(0..Activation::HIDDEN_CHOICES.len())])
                .collect(),
        };
        let first_act = acts.remove(0);

        let coord_layer = Layer::init(feat_dim, width, first_act, map.weight_init, &mut rng)?;
        // Only the weights of the latent block matter; its bias is never read.
        let latent_layer = Layer::init(cfg.latent_dim, width, first_act, map.weight_init, &mut rng)?;
        let hidden = acts
            .into_iter()
            .map(|act| Layer::init(width, width, act, map.weight_init, &mut rng))
            .collect::<InrResult<Vec<_>>>()?;
        let head = Layer::init(
            width,
            cfg.shape.c_dim as usize,
            Activation::output(&map.final_activation),
            map.weight_init,
            &mut rng,
        )?;

        let latent_rng = StdRng::seed_from_u64(cfg.seed ^ LATENT_STREAM);
        tracing::debug!(
            seed = cfg.seed,
            shape = %cfg.shape,
            width,
            activations = map.activations.name(),
            "initialized mapping"
        );
        Ok(Self {
            cfg,
            map,
            coord_layer,
            latent_layer,
            hidden,
            head,
            latent_rng,
        })
    }

    pub fn config(&self) -> &InrConfig {
        &self.cfg
    }

    pub fn map_config(&self) -> &MapConfig {
        &self.map
    }

    fn feat_dim(&self) -> usize {
        3 * self.map.input_encoding_dim
    }

    fn coord_grid(&self, shape: OutputShape, zoom: Zoom, pan: Pan) -> InrResult<CoordGrid> {
        if zoom.0 == 0.0 || zoom.1 == 0.0 {
            return Err(InrError::validation("zoom must be non-zero"));
        }
        let xs: Vec<f64> = linspace(-1.0, 1.0, shape.x_dim as usize)
            .into_iter()
            .map(|v| v / zoom.0 + pan.0)
            .collect();
        let ys: Vec<f64> = linspace(-1.0, 1.0, shape.y_dim as usize)
            .into_iter()
            .map(|v| v / zoom.1 + pan.1)
            .collect();

        let enc = self.map.input_encoding_dim;
        let mut features = Vec::with_capacity(shape.points() * self.feat_dim());
        for &x in &xs {
            for &y in &ys {
                let r = (x * x + y * y).sqrt();
                features.extend([x as f32, y as f32, r as f32]);
                for k in 1..enc {
                    let f = std::f64::consts::PI * f64::from(1u32 << (k - 1).min(30));
                    features.extend([(f * x).sin() as f32, (f * y).sin() as f32, (f * r).sin() as f32]);
                }
            }
        }
        CoordGrid::new(shape, self.feat_dim(), features)
    }

    fn check_latents(&self, latents: &LatentState) -> InrResult<()> {
        if latents.sample().len() != self.cfg.latent_dim {
            return Err(InrError::precondition(format!(
                "latent has {} values, model expects a single row of {}",
                latents.sample().len(),
                self.cfg.latent_dim
            )));
        }
        Ok(())
    }

    /// Latent contribution to the first layer, identical for every point.
    fn latent_term(&self, latents: &LatentState) -> Vec<f32> {
        let l = &self.latent_layer;
        (0..l.out)
            .map(|o| {
                l.params[o * l.inp..(o + 1) * l.inp]
                    .iter()
                    .zip(latents.sample())
                    .map(|(w, z)| w * z)
                    .sum()
            })
            .collect()
    }

    /// Last hidden layer's output for every point, `points x width`.
    pub(crate) fn hidden_features(
        &self,
        latents: &LatentState,
        inputs: &CoordGrid,
        splits: usize,
    ) -> InrResult<Vec<f32>> {
        self.check_inputs(latents, inputs)?;
        let zterm = self.latent_term(latents);
        let width = self.map.mlp_layer_width;
        let mut out = Vec::with_capacity(inputs.points() * width);
        let (mut a, mut b) = (Vec::with_capacity(width), Vec::with_capacity(width));
        for range in split_ranges(inputs.points(), splits)? {
            for p in range {
                self.coord_layer.forward(inputs.point(p), Some(&zterm), &mut a);
                for layer in &self.hidden {
                    layer.forward(&a, None, &mut b);
                    std::mem::swap(&mut a, &mut b);
                }
                out.extend_from_slice(&a);
            }
        }
        Ok(out)
    }

    fn check_inputs(&self, latents: &LatentState, inputs: &CoordGrid) -> InrResult<()> {
        self.check_latents(latents)?;
        if inputs.feat_dim() != self.feat_dim() {
            return Err(InrError::precondition(format!(
                "coordinate grid has {} features per point, model expects {}",
                inputs.feat_dim(),
                self.feat_dim()
            )));
        }
        Ok(())
    }

    /// Apply the output head to `points x width` hidden features.
    pub(crate) fn head_forward(&self, hidden: &[f32]) -> Vec<f32> {
        let mut out = Vec::with_capacity(hidden.len() / self.head.inp * self.head.out);
        let mut px = Vec::with_capacity(self.head.out);
        for h in hidden.chunks_exact(self.head.inp) {
            self.head.forward(h, None, &mut px);
            out.extend_from_slice(&px);
        }
        out
    }
}

impl Generative for RandomInr {
    fn shape(&self) -> OutputShape {
        self.cfg.shape
    }

    fn latent_dim(&self) -> usize {
        self.cfg.latent_dim
    }

    fn latent_scale(&self) -> f64 {
        self.cfg.latent_scale
    }

    fn seed(&self) -> u64 {
        self.cfg.seed
    }

    fn final_activation(&self) -> &FinalActivation {
        &self.map.final_activation
    }

    fn init_latent_inputs(&mut self, req: LatentRequest) -> InrResult<LatentInputs> {
        let latents = match req.latents {
            Some(l) => {
                self.check_latents(&l)?;
                l
            }
            None => {
                let s = self.cfg.latent_scale;
                let sample = if s > 0.0 {
                    let dist = Uniform::new_inclusive(-s, s);
                    (0..self.cfg.latent_dim)
                        .map(|_| dist.sample(&mut self.latent_rng) as f32)
                        .collect()
                } else {
                    vec![0.0; self.cfg.latent_dim]
                };
                LatentState::row(sample)
            }
        };
        let shape = req.output_shape.unwrap_or(self.cfg.shape);
        let inputs = self.coord_grid(shape, req.zoom, req.pan)?;
        Ok(LatentInputs {
            meta_latents: latents.clone(),
            latents,
            inputs,
        })
    }

    fn generate(
        &self,
        latents: &LatentState,
        inputs: &CoordGrid,
        splits: usize,
    ) -> InrResult<Vec<f32>> {
        let hidden = self.hidden_features(latents, inputs, splits)?;
        Ok(self.head_forward(&hidden))
    }

    fn metadata(&self, meta_latents: &LatentState) -> Metadata {
        let mut md = Metadata::identity(
            self.cfg.seed,
            self.cfg.latent_dim,
            self.cfg.latent_scale,
            self.cfg.shape,
            self.cfg.device.clone(),
        );
        md.z_dim = Some(self.cfg.shape.x_dim);
        md.mlp_layer_width = Some(self.map.mlp_layer_width);
        md.input_encoding_dim = Some(self.map.input_encoding_dim);
        md.conv_feature_map_size = self.map.conv_feature_map_size;
        md.num_graph_nodes = self.map.num_graph_nodes;
        match self.map.weight_init {
            WeightInit::Normal { mean, std } => {
                md.weight_init = Some("normal".to_owned());
                md.weight_init_mean = Some(mean);
                md.weight_init_std = Some(std);
            }
            WeightInit::Uniform { min, max } => {
                md.weight_init = Some("uniform".to_owned());
                md.weight_init_min = Some(min);
                md.weight_init_max = Some(max);
            }
        }
        md.activations = Some(self.map.activations.name().to_owned());
        md.final_activation = Some(self.map.final_activation.name().to_owned());
        md.graph_topology = Some(self.map.graph_topology.clone());
        md.graph = self.map.graph.clone();
        md.latents = Some(meta_latents.clone());
        md
    }
}

/// [`ModelFactory`] that rebuilds a [`RandomInr`] from metadata.
#[derive(Clone, Copy, Debug, Default)]
pub struct InrFactory;

impl ModelFactory for InrFactory {
    fn build(
        &mut self,
        metadata: &Metadata,
        shape: OutputShape,
    ) -> InrResult<Box<dyn Generative>> {
        let cfg = InrConfig {
            shape,
            latent_dim: metadata.latent_dim,
            latent_scale: metadata.latent_scale,
            seed: metadata.seed,
            device: metadata.device.clone(),
        };
        Ok(Box::new(RandomInr::new(cfg, MapConfig::from_metadata(metadata)?)?))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/inr.rs"]
mod tests;
