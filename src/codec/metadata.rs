//! Reproducibility metadata and its JSON schema.
//!
//! Identity fields are required on decode. Everything else may be missing in files written by
//! older versions and falls back to `None` with a recorded warning.

use serde_json::{Map, Value};

use crate::foundation::error::MetadataDecodeError;
use crate::latent::LatentState;

/// Everything needed to rebuild the generating model and replay one generation.
#[derive(Clone, Debug, PartialEq)]
pub struct Metadata {
    pub seed: u64,
    pub latent_dim: usize,
    pub latent_scale: f64,
    pub x_dim: u32,
    pub y_dim: u32,
    pub c_dim: u32,
    pub device: String,
    /// Defaults to `x_dim` on decode.
    pub z_dim: Option<u32>,

    pub mlp_layer_width: Option<usize>,
    pub conv_feature_map_size: Option<usize>,
    /// Defaults to 1 on decode.
    pub input_encoding_dim: Option<usize>,
    pub num_graph_nodes: Option<usize>,

    pub weight_init: Option<String>,
    pub weight_init_mean: Option<f64>,
    pub weight_init_std: Option<f64>,
    pub weight_init_max: Option<f64>,
    pub weight_init_min: Option<f64>,

    pub activations: Option<String>,
    pub final_activation: Option<String>,
    pub graph_topology: Option<String>,
    pub graph: Option<String>,

    /// The latent actually used for the generation.
    pub latents: Option<LatentState>,
}

impl Metadata {
    /// Metadata with only the identity fields set.
    pub fn identity(
        seed: u64,
        latent_dim: usize,
        latent_scale: f64,
        shape: crate::OutputShape,
        device: impl Into<String>,
    ) -> Self {
        Self {
            seed,
            latent_dim,
            latent_scale,
            x_dim: shape.x_dim,
            y_dim: shape.y_dim,
            c_dim: shape.c_dim,
            device: device.into(),
            z_dim: None,
            mlp_layer_width: None,
            conv_feature_map_size: None,
            input_encoding_dim: None,
            num_graph_nodes: None,
            weight_init: None,
            weight_init_mean: None,
            weight_init_std: None,
            weight_init_max: None,
            weight_init_min: None,
            activations: None,
            final_activation: None,
            graph_topology: None,
            graph: None,
            latents: None,
        }
    }

    /// Serialize to the flat JSON object stored in archives. Absent optionals are omitted.
    pub fn to_json(&self) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("seed".into(), self.seed.into());
        m.insert("latent_dim".into(), self.latent_dim.into());
        m.insert("latent_scale".into(), self.latent_scale.into());
        m.insert("x_dim".into(), self.x_dim.into());
        m.insert("y_dim".into(), self.y_dim.into());
        m.insert("c_dim".into(), self.c_dim.into());
        m.insert("device".into(), self.device.clone().into());

        let mut put = |key: &str, v: Option<Value>| {
            if let Some(v) = v {
                m.insert(key.to_owned(), v);
            }
        };
        put("z_dim", self.z_dim.map(Value::from));
        put("mlp_layer_width", self.mlp_layer_width.map(Value::from));
        put(
            "conv_feature_map_size",
            self.conv_feature_map_size.map(Value::from),
        );
        put(
            "input_encoding_dim",
            self.input_encoding_dim.map(Value::from),
        );
        put("num_graph_nodes", self.num_graph_nodes.map(Value::from));
        put("weight_init_mean", self.weight_init_mean.map(Value::from));
        put("weight_init_std", self.weight_init_std.map(Value::from));
        put("weight_init_max", self.weight_init_max.map(Value::from));
        put("weight_init_min", self.weight_init_min.map(Value::from));
        put("weight_init", self.weight_init.clone().map(Value::from));
        put("activations", self.activations.clone().map(Value::from));
        put(
            "final_activation",
            self.final_activation.clone().map(Value::from),
        );
        put("graph_topology", self.graph_topology.clone().map(Value::from));
        put("graph", self.graph.clone().map(Value::from));
        put("latents", self.latents.as_ref().map(latents_to_json));
        m
    }

    /// Decode a metadata object, applying legacy defaults.
    pub fn from_json(obj: &Map<String, Value>) -> Result<DecodedMetadata, MetadataDecodeError> {
        let mut warnings = Vec::new();

        let seed = required_u64(obj, "seed")?;
        let latent_dim = required_u64(obj, "latent_dim")? as usize;
        let latent_scale = required_f64(obj, "latent_scale")?;
        let x_dim = required_u32(obj, "x_dim")?;
        let y_dim = required_u32(obj, "y_dim")?;
        let c_dim = required_u32(obj, "c_dim")?;
        let device = match obj.get("device") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => return Err(mistyped("device", "string", other)),
            None => return Err(missing("device")),
        };

        let z_dim = match obj.get("z_dim") {
            Some(v) => Some(as_u64(v).ok_or_else(|| mistyped("z_dim", "integer", v))? as u32),
            None => Some(x_dim),
        };

        let mut int = |key: &str| -> Result<Option<usize>, MetadataDecodeError> {
            optional(obj, key, &mut warnings, |v| as_u64(v).map(|n| n as usize), "integer")
        };
        let mlp_layer_width = int("mlp_layer_width")?;
        let conv_feature_map_size = int("conv_feature_map_size")?;
        let input_encoding_dim = int("input_encoding_dim")?;
        let num_graph_nodes = int("num_graph_nodes")?;

        let mut float = |key: &str| -> Result<Option<f64>, MetadataDecodeError> {
            optional(obj, key, &mut warnings, Value::as_f64, "number")
        };
        let weight_init_mean = float("weight_init_mean")?;
        let weight_init_std = float("weight_init_std")?;
        let weight_init_max = float("weight_init_max")?;
        let weight_init_min = float("weight_init_min")?;

        let mut string = |key: &str| -> Result<Option<String>, MetadataDecodeError> {
            optional(
                obj,
                key,
                &mut warnings,
                |v| v.as_str().map(str::to_owned),
                "string",
            )
        };
        let activations = string("activations")?;
        let graph = string("graph")?;
        let final_activation = string("final_activation")?;
        let weight_init = string("weight_init")?;
        let graph_topology = string("graph_topology")?;

        let latents = match (obj.get("latents"), obj.get("latent")) {
            (Some(v), _) => Some(latents_from_json(v).map_err(|e| malformed("latents", &e))?),
            (None, Some(v)) => {
                warn(
                    &mut warnings,
                    "key `latents` not found in metadata, using legacy `latent`".to_owned(),
                );
                Some(latents_from_json(v).map_err(|e| malformed("latent", &e))?)
            }
            (None, None) => {
                warn(&mut warnings, absent_msg("latents"));
                None
            }
        };

        let mut md = Metadata {
            seed,
            latent_dim,
            latent_scale,
            x_dim,
            y_dim,
            c_dim,
            device,
            z_dim,
            mlp_layer_width,
            conv_feature_map_size,
            input_encoding_dim,
            num_graph_nodes,
            weight_init,
            weight_init_mean,
            weight_init_std,
            weight_init_max,
            weight_init_min,
            activations,
            final_activation,
            graph_topology,
            graph,
            latents,
        };
        md.normalize_legacy();
        Ok(DecodedMetadata {
            metadata: md,
            warnings,
        })
    }

    fn normalize_legacy(&mut self) {
        if self.input_encoding_dim.is_none() {
            self.input_encoding_dim = Some(1);
        }
        if self.activations.as_deref() == Some("basic") {
            self.activations = Some("fixed".to_owned());
        }
    }
}

/// Decoded metadata plus the fallback warnings raised while decoding it.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedMetadata {
    pub metadata: Metadata,
    pub warnings: Vec<String>,
}

fn absent_msg(key: &str) -> String {
    format!("key `{key}` not found in metadata, setting to None")
}

fn warn(warnings: &mut Vec<String>, msg: String) {
    tracing::warn!("{msg}");
    warnings.push(msg);
}

fn optional<T>(
    obj: &Map<String, Value>,
    key: &str,
    warnings: &mut Vec<String>,
    conv: impl Fn(&Value) -> Option<T>,
    expected: &str,
) -> Result<Option<T>, MetadataDecodeError> {
    match obj.get(key) {
        None | Some(Value::Null) => {
            warn(warnings, absent_msg(key));
            Ok(None)
        }
        Some(v) => conv(v).map(Some).ok_or_else(|| mistyped(key, expected, v)),
    }
}

fn as_u64(v: &Value) -> Option<u64> {
    v.as_u64().or_else(|| {
        v.as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= 0.0)
            .map(|f| f as u64)
    })
}

fn required_u64(obj: &Map<String, Value>, key: &str) -> Result<u64, MetadataDecodeError> {
    let v = obj.get(key).ok_or_else(|| missing(key))?;
    as_u64(v).ok_or_else(|| mistyped(key, "integer", v))
}

fn required_u32(obj: &Map<String, Value>, key: &str) -> Result<u32, MetadataDecodeError> {
    let n = required_u64(obj, key)?;
    u32::try_from(n).map_err(|_| malformed(key, &format!("{n} does not fit in u32")))
}

fn required_f64(obj: &Map<String, Value>, key: &str) -> Result<f64, MetadataDecodeError> {
    let v = obj.get(key).ok_or_else(|| missing(key))?;
    v.as_f64().ok_or_else(|| mistyped(key, "number", v))
}

fn missing(key: &str) -> MetadataDecodeError {
    MetadataDecodeError::Malformed(format!("required key `{key}` is missing"))
}

fn mistyped(key: &str, expected: &str, got: &Value) -> MetadataDecodeError {
    MetadataDecodeError::Malformed(format!("key `{key}` should be {expected}, got {got}"))
}

fn malformed(key: &str, why: &str) -> MetadataDecodeError {
    MetadataDecodeError::Malformed(format!("key `{key}`: {why}"))
}

/// Nested JSON array following `sample_shape`.
pub(crate) fn latents_to_json(state: &LatentState) -> Value {
    fn nest(values: &[f32], shape: &[usize]) -> Value {
        match shape {
            [] | [_] => Value::Array(values.iter().map(|&v| Value::from(v)).collect()),
            [_, rest @ ..] => {
                let stride: usize = rest.iter().product();
                Value::Array(
                    values
                        .chunks(stride.max(1))
                        .map(|c| nest(c, rest))
                        .collect(),
                )
            }
        }
    }
    nest(state.sample(), state.sample_shape())
}

pub(crate) fn latents_from_json(v: &Value) -> Result<LatentState, String> {
    fn walk(
        v: &Value,
        depth: usize,
        shape: &mut Vec<usize>,
        out: &mut Vec<f32>,
    ) -> Result<(), String> {
        match v {
            Value::Array(items) => {
                if shape.len() == depth {
                    shape.push(items.len());
                } else if shape[depth] != items.len() {
                    return Err("ragged latent array".to_owned());
                }
                items
                    .iter()
                    .try_for_each(|item| walk(item, depth + 1, shape, out))
            }
            Value::Number(n) => {
                if shape.len() != depth {
                    return Err("ragged latent array".to_owned());
                }
                let f = n.as_f64().ok_or("latent value is not a number")?;
                out.push(f as f32);
                Ok(())
            }
            other => Err(format!("latent value is not a number: {other}")),
        }
    }

    let mut shape = Vec::new();
    let mut out = Vec::new();
    walk(v, 0, &mut shape, &mut out)?;
    if shape.is_empty() {
        // bare scalar
        shape.push(1);
    }
    LatentState::new(out, shape).map_err(|e| e.to_string())
}

#[cfg(test)]
#[path = "../../tests/unit/codec/metadata.rs"]
mod tests;
