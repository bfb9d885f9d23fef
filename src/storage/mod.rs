//! Persistence of trained networks.
//!
//! A network is stored as two files next to each other:
//!
//! * `<base>.weights`: bincode-encoded header and dense weights, one row of `inputs` values per unit
//! * `<base>.json`: configuration and training state, plus optional unit labels
//!
//! Both files must agree on the number of inputs and units to be loaded.

use crate::data::DataFrame;
use crate::error::{Result, SomError};
use crate::map::params::SomParams;
use crate::map::som::{Som, TrainingState};
use log::info;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Magic number of weight files.
const MAGIC: [u8; 4] = *b"KSOM";

/// Current format version.
const VERSION: u16 = 1;

#[derive(Serialize, Deserialize)]
struct WeightBlob {
    magic: [u8; 4],
    version: u16,
    inputs: u32,
    units: u32,
    data: Vec<f64>,
}

/// Network configuration and training state, stored as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sidecar {
    /// Number of inputs (D).
    pub inputs: usize,
    /// Number of units (N).
    pub units: usize,
    /// Learning rate at the time of saving.
    pub learning_rate: f64,
    /// Maximum number of epochs (T).
    pub epochs: u32,
    pub params: SomParams,
    pub state: TrainingState,
    /// Class label per unit, if the network was labelled.
    pub labels: Option<Vec<Option<String>>>,
}

/// A loaded network with optional unit labels.
#[derive(Debug, Clone)]
pub struct Model {
    pub som: Som,
    pub labels: Option<Vec<Option<String>>>,
}

/// Path of the weights file for a base path.
pub fn weights_path(base: &Path) -> PathBuf {
    with_suffix(base, ".weights")
}

/// Path of the JSON sidecar file for a base path.
pub fn sidecar_path(base: &Path) -> PathBuf {
    with_suffix(base, ".json")
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut path: OsString = base.as_os_str().to_owned();
    path.push(suffix);
    PathBuf::from(path)
}

fn persistence_err(path: &Path, err: impl std::fmt::Display) -> SomError {
    SomError::Persistence(format!("{}: {}", path.display(), err))
}

/// Saves a network's weights and configuration, with optional per-unit labels.
pub fn save(som: &Som, labels: Option<&[Option<String>]>, base: &Path) -> Result<()> {
    if let Some(labels) = labels {
        if labels.len() != som.units() {
            return Err(SomError::Persistence(format!(
                "Expected {} unit labels, got {}",
                som.units(),
                labels.len()
            )));
        }
    }

    let blob = WeightBlob {
        magic: MAGIC,
        version: VERSION,
        inputs: som.inputs() as u32,
        units: som.units() as u32,
        data: som.weights().data().to_vec(),
    };
    let path = weights_path(base);
    let file = File::create(&path).map_err(|e| persistence_err(&path, e))?;
    let mut writer = BufWriter::new(file);
    bincode::serialize_into(&mut writer, &blob).map_err(|e| persistence_err(&path, e))?;
    writer.flush().map_err(|e| persistence_err(&path, e))?;

    let sidecar = Sidecar {
        inputs: som.inputs(),
        units: som.units(),
        learning_rate: som.state().learning_rate(),
        epochs: som.params().epochs(),
        params: som.params().clone(),
        state: som.state().clone(),
        labels: labels.map(|l| l.to_vec()),
    };
    let path = sidecar_path(base);
    let file = File::create(&path).map_err(|e| persistence_err(&path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &sidecar).map_err(|e| persistence_err(&path, e))?;
    writer.flush().map_err(|e| persistence_err(&path, e))?;

    info!(
        "Saved SOM ({} inputs, {} units) to {}",
        som.inputs(),
        som.units(),
        base.display()
    );
    Ok(())
}

/// Reads only the JSON sidecar of a stored network.
pub fn load_sidecar(base: &Path) -> Result<Sidecar> {
    let path = sidecar_path(base);
    let file = File::open(&path).map_err(|e| persistence_err(&path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| persistence_err(&path, e))
}

/// Loads a network saved with [`save`](fn.save.html).
pub fn load(base: &Path) -> Result<Model> {
    let sidecar = load_sidecar(base)?;

    let path = weights_path(base);
    let file = File::open(&path).map_err(|e| persistence_err(&path, e))?;
    let blob: WeightBlob =
        bincode::deserialize_from(BufReader::new(file)).map_err(|e| persistence_err(&path, e))?;

    if blob.magic != MAGIC {
        return Err(persistence_err(&path, "not a SOM weights file"));
    }
    if blob.version != VERSION {
        return Err(persistence_err(
            &path,
            format!("unsupported format version {}", blob.version),
        ));
    }
    let (inputs, units) = (blob.inputs as usize, blob.units as usize);
    if inputs != sidecar.inputs || units != sidecar.units {
        return Err(persistence_err(
            &path,
            format!(
                "shape {}x{} does not match configuration {}x{}",
                units, inputs, sidecar.units, sidecar.inputs
            ),
        ));
    }
    if blob.data.len() != inputs * units {
        return Err(persistence_err(
            &path,
            format!(
                "expected {} weights, found {}",
                inputs * units,
                blob.data.len()
            ),
        ));
    }
    if let Some(labels) = &sidecar.labels {
        if labels.len() != units {
            return Err(persistence_err(
                &sidecar_path(base),
                format!("expected {} unit labels, found {}", units, labels.len()),
            ));
        }
    }

    let names = (0..inputs).map(|i| i.to_string()).collect();
    let weights = DataFrame::from_raw(names, blob.data)
        .ok_or_else(|| persistence_err(&path, "malformed weight matrix"))?;
    let som = Som::from_parts(weights, sidecar.params, sidecar.state)
        .map_err(|e| persistence_err(&path, e))?;

    info!(
        "Loaded SOM ({} inputs, {} units) from {}",
        inputs,
        units,
        base.display()
    );
    Ok(Model {
        som,
        labels: sidecar.labels,
    })
}
