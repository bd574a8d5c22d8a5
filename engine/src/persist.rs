use crate::error::{EngineError, Result};
use crate::model::FittedModel;
use serde::{Deserialize, Serialize};
use std::fs::{self, create_dir_all, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_records: usize,
    pub vocabulary_size: usize,
    pub model_version: String,
    pub created_at: String,
    pub version: u32,
}

#[derive(Serialize, Deserialize)]
struct Artifact {
    format_version: u32,
    model: FittedModel,
}

pub struct ModelPaths {
    pub root: PathBuf,
}

impl ModelPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn model(&self) -> PathBuf { self.root.join("model.bin") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

pub fn encode(model: &FittedModel) -> Result<Vec<u8>> {
    #[derive(Serialize)]
    struct ArtifactRef<'a> {
        format_version: u32,
        model: &'a FittedModel,
    }
    bincode::serialize(&ArtifactRef { format_version: FORMAT_VERSION, model })
        .map_err(|e| EngineError::CorruptModel(format!("encode: {e}")))
}

pub fn decode(bytes: &[u8]) -> Result<FittedModel> {
    let artifact: Artifact = bincode::deserialize(bytes).map_err(|e| EngineError::CorruptModel(e.to_string()))?;
    if artifact.format_version != FORMAT_VERSION {
        return Err(EngineError::CorruptModel(format!("unsupported format version {}", artifact.format_version)));
    }
    artifact.model.validate().map_err(EngineError::CorruptModel)?;
    Ok(artifact.model)
}

/// Write the artifact and its meta.json. The artifact goes through a temp
/// file and a rename so a crash never leaves a half-written model behind.
pub fn save(paths: &ModelPaths, model: &FittedModel) -> Result<()> {
    create_dir_all(&paths.root)?;
    let bytes = encode(model)?;
    let tmp = paths.root.join("model.bin.tmp");
    {
        let mut f = File::create(&tmp)?;
        f.write_all(&bytes)?;
        f.sync_all()?;
    }
    fs::rename(&tmp, paths.model())?;

    let (num_records, vocabulary_size) = model.shape();
    let meta = MetaFile {
        num_records,
        vocabulary_size,
        model_version: model.model_version.clone(),
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default(),
        version: FORMAT_VERSION,
    };
    save_meta(paths, &meta)?;
    tracing::info!(path = %paths.model().display(), num_records, "saved model");
    Ok(())
}

pub fn load(paths: &ModelPaths) -> Result<FittedModel> {
    let path = paths.model();
    let mut f = File::open(&path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => EngineError::ModelNotFound(path.clone()),
        _ => EngineError::Io(e),
    })?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let model = decode(&buf)?;
    tracing::info!(path = %path.display(), num_records = model.len(), "loaded model");
    Ok(model)
}

pub fn save_meta(paths: &ModelPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &ModelPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}
