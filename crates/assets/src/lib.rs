//! Asset registry: resolves shader and texture names to opaque handles.
//!
//! Handles are content-addressed from the asset kind and name, so the same
//! name always maps to the same handle across runs. The renderer consumes
//! assets by handle, never by name or file path.
//!
//! # Invariants
//! - A name is registered at most once per kind; re-registering the same
//!   source is a no-op, a different source is an error.
//! - Lookups never allocate a new handle.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;
use tickframe_common::{ShaderHandle, TextureHandle};

/// Where a shader or texture comes from: a file path or a built-in label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetEntry {
    pub id: u64,
    pub source: String,
}

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("shader not found: {0}")]
    MissingShader(String),
    #[error("texture not found: {0}")]
    MissingTexture(String),
    #[error("{kind} {name:?} already registered from {existing:?}")]
    Duplicate {
        kind: &'static str,
        name: String,
        existing: String,
    },
}

/// Name-indexed registry of shaders and textures.
///
/// The registry can be persisted to disk as a JSON manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetRegistry {
    shaders: BTreeMap<String, AssetEntry>,
    textures: BTreeMap<String, AssetEntry>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a shader program under `name`.
    pub fn register_shader(
        &mut self,
        name: &str,
        source: &str,
    ) -> Result<ShaderHandle, AssetError> {
        register(&mut self.shaders, "shader", name, source).map(ShaderHandle)
    }

    /// Register a texture under `name`.
    pub fn register_texture(
        &mut self,
        name: &str,
        source: &str,
    ) -> Result<TextureHandle, AssetError> {
        register(&mut self.textures, "texture", name, source).map(TextureHandle)
    }

    pub fn try_shader(&self, name: &str) -> Option<ShaderHandle> {
        self.shaders.get(name).map(|e| ShaderHandle(e.id))
    }

    pub fn shader(&self, name: &str) -> Result<ShaderHandle, AssetError> {
        self.try_shader(name)
            .ok_or_else(|| AssetError::MissingShader(name.to_string()))
    }

    pub fn try_texture(&self, name: &str) -> Option<TextureHandle> {
        self.textures.get(name).map(|e| TextureHandle(e.id))
    }

    pub fn texture(&self, name: &str) -> Result<TextureHandle, AssetError> {
        self.try_texture(name)
            .ok_or_else(|| AssetError::MissingTexture(name.to_string()))
    }

    /// Reverse lookup, mostly for logs.
    pub fn shader_name(&self, handle: ShaderHandle) -> Option<&str> {
        self.shaders
            .iter()
            .find(|(_, e)| e.id == handle.0)
            .map(|(name, _)| name.as_str())
    }

    pub fn texture_name(&self, handle: TextureHandle) -> Option<&str> {
        self.textures
            .iter()
            .find(|(_, e)| e.id == handle.0)
            .map(|(name, _)| name.as_str())
    }

    pub fn shaders(&self) -> impl Iterator<Item = (&str, &AssetEntry)> {
        self.shaders.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn textures(&self) -> impl Iterator<Item = (&str, &AssetEntry)> {
        self.textures.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn shader_count(&self) -> usize {
        self.shaders.len()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Save the registry to a JSON manifest.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AssetError> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load a registry from a JSON manifest.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let file = std::fs::File::open(path)?;
        let registry: Self = serde_json::from_reader(file)?;
        tracing::info!(
            shaders = registry.shader_count(),
            textures = registry.texture_count(),
            "loaded asset manifest"
        );
        Ok(registry)
    }
}

fn register(
    table: &mut BTreeMap<String, AssetEntry>,
    kind: &'static str,
    name: &str,
    source: &str,
) -> Result<u64, AssetError> {
    if let Some(existing) = table.get(name) {
        if existing.source == source {
            return Ok(existing.id);
        }
        return Err(AssetError::Duplicate {
            kind,
            name: name.to_string(),
            existing: existing.source.clone(),
        });
    }
    let id = content_hash(kind, name);
    tracing::debug!(kind, name, source, id, "registered asset");
    table.insert(
        name.to_string(),
        AssetEntry {
            id,
            source: source.to_string(),
        },
    );
    Ok(id)
}

fn content_hash(kind: &str, name: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_bytes());
    hasher.update([0u8]);
    hasher.update(name.as_bytes());
    let result = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&result[..8]);
    u64::from_le_bytes(bytes)
}

pub fn crate_info() -> &'static str {
    "tickframe-assets v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_lookup_shader() {
        let mut reg = AssetRegistry::new();
        let h = reg.register_shader("triangles", "builtin:triangles").unwrap();
        assert_eq!(reg.try_shader("triangles"), Some(h));
        assert_eq!(reg.shader("triangles").unwrap(), h);
        assert_eq!(reg.shader_name(h), Some("triangles"));
    }

    #[test]
    fn missing_names_error() {
        let reg = AssetRegistry::new();
        assert!(reg.try_shader("nope").is_none());
        assert!(matches!(reg.shader("nope"), Err(AssetError::MissingShader(n)) if n == "nope"));
        assert!(matches!(reg.texture("nope"), Err(AssetError::MissingTexture(_))));
    }

    #[test]
    fn handles_are_stable_and_kind_scoped() {
        let mut a = AssetRegistry::new();
        let mut b = AssetRegistry::new();
        let sa = a.register_shader("font", "x").unwrap();
        let sb = b.register_shader("font", "y").unwrap();
        assert_eq!(sa, sb);

        let t = a.register_texture("font", "font.png").unwrap();
        assert_ne!(sa.0, t.0);
    }

    #[test]
    fn reregister_same_source_is_idempotent() {
        let mut reg = AssetRegistry::new();
        let h1 = reg.register_texture("sky", "sky.png").unwrap();
        let h2 = reg.register_texture("sky", "sky.png").unwrap();
        assert_eq!(h1, h2);
        assert_eq!(reg.texture_count(), 1);
    }

    #[test]
    fn reregister_different_source_is_duplicate() {
        let mut reg = AssetRegistry::new();
        reg.register_texture("sky", "sky.png").unwrap();
        let err = reg.register_texture("sky", "other.png").unwrap_err();
        assert!(matches!(err, AssetError::Duplicate { kind: "texture", .. }));
    }

    #[test]
    fn save_and_load() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let mut reg = AssetRegistry::new();
        let s = reg.register_shader("lines", "builtin:lines").unwrap();
        let t = reg.register_texture("atlas", "atlas.png").unwrap();
        reg.save(tmp.path()).unwrap();

        let loaded = AssetRegistry::load(tmp.path()).unwrap();
        assert_eq!(loaded.try_shader("lines"), Some(s));
        assert_eq!(loaded.try_texture("atlas"), Some(t));
        assert_eq!(loaded.shader_count(), 1);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AssetRegistry::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, AssetError::Io(_)));
    }
}
