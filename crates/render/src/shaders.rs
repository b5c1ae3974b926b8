use std::collections::HashMap;

use tickframe_assets::{AssetError, AssetRegistry};
use tickframe_common::ShaderHandle;

use crate::error::RenderError;
use crate::render_type::RenderType;

/// Shader handle for every render type, resolved once at startup.
#[derive(Debug, Clone, Default)]
pub struct ShaderTable {
    handles: HashMap<RenderType, ShaderHandle>,
}

impl ShaderTable {
    /// Look up the shader of every render type. The first missing name fails.
    pub fn resolve(assets: &AssetRegistry) -> Result<Self, RenderError> {
        let mut handles = HashMap::with_capacity(RenderType::ALL.len());
        for render_type in RenderType::ALL {
            let name = render_type.shader_name();
            let handle = assets
                .try_shader(name)
                .ok_or(RenderError::MissingShader { render_type, name })?;
            handles.insert(render_type, handle);
        }
        tracing::debug!(count = handles.len(), "resolved shader table");
        Ok(Self { handles })
    }

    pub fn get(&self, render_type: RenderType) -> Result<ShaderHandle, RenderError> {
        self.handles
            .get(&render_type)
            .copied()
            .ok_or(RenderError::MissingShader {
                render_type,
                name: render_type.shader_name(),
            })
    }
}

/// Register every built-in shader name, labelled `builtin:<name>`.
pub fn register_builtin_shaders(assets: &mut AssetRegistry) -> Result<(), AssetError> {
    for render_type in RenderType::ALL {
        let name = render_type.shader_name();
        assets.register_shader(name, &format!("builtin:{name}"))?;
    }
    Ok(())
}
