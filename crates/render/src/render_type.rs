use serde::{Deserialize, Serialize};

/// Every kind of drawable the batcher understands. The tag selects the
/// vertex layout, the storage category and the shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderType {
    /// Untyped geometry drawn with the debug shader.
    None,
    GuiCutout,
    GuiText,
    /// Text meshes built around the origin and placed by a per-object position.
    Text3D,
    LerpText3D,
    Triangles,
    TrianglesTransparent,
    Quads,
    QuadsTransparent,
    Lines,
    Spheres,
    SpheresTransparent,
    LerpSpheres,
    LerpSpheresTransparent,
    LerpTriangles,
    LerpTrianglesTransparent,
    LerpQuads,
    LerpQuadsTransparent,
    LerpLines,
    SpriteCylinder,
}

/// Storage layout a batch uses for a render type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchCategory {
    /// Vertices plus rebased indices, one indexed draw.
    Mesh,
    /// Point particles drawn as instanced billboards.
    Points { lerp: bool },
    /// `Sprite3D` instances.
    Sprites,
    /// Per-object current/previous model matrices, multi-draw-indirect.
    IndirectMatrices,
    /// Per-object world positions, multi-draw-indirect.
    IndirectPositions { lerp: bool },
}

impl BatchCategory {
    pub fn name(self) -> &'static str {
        match self {
            BatchCategory::Mesh => "mesh",
            BatchCategory::Points { .. } => "points",
            BatchCategory::Sprites => "sprites",
            BatchCategory::IndirectMatrices => "indirect-matrices",
            BatchCategory::IndirectPositions { .. } => "indirect-positions",
        }
    }

    pub fn is_model(self) -> bool {
        matches!(
            self,
            BatchCategory::Mesh
                | BatchCategory::IndirectMatrices
                | BatchCategory::IndirectPositions { .. }
        )
    }
}

/// GPU primitive topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Primitive {
    Triangles,
    Lines,
    /// Four-vertex strip per instance, used for billboards.
    TriangleStrip,
}

impl RenderType {
    pub const ALL: [RenderType; 20] = [
        RenderType::None,
        RenderType::GuiCutout,
        RenderType::GuiText,
        RenderType::Text3D,
        RenderType::LerpText3D,
        RenderType::Triangles,
        RenderType::TrianglesTransparent,
        RenderType::Quads,
        RenderType::QuadsTransparent,
        RenderType::Lines,
        RenderType::Spheres,
        RenderType::SpheresTransparent,
        RenderType::LerpSpheres,
        RenderType::LerpSpheresTransparent,
        RenderType::LerpTriangles,
        RenderType::LerpTrianglesTransparent,
        RenderType::LerpQuads,
        RenderType::LerpQuadsTransparent,
        RenderType::LerpLines,
        RenderType::SpriteCylinder,
    ];

    pub fn category(self) -> BatchCategory {
        use RenderType::*;
        match self {
            None | GuiCutout | GuiText | Triangles | TrianglesTransparent | Quads
            | QuadsTransparent | Lines => BatchCategory::Mesh,
            Spheres | SpheresTransparent => BatchCategory::Points { lerp: false },
            LerpSpheres | LerpSpheresTransparent => BatchCategory::Points { lerp: true },
            SpriteCylinder => BatchCategory::Sprites,
            LerpTriangles | LerpTrianglesTransparent | LerpQuads | LerpQuadsTransparent
            | LerpLines => BatchCategory::IndirectMatrices,
            Text3D => BatchCategory::IndirectPositions { lerp: false },
            LerpText3D => BatchCategory::IndirectPositions { lerp: true },
        }
    }

    /// Name the shader for this type is registered under.
    pub fn shader_name(self) -> &'static str {
        use RenderType::*;
        match self {
            None => "debug",
            GuiCutout => "gui_cutout",
            GuiText => "text_2d",
            Text3D => "text_3d",
            LerpText3D => "lerp_text_3d",
            Triangles | Quads => "triangles",
            TrianglesTransparent | QuadsTransparent => "triangles_transparent",
            Lines => "lines",
            Spheres => "spheres",
            SpheresTransparent => "spheres_transparent",
            LerpSpheres => "lerp_spheres",
            LerpSpheresTransparent => "lerp_spheres_transparent",
            LerpTriangles | LerpQuads => "lerp_triangles",
            LerpTrianglesTransparent | LerpQuadsTransparent => "lerp_triangles_transparent",
            LerpLines => "lerp_lines",
            SpriteCylinder => "sprite_cylinder",
        }
    }

    pub fn primitive(self) -> Primitive {
        match self {
            RenderType::Lines | RenderType::LerpLines => Primitive::Lines,
            _ => match self.category() {
                BatchCategory::Points { .. } | BatchCategory::Sprites => Primitive::TriangleStrip,
                _ => Primitive::Triangles,
            },
        }
    }

    /// Transparent types are drawn after all opaque ones.
    pub fn requires_sorting(self) -> bool {
        use RenderType::*;
        matches!(
            self,
            TrianglesTransparent
                | QuadsTransparent
                | SpheresTransparent
                | LerpSpheresTransparent
                | LerpTrianglesTransparent
                | LerpQuadsTransparent
        )
    }

    /// Drawn last, over everything else.
    pub fn transparent_gui(self) -> bool {
        self == RenderType::GuiText
    }

    pub fn is_lerp(self) -> bool {
        use RenderType::*;
        matches!(
            self,
            LerpText3D
                | LerpSpheres
                | LerpSpheresTransparent
                | LerpTriangles
                | LerpTrianglesTransparent
                | LerpQuads
                | LerpQuadsTransparent
                | LerpLines
        )
    }

    /// The point render type for a transparency/lerp combination.
    pub fn for_points(transparent: bool, lerp: bool) -> RenderType {
        match (transparent, lerp) {
            (false, false) => RenderType::Spheres,
            (true, false) => RenderType::SpheresTransparent,
            (false, true) => RenderType::LerpSpheres,
            (true, true) => RenderType::LerpSpheresTransparent,
        }
    }
}
