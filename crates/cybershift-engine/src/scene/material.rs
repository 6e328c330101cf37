use std::fmt;
use std::str::FromStr;

use crate::paint::Color;
use crate::pulse::ClothEffect;

/// Pipeline family of a material; see `render::MaterialRegistry`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum MaterialKind {
    Standard,
    Wireframe,
    Cloth,
}

/// Lit surface with a procedural weave displacement.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StandardMaterial {
    pub color: Color,
    pub roughness: f32,
    pub metalness: f32,
    pub emissive: Color,
    pub emissive_intensity: f32,
    /// Height of the weave displacement along the surface normal; 0 is flat.
    pub displacement_scale: f32,
    pub double_sided: bool,
}

impl Default for StandardMaterial {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            roughness: 1.0,
            metalness: 0.0,
            emissive: Color::BLACK,
            emissive_intensity: 1.0,
            displacement_scale: 0.0,
            double_sided: false,
        }
    }
}

impl StandardMaterial {
    pub fn new(color: Color, roughness: f32, metalness: f32) -> Self {
        Self { color, roughness, metalness, ..Self::default() }
    }
}

/// Unlit line rendering of every triangle edge.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WireframeMaterial {
    pub color: Color,
    pub emissive: Color,
    pub emissive_intensity: f32,
}

#[derive(Debug, Clone)]
pub enum Material {
    Standard(StandardMaterial),
    Wireframe(WireframeMaterial),
    Cloth(ClothEffect),
}

impl Material {
    pub fn kind(&self) -> MaterialKind {
        match self {
            Material::Standard(_) => MaterialKind::Standard,
            Material::Wireframe(_) => MaterialKind::Wireframe,
            Material::Cloth(_) => MaterialKind::Cloth,
        }
    }

    /// Whether back faces are drawn.
    pub fn double_sided(&self) -> bool {
        match self {
            Material::Standard(m) => m.double_sided,
            Material::Wireframe(_) | Material::Cloth(_) => true,
        }
    }

    pub fn as_cloth_mut(&mut self) -> Option<&mut ClothEffect> {
        match self {
            Material::Cloth(c) => Some(c),
            _ => None,
        }
    }

    /// Reads an animatable scalar. `None` when this material has no such parameter.
    pub fn param(&self, param: MaterialParam) -> Option<f32> {
        match (self, param) {
            (Material::Standard(m), MaterialParam::DisplacementScale) => Some(m.displacement_scale),
            (Material::Standard(m), MaterialParam::Roughness) => Some(m.roughness),
            (Material::Standard(m), MaterialParam::Metalness) => Some(m.metalness),
            (Material::Standard(m), MaterialParam::EmissiveIntensity) => Some(m.emissive_intensity),
            (Material::Wireframe(m), MaterialParam::EmissiveIntensity) => Some(m.emissive_intensity),
            _ => None,
        }
    }

    /// Writes an animatable scalar. Returns `false` when the parameter does not exist.
    pub fn set_param(&mut self, param: MaterialParam, value: f32) -> bool {
        let slot = match (self, param) {
            (Material::Standard(m), MaterialParam::DisplacementScale) => &mut m.displacement_scale,
            (Material::Standard(m), MaterialParam::Roughness) => &mut m.roughness,
            (Material::Standard(m), MaterialParam::Metalness) => &mut m.metalness,
            (Material::Standard(m), MaterialParam::EmissiveIntensity) => &mut m.emissive_intensity,
            (Material::Wireframe(m), MaterialParam::EmissiveIntensity) => &mut m.emissive_intensity,
            _ => return false,
        };
        *slot = value;
        true
    }
}

/// Scalar material parameters that timelines can drive.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MaterialParam {
    DisplacementScale,
    Roughness,
    Metalness,
    EmissiveIntensity,
}

impl MaterialParam {
    pub fn name(self) -> &'static str {
        match self {
            MaterialParam::DisplacementScale => "displacementScale",
            MaterialParam::Roughness => "roughness",
            MaterialParam::Metalness => "metalness",
            MaterialParam::EmissiveIntensity => "emissiveIntensity",
        }
    }
}

impl fmt::Display for MaterialParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MaterialParam {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "displacementScale" => Ok(MaterialParam::DisplacementScale),
            "roughness" => Ok(MaterialParam::Roughness),
            "metalness" => Ok(MaterialParam::Metalness),
            "emissiveIntensity" => Ok(MaterialParam::EmissiveIntensity),
            _ => Err(()),
        }
    }
}
