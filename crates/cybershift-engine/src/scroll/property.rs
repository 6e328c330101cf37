use std::fmt;
use std::str::FromStr;

use crate::scene::{MaterialParam, MeshId};
use crate::viewport::{LayerKey, ViewportHandle};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// A scalar property a timeline can animate, e.g. `position.z` or
/// `material.displacementScale`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PropertyPath {
    Position(Axis),
    /// Euler angle in radians.
    Rotation(Axis),
    Scale(Axis),
    Material(MaterialParam),
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let axis = |a: &Axis| match a {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        };
        match self {
            PropertyPath::Position(a) => write!(f, "position.{}", axis(a)),
            PropertyPath::Rotation(a) => write!(f, "rotation.{}", axis(a)),
            PropertyPath::Scale(a) => write!(f, "scale.{}", axis(a)),
            PropertyPath::Material(p) => write!(f, "material.{p}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPathError {
    input: String,
}

impl fmt::Display for PropertyPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown property path `{}`", self.input)
    }
}

impl std::error::Error for PropertyPathError {}

impl FromStr for PropertyPath {
    type Err = PropertyPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || PropertyPathError { input: s.to_string() };
        let (head, tail) = s.trim().split_once('.').ok_or_else(err)?;

        if head == "material" {
            return tail.parse().map(PropertyPath::Material).map_err(|()| err());
        }

        let axis = match tail {
            "x" => Axis::X,
            "y" => Axis::Y,
            "z" => Axis::Z,
            _ => return Err(err()),
        };
        match head {
            "position" => Ok(PropertyPath::Position(axis)),
            "rotation" => Ok(PropertyPath::Rotation(axis)),
            "scale" => Ok(PropertyPath::Scale(axis)),
            _ => Err(err()),
        }
    }
}

/// A mesh inside a layer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TargetRef {
    pub layer: LayerKey,
    pub mesh: MeshId,
}

impl TargetRef {
    pub fn main(mesh: MeshId) -> Self {
        Self { layer: LayerKey::Main, mesh }
    }

    pub fn viewport(handle: ViewportHandle, mesh: MeshId) -> Self {
        Self { layer: LayerKey::Viewport(handle), mesh }
    }
}

/// Whatever owns the animated objects.
///
/// Both methods tolerate targets that no longer exist: `get` returns `None` and `set`
/// returns `false`.
pub trait PropertyTargets {
    fn get(&self, target: TargetRef, path: PropertyPath) -> Option<f32>;
    fn set(&mut self, target: TargetRef, path: PropertyPath, value: f32) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_transform_and_material_paths() {
        assert_eq!("position.z".parse(), Ok(PropertyPath::Position(Axis::Z)));
        assert_eq!("rotation.y".parse(), Ok(PropertyPath::Rotation(Axis::Y)));
        assert_eq!(
            "material.displacementScale".parse(),
            Ok(PropertyPath::Material(MaterialParam::DisplacementScale))
        );
    }

    #[test]
    fn display_matches_parse_input() {
        for s in ["position.x", "scale.z", "material.roughness"] {
            assert_eq!(s.parse::<PropertyPath>().unwrap().to_string(), s);
        }
    }

    #[test]
    fn rejects_unknown_paths() {
        for bad in ["position", "position.w", "color.r", "material.opacity", ""] {
            assert!(bad.parse::<PropertyPath>().is_err(), "{bad}");
        }
    }
}
