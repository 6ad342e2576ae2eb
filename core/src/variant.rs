//! Loosely-typed serialized values.
//!
//! Resources describe themselves to the engine as a [`VariantMap`]: a keyed
//! structure whose values are [`Variant`]s. Loaders read the keys they know and
//! coerce each value into the type they expect, so a slightly wrong document
//! degrades to defaults instead of failing the whole load.
//!
//! Documents are stored as RON text:
//!
//! ```
//! use ember_core::variant::{parse_variant_map, Variant};
//!
//! let map = parse_variant_map(r#"{ "Properties": List([Int(0), Bool(false)]) }"#).unwrap();
//! assert_eq!(map["Properties"].to_list()[1], Variant::Bool(false));
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::math::{Mat4, Vec2, Vec3, Vec4};

/// Keyed collection of variants, ordered by key.
pub type VariantMap = BTreeMap<String, Variant>;

/// A tagged value of one of the engine's serializable types.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Variant {
    /// No value.
    #[default]
    Invalid,
    /// Boolean.
    Bool(bool),
    /// Signed 32-bit integer.
    Int(i32),
    /// 32-bit float.
    Float(f32),
    /// UTF-8 string.
    String(String),
    /// 2-component vector.
    Vector2([f32; 2]),
    /// 3-component vector.
    Vector3([f32; 3]),
    /// 4-component vector.
    Vector4([f32; 4]),
    /// Column-major 4x4 matrix.
    Matrix4([f32; 16]),
    /// Ordered list.
    List(Vec<Variant>),
    /// Nested map.
    Map(VariantMap),
}

/// Errors produced while reading serialized variant documents.
#[derive(Debug, thiserror::Error)]
pub enum VariantError {
    /// The RON text could not be parsed.
    #[error("malformed variant document: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// A value could not be written as RON text.
    #[error("failed to serialize variant document: {0}")]
    Serialize(#[from] ron::Error),
}

impl Variant {
    /// Returns `true` unless this is [`Variant::Invalid`].
    pub fn is_valid(&self) -> bool {
        !matches!(self, Self::Invalid)
    }

    /// Coerce to an integer. Floats truncate, booleans map to 0/1, everything else is 0.
    pub fn to_int(&self) -> i32 {
        match self {
            Self::Int(v) => *v,
            Self::Float(v) => *v as i32,
            Self::Bool(v) => i32::from(*v),
            Self::String(s) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }

    /// Coerce to a float. Integers convert, booleans map to 0/1, everything else is 0.
    pub fn to_float(&self) -> f32 {
        match self {
            Self::Float(v) => *v,
            Self::Int(v) => *v as f32,
            Self::Bool(v) => f32::from(u8::from(*v)),
            Self::String(s) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// Coerce to a boolean. Numbers are `true` when non-zero.
    pub fn to_bool(&self) -> bool {
        match self {
            Self::Bool(v) => *v,
            Self::Int(v) => *v != 0,
            Self::Float(v) => *v != 0.0,
            Self::String(s) => s == "true",
            _ => false,
        }
    }

    /// Borrow the string payload, or `""` for non-string variants.
    pub fn to_str(&self) -> &str {
        match self {
            Self::String(s) => s,
            _ => "",
        }
    }

    /// Borrow the list payload, or an empty slice for non-list variants.
    pub fn to_list(&self) -> &[Variant] {
        match self {
            Self::List(list) => list,
            _ => &[],
        }
    }

    /// Borrow the map payload.
    pub fn to_map(&self) -> Option<&VariantMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Coerce to a 2D vector. Scalars splat.
    pub fn to_vector2(&self) -> Vec2 {
        match self {
            Self::Vector2(v) => Vec2::from(*v),
            Self::Vector3(v) => Vec2::new(v[0], v[1]),
            Self::Vector4(v) => Vec2::new(v[0], v[1]),
            other => Vec2::repeat(other.to_float()),
        }
    }

    /// Coerce to a 3D vector. Scalars splat.
    pub fn to_vector3(&self) -> Vec3 {
        match self {
            Self::Vector2(v) => Vec3::new(v[0], v[1], 0.0),
            Self::Vector3(v) => Vec3::from(*v),
            Self::Vector4(v) => Vec3::new(v[0], v[1], v[2]),
            other => Vec3::repeat(other.to_float()),
        }
    }

    /// Coerce to a 4D vector. Scalars splat.
    pub fn to_vector4(&self) -> Vec4 {
        match self {
            Self::Vector2(v) => Vec4::new(v[0], v[1], 0.0, 0.0),
            Self::Vector3(v) => Vec4::new(v[0], v[1], v[2], 0.0),
            Self::Vector4(v) => Vec4::from(*v),
            other => Vec4::repeat(other.to_float()),
        }
    }

    /// Coerce to a matrix. Anything but a matrix yields identity.
    pub fn to_matrix4(&self) -> Mat4 {
        match self {
            Self::Matrix4(m) => Mat4::from_column_slice(m),
            _ => Mat4::identity(),
        }
    }
}

impl From<bool> for Variant {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Variant {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<f32> for Variant {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Variant {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Variant {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec2> for Variant {
    fn from(value: Vec2) -> Self {
        Self::Vector2(value.into())
    }
}

impl From<Vec3> for Variant {
    fn from(value: Vec3) -> Self {
        Self::Vector3(value.into())
    }
}

impl From<Vec4> for Variant {
    fn from(value: Vec4) -> Self {
        Self::Vector4(value.into())
    }
}

impl From<Mat4> for Variant {
    fn from(value: Mat4) -> Self {
        let mut data = [0.0; 16];
        data.copy_from_slice(value.as_slice());
        Self::Matrix4(data)
    }
}

impl From<Vec<Variant>> for Variant {
    fn from(value: Vec<Variant>) -> Self {
        Self::List(value)
    }
}

/// Parse a RON document into a [`VariantMap`].
pub fn parse_variant_map(text: &str) -> Result<VariantMap, VariantError> {
    Ok(ron::from_str(text)?)
}

/// Write a [`VariantMap`] as pretty-printed RON text.
pub fn write_variant_map(map: &VariantMap) -> Result<String, VariantError> {
    Ok(ron::ser::to_string_pretty(map, ron::ser::PrettyConfig::default())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(Variant::Float(2.9).to_int(), 2);
        assert_eq!(Variant::Bool(true).to_int(), 1);
        assert_eq!(Variant::Int(3).to_float(), 3.0);
        assert!(Variant::Int(5).to_bool());
        assert!(!Variant::Invalid.to_bool());
        assert_eq!(Variant::String("12".into()).to_int(), 12);
    }

    #[test]
    fn test_vector_coercion() {
        assert_eq!(Variant::Float(0.5).to_vector4(), Vec4::repeat(0.5));
        assert_eq!(
            Variant::Vector4([1.0, 2.0, 3.0, 4.0]).to_vector3(),
            Vec3::new(1.0, 2.0, 3.0)
        );
        assert_eq!(Variant::Invalid.to_matrix4(), Mat4::identity());
    }

    #[test]
    fn test_non_list_is_empty() {
        assert!(Variant::Int(1).to_list().is_empty());
        assert_eq!(Variant::Int(1).to_str(), "");
    }

    #[test]
    fn test_parse_document() {
        let text = r#"{
            "Properties": List([Int(0), Bool(false), Int(1), Int(2), Int(1), Bool(true), Bool(true)]),
            "Uniforms": List([List([Vector4((1.0, 0.0, 0.0, 1.0)), Int(16), String("tint")])]),
        }"#;
        let map = parse_variant_map(text).unwrap();
        assert_eq!(map["Properties"].to_list().len(), 7);

        let uniform = map["Uniforms"].to_list()[0].to_list();
        assert_eq!(uniform[0].to_vector4(), Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(uniform[2].to_str(), "tint");
    }

    #[test]
    fn test_document_survives_rewrite() {
        let mut map = VariantMap::new();
        map.insert("Shader".into(), Variant::from("void main() {}"));
        map.insert("Flags".into(), Variant::from(vec![Variant::Int(1), Variant::Bool(true)]));

        let text = write_variant_map(&map).unwrap();
        assert_eq!(parse_variant_map(&text).unwrap(), map);
    }

    #[test]
    fn test_parse_error_is_reported() {
        assert!(matches!(
            parse_variant_map("{ \"Shader\": "),
            Err(VariantError::Parse(_))
        ));
    }
}
