//! Typed uniform values.
//!
//! - [`UniformType`] - the type tag recorded next to every stored value
//! - [`UniformValue`] - a single owned value (material declarations, frame globals)
//! - [`UniformData`] - a borrowed array of values ready to upload
//! - [`SharedUniform`] - caller-owned storage that is read at upload time
//!
//! `SharedUniform` replaces "pointer + count" bindings: the owner keeps a clone,
//! mutates it whenever it likes (skinning palettes, animated tints) and every
//! consumer holding another clone sees the current contents on its next read.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::math::{Mat4, Vec2, Vec3, Vec4};
use crate::variant::Variant;

/// Type tag of a uniform slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformType {
    /// `int` / sampler unit.
    Integer,
    /// `float`.
    Float,
    /// `vec2`.
    Vector2,
    /// `vec3`.
    Vector3,
    /// `vec4`.
    Vector4,
    /// `mat4`.
    Matrix4,
}

impl UniformType {
    /// Number of `f32`/`i32` components in one element of this type.
    pub fn components(&self) -> usize {
        match self {
            Self::Integer | Self::Float => 1,
            Self::Vector2 => 2,
            Self::Vector3 => 3,
            Self::Vector4 => 4,
            Self::Matrix4 => 16,
        }
    }
}

/// A single owned uniform value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// Integer value.
    Integer(i32),
    /// Float value.
    Float(f32),
    /// 2D vector.
    Vector2(Vec2),
    /// 3D vector.
    Vector3(Vec3),
    /// 4D vector.
    Vector4(Vec4),
    /// 4x4 matrix.
    Matrix4(Mat4),
}

impl UniformValue {
    /// The type tag of this value.
    pub fn uniform_type(&self) -> UniformType {
        match self {
            Self::Integer(_) => UniformType::Integer,
            Self::Float(_) => UniformType::Float,
            Self::Vector2(_) => UniformType::Vector2,
            Self::Vector3(_) => UniformType::Vector3,
            Self::Vector4(_) => UniformType::Vector4,
            Self::Matrix4(_) => UniformType::Matrix4,
        }
    }

    /// Borrow this value as a one-element upload.
    pub fn as_data(&self) -> UniformData<'_> {
        match self {
            Self::Integer(v) => UniformData::Integer(std::slice::from_ref(v)),
            Self::Float(v) => UniformData::Float(std::slice::from_ref(v)),
            Self::Vector2(v) => UniformData::Vector2(std::slice::from_ref(v)),
            Self::Vector3(v) => UniformData::Vector3(std::slice::from_ref(v)),
            Self::Vector4(v) => UniformData::Vector4(std::slice::from_ref(v)),
            Self::Matrix4(v) => UniformData::Matrix4(std::slice::from_ref(v)),
        }
    }

    /// Convert a serialized value.
    ///
    /// Vector and matrix variants keep their shape, integers and booleans
    /// become [`UniformValue::Integer`], and anything else is read as a float.
    pub fn from_variant(variant: &Variant) -> Self {
        match variant {
            Variant::Int(_) | Variant::Bool(_) => Self::Integer(variant.to_int()),
            Variant::Vector2(_) => Self::Vector2(variant.to_vector2()),
            Variant::Vector3(_) => Self::Vector3(variant.to_vector3()),
            Variant::Vector4(_) => Self::Vector4(variant.to_vector4()),
            Variant::Matrix4(_) => Self::Matrix4(variant.to_matrix4()),
            other => Self::Float(other.to_float()),
        }
    }
}

impl From<i32> for UniformValue {
    fn from(value: i32) -> Self {
        Self::Integer(value)
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<Vec2> for UniformValue {
    fn from(value: Vec2) -> Self {
        Self::Vector2(value)
    }
}

impl From<Vec3> for UniformValue {
    fn from(value: Vec3) -> Self {
        Self::Vector3(value)
    }
}

impl From<Vec4> for UniformValue {
    fn from(value: Vec4) -> Self {
        Self::Vector4(value)
    }
}

impl From<Mat4> for UniformValue {
    fn from(value: Mat4) -> Self {
        Self::Matrix4(value)
    }
}

/// A borrowed array of uniform elements, as handed to a graphics backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformData<'a> {
    /// `int[]`
    Integer(&'a [i32]),
    /// `float[]`
    Float(&'a [f32]),
    /// `vec2[]`
    Vector2(&'a [Vec2]),
    /// `vec3[]`
    Vector3(&'a [Vec3]),
    /// `vec4[]`
    Vector4(&'a [Vec4]),
    /// `mat4[]`
    Matrix4(&'a [Mat4]),
}

impl UniformData<'_> {
    /// The element type.
    pub fn uniform_type(&self) -> UniformType {
        match self {
            Self::Integer(_) => UniformType::Integer,
            Self::Float(_) => UniformType::Float,
            Self::Vector2(_) => UniformType::Vector2,
            Self::Vector3(_) => UniformType::Vector3,
            Self::Vector4(_) => UniformType::Vector4,
            Self::Matrix4(_) => UniformType::Matrix4,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Self::Integer(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Vector2(v) => v.len(),
            Self::Vector3(v) => v.len(),
            Self::Vector4(v) => v.len(),
            Self::Matrix4(v) => v.len(),
        }
    }

    /// Returns `true` if there are no elements to upload.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keep at most `count` elements.
    pub fn truncated(self, count: usize) -> Self {
        fn take<T>(slice: &[T], count: usize) -> &[T] {
            &slice[..count.min(slice.len())]
        }
        match self {
            Self::Integer(v) => Self::Integer(take(v, count)),
            Self::Float(v) => Self::Float(take(v, count)),
            Self::Vector2(v) => Self::Vector2(take(v, count)),
            Self::Vector3(v) => Self::Vector3(take(v, count)),
            Self::Vector4(v) => Self::Vector4(take(v, count)),
            Self::Matrix4(v) => Self::Matrix4(take(v, count)),
        }
    }

    /// Flatten float-typed data into its `f32` components (column-major for matrices).
    ///
    /// Integer data is converted element-wise.
    pub fn to_floats(&self) -> Vec<f32> {
        match self {
            Self::Integer(v) => v.iter().map(|i| *i as f32).collect(),
            Self::Float(v) => v.to_vec(),
            Self::Vector2(v) => v.iter().flat_map(|e| e.iter().copied()).collect(),
            Self::Vector3(v) => v.iter().flat_map(|e| e.iter().copied()).collect(),
            Self::Vector4(v) => v.iter().flat_map(|e| e.iter().copied()).collect(),
            Self::Matrix4(v) => v.iter().flat_map(|e| e.iter().copied()).collect(),
        }
    }
}

/// Element types that can be stored in a [`SharedUniform`].
pub trait UniformElement: Copy + Send + Sync + 'static {
    /// Type tag for this element.
    const TYPE: UniformType;

    /// Borrow a slice of elements as upload data.
    fn as_data(values: &[Self]) -> UniformData<'_>;
}

macro_rules! impl_uniform_element {
    ($ty:ty, $variant:ident) => {
        impl UniformElement for $ty {
            const TYPE: UniformType = UniformType::$variant;

            fn as_data(values: &[Self]) -> UniformData<'_> {
                UniformData::$variant(values)
            }
        }
    };
}

impl_uniform_element!(i32, Integer);
impl_uniform_element!(f32, Float);
impl_uniform_element!(Vec2, Vector2);
impl_uniform_element!(Vec3, Vector3);
impl_uniform_element!(Vec4, Vector4);
impl_uniform_element!(Mat4, Matrix4);

/// Caller-owned uniform storage read live by whoever holds a clone.
///
/// Cloning is cheap and shares the storage. Writers take the write lock only
/// for the duration of an update, readers only for the duration of an upload.
///
/// # Example
///
/// ```
/// use ember_core::math::Vec4;
/// use ember_core::uniform::SharedUniform;
///
/// let tint = SharedUniform::from_value(Vec4::new(1.0, 0.0, 0.0, 1.0));
/// let reader = tint.clone();
///
/// tint.set(0, Vec4::new(0.0, 1.0, 0.0, 1.0));
/// assert_eq!(reader.get(0), Some(Vec4::new(0.0, 1.0, 0.0, 1.0)));
/// ```
#[derive(Debug)]
pub struct SharedUniform<T: UniformElement> {
    values: Arc<RwLock<Vec<T>>>,
}

impl<T: UniformElement> Clone for SharedUniform<T> {
    fn clone(&self) -> Self {
        Self {
            values: Arc::clone(&self.values),
        }
    }
}

impl<T: UniformElement> SharedUniform<T> {
    /// Create storage holding `values`.
    pub fn new(values: Vec<T>) -> Self {
        Self {
            values: Arc::new(RwLock::new(values)),
        }
    }

    /// Create storage holding a single value.
    pub fn from_value(value: T) -> Self {
        Self::new(vec![value])
    }

    /// Number of stored elements.
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    /// Returns `true` if no elements are stored.
    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }

    /// Read one element.
    pub fn get(&self, index: usize) -> Option<T> {
        self.values.read().get(index).copied()
    }

    /// Overwrite one element. Out-of-range writes are ignored.
    pub fn set(&self, index: usize, value: T) {
        if let Some(slot) = self.values.write().get_mut(index) {
            *slot = value;
        }
    }

    /// Replace the whole contents.
    pub fn replace(&self, values: Vec<T>) {
        *self.values.write() = values;
    }

    /// Lock for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, Vec<T>> {
        self.values.read()
    }

    /// Lock for writing.
    pub fn write(&self) -> RwLockWriteGuard<'_, Vec<T>> {
        self.values.write()
    }

    /// Returns `true` if both handles share the same storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.values, &other.values)
    }
}

/// Type-erased read access to a [`SharedUniform`].
pub trait UniformSource: Send + Sync {
    /// Type tag of the stored elements.
    fn uniform_type(&self) -> UniformType;

    /// Run `f` with the current contents while the storage is read-locked.
    fn with_data(&self, f: &mut dyn FnMut(UniformData<'_>));
}

impl<T: UniformElement> UniformSource for SharedUniform<T> {
    fn uniform_type(&self) -> UniformType {
        T::TYPE
    }

    fn with_data(&self, f: &mut dyn FnMut(UniformData<'_>)) {
        let values = self.values.read();
        f(T::as_data(&values));
    }
}
