use core::fmt::Debug;

/// The numeric kinds a kernel can be instantiated with.
///
/// A run picks exactly one kind; it is substituted into shader text through its WGSL name
/// and must match the element type of every bound buffer.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    derive_more::Display,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum ElemType {
    /// 32-bit float.
    #[default]
    #[display("f32")]
    #[serde(rename = "f32")]
    F32,
    /// 16-bit float, requires the `shader-f16` device feature.
    #[display("f16")]
    #[serde(rename = "f16")]
    F16,
}

impl ElemType {
    /// The name of the type in WGSL.
    pub fn wgsl_name(&self) -> &'static str {
        match self {
            ElemType::F32 => "f32",
            ElemType::F16 => "f16",
        }
    }

    /// The size of one element in bytes.
    pub fn size(&self) -> usize {
        match self {
            ElemType::F32 => core::mem::size_of::<f32>(),
            ElemType::F16 => core::mem::size_of::<half::f16>(),
        }
    }

    /// The WGSL `enable` directive needed before using the type, if any.
    pub fn wgsl_extension(&self) -> Option<&'static str> {
        match self {
            ElemType::F32 => None,
            ElemType::F16 => Some("enable f16;"),
        }
    }
}

/// Host side element type backing a device buffer.
pub trait Element: bytemuck::Pod + Debug + Send + Sync + 'static {
    /// The numeric kind of the element.
    const ELEM: ElemType;

    /// Convert from `f32`, rounding if needed.
    fn from_f32(value: f32) -> Self;
    /// Convert to `f32`.
    fn to_f32(self) -> f32;

    /// Convert a slice of `f32`.
    fn from_f32_slice(values: &[f32]) -> Vec<Self> {
        values.iter().map(|v| Self::from_f32(*v)).collect()
    }

    /// Reinterpret raw bytes as elements.
    fn from_bytes(bytes: &[u8]) -> Vec<Self> {
        bytemuck::pod_collect_to_vec(bytes)
    }

    /// View elements as raw bytes.
    fn as_bytes(values: &[Self]) -> &[u8] {
        bytemuck::cast_slice(values)
    }
}

impl Element for f32 {
    const ELEM: ElemType = ElemType::F32;

    fn from_f32(value: f32) -> Self {
        value
    }

    fn to_f32(self) -> f32 {
        self
    }
}

impl Element for half::f16 {
    const ELEM: ElemType = ElemType::F16;

    fn from_f32(value: f32) -> Self {
        half::f16::from_f32(value)
    }

    fn to_f32(self) -> f32 {
        half::f16::to_f32(self)
    }
}
