// Element Types
// Maps Rust scalars onto the JS typed array kinds WebGPU buffers are filled
// from, and handles the little-endian byte layout buffers use on the device.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    Float32,
    Float64,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
}

impl DType {
    pub const fn byte_size(self) -> usize {
        match self {
            DType::Int8 | DType::Uint8 => 1,
            DType::Int16 | DType::Uint16 => 2,
            DType::Float32 | DType::Int32 | DType::Uint32 => 4,
            DType::Float64 => 8,
        }
    }

    /// Name of the matching JS typed array constructor.
    pub const fn name(self) -> &'static str {
        match self {
            DType::Float32 => "Float32Array",
            DType::Float64 => "Float64Array",
            DType::Int8 => "Int8Array",
            DType::Uint8 => "Uint8Array",
            DType::Int16 => "Int16Array",
            DType::Uint16 => "Uint16Array",
            DType::Int32 => "Int32Array",
            DType::Uint32 => "Uint32Array",
        }
    }

    /// WGSL scalar type for storage buffers, if WGSL has one.
    pub const fn wgsl(self) -> Option<&'static str> {
        match self {
            DType::Float32 => Some("f32"),
            DType::Int32 => Some("i32"),
            DType::Uint32 => Some("u32"),
            _ => None,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub trait Scalar: Copy + Default + fmt::Debug + 'static {
    const DTYPE: DType;

    fn write_le(self, out: &mut Vec<u8>);

    fn read_le(bytes: &[u8]) -> Self;

    fn encode(values: &[Self]) -> Vec<u8> {
        let mut out = Vec::with_capacity(values.len() * Self::DTYPE.byte_size());
        for &v in values {
            v.write_le(&mut out);
        }
        out
    }

    // A trailing partial element (padding) is dropped.
    fn decode(bytes: &[u8]) -> Vec<Self> {
        bytes
            .chunks_exact(Self::DTYPE.byte_size())
            .map(Self::read_le)
            .collect()
    }
}

macro_rules! impl_scalar {
    ($($ty:ty => $dtype:ident),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const DTYPE: DType = DType::$dtype;

                fn write_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                fn read_le(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_le_bytes(raw)
                }
            }
        )*
    };
}

impl_scalar! {
    f32 => Float32,
    f64 => Float64,
    i8 => Int8,
    u8 => Uint8,
    i16 => Int16,
    u16 => Uint16,
    i32 => Int32,
    u32 => Uint32,
}
