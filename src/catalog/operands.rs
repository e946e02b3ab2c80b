/*!
  Enumerated and bitmask operand kinds. The enumerations are `repr(u32)` so that `num_enum`
  can map a raw operand word to a variant; values outside of a listed enumeration survive
  decoding inside `Enumerant` and are only rejected by verification.
*/

use bitflags::bitflags;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::{Display as StrumDisplay, IntoStaticStr};

use crate::bytecode::{Field, FieldReader, FieldWriter, Word};
use crate::error::Result;

#[derive(
  StrumDisplay, IntoStaticStr, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,          Eq,               PartialEq,    Debug, Hash
)]
#[repr(u32)]
#[allow(non_camel_case_types)]
pub enum SourceLanguage {
  Unknown    = 0,
  ESSL       = 1,
  GLSL       = 2,
  OpenCL_C   = 3,
  OpenCL_CPP = 4,
  HLSL       = 5
}

#[derive(
  StrumDisplay, IntoStaticStr, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,          Eq,               PartialEq,    Debug, Hash
)]
#[repr(u32)]
pub enum ExecutionModel {
  Vertex                 = 0,
  TessellationControl    = 1,
  TessellationEvaluation = 2,
  Geometry               = 3,
  Fragment               = 4,
  GLCompute              = 5,
  Kernel                 = 6
}

#[derive(
  StrumDisplay, IntoStaticStr, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,          Eq,               PartialEq,    Debug, Hash
)]
#[repr(u32)]
pub enum AddressingModel {
  Logical    = 0,
  Physical32 = 1,
  Physical64 = 2
}

#[derive(
  StrumDisplay, IntoStaticStr, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,          Eq,               PartialEq,    Debug, Hash
)]
#[repr(u32)]
pub enum MemoryModel {
  Simple  = 0,
  GLSL450 = 1,
  OpenCL  = 2
}

#[derive(
  StrumDisplay, IntoStaticStr, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,          Eq,               PartialEq,    Debug, Hash
)]
#[repr(u32)]
pub enum ExecutionMode {
  Invocations             = 0,
  SpacingEqual            = 1,
  SpacingFractionalEven   = 2,
  SpacingFractionalOdd    = 3,
  VertexOrderCw           = 4,
  VertexOrderCcw          = 5,
  PixelCenterInteger      = 6,
  OriginUpperLeft         = 7,
  OriginLowerLeft         = 8,
  EarlyFragmentTests      = 9,
  PointMode               = 10,
  Xfb                     = 11,
  DepthReplacing          = 12,
  DepthGreater            = 14,
  DepthLess               = 15,
  DepthUnchanged          = 16,
  LocalSize               = 17,
  LocalSizeHint           = 18,
  InputPoints             = 19,
  InputLines              = 20,
  InputLinesAdjacency     = 21,
  Triangles               = 22,
  InputTrianglesAdjacency = 23,
  Quads                   = 24,
  Isolines                = 25,
  OutputVertices          = 26,
  OutputPoints            = 27,
  OutputLineStrip         = 28,
  OutputTriangleStrip     = 29,
  VecTypeHint             = 30,
  ContractionOff          = 31
}

#[derive(
  StrumDisplay, IntoStaticStr, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,          Eq,               PartialEq,    Debug, Hash
)]
#[repr(u32)]
pub enum StorageClass {
  UniformConstant = 0,
  Input           = 1,
  Uniform         = 2,
  Output          = 3,
  Workgroup       = 4,
  CrossWorkgroup  = 5,
  Private         = 6,
  Function        = 7,
  Generic         = 8,
  PushConstant    = 9,
  AtomicCounter   = 10,
  Image           = 11
}

#[derive(
  StrumDisplay, IntoStaticStr, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,          Eq,               PartialEq,    Debug, Hash
)]
#[repr(u32)]
pub enum Decoration {
  RelaxedPrecision     = 0,
  SpecId               = 1,
  Block                = 2,
  BufferBlock          = 3,
  RowMajor             = 4,
  ColMajor             = 5,
  ArrayStride          = 6,
  MatrixStride         = 7,
  GLSLShared           = 8,
  GLSLPacked           = 9,
  CPacked              = 10,
  BuiltIn              = 11,
  NoPerspective        = 13,
  Flat                 = 14,
  Patch                = 15,
  Centroid             = 16,
  Sample               = 17,
  Invariant            = 18,
  Restrict             = 19,
  Aliased              = 20,
  Volatile             = 21,
  Constant             = 22,
  Coherent             = 23,
  NonWritable          = 24,
  NonReadable          = 25,
  Uniform              = 26,
  SaturatedConversion  = 28,
  Stream               = 29,
  Location             = 30,
  Component            = 31,
  Index                = 32,
  Binding              = 33,
  DescriptorSet        = 34,
  Offset               = 35,
  XfbBuffer            = 36,
  XfbStride            = 37,
  FuncParamAttr        = 38,
  FPRoundingMode       = 39,
  FPFastMathMode       = 40,
  LinkageAttributes    = 41,
  NoContraction        = 42,
  InputAttachmentIndex = 43,
  Alignment            = 44
}

#[derive(
  StrumDisplay, IntoStaticStr, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,          Eq,               PartialEq,    Debug, Hash
)]
#[repr(u32)]
pub enum Capability {
  Matrix                            = 0,
  Shader                            = 1,
  Geometry                          = 2,
  Tessellation                      = 3,
  Addresses                         = 4,
  Linkage                           = 5,
  Kernel                            = 6,
  Vector16                          = 7,
  Float16Buffer                     = 8,
  Float16                           = 9,
  Float64                           = 10,
  Int64                             = 11,
  Int64Atomics                      = 12,
  ImageBasic                        = 13,
  ImageReadWrite                    = 14,
  ImageMipmap                       = 15,
  Pipes                             = 17,
  Groups                            = 18,
  DeviceEnqueue                     = 19,
  LiteralSampler                    = 20,
  AtomicStorage                     = 21,
  Int16                             = 22,
  TessellationPointSize             = 23,
  GeometryPointSize                 = 24,
  ImageGatherExtended               = 25,
  StorageImageMultisample           = 27,
  UniformBufferArrayDynamicIndexing = 28,
  SampledImageArrayDynamicIndexing  = 29,
  StorageBufferArrayDynamicIndexing = 30,
  StorageImageArrayDynamicIndexing  = 31,
  ClipDistance                      = 32,
  CullDistance                      = 33,
  ImageCubeArray                    = 34,
  SampleRateShading                 = 35,
  ImageRect                         = 36,
  SampledRect                       = 37,
  GenericPointer                    = 38,
  Int8                              = 39,
  InputAttachment                   = 40,
  SparseResidency                   = 41,
  MinLod                            = 42,
  Sampled1D                         = 43,
  Image1D                           = 44,
  SampledCubeArray                  = 45,
  SampledBuffer                     = 46,
  ImageBuffer                       = 47,
  ImageMSArray                      = 48,
  StorageImageExtendedFormats       = 49,
  ImageQuery                        = 50,
  DerivativeControl                 = 51,
  InterpolationFunction             = 52,
  TransformFeedback                 = 53,
  GeometryStreams                   = 54,
  StorageImageReadWithoutFormat     = 55,
  StorageImageWriteWithoutFormat    = 56,
  MultiViewport                     = 57
}

bitflags! {
  #[repr(transparent)]
  #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
  pub struct FunctionControl: Word {
    const INLINE      = 1 << 0;
    const DONT_INLINE = 1 << 1;
    const PURE        = 1 << 2;
    const CONST       = 1 << 3;
  }
}

bitflags! {
  #[repr(transparent)]
  #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
  pub struct SelectionControl: Word {
    const FLATTEN      = 1 << 0;
    const DONT_FLATTEN = 1 << 1;
  }
}

bitflags! {
  #[repr(transparent)]
  #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
  pub struct LoopControl: Word {
    const UNROLL      = 1 << 0;
    const DONT_UNROLL = 1 << 1;
  }
}

/// A bitmask operand is one word. Unknown bits are kept when read and rejected by `verify`.
macro_rules! mask_field {
  ($($mask:ident),*) => {
    $(
      impl Field for $mask {
        fn word_count(&self) -> usize {
          1
        }

        fn read(reader: &mut FieldReader<'_>) -> Result<Self> {
          reader.read_word().map($mask::from_bits_retain)
        }

        fn write(&self, writer: &mut FieldWriter<'_>) {
          writer.write_word(self.bits());
        }

        fn verify(&self) -> std::result::Result<(), String> {
          match $mask::from_bits(self.bits()) {
            Some(_) => Ok(()),
            None    => Err(format!("{:#x} is not a valid {}", self.bits(), stringify!($mask)))
          }
        }
      }
    )*
  };
}

mask_field!(FunctionControl, SelectionControl, LoopControl);


#[cfg(test)]
mod tests {
  use super::*;
  use std::convert::TryFrom;

  #[test]
  fn enumerations_map_raw_words() {
    assert_eq!(Capability::try_from(1u32).unwrap(), Capability::Shader);
    assert!(Capability::try_from(16u32).is_err());
    assert_eq!(Word::from(ExecutionMode::OriginUpperLeft), 7);
    assert_eq!(Word::from(Decoration::Location), 30);
    let name: &'static str = MemoryModel::GLSL450.into();
    assert_eq!(name, "GLSL450");
  }

  #[test]
  fn masks_keep_unknown_bits() {
    let mut reader = FieldReader::new(54, &[0x11]);
    let control = FunctionControl::read(&mut reader).unwrap();
    assert_eq!(control.bits(), 0x11);
    assert!(control.contains(FunctionControl::INLINE));
    assert_eq!(control.verify().unwrap_err(), "0x11 is not a valid FunctionControl");

    let mut out = [0; 1];
    control.write(&mut FieldWriter::new(&mut out));
    assert_eq!(out, [0x11]);
  }

  #[test]
  fn masks_accept_known_bits() {
    assert!(FunctionControl::empty().verify().is_ok());
    assert!((FunctionControl::PURE | FunctionControl::DONT_INLINE).verify().is_ok());
    assert!(LoopControl::UNROLL.verify().is_ok());
    assert!(SelectionControl::from_bits_retain(4).verify().is_err());
  }
}
