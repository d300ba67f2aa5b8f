// Model artifact management: ONNX session wrappers, the registry that
// owns them, and the artifact download helper.

pub mod download;
pub mod onnx;
pub mod registry;

pub use onnx::{CallingConvention, OnnxModel, RawOutput, TensorData};
pub use registry::{ArtifactState, ModelKind, ModelRegistry};
