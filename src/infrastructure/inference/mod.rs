//! Inference backends implementing the predictor capability

mod onnx;

pub use onnx::{OnnxDeserializer, OnnxPredictor};
