//! Model identity and per-model input contract

mod entity;

pub use entity::{ModelInputSpec, ModelName, Normalization, CAFFE_BGR_MEANS};
