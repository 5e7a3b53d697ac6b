//! ONNX-backed predictors running on the CPU via tract

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tract_onnx::prelude::*;
use tracing::{debug, info};

use crate::domain::{ArtifactDeserializer, DomainError, ImageTensor, ModelName, Predictor};

/// Loads `<model>_model.onnx` artifacts into runnable plans
#[derive(Debug, Clone, Copy, Default)]
pub struct OnnxDeserializer;

impl OnnxDeserializer {
    pub fn new() -> Self {
        Self
    }
}

impl ArtifactDeserializer for OnnxDeserializer {
    fn deserialize(
        &self,
        model: ModelName,
        path: &Path,
    ) -> Result<Arc<dyn Predictor>, DomainError> {
        let spec = model.input_spec();
        let input_shape = [1, spec.height as usize, spec.width as usize, 3];

        debug!(model = %model, path = %path.display(), "Loading ONNX graph");

        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|graph| graph.with_input_fact(0, f32::fact(input_shape).into()))
            .and_then(|graph| graph.into_optimized())
            .and_then(|graph| graph.into_runnable())
            .map_err(|e| DomainError::deserialize(model.as_str(), format!("{:#}", e)))?;

        info!(model = %model, path = %path.display(), "Model ready");

        Ok(Arc::new(OnnxPredictor {
            model,
            path: path.to_path_buf(),
            plan,
        }))
    }
}

/// One optimized ONNX graph
pub struct OnnxPredictor {
    model: ModelName,
    path: PathBuf,
    plan: TypedRunnableModel<TypedModel>,
}

impl fmt::Debug for OnnxPredictor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnnxPredictor")
            .field("model", &self.model)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl Predictor for OnnxPredictor {
    fn classify(&self, tensor: &ImageTensor) -> Result<Vec<f32>, DomainError> {
        let inference_err = |message: String| DomainError::inference(self.model.as_str(), message);

        if tensor.model() != self.model {
            return Err(inference_err(format!(
                "tensor was prepared for '{}'",
                tensor.model()
            )));
        }

        let input = Tensor::from_shape(&tensor.shape(), &tensor.to_vec())
            .map_err(|e| inference_err(format!("{:#}", e)))?;

        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| inference_err(format!("{:#}", e)))?;

        let first = outputs
            .first()
            .ok_or_else(|| inference_err("model produced no outputs".to_string()))?;

        let probabilities = first
            .to_array_view::<f32>()
            .map_err(|e| inference_err(format!("{:#}", e)))?;

        Ok(probabilities.iter().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};

    use super::*;
    use crate::domain::prepare;

    fn varint(mut value: u64, out: &mut Vec<u8>) {
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                out.push(byte);
                return;
            }
            out.push(byte | 0x80);
        }
    }

    fn int_field(number: u64, value: u64) -> Vec<u8> {
        let mut out = Vec::new();
        varint(number << 3, &mut out);
        varint(value, &mut out);
        out
    }

    fn bytes_field(number: u64, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        varint((number << 3) | 2, &mut out);
        varint(data.len() as u64, &mut out);
        out.extend_from_slice(data);
        out
    }

    fn float_value_info(name: &str, dims: &[u64]) -> Vec<u8> {
        let shape: Vec<u8> = dims
            .iter()
            .flat_map(|d| bytes_field(1, &int_field(1, *d)))
            .collect();
        let tensor_type = [int_field(1, 1), bytes_field(2, &shape)].concat();
        let type_proto = bytes_field(1, &tensor_type);

        [bytes_field(1, name.as_bytes()), bytes_field(2, &type_proto)].concat()
    }

    /// Serialized opset-13 graph averaging an NHWC image over H and W,
    /// giving one value per channel
    fn channel_mean_model(height: u64, width: u64) -> Vec<u8> {
        let axes = [
            bytes_field(1, b"axes"),
            int_field(8, 1),
            int_field(8, 2),
            int_field(20, 7),
        ]
        .concat();
        let keepdims = [bytes_field(1, b"keepdims"), int_field(3, 0), int_field(20, 2)].concat();

        let node = [
            bytes_field(1, b"input"),
            bytes_field(2, b"output"),
            bytes_field(3, b"channel_mean"),
            bytes_field(4, b"ReduceMean"),
            bytes_field(5, &axes),
            bytes_field(5, &keepdims),
        ]
        .concat();

        let graph = [
            bytes_field(1, &node),
            bytes_field(2, b"leaf_test"),
            bytes_field(11, &float_value_info("input", &[1, height, width, 3])),
            bytes_field(12, &float_value_info("output", &[1, 3])),
        ]
        .concat();

        let opset = [bytes_field(1, b""), int_field(2, 13)].concat();

        [int_field(1, 7), bytes_field(7, &graph), bytes_field(8, &opset)].concat()
    }

    #[test]
    fn test_classify_runs_graph_on_prepared_tensor() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("resnet_model.onnx");
        std::fs::write(&path, channel_mean_model(224, 224)).unwrap();

        let predictor = OnnxDeserializer::new()
            .deserialize(ModelName::Resnet, &path)
            .unwrap();

        let image = RgbImage::from_pixel(224, 224, Rgb([255, 0, 51]));
        let output = predictor.classify(&prepare(&image, ModelName::Resnet)).unwrap();

        assert_eq!(output.len(), 3);
        for (actual, expected) in output.iter().zip([1.0f32, -1.0, -0.6]) {
            assert!((actual - expected).abs() < 1e-4, "expected {expected}, got {actual}");
        }
    }

    #[test]
    fn test_classify_rejects_tensor_for_other_model() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("resnet_model.onnx");
        std::fs::write(&path, channel_mean_model(224, 224)).unwrap();

        let predictor = OnnxDeserializer::new()
            .deserialize(ModelName::Resnet, &path)
            .unwrap();

        let image = RgbImage::from_pixel(224, 224, Rgb([0, 0, 0]));
        let err = predictor.classify(&prepare(&image, ModelName::Vgg)).unwrap_err();

        assert_eq!(
            err,
            DomainError::inference("resnet", "tensor was prepared for 'vgg'")
        );
    }

    #[test]
    fn test_missing_file_is_deserialize_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("resnet_model.onnx");

        let err = OnnxDeserializer::new()
            .deserialize(ModelName::Resnet, &path)
            .unwrap_err();

        assert!(matches!(err, DomainError::Deserialize { ref model, .. } if model == "resnet"));
    }

    #[test]
    fn test_corrupt_file_is_deserialize_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("vgg_model.onnx");
        std::fs::write(&path, b"<html>quota exceeded</html>").unwrap();

        let err = OnnxDeserializer::new()
            .deserialize(ModelName::Vgg, &path)
            .unwrap_err();

        assert!(matches!(err, DomainError::Deserialize { .. }));
    }
}
