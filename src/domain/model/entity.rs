//! Model names and their preprocessing table

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Per-channel means subtracted by the VGG16 preprocessing, in B, G, R order
pub const CAFFE_BGR_MEANS: [f32; 3] = [103.939, 116.779, 123.68];

/// One of the three ensemble members
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelName {
    Resnet,
    Vgg,
    Inception,
}

impl ModelName {
    /// Fixed load and inference order
    pub const ALL: [ModelName; 3] = [ModelName::Resnet, ModelName::Vgg, ModelName::Inception];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resnet => "resnet",
            Self::Vgg => "vgg",
            Self::Inception => "inception",
        }
    }

    /// File name of the artifact inside the local model directory
    pub fn artifact_file_name(&self) -> String {
        format!("{}_model.onnx", self.as_str())
    }

    /// Input size and normalization the network was trained with
    pub fn input_spec(&self) -> ModelInputSpec {
        match self {
            Self::Resnet => ModelInputSpec {
                width: 224,
                height: 224,
                normalization: Normalization::SymmetricScale,
            },
            Self::Vgg => ModelInputSpec {
                width: 224,
                height: 224,
                normalization: Normalization::CaffeBgrMean,
            },
            Self::Inception => ModelInputSpec {
                width: 299,
                height: 299,
                normalization: Normalization::SymmetricScale,
            },
        }
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "resnet" => Ok(Self::Resnet),
            "vgg" => Ok(Self::Vgg),
            "inception" => Ok(Self::Inception),
            other => Err(DomainError::unsupported_model(other)),
        }
    }
}

/// Spatial size and pixel transform expected by one model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelInputSpec {
    pub width: u32,
    pub height: u32,
    pub normalization: Normalization,
}

/// Pixel normalization schemes used by the Keras application models
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalization {
    /// Maps `[0, 255]` to `[-1, 1]`, channels stay RGB
    SymmetricScale,
    /// Reorders to BGR and subtracts the ImageNet channel means, no scaling
    CaffeBgrMean,
}

impl Normalization {
    /// Transform one RGB pixel into the three output channel values
    pub fn apply(&self, [r, g, b]: [u8; 3]) -> [f32; 3] {
        match self {
            Self::SymmetricScale => [
                f32::from(r) / 127.5 - 1.0,
                f32::from(g) / 127.5 - 1.0,
                f32::from(b) / 127.5 - 1.0,
            ],
            Self::CaffeBgrMean => [
                f32::from(b) - CAFFE_BGR_MEANS[0],
                f32::from(g) - CAFFE_BGR_MEANS[1],
                f32::from(r) - CAFFE_BGR_MEANS[2],
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_models() {
        assert_eq!("resnet".parse::<ModelName>().unwrap(), ModelName::Resnet);
        assert_eq!("vgg".parse::<ModelName>().unwrap(), ModelName::Vgg);
        assert_eq!("inception".parse::<ModelName>().unwrap(), ModelName::Inception);
    }

    #[test]
    fn test_parse_unknown_model() {
        let err = "efficientnet".parse::<ModelName>().unwrap_err();
        assert_eq!(err, DomainError::unsupported_model("efficientnet"));
    }

    #[test]
    fn test_input_sizes() {
        assert_eq!(ModelName::Resnet.input_spec().width, 224);
        assert_eq!(ModelName::Vgg.input_spec().height, 224);
        assert_eq!(ModelName::Inception.input_spec().width, 299);
        assert_eq!(ModelName::Inception.input_spec().height, 299);
    }

    #[test]
    fn test_artifact_file_names_are_distinct() {
        let names: std::collections::HashSet<_> =
            ModelName::ALL.iter().map(|m| m.artifact_file_name()).collect();
        assert_eq!(names.len(), 3);
        assert_eq!(ModelName::Vgg.artifact_file_name(), "vgg_model.onnx");
    }

    #[test]
    fn test_symmetric_scale() {
        let out = Normalization::SymmetricScale.apply([0, 255, 51]);
        assert_eq!(out[0], -1.0);
        assert_eq!(out[1], 1.0);
        assert!((out[2] - (-0.6)).abs() < 1e-6);
    }

    #[test]
    fn test_caffe_swaps_channels_and_subtracts_means() {
        let out = Normalization::CaffeBgrMean.apply([200, 100, 50]);
        assert!((out[0] - (50.0 - 103.939)).abs() < 1e-4);
        assert!((out[1] - (100.0 - 116.779)).abs() < 1e-4);
        assert!((out[2] - (200.0 - 123.68)).abs() < 1e-4);
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&ModelName::Inception).unwrap(),
            "\"inception\""
        );
    }
}
