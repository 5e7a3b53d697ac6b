//! Image decoding and per-model tensor preparation
//!
//! Every model gets an NHWC `[1, H, W, 3]` tensor built from the table in
//! [`ModelName::input_spec`]. The transform is always looked up from the model
//! name; a tensor remembers which model it was prepared for.

use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array4;

use super::model::ModelName;
use super::DomainError;

/// Batched, normalized image tensor in NHWC layout
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    model: ModelName,
    data: Array4<f32>,
}

impl ImageTensor {
    /// Model whose normalization produced this tensor
    pub fn model(&self) -> ModelName {
        self.model
    }

    /// `[batch, height, width, channels]`
    pub fn shape(&self) -> [usize; 4] {
        let dim = self.data.dim();
        [dim.0, dim.1, dim.2, dim.3]
    }

    pub fn as_array(&self) -> &Array4<f32> {
        &self.data
    }

    /// Values in logical (row-major NHWC) order
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.iter().copied().collect()
    }
}

/// Decode raw upload bytes into an RGB image, dropping any alpha or palette
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage, DomainError> {
    if bytes.is_empty() {
        return Err(DomainError::image_decode("empty input"));
    }

    let image = image::load_from_memory(bytes).map_err(|e| DomainError::image_decode(e.to_string()))?;

    Ok(image.to_rgb8())
}

/// Build the input tensor `model` expects from a decoded image
pub fn prepare(image: &RgbImage, model: ModelName) -> ImageTensor {
    let spec = model.input_spec();

    let resized;
    let source = if image.dimensions() == (spec.width, spec.height) {
        image
    } else {
        resized = imageops::resize(image, spec.width, spec.height, FilterType::CatmullRom);
        &resized
    };

    let (width, height) = (spec.width as usize, spec.height as usize);
    let mut data = Array4::<f32>::zeros((1, height, width, 3));

    for (x, y, pixel) in source.enumerate_pixels() {
        let values = spec.normalization.apply(pixel.0);
        for (c, value) in values.into_iter().enumerate() {
            data[[0, y as usize, x as usize, c]] = value;
        }
    }

    ImageTensor { model, data }
}

/// Decode `bytes` and prepare them for the model called `model_name`
///
/// The name is resolved before any decoding work happens.
pub fn prepare_named(bytes: &[u8], model_name: &str) -> Result<ImageTensor, DomainError> {
    let model: ModelName = model_name.parse()?;
    let image = decode_image(bytes)?;

    Ok(prepare(&image, model))
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Cursor;

    use image::{GrayImage, ImageFormat, Luma, Rgb};

    use super::*;

    pub(crate) fn solid_png(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
        let image = RgbImage::from_pixel(width, height, Rgb(rgb));
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-4,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_resnet_tensor_shape_and_values() {
        let bytes = solid_png(224, 224, [255, 0, 51]);
        let tensor = prepare_named(&bytes, "resnet").unwrap();

        assert_eq!(tensor.shape(), [1, 224, 224, 3]);
        assert_eq!(tensor.model(), ModelName::Resnet);

        let data = tensor.as_array();
        assert_close(data[[0, 0, 0, 0]], 1.0);
        assert_close(data[[0, 100, 37, 1]], -1.0);
        assert_close(data[[0, 223, 223, 2]], -0.6);
    }

    #[test]
    fn test_vgg_tensor_shape_and_values() {
        let bytes = solid_png(224, 224, [200, 100, 50]);
        let tensor = prepare_named(&bytes, "vgg").unwrap();

        assert_eq!(tensor.shape(), [1, 224, 224, 3]);

        let data = tensor.as_array();
        // channel 0 is blue after the BGR swap
        assert_close(data[[0, 10, 10, 0]], 50.0 - 103.939);
        assert_close(data[[0, 10, 10, 1]], 100.0 - 116.779);
        assert_close(data[[0, 10, 10, 2]], 200.0 - 123.68);
    }

    #[test]
    fn test_inception_tensor_shape_and_values() {
        let bytes = solid_png(299, 299, [0, 255, 102]);
        let tensor = prepare_named(&bytes, "inception").unwrap();

        assert_eq!(tensor.shape(), [1, 299, 299, 3]);

        let data = tensor.as_array();
        assert_close(data[[0, 298, 0, 0]], -1.0);
        assert_close(data[[0, 298, 0, 1]], 1.0);
        assert_close(data[[0, 298, 0, 2]], -0.2);
    }

    #[test]
    fn test_resizes_to_model_dimensions() {
        let image = decode_image(&solid_png(40, 30, [128, 128, 128])).unwrap();

        for model in ModelName::ALL {
            let spec = model.input_spec();
            let tensor = prepare(&image, model);
            assert_eq!(
                tensor.shape(),
                [1, spec.height as usize, spec.width as usize, 3]
            );
        }
    }

    #[test]
    fn test_grayscale_input_forced_to_three_channels() {
        let gray = GrayImage::from_pixel(224, 224, Luma([255]));
        let mut buf = Cursor::new(Vec::new());
        gray.write_to(&mut buf, ImageFormat::Png).unwrap();

        let tensor = prepare_named(buf.get_ref(), "resnet").unwrap();
        assert_eq!(tensor.shape(), [1, 224, 224, 3]);
        assert!(tensor.to_vec().iter().all(|v| (*v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_unsupported_model_rejected_before_decoding() {
        let err = prepare_named(b"not an image", "mobilenet").unwrap_err();
        assert_eq!(err, DomainError::unsupported_model("mobilenet"));
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let err = prepare_named(b"definitely not a png", "vgg").unwrap_err();
        assert!(matches!(err, DomainError::ImageDecode { .. }));
    }

    #[test]
    fn test_empty_input_fails_to_decode() {
        assert!(matches!(decode_image(&[]), Err(DomainError::ImageDecode { .. })));
    }
}
