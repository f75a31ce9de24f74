use burn::prelude::{Backend, Device, Tensor, TensorData};
use image::{imageops::FilterType, DynamicImage, RgbImage};

use crate::error::ClassifyError;

/// Fixed input resolution the model was trained at.
pub const SIDE: u32 = 224;

/// Decode arbitrary uploaded bytes into an image.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, ClassifyError> {
	Ok(image::load_from_memory(bytes)?)
}

/// Normalize color mode and resolution for the model input.
pub fn normalize(image: &DynamicImage) -> RgbImage {
	image
		.resize_exact(SIDE, SIDE, FilterType::Lanczos3)
		.to_rgb8()
}

/// RGB8 buffer in [H, W, 3] layout to a [3, H, W] tensor scaled to [0, 1].
pub fn to_tensor<B: Backend>(image: RgbImage, device: &Device<B>) -> Tensor<B, 3> {
	let shape = [SIDE as usize, SIDE as usize, 3];
	let data = TensorData::new(image.into_raw(), shape).convert::<B::FloatElem>();
	Tensor::<B, 3>::from_data(data, device).permute([2, 0, 1]) / 255
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::classifier::InferenceBackend;
	use burn::backend::ndarray::NdArrayDevice;

	#[test]
	fn rejects_non_image_bytes() {
		assert!(matches!(
			decode(b"definitely not an image"),
			Err(ClassifyError::InvalidImage(_))
		));
	}

	#[test]
	fn normalize_forces_model_resolution() {
		let image = DynamicImage::new_rgb8(640, 480);
		let rgb = normalize(&image);
		assert_eq!((rgb.width(), rgb.height()), (SIDE, SIDE));
	}

	#[test]
	fn tensor_layout_is_channels_first() {
		let device = NdArrayDevice::default();
		let rgb = RgbImage::from_pixel(SIDE, SIDE, image::Rgb([255, 0, 0]));
		let tensor = to_tensor::<InferenceBackend>(rgb, &device);
		assert_eq!(tensor.dims(), [3, SIDE as usize, SIDE as usize]);

		// Red channel is all ones after scaling, green is all zeros.
		let max = tensor.clone().max().into_scalar();
		let min = tensor.min().into_scalar();
		assert!((max - 1.0).abs() < 1e-6);
		assert!(min.abs() < 1e-6);
	}
}
