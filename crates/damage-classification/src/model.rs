use burn::config::Config;
use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{MaxPool2d, MaxPool2dConfig};
use burn::nn::{Linear, LinearConfig, PaddingConfig2d, Relu};
use burn::prelude::{Backend, Tensor};

/// Small CNN classification head over a fixed 3x224x224 input.
#[derive(Debug, Module)]
pub struct DamageClassModel<B: Backend> {
	activation: Relu,
	pool: MaxPool2d,
	conv1: Conv2d<B>,
	conv2: Conv2d<B>,
	conv3: Conv2d<B>,
	fc1: Linear<B>,
}

impl <B: Backend> DamageClassModel<B> {
	/// Input [batch, 3, 224, 224], output raw logits [batch, num_classes].
	pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
		let x = self.conv1.forward(images);
		let x = self.activation.forward(x);
		let x = self.pool.forward(x);

		let x = self.conv2.forward(x);
		let x = self.activation.forward(x);
		let x = self.pool.forward(x);

		let x = self.conv3.forward(x);
		let x = self.activation.forward(x);
		let x = self.pool.forward(x);

		let x = x.flatten(1, 3);

		self.fc1.forward(x)
	}
}

/// Model hyper-parameters plus the label table, saved as `config.json`
/// next to the weight record in the artifact directory.
#[derive(Debug, Config)]
pub struct DamageClassConfig {
	pub labels: Vec<String>,
	#[config(default = 224)]
	pub image_side: usize,
}

impl DamageClassConfig {
	pub fn num_classes(&self) -> usize {
		self.labels.len()
	}

	pub fn init<B: Backend>(&self, device: &B::Device) -> DamageClassModel<B> {
		let conv1 = Conv2dConfig::new([3, 32], [3, 3])
			.with_padding(PaddingConfig2d::Same)
			.init(device);

		let conv2 = Conv2dConfig::new([32, 64], [3, 3])
			.with_padding(PaddingConfig2d::Same)
			.init(device);

		let conv3 = Conv2dConfig::new([64, 128], [3, 3])
			.with_padding(PaddingConfig2d::Same)
			.init(device);

		let pool = MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init();

		// Three 2x2 pools divide each side by 8.
		let reduced = self.image_side / 8;
		let fc1 = LinearConfig::new(128 * reduced * reduced, self.num_classes()).init(device);

		DamageClassModel {
			activation: Relu::new(),
			pool,
			conv1,
			conv2,
			conv3,
			fc1,
		}
	}
}

impl Default for DamageClassConfig {
	fn default() -> Self {
		Self::new(crate::labels::DEFAULT_CLASSES.iter().map(|l| l.to_string()).collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::classifier::InferenceBackend;
	use crate::image_ops::SIDE;
	use burn::backend::ndarray::NdArrayDevice;

	#[test]
	fn forward_shape_matches_class_count() {
		let device = NdArrayDevice::default();
		let config = DamageClassConfig::default();
		assert_eq!(config.image_side as u32, SIDE);

		let model: DamageClassModel<InferenceBackend> = config.init(&device);
		let input = Tensor::zeros([1, 3, SIDE as usize, SIDE as usize], &device);
		let output = model.forward(input);
		assert_eq!(output.dims(), [1, config.num_classes()]);
	}
}
