use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        loss::CrossEntropyLossConfig,
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig},
        Dropout, DropoutConfig,
        Linear, LinearConfig,
        PaddingConfig2d,
        Relu,
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::domain::NUM_CLASSES;

/// Architecture presets selectable from the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// One residual stage; trains in a few minutes on CPU
    Simple,
    /// Four residual stages (32→64→128→256 channels)
    Advanced,
}

impl ModelKind {
    pub fn config(self) -> DigitCnnConfig {
        match self {
            Self::Simple   => DigitCnnConfig::new(vec![64], vec![2]),
            Self::Advanced => DigitCnnConfig::new(vec![32, 64, 128, 256], vec![1, 2, 2, 1]),
        }
    }
}

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct DigitCnnConfig {
    /// Output channels of each residual block
    pub block_channels: Vec<usize>,
    /// Stride of each residual block (2 halves the feature map)
    pub block_strides:  Vec<usize>,
    #[config(default = 32)]
    pub stem_channels:  usize,
    #[config(default = 256)]
    pub hidden_size:    usize,
    #[config(default = 0.4)]
    pub dropout:        f64,
}

impl DigitCnnConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> DigitCnn<B> {
        let stem = Conv2dConfig::new([1, self.stem_channels], [3, 3])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);
        // 28×28 → 14×14
        let downsample = Conv2dConfig::new([self.stem_channels, self.stem_channels], [3, 3])
            .with_stride([2, 2])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);

        let mut in_channels = self.stem_channels;
        let mut blocks = Vec::with_capacity(self.block_channels.len());
        for (&out_channels, &stride) in self.block_channels.iter().zip(&self.block_strides) {
            blocks.push(build_residual_block(in_channels, out_channels, stride, device));
            in_channels = out_channels;
        }

        DigitCnn {
            stem,
            downsample,
            blocks,
            pool:       AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            hidden:     LinearConfig::new(in_channels, self.hidden_size).init(device),
            output:     LinearConfig::new(self.hidden_size, NUM_CLASSES).init(device),
            dropout:    DropoutConfig::new(self.dropout).init(),
            activation: Relu::new(),
        }
    }
}

fn build_residual_block<B: Backend>(
    in_channels:  usize,
    out_channels: usize,
    stride:       usize,
    device:       &B::Device,
) -> ResidualBlock<B> {
    let conv1 = Conv2dConfig::new([in_channels, out_channels], [3, 3])
        .with_stride([stride, stride])
        .with_padding(PaddingConfig2d::Explicit(1, 1))
        .init(device);
    let conv2 = Conv2dConfig::new([out_channels, out_channels], [3, 3])
        .with_padding(PaddingConfig2d::Explicit(1, 1))
        .init(device);

    // 1×1 projection when the skip path would not line up
    let shortcut = (stride > 1 || in_channels != out_channels).then(|| {
        Conv2dConfig::new([in_channels, out_channels], [1, 1])
            .with_stride([stride, stride])
            .init(device)
    });

    ResidualBlock { conv1, conv2, shortcut, activation: Relu::new() }
}

#[derive(Module, Debug)]
pub struct ResidualBlock<B: Backend> {
    pub conv1:      Conv2d<B>,
    pub conv2:      Conv2d<B>,
    pub shortcut:   Option<Conv2d<B>>,
    pub activation: Relu,
}

impl<B: Backend> ResidualBlock<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let skip = match &self.shortcut {
            Some(projection) => projection.forward(x.clone()),
            None             => x.clone(),
        };
        let out = self.activation.forward(self.conv1.forward(x));
        let out = self.conv2.forward(out);
        self.activation.forward(out + skip)
    }
}

#[derive(Module, Debug)]
pub struct DigitCnn<B: Backend> {
    pub stem:       Conv2d<B>,
    pub downsample: Conv2d<B>,
    pub blocks:     Vec<ResidualBlock<B>>,
    pub pool:       AdaptiveAvgPool2d,
    pub hidden:     Linear<B>,
    pub output:     Linear<B>,
    pub dropout:    Dropout,
    pub activation: Relu,
}

impl<B: Backend> DigitCnn<B> {
    /// images: [batch, 1, 28, 28] → logits: [batch, 10]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.activation.forward(self.stem.forward(images));
        let mut x = self.activation.forward(self.downsample.forward(x));
        for block in &self.blocks {
            x = block.forward(x);
        }

        // Global average pooling: [batch, C, H, W] → [batch, C]
        let x = self.pool.forward(x);
        let [batch_size, channels, _, _] = x.dims();
        let x = x.reshape([batch_size, channels]);

        let x = self.dropout.forward(x);
        let x = self.activation.forward(self.hidden.forward(x));
        let x = self.dropout.forward(x);
        self.output.forward(x)
    }

    /// Softmax over the class axis: [batch, 10], rows sum to 1.
    pub fn probabilities(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        burn::tensor::activation::softmax(self.forward(images), 1)
    }

    /// Cross-entropy loss against integer targets, plus the logits.
    pub fn forward_loss(
        &self,
        images:  Tensor<B, 4>,
        targets: Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let logits = self.forward(images);
        let loss = CrossEntropyLossConfig::new()
            .init(&logits.device())
            .forward(logits.clone(), targets);
        (loss, logits)
    }
}
