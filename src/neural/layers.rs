//! Layer building blocks shared by the generator and the discriminator.

use tch::{nn, Tensor};

use crate::neural::init::{InitPolicy, WeightInit};

/// 2D convolution with optional reflection padding in front of it
#[derive(Debug)]
pub struct ConvLayer {
    conv: nn::Conv2D,
    reflect_pad: i64,
    weight_init: InitPolicy,
    bias_init: InitPolicy,
}

impl ConvLayer {
    /// Zero-padded convolution
    pub fn new(
        path: &nn::Path,
        c_in: i64,
        c_out: i64,
        kernel: i64,
        stride: i64,
        padding: i64,
        init_std: f64,
    ) -> Self {
        let conv = nn::conv2d(
            path,
            c_in,
            c_out,
            kernel,
            nn::ConvConfig {
                stride,
                padding,
                ..Default::default()
            },
        );
        Self {
            conv,
            reflect_pad: 0,
            weight_init: InitPolicy::conv(init_std),
            bias_init: InitPolicy::conv_bias(c_in * kernel * kernel),
        }
    }

    /// Stride-1 convolution preceded by `pad` pixels of reflection padding
    pub fn reflect(
        path: &nn::Path,
        c_in: i64,
        c_out: i64,
        kernel: i64,
        pad: i64,
        init_std: f64,
    ) -> Self {
        let mut layer = Self::new(path, c_in, c_out, kernel, 1, 0, init_std);
        layer.reflect_pad = pad;
        layer
    }
}

impl nn::Module for ConvLayer {
    fn forward(&self, xs: &Tensor) -> Tensor {
        if self.reflect_pad > 0 {
            let p = self.reflect_pad;
            xs.reflection_pad2d([p, p, p, p]).apply(&self.conv)
        } else {
            xs.apply(&self.conv)
        }
    }
}

impl WeightInit for ConvLayer {
    fn init_weights(&mut self) -> crate::Result<()> {
        self.weight_init.apply(&mut self.conv.ws)?;
        if let Some(bs) = self.conv.bs.as_mut() {
            self.bias_init.apply(bs)?;
        }
        Ok(())
    }
}

/// Transposed convolution doubling the spatial resolution (3×3, stride 2)
#[derive(Debug)]
pub struct UpConvLayer {
    conv: nn::ConvTranspose2D,
    weight_init: InitPolicy,
    bias_init: InitPolicy,
}

impl UpConvLayer {
    pub fn new(path: &nn::Path, c_in: i64, c_out: i64, init_std: f64) -> Self {
        let conv = nn::conv_transpose2d(
            path,
            c_in,
            c_out,
            3,
            nn::ConvTransposeConfig {
                stride: 2,
                padding: 1,
                output_padding: 1,
                ..Default::default()
            },
        );
        Self {
            conv,
            weight_init: InitPolicy::conv(init_std),
            // Kernel is stored as [c_in, c_out, k, k], fan_in comes from dim 1
            bias_init: InitPolicy::conv_bias(c_out * 3 * 3),
        }
    }
}

impl nn::Module for UpConvLayer {
    fn forward(&self, xs: &Tensor) -> Tensor {
        xs.apply(&self.conv)
    }
}

impl WeightInit for UpConvLayer {
    fn init_weights(&mut self) -> crate::Result<()> {
        self.weight_init.apply(&mut self.conv.ws)?;
        if let Some(bs) = self.conv.bs.as_mut() {
            self.bias_init.apply(bs)?;
        }
        Ok(())
    }
}

/// Per-sample, per-channel normalization.
///
/// Statistics always come from the input itself, so training and evaluation
/// behave identically. With `affine` the layer owns a learnable scale and
/// shift per channel.
#[derive(Debug)]
pub struct InstanceNorm {
    pub(crate) ws: Option<Tensor>,
    pub(crate) bs: Option<Tensor>,
    eps: f64,
    init_std: f64,
}

impl InstanceNorm {
    pub fn new(path: &nn::Path, channels: i64, affine: bool, init_std: f64) -> Self {
        let (ws, bs) = if affine {
            (
                Some(path.var("weight", &[channels], nn::Init::Const(1.0))),
                Some(path.var("bias", &[channels], nn::Init::Const(0.0))),
            )
        } else {
            (None, None)
        };
        Self {
            ws,
            bs,
            eps: 1e-5,
            init_std,
        }
    }

    pub fn weight(&self) -> Option<&Tensor> {
        self.ws.as_ref()
    }

    pub fn bias(&self) -> Option<&Tensor> {
        self.bs.as_ref()
    }
}

impl nn::Module for InstanceNorm {
    fn forward(&self, xs: &Tensor) -> Tensor {
        xs.instance_norm(
            self.ws.as_ref(),
            self.bs.as_ref(),
            None::<&Tensor>,
            None::<&Tensor>,
            true,
            0.1,
            self.eps,
            false,
        )
    }
}

impl WeightInit for InstanceNorm {
    fn init_weights(&mut self) -> crate::Result<()> {
        if let Some(ws) = self.ws.as_mut() {
            InitPolicy::norm_scale(self.init_std).apply(ws)?;
        }
        if let Some(bs) = self.bs.as_mut() {
            InitPolicy::Constant(0.0).apply(bs)?;
        }
        Ok(())
    }
}
