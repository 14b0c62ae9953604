//! Weight initialization
//!
//! Each layer declares how its parameters are re-initialized through
//! [`WeightInit`]; networks forward the call to all of their layers. Layers
//! without parameters simply report nothing to do.

use tch::Tensor;

/// Standard deviation used when none is configured
pub const DEFAULT_INIT_STD: f64 = 0.02;

/// How a single parameter tensor is re-initialized
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InitPolicy {
    /// Sample from N(mean, std)
    Normal { mean: f64, std: f64 },
    /// Sample from U(lo, up)
    Uniform { lo: f64, up: f64 },
    /// Fill with a constant
    Constant(f64),
}

impl InitPolicy {
    /// Policy for convolution kernels: N(0, std)
    pub fn conv(std: f64) -> Self {
        InitPolicy::Normal { mean: 0.0, std }
    }

    /// Policy for convolution biases: U(-1/sqrt(fan_in), 1/sqrt(fan_in))
    pub fn conv_bias(fan_in: i64) -> Self {
        let bound = 1.0 / (fan_in.max(1) as f64).sqrt();
        InitPolicy::Uniform {
            lo: -bound,
            up: bound,
        }
    }

    /// Policy for normalization scales: N(1, std)
    pub fn norm_scale(std: f64) -> Self {
        InitPolicy::Normal { mean: 1.0, std }
    }

    /// Overwrite `param` in place according to the policy.
    pub fn apply(self, param: &mut Tensor) -> crate::Result<()> {
        tch::no_grad(|| match self {
            InitPolicy::Normal { mean, std } => param.f_normal_(mean, std).map(|_| ()),
            InitPolicy::Uniform { lo, up } => param.f_uniform_(lo, up).map(|_| ()),
            InitPolicy::Constant(value) => param.f_fill_(value).map(|_| ()),
        })?;
        Ok(())
    }
}

/// Anything owning parameters that can be re-initialized
pub trait WeightInit {
    fn init_weights(&mut self) -> crate::Result<()>;
}

impl<T: WeightInit> WeightInit for [T] {
    fn init_weights(&mut self) -> crate::Result<()> {
        for item in self.iter_mut() {
            item.init_weights()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::{Device, Kind};

    #[test]
    fn test_constant_policy_fills() {
        let mut t = Tensor::ones([4, 4], (Kind::Float, Device::Cpu));
        InitPolicy::Constant(0.0).apply(&mut t).unwrap();
        assert_eq!(t.abs().sum(Kind::Float).double_value(&[]), 0.0);
    }

    #[test]
    fn test_conv_bias_policy_bound() {
        // fan_in = 64 * 3 * 3
        let policy = InitPolicy::conv_bias(576);
        assert_eq!(
            policy,
            InitPolicy::Uniform {
                lo: -1.0 / 24.0,
                up: 1.0 / 24.0
            }
        );

        let mut t = Tensor::zeros([10_000], (Kind::Float, Device::Cpu));
        policy.apply(&mut t).unwrap();
        let max = t.abs().max().double_value(&[]);
        assert!(max <= 1.0 / 24.0 + 1e-6, "max={max}");
        assert!(max > 0.9 / 24.0, "max={max}");
    }

    #[test]
    fn test_normal_policy_statistics() {
        let mut t = Tensor::zeros([100_000], (Kind::Float, Device::Cpu));
        InitPolicy::norm_scale(0.02).apply(&mut t).unwrap();
        let mean = t.mean(Kind::Float).double_value(&[]);
        let std = t.std(true).double_value(&[]);
        assert!((mean - 1.0).abs() < 1e-3, "mean={mean}");
        assert!((std - 0.02).abs() < 1e-3, "std={std}");
    }
}
