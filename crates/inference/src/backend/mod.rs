use ndarray::{Array, ArrayD, IxDyn};
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "ort-backend")]
pub mod ort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionProvider {
    Cpu,
    Cuda,
}

impl FromStr for ExecutionProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "cuda" | "gpu" => Ok(Self::Cuda),
            other => Err(format!(
                "{} is not a supported execution provider. Use either `cpu` or `cuda`.",
                other
            )),
        }
    }
}

impl fmt::Display for ExecutionProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionProvider::Cpu => f.write_str("cpu"),
            ExecutionProvider::Cuda => f.write_str("cuda"),
        }
    }
}

/// A loaded model with one image input and one output tensor.
pub trait InferenceBackend: Send {
    fn load_model(path: &str, provider: ExecutionProvider) -> anyhow::Result<Self>
    where
        Self: Sized;

    /// Run the model on a preprocessed input tensor and return its first
    /// output.
    fn infer(&mut self, input: &Array<f32, IxDyn>) -> anyhow::Result<ArrayD<f32>>;

    /// Custom metadata entry stored in the model file.
    fn metadata(&self, _key: &str) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_parses_aliases() {
        assert_eq!("CPU".parse::<ExecutionProvider>(), Ok(ExecutionProvider::Cpu));
        assert_eq!("gpu".parse::<ExecutionProvider>(), Ok(ExecutionProvider::Cuda));
        assert!("tpu".parse::<ExecutionProvider>().is_err());
    }
}
