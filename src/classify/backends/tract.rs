#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::classify::classifier::{Classifier, LabelCandidate};
use crate::frame::StillImage;

const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Tract-based ONNX image classifier.
///
/// Loads a local model file and a newline-separated labels file. The model must
/// take a `1x3xSxS` float input and produce one logit per label.
pub struct TractClassifier {
    name: &'static str,
    model: SimplePlan<TypedFact, Box<dyn TypedOp>>,
    labels: Vec<String>,
    input_size: u32,
    top_k: usize,
}

impl TractClassifier {
    /// Load an ONNX model and its labels from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>, L: AsRef<Path>>(
        name: &'static str,
        model_path: P,
        labels_path: L,
        input_size: u32,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();
        let labels_path = labels_path.as_ref();
        let labels = std::fs::read_to_string(labels_path)
            .with_context(|| format!("failed to read labels from {}", labels_path.display()))?
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>();
        if labels.is_empty() {
            return Err(anyhow!("labels file {} is empty", labels_path.display()));
        }

        let size = input_size as usize;
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(0, InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, size, size)))
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            name,
            model,
            labels,
            input_size,
            top_k: 5,
        })
    }

    /// Override how many candidates are returned.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    fn build_input(&self, image: &StillImage) -> Result<Tensor> {
        if image.width() != self.input_size || image.height() != self.input_size {
            return Err(anyhow!(
                "still size {}x{} does not match model input {}x{}",
                image.width(),
                image.height(),
                self.input_size,
                self.input_size
            ));
        }
        let rgb = image.as_rgb();
        let size = self.input_size as usize;
        let input = tract_ndarray::Array4::from_shape_fn((1, 3, size, size), |(_, c, y, x)| {
            let value = f32::from(rgb.get_pixel(x as u32, y as u32).0[c]) / 255.0;
            (value - IMAGENET_MEAN[c]) / IMAGENET_STD[c]
        });
        Ok(input.into_tensor())
    }

    fn top_candidates(&self, outputs: TVec<TValue>) -> Result<Vec<LabelCandidate>> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let logits: Vec<f32> = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?
            .iter()
            .copied()
            .collect();
        let probabilities = softmax(&logits);

        let mut ranked: Vec<(usize, f32)> = probabilities.into_iter().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(ranked
            .into_iter()
            .take(self.top_k)
            .map(|(index, probability)| LabelCandidate {
                label: self.labels.get(index).cloned(),
                probability: Some(probability),
            })
            .collect())
    }
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return vec![0.0; logits.len()];
    }
    let exps: Vec<f32> = logits.iter().map(|v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|v| v / sum).collect()
}

impl Classifier for TractClassifier {
    fn name(&self) -> &'static str {
        self.name
    }

    fn classify(&mut self, image: &StillImage) -> Result<Vec<LabelCandidate>> {
        let input = self.build_input(image)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        self.top_candidates(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn softmax_sums_to_one_and_preserves_order() {
        let probs = softmax(&[1.0, 3.0, 2.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(probs[1] > probs[2] && probs[2] > probs[0]);
    }
}
