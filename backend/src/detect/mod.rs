pub mod classifier;
pub mod cloud;
pub mod detector;
pub mod selector;

use image::imageops::FilterType;
use shared::Severity;
use tch::Tensor;

/// Sentinel label substituted when the cloud model's reply does not parse.
/// Carries confidence 0 so the unclear-image rejection catches it.
pub const ANALYSIS_FAILED: &str = "Analysis_Failed";

#[derive(Debug, Clone)]
pub struct DetectionResult {
    pub raw_label: String,
    /// Percentage on the 0-100 scale, regardless of which backend produced it.
    pub confidence: f32,
    pub crop_type: Option<String>,
    pub severity: Severity,
    pub description: Option<String>,
}

impl DetectionResult {
    pub fn bare(raw_label: impl Into<String>, confidence: f32) -> Self {
        Self {
            raw_label: raw_label.into(),
            confidence,
            crop_type: None,
            severity: Severity::Unknown,
            description: None,
        }
    }

    pub fn analysis_failed() -> Self {
        Self::bare(ANALYSIS_FAILED, 0.0)
    }

    /// Call-site acceptance policy: the sentinel label is rejected outright,
    /// and confidence below the floor is rejected; exactly at the floor is
    /// accepted.
    pub fn is_acceptable(&self, min_confidence: f32) -> bool {
        self.raw_label != ANALYSIS_FAILED && self.confidence >= min_confidence
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("Detection backend unavailable: {0}")]
    Unavailable(String),
    #[error("No disease detected above the confidence threshold")]
    NoFinding,
    #[error("Image preprocessing failed: {0}")]
    Preprocessing(String),
    #[error("Model error: {0}")]
    Model(#[from] tch::TchError),
}

/// The one detection strategy chosen at startup. Selected once, injected into
/// the request path; request handling never re-branches on availability.
pub enum ActiveBackend {
    /// Cloud vision, optionally with the local classifier kept warm as a
    /// silent fallback (hybrid mode).
    Cloud {
        vision: cloud::GeminiVision,
        standby: Option<classifier::DiseaseClassifier>,
    },
    Local(classifier::DiseaseClassifier),
    Detector(detector::ObjectDetector),
}

impl ActiveBackend {
    pub async fn detect(
        &self,
        image: &[u8],
        mime_type: &str,
    ) -> Result<DetectionResult, DetectionError> {
        match self {
            ActiveBackend::Cloud { vision, standby } => {
                match vision.analyze(image, mime_type).await {
                    Ok(result) => Ok(result),
                    Err(err) => match standby {
                        Some(classifier) => {
                            log::warn!(
                                "Cloud detection failed ({err}), answering from the standby classifier"
                            );
                            classifier.predict(image)
                        }
                        None => Err(err),
                    },
                }
            }
            ActiveBackend::Local(classifier) => classifier.predict(image),
            ActiveBackend::Detector(detector) => detector.predict(image),
        }
    }

    /// The generative enrichment collaborator, present only on the cloud path.
    pub fn enrichment(&self) -> Option<&cloud::GeminiVision> {
        match self {
            ActiveBackend::Cloud { vision, .. } => Some(vision),
            _ => None,
        }
    }
}

pub(crate) enum Normalization {
    /// ImageNet mean/std, as the classifier checkpoints were trained with.
    ImageNet,
    /// Plain [0, 1] scaling for the detector.
    Unit,
}

const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Decodes image bytes and lays them out as a [1, 3, size, size] CHW tensor.
pub(crate) fn image_to_tensor(
    image: &[u8],
    size: u32,
    normalization: Normalization,
) -> Result<Tensor, DetectionError> {
    let decoded = image::load_from_memory(image)
        .map_err(|e| DetectionError::Preprocessing(e.to_string()))?;
    let resized = decoded
        .resize_exact(size, size, FilterType::Triangle)
        .to_rgb8();

    let plane = (size * size) as usize;
    let mut chw = vec![0f32; 3 * plane];
    for (x, y, pixel) in resized.enumerate_pixels() {
        let offset = (y * size + x) as usize;
        for channel in 0..3 {
            let value = pixel[channel] as f32 / 255.0;
            chw[channel * plane + offset] = match normalization {
                Normalization::ImageNet => {
                    (value - IMAGENET_MEAN[channel]) / IMAGENET_STD[channel]
                }
                Normalization::Unit => value,
            };
        }
    }

    Ok(Tensor::from_slice(&chw).view([1, 3, size as i64, size as i64]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_floor_is_inclusive() {
        let result = DetectionResult::bare("Tomato Early blight", 20.0);
        assert!(result.is_acceptable(20.0));

        let result = DetectionResult::bare("Tomato Early blight", 19.99);
        assert!(!result.is_acceptable(20.0));
    }

    #[test]
    fn sentinel_label_is_rejected_regardless_of_confidence() {
        let result = DetectionResult::bare(ANALYSIS_FAILED, 99.0);
        assert!(!result.is_acceptable(20.0));

        assert!(!DetectionResult::analysis_failed().is_acceptable(20.0));
    }
}
