use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tch::{CModule, Device, Kind, nn::ModuleT};

use super::{DetectionError, DetectionResult, Normalization, image_to_tensor};

const INPUT_SIZE: u32 = 640;

/// Last-resort object detector (TorchScript export producing one
/// [x1, y1, x2, y2, confidence, class] row per detection). Only the single
/// highest-confidence detection above the threshold is reported.
#[derive(Clone)]
pub struct ObjectDetector {
    model: Arc<Mutex<CModule>>,
    class_names: Vec<String>,
    threshold: f64,
    device: Device,
}

impl ObjectDetector {
    pub fn load(
        model_path: &Path,
        labels_path: &Path,
        threshold: f64,
    ) -> Result<Self, DetectionError> {
        let device = Device::cuda_if_available();
        let model = CModule::load_on_device(model_path, device)?;

        let labels = fs::read_to_string(labels_path).map_err(|e| {
            DetectionError::Unavailable(format!(
                "detector classes unreadable at {}: {e}",
                labels_path.display()
            ))
        })?;
        let class_names: Vec<String> = serde_json::from_str(&labels)
            .map_err(|e| DetectionError::Unavailable(format!("detector classes invalid: {e}")))?;

        log::info!(
            "Loaded object detector with {} classes on {:?} (threshold {threshold})",
            class_names.len(),
            device
        );

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
            class_names,
            threshold,
            device,
        })
    }

    pub fn predict(&self, image: &[u8]) -> Result<DetectionResult, DetectionError> {
        let tensor =
            image_to_tensor(image, INPUT_SIZE, Normalization::Unit)?.to_device(self.device);

        let output = self.model.lock().unwrap().forward_t(&tensor, false);
        let detections = output.to_kind(Kind::Float).view([-1, 6]);
        let rows = detections.size()[0];

        let mut best: Option<(f64, i64)> = None;
        for row in 0..rows {
            let confidence = detections.double_value(&[row, 4]);
            if confidence < self.threshold {
                continue;
            }
            if best.is_none_or(|(current, _)| confidence > current) {
                best = Some((confidence, detections.int64_value(&[row, 5])));
            }
        }

        let Some((confidence, class_idx)) = best else {
            return Err(DetectionError::NoFinding);
        };

        let raw_label = self
            .class_names
            .get(class_idx as usize)
            .cloned()
            .unwrap_or_else(|| "Unknown".to_string());

        Ok(DetectionResult::bare(raw_label, (confidence * 100.0) as f32))
    }
}
