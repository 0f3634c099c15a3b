use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tch::{CModule, Device, Kind, nn::ModuleT};

use super::{DetectionError, DetectionResult, Normalization, image_to_tensor};

const INPUT_SIZE: u32 = 224;

/// Locally trained disease classifier, a TorchScript export with a closed
/// label set. Top-1 over softmax; always answers if the image decodes.
#[derive(Clone)]
pub struct DiseaseClassifier {
    model: Arc<Mutex<CModule>>,
    class_names: Vec<String>,
    device: Device,
}

impl DiseaseClassifier {
    pub fn load(model_path: &Path, labels_path: &Path) -> Result<Self, DetectionError> {
        let device = Device::cuda_if_available();
        let model = CModule::load_on_device(model_path, device)?;

        let labels = fs::read_to_string(labels_path).map_err(|e| {
            DetectionError::Unavailable(format!(
                "class names unreadable at {}: {e}",
                labels_path.display()
            ))
        })?;
        let class_names: Vec<String> = serde_json::from_str(&labels)
            .map_err(|e| DetectionError::Unavailable(format!("class names invalid: {e}")))?;

        log::info!(
            "Loaded disease classifier with {} classes on {:?}",
            class_names.len(),
            device
        );

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
            class_names,
            device,
        })
    }

    pub fn predict(&self, image: &[u8]) -> Result<DetectionResult, DetectionError> {
        let tensor =
            image_to_tensor(image, INPUT_SIZE, Normalization::ImageNet)?.to_device(self.device);

        let output = self.model.lock().unwrap().forward_t(&tensor, false);
        let probabilities = output.softmax(-1, Kind::Float);
        let flat = probabilities.to_kind(Kind::Float).view([-1]);

        let count = flat.size()[0] as usize;
        let mut scores = vec![0f32; count];
        flat.copy_data(&mut scores, count);

        let (best_idx, best_score) = scores
            .iter()
            .copied()
            .enumerate()
            .fold((0usize, f32::MIN), |best, (idx, score)| {
                if score > best.1 { (idx, score) } else { best }
            });

        let raw_label = self
            .class_names
            .get(best_idx)
            .cloned()
            .unwrap_or_else(|| "Unknown".to_string());

        Ok(DetectionResult::bare(raw_label, best_score * 100.0))
    }
}
