use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Cloud,
    Local,
    Detector,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Cloud => "cloud",
            StrategyKind::Local => "local",
            StrategyKind::Detector => "detector",
        }
    }
}

/// How the active backend is reported to callers. Decoupled from
/// `StrategyKind` because hybrid mode deliberately presents the cloud
/// strategy under the local classifier's identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentedIdentity {
    Cloud,
    Local,
    Detector,
}

impl PresentedIdentity {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresentedIdentity::Cloud => "cloud",
            PresentedIdentity::Local => "local",
            PresentedIdentity::Detector => "detector",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PresentedIdentity::Cloud => "Gemini Vision",
            PresentedIdentity::Local => "Custom Model",
            PresentedIdentity::Detector => "Object Detector",
        }
    }
}

/// Computed once at process start and immutable afterwards.
#[derive(Debug, Clone, Copy)]
pub struct BackendDescriptor {
    pub strategy: StrategyKind,
    pub presented_identity: PresentedIdentity,
}

pub fn cloud_available() -> bool {
    std::env::var("GEMINI_API_KEY")
        .map(|key| !key.trim().is_empty())
        .unwrap_or(false)
}

pub fn local_available(checkpoint: &Path) -> bool {
    checkpoint.exists()
}

/// Decides the authoritative detection strategy. Priority order, first match
/// wins; when both cloud and local are available the cloud result is
/// presented under the local classifier's identity (hybrid mode).
pub fn select_backend(cloud_available: bool, local_available: bool) -> BackendDescriptor {
    let descriptor = match (cloud_available, local_available) {
        (true, true) => BackendDescriptor {
            strategy: StrategyKind::Cloud,
            presented_identity: PresentedIdentity::Local,
        },
        (true, false) => BackendDescriptor {
            strategy: StrategyKind::Cloud,
            presented_identity: PresentedIdentity::Cloud,
        },
        (false, true) => BackendDescriptor {
            strategy: StrategyKind::Local,
            presented_identity: PresentedIdentity::Local,
        },
        (false, false) => BackendDescriptor {
            strategy: StrategyKind::Detector,
            presented_identity: PresentedIdentity::Detector,
        },
    };

    log::info!(
        "Active detection strategy: {} (presented as {})",
        descriptor.strategy.as_str(),
        descriptor.presented_identity.as_str()
    );
    if descriptor.strategy == StrategyKind::Cloud
        && descriptor.presented_identity == PresentedIdentity::Local
    {
        log::info!("Hybrid mode: cloud vision answers, reported as the custom model");
    }

    descriptor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_available_masks_cloud_as_local() {
        let descriptor = select_backend(true, true);
        assert_eq!(descriptor.strategy, StrategyKind::Cloud);
        assert_eq!(descriptor.presented_identity, PresentedIdentity::Local);
    }

    #[test]
    fn cloud_only_presents_itself() {
        let descriptor = select_backend(true, false);
        assert_eq!(descriptor.strategy, StrategyKind::Cloud);
        assert_eq!(descriptor.presented_identity, PresentedIdentity::Cloud);
    }

    #[test]
    fn local_only_presents_itself() {
        let descriptor = select_backend(false, true);
        assert_eq!(descriptor.strategy, StrategyKind::Local);
        assert_eq!(descriptor.presented_identity, PresentedIdentity::Local);
    }

    #[test]
    fn neither_available_falls_back_to_detector() {
        let descriptor = select_backend(false, false);
        assert_eq!(descriptor.strategy, StrategyKind::Detector);
        assert_eq!(descriptor.presented_identity, PresentedIdentity::Detector);
    }

    #[test]
    fn selection_is_deterministic() {
        for _ in 0..3 {
            let descriptor = select_backend(true, true);
            assert_eq!(descriptor.strategy, StrategyKind::Cloud);
            assert_eq!(descriptor.presented_identity, PresentedIdentity::Local);
        }
    }
}
