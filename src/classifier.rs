use crate::error::{PipelineError, Result};
use crate::preprocessing::PreprocessingOutcome;
use crate::raster::Region;
use crate::tile::NormalizedTile;
use serde::Serialize;

/// Trait that every symbol classifier backend must implement
///
/// The pipeline only guarantees tile dimensions and value range; tensor
/// layout is up to the backend (see `NormalizedTile::to_tensor`).
pub trait Classifier: Send + Sync {
    /// Returns the classifier identifier
    fn name(&self) -> &'static str;

    /// Number of classes in the returned distribution
    fn num_classes(&self) -> usize;

    /// Probability distribution over `num_classes()` classes
    fn classify(&self, tile: &NormalizedTile) -> Result<Vec<f32>>;

    /// Text for a class index (digits by default)
    fn label(&self, class: usize) -> String {
        class.to_string()
    }
}

/// Prediction for a single tile
#[derive(Debug, Clone, Serialize)]
pub struct SymbolPrediction {
    pub class: usize,
    pub label: String,
    pub confidence: f32,
    pub probabilities: Vec<f32>,
    pub region: Option<Region>,
}

/// Recognition result for a whole image
#[derive(Debug, Clone, Serialize)]
pub struct Recognition {
    /// Labels joined in reading order
    pub text: String,
    /// Mean confidence over all symbols (0.0 when nothing was found)
    pub confidence: f32,
    pub symbols: Vec<SymbolPrediction>,
    pub warnings: Vec<String>,
}

/// Classify one tile and pick the most likely class
pub fn predict(classifier: &dyn Classifier, tile: &NormalizedTile) -> Result<SymbolPrediction> {
    let probabilities = classifier.classify(tile)?;
    let expected = classifier.num_classes();
    if probabilities.len() != expected || expected == 0 {
        return Err(PipelineError::ClassifierOutput {
            expected,
            actual: probabilities.len(),
        });
    }

    // First maximum wins so ties resolve to the lowest class
    let (class, confidence) = probabilities
        .iter()
        .copied()
        .enumerate()
        .fold((0, f32::MIN), |best, (i, p)| if p > best.1 { (i, p) } else { best });

    Ok(SymbolPrediction {
        class,
        label: classifier.label(class),
        confidence,
        probabilities,
        region: None,
    })
}

/// Classify pipeline outcomes in order and assemble the text
pub fn recognize(
    classifier: &dyn Classifier,
    outcomes: &[PreprocessingOutcome],
) -> Result<Recognition> {
    let mut symbols = Vec::with_capacity(outcomes.len());
    let mut warnings = Vec::new();

    for outcome in outcomes {
        let mut prediction = predict(classifier, &outcome.tile)?;
        prediction.region = outcome.region;
        warnings.extend(outcome.warnings.iter().cloned());
        symbols.push(prediction);
    }

    let text: String = symbols.iter().map(|s| s.label.as_str()).collect();
    let confidence = if symbols.is_empty() {
        0.0
    } else {
        symbols.iter().map(|s| s.confidence).sum::<f32>() / symbols.len() as f32
    };

    tracing::info!(
        "{} recognized {} symbols, confidence: {:.2}",
        classifier.name(),
        symbols.len(),
        confidence
    );

    Ok(Recognition {
        text,
        confidence,
        symbols,
        warnings,
    })
}
