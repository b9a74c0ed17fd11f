use regex::{Regex, RegexBuilder};

use crate::config::schema::{ClassificationConfig, Thresholds, TypeRule};
use crate::models::{Classification, ConfidenceLevel, DocumentType};
use crate::services::Classifier;

/// Scores text against weighted patterns per document type.
///
/// Every matching pattern adds its weight to its type's score. The highest
/// score wins (the earlier rule on a tie) and is mapped to a confidence
/// level through that rule's thresholds.
pub struct RuleClassifier {
    rules: Vec<CompiledRule>,
    min_confidence: Option<ConfidenceLevel>,
}

struct CompiledRule {
    document_type: DocumentType,
    patterns: Vec<CompiledPattern>,
    thresholds: Thresholds,
}

struct CompiledPattern {
    regex: Regex,
    weight: f64,
    indicator: String,
}

/// Score of one document type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeScore {
    pub document_type: DocumentType,
    pub score: f64,
    pub indicators: Vec<String>,
}

impl RuleClassifier {
    pub fn new(config: &ClassificationConfig) -> Self {
        Self {
            rules: compile_rules(&config.rules),
            min_confidence: config.min_confidence,
        }
    }

    /// Replaces the active rules.
    pub fn reload(&mut self, config: &ClassificationConfig) {
        self.rules = compile_rules(&config.rules);
        self.min_confidence = config.min_confidence;
        log::info!("Reloaded {} classification rules", self.rules.len());
    }

    pub fn document_types(&self) -> Vec<DocumentType> {
        self.rules.iter().map(|r| r.document_type).collect()
    }

    /// Scores for every enabled rule, in rule order.
    pub fn scores(&self, text: &str) -> Vec<TypeScore> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        self.rules.iter().map(|rule| rule.score(text)).collect()
    }
}

fn compile_rules(rules: &[TypeRule]) -> Vec<CompiledRule> {
    rules
        .iter()
        .filter(|rule| rule.enabled)
        .map(|rule| CompiledRule {
            document_type: rule.document_type,
            thresholds: rule.thresholds,
            patterns: rule
                .patterns
                .iter()
                .filter_map(|p| {
                    match RegexBuilder::new(&p.pattern)
                        .case_insensitive(!p.case_sensitive)
                        .build()
                    {
                        Ok(regex) => Some(CompiledPattern {
                            regex,
                            weight: p.weight,
                            indicator: p.description.clone().unwrap_or_else(|| p.pattern.clone()),
                        }),
                        Err(e) => {
                            log::warn!("Skipping invalid pattern '{}': {}", p.pattern, e);
                            None
                        }
                    }
                })
                .collect(),
        })
        .collect()
}

impl CompiledRule {
    fn score(&self, text: &str) -> TypeScore {
        let mut score = 0.0;
        let mut indicators = Vec::new();
        for pattern in &self.patterns {
            if pattern.regex.is_match(text) {
                score += pattern.weight;
                indicators.push(pattern.indicator.clone());
            }
        }
        TypeScore {
            document_type: self.document_type,
            score,
            indicators,
        }
    }
}

fn confidence_level(score: f64, thresholds: &Thresholds) -> Option<ConfidenceLevel> {
    if score >= thresholds.high {
        Some(ConfidenceLevel::High)
    } else if score >= thresholds.medium {
        Some(ConfidenceLevel::Medium)
    } else if score >= thresholds.low {
        Some(ConfidenceLevel::Low)
    } else {
        None
    }
}

fn normalized(score: f64) -> f64 {
    (score / 100.0).clamp(0.0, 1.0)
}

impl Classifier for RuleClassifier {
    fn classify(&self, text: &str) -> Classification {
        if text.trim().is_empty() {
            return Classification::unknown("No text to classify");
        }

        let mut best: Option<(&CompiledRule, TypeScore)> = None;
        for rule in &self.rules {
            let scored = rule.score(text);
            let beats = match &best {
                Some((_, current)) => scored.score > current.score,
                None => scored.score > 0.0,
            };
            if beats {
                best = Some((rule, scored));
            }
        }

        let Some((rule, best)) = best else {
            return Classification::unknown("No patterns matched");
        };
        let confidence = normalized(best.score);
        let mut indicators = best.indicators;

        let Some(level) = confidence_level(best.score, &rule.thresholds) else {
            indicators.push(format!("Score {} below minimum threshold", best.score));
            return unknown_with(confidence, indicators);
        };

        if let Some(min) = self.min_confidence {
            if level < min {
                indicators.push(format!("Confidence {} below required {}", level, min));
                return unknown_with(confidence, indicators);
            }
        }

        Classification::new(best.document_type, confidence, indicators)
            .unwrap_or_else(|_| Classification::unknown("Confidence out of range"))
    }
}

fn unknown_with(confidence: f64, indicators: Vec<String>) -> Classification {
    Classification::new(DocumentType::Unknown, confidence, indicators)
        .unwrap_or_else(|_| Classification::unknown("Confidence out of range"))
}
