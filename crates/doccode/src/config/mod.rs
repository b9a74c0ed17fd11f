pub mod abbreviations;
pub mod loader;
pub mod schema;

pub use loader::{load_config, load_config_from_str, load_config_from_yaml_str, validate_config};
pub use schema::{
    CleaningRules, ClassificationConfig, Config, FieldFormat, FieldPattern, FieldStyle,
    FieldTransform, FilenameTemplate, HeadingPattern, MetadataConfig, NoisePattern, Thresholds,
    TypeRule, WeightedPattern,
};
