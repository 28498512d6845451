use crate::converter_trait::AudioConverter;
use std::collections::HashMap;
use voxprobe_core::AudioError;

pub struct ConverterRegistry {
    factories: HashMap<String, fn() -> Box<dyn AudioConverter>>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register("ffmpeg", || {
            Box::new(crate::ffmpeg_converter::FfmpegConverter::new())
        });
        registry.register("raw", || Box::new(crate::raw_converter::RawConverter::new()));
        registry
    }

    pub fn register(&mut self, name: &str, factory: fn() -> Box<dyn AudioConverter>) {
        self.factories.insert(name.to_string(), factory);
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn AudioConverter>, AudioError> {
        self.factories
            .get(name)
            .map(|f| f())
            .ok_or_else(|| AudioError::ConverterNotFound {
                name: name.to_string(),
                available: self.list_converters().into_iter().map(String::from).collect(),
            })
    }

    /// Create and initialize a converter in one step.
    pub async fn build(
        &self,
        name: &str,
        config: toml::Value,
    ) -> Result<Box<dyn AudioConverter>, AudioError> {
        let mut converter = self.create(name)?;
        converter.initialize(config).await?;
        tracing::debug!("audio converter '{}' ready", converter.name());
        Ok(converter)
    }

    /// Registered names, sorted.
    pub fn list_converters(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
