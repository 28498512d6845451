use voxprobe_audio::{normalize, ConverterRegistry, PcmStream};
use voxprobe_core::{AppConfig, AudioError, ReadinessError, ScenarioError, Verdict};
use voxprobe_service::{DiagnosticProbe, ReadinessGate};
use voxprobe_stream::StreamSession;

/// Runs the end-to-end transcription scenario once.
pub struct ScenarioRunner {
    config: AppConfig,
    registry: ConverterRegistry,
    target_url: Option<String>,
}

impl ScenarioRunner {
    pub fn new(config: AppConfig) -> Self {
        Self::with_registry(config, ConverterRegistry::new())
    }

    /// Use a custom converter registry, e.g. one with a substitute converter
    /// registered under the configured name.
    pub fn with_registry(config: AppConfig, registry: ConverterRegistry) -> Self {
        Self {
            config,
            registry,
            target_url: None,
        }
    }

    /// Stream to `url` regardless of the environment and config file.
    pub fn with_target_url(mut self, url: impl Into<String>) -> Self {
        self.target_url = Some(url.into());
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn target_url(&self) -> String {
        self.target_url
            .clone()
            .unwrap_or_else(|| self.config.target_url())
    }

    /// Run every step and report the outcome line.
    pub async fn run(&self) -> Verdict {
        let verdict = self.execute().await;
        if verdict.is_success() {
            tracing::info!("{}", verdict.summary());
        } else {
            tracing::error!("{}", verdict.summary());
        }
        verdict
    }

    async fn execute(&self) -> Verdict {
        tracing::info!("starting transcription scenario");

        if let Err(e) = self.await_readiness().await {
            return Verdict::from(ScenarioError::from(e));
        }

        if self.config.diagnostics.enabled {
            self.run_diagnostics().await;
        }

        let pcm = match self.prepare_audio().await {
            Ok(pcm) => pcm,
            Err(e) => return Verdict::from(ScenarioError::from(e)),
        };

        let url = self.target_url();
        StreamSession::from_config(&self.config).run(&url, &pcm).await
    }

    async fn await_readiness(&self) -> Result<(), ReadinessError> {
        if self.config.service.is_empty() {
            tracing::warn!("no services configured, skipping readiness gate");
            return Ok(());
        }
        let gate = ReadinessGate::from_config(&self.config.readiness)?;
        gate.wait_for_all(&self.config.service).await?;
        tracing::info!("all {} services ready", self.config.service.len());
        Ok(())
    }

    async fn run_diagnostics(&self) {
        let probe = match DiagnosticProbe::new(self.config.diagnostics.clone()) {
            Ok(probe) => probe,
            Err(e) => {
                tracing::warn!("diagnostics skipped: {e}");
                return;
            }
        };
        let report = probe.run(&self.config.audio.source_path).await;
        tracing::info!(
            "diagnostics: {}/{} checks passed",
            report.results.iter().filter(|r| r.ok).count(),
            report.results.len()
        );
    }

    async fn prepare_audio(&self) -> Result<PcmStream, AudioError> {
        let asset = self.config.audio_asset();
        let converter = self
            .registry
            .build(&self.config.audio.converter, self.config.converter_settings())
            .await?;
        normalize(converter.as_ref(), &asset).await
    }
}
