use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;

use crate::clock::{Clock, SystemClock};
use crate::colloquial_adapter::{ColloquialAdapter, HttpColloquialClient, RuleBasedColloquializer};
use crate::config_manager::{BackendConfig, PipelineConfig};
use crate::error::{EngineError, EngineResult};
use crate::event_bus::{EventBus, NullEventBus};
use crate::history::ConversationHistory;
use crate::language::Platform;
use crate::nmt_client::{HttpTranslationClient, TranslationBackend};
use crate::playback::{
    AudioDecoder, AudioOutput, PlaybackController, SilentOutput, SymphoniaDecoder,
};
use crate::telemetry::{NoopTelemetrySink, TelemetrySink};
use crate::transcript_stream::{RecognitionEngine, TranscriptStream};
use crate::tts_streaming::{HttpTtsClient, HttpTtsConfig, SpeechSynthesizer};
use crate::volume_meter::{MicrophoneSource, VolumeMeter};

use super::orchestrator::{PipelineInner, PipelineOrchestrator, PipelineSettings};

pub struct PipelineBuilder {
    config: PipelineConfig,
    recognizer: Option<Arc<dyn RecognitionEngine>>,
    translator: Option<Arc<dyn TranslationBackend>>,
    colloquializer: Option<Arc<dyn ColloquialAdapter>>,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    decoder: Option<Arc<dyn AudioDecoder>>,
    output: Option<Arc<dyn AudioOutput>>,
    microphone: Option<Arc<dyn MicrophoneSource>>,
    event_bus: Option<Arc<dyn EventBus>>,
    telemetry: Option<Arc<dyn TelemetrySink>>,
    clock: Option<Arc<dyn Clock>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            recognizer: None,
            translator: None,
            colloquializer: None,
            synthesizer: None,
            decoder: None,
            output: None,
            microphone: None,
            event_bus: None,
            telemetry: None,
            clock: None,
        }
    }

    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn recognizer(mut self, recognizer: Arc<dyn RecognitionEngine>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn translator(mut self, translator: Arc<dyn TranslationBackend>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn colloquializer(mut self, colloquializer: Arc<dyn ColloquialAdapter>) -> Self {
        self.colloquializer = Some(colloquializer);
        self
    }

    pub fn synthesizer(mut self, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    pub fn decoder(mut self, decoder: Arc<dyn AudioDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    pub fn output(mut self, output: Arc<dyn AudioOutput>) -> Self {
        self.output = Some(output);
        self
    }

    pub fn microphone(mut self, microphone: Arc<dyn MicrophoneSource>) -> Self {
        self.microphone = Some(microphone);
        self
    }

    pub fn event_bus(mut self, event_bus: Arc<dyn EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// 使用 HTTP 翻译 / TTS / 口语化后端
    ///
    /// 未配置口语化端点时使用本地规则口语化。
    pub fn with_http_backends(mut self, backends: &BackendConfig) -> EngineResult<Self> {
        let translator = HttpTranslationClient::new(
            backends.translate_url.clone(),
            backends.api_key.clone(),
            backends.timeout(),
        )?;
        let synthesizer = HttpTtsClient::new(HttpTtsConfig {
            endpoint: backends.tts_url.clone(),
            api_key: backends.api_key.clone(),
            timeout_ms: backends.timeout_ms,
        })?;
        let colloquializer: Arc<dyn ColloquialAdapter> = match &backends.colloquial_url {
            Some(url) => Arc::new(HttpColloquialClient::new(
                url.clone(),
                backends.api_key.clone(),
                backends.timeout(),
            )?),
            None => Arc::new(RuleBasedColloquializer::new()),
        };

        self.translator = Some(Arc::new(translator));
        self.synthesizer = Some(Arc::new(synthesizer));
        self.colloquializer = Some(colloquializer);
        Ok(self)
    }

    pub fn build(self) -> EngineResult<PipelineOrchestrator> {
        self.config.validate()?;
        let config = self.config;

        let recognizer = self
            .recognizer
            .ok_or_else(|| EngineError::config("recognizer is missing"))?;
        let translator = self
            .translator
            .ok_or_else(|| EngineError::config("translator is missing"))?;
        let synthesizer = self
            .synthesizer
            .ok_or_else(|| EngineError::config("synthesizer is missing"))?;
        let colloquializer = self
            .colloquializer
            .unwrap_or_else(|| Arc::new(RuleBasedColloquializer::new()));
        let decoder = self.decoder.unwrap_or_else(|| Arc::new(SymphoniaDecoder));
        let output = self.output.unwrap_or_else(|| Arc::new(SilentOutput::new()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let playback = PlaybackController::new(synthesizer, decoder, output)
            .with_request_timeout(config.backends.timeout());
        playback.set_enabled(config.speech.enabled);

        let platform = config
            .languages
            .user_agent
            .as_deref()
            .map(Platform::from_user_agent)
            .unwrap_or_default();
        let mut stream =
            TranscriptStream::new(recognizer, Arc::clone(&clock)).with_platform(platform);
        if let Some(microphone) = self.microphone {
            stream = stream.with_volume_meter(Arc::new(VolumeMeter::new(microphone)));
        }

        let (last_error, _) = watch::channel(None);
        let inner = PipelineInner {
            translator,
            colloquializer,
            playback: Arc::new(playback),
            stream: Arc::new(stream),
            event_bus: self.event_bus.unwrap_or_else(|| Arc::new(NullEventBus)),
            telemetry: self.telemetry.unwrap_or_else(|| Arc::new(NoopTelemetrySink)),
            clock,
            gate_config: config.gate.clone(),
            backend_timeout: config.backends.timeout(),
            settings: RwLock::new(PipelineSettings {
                input_language: config.languages.input.clone(),
                target_language: config.languages.target.clone(),
                speech_enabled: config.speech.enabled,
                gender: config.speech.gender,
            }),
            history: Mutex::new(ConversationHistory::new(config.history.capacity)),
            last_processed: Mutex::new(None),
            last_error,
            running: Mutex::new(None),
        };

        Ok(PipelineOrchestrator {
            inner: Arc::new(inner),
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
