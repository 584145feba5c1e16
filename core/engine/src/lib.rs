pub mod clock;
pub mod colloquial_adapter;
pub mod config_manager;
pub mod error;
pub mod event_bus;
pub mod history;
pub mod language;
pub mod logging;
pub mod nmt_client;
pub mod pipeline;
pub mod playback;
pub mod telemetry;
pub mod text_segmentation;
pub mod transcript_stream;
pub mod translation_gate;
pub mod tts_streaming;
pub mod types;
pub mod volume_meter;

pub use clock::{Clock, ManualClock, SystemClock};
pub use colloquial_adapter::{
    ColloquialAdapter, ColloquialStub, HttpColloquialClient, RuleBasedColloquializer,
};
pub use config_manager::{ConfigManager, FileConfigManager, PipelineConfig, StaticConfigManager};
pub use error::{EngineError, EngineResult, ErrorKind};
pub use event_bus::{
    ChannelEventBus, CoreEvent, EventBus, EventSubscription, EventTopic, NullEventBus,
};
pub use history::ConversationHistory;
pub use nmt_client::{
    HttpTranslationClient, TranslateRequest, TranslateResponse, TranslationBackend,
};
pub use pipeline::{PipelineBuilder, PipelineOrchestrator, PipelineSettings};
pub use playback::{
    AudioDecoder, AudioOutput, DecodedAudio, PlaybackController, PlaybackHandle, PlaybackState,
    SilentOutput, SymphoniaDecoder,
};
pub use telemetry::{TelemetryDatum, TelemetrySink};
pub use transcript_stream::{
    RecognitionConfig, RecognitionEngine, RecognitionResult, RecognitionSession, RecognizerEvent,
    StreamEvent, StreamState, TranscriptStream,
};
pub use translation_gate::{GateConfig, GateDecision, GatedText, TranslationGate};
pub use tts_streaming::{
    HttpTtsClient, HttpTtsConfig, SpeechSynthesizer, SynthesizedAudio, TtsRequest, TtsStub,
};
pub use types::{
    ConversationMessage, MessageKind, Provenance, TranscriptEvent, TtsState, VoiceGender,
};
pub use volume_meter::{MicrophoneSource, MicrophoneStream, VolumeMeter};
