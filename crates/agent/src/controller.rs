//! Call dialog controller
//!
//! The state machine that drives one outbound call: dial, greet,
//! listen, classify, retry, close, hang up. The controller owns the
//! single source of truth for "is the call over" and is the only task
//! that mutates the phase, the attempt counter, and the listening
//! flag; producers hand it events over channels and never transition
//! the call themselves.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{sleep, timeout, Duration};

use call_agent_config::Settings;
use call_agent_core::{Intent, LeadRecord, LeadStatus, SpeechSegment, Utterance};
use call_agent_persistence::LeadStore;
use call_agent_pipeline::{ListeningFlag, Transcriber, TtsEngine};
use call_agent_telephony::{AudioSink, DialOutcome, LifecycleGateway};

use crate::classifier::IntentClassifier;
use crate::dispatch::CallDispatch;
use crate::AgentError;

/// Dialog phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPhase {
    /// Placing the outbound call
    Dialing,
    /// Speaking the introduction
    Greeting,
    /// Waiting for a finalized speech segment
    Listening,
    /// Transcribing and classifying one segment
    Classifying,
    /// Speaking the clarification prompt after an unclear reply
    Retrying,
    /// Hanging up and flushing trailing audio
    Terminating,
    /// Terminal; all resources released
    Terminated,
}

/// How the call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    /// Callee expressed interest; a lead was recorded
    Interested,
    /// Callee declined, or retries were exhausted
    NotInterested,
    /// The dial attempt failed; no conversation happened
    DialFailed,
    /// The whole-call deadline expired
    DeadlineExpired,
    /// The audio producers went away mid-call
    Disconnected,
}

/// Controller events
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    /// Phase transition
    PhaseChanged { from: CallPhase, to: CallPhase },
    /// An utterance was classified
    Classified { text: String, intent: Intent },
    /// A lead row was recorded
    LeadRecorded { phone_number: String },
    /// The call finished; emitted exactly once
    Finished { outcome: CallOutcome },
}

/// Per-call session state
///
/// Owned exclusively by the controller and mutated only on its
/// decision task.
#[derive(Debug)]
pub struct CallSession {
    /// Target number; absent for non-dial dispatches
    pub phone_number: Option<String>,
    /// Room / call identifier
    pub call_id: String,
    /// Unclear classifications consumed so far
    pub attempts: u32,
    /// Set at most once; never reverts
    terminated: bool,
}

impl CallSession {
    fn new(dispatch: &CallDispatch) -> Self {
        Self {
            phone_number: dispatch.phone_number.clone(),
            call_id: dispatch.call_id.clone(),
            attempts: 0,
            terminated: false,
        }
    }
}

/// External collaborators the controller drives
pub struct ControllerDeps {
    pub gateway: Arc<dyn LifecycleGateway>,
    pub sink: Arc<dyn AudioSink>,
    pub tts: Arc<dyn TtsEngine>,
    pub transcriber: Arc<dyn Transcriber>,
    pub classifier: IntentClassifier,
    pub leads: Arc<dyn LeadStore>,
}

/// The dialog controller
pub struct DialogController {
    config: Settings,
    session: Mutex<CallSession>,
    phase: Mutex<CallPhase>,
    listening: Arc<ListeningFlag>,
    deps: ControllerDeps,
    event_tx: broadcast::Sender<ControllerEvent>,
    finished_tx: watch::Sender<bool>,
    finished_rx: watch::Receiver<bool>,
}

impl DialogController {
    pub fn new(config: Settings, dispatch: &CallDispatch, deps: ControllerDeps) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        let (finished_tx, finished_rx) = watch::channel(false);

        Self {
            config,
            session: Mutex::new(CallSession::new(dispatch)),
            phase: Mutex::new(CallPhase::Dialing),
            listening: ListeningFlag::new(),
            deps,
            event_tx,
            finished_tx,
            finished_rx,
        }
    }

    /// Subscribe to controller events
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.event_tx.subscribe()
    }

    /// The listening flag shared with the voice activity gate
    pub fn listening_flag(&self) -> Arc<ListeningFlag> {
        self.listening.clone()
    }

    /// Watch that flips to true when the call has finished
    ///
    /// Producer tasks (audio ingestion, VAD consumption) should stop
    /// when this resolves.
    pub fn finished(&self) -> watch::Receiver<bool> {
        self.finished_rx.clone()
    }

    /// Current phase
    pub fn phase(&self) -> CallPhase {
        *self.phase.lock()
    }

    /// Unclear attempts consumed so far
    pub fn attempts(&self) -> u32 {
        self.session.lock().attempts
    }

    pub fn is_terminated(&self) -> bool {
        self.session.lock().terminated
    }

    /// Drive the call to completion
    ///
    /// `segment_rx` is the gate's output: at most one finalized
    /// segment in flight at a time.
    pub async fn run(
        &self,
        mut segment_rx: mpsc::Receiver<SpeechSegment>,
    ) -> Result<CallOutcome, AgentError> {
        let (phone, call_id) = {
            let session = self.session.lock();
            (session.phone_number.clone(), session.call_id.clone())
        };

        // Dial, or fall through to the conversational flow when the
        // dispatch carried no number.
        let participant = match phone.as_deref() {
            Some(number) => {
                tracing::info!(%number, %call_id, "Dialing");
                match self.deps.gateway.dial(&call_id, number).await {
                    Ok(DialOutcome::Answered {
                        participant_identity,
                    }) => {
                        tracing::info!("Call answered");
                        Some(participant_identity)
                    }
                    Ok(DialOutcome::Failed { reason }) => {
                        tracing::warn!(%reason, "Dial failed");
                        self.finish(None, CallOutcome::DialFailed).await;
                        return Ok(CallOutcome::DialFailed);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Dial error");
                        self.finish(None, CallOutcome::DialFailed).await;
                        return Ok(CallOutcome::DialFailed);
                    }
                }
            }
            None => None,
        };

        let deadline = Duration::from_secs(self.config.dialog.call_deadline_secs);
        let outcome = match timeout(deadline, self.dialog(&mut segment_rx, phone.is_some())).await
        {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(AgentError::ChannelClosed)) => {
                tracing::warn!("Audio producers disconnected mid-call");
                CallOutcome::Disconnected
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                tracing::info!(deadline_secs = deadline.as_secs(), "Call deadline expired");
                CallOutcome::DeadlineExpired
            }
        };

        self.finish(participant.as_deref(), outcome).await;
        Ok(outcome)
    }

    /// Greeting and the listen/classify loop
    async fn dialog(
        &self,
        segment_rx: &mut mpsc::Receiver<SpeechSegment>,
        dialed: bool,
    ) -> Result<CallOutcome, AgentError> {
        self.set_phase(CallPhase::Greeting);

        if dialed {
            // Brief pause for the media leg to stabilize.
            sleep(Duration::from_millis(self.config.dialog.post_answer_delay_ms)).await;
            self.speak(&self.config.messages.greeting).await;
        } else {
            self.speak(&self.config.messages.fallback_greeting).await;
        }

        self.open_listening();

        loop {
            let Some(segment) = segment_rx.recv().await else {
                return Err(AgentError::ChannelClosed);
            };

            // The gate already flipped listening off atomically with
            // emission; from here until the next open_listening no new
            // segment can enter classification.
            self.set_phase(CallPhase::Classifying);

            let utterance = self.deps.transcriber.transcribe(segment).await;

            if self.too_short(&utterance) {
                // Inaudible or noise: resume listening without
                // touching the retry counter.
                tracing::debug!("Empty or too-short transcript, resuming listening");
                self.open_listening();
                continue;
            }

            let intent = self.deps.classifier.classify(&utterance.text).await;
            tracing::info!(text = %utterance.text, %intent, "Classified utterance");
            let _ = self.event_tx.send(ControllerEvent::Classified {
                text: utterance.text.clone(),
                intent,
            });

            match intent {
                Intent::Interested => {
                    self.record_lead().await;
                    self.speak(&self.config.messages.interested).await;
                    return Ok(CallOutcome::Interested);
                }
                Intent::NotInterested => {
                    self.speak(&self.config.messages.not_interested).await;
                    return Ok(CallOutcome::NotInterested);
                }
                Intent::Unclear => {
                    let attempts = {
                        let mut session = self.session.lock();
                        session.attempts += 1;
                        session.attempts
                    };

                    if attempts >= self.config.dialog.max_attempts {
                        tracing::info!(attempts, "Retries exhausted, closing with safe default");
                        self.speak(&self.config.messages.not_interested).await;
                        return Ok(CallOutcome::NotInterested);
                    }

                    self.set_phase(CallPhase::Retrying);
                    self.speak(&self.config.messages.clarification).await;
                    self.open_listening();
                }
            }
        }
    }

    fn too_short(&self, utterance: &Utterance) -> bool {
        utterance.len_chars() < self.config.dialog.min_utterance_chars
    }

    fn open_listening(&self) {
        self.set_phase(CallPhase::Listening);
        self.listening.set(true);
    }

    /// Speak one message into the call
    ///
    /// Half-duplex: the listening window is closed for the duration.
    /// TTS or sink failures are logged and swallowed; a lost message
    /// never aborts the call.
    async fn speak(&self, text: &str) {
        self.listening.set(false);
        tracing::info!(%text, "Agent speaking");

        let mut frames = match self.deps.tts.synthesize(text).await {
            Ok(frames) => frames,
            Err(e) => {
                tracing::warn!(error = %e, "TTS synthesis failed");
                return;
            }
        };

        while let Some(frame) = frames.recv().await {
            if let Err(e) = self.deps.sink.send_frame(frame).await {
                tracing::warn!(error = %e, "Audio publish failed");
                return;
            }
        }

        if let Err(e) = self.deps.sink.flush().await {
            tracing::warn!(error = %e, "Audio flush failed");
        }
    }

    async fn record_lead(&self) {
        let phone = self
            .session
            .lock()
            .phone_number
            .clone()
            .unwrap_or_else(|| "Unknown".to_string());

        let lead = LeadRecord::new(phone.clone(), LeadStatus::Interested);
        match self.deps.leads.record(&lead).await {
            Ok(()) => {
                let _ = self.event_tx.send(ControllerEvent::LeadRecorded {
                    phone_number: phone,
                });
            }
            Err(e) => {
                // Non-fatal: the call still terminates cleanly.
                tracing::error!(error = %e, "Failed to record lead");
            }
        }
    }

    /// Hang up and signal completion
    ///
    /// Hangup is best-effort and attempted even when earlier steps
    /// failed: remove the SIP participant first, tear the whole
    /// session down when removal fails or there is no participant.
    /// The finished signal fires at most once no matter how many
    /// paths reach here.
    async fn finish(&self, participant: Option<&str>, outcome: CallOutcome) {
        self.set_phase(CallPhase::Terminating);
        self.listening.set(false);

        let call_id = self.session.lock().call_id.clone();

        let removed = match participant {
            Some(identity) => match self
                .deps
                .gateway
                .remove_participant(&call_id, identity)
                .await
            {
                Ok(()) => {
                    tracing::info!("SIP participant removed");
                    true
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Remove participant failed");
                    false
                }
            },
            None => false,
        };

        if !removed {
            if let Err(e) = self.deps.gateway.teardown_session(&call_id).await {
                tracing::warn!(error = %e, "Session teardown failed");
            }
        }

        // Let trailing audio flush before the media leg drops.
        sleep(Duration::from_millis(self.config.dialog.hangup_grace_ms)).await;

        self.signal_finished(outcome);
        self.set_phase(CallPhase::Terminated);
    }

    /// Idempotent finished signal
    fn signal_finished(&self, outcome: CallOutcome) {
        {
            let mut session = self.session.lock();
            if session.terminated {
                return;
            }
            session.terminated = true;
        }

        let _ = self.finished_tx.send(true);
        let _ = self.event_tx.send(ControllerEvent::Finished { outcome });
        tracing::info!(?outcome, "Call finished");
    }

    fn set_phase(&self, to: CallPhase) {
        let from = {
            let mut phase = self.phase.lock();
            let from = *phase;
            *phase = to;
            from
        };

        if from != to {
            tracing::debug!(?from, ?to, "Phase transition");
            let _ = self.event_tx.send(ControllerEvent::PhaseChanged { from, to });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use call_agent_core::AudioFrame;
    use call_agent_persistence::PersistenceError;
    use call_agent_pipeline::PipelineError;
    use call_agent_telephony::TelephonyError;
    use crate::classifier::{FallbackClassifier, KeywordMatcher};

    struct NoopGateway;

    #[async_trait]
    impl LifecycleGateway for NoopGateway {
        async fn dial(&self, _: &str, _: &str) -> Result<DialOutcome, TelephonyError> {
            Ok(DialOutcome::Answered {
                participant_identity: "p".to_string(),
            })
        }

        async fn remove_participant(&self, _: &str, _: &str) -> Result<(), TelephonyError> {
            Ok(())
        }

        async fn teardown_session(&self, _: &str) -> Result<(), TelephonyError> {
            Ok(())
        }
    }

    struct NoopSink;

    #[async_trait]
    impl AudioSink for NoopSink {
        async fn send_frame(&self, _: AudioFrame) -> Result<(), TelephonyError> {
            Ok(())
        }

        async fn flush(&self) -> Result<(), TelephonyError> {
            Ok(())
        }
    }

    struct SilentTts;

    #[async_trait]
    impl TtsEngine for SilentTts {
        async fn synthesize(
            &self,
            _: &str,
        ) -> Result<mpsc::Receiver<AudioFrame>, PipelineError> {
            let (_tx, rx) = mpsc::channel(1);
            Ok(rx)
        }
    }

    struct SilentTranscriber;

    #[async_trait]
    impl Transcriber for SilentTranscriber {
        async fn transcribe(&self, segment: SpeechSegment) -> Utterance {
            Utterance::new("", segment.started_at_ms, segment.ended_at_ms)
        }
    }

    struct UnclearFallback;

    #[async_trait]
    impl FallbackClassifier for UnclearFallback {
        async fn classify(&self, _: &str) -> Intent {
            Intent::Unclear
        }
    }

    struct NoopLeads;

    #[async_trait]
    impl LeadStore for NoopLeads {
        async fn record(&self, _: &LeadRecord) -> Result<(), PersistenceError> {
            Ok(())
        }
    }

    fn controller() -> DialogController {
        let mut settings = Settings::default();
        settings.dialog.hangup_grace_ms = 0;

        let deps = ControllerDeps {
            gateway: Arc::new(NoopGateway),
            sink: Arc::new(NoopSink),
            tts: Arc::new(SilentTts),
            transcriber: Arc::new(SilentTranscriber),
            classifier: IntentClassifier::new(
                KeywordMatcher::new(&settings.keywords),
                Arc::new(UnclearFallback),
            ),
            leads: Arc::new(NoopLeads),
        };

        let dispatch = CallDispatch::new("call-1", Some("+15550100".to_string()));
        DialogController::new(settings, &dispatch, deps)
    }

    #[tokio::test]
    async fn test_repeated_finish_signals_once() {
        let controller = controller();
        let mut events = controller.subscribe();

        controller
            .finish(None, CallOutcome::NotInterested)
            .await;
        controller.finish(None, CallOutcome::Interested).await;

        assert!(controller.is_terminated());
        assert_eq!(controller.phase(), CallPhase::Terminated);
        assert!(*controller.finished().borrow());

        // The first outcome wins; the second invocation is swallowed
        // by the termination guard.
        let mut outcomes = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let ControllerEvent::Finished { outcome } = event {
                outcomes.push(outcome);
            }
        }
        assert_eq!(outcomes, vec![CallOutcome::NotInterested]);
    }
}
