//! Scriptable fakes for every collaborator the controller drives.

#![allow(clippy::unwrap_used)]

use crate::{
    AudioError, AudioResult, AudioSession, CaptureDevice, ClipboardBackend, ClipboardEntry,
    ClipboardInserter, Collaborators, ControllerOptions, Earcons, EngineError, EngineLoader,
    EngineResult, EntryFormat, InputSynthesizer, InsertionError, InsertionOptions,
    InsertionResult, MicrophoneTrust, Notifier, PermissionGate, PttController, SpeechEngine,
    TranscriptionGateway,
};

use std::{
    panic::Location,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
        mpsc,
    },
    time::Duration,
};

use async_trait::async_trait;
use error_location::ErrorLocation;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Audio
// ---------------------------------------------------------------------------

/// Capture device returning a fixed buffer.
#[derive(Clone)]
pub(crate) struct FakeCapture {
    sample_rate: u32,
    samples: Arc<Mutex<Vec<f32>>>,
    fail_start: Arc<AtomicBool>,
    fail_stop: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    starts: Arc<AtomicUsize>,
}

impl FakeCapture {
    pub(crate) fn new(sample_rate: u32, samples: Vec<f32>) -> Self {
        Self {
            sample_rate,
            samples: Arc::new(Mutex::new(samples)),
            fail_start: Arc::new(AtomicBool::new(false)),
            fail_stop: Arc::new(AtomicBool::new(false)),
            running: Arc::new(AtomicBool::new(false)),
            starts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Half a second of a quiet tone at 16kHz.
    pub(crate) fn speech() -> Self {
        let samples = (0..8_000).map(|i| (i as f32 * 0.05).sin() * 0.25).collect();
        Self::new(16_000, samples)
    }

    pub(crate) fn fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    /// Simulate the device disappearing mid-recording.
    pub(crate) fn fail_stop(&self, fail: bool) {
        self.fail_stop.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub(crate) fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }
}

impl CaptureDevice for FakeCapture {
    fn start(&mut self) -> AudioResult<()> {
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(AudioError::DeviceUnavailable {
                reason: "No input device found".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) -> AudioResult<Vec<f32>> {
        self.running.store(false, Ordering::SeqCst);
        if self.fail_stop.load(Ordering::SeqCst) {
            return Err(AudioError::DeviceUnavailable {
                reason: "Device disconnected".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(self.samples.lock().unwrap().clone())
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Number of entries directly under `dir`.
pub(crate) fn file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

// ---------------------------------------------------------------------------
// Transcription
// ---------------------------------------------------------------------------

/// What the fake engine answers.
#[derive(Debug, Clone)]
pub(crate) enum EngineReply {
    Text(String),
    Fail,
    /// Fail because a remote resource could not be reached.
    Network,
    /// Panic inside inference.
    Panic,
}

/// Speech engine with a scripted reply.
///
/// Optionally blocks inside `transcribe` until released, to hold the
/// controller in `Transcribing`.
pub(crate) struct FakeEngine {
    reply: Mutex<EngineReply>,
    hold: Mutex<Option<mpsc::Receiver<()>>>,
    seen: Mutex<Vec<(PathBuf, bool)>>,
}

impl FakeEngine {
    pub(crate) fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Mutex::new(EngineReply::Text(text.to_string())),
            hold: Mutex::new(None),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn set_reply(&self, reply: EngineReply) {
        *self.reply.lock().unwrap() = reply;
    }

    /// Block every `transcribe` call until the returned sender fires or drops.
    pub(crate) fn hold(&self) -> mpsc::Sender<()> {
        let (tx, rx) = mpsc::channel();
        *self.hold.lock().unwrap() = Some(rx);
        tx
    }

    /// Every recording passed in, with whether it existed at the time.
    pub(crate) fn seen(&self) -> Vec<(PathBuf, bool)> {
        self.seen.lock().unwrap().clone()
    }
}

impl SpeechEngine for FakeEngine {
    fn transcribe(&self, recording: &Path) -> EngineResult<String> {
        if let Some(hold) = self.hold.lock().unwrap().as_ref() {
            let _ = hold.recv();
        }

        self.seen
            .lock()
            .unwrap()
            .push((recording.to_path_buf(), recording.exists()));

        // Bound first so a panicking reply does not poison the lock.
        let reply = self.reply.lock().unwrap().clone();
        match reply {
            EngineReply::Text(text) => Ok(text),
            EngineReply::Fail => Err(EngineError::TranscriptionFailed {
                source: "inference failed".into(),
                location: ErrorLocation::from(Location::caller()),
            }),
            EngineReply::Network => Err(EngineError::NetworkUnreachable {
                reason: "connection refused".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
            EngineReply::Panic => {
                #[allow(clippy::panic)]
                {
                    panic!("inference crashed")
                }
            }
        }
    }
}

/// How the next load attempts fail before one succeeds.
#[derive(Debug, Clone, Copy)]
pub(crate) enum LoadFailure {
    Network,
    Unavailable,
}

/// Loader handing out a shared [`FakeEngine`].
#[derive(Clone)]
pub(crate) struct FakeLoader {
    engine: Arc<FakeEngine>,
    loads: Arc<AtomicUsize>,
    failures: Arc<Mutex<Vec<LoadFailure>>>,
}

impl FakeLoader {
    pub(crate) fn new(engine: Arc<FakeEngine>) -> Self {
        Self {
            engine,
            loads: Arc::new(AtomicUsize::new(0)),
            failures: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a failure for the next load attempt.
    pub(crate) fn fail_next(&self, failure: LoadFailure) {
        self.failures.lock().unwrap().push(failure);
    }

    /// Load attempts so far, failed ones included.
    pub(crate) fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EngineLoader for FakeLoader {
    async fn load(&self) -> EngineResult<Arc<dyn SpeechEngine>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        let failure = {
            let mut failures = self.failures.lock().unwrap();
            (!failures.is_empty()).then(|| failures.remove(0))
        };

        match failure {
            Some(LoadFailure::Network) => Err(EngineError::NetworkUnreachable {
                reason: "Could not reach model host".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
            Some(LoadFailure::Unavailable) => Err(EngineError::EngineUnavailable {
                reason: "Corrupt model".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
            None => Ok(Arc::clone(&self.engine) as Arc<dyn SpeechEngine>),
        }
    }
}

// ---------------------------------------------------------------------------
// Insertion
// ---------------------------------------------------------------------------

/// In-memory clipboard shared between the inserter and the test.
#[derive(Clone, Default)]
pub(crate) struct FakeClipboard {
    entries: Arc<Mutex<Vec<ClipboardEntry>>>,
    drop_writes: Arc<AtomicBool>,
    fail_text_writes: Arc<AtomicBool>,
    mangle_text_writes: Arc<AtomicBool>,
    writes: Arc<AtomicUsize>,
}

impl FakeClipboard {
    pub(crate) fn with_entries(entries: Vec<ClipboardEntry>) -> Self {
        let clipboard = Self::default();
        *clipboard.entries.lock().unwrap() = entries;
        clipboard
    }

    pub(crate) fn with_text(text: &str) -> Self {
        Self::with_entries(vec![ClipboardEntry::text(text)])
    }

    /// What the user would see, bypassing the inserter.
    pub(crate) fn entries(&self) -> Vec<ClipboardEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub(crate) fn text(&self) -> Option<String> {
        text_of(&self.entries.lock().unwrap())
    }

    /// Simulate the user copying something.
    pub(crate) fn user_copies(&self, text: &str) {
        *self.entries.lock().unwrap() = vec![ClipboardEntry::text(text)];
    }

    /// Accept writes without changing the contents.
    pub(crate) fn drop_writes(&self, drop: bool) {
        self.drop_writes.store(drop, Ordering::SeqCst);
    }

    /// Make `write_text` fail after the preceding `clear` took effect.
    pub(crate) fn fail_text_writes(&self, fail: bool) {
        self.fail_text_writes.store(fail, Ordering::SeqCst);
    }

    /// Make `write_text` store different text than it was given.
    pub(crate) fn mangle_text_writes(&self, mangle: bool) {
        self.mangle_text_writes.store(mangle, Ordering::SeqCst);
    }

    /// Mutating calls made through the backend.
    pub(crate) fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub(crate) fn boxed(&self) -> Box<dyn ClipboardBackend> {
        Box::new(self.clone())
    }
}

fn text_of(entries: &[ClipboardEntry]) -> Option<String> {
    entries
        .iter()
        .find(|entry| entry.format == EntryFormat::PlainText)
        .map(|entry| String::from_utf8_lossy(&entry.payload).into_owned())
}

impl ClipboardBackend for FakeClipboard {
    fn read_entries(&mut self) -> InsertionResult<Vec<ClipboardEntry>> {
        Ok(self.entries.lock().unwrap().clone())
    }

    fn read_text(&mut self) -> InsertionResult<Option<String>> {
        Ok(text_of(&self.entries.lock().unwrap()))
    }

    fn clear(&mut self) -> InsertionResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if !self.drop_writes.load(Ordering::SeqCst) {
            self.entries.lock().unwrap().clear();
        }
        Ok(())
    }

    fn write_text(&mut self, text: &str) -> InsertionResult<()> {
        if self.fail_text_writes.load(Ordering::SeqCst) {
            self.writes.fetch_add(1, Ordering::SeqCst);
            return Err(InsertionError::ClipboardError {
                reason: "pasteboard rejected the write".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        if self.mangle_text_writes.load(Ordering::SeqCst) {
            return self.write_entries(&[ClipboardEntry::text("mangled")]);
        }
        self.write_entries(&[ClipboardEntry::text(text)])
    }

    fn write_entries(&mut self, entries: &[ClipboardEntry]) -> InsertionResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if !self.drop_writes.load(Ordering::SeqCst) {
            self.entries.lock().unwrap().extend_from_slice(entries);
        }
        Ok(())
    }
}

/// Paste synthesizer that records what the target application would paste.
pub(crate) struct FakeSynthesizer {
    clipboard: FakeClipboard,
    pasted: Mutex<Vec<Option<String>>>,
    refuse: AtomicBool,
}

impl FakeSynthesizer {
    pub(crate) fn new(clipboard: &FakeClipboard) -> Arc<Self> {
        Arc::new(Self {
            clipboard: clipboard.clone(),
            pasted: Mutex::new(Vec::new()),
            refuse: AtomicBool::new(false),
        })
    }

    /// Reject every paste as untrusted.
    pub(crate) fn refuse(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    /// Clipboard text observed at each paste chord.
    pub(crate) fn pasted(&self) -> Vec<Option<String>> {
        self.pasted.lock().unwrap().clone()
    }
}

#[async_trait]
impl InputSynthesizer for FakeSynthesizer {
    async fn post_paste_chord(&self) -> InsertionResult<()> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(InsertionError::PermissionDenied {
                location: ErrorLocation::from(Location::caller()),
            });
        }
        self.pasted.lock().unwrap().push(self.clipboard.text());
        Ok(())
    }
}

/// Insertion options with no settle delay and a short restore delay.
pub(crate) fn fast_insertion() -> InsertionOptions {
    InsertionOptions {
        restore_delay: Duration::from_millis(20),
        settle_delay: Duration::ZERO,
        ..InsertionOptions::default()
    }
}

// ---------------------------------------------------------------------------
// Permissions, notices
// ---------------------------------------------------------------------------

/// Permission gate with scripted answers.
pub(crate) struct FakeGate {
    microphone: Mutex<MicrophoneTrust>,
    grant_on_request: AtomicBool,
    microphone_requests: AtomicUsize,
    injection_trusted: AtomicBool,
    trust_after_checks: AtomicUsize,
    injection_checks: AtomicUsize,
}

impl FakeGate {
    pub(crate) fn granted() -> Arc<Self> {
        Self::with_microphone(MicrophoneTrust::Granted)
    }

    pub(crate) fn with_microphone(trust: MicrophoneTrust) -> Arc<Self> {
        Arc::new(Self {
            microphone: Mutex::new(trust),
            grant_on_request: AtomicBool::new(true),
            microphone_requests: AtomicUsize::new(0),
            injection_trusted: AtomicBool::new(true),
            trust_after_checks: AtomicUsize::new(0),
            injection_checks: AtomicUsize::new(0),
        })
    }

    pub(crate) fn set_microphone(&self, trust: MicrophoneTrust) {
        *self.microphone.lock().unwrap() = trust;
    }

    pub(crate) fn grant_on_request(&self, grant: bool) {
        self.grant_on_request.store(grant, Ordering::SeqCst);
    }

    pub(crate) fn microphone_requests(&self) -> usize {
        self.microphone_requests.load(Ordering::SeqCst)
    }

    /// Untrusted; becomes trusted after `checks` trust queries (0 = never).
    pub(crate) fn untrusted_injection(&self, checks: usize) {
        self.injection_trusted.store(false, Ordering::SeqCst);
        self.trust_after_checks.store(checks, Ordering::SeqCst);
    }

    pub(crate) fn injection_checks(&self) -> usize {
        self.injection_checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PermissionGate for FakeGate {
    fn microphone_trust(&self) -> MicrophoneTrust {
        *self.microphone.lock().unwrap()
    }

    async fn request_microphone(&self) -> bool {
        self.microphone_requests.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        let granted = self.grant_on_request.load(Ordering::SeqCst);
        self.set_microphone(if granted {
            MicrophoneTrust::Granted
        } else {
            MicrophoneTrust::Denied
        });
        granted
    }

    fn is_input_injection_trusted(&self) -> bool {
        let checks = self.injection_checks.fetch_add(1, Ordering::SeqCst) + 1;
        let after = self.trust_after_checks.load(Ordering::SeqCst);
        if after > 0 && checks >= after {
            self.injection_trusted.store(true, Ordering::SeqCst);
        }
        self.injection_trusted.load(Ordering::SeqCst)
    }

    fn request_input_injection_prompt(&self) -> bool {
        self.injection_trusted.load(Ordering::SeqCst)
    }
}

/// Notifier that keeps every message.
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub(crate) fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

/// Earcons that count plays.
#[derive(Default)]
pub(crate) struct CountingEarcons {
    started: AtomicUsize,
    stopped: AtomicUsize,
}

impl CountingEarcons {
    pub(crate) fn counts(&self) -> (usize, usize) {
        (
            self.started.load(Ordering::SeqCst),
            self.stopped.load(Ordering::SeqCst),
        )
    }
}

impl Earcons for CountingEarcons {
    fn recording_started(&self) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn recording_stopped(&self) {
        self.stopped.fetch_add(1, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Controller harness
// ---------------------------------------------------------------------------

/// A controller wired to fakes, with handles to inspect each of them.
pub(crate) struct Harness {
    pub(crate) controller: Arc<PttController>,
    pub(crate) capture: FakeCapture,
    pub(crate) engine: Arc<FakeEngine>,
    pub(crate) loader: FakeLoader,
    pub(crate) clipboard: FakeClipboard,
    pub(crate) synthesizer: Arc<FakeSynthesizer>,
    pub(crate) gate: Arc<FakeGate>,
    pub(crate) notifier: Arc<RecordingNotifier>,
    pub(crate) earcons: Arc<CountingEarcons>,
    pub(crate) scratch: TempDir,
}

impl Harness {
    /// Granted microphone, speech on the device, engine replying "hello world",
    /// clipboard holding "original".
    pub(crate) fn new() -> Self {
        Self::with_options(fast_insertion(), ControllerOptions::default())
    }

    pub(crate) fn with_options(insertion: InsertionOptions, options: ControllerOptions) -> Self {
        let scratch = TempDir::new().unwrap();
        let capture = FakeCapture::speech();
        let engine = FakeEngine::replying("hello world");
        let loader = FakeLoader::new(Arc::clone(&engine));
        let clipboard = FakeClipboard::with_text("original");
        let synthesizer = FakeSynthesizer::new(&clipboard);
        let gate = FakeGate::granted();
        let notifier = Arc::new(RecordingNotifier::default());
        let earcons = Arc::new(CountingEarcons::default());

        let controller = PttController::new(
            Collaborators {
                gate: Arc::clone(&gate) as Arc<dyn PermissionGate>,
                audio: AudioSession::new(Box::new(capture.clone()), scratch.path()),
                gateway: TranscriptionGateway::new(loader.clone()),
                inserter: ClipboardInserter::new(
                    clipboard.boxed(),
                    Arc::clone(&synthesizer) as Arc<dyn InputSynthesizer>,
                    insertion,
                ),
                notifier: Arc::clone(&notifier) as Arc<dyn Notifier>,
                earcons: Some(Arc::clone(&earcons) as Arc<dyn Earcons>),
            },
            options,
        );

        Self {
            controller,
            capture,
            engine,
            loader,
            clipboard,
            synthesizer,
            gate,
            notifier,
            earcons,
            scratch,
        }
    }

    /// Run one full press/release cycle and wait for it to settle.
    pub(crate) async fn dictate(&self) {
        let _ = self.controller.pressed();
        if let Some(cycle) = self.controller.released() {
            cycle.await.unwrap();
        }
    }

    pub(crate) fn scratch_files(&self) -> usize {
        file_count(self.scratch.path())
    }
}
