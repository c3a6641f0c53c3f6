//! Fake collaborators for driving the engine in unit tests
//!
//! The transport interprets the G-code it receives so captured positions
//! follow the moves the engine made. The prompt can "jog" the shared machine
//! to simulate the operator.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::string::{String, ToString};
use std::vec::Vec;

use dabber_protocol::Command;

use crate::cancel::CancelToken;
use crate::config::MachineConfig;
use crate::engine::Engine;
use crate::traits::{
    CandidatePicker, Clock, MachinePosition, PixelPoint, Prompt, PromptResponse, Transport,
    TransportError, Vision, VisionError,
};

/// Simulated controller state shared between fakes
#[derive(Debug)]
pub struct SimState {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub b: f64,
    pub relative: bool,
    /// Answer position queries
    pub report_position: bool,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            b: 0.0,
            relative: false,
            report_position: true,
        }
    }
}

impl SimState {
    fn execute(&mut self, line: &str) {
        let mut words = line.split_whitespace();
        match words.next() {
            Some("G90") => self.relative = false,
            Some("G91") => self.relative = true,
            Some("G0") | Some("G1") => {
                for word in words {
                    let (axis, value) = word.split_at(1);
                    let Ok(value) = value.parse::<f64>() else {
                        continue;
                    };
                    let slot = match axis {
                        "X" => &mut self.x,
                        "Y" => &mut self.y,
                        "Z" => &mut self.z,
                        "B" => &mut self.b,
                        _ => continue,
                    };
                    if self.relative {
                        *slot += value;
                    } else {
                        *slot = value;
                    }
                }
            }
            Some("G92") => {
                for word in words {
                    let (axis, value) = word.split_at(1);
                    if let Ok(value) = value.parse::<f64>() {
                        match axis {
                            "X" => self.x = value,
                            "Y" => self.y = value,
                            _ => {}
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn position(&self) -> MachinePosition {
        MachinePosition::new(self.x, self.y, self.z)
    }
}

pub type Sim = Rc<RefCell<SimState>>;

/// Recording transport over the simulated controller
pub struct FakeTransport {
    pub sim: Sim,
    /// Every batch sent, as text
    pub batches: Vec<Vec<String>>,
    /// Fail the batch with this index (0-based, counting all batches)
    pub fail_at_batch: Option<usize>,
    /// Cancel this token once this many batches have been sent
    pub cancel_after: Option<(usize, CancelToken)>,
    /// Clock time at which each batch was sent
    pub sent_at: Vec<u64>,
    pub clock: ManualClock,
}

impl FakeTransport {
    /// All commands sent, flattened
    pub fn commands(&self) -> Vec<String> {
        self.batches.iter().flatten().cloned().collect()
    }

    /// Batches containing a command that starts with `prefix`
    pub fn batches_with(&self, prefix: &str) -> Vec<&Vec<String>> {
        self.batches
            .iter()
            .filter(|b| b.iter().any(|c| c.starts_with(prefix)))
            .collect()
    }
}

impl Transport for FakeTransport {
    async fn send(&mut self, commands: &[Command]) -> Result<(), TransportError> {
        if self.fail_at_batch == Some(self.batches.len()) {
            return Err(TransportError::Timeout);
        }
        {
            let mut sim = self.sim.borrow_mut();
            for cmd in commands {
                sim.execute(cmd.as_str());
            }
        }
        self.batches
            .push(commands.iter().map(|c| c.as_str().to_string()).collect());
        self.sent_at.push(self.clock.now_ms());
        if let Some((after, token)) = &self.cancel_after {
            if self.batches.len() >= *after {
                token.cancel();
            }
        }
        Ok(())
    }

    async fn query_position(&mut self) -> Result<Option<MachinePosition>, TransportError> {
        let sim = self.sim.borrow();
        Ok(sim.report_position.then(|| sim.position()))
    }
}

/// Vision that returns scripted detections, then nothing
#[derive(Default)]
pub struct ScriptedVision {
    pub detections: VecDeque<Result<Option<PixelPoint>, VisionError>>,
    pub calls: usize,
}

impl Vision for ScriptedVision {
    async fn detect_alignment_feature(&mut self) -> Result<Option<PixelPoint>, VisionError> {
        self.calls += 1;
        self.detections.pop_front().unwrap_or(Ok(None))
    }
}

/// Prompt that answers from a script and optionally jogs the machine
pub struct ScriptedPrompt {
    pub sim: Sim,
    /// Answers in order; `Continue` once exhausted
    pub answers: VecDeque<PromptResponse>,
    /// Position the operator jogs to before answering each prompt
    pub jogs: VecDeque<Option<MachinePosition>>,
    pub messages: Vec<String>,
}

impl Prompt for ScriptedPrompt {
    async fn show(&mut self, message: &str) -> PromptResponse {
        self.messages.push(message.to_string());
        if let Some(Some(target)) = self.jogs.pop_front() {
            let mut sim = self.sim.borrow_mut();
            sim.x = target.x;
            sim.y = target.y;
            sim.z = target.z;
        }
        self.answers.pop_front().unwrap_or(PromptResponse::Continue)
    }
}

/// Picker that clicks scripted candidates
#[derive(Default)]
pub struct ScriptedPicker {
    pub picks: VecDeque<Option<usize>>,
    pub messages: Vec<String>,
}

impl CandidatePicker for ScriptedPicker {
    async fn pick(&mut self, message: &str) -> Option<usize> {
        self.messages.push(message.to_string());
        self.picks.pop_front().flatten()
    }
}

/// Clock advanced only by delays
#[derive(Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    async fn delay_ms(&self, ms: u64) {
        self.advance(ms);
    }
}

pub type TestEngine = Engine<FakeTransport, ScriptedVision, ScriptedPrompt, ManualClock>;

/// Engine wired to fresh fakes with the default config
pub fn rig() -> (TestEngine, Sim) {
    rig_with(MachineConfig::default())
}

pub fn rig_with(config: MachineConfig) -> (TestEngine, Sim) {
    let sim: Sim = Rc::new(RefCell::new(SimState::default()));
    let clock = ManualClock::default();
    let transport = FakeTransport {
        sim: sim.clone(),
        batches: Vec::new(),
        fail_at_batch: None,
        cancel_after: None,
        sent_at: Vec::new(),
        clock: clock.clone(),
    };
    let prompt = ScriptedPrompt {
        sim: sim.clone(),
        answers: VecDeque::new(),
        jogs: VecDeque::new(),
        messages: Vec::new(),
    };
    let engine = Engine::new(transport, ScriptedVision::default(), prompt, clock, config);
    (engine, sim)
}
