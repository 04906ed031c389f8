use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// Envelope rates, all in amplitude units per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdsrParams {
    pub attack_rate: f64,
    pub decay_rate: f64,
    pub sustain_level: f64,
    /// Sustain keeps losing energy at this rate; 0 holds the note indefinitely.
    pub sustain_decay_rate: f64,
    pub release_rate: f64,
}

impl Default for AdsrParams {
    fn default() -> Self {
        Self {
            attack_rate: 15.0,
            decay_rate: 13.0,
            sustain_level: 0.7,
            sustain_decay_rate: 0.0,
            release_rate: 2.0,
        }
    }
}

/// Rate-driven ADSR envelope with a decaying sustain.
///
/// `on()` and `off()` are legal from every state. Attack may overshoot 1.0 by
/// one step; reaching zero in Sustain or Release lands on exactly 0 and Idle.
#[derive(Debug, Clone)]
pub struct AdsrEnvelope {
    params: AdsrParams,
    state: EnvelopeState,
    elapsed: f64,
    value: f64,
}

impl AdsrEnvelope {
    pub fn new(params: AdsrParams) -> Self {
        Self {
            params,
            state: EnvelopeState::Idle,
            elapsed: 0.0,
            value: 0.0,
        }
    }

    /// Restart the attack from silence.
    pub fn on(&mut self) {
        self.state = EnvelopeState::Attack;
        self.elapsed = 0.0;
        self.value = 0.0;
    }

    /// Begin the release from whatever amplitude is current.
    pub fn off(&mut self) {
        self.state = EnvelopeState::Release;
        self.elapsed = 0.0;
    }

    pub fn advance(&mut self, dt: f64) {
        if self.state == EnvelopeState::Idle {
            return;
        }
        self.elapsed += dt;

        match self.state {
            EnvelopeState::Idle => {}
            EnvelopeState::Attack => {
                self.value += dt * self.params.attack_rate;
                if self.value >= 1.0 {
                    self.enter(EnvelopeState::Decay);
                }
            }
            EnvelopeState::Decay => {
                self.value -= dt * self.params.decay_rate;
                if self.value <= self.params.sustain_level {
                    self.enter(EnvelopeState::Sustain);
                }
            }
            EnvelopeState::Sustain => {
                self.value -= dt * self.params.sustain_decay_rate;
                if self.value <= 0.0 {
                    self.silence();
                }
            }
            EnvelopeState::Release => {
                self.value -= dt * self.params.release_rate;
                if self.value <= 0.0 {
                    self.silence();
                }
            }
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn state(&self) -> EnvelopeState {
        self.state
    }

    /// Seconds spent in the current state.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn is_idle(&self) -> bool {
        self.state == EnvelopeState::Idle
    }

    fn enter(&mut self, state: EnvelopeState) {
        self.state = state;
        self.elapsed = 0.0;
    }

    fn silence(&mut self) {
        self.value = 0.0;
        self.enter(EnvelopeState::Idle);
    }
}
