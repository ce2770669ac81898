//! Circuit elements as a tagged-variant sum type.
//!
//! All element algebra lives in one enum rather than a trait-object
//! hierarchy: the stamp dispatch is a single match, and controlled sources
//! carry the name of their controller to be resolved at layout time.

use std::f64::consts::TAU;
use std::fmt;

use crate::error::{Error, Result};

/// Diode model identifiers. The set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiodeModel {
    /// Standard junction diode.
    Junction,
    /// Zener diode: conducts in reverse beyond the breakdown voltage.
    Zener,
}

impl DiodeModel {
    pub fn from_token(token: &str) -> Result<Self> {
        match token {
            "D" => Ok(Self::Junction),
            "Z" => Ok(Self::Zener),
            other => Err(Error::UnknownModel(other.to_string())),
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            Self::Junction => "D",
            Self::Zener => "Z",
        }
    }
}

/// Parameters of a sinusoidal source: Voff + Vamp * sin(2*pi*f*t + phase).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SinusoidParams {
    pub offset: f64,
    pub amplitude: f64,
    pub frequency: f64,
    /// Phase in radians.
    pub phase: f64,
}

impl SinusoidParams {
    pub fn value_at(&self, t: f64) -> f64 {
        self.offset + self.amplitude * (TAU * self.frequency * t + self.phase).sin()
    }
}

/// Parameters of a pulse source: PULSE(v1 v2 td tr tf pw per).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseParams {
    pub v1: f64,
    pub v2: f64,
    pub delay: f64,
    pub rise: f64,
    pub fall: f64,
    pub width: f64,
    pub period: f64,
}

impl PulseParams {
    /// Evaluate the waveform: v1 until the delay, then per period a linear
    /// rise to v2, a flat top, a linear fall back to v1, and v1 until the
    /// next period.
    pub fn value_at(&self, t: f64) -> f64 {
        if t < self.delay {
            return self.v1;
        }
        let mut tm = t - self.delay;
        if self.period > 0.0 {
            tm %= self.period;
        }

        if tm < self.rise {
            self.v1 + (self.v2 - self.v1) * tm / self.rise
        } else if tm < self.rise + self.width {
            self.v2
        } else if tm < self.rise + self.width + self.fall {
            self.v2 + (self.v1 - self.v2) * (tm - self.rise - self.width) / self.fall
        } else {
            self.v1
        }
    }
}

/// The element kind tag, carrying kind-specific parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Resistor,
    Capacitor,
    Inductor,
    VoltageSource,
    CurrentSource,
    Diode { model: DiodeModel },
    /// Voltage-controlled current source: I = gm * V(ctrl_pos, ctrl_neg).
    Vccs { ctrl_pos: u32, ctrl_neg: u32 },
    /// Voltage-controlled voltage source: V = gain * V(ctrl_pos, ctrl_neg).
    Vcvs { ctrl_pos: u32, ctrl_neg: u32 },
    /// Current-controlled current source: I = gain * I(controller).
    Cccs { controller: String },
    /// Current-controlled voltage source: V = gain * I(controller).
    Ccvs { controller: String },
    Sinusoid(SinusoidParams),
    Pulse(PulseParams),
}

/// A single circuit element.
#[derive(Debug, Clone)]
pub struct Element {
    /// Unique name within a circuit.
    pub name: String,
    pub node_pos: u32,
    pub node_neg: u32,
    /// Primary numeric parameter: resistance, capacitance, inductance, the
    /// source value, or the controlled-source gain. For time-varying sources
    /// this is the cached instantaneous value refreshed by
    /// [`crate::Circuit::update_time_dependent_sources`].
    pub value: f64,
    pub kind: ElementKind,
    /// Offset of this element's branch-current unknown among the extra
    /// variables, assigned at layout time.
    pub extra_index: Option<usize>,
}

impl Element {
    pub fn new(
        name: impl Into<String>,
        node_pos: u32,
        node_neg: u32,
        value: f64,
        kind: ElementKind,
    ) -> Self {
        Self {
            name: name.into(),
            node_pos,
            node_neg,
            value,
            kind,
            extra_index: None,
        }
    }

    pub fn resistor(name: impl Into<String>, n1: u32, n2: u32, resistance: f64) -> Self {
        Self::new(name, n1, n2, resistance, ElementKind::Resistor)
    }

    pub fn capacitor(name: impl Into<String>, n1: u32, n2: u32, capacitance: f64) -> Self {
        Self::new(name, n1, n2, capacitance, ElementKind::Capacitor)
    }

    pub fn inductor(name: impl Into<String>, n1: u32, n2: u32, inductance: f64) -> Self {
        Self::new(name, n1, n2, inductance, ElementKind::Inductor)
    }

    pub fn voltage_source(name: impl Into<String>, n1: u32, n2: u32, voltage: f64) -> Self {
        Self::new(name, n1, n2, voltage, ElementKind::VoltageSource)
    }

    pub fn current_source(name: impl Into<String>, n1: u32, n2: u32, current: f64) -> Self {
        Self::new(name, n1, n2, current, ElementKind::CurrentSource)
    }

    pub fn diode(name: impl Into<String>, n1: u32, n2: u32, model: DiodeModel) -> Self {
        Self::new(name, n1, n2, 0.0, ElementKind::Diode { model })
    }

    pub fn vccs(
        name: impl Into<String>,
        n1: u32,
        n2: u32,
        ctrl_pos: u32,
        ctrl_neg: u32,
        gm: f64,
    ) -> Self {
        Self::new(name, n1, n2, gm, ElementKind::Vccs { ctrl_pos, ctrl_neg })
    }

    pub fn vcvs(
        name: impl Into<String>,
        n1: u32,
        n2: u32,
        ctrl_pos: u32,
        ctrl_neg: u32,
        gain: f64,
    ) -> Self {
        Self::new(name, n1, n2, gain, ElementKind::Vcvs { ctrl_pos, ctrl_neg })
    }

    pub fn cccs(
        name: impl Into<String>,
        n1: u32,
        n2: u32,
        controller: impl Into<String>,
        gain: f64,
    ) -> Self {
        Self::new(
            name,
            n1,
            n2,
            gain,
            ElementKind::Cccs {
                controller: controller.into(),
            },
        )
    }

    pub fn ccvs(
        name: impl Into<String>,
        n1: u32,
        n2: u32,
        controller: impl Into<String>,
        gain: f64,
    ) -> Self {
        Self::new(
            name,
            n1,
            n2,
            gain,
            ElementKind::Ccvs {
                controller: controller.into(),
            },
        )
    }

    pub fn sinusoid(name: impl Into<String>, n1: u32, n2: u32, params: SinusoidParams) -> Self {
        Self::new(name, n1, n2, params.value_at(0.0), ElementKind::Sinusoid(params))
    }

    pub fn pulse(name: impl Into<String>, n1: u32, n2: u32, params: PulseParams) -> Self {
        Self::new(name, n1, n2, params.value_at(0.0), ElementKind::Pulse(params))
    }

    /// Whether this element adds a branch-current unknown to the MNA system.
    pub fn introduces_extra_variable(&self) -> bool {
        matches!(
            self.kind,
            ElementKind::Inductor
                | ElementKind::VoltageSource
                | ElementKind::Vcvs { .. }
                | ElementKind::Ccvs { .. }
                | ElementKind::Sinusoid(_)
                | ElementKind::Pulse(_)
        )
    }

    /// Whether this element requires Newton iteration.
    pub fn is_nonlinear(&self) -> bool {
        matches!(self.kind, ElementKind::Diode { .. })
    }

    /// The kind letter used for display and `list` filtering.
    pub fn kind_letter(&self) -> char {
        match self.kind {
            ElementKind::Resistor => 'R',
            ElementKind::Capacitor => 'C',
            ElementKind::Inductor => 'L',
            ElementKind::VoltageSource | ElementKind::Pulse(_) => 'V',
            ElementKind::CurrentSource => 'I',
            ElementKind::Diode { .. } => 'D',
            ElementKind::Vccs { .. } => 'G',
            ElementKind::Vcvs { .. } => 'E',
            ElementKind::Cccs { .. } => 'F',
            ElementKind::Ccvs { .. } => 'H',
            ElementKind::Sinusoid(_) => 'S',
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes = format!("nodes {} - {}", self.node_pos, self.node_neg);
        match &self.kind {
            ElementKind::Resistor => write!(f, "Resistor {}: {} Ohm, {nodes}", self.name, self.value),
            ElementKind::Capacitor => write!(f, "Capacitor {}: {} F, {nodes}", self.name, self.value),
            ElementKind::Inductor => write!(f, "Inductor {}: {} H, {nodes}", self.name, self.value),
            ElementKind::VoltageSource => {
                write!(f, "Voltage source {}: {} V, {nodes}", self.name, self.value)
            }
            ElementKind::CurrentSource => {
                write!(f, "Current source {}: {} A, {nodes}", self.name, self.value)
            }
            ElementKind::Diode { model } => {
                write!(f, "Diode {}: model {}, {nodes}", self.name, model.token())
            }
            ElementKind::Vccs { ctrl_pos, ctrl_neg } => write!(
                f,
                "VCCS {}: gm {} S sensing {ctrl_pos} - {ctrl_neg}, {nodes}",
                self.name, self.value
            ),
            ElementKind::Vcvs { ctrl_pos, ctrl_neg } => write!(
                f,
                "VCVS {}: gain {} sensing {ctrl_pos} - {ctrl_neg}, {nodes}",
                self.name, self.value
            ),
            ElementKind::Cccs { controller } => write!(
                f,
                "CCCS {}: gain {} controlled by {controller}, {nodes}",
                self.name, self.value
            ),
            ElementKind::Ccvs { controller } => write!(
                f,
                "CCVS {}: {} Ohm controlled by {controller}, {nodes}",
                self.name, self.value
            ),
            ElementKind::Sinusoid(p) => write!(
                f,
                "Sinusoidal source {}: {} + {} sin(2*pi*{} t + {}), {nodes}",
                self.name, p.offset, p.amplitude, p.frequency, p.phase
            ),
            ElementKind::Pulse(p) => write!(
                f,
                "Pulse source {}: {} -> {} V, period {} s, {nodes}",
                self.name, p.v1, p.v2, p.period
            ),
        }
    }
}
