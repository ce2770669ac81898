//! Typed commands produced by the parser.

use nodal_core::element::{DiodeModel, PulseParams, SinusoidParams};
use nodal_core::plot::OutputRequest;

/// AC sweep grid spacing as written in the `ac` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum AcSweepKind {
    Lin,
    Dec,
    Oct,
}

/// An `add` command: element name, endpoint node tokens, and the
/// kind-specific payload.
#[derive(Debug, Clone, PartialEq)]
pub struct AddSpec {
    pub name: String,
    pub pos: String,
    pub neg: String,
    pub payload: AddPayload,
}

#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum AddPayload {
    Resistor { value: f64 },
    Capacitor { value: f64 },
    Inductor { value: f64 },
    VoltageSource { value: f64 },
    CurrentSource { value: f64 },
    Diode { model: DiodeModel },
    Vccs { ctrl_pos: String, ctrl_neg: String, gain: f64 },
    Vcvs { ctrl_pos: String, ctrl_neg: String, gain: f64 },
    Cccs { controller: String, gain: f64 },
    Ccvs { controller: String, gain: f64 },
    Sinusoid(SinusoidParams),
    Pulse(PulseParams),
}

/// An analysis to run, handed back to the caller.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum AnalysisRequest {
    /// `print TRAN <tstep> <tstop> <tmax> vars...`
    Transient {
        tstep: f64,
        tstop: f64,
        tmax: f64,
        outputs: Vec<OutputRequest>,
    },
    /// `print DC <src> <start> <stop> <inc> vars...`
    DcSweep {
        source: String,
        start: f64,
        stop: f64,
        step: f64,
        outputs: Vec<OutputRequest>,
    },
    /// `ac {lin|dec|oct} <omega_start> <omega_stop> <N>`
    Ac {
        kind: AcSweepKind,
        omega_start: f64,
        omega_stop: f64,
        points: usize,
    },
    /// `phase <omega0> <phi_start> <phi_stop> <N>`
    Phase {
        omega: f64,
        phi_start: f64,
        phi_stop: f64,
        points: usize,
    },
}

/// One parsed command line.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Command {
    Add(AddSpec),
    /// `add GND <node>`: alias a node to ground.
    AssignGround { node: String },
    Delete { name: String },
    Connect { a: String, b: String },
    Label { node: String, label: String },
    /// `list [kind]`: display elements, optionally filtered by kind letter.
    List { kind: Option<char> },
    /// `.nodes`: display known node labels.
    Nodes,
    /// `rename node <old> <new>`.
    RenameNode { old: String, new: String },
    Analysis(AnalysisRequest),
}
