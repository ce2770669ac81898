//! Applying parsed commands to a circuit.
//!
//! Structural commands mutate the circuit through its registry; analysis
//! commands are handed back untouched for the caller (CLI, tests, an
//! embedder) to run against the engines.

use nodal_core::circuit::Circuit;
use nodal_core::element::Element;
use nodal_core::error::Error as CoreError;

use crate::command::{AddPayload, AddSpec, AnalysisRequest, Command};
use crate::error::{Error, Result};

/// What applying one command produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Comment or blank line.
    Ignored,
    /// A structural mutation was applied.
    Applied,
    /// Display output for the user (from `list` / `.nodes`).
    Message(String),
    /// An analysis for the caller to run.
    Analysis(AnalysisRequest),
}

/// Parse and apply one line: the convenience entry point for batch runs.
pub fn execute(circuit: &mut Circuit, line: &str) -> Result<Outcome> {
    match crate::parse::parse_line(line)? {
        None => Ok(Outcome::Ignored),
        Some(command) => apply(circuit, command),
    }
}

/// Apply one parsed command to the circuit.
pub fn apply(circuit: &mut Circuit, command: Command) -> Result<Outcome> {
    match command {
        Command::Add(spec) => {
            add_element(circuit, spec)?;
            Ok(Outcome::Applied)
        }
        Command::AssignGround { node } => {
            circuit.registry_mut().connect(&node, "0")?;
            circuit.canonicalize_nodes();
            Ok(Outcome::Applied)
        }
        Command::Delete { name } => {
            if circuit.remove_element_by_name(&name) {
                Ok(Outcome::Applied)
            } else {
                Err(Error::Core(CoreError::UnknownElement(name)))
            }
        }
        Command::Connect { a, b } => {
            circuit.registry_mut().connect(&a, &b)?;
            circuit.canonicalize_nodes();
            Ok(Outcome::Applied)
        }
        Command::Label { node, label } => {
            let id = circuit.registry_mut().resolve(&node)?;
            circuit.registry_mut().label(&label, Some(id))?;
            circuit.canonicalize_nodes();
            Ok(Outcome::Applied)
        }
        Command::List { kind } => {
            let mut lines = Vec::new();
            for element in circuit.elements() {
                if kind.is_none_or(|letter| element.kind_letter() == letter) {
                    lines.push(element.to_string());
                }
            }
            if lines.is_empty() {
                lines.push("(no elements)".to_string());
            }
            Ok(Outcome::Message(lines.join("\n")))
        }
        Command::Nodes => {
            let mut labels: Vec<String> = circuit
                .registry()
                .known_labels()
                .map(|(label, id)| format!("    {label} (id {id})"))
                .collect();
            labels.sort();
            let mut text = String::from("Available nodes:\n");
            text.push_str(&labels.join("\n"));
            Ok(Outcome::Message(text))
        }
        Command::RenameNode { old, new } => {
            let id = circuit
                .registry()
                .lookup(&old)
                .ok_or_else(|| Error::Syntax(format!("node '{old}' does not exist")))?;
            if circuit.registry().lookup(&new).is_some() {
                return Err(Error::Syntax(format!("node name '{new}' already exists")));
            }
            circuit.registry_mut().label(&new, Some(id))?;
            circuit.canonicalize_nodes();
            Ok(Outcome::Applied)
        }
        Command::Analysis(request) => Ok(Outcome::Analysis(request)),
    }
}

fn add_element(circuit: &mut Circuit, spec: AddSpec) -> Result<()> {
    // Duplicate check before node resolution so a rejected command leaves no
    // trace in the registry
    if circuit.find_element(&spec.name).is_some() {
        return Err(Error::Core(CoreError::DuplicateName(spec.name)));
    }

    let pos = circuit.registry_mut().resolve(&spec.pos)?;
    let neg = circuit.registry_mut().resolve(&spec.neg)?;
    let name = spec.name;

    let element = match spec.payload {
        AddPayload::Resistor { value } => Element::resistor(name, pos, neg, value),
        AddPayload::Capacitor { value } => Element::capacitor(name, pos, neg, value),
        AddPayload::Inductor { value } => Element::inductor(name, pos, neg, value),
        AddPayload::VoltageSource { value } => Element::voltage_source(name, pos, neg, value),
        AddPayload::CurrentSource { value } => Element::current_source(name, pos, neg, value),
        AddPayload::Diode { model } => Element::diode(name, pos, neg, model),
        AddPayload::Vccs {
            ctrl_pos,
            ctrl_neg,
            gain,
        } => {
            let cp = circuit.registry_mut().resolve(&ctrl_pos)?;
            let cn = circuit.registry_mut().resolve(&ctrl_neg)?;
            Element::vccs(name, pos, neg, cp, cn, gain)
        }
        AddPayload::Vcvs {
            ctrl_pos,
            ctrl_neg,
            gain,
        } => {
            let cp = circuit.registry_mut().resolve(&ctrl_pos)?;
            let cn = circuit.registry_mut().resolve(&ctrl_neg)?;
            Element::vcvs(name, pos, neg, cp, cn, gain)
        }
        AddPayload::Cccs { controller, gain } => Element::cccs(name, pos, neg, controller, gain),
        AddPayload::Ccvs { controller, gain } => Element::ccvs(name, pos, neg, controller, gain),
        AddPayload::Sinusoid(params) => Element::sinusoid(name, pos, neg, params),
        AddPayload::Pulse(params) => Element::pulse(name, pos, neg, params),
    };

    circuit.add_element(element)?;
    Ok(())
}
