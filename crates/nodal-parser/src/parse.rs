//! Line parsing: text to typed [`Command`] values.

use nodal_core::element::{DiodeModel, PulseParams, SinusoidParams};
use nodal_core::error::Error as CoreError;
use nodal_core::plot::OutputRequest;
use nodal_core::units::parse_value;

use crate::command::{AcSweepKind, AddPayload, AddSpec, AnalysisRequest, Command};
use crate::error::{Error, Result};

/// Parse one command line. Comments (`*`, `#`) and blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Command>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('*') || trimmed.starts_with('#') {
        return Ok(None);
    }

    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    let command = match tokens[0] {
        "add" => parse_add(&tokens[1..])?,
        "delete" => {
            let name = required(&tokens, 1, "delete <name>")?;
            Command::Delete { name: name.into() }
        }
        "connect" => {
            let a = required(&tokens, 1, "connect <a> <b>")?;
            let b = required(&tokens, 2, "connect <a> <b>")?;
            Command::Connect { a: a.into(), b: b.into() }
        }
        "label" => {
            let node = required(&tokens, 1, "label <node> <new>")?;
            let label = required(&tokens, 2, "label <node> <new>")?;
            Command::Label { node: node.into(), label: label.into() }
        }
        "list" => Command::List {
            kind: tokens.get(1).and_then(|t| t.chars().next()).map(|c| c.to_ascii_uppercase()),
        },
        ".nodes" => Command::Nodes,
        "rename" => {
            if tokens.get(1) != Some(&"node") {
                return Err(Error::Syntax(
                    "correct format: rename node <old_name> <new_name>".into(),
                ));
            }
            let old = required(&tokens, 2, "rename node <old> <new>")?;
            let new = required(&tokens, 3, "rename node <old> <new>")?;
            Command::RenameNode { old: old.into(), new: new.into() }
        }
        "print" => Command::Analysis(parse_print(&tokens[1..])?),
        "ac" => Command::Analysis(parse_ac(&tokens[1..])?),
        "phase" => Command::Analysis(parse_phase(&tokens[1..])?),
        other => return Err(Error::UnknownCommand(other.to_string())),
    };
    Ok(Some(command))
}

fn required<'a>(tokens: &[&'a str], index: usize, usage: &str) -> Result<&'a str> {
    tokens
        .get(index)
        .copied()
        .ok_or_else(|| Error::Syntax(format!("usage: {usage}")))
}

/// Parse a positive passive value, naming the quantity in the error.
fn parse_positive(token: &str, quantity: &str) -> Result<f64> {
    let value = parse_value(token)?;
    if value <= 0.0 {
        return Err(Error::Core(CoreError::InvalidValue(format!(
            "{quantity} cannot be zero or negative"
        ))));
    }
    Ok(value)
}

fn parse_add(tokens: &[&str]) -> Result<Command> {
    let name = required(tokens, 0, "add <name> ...")?;

    if name == "GND" {
        let node = required(tokens, 1, "add GND <node>")?;
        return Ok(Command::AssignGround { node: node.into() });
    }

    let type_letter = name.chars().next().unwrap();
    if !type_letter.is_ascii_uppercase() {
        return Err(Error::UnknownElementType(name.to_string()));
    }

    let pos = required(tokens, 1, "add <name> <n1> <n2> ...")?.to_string();
    let neg = required(tokens, 2, "add <name> <n1> <n2> ...")?.to_string();

    let payload = match type_letter {
        'D' => {
            let model = required(tokens, 3, "add D<name> <n+> <n-> <model>")?;
            AddPayload::Diode {
                model: DiodeModel::from_token(model)?,
            }
        }
        'G' | 'E' => {
            let ctrl_pos = required(tokens, 3, "add <name> <n+> <n-> <c+> <c-> <gain>")?.to_string();
            let ctrl_neg = required(tokens, 4, "add <name> <n+> <n-> <c+> <c-> <gain>")?.to_string();
            let gain = parse_value(required(tokens, 5, "add <name> <n+> <n-> <c+> <c-> <gain>")?)?;
            if type_letter == 'G' {
                AddPayload::Vccs { ctrl_pos, ctrl_neg, gain }
            } else {
                AddPayload::Vcvs { ctrl_pos, ctrl_neg, gain }
            }
        }
        'F' | 'H' => {
            let controller =
                required(tokens, 3, "add <name> <n+> <n-> <ctrl_elem> <gain>")?.to_string();
            let gain = parse_value(required(tokens, 4, "add <name> <n+> <n-> <ctrl_elem> <gain>")?)?;
            if type_letter == 'F' {
                AddPayload::Cccs { controller, gain }
            } else {
                AddPayload::Ccvs { controller, gain }
            }
        }
        'S' => {
            let offset = parse_value(required(tokens, 3, "add S<name> <n+> <n-> <Voff> <Vamp> <freq> [phase]")?)?;
            let amplitude = parse_value(required(tokens, 4, "add S<name> <n+> <n-> <Voff> <Vamp> <freq> [phase]")?)?;
            let frequency = parse_value(required(tokens, 5, "add S<name> <n+> <n-> <Voff> <Vamp> <freq> [phase]")?)?;
            let phase = match tokens.get(6) {
                Some(token) => parse_value(token)?,
                None => 0.0,
            };
            AddPayload::Sinusoid(SinusoidParams {
                offset,
                amplitude,
                frequency,
                phase,
            })
        }
        'V' if tokens.get(3).is_some_and(|t| t.starts_with("PULSE(")) => {
            AddPayload::Pulse(parse_pulse(&tokens[3..])?)
        }
        'R' => AddPayload::Resistor {
            value: parse_positive(required(tokens, 3, "add <name> <n1> <n2> <value>")?, "Resistance")?,
        },
        'C' => AddPayload::Capacitor {
            value: parse_positive(required(tokens, 3, "add <name> <n1> <n2> <value>")?, "Capacitance")?,
        },
        'L' => AddPayload::Inductor {
            value: parse_positive(required(tokens, 3, "add <name> <n1> <n2> <value>")?, "Inductance")?,
        },
        'V' => AddPayload::VoltageSource {
            value: parse_value(required(tokens, 3, "add <name> <n1> <n2> <value>")?)?,
        },
        'I' => AddPayload::CurrentSource {
            value: parse_value(required(tokens, 3, "add <name> <n1> <n2> <value>")?)?,
        },
        _ => return Err(Error::UnknownElementType(name.to_string())),
    };

    Ok(Command::Add(AddSpec {
        name: name.to_string(),
        pos,
        neg,
        payload,
    }))
}

/// Parse `PULSE(v1 v2 td tr tf pw per)` from the remaining tokens.
fn parse_pulse(tokens: &[&str]) -> Result<PulseParams> {
    let joined = tokens.join(" ");
    let inner = joined
        .strip_prefix("PULSE(")
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| Error::Syntax("expected PULSE(v1 v2 td tr tf pw per)".into()))?;

    let values: Vec<f64> = inner
        .split_whitespace()
        .map(parse_value)
        .collect::<nodal_core::Result<_>>()?;
    if values.len() != 7 {
        return Err(Error::Syntax(format!(
            "PULSE takes 7 parameters, got {}",
            values.len()
        )));
    }

    Ok(PulseParams {
        v1: values[0],
        v2: values[1],
        delay: values[2],
        rise: values[3],
        fall: values[4],
        width: values[5],
        period: values[6],
    })
}

/// Parse a `V(x)` or `I(x)` output variable.
fn parse_output(token: &str) -> Result<OutputRequest> {
    let inner = |prefix: &str| {
        token
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_suffix(')'))
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    };
    if let Some(node) = inner("V(") {
        Ok(OutputRequest::Voltage(node))
    } else if let Some(element) = inner("I(") {
        Ok(OutputRequest::Current(element))
    } else {
        Err(Error::Syntax(format!("invalid variable format: {token}")))
    }
}

fn parse_outputs(tokens: &[&str]) -> Result<Vec<OutputRequest>> {
    if tokens.is_empty() {
        return Err(Error::Syntax(
            "no output variables specified for print command".into(),
        ));
    }
    tokens.iter().map(|t| parse_output(t)).collect()
}

fn parse_print(tokens: &[&str]) -> Result<AnalysisRequest> {
    match required(tokens, 0, "print {TRAN|DC} ...")? {
        "TRAN" => {
            let usage = "print TRAN <tstep> <tstop> <tmax> <var1> ...";
            let tstep = parse_value(required(tokens, 1, usage)?)?;
            let tstop = parse_value(required(tokens, 2, usage)?)?;
            let tmax = parse_value(required(tokens, 3, usage)?)?;
            if tstep <= 0.0 || tstop <= 0.0 || tmax <= 0.0 || tstep > tstop {
                return Err(Error::Syntax(
                    "invalid time parameters for TRAN analysis".into(),
                ));
            }
            Ok(AnalysisRequest::Transient {
                tstep,
                tstop,
                tmax,
                outputs: parse_outputs(&tokens[4..])?,
            })
        }
        "DC" => {
            let usage = "print DC <SourceName> <Start> <Stop> <Increment> <var1> ...";
            let source = required(tokens, 1, usage)?.to_string();
            let start = parse_value(required(tokens, 2, usage)?)?;
            let stop = parse_value(required(tokens, 3, usage)?)?;
            let step = parse_value(required(tokens, 4, usage)?)?;
            if step <= 0.0 {
                return Err(Error::Syntax(
                    "increment for DC sweep must be positive".into(),
                ));
            }
            Ok(AnalysisRequest::DcSweep {
                source,
                start,
                stop,
                step,
                outputs: parse_outputs(&tokens[5..])?,
            })
        }
        other => Err(Error::Syntax(format!(
            "analysis type '{other}' not supported"
        ))),
    }
}

fn parse_ac(tokens: &[&str]) -> Result<AnalysisRequest> {
    let usage = "ac {lin|dec|oct} <w_start> <w_stop> <N>";
    let kind = match required(tokens, 0, usage)?.to_ascii_lowercase().as_str() {
        "lin" => AcSweepKind::Lin,
        "dec" => AcSweepKind::Dec,
        "oct" => AcSweepKind::Oct,
        other => return Err(Error::Syntax(format!("unknown sweep kind: {other}"))),
    };
    let omega_start = parse_value(required(tokens, 1, usage)?)?;
    let omega_stop = parse_value(required(tokens, 2, usage)?)?;
    let points = parse_points(required(tokens, 3, usage)?)?;
    if omega_start <= 0.0 || omega_stop <= 0.0 {
        return Err(Error::Syntax("sweep frequencies must be positive".into()));
    }
    Ok(AnalysisRequest::Ac {
        kind,
        omega_start,
        omega_stop,
        points,
    })
}

fn parse_phase(tokens: &[&str]) -> Result<AnalysisRequest> {
    let usage = "phase <w0> <phi_start> <phi_stop> <N>";
    let omega = parse_value(required(tokens, 0, usage)?)?;
    let phi_start = parse_value(required(tokens, 1, usage)?)?;
    let phi_stop = parse_value(required(tokens, 2, usage)?)?;
    let points = parse_points(required(tokens, 3, usage)?)?;
    Ok(AnalysisRequest::Phase {
        omega,
        phi_start,
        phi_stop,
        points,
    })
}

fn parse_points(token: &str) -> Result<usize> {
    let points: usize = token
        .parse()
        .map_err(|_| Error::Syntax(format!("invalid point count: {token}")))?;
    if points == 0 {
        return Err(Error::Syntax("point count must be at least 1".into()));
    }
    Ok(points)
}
