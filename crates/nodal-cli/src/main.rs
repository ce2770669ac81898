//! Batch front end: run a file of netlist commands and print analysis
//! results as tables or JSON.

mod output;

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use nodal_core::Circuit;
use nodal_core::plot::{OutputRequest, PlotData};
use nodal_parser::{AcSweepKind, AnalysisRequest, Outcome};
use nodal_solver::{
    AcSweepParams, DcSweepParams, PhaseSweepParams, SweepKind, TransientParams, run_ac_sweep,
    run_dc_sweep, run_phase_sweep, run_transient,
};

use crate::output::{plot_to_json, print_table};

/// Nodal: an analog circuit simulator in the SPICE tradition.
#[derive(Debug, Parser)]
#[command(name = "nodal", version, about)]
struct Args {
    /// Netlist command file; stdin when omitted.
    netlist: Option<PathBuf>,

    /// Emit analysis results as JSON instead of tables.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let input = match &args.netlist {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("cannot open file: {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("cannot read stdin")?;
            buffer
        }
    };

    let mut circuit = Circuit::new();
    for (index, line) in input.lines().enumerate() {
        match nodal_parser::execute(&mut circuit, line) {
            Ok(Outcome::Ignored | Outcome::Applied) => {}
            Ok(Outcome::Message(text)) => println!("{text}"),
            Ok(Outcome::Analysis(request)) => {
                if let Err(e) = run_analysis(&mut circuit, request, args.json) {
                    eprintln!("Error (line {}): {e}", index + 1);
                }
            }
            // Per-command errors are local: report and continue
            Err(e) => eprintln!("Error (line {}): {e}", index + 1),
        }
    }

    Ok(())
}

fn run_analysis(circuit: &mut Circuit, request: AnalysisRequest, as_json: bool) -> Result<()> {
    let (plot, abscissa_label) = match request {
        AnalysisRequest::Transient {
            tstep,
            tstop,
            tmax,
            outputs,
        } => {
            let params = TransientParams::new(tstep, tstop, tmax);
            (run_transient(circuit, &params, &outputs)?, "time (s)")
        }
        AnalysisRequest::DcSweep {
            source,
            start,
            stop,
            step,
            outputs,
        } => {
            let params = DcSweepParams {
                source,
                start,
                stop,
                step,
            };
            (run_dc_sweep(circuit, &params, &outputs)?, "sweep value")
        }
        AnalysisRequest::Ac {
            kind,
            omega_start,
            omega_stop,
            points,
        } => {
            let kind = match kind {
                AcSweepKind::Lin => SweepKind::Linear,
                AcSweepKind::Dec => SweepKind::Decade,
                AcSweepKind::Oct => SweepKind::Octave,
                _ => unreachable!("non_exhaustive AcSweepKind variant"),
            };
            let params = AcSweepParams::new(kind, omega_start, omega_stop, points);
            let outputs = default_voltage_outputs(circuit);
            (run_ac_sweep(circuit, &params, &outputs)?, "omega (rad/s)")
        }
        AnalysisRequest::Phase {
            omega,
            phi_start,
            phi_stop,
            points,
        } => {
            let params = PhaseSweepParams {
                omega,
                phi_start,
                phi_stop,
                points,
                source: None,
            };
            let outputs = default_voltage_outputs(circuit);
            (run_phase_sweep(circuit, &params, &outputs)?, "phase (rad)")
        }
        _ => unreachable!("non_exhaustive AnalysisRequest variant"),
    };

    emit(&plot, abscissa_label, as_json);
    Ok(())
}

/// The `ac`/`phase` commands carry no output list: report every labeled
/// non-ground node once.
fn default_voltage_outputs(circuit: &Circuit) -> Vec<OutputRequest> {
    let mut seen = Vec::new();
    let mut outputs = Vec::new();
    for (label, id) in circuit.registry().known_labels() {
        if id == 0 || seen.contains(&id) {
            continue;
        }
        seen.push(id);
        outputs.push(OutputRequest::Voltage(label.to_string()));
    }
    outputs
}

fn emit(plot: &PlotData, abscissa_label: &str, as_json: bool) {
    if as_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&plot_to_json(plot, abscissa_label))
                .expect("plot serialization cannot fail")
        );
    } else {
        print_table(plot, abscissa_label);
    }
}
