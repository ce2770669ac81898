//! Output formatting: tables for humans, JSON for tooling.

use nodal_core::plot::PlotData;

/// Print plot data as a fixed-width table.
pub fn print_table(plot: &PlotData, abscissa_label: &str) {
    print!("{abscissa_label:>14}");
    for series in &plot.series {
        print!("{:>14}", series.name);
    }
    println!();

    let width = 14 * (1 + plot.series.len());
    println!("{}", "-".repeat(width));

    for (k, &x) in plot.abscissa.iter().enumerate() {
        print!("{x:>14.6e}");
        for series in &plot.series {
            print!("{:>14.6}", series.values[k]);
        }
        println!();
    }
    println!();
}

/// Serialize plot data for the `--json` flag.
pub fn plot_to_json(plot: &PlotData, abscissa_label: &str) -> serde_json::Value {
    serde_json::json!({
        "abscissa": {
            "name": abscissa_label,
            "values": plot.abscissa,
        },
        "series": plot
            .series
            .iter()
            .map(|s| serde_json::json!({ "name": s.name, "values": s.values }))
            .collect::<Vec<_>>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let mut plot = PlotData::new(["V(n1)".to_string()]);
        plot.push_sample(0.0, &[1.0]);
        plot.push_sample(1.0, &[2.0]);

        let json = plot_to_json(&plot, "time");
        assert_eq!(json["abscissa"]["name"], "time");
        assert_eq!(json["abscissa"]["values"].as_array().unwrap().len(), 2);
        assert_eq!(json["series"][0]["name"], "V(n1)");
        assert_eq!(json["series"][0]["values"][1], 2.0);
    }
}
