//! Text rendering of sweep tables for terminal output.

use std::fmt::Write;

use crate::sweep::{SweepRow, SweepTable};

/// QBER above which BB84 no longer yields a secure key.
pub const QBER_THRESHOLD: f64 = 0.11;

/// Shades from lowest to highest QBER.
const SHADES: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// QBER mapped to the darkest shade.
const SHADE_MAX: f64 = 0.5;

/// Width of a full bar in series output.
const BAR_WIDTH: usize = 40;

fn shade(qber: f64) -> char {
    if qber.is_nan() {
        return '?';
    }
    let level = (qber / SHADE_MAX).clamp(0.0, 1.0) * (SHADES.len() - 1) as f64;
    SHADES[level.round() as usize]
}

fn flag(qber: f64) -> &'static str {
    if qber >= QBER_THRESHOLD { "!" } else { " " }
}

fn cell(row: Option<&SweepRow>) -> String {
    match row {
        Some(r) if r.qber.is_nan() => format!("{}  NaN ", shade(r.qber)),
        Some(r) => format!("{}{:.3}{}", shade(r.qber), r.qber, flag(r.qber)),
        None => "   -   ".to_string(),
    }
}

/// Render the table as a QBER heatmap.
///
/// Rows are `q_eve` values, highest first; columns are `p_noise` values,
/// lowest first. Cells at or above [`QBER_THRESHOLD`] carry a `!`.
pub fn render_heatmap(table: &SweepTable) -> String {
    let mut out = String::new();
    if table.is_empty() {
        out.push_str("(empty sweep)\n");
        return out;
    }

    let p_values = table.p_noise_values();
    let mut q_values = table.q_eve_values();
    q_values.reverse();

    if let Some(model) = table.noise_model() {
        let _ = writeln!(out, "QBER heatmap ({model}), threshold {QBER_THRESHOLD}");
    }

    out.push_str("q_eve \\ p_noise");
    for p in &p_values {
        let _ = write!(out, " {p:>7.3}");
    }
    out.push('\n');

    for q in &q_values {
        let _ = write!(out, "{q:>15.3}");
        for p in &p_values {
            let _ = write!(out, " {}", cell(table.get(*p, *q)));
        }
        out.push('\n');
    }

    let _ = writeln!(
        out,
        "shade: '{}' = 0 .. '{}' >= {SHADE_MAX}, '!' >= {QBER_THRESHOLD}",
        SHADES[0],
        SHADES[SHADES.len() - 1]
    );
    out
}

fn render_series<'a>(
    title: String,
    axis: &str,
    rows: impl Iterator<Item = (f64, &'a SweepRow)>,
) -> String {
    let mut out = title;
    out.push('\n');
    let _ = writeln!(out, "{axis:>8} {:>7}  bar", "qber");
    for (x, row) in rows {
        if row.qber.is_nan() {
            let _ = writeln!(out, "{x:>8.3} {:>7}", "NaN");
            continue;
        }
        let len = ((row.qber / SHADE_MAX).clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
        let _ = writeln!(
            out,
            "{x:>8.3} {:>7.4}{} {}",
            row.qber,
            flag(row.qber),
            "#".repeat(len)
        );
    }
    out
}

/// QBER against `q_eve` at the grid `p_noise` nearest `p_noise`.
pub fn render_series_fixed_p(table: &SweepTable, p_noise: f64) -> String {
    match table.slice_at_p(p_noise) {
        Some((p, rows)) => render_series(
            format!("QBER vs q_eve at p_noise = {p}"),
            "q_eve",
            rows.into_iter().map(|r| (r.q_eve, r)),
        ),
        None => "(empty sweep)\n".to_string(),
    }
}

/// QBER against `p_noise` at the grid `q_eve` nearest `q_eve`.
pub fn render_series_fixed_q(table: &SweepTable, q_eve: f64) -> String {
    match table.slice_at_q(q_eve) {
        Some((q, rows)) => render_series(
            format!("QBER vs p_noise at q_eve = {q}"),
            "p_noise",
            rows.into_iter().map(|r| (r.p_noise, r)),
        ),
        None => "(empty sweep)\n".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bb84_core::NoiseModel;

    fn table() -> SweepTable {
        let mut rows = Vec::new();
        for (p, q, qber) in [
            (0.0, 0.0, 0.0),
            (0.0, 1.0, 0.25),
            (0.1, 0.0, 0.05),
            (0.1, 1.0, f64::NAN),
        ] {
            rows.push(SweepRow {
                n: 100,
                noise_model: NoiseModel::Depolarizing,
                seed: Some(1),
                p_noise: p,
                q_eve: q,
                qber,
                n_sifted: 50,
                n_errors: 0,
            });
        }
        SweepTable::from_rows(rows)
    }

    #[test]
    fn test_shade_bounds() {
        assert_eq!(shade(0.0), ' ');
        assert_eq!(shade(0.5), '@');
        assert_eq!(shade(2.0), '@');
        assert_eq!(shade(f64::NAN), '?');
    }

    #[test]
    fn test_heatmap_orders_rows_descending() {
        let out = render_heatmap(&table());
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].contains("depolarizing"));
        assert!(lines[1].contains("0.000") && lines[1].contains("0.100"));
        assert!(lines[2].trim_start().starts_with("1.000"));
        assert!(lines[2].contains("0.250!"));
        assert!(lines[2].contains("NaN"));
        assert!(lines[3].trim_start().starts_with("0.000"));
        assert!(!lines[3].contains('!'));
    }

    #[test]
    fn test_series_uses_nearest_grid_value() {
        let out = render_series_fixed_p(&table(), 0.02);
        assert!(out.starts_with("QBER vs q_eve at p_noise = 0\n"));
        assert!(out.contains("0.2500!"));

        let out = render_series_fixed_q(&table(), 0.9);
        assert!(out.starts_with("QBER vs p_noise at q_eve = 1\n"));
        assert!(out.contains("NaN"));
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(render_heatmap(&SweepTable::default()), "(empty sweep)\n");
        assert_eq!(render_series_fixed_q(&SweepTable::default(), 0.5), "(empty sweep)\n");
    }
}
