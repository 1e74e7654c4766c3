//! Search-progress visualization.
//!
//! [`OptimizationHistory`] turns a study's chronological trial scores into
//! the running best and renders it in two synchronized views: the maximized
//! score itself and its negation, framed as the corresponding minimized
//! error measure. Rendering is pure presentation; it reads the recorded
//! trials and has no effect on search behavior.

use core::fmt::Write as _;
use std::path::Path;

use crate::sampler::CompletedTrial;

/// Maximum number of rows in the text chart before downsampling.
const TEXT_ROWS: usize = 20;
/// Width of the text chart bars, in characters.
const BAR_WIDTH: usize = 40;

/// The chronological score history of one optimization run.
#[derive(Clone, Debug)]
pub struct OptimizationHistory {
    scores: Vec<f64>,
}

impl OptimizationHistory {
    /// Builds the history from completed trials in chronological order.
    #[must_use]
    pub fn from_trials(trials: &[CompletedTrial]) -> Self {
        Self {
            scores: trials.iter().map(|t| t.value).collect(),
        }
    }

    /// Builds the history from raw per-trial scores.
    #[must_use]
    pub fn from_scores(scores: Vec<f64>) -> Self {
        Self { scores }
    }

    /// Returns the per-trial scores.
    #[must_use]
    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    /// Returns the number of recorded trials.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Returns `true` when no trials were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Running maximum of the score as a function of trial index.
    #[must_use]
    pub fn cumulative_best(&self) -> Vec<f64> {
        let mut best = f64::NEG_INFINITY;
        self.scores
            .iter()
            .map(|&score| {
                best = best.max(score);
                best
            })
            .collect()
    }

    /// Negated running maximum: the minimized error view of the same search.
    #[must_use]
    pub fn cumulative_error(&self) -> Vec<f64> {
        self.cumulative_best().into_iter().map(|v| -v).collect()
    }

    /// Renders the two-panel chart as plain text.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        render_text_panel(&mut out, "Optimization history (best R2)", &self.cumulative_best());
        out.push('\n');
        render_text_panel(
            &mut out,
            "Optimization history (best error, negated R2)",
            &self.cumulative_error(),
        );
        out
    }

    /// Renders the two-panel chart as a self-contained HTML document with
    /// interactive Plotly.js panels.
    ///
    /// The output can be opened in any browser; an internet connection is
    /// needed on first load to fetch Plotly.js from a CDN.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut html = String::with_capacity(4096);

        let _ = write!(
            html,
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Optimization History</title>
<script src="https://cdn.plot.ly/plotly-2.35.2.min.js"></script>
<style>
  * {{ margin: 0; padding: 0; box-sizing: border-box; }}
  body {{ font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
         background: #f5f6fa; color: #2c3e50; padding: 24px; }}
  h1 {{ text-align: center; margin-bottom: 8px; font-size: 1.8em; }}
  .subtitle {{ text-align: center; color: #7f8c8d; margin-bottom: 24px; }}
  .row {{ display: flex; gap: 24px; flex-wrap: wrap; }}
  .chart {{ background: #fff; border-radius: 8px; box-shadow: 0 2px 8px rgba(0,0,0,0.08);
            padding: 16px; flex: 1 1 480px; }}
  .chart-title {{ font-size: 1.1em; font-weight: 600; margin-bottom: 8px; }}
</style>
</head>
<body>
<h1>Optimization History</h1>
<p class="subtitle">Maximize &middot; {n} trials</p>
<div class="row">
<div class="chart"><div class="chart-title">Best R&sup2;</div><div id="score"></div></div>
<div class="chart"><div class="chart-title">Best error (negated R&sup2;)</div><div id="error"></div></div>
</div>
"#,
            n = self.scores.len(),
        );

        write_history_trace(&mut html, "score", "Best R2", &self.cumulative_best());
        write_history_trace(&mut html, "error", "Best error", &self.cumulative_error());

        html.push_str("</body>\n</html>\n");
        html
    }

    /// Writes the HTML chart to a file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created or written.
    pub fn export_html(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        std::fs::write(path, self.to_html())
    }
}

/// Appends one Plotly line chart of `values` against trial index.
fn write_history_trace(html: &mut String, div_id: &str, label: &str, values: &[f64]) {
    let x_values = join_values((0..values.len()).map(|i| i.to_string()));
    let y_values = join_values(values.iter().map(|v| format!("{v:.6}")));

    let _ = write!(
        html,
        r#"<script>
Plotly.newPlot("{div_id}", [{{
  x: [{x_values}],
  y: [{y_values}],
  mode: "lines",
  name: "{label}",
  line: {{ shape: "hv" }}
}}], {{
  xaxis: {{ title: "Trial" }},
  yaxis: {{ title: "{label}" }},
  margin: {{ t: 16 }}
}}, {{ responsive: true }});
</script>
"#,
    );
}

fn join_values(values: impl Iterator<Item = String>) -> String {
    values.collect::<Vec<_>>().join(",")
}

/// Appends one text panel: a header plus a bar per (downsampled) trial.
fn render_text_panel(out: &mut String, title: &str, values: &[f64]) {
    let _ = writeln!(out, "{title}");
    if values.is_empty() {
        let _ = writeln!(out, "  (no trials)");
        return;
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    for index in sample_indices(values.len()) {
        let value = values[index];
        let filled = if span > 0.0 {
            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let f = ((value - min) / span * BAR_WIDTH as f64).round() as usize;
            f.min(BAR_WIDTH)
        } else {
            BAR_WIDTH
        };
        let bar = format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled));
        let _ = writeln!(out, "  {index:>5}  {value:>12.5}  {bar}");
    }
}

/// Evenly spaced trial indices, at most [`TEXT_ROWS`], always ending on the
/// final trial.
fn sample_indices(len: usize) -> Vec<usize> {
    if len <= TEXT_ROWS {
        return (0..len).collect();
    }

    let mut indices: Vec<usize> = (0..TEXT_ROWS - 1)
        .map(|i| i * (len - 1) / (TEXT_ROWS - 1))
        .collect();
    indices.push(len - 1);
    indices.dedup();
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cumulative_best_is_running_maximum() {
        let history = OptimizationHistory::from_scores(vec![0.1, 0.5, 0.3, 0.7, 0.2]);
        assert_eq!(history.cumulative_best(), vec![0.1, 0.5, 0.5, 0.7, 0.7]);
    }

    #[test]
    fn test_cumulative_best_is_monotone() {
        let history =
            OptimizationHistory::from_scores(vec![-0.4, 0.2, -1.0, 0.9, 0.9, 0.1, 1.2]);
        let best = history.cumulative_best();
        for pair in best.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
    }

    #[test]
    fn test_cumulative_error_is_negation() {
        let history = OptimizationHistory::from_scores(vec![0.1, 0.5, 0.3]);
        let best = history.cumulative_best();
        let error = history.cumulative_error();
        for (b, e) in best.iter().zip(&error) {
            assert!((b + e).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_text_chart_has_two_panels() {
        let history = OptimizationHistory::from_scores(vec![0.1, 0.2, 0.3]);
        let text = history.to_text();
        assert!(text.contains("best R2"));
        assert!(text.contains("negated R2"));
        assert!(text.contains('█'));
    }

    #[test]
    fn test_text_chart_downsamples_long_histories() {
        let history = OptimizationHistory::from_scores((0..500).map(f64::from).collect());
        let text = history.to_text();
        // Two panels of at most TEXT_ROWS bars plus headers.
        let bar_lines = text.lines().filter(|l| l.contains('█') || l.contains('░')).count();
        assert!(bar_lines <= 2 * TEXT_ROWS);
        // The final trial always shows.
        assert!(text.contains("  499  "));
    }

    #[test]
    fn test_html_contains_both_panels() {
        let history = OptimizationHistory::from_scores(vec![0.25, 0.5]);
        let html = history.to_html();
        assert!(html.contains("<!DOCTYPE html>"));
        assert!(html.contains("plotly"));
        assert!(html.contains("\"score\""));
        assert!(html.contains("\"error\""));
        assert!(html.contains("0.500000"));
        assert!(html.contains("-0.500000"));
    }

    #[test]
    fn test_empty_history() {
        let history = OptimizationHistory::from_scores(vec![]);
        assert!(history.is_empty());
        assert!(history.cumulative_best().is_empty());
        assert!(history.to_text().contains("no trials"));
    }
}
