//! HTML rendering for the single prediction page

use crate::feature_adapter::ManualInput;
use crate::models::density::DensityPlot;
use crate::types::feature_record::{FeatureRecord, WeatherCondition};
use crate::types::prediction::ManualPrediction;
use crate::types::table::Table;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Deserialize;
use std::fmt::Write;

/// Rows shown in a rendered table before truncating the preview
pub const PREVIEW_ROWS: usize = 500;

/// Which input method the page shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Manual,
    Upload,
}

const STYLE: &str = r#"
body { font-family: sans-serif; margin: 0; color: #262730; }
.layout { display: flex; min-height: 100vh; }
aside { width: 300px; padding: 1.5rem; background: #f0f2f6; }
main { flex: 1; max-width: 760px; margin: 0 auto; padding: 2rem; }
label { display: block; margin-top: .8rem; font-size: .9rem; }
input, select { width: 100%; padding: .35rem; box-sizing: border-box; }
button { margin-top: 1.2rem; padding: .5rem 1rem; }
.modes a { margin-right: 1rem; }
.modes a.active { font-weight: bold; }
.success { background: #dff5e3; padding: .8rem; border-radius: 4px; }
.error { background: #fde2e1; padding: .8rem; border-radius: 4px; }
.table-wrap { overflow: auto; max-height: 420px; }
table { border-collapse: collapse; font-size: .85rem; }
th, td { border: 1px solid #ddd; padding: .25rem .5rem; text-align: right; }
pre { white-space: pre-wrap; }
a.download { display: inline-block; margin-top: 1rem; }
"#;

/// Escape text for HTML element content and attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(mode: Mode, sidebar: Option<&str>, main: &str) -> String {
    let (manual_class, upload_class) = match mode {
        Mode::Manual => ("active", ""),
        Mode::Upload => ("", "active"),
    };
    let sidebar = sidebar
        .map(|s| format!("<aside>{}</aside>", s))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Bike Demand Prediction</title>
<style>{style}</style>
</head>
<body>
<div class="layout">
{sidebar}
<main>
<h1>🚲 Bike Demand Prediction App</h1>
<p>Predict bike demand by entering feature values or uploading a CSV file.</p>
<nav class="modes">Select Input Method:
<a class="{manual_class}" href="/?mode=manual">Manual Input</a>
<a class="{upload_class}" href="/?mode=upload">Upload CSV / Excel File</a>
</nav>
{main}
</main>
</div>
</body>
</html>"#,
        style = STYLE,
        sidebar = sidebar,
        manual_class = manual_class,
        upload_class = upload_class,
        main = main,
    )
}

fn select(name: &str, label: &str, options: &[(String, String)], selected: &str) -> String {
    let mut html = format!(r#"<label for="{name}">{label}</label><select id="{name}" name="{name}">"#);
    for (value, text) in options {
        let marker = if value == selected { " selected" } else { "" };
        let _ = write!(
            html,
            r#"<option value="{}"{}>{}</option>"#,
            escape(value),
            marker,
            escape(text)
        );
    }
    html.push_str("</select>");
    html
}

fn number(name: &str, label: &str, value: impl std::fmt::Display, bounds: &str) -> String {
    format!(
        r#"<label for="{name}">{label}</label><input id="{name}" name="{name}" type="number" value="{value}" {bounds} required>"#
    )
}

fn binary_options() -> Vec<(String, String)> {
    (0..=1).map(|v| (v.to_string(), v.to_string())).collect()
}

/// Sidebar form for manual input, prefilled with `input`
pub fn manual_form(input: &ManualInput) -> String {
    let weather: Vec<(String, String)> = WeatherCondition::ALL
        .iter()
        .map(|w| (w.label().to_string(), w.label().to_string()))
        .collect();
    let seasons: Vec<(String, String)> = (1..=4).map(|v| (v.to_string(), v.to_string())).collect();

    let fields = [
        format!(
            r#"<label for="date">Date</label><input id="date" name="date" type="date" value="{}" required>"#,
            input.date.format("%Y-%m-%d")
        ),
        select("holiday", "Is it a Holiday?", &binary_options(), &input.holiday.to_string()),
        select(
            "workingday",
            "Is it a Working Day?",
            &binary_options(),
            &input.workingday.to_string(),
        ),
        select("weather", "Weather Condition", &weather, &input.weather),
        select(
            "season",
            "Season (1=Spring, 2=Summer, 3=Fall, 4=Winter)",
            &seasons,
            &input.season.to_string(),
        ),
        number("hr", "Hour", input.hr, r#"min="0" max="23" step="1""#),
        number("weekday", "Weekday (0=Sun, 6=Sat)", input.weekday, r#"min="0" max="6" step="1""#),
        number("temp", "Temperature", input.temp, r#"step="any""#),
        number("atemp", "Feels-like Temperature", input.atemp, r#"step="any""#),
        number("hum", "Humidity (0–1)", input.hum, r#"min="0" max="1" step="0.01""#),
        number("windspeed", "Windspeed", input.windspeed, r#"step="any""#),
    ];

    format!(
        r#"<form method="post" action="/predict">{}<button type="submit">🔮 Predict Bike Demand</button></form>"#,
        fields.concat()
    )
}

/// Render a table, truncated to [`PREVIEW_ROWS`]
pub fn table_html(table: &Table) -> String {
    let mut html = String::from(r#"<div class="table-wrap"><table><thead><tr>"#);
    for column in table.columns() {
        let _ = write!(html, "<th>{}</th>", escape(column));
    }
    html.push_str("</tr></thead><tbody>");
    for row in table.rows().iter().take(PREVIEW_ROWS) {
        html.push_str("<tr>");
        for cell in row {
            let _ = write!(html, "<td>{}</td>", escape(&cell.to_string()));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table></div>");
    if table.row_count() > PREVIEW_ROWS {
        let _ = write!(
            html,
            "<p>Showing the first {} of {} rows.</p>",
            PREVIEW_ROWS,
            table.row_count()
        );
    }
    html
}

/// Collapsible view of the record fed to the model
pub fn model_input_details(record: &FeatureRecord) -> String {
    format!(
        "<details><summary>🔍 See model input</summary>{}</details>",
        table_html(&record.to_table())
    )
}

pub fn success_banner(message: &str) -> String {
    format!(r#"<p class="success">{}</p>"#, escape(message))
}

pub fn error_banner(title: &str, detail: Option<&str>) -> String {
    let detail = detail
        .map(|d| format!("<pre>{}</pre>", escape(d)))
        .unwrap_or_default();
    format!(r#"<div class="error"><strong>{}</strong>{}</div>"#, escape(title), detail)
}

/// Download link carrying the result CSV as a `data:` URI
pub fn download_link(csv: &[u8], file_name: &str) -> String {
    format!(
        r#"<p><a class="download" download="{}" href="data:text/csv;charset=utf-8;base64,{}">📥 Download Prediction CSV</a></p>"#,
        escape(file_name),
        BASE64.encode(csv)
    )
}

/// Filled density curve as inline SVG
pub fn density_svg(plot: &DensityPlot) -> String {
    const WIDTH: f64 = 560.0;
    const HEIGHT: f64 = 320.0;
    const LEFT: f64 = 64.0;
    const RIGHT: f64 = 16.0;
    const TOP: f64 = 36.0;
    const BOTTOM: f64 = 48.0;

    let (first, last) = match (plot.curve.first(), plot.curve.last()) {
        (Some(first), Some(last)) if last.x > first.x => (first, last),
        _ => {
            let value = plot.samples.first().copied().unwrap_or_default();
            return format!(
                "<p>All plotted values equal {}; there is no spread to draw.</p>",
                value
            );
        }
    };

    let max_density = plot
        .curve
        .iter()
        .map(|p| p.density)
        .fold(0.0_f64, f64::max)
        * 1.05;
    let plot_w = WIDTH - LEFT - RIGHT;
    let plot_h = HEIGHT - TOP - BOTTOM;
    let sx = |x: f64| LEFT + (x - first.x) / (last.x - first.x) * plot_w;
    let sy = |d: f64| TOP + plot_h - d / max_density * plot_h;

    let line: Vec<String> = plot
        .curve
        .iter()
        .map(|p| format!("{:.2},{:.2}", sx(p.x), sy(p.density)))
        .collect();
    let baseline = sy(0.0);

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}">"#
    );
    let _ = write!(
        svg,
        r#"<text x="{:.1}" y="20" text-anchor="middle" font-size="14">KDE Plot of Predicted Bike Rentals</text>"#,
        WIDTH / 2.0
    );
    let _ = write!(
        svg,
        r##"<path d="M{:.2},{:.2} L{} L{:.2},{:.2} Z" fill="#1f77b4" fill-opacity="0.25" stroke="none"/>"##,
        sx(first.x),
        baseline,
        line.join(" L"),
        sx(last.x),
        baseline
    );
    let _ = write!(
        svg,
        r##"<polyline points="{}" fill="none" stroke="#1f77b4" stroke-width="1.5"/>"##,
        line.join(" ")
    );

    // axes
    let _ = write!(
        svg,
        r#"<line x1="{LEFT}" y1="{baseline:.2}" x2="{:.2}" y2="{baseline:.2}" stroke="black"/><line x1="{LEFT}" y1="{TOP}" x2="{LEFT}" y2="{baseline:.2}" stroke="black"/>"#,
        WIDTH - RIGHT
    );
    for i in 0..=4 {
        let x = first.x + (last.x - first.x) * i as f64 / 4.0;
        let _ = write!(
            svg,
            r#"<text x="{:.2}" y="{:.2}" text-anchor="middle" font-size="11">{:.0}</text>"#,
            sx(x),
            baseline + 16.0,
            x
        );
        let d = max_density * i as f64 / 4.0;
        let _ = write!(
            svg,
            r#"<text x="{:.2}" y="{:.2}" text-anchor="end" font-size="11">{:.3}</text>"#,
            LEFT - 6.0,
            sy(d) + 4.0,
            d
        );
    }
    let _ = write!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="12">Bike Rentals</text>"#,
        LEFT + plot_w / 2.0,
        HEIGHT - 8.0
    );
    let _ = write!(
        svg,
        r#"<text x="14" y="{:.1}" text-anchor="middle" font-size="12" transform="rotate(-90 14 {:.1})">Density</text>"#,
        TOP + plot_h / 2.0,
        TOP + plot_h / 2.0
    );
    svg.push_str("</svg>");
    svg
}

/// Result block for a manual prediction
pub fn prediction_section(prediction: &ManualPrediction) -> String {
    format!(
        "{}{}<h3>📊 Prediction Visualization (KDE Plot)</h3>{}",
        model_input_details(&prediction.model_input),
        success_banner(&format!(
            "🚴 Estimated Bike Rentals: {}",
            prediction.prediction
        )),
        density_svg(&prediction.density)
    )
}

/// Page in manual mode; `content` goes under "Input Details"
pub fn manual_page(input: &ManualInput, content: &str) -> String {
    let main = format!("<h2>Input Details</h2>{}", content);
    layout(Mode::Manual, Some(&manual_form(input)), &main)
}

/// Page in upload mode; `content` follows the file picker
pub fn upload_page(content: &str) -> String {
    let main = format!(
        r#"<h2>Upload CSV or Excel File</h2>
<form method="post" action="/upload" enctype="multipart/form-data">
<input type="file" name="file" accept=".csv,.xlsx" required>
<button type="submit">Upload file</button>
</form>{}"#,
        content
    );
    layout(Mode::Upload, None, &main)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::table::Cell;
    use base64::Engine;
    use chrono::NaiveDate;

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn test_manual_form_prefill() {
        let mut input = ManualInput::defaults_for(NaiveDate::from_ymd_opt(2012, 3, 9).unwrap());
        input.weather = "Heavy Rain".to_string();
        input.hr = 18;

        let html = manual_form(&input);
        assert!(html.contains(r#"value="2012-03-09""#));
        assert!(html.contains(r#"<option value="Heavy Rain" selected>"#));
        assert!(html.contains(r#"name="hr" type="number" value="18""#));
        assert!(html.contains("🔮 Predict Bike Demand"));
    }

    #[test]
    fn test_table_html_escapes_cells() {
        let mut table = Table::new(vec!["<col>".into()]);
        table.push_row(vec![Cell::Text("<script>".into())]);
        let html = table_html(&table);
        assert!(html.contains("&lt;col&gt;"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_download_link_embeds_exact_bytes() {
        let csv = b"hr,Predicted_Bike_Rentals\n8,80\n";
        let html = download_link(csv, "rentals \"out\".csv");

        assert!(html.contains(r#"download="rentals &quot;out&quot;.csv""#));
        let encoded = html
            .split("base64,")
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .unwrap();
        assert_eq!(BASE64.decode(encoded).unwrap(), csv);
    }

    #[test]
    fn test_density_svg() {
        let svg = density_svg(&DensityPlot::for_prediction(100));
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("KDE Plot of Predicted Bike Rentals"));
        assert!(svg.contains("Bike Rentals"));
        assert!(svg.contains("Density"));

        let flat = density_svg(&DensityPlot::for_prediction(0));
        assert!(flat.contains("no spread"));
    }

    #[test]
    fn test_mode_switch_marks_active() {
        let html = upload_page("");
        assert!(html.contains(r#"<a class="active" href="/?mode=upload">"#));
        assert!(html.contains(r#"enctype="multipart/form-data""#));
    }
}
