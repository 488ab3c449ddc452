//! HTML Report Generator
//!
//! Renders the grouped exception mapping into a single self-contained HTML
//! document with collapsible groups, live text search and date filtering.

use std::fs;
use std::fs::File;
use std::io::Write;

use chrono::Local;

use crate::grouper::{Group, GroupedReport};

/// Fixed output filename, written to the current working directory.
pub const OUTPUT_FILE: &str = "grouped_exception_report.html";

/// Render the report and write it to `output_path`.
/// Returns the output path on success.
///
/// The document is written to a temporary sibling file first and renamed
/// into place, so a failed run never leaves a partial report behind.
pub fn generate_report(
    report: &GroupedReport,
    source_name: &str,
    output_path: &str,
) -> Result<String, String> {
    let html_content = render_html(report, source_name);

    let tmp_path = format!("{}.tmp", output_path);
    {
        let mut file = File::create(&tmp_path)
            .map_err(|e| format!("Failed to create report file {}: {}", tmp_path, e))?;
        file.write_all(html_content.as_bytes())
            .map_err(|e| format!("Failed to write report file {}: {}", tmp_path, e))?;
    }
    fs::rename(&tmp_path, output_path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        format!("Failed to move report into place at {}: {}", output_path, e)
    })?;

    Ok(output_path.to_string())
}

/// Pure rendering step: grouped mapping in, HTML document out.
pub fn render_html(report: &GroupedReport, source_name: &str) -> String {
    let generated_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let groups_html = render_groups(report.groups());

    format!(
        r##"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Grouped Exception Report</title>
    <style>
        body {{ font-family: Arial, sans-serif; padding: 20px; background: #fff; color: #222; }}
        .meta {{ color: #666; font-size: 0.9em; margin-bottom: 15px; }}
        .controls {{ display: flex; gap: 10px; align-items: center; flex-wrap: wrap; margin-bottom: 15px; }}
        .controls input[type="text"] {{ padding: 6px 10px; border: 1px solid #ccc; border-radius: 4px; min-width: 260px; }}
        .controls input[type="date"] {{ padding: 5px 8px; border: 1px solid #ccc; border-radius: 4px; }}
        .controls label {{ color: #444; font-size: 0.9em; }}
        .controls button {{ padding: 6px 14px; border: 1px solid #999; border-radius: 4px; background: #f2f2f2; cursor: pointer; }}
        .controls button:hover {{ background: #e4e4e4; }}
        .group {{ border: 1px solid #ddd; margin-bottom: 15px; border-radius: 5px; }}
        .group.hidden {{ display: none; }}
        .group-header {{ background-color: #f2f2f2; padding: 10px; cursor: pointer; display: flex; justify-content: space-between; align-items: center; }}
        .details {{ display: none; padding: 10px; background: #fafafa; }}
        .entry.hidden {{ display: none; }}
        .timestamp {{ color: gray; font-size: 0.9em; }}
        pre {{ white-space: pre-wrap; word-wrap: break-word; margin: 0; }}
    </style>
</head>
<body>
    <h2>Grouped Exception Report</h2>
    <p class="meta">Source: {source_name} &middot; Generated: {generated_at}</p>
    <div class="controls">
        <input type="text" id="searchInput" placeholder="Search exception groups...">
        <label>From <input type="date" id="dateFrom"></label>
        <label>To <input type="date" id="dateTo"></label>
        <button id="resetBtn" onclick="resetFilters()">Reset</button>
    </div>
    <p>Total Groups: <span id="groupCount">{total_groups}</span></p>

{groups_html}
    <script>
        function toggleDetails(id) {{
            var el = document.getElementById(id);
            el.style.display = el.style.display === 'block' ? 'none' : 'block';
        }}

        const searchInput = document.getElementById('searchInput');
        const dateFrom = document.getElementById('dateFrom');
        const dateTo = document.getElementById('dateTo');
        const groupCount = document.getElementById('groupCount');

        function applyAllFilters() {{
            const query = searchInput.value.trim().toLowerCase();
            const from = dateFrom.value;
            const to = dateTo.value;
            let visibleGroups = 0;

            document.querySelectorAll('.group').forEach(group => {{
                const key = group.dataset.key.toLowerCase();
                const keyMatches = query.length === 0 || key.includes(query);

                // An occurrence stays visible when its date falls inside the
                // inclusive range; empty bounds are ignored.
                let visibleEntries = 0;
                group.querySelectorAll('.entry').forEach(entry => {{
                    const date = entry.dataset.date;
                    const inRange = (from === '' || date >= from) && (to === '' || date <= to);
                    entry.classList.toggle('hidden', !inRange);
                    if (inRange) {{
                        visibleEntries++;
                    }}
                }});

                const visible = keyMatches && visibleEntries > 0;
                group.classList.toggle('hidden', !visible);
                if (visible) {{
                    visibleGroups++;
                }}
            }});

            groupCount.textContent = visibleGroups;
        }}

        function resetFilters() {{
            searchInput.value = '';
            dateFrom.value = '';
            dateTo.value = '';
            applyAllFilters();
        }}

        searchInput.addEventListener('input', applyAllFilters);
        dateFrom.addEventListener('change', applyAllFilters);
        dateTo.addEventListener('change', applyAllFilters);
    </script>
</body>
</html>
"##,
        source_name = html_escape(source_name),
        generated_at = html_escape(&generated_at),
        total_groups = report.group_count(),
        groups_html = groups_html,
    )
}

fn render_groups(groups: &[Group]) -> String {
    let mut html = String::new();
    for (idx, group) in groups.iter().enumerate() {
        html.push_str(&render_group(group, idx + 1));
    }
    html
}

fn render_group(group: &Group, idx: usize) -> String {
    let mut entries_html = String::new();
    for occurrence in &group.occurrences {
        // Date portion of the fixed-format timestamp, used by the
        // client-side range filter.
        let date = occurrence.timestamp.get(..10).unwrap_or("");
        entries_html.push_str(&format!(
            r#"                <div class="entry" data-date="{date}">
                    <p class="timestamp">{timestamp}</p>
                    <pre>{message}</pre>
                    <hr>
                </div>
"#,
            date = html_escape(date),
            timestamp = html_escape(&occurrence.timestamp),
            message = html_escape(&occurrence.message),
        ));
    }

    format!(
        r#"        <div class="group" data-key="{key}">
            <div class="group-header" onclick="toggleDetails('group{idx}')">
                <strong>{key}</strong>
                <span>{count} occurrence(s)</span>
            </div>
            <div class="details" id="group{idx}">
{entries_html}            </div>
        </div>
"#,
        key = html_escape(&group.key),
        idx = idx,
        count = group.occurrences.len(),
        entries_html = entries_html,
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::Occurrence;
    use crate::grouper::GroupStrategy;
    use std::path::Path;

    fn occ(timestamp: &str, message: &str) -> Occurrence {
        Occurrence {
            timestamp: timestamp.to_string(),
            message: message.to_string(),
        }
    }

    fn build(occurrences: Vec<Occurrence>) -> GroupedReport {
        GroupedReport::build(occurrences, &GroupStrategy::type_token())
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<script>"), "&lt;script&gt;");
        assert_eq!(html_escape("a & b"), "a &amp; b");
        assert_eq!(html_escape(r#"say "hello""#), "say &quot;hello&quot;");
    }

    #[test]
    fn test_empty_report_shows_zero_groups() {
        let html = render_html(&build(Vec::new()), "empty.log");
        assert!(html.contains("Total Groups: <span id=\"groupCount\">0</span>"));
        assert!(!html.contains("class=\"group\""));
    }

    #[test]
    fn test_report_contains_timestamps_and_escaped_messages() {
        let report = build(vec![occ(
            "2024-01-01 10:00:00,000",
            "x.FooException: value <null> & friends",
        )]);
        let html = render_html(&report, "app.log");
        assert!(html.contains("2024-01-01 10:00:00,000"));
        assert!(html.contains("x.FooException: value &lt;null&gt; &amp; friends"));
        assert!(!html.contains("value <null>"));
    }

    #[test]
    fn test_report_group_structure() {
        let report = build(vec![
            occ("2024-01-01 10:00:00,000", "a.FooException: one"),
            occ("2024-01-02 11:00:00,000", "a.FooException: two"),
            occ("2024-01-03 12:00:00,000", "b.BarException: three"),
        ]);
        let html = render_html(&report, "app.log");
        assert!(html.contains("Total Groups: <span id=\"groupCount\">2</span>"));
        assert!(html.contains("data-key=\"FooException\""));
        assert!(html.contains("data-key=\"BarException\""));
        assert!(html.contains("2 occurrence(s)"));
        assert!(html.contains("data-date=\"2024-01-02\""));
        // FooException was seen first, so it renders first
        let foo_pos = html.find("data-key=\"FooException\"").unwrap();
        let bar_pos = html.find("data-key=\"BarException\"").unwrap();
        assert!(foo_pos < bar_pos);
    }

    #[test]
    fn test_generate_report_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report.html");
        let output_str = output.to_string_lossy().to_string();

        let report = build(vec![occ("2024-01-01 10:00:00,000", "x.FooException: boom")]);
        let written = generate_report(&report, "app.log", &output_str).unwrap();
        assert_eq!(written, output_str);

        let content = fs::read_to_string(&output).unwrap();
        assert!(content.starts_with("<!DOCTYPE html>"));
        assert!(content.contains("FooException"));
        // No temp file left behind
        assert!(!Path::new(&format!("{}.tmp", output_str)).exists());
    }

    #[test]
    fn test_generate_report_fails_cleanly_on_bad_path() {
        let report = build(Vec::new());
        let result = generate_report(&report, "app.log", "/nonexistent-dir/report.html");
        assert!(result.is_err());
    }
}
