//! Text rendering of ad account insights rows.
//!
//! Breakdown dimensions are detected from the first row. Rows carrying
//! `date_start` get the time-based view (pure daily aggregation when no other
//! dimension is present, otherwise per-date rows with their dimensions).
//! Other breakdowns get the generic per-row view, and rows without any
//! breakdown get the simple account view.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use indexmap::IndexMap;
use serde_json::Value;

/// Row keys recognised as breakdown dimensions, in display order.
pub const BREAKDOWN_FIELDS: &[&str] = &[
    "date_start",
    "date_stop",
    "placement",
    "age",
    "gender",
    "country",
    "region",
    "device_platform",
    "publisher_platform",
    "platform_position",
    "impression_device",
    "product_id",
    "dma",
];

const TIME_FIELDS: &[&str] = &["date_start", "date_stop"];

/// Render insights rows as markdown-flavoured text.
pub fn format_insights(rows: &[Value]) -> String {
    let dimensions = detect_breakdowns(rows);
    if dimensions.is_empty() {
        return format_simple(rows);
    }

    let mut out = String::from("**Performance Data with Breakdowns:**\n\n");
    let _ = write!(out, "**Breakdown Dimensions:** {}\n\n", dimensions.join(", "));
    if dimensions.contains(&"date_start") {
        out.push_str(&format_time_based(rows, &dimensions));
    } else {
        out.push_str(&format_generic(rows, &dimensions));
    }
    out
}

pub fn detect_breakdowns(rows: &[Value]) -> Vec<&'static str> {
    let Some(first) = rows.first().and_then(Value::as_object) else {
        return Vec::new();
    };
    BREAKDOWN_FIELDS
        .iter()
        .copied()
        .filter(|field| first.contains_key(*field))
        .collect()
}

fn format_time_based(rows: &[Value], dimensions: &[&str]) -> String {
    let other: Vec<&str> = dimensions
        .iter()
        .copied()
        .filter(|d| !TIME_FIELDS.contains(d))
        .collect();
    if other.is_empty() {
        return format_daily(rows);
    }

    let mut out = format!("**Daily Performance by {}:**\n\n", other.join(" × "));
    for (date, day_rows) in group_by_date(rows) {
        out.push_str(&date_header(&date, day_rows[0]));
        for row in &day_rows {
            let dims = other
                .iter()
                .map(|field| format!("{}: {}", field, display(row.get(*field))))
                .collect::<Vec<_>>()
                .join(", ");
            let metrics = Metrics::from_row(row).lines("").join(", ");
            let _ = writeln!(out, "  {} - {}", dims, metrics);

            if let Some(summary) = conversion_summary(std::slice::from_ref(*row)) {
                let _ = writeln!(out, "    Conversions: {}", summary);
            }
        }
        out.push('\n');
    }
    out
}

fn format_daily(rows: &[Value]) -> String {
    let mut out = String::from("**Daily Performance Breakdown:**\n\n");
    let groups = group_by_date(rows);

    let single_day_rows = rows
        .first()
        .is_some_and(|r| r.get("date_start") == r.get("date_stop"));
    if groups.len() <= 1 && !single_day_rows {
        out.push_str(
            "Note: data is aggregated over the whole date range rather than per day.\n\
             Pass time_increment=1 to get daily rows.\n\n",
        );
    }

    for (date, day_rows) in groups {
        out.push_str(&date_header(&date, day_rows[0]));
        let owned: Vec<Value> = day_rows.iter().map(|r| (*r).clone()).collect();
        let metrics = if owned.len() > 1 {
            Metrics::aggregate(&owned)
        } else {
            Metrics::from_row(&owned[0])
        };
        for line in metrics.lines("  ") {
            let _ = writeln!(out, "{}", line);
        }
        if let Some(summary) = conversion_summary(&owned) {
            let _ = writeln!(out, "  **Conversions:** {}", summary);
        }
        out.push('\n');
    }
    out
}

fn format_generic(rows: &[Value], dimensions: &[&str]) -> String {
    let mut out = String::from("**Custom Breakdown Results:**\n\n");
    for (index, row) in rows.iter().enumerate() {
        let _ = writeln!(out, "**Row {}:**", index + 1);
        for field in dimensions {
            if let Some(value) = row.get(*field) {
                let _ = writeln!(out, "  {}: {}", field, display(Some(value)));
            }
        }
        for line in Metrics::from_row(row).lines("  ") {
            let _ = writeln!(out, "{}", line);
        }
        if let Some(summary) = conversion_summary(std::slice::from_ref(row)) {
            let _ = writeln!(out, "  **Conversions:** {}", summary);
        }
        out.push('\n');
    }
    out
}

fn format_simple(rows: &[Value]) -> String {
    let mut out = String::from("**Account Performance:**\n\n");
    let Some(row) = rows.first() else {
        out.push_str("No data available.\n");
        return out;
    };

    for line in Metrics::from_row(row).lines("") {
        let _ = writeln!(out, "{}", line);
    }

    if let Some(actions) = row.get("actions").and_then(Value::as_array) {
        out.push_str("\n**Conversion Events:**\n");
        for action in actions {
            let _ = writeln!(
                out,
                "• {}: {}",
                display(action.get("action_type")),
                display(action.get("value"))
            );
        }
    }
    out
}

// Sorted by `date_start`; rows keep their order within a date.
fn group_by_date(rows: &[Value]) -> BTreeMap<String, Vec<&Value>> {
    let mut groups: BTreeMap<String, Vec<&Value>> = BTreeMap::new();
    for row in rows {
        groups
            .entry(display(row.get("date_start")))
            .or_default()
            .push(row);
    }
    groups
}

fn date_header(date: &str, first: &Value) -> String {
    let stop = display(first.get("date_stop"));
    if stop == date {
        format!("**{}:**\n", date)
    } else {
        format!("**{} to {}:**\n", date, stop)
    }
}

fn display(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "undefined".to_string(),
        Some(other) => other.to_string(),
    }
}

fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Core delivery metrics of one row or an aggregate of rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metrics {
    pub spend: Option<f64>,
    pub impressions: Option<f64>,
    pub clicks: Option<f64>,
    pub ctr: Option<f64>,
    pub cpc: Option<f64>,
    pub cpm: Option<f64>,
}

impl Metrics {
    pub fn from_row(row: &Value) -> Self {
        let present = |key: &str| match row.get(key) {
            None | Some(Value::Null) => None,
            value => Some(number(value).unwrap_or(0.0)),
        };
        Self {
            spend: present("spend"),
            impressions: present("impressions").map(f64::trunc),
            clicks: present("clicks").map(f64::trunc),
            ctr: present("ctr"),
            cpc: present("cpc"),
            cpm: present("cpm"),
        }
    }

    /// Sum spend, impressions and clicks, then derive CTR, CPC and CPM.
    pub fn aggregate(rows: &[Value]) -> Self {
        let sum = |key: &str| -> f64 { rows.iter().filter_map(|r| number(r.get(key))).sum() };
        let spend = sum("spend");
        let impressions: f64 = rows
            .iter()
            .filter_map(|r| number(r.get("impressions")))
            .map(f64::trunc)
            .sum();
        let clicks: f64 = rows
            .iter()
            .filter_map(|r| number(r.get("clicks")))
            .map(f64::trunc)
            .sum();

        Self {
            spend: Some(spend),
            impressions: Some(impressions),
            clicks: Some(clicks),
            ctr: (impressions > 0.0).then(|| clicks / impressions * 100.0),
            cpc: (clicks > 0.0).then(|| spend / clicks),
            cpm: (impressions > 0.0).then(|| spend / impressions * 1000.0),
        }
    }

    pub fn lines(&self, indent: &str) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(spend) = self.spend {
            lines.push(format!("{}Spend: ${:.2}", indent, spend));
        }
        if let Some(impressions) = self.impressions {
            lines.push(format!("{}Impressions: {}", indent, thousands(impressions)));
        }
        if let Some(clicks) = self.clicks {
            lines.push(format!("{}Clicks: {}", indent, thousands(clicks)));
        }
        if let Some(ctr) = self.ctr {
            lines.push(format!("{}CTR: {:.2}%", indent, ctr));
        }
        if let Some(cpc) = self.cpc {
            lines.push(format!("{}CPC: ${:.2}", indent, cpc));
        }
        if let Some(cpm) = self.cpm {
            lines.push(format!("{}CPM: ${:.2}", indent, cpm));
        }
        lines
    }
}

/// Integer with `,` thousands separators.
pub fn thousands(value: f64) -> String {
    let whole = value.trunc() as i64;
    let digits = whole.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if whole < 0 {
        out.insert(0, '-');
    }
    out
}

fn count(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// `type: total` pairs over `conversions`, plus `actions` of types that have
/// no conversion entry. Zero totals are dropped.
pub fn conversion_summary(rows: &[Value]) -> Option<String> {
    let mut totals: IndexMap<String, f64> = IndexMap::new();
    let mut from_conversions = Vec::new();

    for row in rows {
        for conversion in row
            .get("conversions")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
        {
            let kind = display(conversion.get("action_type"));
            *totals.entry(kind.clone()).or_default() +=
                number(conversion.get("value")).unwrap_or(0.0);
            from_conversions.push(kind);
        }
    }

    for row in rows {
        for action in row
            .get("actions")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
        {
            let kind = display(action.get("action_type"));
            if from_conversions.contains(&kind) {
                continue;
            }
            *totals.entry(kind).or_default() += number(action.get("value")).unwrap_or(0.0);
        }
    }

    let parts: Vec<String> = totals
        .into_iter()
        .filter(|(_, total)| *total > 0.0)
        .map(|(kind, total)| format!("{}: {}", kind, count(total)))
        .collect();
    (!parts.is_empty()).then(|| parts.join(", "))
}
