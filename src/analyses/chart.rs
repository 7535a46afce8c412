//! Projection of spreadsheet records into chart-series payloads.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::spreadsheet::{Cell, Record};

pub const BORDER_COLOR: &str = "rgba(54, 162, 235, 1)";
pub const BORDER_WIDTH: u32 = 1;

/// Colors for doughnut and pie slices, cycled per label.
pub const SLICE_PALETTE: [&str; 5] = [
    "rgba(255, 99, 132, 0.6)",
    "rgba(54, 162, 235, 0.6)",
    "rgba(255, 206, 86, 0.6)",
    "rgba(75, 192, 192, 0.6)",
    "rgba(153, 102, 255, 0.6)",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
    Scatter,
    Bubble,
    Radar,
    Doughnut,
    Pie,
}

impl ChartKind {
    pub const ALL: [ChartKind; 7] = [
        ChartKind::Bar,
        ChartKind::Line,
        ChartKind::Scatter,
        ChartKind::Bubble,
        ChartKind::Radar,
        ChartKind::Doughnut,
        ChartKind::Pie,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Scatter => "scatter",
            ChartKind::Bubble => "bubble",
            ChartKind::Radar => "radar",
            ChartKind::Doughnut => "doughnut",
            ChartKind::Pie => "pie",
        }
    }

    /// Background color(s) for a dataset of `labels` points.
    pub fn background(self, labels: usize) -> Background {
        let single = |c: &str| Background::Single(c.to_string());
        match self {
            ChartKind::Bar => single("rgba(54, 162, 235, 0.6)"),
            ChartKind::Line => single("rgba(255, 99, 132, 0.6)"),
            ChartKind::Scatter => single("rgba(75, 192, 192, 0.6)"),
            ChartKind::Bubble => single("rgba(153, 102, 255, 0.6)"),
            ChartKind::Radar => single("rgba(255, 159, 64, 0.6)"),
            ChartKind::Doughnut | ChartKind::Pie => Background::PerLabel(
                (0..labels)
                    .map(|i| SLICE_PALETTE[i % SLICE_PALETTE.len()].to_string())
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChartKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unsupported chart kind `{s}`"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Background {
    Single(String),
    PerLabel(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    pub data: Vec<Cell>,
    pub background_color: Background,
    pub border_color: String,
    pub border_width: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<Cell>,
    pub datasets: Vec<Dataset>,
}

/// One of the selected columns is not a key of the first record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownColumns;

/// Projects `records` onto `x` (labels) and `y` (values), keeping sheet order.
///
/// Only the first record is checked for the columns; later records missing a
/// value contribute a null point.
pub fn project(
    records: &[Record],
    kind: ChartKind,
    x: &str,
    y: &str,
) -> Result<ChartData, UnknownColumns> {
    let first = records.first().ok_or(UnknownColumns)?;
    if !first.contains_key(x) || !first.contains_key(y) {
        return Err(UnknownColumns);
    }

    let pick = |record: &Record, col: &str| record.get(col).cloned().unwrap_or(Cell::Empty);
    let labels: Vec<Cell> = records.iter().map(|r| pick(r, x)).collect();
    let data: Vec<Cell> = records.iter().map(|r| pick(r, y)).collect();

    Ok(ChartData {
        datasets: vec![Dataset {
            label: y.to_string(),
            background_color: kind.background(labels.len()),
            data,
            border_color: BORDER_COLOR.to_string(),
            border_width: BORDER_WIDTH,
        }],
        labels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, Cell)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn months(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| {
                record(&[
                    ("Month", Cell::Text(format!("m{i}"))),
                    ("Sales", Cell::Int(i as i64 * 10)),
                ])
            })
            .collect()
    }

    #[test]
    fn projects_labels_and_values_in_order() {
        let chart = project(&months(3), ChartKind::Bar, "Month", "Sales").unwrap();
        assert_eq!(
            chart.labels,
            vec![
                Cell::Text("m0".into()),
                Cell::Text("m1".into()),
                Cell::Text("m2".into())
            ]
        );
        assert_eq!(chart.datasets.len(), 1);
        let ds = &chart.datasets[0];
        assert_eq!(ds.label, "Sales");
        assert_eq!(ds.data, vec![Cell::Int(0), Cell::Int(10), Cell::Int(20)]);
        assert_eq!(ds.background_color, Background::Single("rgba(54, 162, 235, 0.6)".into()));
        assert_eq!(ds.border_color, BORDER_COLOR);
        assert_eq!(ds.border_width, 1);
    }

    #[test]
    fn lengths_match_record_count() {
        for kind in ChartKind::ALL {
            let chart = project(&months(12), kind, "Sales", "Month").unwrap();
            assert_eq!(chart.labels.len(), 12);
            assert_eq!(chart.datasets[0].data.len(), 12);
        }
    }

    #[test]
    fn slice_colors_cycle_every_five() {
        for kind in [ChartKind::Pie, ChartKind::Doughnut] {
            let chart = project(&months(7), kind, "Month", "Sales").unwrap();
            let p = SLICE_PALETTE;
            let expected: Vec<String> = [p[0], p[1], p[2], p[3], p[4], p[0], p[1]]
                .iter()
                .map(|s| s.to_string())
                .collect();
            assert_eq!(chart.datasets[0].background_color, Background::PerLabel(expected));
        }
    }

    #[test]
    fn scalar_kinds_get_one_fixed_color() {
        for kind in [
            ChartKind::Bar,
            ChartKind::Line,
            ChartKind::Scatter,
            ChartKind::Bubble,
            ChartKind::Radar,
        ] {
            assert!(matches!(kind.background(40), Background::Single(_)));
        }
        assert_ne!(ChartKind::Bar.background(1), ChartKind::Line.background(1));
    }

    #[test]
    fn unknown_columns_are_rejected() {
        let records = months(2);
        assert_eq!(project(&records, ChartKind::Bar, "Month", "Profit"), Err(UnknownColumns));
        assert_eq!(project(&records, ChartKind::Bar, "Date", "Sales"), Err(UnknownColumns));
        assert_eq!(project(&[], ChartKind::Bar, "Month", "Sales"), Err(UnknownColumns));
    }

    #[test]
    fn later_gaps_become_null_points() {
        let records = vec![
            record(&[("x", Cell::Text("a".into())), ("y", Cell::Int(1))]),
            record(&[("x", Cell::Text("b".into()))]),
        ];
        let chart = project(&records, ChartKind::Line, "x", "y").unwrap();
        assert_eq!(chart.datasets[0].data, vec![Cell::Int(1), Cell::Empty]);
    }

    #[test]
    fn kind_parses_from_lowercase_names() {
        assert_eq!("doughnut".parse::<ChartKind>().unwrap(), ChartKind::Doughnut);
        assert!("histogram".parse::<ChartKind>().is_err());
        assert_eq!(serde_json::to_string(&ChartKind::Pie).unwrap(), r#""pie""#);
    }

    #[test]
    fn payload_uses_chart_js_keys() {
        let chart = project(&months(1), ChartKind::Pie, "Month", "Sales").unwrap();
        let json = serde_json::to_value(&chart).unwrap();
        let ds = &json["datasets"][0];
        assert_eq!(ds["backgroundColor"][0], SLICE_PALETTE[0]);
        assert_eq!(ds["borderWidth"], 1);
        assert_eq!(json["labels"][0], "m0");

        let back: ChartData = serde_json::from_value(json).unwrap();
        assert_eq!(back, chart);
    }
}
