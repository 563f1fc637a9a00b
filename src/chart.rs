use ratatui::style::Color;

use crate::aggregate::CrossTab;
use crate::domain::Selections;

/// How many entries (or relation series) are rendered unless the user
/// asks for all of them.
pub const DISPLAY_LIMIT: usize = 10;

/// The fixed categorical palette of the dashboard, cycled by position.
pub const PALETTE: [Color; 10] = [
    Color::Rgb(31, 119, 180),  // #1f77b4
    Color::Rgb(255, 127, 14),  // #ff7f0e
    Color::Rgb(44, 160, 44),   // #2ca02c
    Color::Rgb(214, 39, 40),   // #d62728
    Color::Rgb(148, 103, 189), // #9467bd
    Color::Rgb(140, 86, 75),   // #8c564b
    Color::Rgb(227, 119, 194), // #e377c2
    Color::Rgb(127, 127, 127), // #7f7f7f
    Color::Rgb(188, 189, 34),  // #bcbd22
    Color::Rgb(23, 190, 207),  // #17becf
];

pub fn palette_color(position: usize) -> Color {
    PALETTE[position % PALETTE.len()]
}

#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub label: String,
    pub value: u64,
    pub color: Color,
}

/// One named, colored, ordered sequence of points. The only structure
/// the rendering surface consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub color: Color,
    pub points: Vec<Point>,
}

pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 * 100.0 / total as f64
    }
}

/// Turns the ranked frequency entries into the single-column series.
/// Truncation only limits what is rendered; `total` keeps reflecting the
/// full table and drives the percentage labels.
pub fn single_series(ranked: &[(String, usize)], total: usize, selections: &Selections) -> Series {
    let limit = if selections.show_all {
        ranked.len()
    } else {
        ranked.len().min(DISPLAY_LIMIT)
    };

    let points = ranked[..limit]
        .iter()
        .enumerate()
        .map(|(position, (value, count))| Point {
            label: if selections.show_percentage {
                format!("{} ({:.1}%)", value, percentage(*count, total))
            } else {
                value.clone()
            },
            value: *count as u64,
            color: palette_color(position),
        })
        .collect();

    Series {
        name: "Data".to_string(),
        color: PALETTE[0],
        points,
    }
}

/// Builds one series per retained primary value of the cross-tabulation.
/// Retention truncates the lexicographically ordered value set by
/// position, deliberately not by series total. Zero-count cells are not
/// rendered, and a series with no points at all is dropped (its palette
/// position is still consumed).
pub fn relation_series(xtab: &CrossTab, selections: &Selections) -> Vec<Series> {
    let retained = if !selections.show_all && xtab.unique_a.len() > DISPLAY_LIMIT {
        &xtab.unique_a[..DISPLAY_LIMIT]
    } else {
        &xtab.unique_a[..]
    };

    let mut series = Vec::new();
    for (position, a) in retained.iter().enumerate() {
        let row = &xtab.cells[a];
        let series_total: usize = row.values().sum();
        let color = palette_color(position);

        let name = if selections.show_percentage {
            format!("{a} (Total: {series_total})")
        } else {
            a.clone()
        };

        let points: Vec<Point> = xtab
            .unique_b
            .iter()
            .filter_map(|b| {
                let count = row[b];
                (count > 0).then(|| Point {
                    label: if selections.show_percentage {
                        format!("{} ({:.1}%)", b, percentage(count, series_total))
                    } else {
                        b.clone()
                    },
                    value: count as u64,
                    color,
                })
            })
            .collect();

        if !points.is_empty() {
            series.push(Series {
                name,
                color,
                points,
            });
        }
    }
    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{aggregate, cross_tab, rank};
    use crate::store::test_store;

    fn ranked(values: &[(&str, usize)]) -> Vec<(String, usize)> {
        values.iter().map(|(v, c)| (v.to_string(), *c)).collect()
    }

    #[test]
    fn palette_cycles_by_position() {
        assert_eq!(palette_color(0), PALETTE[0]);
        assert_eq!(palette_color(3), PALETTE[3]);
        assert_eq!(palette_color(10), PALETTE[0]);
        assert_eq!(palette_color(23), PALETTE[3]);
    }

    #[test]
    fn single_series_truncates_rendering_only() {
        let entries: Vec<(String, usize)> =
            (0..15).map(|i| (format!("v{i:02}"), 15 - i)).collect();
        let total: usize = entries.iter().map(|(_, c)| c).sum();

        let truncated = single_series(&entries, total, &Selections::default());
        assert_eq!(truncated.points.len(), DISPLAY_LIMIT);

        let full = single_series(&entries, total, &Selections::default().show_all(true));
        assert_eq!(full.points.len(), 15);
    }

    #[test]
    fn single_series_percentage_labels() {
        let series = single_series(
            &ranked(&[("NYC", 2), ("LA", 1)]),
            3,
            &Selections::default().show_percentage(true),
        );

        assert_eq!(series.points[0].label, "NYC (66.7%)");
        assert_eq!(series.points[1].label, "LA (33.3%)");
    }

    #[test]
    fn single_series_percentages_sum_to_one_hundred() {
        let entries = ranked(&[("a", 4), ("b", 3), ("c", 2), ("d", 1)]);
        let total: usize = entries.iter().map(|(_, c)| c).sum();

        let sum: f64 = entries.iter().map(|(_, c)| percentage(*c, total)).sum();
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn single_series_zero_total_has_no_bars_and_no_division() {
        let series = single_series(&[], 0, &Selections::default().show_percentage(true));
        assert!(series.points.is_empty());
        assert_eq!(percentage(0, 0), 0.0);
    }

    #[test]
    fn single_series_colors_follow_position() {
        let entries: Vec<(String, usize)> = (0..12).map(|i| (format!("v{i:02}"), 12 - i)).collect();
        let series = single_series(&entries, 78, &Selections::default().show_all(true));

        assert_eq!(series.points[0].color, PALETTE[0]);
        assert_eq!(series.points[9].color, PALETTE[9]);
        assert_eq!(series.points[10].color, PALETTE[0]);
    }

    #[test]
    fn relation_series_skips_zero_cells_and_names_totals() {
        let store = test_store(
            &["City", "Dept"],
            &[&["NYC", "Eng"], &["NYC", "Eng"], &["LA", "Sales"]],
        );
        let xtab = cross_tab(&store, "City", "Dept").unwrap();

        let plain = relation_series(&xtab, &Selections::default());
        assert_eq!(plain.len(), 2);
        // unique_a is lexicographic, so LA comes first and owns color 0.
        assert_eq!(plain[0].name, "LA");
        assert_eq!(plain[0].color, PALETTE[0]);
        assert_eq!(plain[0].points.len(), 1);
        assert_eq!(plain[0].points[0].label, "Sales");
        assert_eq!(plain[1].name, "NYC");
        assert_eq!(plain[1].points.len(), 1);
        assert_eq!(plain[1].points[0].value, 2);

        let with_pct = relation_series(&xtab, &Selections::default().show_percentage(true));
        assert_eq!(with_pct[0].name, "LA (Total: 1)");
        assert_eq!(with_pct[1].points[0].label, "Eng (100.0%)");
    }

    #[test]
    fn relation_series_truncates_positionally_not_by_total() {
        // Twelve primary values; the lexicographically last two carry the
        // highest totals and must still be the ones cut off.
        let mut rows: Vec<Vec<String>> = vec![];
        for i in 0..12 {
            let city = format!("c{i:02}");
            let weight = if i >= 10 { 5 } else { 1 };
            for _ in 0..weight {
                rows.push(vec![city.clone(), "Eng".to_string()]);
            }
        }
        let row_refs: Vec<Vec<&str>> = rows
            .iter()
            .map(|r| r.iter().map(|s| s.as_str()).collect())
            .collect();
        let row_slices: Vec<&[&str]> = row_refs.iter().map(|r| r.as_slice()).collect();
        let store = test_store(&["City", "Dept"], &row_slices);
        let xtab = cross_tab(&store, "City", "Dept").unwrap();

        let series = relation_series(&xtab, &Selections::default());
        assert_eq!(series.len(), DISPLAY_LIMIT);
        assert_eq!(series[0].name, "c00");
        assert_eq!(series[9].name, "c09");
        assert!(!series.iter().any(|s| s.name.starts_with("c10")));

        // The grand total still covers the truncated values.
        assert_eq!(xtab.total_relations, 20);

        let all = relation_series(&xtab, &Selections::default().show_all(true));
        assert_eq!(all.len(), 12);
    }

    #[test]
    fn relation_percentages_are_within_series() {
        let store = test_store(
            &["City", "Dept"],
            &[&["NYC", "Eng"], &["NYC", "Eng"], &["NYC", "Sales"]],
        );
        let xtab = cross_tab(&store, "City", "Dept").unwrap();
        let series = relation_series(&xtab, &Selections::default().show_percentage(true));

        assert_eq!(series[0].points[0].label, "Eng (66.7%)");
        assert_eq!(series[0].points[1].label, "Sales (33.3%)");
    }

    #[test]
    fn ranked_aggregate_feeds_the_formatter() {
        let store = test_store(&["City"], &[&["NYC"], &["NYC"], &["LA"]]);
        let frequency = aggregate(&store, "City", "");
        let series = single_series(&rank(&frequency), frequency.total, &Selections::default());

        assert_eq!(series.points[0].label, "NYC");
        assert_eq!(series.points[0].value, 2);
        assert_eq!(series.points[1].label, "LA");
    }
}
