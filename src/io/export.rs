//! CSV export of result rows and JSON export of the run summary.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::error::SimError;
use crate::model::face::{Face, FaceMap};
use crate::sim::summary::RunSummary;
use crate::sim::types::{Mechanisms, ResultRow};

/// Leading columns of the result table, before the per-face channels.
pub const HEADER: &str = "timestamp,ambient_c,irradiance_w_m2,load_w,relative_humidity_pct,\
                          battery_c,inner_wall_c,outer_wall_c,\
                          heater_on,heater_energy_j,heater_to_battery_j,heater_to_air_j,\
                          battery_loss_heat_j,\
                          battery_inner_conduction_j,battery_inner_convection_j,battery_inner_radiation_j,\
                          inner_outer_conduction_j,\
                          outer_ambient_conduction_j,outer_ambient_convection_j,outer_ambient_radiation_j,\
                          solar_gain_j,\
                          battery_net_j,inner_wall_net_j,outer_wall_net_j,\
                          battery_cumulative_j,inner_wall_cumulative_j,outer_wall_cumulative_j,\
                          substeps";

const MECHANISMS: [&str; 3] = ["conduction", "convection", "radiation"];

/// Full column list: [`HEADER`] followed by one column per face and
/// mechanism, battery faces first, e.g. `battery_top_radiation_j`.
pub fn columns() -> Vec<String> {
    let mut cols: Vec<String> = HEADER.split(',').map(|c| c.trim().to_string()).collect();
    for side in ["battery", "container"] {
        for face in Face::ALL {
            for mech in MECHANISMS {
                cols.push(format!("{side}_{face}_{mech}_j"));
            }
        }
    }
    cols
}

fn push_faces(fields: &mut Vec<String>, faces: &FaceMap<Mechanisms>) {
    for (_, m) in faces.iter() {
        fields.push(format!("{:.3}", m.conduction));
        fields.push(format!("{:.3}", m.convection));
        fields.push(format!("{:.3}", m.radiation));
    }
}

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Exports result rows to a CSV file at the given path.
///
/// Writes a header row followed by one data row per step, with every path
/// broken out per face and mechanism. Produces identical bytes for
/// identical rows.
///
/// # Arguments
///
/// * `rows` - Complete result table
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an I/O or CSV error if file creation or writing fails.
pub fn export_csv(rows: &[ResultRow], path: &Path) -> Result<(), SimError> {
    let file = File::create(path)?;
    write_csv(rows, io::BufWriter::new(file))
}

/// Writes result rows as CSV to any writer.
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_csv(rows: &[ResultRow], writer: impl Write) -> Result<(), SimError> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(columns())?;

    for r in rows {
        let t = &r.temperatures;
        let battery_inner = r.battery_inner();
        let outer_ambient = r.outer_ambient();
        let mut fields = vec![
            r.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            format!("{:.4}", r.ambient_c),
            format!("{:.2}", r.irradiance_w_m2),
            format!("{:.2}", r.load_w),
            r.relative_humidity_pct
                .map_or_else(String::new, |rh| format!("{rh:.2}")),
            format!("{:.6}", t.battery),
            format!("{:.6}", t.inner_wall),
            format!("{:.6}", t.outer_wall),
            r.heater_on.to_string(),
            format!("{:.3}", r.heater_energy_j),
            format!("{:.3}", r.heater_to_battery_j),
            format!("{:.3}", r.heater_to_air_j),
            format!("{:.3}", r.battery_loss_heat_j),
            format!("{:.3}", battery_inner.conduction),
            format!("{:.3}", battery_inner.convection),
            format!("{:.3}", battery_inner.radiation),
            format!("{:.3}", r.inner_outer_conduction_j),
            format!("{:.3}", outer_ambient.conduction),
            format!("{:.3}", outer_ambient.convection),
            format!("{:.3}", outer_ambient.radiation),
            format!("{:.3}", r.solar_gain_j),
            format!("{:.3}", r.node_net_j.battery),
            format!("{:.3}", r.node_net_j.inner_wall),
            format!("{:.3}", r.node_net_j.outer_wall),
            format!("{:.3}", r.cumulative_j.battery),
            format!("{:.3}", r.cumulative_j.inner_wall),
            format!("{:.3}", r.cumulative_j.outer_wall),
            r.substeps.to_string(),
        ];
        push_faces(&mut fields, &r.battery_faces);
        push_faces(&mut fields, &r.container_faces);
        wtr.write_record(&fields)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports the run summary as pretty-printed JSON.
///
/// # Errors
///
/// Returns an I/O or JSON error if file creation or serialization fails.
pub fn export_summary_json(summary: &RunSummary, path: &Path) -> Result<(), SimError> {
    let file = File::create(path)?;
    write_summary_json(summary, io::BufWriter::new(file))
}

/// Writes the run summary as pretty-printed JSON to any writer.
///
/// # Errors
///
/// Returns a JSON error if serialization fails.
pub fn write_summary_json(summary: &RunSummary, mut writer: impl Write) -> Result<(), SimError> {
    serde_json::to_writer_pretty(&mut writer, summary)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::clock::Interval;
    use crate::sim::types::{NodeTemperatures, PerNode};
    use chrono::{Duration, NaiveDate};

    fn make_row(i: i64) -> ResultRow {
        let ts = NaiveDate::from_ymd_opt(2025, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid date")
            + Duration::minutes(i);
        ResultRow {
            timestamp: ts,
            ambient_c: -2.0,
            irradiance_w_m2: 0.0,
            load_w: 400.0,
            relative_humidity_pct: if i == 0 { Some(87.0) } else { None },
            temperatures: NodeTemperatures::new(4.5, 1.0, -1.5),
            heater_on: i % 2 == 0,
            heater_energy_j: 1800.0,
            heater_to_battery_j: 1440.0,
            heater_to_air_j: 360.0,
            battery_loss_heat_j: 720.0,
            battery_faces: FaceMap::from_fn(|f| match f {
                Face::Bottom => Mechanisms {
                    conduction: 100.0,
                    convection: 0.0,
                    radiation: 5.0,
                },
                Face::Top => Mechanisms {
                    conduction: 0.0,
                    convection: 50.0,
                    radiation: 20.0,
                },
                _ => Mechanisms::default(),
            }),
            inner_outer_conduction_j: 160.0,
            container_faces: FaceMap::from_fn(|f| match f {
                Face::Bottom => Mechanisms {
                    conduction: 80.0,
                    convection: 0.0,
                    radiation: 10.0,
                },
                _ => Mechanisms {
                    conduction: 0.0,
                    convection: 8.0,
                    radiation: 4.0,
                },
            }),
            solar_gain_j: 0.0,
            node_net_j: PerNode::new(1985.0, 15.0, 10.0),
            cumulative_j: PerNode::new(1985.0 * (i + 1) as f64, 0.0, 0.0),
            substeps: 1,
        }
    }

    fn csv_text(rows: &[ResultRow]) -> String {
        let mut buf = Vec::new();
        write_csv(rows, &mut buf).expect("writes");
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn header_lists_every_channel() {
        let text = csv_text(&[make_row(0)]);
        let header = text.lines().next().unwrap_or("");
        assert!(header.starts_with("timestamp,ambient_c,"));
        assert!(header.contains("battery_inner_radiation_j"));
        assert!(header.contains("battery_bottom_conduction_j"));
        assert!(header.ends_with("container_west_radiation_j"));
        assert_eq!(header.split(',').count(), 28 + 36);
    }

    #[test]
    fn row_count_matches_step_count() {
        let rows: Vec<ResultRow> = (0..24).map(make_row).collect();
        let text = csv_text(&rows);
        // 1 header + 24 data rows
        assert_eq!(text.lines().count(), 25);
    }

    #[test]
    fn rows_parse_back_with_matching_width() {
        let rows: Vec<ResultRow> = (0..3).map(make_row).collect();
        let text = csv_text(&rows);
        let mut rdr = csv::Reader::from_reader(text.as_bytes());
        let records: Vec<csv::StringRecord> =
            rdr.records().collect::<Result<_, _>>().expect("parses");
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.len() == 64));
        assert_eq!(&records[1][0], "2025-01-01T00:01:00");
        assert_eq!(&records[0][4], "87.00");
        assert_eq!(&records[1][4], "");
        assert_eq!(&records[1][8], "false");
    }

    #[test]
    fn face_columns_carry_row_values_and_sum_to_aggregates() {
        let text = csv_text(&[make_row(0)]);
        let mut rdr = csv::Reader::from_reader(text.as_bytes());
        let header = rdr.headers().expect("header").clone();
        let record = rdr.records().next().expect("row").expect("parses");
        let col = |name: &str| -> f64 {
            let idx = header.iter().position(|h| h == name).expect("column exists");
            record[idx].parse().expect("number")
        };
        assert_eq!(col("battery_bottom_conduction_j"), 100.0);
        assert_eq!(col("battery_top_convection_j"), 50.0);
        assert_eq!(col("battery_north_radiation_j"), 0.0);
        assert_eq!(col("container_bottom_radiation_j"), 10.0);
        assert_eq!(col("battery_inner_radiation_j"), 25.0);
        assert_eq!(col("outer_ambient_convection_j"), 40.0);
    }

    #[test]
    fn deterministic_output() {
        let rows: Vec<ResultRow> = (0..5).map(make_row).collect();
        assert_eq!(csv_text(&rows), csv_text(&rows));
    }

    #[test]
    fn summary_json_has_fields() {
        let rows: Vec<ResultRow> = (0..4).map(make_row).collect();
        let summary = RunSummary::from_rows(&rows, Interval::Minute);
        let mut buf = Vec::new();
        write_summary_json(&summary, &mut buf).expect("writes");
        let value: serde_json::Value = serde_json::from_slice(&buf).expect("valid JSON");
        assert_eq!(value["steps"], 4);
        assert_eq!(value["interval"], "1m");
        assert_eq!(value["heater_activations"], 2);
        assert!(value["node_net_j"]["battery"].is_number());
    }
}
