//! CSV tables for gaze samples and classified events.
//!
//! Column layouts:
//! - binocular samples: `T, LX, LY, RX, RY`
//! - samples with clusters: `Frame, Left Eye H, Left Eye V, Right Eye H,
//!   Right Eye V, Avg H, Avg V, Fixation`
//! - saccades: `StartX, StartY, EndX, EndY[, Label]`
//!
//! Absent values are written as empty cells. Noise is written as `-1`.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim, Writer};
use tracing::info;

use crate::assembler::{GazeSample, GazeSequence};
use crate::detect::{DensityEvents, FixationRecord, SaccadeRecord};
use crate::error::{Error, Result};
use crate::types::Point;

pub const FIXATION_HEADERS: [&str; 5] = ["T", "LX", "LY", "RX", "RY"];

pub const SAMPLE_HEADERS: [&str; 8] = [
    "Frame",
    "Left Eye H",
    "Left Eye V",
    "Right Eye H",
    "Right Eye V",
    "Avg H",
    "Avg V",
    "Fixation",
];

pub const SACCADE_HEADERS: [&str; 5] = ["StartX", "StartY", "EndX", "EndY", "Label"];

/// Cluster value written for noise samples.
pub const NOISE_LABEL: i64 = -1;

/// Column positions of one input layout.
struct SampleColumns {
    index: usize,
    left_x: Option<usize>,
    left_y: Option<usize>,
    right_x: Option<usize>,
    right_y: Option<usize>,
}

impl SampleColumns {
    fn locate(headers: &StringRecord) -> Result<Self> {
        fn find(headers: &StringRecord, names: &[&str]) -> Option<usize> {
            headers.iter().position(|h| names.iter().any(|n| *n == h))
        }

        let index = find(headers, &["T", "Frame"]).ok_or_else(|| Error::SampleFormat {
            line: 1,
            message: "expected a `T` or `Frame` column".into(),
        })?;

        let columns = Self {
            index,
            left_x: find(headers, &["LX", "Left Eye H"]),
            left_y: find(headers, &["LY", "Left Eye V"]),
            right_x: find(headers, &["RX", "Right Eye H"]),
            right_y: find(headers, &["RY", "Right Eye V"]),
        };

        if columns.left_x.is_none() && columns.right_x.is_none() {
            return Err(Error::SampleFormat {
                line: 1,
                message: "no pupil coordinate columns found".into(),
            });
        }
        Ok(columns)
    }
}

/// Read a gaze sequence from CSV in either the `T, LX, ...` or the
/// `Frame, Left Eye H, ...` layout. Averages in the input are ignored and
/// recomputed.
///
/// The `T`/`Frame` column must hold non-negative integers (`3.0` is accepted).
/// Fractional timestamps such as `0.5` are rejected with
/// [`Error::SampleFormat`]; convert timed recordings to frame ordinals first.
pub fn read_samples<R: Read>(reader: R) -> Result<GazeSequence> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let columns = SampleColumns::locate(reader.headers()?)?;
    let mut sequence = GazeSequence::new();

    for (row, record) in reader.records().enumerate() {
        // +1 for header, +1 for 1-based lines
        let line = row + 2;
        let record = record?;

        let index = parse_index(record.get(columns.index), line)?;
        let left = parse_point(&record, columns.left_x, columns.left_y, line)?;
        let right = parse_point(&record, columns.right_x, columns.right_y, line)?;

        sequence.push(GazeSample::new(index, left, right))?;
    }

    Ok(sequence)
}

pub fn read_samples_file<P: AsRef<Path>>(path: P) -> Result<GazeSequence> {
    let file = File::open(path.as_ref())?;
    let sequence = read_samples(file)?;
    info!(
        "Loaded {} samples from {}",
        sequence.len(),
        path.as_ref().display()
    );
    Ok(sequence)
}

fn parse_index(cell: Option<&str>, line: usize) -> Result<usize> {
    let cell = cell.unwrap_or("");
    if let Ok(i) = cell.parse::<usize>() {
        return Ok(i);
    }
    match cell.parse::<f64>() {
        Ok(v) if v >= 0.0 && v.fract() == 0.0 && v <= usize::MAX as f64 => Ok(v as usize),
        _ => Err(Error::SampleFormat {
            line,
            message: format!("index must be a non-negative integer, got {:?}", cell),
        }),
    }
}

fn parse_coordinate(cell: Option<&str>, line: usize) -> Result<Option<f64>> {
    let cell = match cell {
        Some(c) if !c.is_empty() => c,
        _ => return Ok(None),
    };
    let value: f64 = cell.parse().map_err(|e| Error::SampleFormat {
        line,
        message: format!("invalid coordinate {:?}: {}", cell, e),
    })?;
    Ok(value.is_finite().then_some(value))
}

/// Both coordinates of an eye, or `None` if either is missing.
fn parse_point(
    record: &StringRecord,
    x_col: Option<usize>,
    y_col: Option<usize>,
    line: usize,
) -> Result<Option<Point>> {
    let x = parse_coordinate(x_col.and_then(|c| record.get(c)), line)?;
    let y = parse_coordinate(y_col.and_then(|c| record.get(c)), line)?;
    Ok(match (x, y) {
        (Some(x), Some(y)) => Some(Point::new(x, y)),
        _ => None,
    })
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn fixation_cells(f: &FixationRecord) -> [String; 5] {
    [
        f.index.to_string(),
        f.left.x.to_string(),
        f.left.y.to_string(),
        f.right.x.to_string(),
        f.right.y.to_string(),
    ]
}

fn saccade_cells(s: &SaccadeRecord, with_label: bool) -> Vec<String> {
    let mut cells = vec![
        s.start.x.to_string(),
        s.start.y.to_string(),
        s.end.x.to_string(),
        s.end.y.to_string(),
    ];
    if with_label {
        cells.push(s.label.map(|l| l.to_string()).unwrap_or_default());
    }
    cells
}

fn saccade_headers(with_label: bool) -> &'static [&'static str] {
    if with_label {
        &SACCADE_HEADERS
    } else {
        &SACCADE_HEADERS[..4]
    }
}

/// Write the full sample timeline, one row per sample.
///
/// With `clusters`, a `Fixation` column holds each sample's cluster id, `-1`
/// for noise, and stays empty for samples that took no part in clustering.
pub fn write_samples<W: Write>(
    writer: W,
    sequence: &GazeSequence,
    clusters: Option<&DensityEvents>,
) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);
    let headers = if clusters.is_some() {
        &SAMPLE_HEADERS[..]
    } else {
        &SAMPLE_HEADERS[..7]
    };
    wtr.write_record(headers)?;

    for sample in sequence {
        let avg = sample.avg();
        let mut row = vec![
            sample.index.to_string(),
            cell(sample.left.map(|p| p.x)),
            cell(sample.left.map(|p| p.y)),
            cell(sample.right.map(|p| p.x)),
            cell(sample.right.map(|p| p.y)),
            cell(avg.map(|p| p.x)),
            cell(avg.map(|p| p.y)),
        ];
        if let Some(events) = clusters {
            row.push(match events.cluster_of(sample.index) {
                Some(Some(id)) => id.to_string(),
                Some(None) => NOISE_LABEL.to_string(),
                None => String::new(),
            });
        }
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_fixations<W: Write>(writer: W, fixations: &[FixationRecord]) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(FIXATION_HEADERS)?;
    for f in fixations {
        wtr.write_record(fixation_cells(f))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_saccades<W: Write>(
    writer: W,
    saccades: &[SaccadeRecord],
    with_label: bool,
) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(saccade_headers(with_label))?;
    for s in saccades {
        wtr.write_record(saccade_cells(s, with_label))?;
    }
    wtr.flush()?;
    Ok(())
}

/// One row of the positional merge of fixations and saccades.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergedRow<'a> {
    pub fixation: Option<&'a FixationRecord>,
    pub saccade: Option<&'a SaccadeRecord>,
}

/// Pair the n-th fixation with the n-th saccade.
///
/// This is a zip by row position, padded to the longer input: rows sharing a
/// position do not share a timestamp.
pub fn merge_positional<'a>(
    fixations: &'a [FixationRecord],
    saccades: &'a [SaccadeRecord],
) -> Vec<MergedRow<'a>> {
    let len = fixations.len().max(saccades.len());
    (0..len)
        .map(|i| MergedRow {
            fixation: fixations.get(i),
            saccade: saccades.get(i),
        })
        .collect()
}

pub fn write_merged<W: Write>(
    writer: W,
    fixations: &[FixationRecord],
    saccades: &[SaccadeRecord],
    with_label: bool,
) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);
    let saccade_cols = saccade_headers(with_label);

    let mut headers: Vec<&str> = FIXATION_HEADERS.to_vec();
    headers.extend_from_slice(saccade_cols);
    wtr.write_record(&headers)?;

    for row in merge_positional(fixations, saccades) {
        let mut cells: Vec<String> = match row.fixation {
            Some(f) => fixation_cells(f).to_vec(),
            None => vec![String::new(); FIXATION_HEADERS.len()],
        };
        match row.saccade {
            Some(s) => cells.extend(saccade_cells(s, with_label)),
            None => cells.extend(std::iter::repeat(String::new()).take(saccade_cols.len())),
        }
        wtr.write_record(&cells)?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{DensityConfig, DensityDetector, EventDetector};

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> Result<()>,
    {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn fixation(index: usize) -> FixationRecord {
        FixationRecord {
            index,
            left: Point::new(1.0, 2.0),
            right: Point::new(3.0, 4.0),
        }
    }

    fn saccade(x: f64) -> SaccadeRecord {
        SaccadeRecord::new(Point::new(x, 0.0), Point::new(x + 20.0, 0.5)).with_label(1)
    }

    #[test]
    fn reads_threshold_layout() {
        let csv = "T,LX,LY,RX,RY\n0,10,20,70,20\n1,,,,\n2,11.5,20,71,21\n";
        let seq = read_samples(csv.as_bytes()).unwrap();
        assert_eq!(seq.len(), 3);
        assert_eq!(seq.samples()[0].left, Some(Point::new(10.0, 20.0)));
        assert_eq!(seq.samples()[1], GazeSample::absent(1));
        assert_eq!(seq.samples()[2].avg(), Some(Point::new(41.25, 20.5)));
    }

    #[test]
    fn reads_frame_layout_and_recomputes_average() {
        let csv = "Frame,Left Eye H,Left Eye V,Right Eye H,Right Eye V,Avg H,Avg V\n\
                   1,100,50,160,52,999,999\n\
                   2,101,,160,52,,\n";
        let seq = read_samples(csv.as_bytes()).unwrap();
        assert_eq!(seq.samples()[0].avg(), Some(Point::new(130.0, 51.0)));
        // A half-present eye counts as absent
        assert_eq!(seq.samples()[1].left, None);
        assert_eq!(seq.samples()[1].right, Some(Point::new(160.0, 52.0)));
    }

    #[test]
    fn nan_cells_are_absent() {
        let csv = "T,LX,LY,RX,RY\n0,NaN,1,2,3\n";
        let seq = read_samples(csv.as_bytes()).unwrap();
        assert_eq!(seq.samples()[0].left, None);
    }

    #[test]
    fn reports_line_of_bad_cell() {
        let csv = "T,LX,LY,RX,RY\n0,1,1,1,1\n1,x,1,1,1\n";
        let err = read_samples(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::SampleFormat { line: 3, .. }));
    }

    #[test]
    fn missing_index_column_is_rejected() {
        let err = read_samples("LX,LY\n1,2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::SampleFormat { line: 1, .. }));
    }

    #[test]
    fn fractional_index_is_rejected() {
        let err = read_samples("T,LX,LY,RX,RY\n0.5,1,1,1,1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::SampleFormat { line: 2, .. }));
        assert!(read_samples("T,LX,LY,RX,RY\n3.0,1,1,1,1\n".as_bytes()).is_ok());
    }

    #[test]
    fn unordered_rows_are_rejected() {
        let csv = "T,LX,LY,RX,RY\n2,1,1,1,1\n1,1,1,1,1\n";
        let err = read_samples(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::OutOfOrder { index: 1, previous: 2 }));
    }

    #[test]
    fn samples_table_marks_noise_and_absence() {
        let mut seq = GazeSequence::new();
        let eyes = |x: f64| (Some(Point::new(x, 0.0)), Some(Point::new(x + 2.0, 0.0)));
        for (i, x) in [(1, 0.0), (2, 1.0), (4, 90.0)] {
            let (l, r) = eyes(x);
            seq.push(GazeSample::new(i, l, r)).unwrap();
            if i == 2 {
                seq.push(GazeSample::absent(3)).unwrap();
            }
        }
        let events = DensityDetector::new(DensityConfig {
            eps: 5.0,
            min_samples: 2,
            saccade_distance: 5.0,
        })
        .detect(&seq);

        let out = render(|buf| write_samples(buf, &seq, Some(&events)));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines[0],
            "Frame,Left Eye H,Left Eye V,Right Eye H,Right Eye V,Avg H,Avg V,Fixation"
        );
        assert_eq!(lines[1], "1,0,0,2,0,1,0,0");
        assert_eq!(lines[3], "3,,,,,,,");
        assert_eq!(lines[4], "4,90,0,92,0,91,0,-1");
    }

    #[test]
    fn samples_table_without_clusters_has_seven_columns() {
        let mut seq = GazeSequence::new();
        seq.push(GazeSample::new(1, Some(Point::new(1.0, 1.0)), None))
            .unwrap();
        let out = render(|buf| write_samples(buf, &seq, None));
        assert_eq!(out.lines().nth(1), Some("1,1,1,,,,"));
    }

    #[test]
    fn saccade_label_column_is_optional() {
        let s = [saccade(0.0)];
        let labeled = render(|buf| write_saccades(buf, &s, true));
        assert_eq!(labeled, "StartX,StartY,EndX,EndY,Label\n0,0,20,0.5,1\n");

        let plain = render(|buf| write_saccades(buf, &s, false));
        assert_eq!(plain, "StartX,StartY,EndX,EndY\n0,0,20,0.5\n");
    }

    #[test]
    fn merge_length_is_longer_input() {
        let fix = vec![fixation(1), fixation(2), fixation(5)];
        let sac = vec![saccade(0.0)];
        let merged = merge_positional(&fix, &sac);
        assert_eq!(merged.len(), 3);
        assert!(merged[0].saccade.is_some());
        assert!(merged[2].saccade.is_none());

        assert_eq!(merge_positional(&[], &sac).len(), 1);
        assert!(merge_positional(&[], &[]).is_empty());
    }

    #[test]
    fn merged_table_pads_with_empty_cells() {
        let fix = vec![fixation(7)];
        let sac = vec![saccade(0.0), saccade(40.0)];
        let out = render(|buf| write_merged(buf, &fix, &sac, true));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "T,LX,LY,RX,RY,StartX,StartY,EndX,EndY,Label");
        assert_eq!(lines[1], "7,1,2,3,4,0,0,20,0.5,1");
        assert_eq!(lines[2], ",,,,,40,0,60,0.5,1");
        assert_eq!(lines.len(), 3);
    }
}
