//! Tab-separated dataset loader.
//!
//! # Directory layout
//!
//! | File                                             | Required | Header |
//! |--------------------------------------------------|----------|--------|
//! | `nodeID-lat-lon.tab`                             | yes      | no     |
//! | `roadID-roadInfo.tab`                            | yes      | yes    |
//! | `roadSeg-roadID-length-nodeID-nodeID-coords.tab` | yes      | yes    |
//! | `restrictions.tab`                               | no       | yes    |
//! | `traffic-lights.tab`                             | no       | yes    |
//!
//! Columns are tab-separated with no quoting.  Segment rows have variable
//! length: four fixed columns followed by `lat lon` pairs.  Flags are `1` for
//! true; any other value is false.
//!
//! The traffic-light file is the odd one out: `lon lat` separated by any
//! whitespace, with rows of fewer than two fields ignored.
//!
//! A missing or malformed mandatory file fails the load.  Optional files are
//! best-effort: absent means empty, malformed means the whole section is
//! skipped with a warning.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use log::{debug, info, warn};
use serde::{Deserialize, Deserializer};

use rn_core::{LatLon, NodeId, RoadId};

use crate::error::{LoadError, LoadResult};
use crate::records::{Dataset, NodeRecord, RestrictionRecord, RoadInfoRecord, SegmentRecord};

pub const NODES_FILE:        &str = "nodeID-lat-lon.tab";
pub const ROADS_FILE:        &str = "roadID-roadInfo.tab";
pub const SEGMENTS_FILE:     &str = "roadSeg-roadID-length-nodeID-nodeID-coords.tab";
pub const RESTRICTIONS_FILE: &str = "restrictions.tab";
pub const LIGHTS_FILE:       &str = "traffic-lights.tab";

// ── CSV rows ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct NodeRow {
    id:  u32,
    lat: f64,
    lon: f64,
}

#[derive(Deserialize)]
struct RoadRow {
    id:          u32,
    kind:        i32,
    label:       String,
    city:        String,
    #[serde(deserialize_with = "flag")]
    one_way:     bool,
    speed_class: i32,
    road_class:  i32,
    #[serde(deserialize_with = "flag")]
    not_for_cars: bool,
    #[serde(deserialize_with = "flag")]
    not_for_pedestrians: bool,
    #[serde(deserialize_with = "flag")]
    not_for_cyclists: bool,
}

#[derive(Deserialize)]
struct RestrictionRow {
    from_node: u32,
    from_road: u32,
    via:       u32,
    to_road:   u32,
    to_node:   u32,
}

fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    let s = String::deserialize(d)?;
    Ok(s == "1")
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Read every section of a dataset directory.
///
/// # Errors
///
/// [`LoadError::Io`] if a mandatory file cannot be opened, or the parse error
/// of the first malformed mandatory row.
pub fn load_dataset_dir(dir: &Path) -> LoadResult<Dataset> {
    let nodes    = read_nodes(open(&dir.join(NODES_FILE))?)?;
    let roads    = read_roads(open(&dir.join(ROADS_FILE))?)?;
    let segments = read_segments(open(&dir.join(SEGMENTS_FILE))?)?;

    let restrictions   = optional(dir, RESTRICTIONS_FILE, read_restrictions);
    let traffic_lights = optional(dir, LIGHTS_FILE, read_traffic_lights);

    info!(
        "read {}: {} nodes, {} roads, {} segments, {} restrictions, {} traffic lights",
        dir.display(),
        nodes.len(),
        roads.len(),
        segments.len(),
        restrictions.len(),
        traffic_lights.len(),
    );

    Ok(Dataset { nodes, roads, segments, restrictions, traffic_lights })
}

/// Node rows: `id  lat  lon`, no header.
pub fn read_nodes<R: Read>(reader: R) -> LoadResult<Vec<NodeRecord>> {
    deserialize_rows(reader, NODES_FILE, false, |row: NodeRow| NodeRecord {
        id:       NodeId(row.id),
        position: LatLon::new(row.lat, row.lon),
    })
}

/// Road info rows, one header line.
pub fn read_roads<R: Read>(reader: R) -> LoadResult<Vec<RoadInfoRecord>> {
    deserialize_rows(reader, ROADS_FILE, true, |row: RoadRow| RoadInfoRecord {
        id:                  RoadId(row.id),
        kind:                row.kind,
        label:               row.label,
        city:                row.city,
        one_way:             row.one_way,
        speed_class:         row.speed_class,
        road_class:          row.road_class,
        not_for_cars:        row.not_for_cars,
        not_for_pedestrians: row.not_for_pedestrians,
        not_for_cyclists:    row.not_for_cyclists,
    })
}

/// Segment rows, one header line.  Rows are variable length.
pub fn read_segments<R: Read>(reader: R) -> LoadResult<Vec<SegmentRecord>> {
    let mut rdr = tab_reader(reader);
    let mut out = Vec::new();

    for result in rdr.records().skip(1) {
        let rec = result.map_err(|source| LoadError::Csv { file: SEGMENTS_FILE, source })?;
        let line = line_of(&rec);
        if rec.len() < 4 || rec.len() % 2 != 0 {
            return Err(LoadError::Parse {
                file:    SEGMENTS_FILE,
                line,
                message: format!("expected 4 fields plus lat/lon pairs, found {} fields", rec.len()),
            });
        }

        let polyline = (4..rec.len())
            .step_by(2)
            .map(|i| {
                Ok(LatLon::new(
                    field(&rec, i, SEGMENTS_FILE)?,
                    field(&rec, i + 1, SEGMENTS_FILE)?,
                ))
            })
            .collect::<LoadResult<Vec<_>>>()?;

        out.push(SegmentRecord {
            road:   RoadId(field(&rec, 0, SEGMENTS_FILE)?),
            length: field(&rec, 1, SEGMENTS_FILE)?,
            node1:  NodeId(field(&rec, 2, SEGMENTS_FILE)?),
            node2:  NodeId(field(&rec, 3, SEGMENTS_FILE)?),
            polyline,
        });
    }
    Ok(out)
}

/// Restriction rows, one header line.
pub fn read_restrictions<R: Read>(reader: R) -> LoadResult<Vec<RestrictionRecord>> {
    deserialize_rows(reader, RESTRICTIONS_FILE, true, |row: RestrictionRow| RestrictionRecord {
        from_node: NodeId(row.from_node),
        from_road: RoadId(row.from_road),
        via:       NodeId(row.via),
        to_road:   RoadId(row.to_road),
        to_node:   NodeId(row.to_node),
    })
}

/// Traffic-light rows: `lon lat`, whitespace separated, one header line.
pub fn read_traffic_lights<R: Read>(reader: R) -> LoadResult<Vec<LatLon>> {
    let mut out = Vec::new();
    for (i, line) in BufReader::new(reader).lines().enumerate().skip(1) {
        let line = line.map_err(|source| LoadError::Io { path: LIGHTS_FILE.into(), source })?;
        let mut parts = line.split_whitespace();
        let (Some(lon), Some(lat)) = (parts.next(), parts.next()) else {
            continue;
        };
        let parse = |s: &str| {
            s.parse::<f64>().map_err(|e| LoadError::Parse {
                file:    LIGHTS_FILE,
                line:    i as u64 + 1,
                message: format!("{s:?}: {e}"),
            })
        };
        out.push(LatLon::new(parse(lat)?, parse(lon)?));
    }
    Ok(out)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn open(path: &Path) -> LoadResult<File> {
    File::open(path).map_err(|source| LoadError::Io { path: path.to_path_buf(), source })
}

/// Read an optional section, degrading to empty on any failure.
fn optional<T, F>(dir: &Path, name: &str, read: F) -> Vec<T>
where
    F: FnOnce(File) -> LoadResult<Vec<T>>,
{
    let path = dir.join(name);
    if !path.is_file() {
        debug!("{name} not present; section left empty");
        return Vec::new();
    }
    match open(&path).and_then(read) {
        Ok(rows) => rows,
        Err(e) => {
            warn!("skipping {name}: {e}");
            Vec::new()
        }
    }
}

fn tab_reader<R: Read>(reader: R) -> csv::Reader<R> {
    // Headers are skipped by hand; the files' header text is not a usable
    // schema.
    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn deserialize_rows<R, Row, T, F>(
    reader: R,
    file: &'static str,
    header: bool,
    mut convert: F,
) -> LoadResult<Vec<T>>
where
    R: Read,
    Row: for<'de> Deserialize<'de>,
    F: FnMut(Row) -> T,
{
    let mut rdr = tab_reader(reader);
    let mut out = Vec::new();
    for result in rdr.records().skip(header as usize) {
        let rec = result.map_err(|source| LoadError::Csv { file, source })?;
        let row: Row = rec.deserialize(None).map_err(|e| LoadError::Parse {
            file,
            line:    line_of(&rec),
            message: e.to_string(),
        })?;
        out.push(convert(row));
    }
    Ok(out)
}

fn field<T>(rec: &csv::StringRecord, i: usize, file: &'static str) -> LoadResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = rec.get(i).unwrap_or_default();
    raw.parse().map_err(|e: T::Err| LoadError::Parse {
        file,
        line:    line_of(rec),
        message: format!("field {}: {raw:?}: {e}", i + 1),
    })
}

fn line_of(rec: &csv::StringRecord) -> u64 {
    rec.position().map_or(0, |p| p.line())
}
