//! # Calibration files
//!
//! Two layouts are supported:
//!
//! - CSV, holding a whole calibration sweep:
//!
//!   ```text
//!   Desired_Angle,Actual_Angle_Shoulder,Actual_Angle_Elbow
//!   0,0.8,-0.4
//!   10,10.5,9.7
//!   ```
//!
//! - Pairs, holding the errors of a single joint as whitespace separated
//!   `angle error` lines with no header.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use csv::{ReaderBuilder, Trim, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    fs::File,
    io::{self, BufRead, BufReader, Write},
    path::{Path, PathBuf},
    str::FromStr,
};

// Internal
use super::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Header row of a CSV calibration file.
pub const CSV_HEADER: [&str; 3] = [
    "Desired_Angle",
    "Actual_Angle_Shoulder",
    "Actual_Angle_Elbow",
];

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Layout of a calibration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalibFormat {
    Csv,
    Pairs,
}

/// Where the calibration table of the arm is loaded from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum CalibSource {
    /// A single CSV file calibrating both joints.
    Csv { path: PathBuf },

    /// One pairs file per joint. A joint with no file is left uncalibrated.
    Pairs {
        shoulder: Option<PathBuf>,
        elbow: Option<PathBuf>,
    },
}

/// Errors associated with reading and writing calibration files.
#[derive(Debug, thiserror::Error)]
pub enum CalibFileError {
    #[error("Cannot open calibration file {0:?}: {1}")]
    Open(PathBuf, io::Error),

    #[error("IO error on calibration file: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid CSV calibration data: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid calibration pair on line {line}: \"{content}\"")]
    Parse { line: usize, content: String },

    #[error("Invalid calibration data: {0}")]
    Calib(#[from] CalibError),

    #[error("Unknown calibration file format \"{0}\", expected \"csv\" or \"pairs\"")]
    UnknownFormat(String),

    #[error(
        "Cannot resolve the relative calibration file {0:?}, the software root \
         environment variable (ARM_SW_ROOT) is not set"
    )]
    SwRootNotSet(PathBuf),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CalibSource {
    /// Load the calibration table from this source.
    ///
    /// Relative paths are resolved against `$ARM_SW_ROOT`, the same way
    /// parameter files are. Absolute paths are used as given.
    pub fn load(&self) -> Result<CalibTable, CalibFileError> {
        let root = util::host::get_arm_sw_root().ok();
        self.load_from(root.as_deref())
    }

    /// Load the calibration table, resolving relative paths against `root`.
    pub fn load_relative_to<P: AsRef<Path>>(&self, root: P) -> Result<CalibTable, CalibFileError> {
        self.load_from(Some(root.as_ref()))
    }

    fn load_from(&self, root: Option<&Path>) -> Result<CalibTable, CalibFileError> {
        match self {
            CalibSource::Csv { path } => {
                let rows = read_csv(open(&resolve(path, root)?)?)?;
                Ok(CalibTable::from_rows(&rows)?)
            }
            CalibSource::Pairs { shoulder, elbow } => {
                let mut builder = CalibTable::builder();

                for (joint, path) in [(JointId::Shoulder, shoulder), (JointId::Elbow, elbow)].iter() {
                    if let Some(p) = path {
                        let entries = read_pairs(BufReader::new(open(&resolve(p, root)?)?))?;
                        builder = builder.joint_errors(*joint, entries)?;
                    }
                }

                Ok(builder.build())
            }
        }
    }
}

impl fmt::Display for CalibFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibFormat::Csv => write!(f, "csv"),
            CalibFormat::Pairs => write!(f, "pairs"),
        }
    }
}

impl FromStr for CalibFormat {
    type Err = CalibFileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(CalibFormat::Csv),
            "pairs" => Ok(CalibFormat::Pairs),
            _ => Err(CalibFileError::UnknownFormat(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Read the rows of a CSV calibration file.
pub fn read_csv<R: io::Read>(reader: R) -> Result<Vec<CalibRow>, CalibFileError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for result in rdr.deserialize::<CalibRow>() {
        rows.push(result?);
    }

    Ok(rows)
}

/// Write rows as a CSV calibration file. The header is always written, even
/// when there are no rows.
pub fn write_csv<W: io::Write>(writer: W, rows: &[CalibRow]) -> Result<(), CalibFileError> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);

    wtr.write_record(&CSV_HEADER)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;

    Ok(())
}

/// Read the entries of a pairs calibration file.
///
/// Blank lines and lines starting with `#` are skipped.
pub fn read_pairs<R: BufRead>(reader: R) -> Result<Vec<TableEntry>, CalibFileError> {
    let mut entries = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let parse_err = || CalibFileError::Parse {
            line: i + 1,
            content: line.clone(),
        };

        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() != 2 {
            return Err(parse_err());
        }

        let desired_deg: f64 = fields[0].parse().map_err(|_| parse_err())?;
        let error_deg: f64 = fields[1].parse().map_err(|_| parse_err())?;

        entries.push(TableEntry {
            desired_deg,
            error_deg,
        });
    }

    Ok(entries)
}

/// Write the entries of one joint as a pairs calibration file.
pub fn write_pairs<W: Write>(
    mut writer: W,
    table: &CalibTable,
    joint: JointId,
) -> Result<(), CalibFileError> {
    for e in table.entries(joint) {
        writeln!(writer, "{} {}", e.desired_deg, e.error_deg)?;
    }
    writer.flush()?;

    Ok(())
}

/// Create (or truncate) a CSV calibration file at the given path and write
/// the rows into it.
pub fn save_csv<P: AsRef<Path>>(path: P, rows: &[CalibRow]) -> Result<(), CalibFileError> {
    let file = File::create(path.as_ref())
        .map_err(|e| CalibFileError::Open(path.as_ref().to_path_buf(), e))?;

    write_csv(file, rows)
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn resolve(path: &Path, root: Option<&Path>) -> Result<PathBuf, CalibFileError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }

    match root {
        Some(r) => Ok(r.join(path)),
        None => Err(CalibFileError::SwRootNotSet(path.to_path_buf())),
    }
}

fn open(path: &Path) -> Result<File, CalibFileError> {
    File::open(path).map_err(|e| CalibFileError::Open(path.to_path_buf(), e))
}

#[cfg(test)]
mod test {
    use super::*;

    const CSV_DATA: &str = "Desired_Angle,Actual_Angle_Shoulder,Actual_Angle_Elbow
0,0.8,-0.4
10,10.5,9.75
20, 19.0, 20.25
";

    #[test]
    fn test_read_csv() {
        let rows = read_csv(CSV_DATA.as_bytes()).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[2],
            CalibRow {
                desired_deg: 20.0,
                actual_shoulder_deg: 19.0,
                actual_elbow_deg: 20.25
            }
        );

        let table = CalibTable::from_rows(&rows).unwrap();
        assert_eq!(table.compensate(JointId::Elbow, 10.0), Ok(9.75));
    }

    #[test]
    fn test_read_csv_bad_value() {
        let data = "Desired_Angle,Actual_Angle_Shoulder,Actual_Angle_Elbow\n0,abc,1\n";
        assert!(matches!(
            read_csv(data.as_bytes()),
            Err(CalibFileError::Csv(_))
        ));
    }

    #[test]
    fn test_write_then_read_csv() {
        let rows = read_csv(CSV_DATA.as_bytes()).unwrap();

        let mut buf = Vec::new();
        write_csv(&mut buf, &rows).unwrap();

        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("Desired_Angle,Actual_Angle_Shoulder,Actual_Angle_Elbow\n"));
        assert_eq!(read_csv(buf.as_slice()).unwrap(), rows);
    }

    #[test]
    fn test_write_csv_empty() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &[]).unwrap();

        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "Desired_Angle,Actual_Angle_Shoulder,Actual_Angle_Elbow\n"
        );
    }

    #[test]
    fn test_read_pairs() {
        let data = "# elbow servo\n0 1.5\n\n  90   -0.5  \n180 0\n";
        let entries = read_pairs(data.as_bytes()).unwrap();

        assert_eq!(
            entries,
            vec![
                TableEntry {
                    desired_deg: 0.0,
                    error_deg: 1.5
                },
                TableEntry {
                    desired_deg: 90.0,
                    error_deg: -0.5
                },
                TableEntry {
                    desired_deg: 180.0,
                    error_deg: 0.0
                },
            ]
        );
    }

    #[test]
    fn test_read_pairs_bad_line() {
        match read_pairs("0 1.5\n90\n".as_bytes()) {
            Err(CalibFileError::Parse { line, content }) => {
                assert_eq!(line, 2);
                assert_eq!(content, "90");
            }
            r => panic!("Expected a parse error, got {:?}", r),
        }

        assert!(matches!(
            read_pairs("0 one\n".as_bytes()),
            Err(CalibFileError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn test_write_pairs() {
        let table = CalibTable::builder()
            .joint_errors(
                JointId::Shoulder,
                vec![
                    TableEntry {
                        desired_deg: 90.0,
                        error_deg: -0.5,
                    },
                    TableEntry {
                        desired_deg: 0.0,
                        error_deg: 1.5,
                    },
                ],
            )
            .unwrap()
            .build();

        let mut buf = Vec::new();
        write_pairs(&mut buf, &table, JointId::Shoulder).unwrap();

        assert_eq!(String::from_utf8(buf).unwrap(), "0 1.5\n90 -0.5\n");
    }

    #[test]
    fn test_calib_source_from_toml() {
        let csv: CalibSource = util::params::parse("format = \"csv\"\npath = \"calib.txt\"\n").unwrap();
        assert_eq!(
            csv,
            CalibSource::Csv {
                path: PathBuf::from("calib.txt")
            }
        );

        let pairs: CalibSource =
            util::params::parse("format = \"pairs\"\nelbow = \"elbow.txt\"\n").unwrap();
        assert_eq!(
            pairs,
            CalibSource::Pairs {
                shoulder: None,
                elbow: Some(PathBuf::from("elbow.txt"))
            }
        );
    }

    #[test]
    fn test_calib_source_load() {
        let dir = std::env::temp_dir().join("arm_calib_file_test");
        std::fs::create_dir_all(&dir).unwrap();

        let csv_path = dir.join("calibration_data_test.txt");
        std::fs::write(&csv_path, CSV_DATA).unwrap();
        let table = CalibSource::Csv { path: csv_path }.load().unwrap();
        assert_eq!(table.range(JointId::Shoulder), Some((0.0, 20.0)));

        let elbow_path = dir.join("elbow_pairs.txt");
        std::fs::write(&elbow_path, "0 1\n90 -1\n").unwrap();
        let table = CalibSource::Pairs {
            shoulder: None,
            elbow: Some(elbow_path),
        }
        .load()
        .unwrap();
        assert!(table.is_empty(JointId::Shoulder));
        assert_eq!(table.compensate(JointId::Elbow, 45.0), Ok(45.0));

        let missing = CalibSource::Csv {
            path: dir.join("does_not_exist.txt"),
        };
        assert!(matches!(missing.load(), Err(CalibFileError::Open(_, _))));
    }

    #[test]
    fn test_calib_source_relative_path() {
        let root = std::env::temp_dir().join("arm_calib_file_root_test");
        let calib_dir = root.join("calib");
        std::fs::create_dir_all(&calib_dir).unwrap();

        // Saved the way the calibrate command saves, loaded the way the
        // ArmCtrl params name it
        let rows = read_csv(CSV_DATA.as_bytes()).unwrap();
        save_csv(calib_dir.join("calibration_data_jig01.txt"), &rows).unwrap();

        let source: CalibSource = util::params::parse(
            "format = \"csv\"\npath = \"calib/calibration_data_jig01.txt\"\n",
        )
        .unwrap();
        let table = source.load_relative_to(&root).unwrap();
        assert_eq!(table.compensate(JointId::Shoulder, 10.0), Ok(10.5));

        std::fs::write(calib_dir.join("shoulder_pairs.txt"), "0 2\n180 2\n").unwrap();
        let table = CalibSource::Pairs {
            shoulder: Some(PathBuf::from("calib/shoulder_pairs.txt")),
            elbow: None,
        }
        .load_relative_to(&root)
        .unwrap();
        assert_eq!(table.compensate(JointId::Shoulder, 90.0), Ok(92.0));

        // Absolute paths ignore the root
        let table = CalibSource::Csv {
            path: calib_dir.join("calibration_data_jig01.txt"),
        }
        .load_relative_to("/does/not/exist")
        .unwrap();
        assert_eq!(table.range(JointId::Elbow), Some((0.0, 20.0)));
    }

    #[test]
    fn test_resolve_without_root() {
        assert!(matches!(
            resolve(Path::new("calib/a.txt"), None),
            Err(CalibFileError::SwRootNotSet(_))
        ));
        assert_eq!(
            resolve(Path::new("/calib/a.txt"), None).unwrap(),
            PathBuf::from("/calib/a.txt")
        );
    }

    #[test]
    fn test_calib_format_parse() {
        assert_eq!("CSV".parse::<CalibFormat>().unwrap(), CalibFormat::Csv);
        assert_eq!("pairs".parse::<CalibFormat>().unwrap(), CalibFormat::Pairs);
        assert!("json".parse::<CalibFormat>().is_err());
    }
}
