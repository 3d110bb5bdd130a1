//! Reading simulated detector records
//!
//! Each input file holds one JSON record per line, using the branch names of
//! the reconstruction ntuples. Records are converted to analysis units on the
//! way in: visible energy has the Cherenkov threshold offset removed, and
//! positions go from cm to m.

use crate::{
    config::Flavor,
    error::{ConfigError, DataError},
    event::{Candidate, CandidateFit, Event, NeutronMultiplicity},
    linalg::{scaled, Direction},
    Result,
};

use eyre::WrapErr;
use log::debug;
use serde::Deserialize;

use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    str::FromStr,
};

/// Offset between the reconstructed energy and the visible energy (MeV)
pub const ENERGY_OFFSET: f64 = 0.51;

/// Conversion factor from detector record lengths (cm) to analysis lengths (m)
pub const CM_TO_M: f64 = 0.01;

/// Event as read from an input file, or the reason why it can't be used
pub type EventRecord = std::result::Result<Event, DataError>;

/// One primary event, as stored in the input files
#[derive(Debug, Clone, Deserialize)]
#[allow(non_snake_case)]
struct DetectorRecord {
    pnu: f64,
    erec: f64,
    wall: f64,
    effwall: f64,
    ovaq: f64,
    angle: f64,
    pos: [f64; 3],
    posv: [f64; 3],
    bdir: [f64; 3],
    Neutmode: i32,
    NTrueN: u32,
    NTaggableN: u32,
    NTaggedN: u32,
    #[serde(default)]
    candidates: Vec<CandidateRecord>,
}

/// One neutron capture candidate, as stored in the input files
#[derive(Debug, Clone, Deserialize)]
#[allow(non_snake_case)]
struct CandidateRecord {
    TagOut: f64,
    Label: i32,
    fvx: f64,
    fvy: f64,
    fvz: f64,
    FitT: f64,
    DPrompt: f64,
    NHits: f64,
    NResHits: f64,
    TRMS: f64,
    DWall: f64,
    DWallMeanDir: f64,
    Beta1: f64,
    Beta2: f64,
    Beta3: f64,
    Beta4: f64,
    Beta5: f64,
    OpeningAngleMean: f64,
    OpeningAngleSkew: f64,
    OpeningAngleStdev: f64,
    MeanDirAngleMean: f64,
    MeanDirAngleRMS: f64,
    BurstRatio: f64,
    FitGoodness: f64,
    DarkLikelihood: f64,
}
//
impl From<DetectorRecord> for Event {
    fn from(rec: DetectorRecord) -> Self {
        let [dx, dy, dz] = rec.bdir;
        Event {
            true_energy: rec.pnu,
            reco_energy: rec.erec - ENERGY_OFFSET,
            dwall: rec.wall,
            effwall: rec.effwall,
            ovaq: rec.ovaq,
            angle: rec.angle,
            vertex: scaled(rec.pos, CM_TO_M),
            true_vertex: scaled(rec.posv, CM_TO_M),
            direction: Direction::new(dx, dy, dz),
            interaction_mode: rec.Neutmode,
            multiplicity: NeutronMultiplicity {
                truth: rec.NTrueN,
                taggable: rec.NTaggableN,
                tagged: rec.NTaggedN,
            },
            candidates: rec.candidates.into_iter().map(Candidate::from).collect(),
        }
    }
}
//
impl From<CandidateRecord> for Candidate {
    fn from(rec: CandidateRecord) -> Self {
        Candidate {
            tag_out: rec.TagOut,
            label: rec.Label,
            position: scaled([rec.fvx, rec.fvy, rec.fvz], CM_TO_M),
            capture_time: rec.FitT,
            travel_distance: rec.DPrompt,
            fit: CandidateFit {
                n_hits: rec.NHits,
                n_res_hits: rec.NResHits,
                trms: rec.TRMS,
                dwall: rec.DWall,
                dwall_mean_dir: rec.DWallMeanDir,
                beta: [rec.Beta1, rec.Beta2, rec.Beta3, rec.Beta4, rec.Beta5],
                opening_angle_mean: rec.OpeningAngleMean,
                opening_angle_skew: rec.OpeningAngleSkew,
                opening_angle_stdev: rec.OpeningAngleStdev,
                mean_dir_angle_mean: rec.MeanDirAngleMean,
                mean_dir_angle_rms: rec.MeanDirAngleRMS,
                burst_ratio: rec.BurstRatio,
                fit_goodness: rec.FitGoodness,
                dark_likelihood: rec.DarkLikelihood,
            },
        }
    }
}

/// Decode one line of an input file
pub fn parse_record(line: &str) -> EventRecord {
    serde_json::from_str::<DetectorRecord>(line)
        .map(Event::from)
        .map_err(|e| DataError::MalformedRecord(e.to_string()))
}

/// Streaming reader of the records of a group of input files, in order
///
/// Blank lines are skipped. Undecodable records, including lines which are not
/// valid UTF-8, are yielded as errors so that they get accounted for along
/// with the other events. Failing to open or read a file is fatal.
///
pub struct RecordReader {
    /// Files which remain to be opened
    pending: std::vec::IntoIter<PathBuf>,

    /// File which is currently being read
    current: Option<OpenFile>,

    /// Total size of the input files, in bytes
    total_bytes: u64,

    /// Bytes consumed from the input files so far
    read_bytes: u64,
}
//
impl RecordReader {
    /// Prepare to read a group of files
    pub fn new(paths: &[PathBuf]) -> Result<Self> {
        let mut total_bytes = 0;
        for path in paths {
            let metadata = std::fs::metadata(path)
                .wrap_err_with(|| format!("Failed to open {}", path.display()))?;
            total_bytes += metadata.len();
        }
        Ok(Self {
            pending: paths.to_vec().into_iter(),
            current: None,
            total_bytes,
            read_bytes: 0,
        })
    }

    /// Fraction of the input bytes which have been consumed
    pub fn progress(&self) -> f64 {
        if self.total_bytes == 0 {
            1.
        } else {
            self.read_bytes as f64 / self.total_bytes as f64
        }
    }

    /// Read up to `max_records` records into `chunk`, replacing its contents
    ///
    /// The chunk comes out empty once every file has been read.
    ///
    pub fn read_chunk(&mut self, chunk: &mut Vec<EventRecord>, max_records: usize) -> Result<()> {
        chunk.clear();
        while chunk.len() < max_records {
            match self.next_record()? {
                Some(record) => chunk.push(record),
                None => break,
            }
        }
        Ok(())
    }

    /// Read the next record, moving on to the next file as needed
    fn next_record(&mut self) -> Result<Option<EventRecord>> {
        loop {
            let Some(file) = &mut self.current else {
                let Some(path) = self.pending.next() else {
                    return Ok(None);
                };
                self.current = Some(OpenFile::open(path)?);
                continue;
            };
            match file.next_record(&mut self.read_bytes)? {
                Some(record) => return Ok(Some(record)),
                None => {
                    debug!("Read {} lines from {}", file.line, file.path.display());
                    self.current = None;
                }
            }
        }
    }
}
//
impl Iterator for RecordReader {
    type Item = Result<EventRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

/// Input file which is being read line by line
struct OpenFile {
    path: PathBuf,
    reader: BufReader<File>,
    buffer: Vec<u8>,
    line: usize,
}
//
impl OpenFile {
    fn open(path: PathBuf) -> Result<Self> {
        let file =
            File::open(&path).wrap_err_with(|| format!("Failed to open {}", path.display()))?;
        Ok(Self {
            path,
            reader: BufReader::new(file),
            buffer: Vec::new(),
            line: 0,
        })
    }

    /// Decode the next non-blank line, if any
    fn next_record(&mut self, read_bytes: &mut u64) -> Result<Option<EventRecord>> {
        loop {
            self.buffer.clear();
            let num_bytes = self
                .reader
                .read_until(b'\n', &mut self.buffer)
                .wrap_err_with(|| {
                    format!("Failed to read {}:{}", self.path.display(), self.line + 1)
                })?;
            if num_bytes == 0 {
                return Ok(None);
            }
            *read_bytes += num_bytes as u64;
            self.line += 1;
            let record = match std::str::from_utf8(&self.buffer) {
                Ok(text) if text.trim().is_empty() => continue,
                Ok(text) => parse_record(text),
                Err(e) => Err(DataError::MalformedRecord(e.to_string())),
            };
            return Ok(Some(record.map_err(|e| self.locate(e))));
        }
    }

    /// Point a record error at the line it comes from
    fn locate(&self, error: DataError) -> DataError {
        match error {
            DataError::MalformedRecord(msg) => {
                DataError::MalformedRecord(format!("{}:{}: {msg}", self.path.display(), self.line))
            }
            other => other,
        }
    }
}

/// Read every record of an input file, in file order
pub fn read_events(path: &Path) -> Result<Vec<EventRecord>> {
    RecordReader::new(&[path.to_owned()])?.collect()
}

/// Neutrino flavor of a simulated sample, from its file name
///
/// File names look like `lentp_nuebar.ncgamma_flux13a_neut533.030.jsonl`: the
/// flavor tag follows the first underscore of the part before the first dot.
/// Tags which contain underscores themselves are matched as a whole first.
///
pub fn flavor_of(path: &Path) -> std::result::Result<Flavor, ConfigError> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = file_name.split('.').next().unwrap_or_default();
    let tagged = stem.split_once('_').map(|(_, rest)| rest);
    let Some(tagged) = tagged else {
        return Err(ConfigError::UnknownFlavor(stem.to_owned()));
    };
    Flavor::from_str(tagged).or_else(|_| {
        let tag = tagged.split('_').next().unwrap_or_default();
        Flavor::from_str(tag)
    })
}

/// Group input files by neutrino flavor, keeping their relative order
pub fn group_by_flavor(
    paths: impl IntoIterator<Item = PathBuf>,
) -> std::result::Result<BTreeMap<Flavor, Vec<PathBuf>>, ConfigError> {
    let mut groups = BTreeMap::<_, Vec<_>>::new();
    for path in paths {
        groups.entry(flavor_of(&path)?).or_default().push(path);
    }
    Ok(groups)
}
