//! Reader for the Tecplot finite element export
//!
//! The header is free-order keyworded text and is parsed by an explicit
//! state machine (`Title → Variables → Zone → AuxOrData`). The data block
//! that follows may be text or raw little-endian binary; the encoding is
//! probed from the first body line and the stream rewound before anything
//! is decoded.

// standard library
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

// crate modules
use crate::error::{Error, Result};
use crate::mesh::{AuxValue, Header, Mesh, ZoneKind, ZoneMeta};

// mhdtools modules
use mhdtools_utils::{f, StringExt};

// external crates
use log::{debug, warn};
use ndarray::Array2;

// nom parser combinators
use nom::character::complete::space0;
use nom::multi::many1;
use nom::number::complete::double;
use nom::sequence::terminated;
use nom::IResult;

/// Named states of the header parse
enum State {
    Title,
    Variables,
    Zone,
    AuxOrData,
}

/// Outcome of pulling one more line from the stream
#[derive(Debug, Clone, Copy, PartialEq)]
enum Fetched {
    /// A text line is cached
    Line,
    /// End of file
    Eof,
    /// The bytes at this offset are not text
    Binary,
}

/// Read a Tecplot export into a header and a mesh
///
/// With `with_geometry` the data values are taken as cell-centred (one value
/// per cell) and a separate nodal geometry array is read after the
/// connectivity; without it the values are nodal and no geometry array
/// exists.
///
/// ```rust, no_run
/// # use mhdtools_tecplot::read_tecplot;
/// let (header, mesh) = read_tecplot("./data/blood_flow.dat", false).unwrap();
/// println!("{header}\n{mesh}");
/// ```
pub fn read_tecplot<P: AsRef<Path>>(path: P, with_geometry: bool) -> Result<(Header, Mesh)> {
    let mut reader = TecplotReader::new(path.as_ref())?;
    let header = reader.parse_header()?;
    debug!("tecplot header: {header}");
    let mesh = reader.read_body(&header, with_geometry)?;
    Ok((header, mesh))
}

/// Internal line-driven reader for one Tecplot file
struct TecplotReader {
    stream: BufReader<File>,
    /// Current cached line
    line: String,
    /// Byte offset where the cached line starts
    line_start: u64,
    /// Byte offset just past the cached line
    consumed: u64,
    /// Offset of the first byte after the header block
    pt0: u64,
    /// What the byte layout looked like at `pt0`
    probe: Fetched,
}

impl TecplotReader {
    fn new(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            stream: BufReader::new(file),
            line: String::new(),
            line_start: 0,
            consumed: 0,
            pt0: 0,
            probe: Fetched::Eof,
        })
    }

    /// Advance to the next line, tracking byte offsets
    ///
    /// Invalid UTF-8 is not an error here, it marks the start of a binary
    /// data block.
    fn next_line(&mut self) -> Result<Fetched> {
        self.line_start = self.consumed;
        self.line.clear();
        match self.stream.read_line(&mut self.line) {
            Ok(0) => Ok(Fetched::Eof),
            Ok(n) => {
                self.consumed += n as u64;
                Ok(Fetched::Line)
            }
            Err(source) if source.kind() == std::io::ErrorKind::InvalidData => Ok(Fetched::Binary),
            Err(source) => Err(Error::IOError(source)),
        }
    }

    /// Advance inside the header, where running out of text is fatal
    fn next_header_line(&mut self, expected: &str) -> Result<()> {
        match self.next_line()? {
            Fetched::Line => Ok(()),
            _ => Err(Error::UnexpectedKeyword {
                expected: expected.to_string(),
                found: "end of header".to_string(),
            }),
        }
    }

    /// Run the header state machine over the leading text lines
    fn parse_header(&mut self) -> Result<Header> {
        let mut state = State::Title;
        let mut title = String::new();
        let mut raw_variables = String::new();
        let mut draft = ZoneDraft::default();
        let mut aux: Vec<(String, AuxValue)> = Vec::new();

        self.next_header_line("TITLE")?;
        loop {
            match state {
                State::Title => {
                    if keyword_is(&self.line, "TITLE") {
                        title = value_after_equals(&self.line).unquote();
                        self.next_header_line("VARIABLES")?;
                    } else {
                        // tolerated, the line is reprocessed as VARIABLES
                        warn!("no TITLE line at the top of the file");
                    }
                    state = State::Variables;
                }
                State::Variables => {
                    if !keyword_is(&self.line, "VARIABLES") {
                        return Err(Error::UnexpectedKeyword {
                            expected: "VARIABLES".to_string(),
                            found: self.line.trim().to_string(),
                        });
                    }
                    // the name list may continue over any number of lines
                    raw_variables.push_str(value_after_equals(&self.line));
                    self.next_header_line("ZONE")?;
                    while !keyword_is(&self.line, "ZONE") {
                        raw_variables.push(' ');
                        raw_variables.push_str(self.line.trim());
                        self.next_header_line("ZONE")?;
                    }
                    state = State::Zone;
                }
                State::Zone => {
                    let rest = self.line.trim_start();
                    parse_zone_pairs(rest.get("ZONE".len()..).unwrap_or(""), &mut draft)?;
                    loop {
                        if self.next_line()? != Fetched::Line {
                            break;
                        }
                        let text = self.line.trim();
                        if keyword_is(text, "AUXDATA") || keyword_is(text, "DT") {
                            break;
                        }
                        if !text.contains('=') {
                            break;
                        }
                        parse_zone_pairs(text, &mut draft)?;
                    }
                    state = State::AuxOrData;
                }
                State::AuxOrData => {
                    let mut fetched = Fetched::Line;
                    loop {
                        if fetched != Fetched::Line {
                            break;
                        }
                        let text = self.line.trim();
                        if text.is_empty() {
                            fetched = self.next_line()?;
                            continue;
                        }
                        if keyword_is(text, "AUXDATA") {
                            aux.push(parse_auxdata(text)?);
                        } else if keyword_is(text, "DT") {
                            let value = value_after_equals(text).to_string();
                            aux.push(("DT".to_string(), AuxValue::Text(value)));
                        } else {
                            break;
                        }
                        fetched = self.next_line()?;
                    }
                    // everything from here on is data
                    self.pt0 = self.line_start;
                    self.probe = fetched;
                    let mut zone = draft.finish()?;
                    zone.aux = aux;
                    return Ok(Header {
                        title,
                        variables: split_quoted_names(&raw_variables),
                        zone,
                    });
                }
            }
        }
    }

    /// Probe the body encoding, rewind to the data start, and read the arrays
    fn read_body(&mut self, header: &Header, with_geometry: bool) -> Result<Mesh> {
        let zone = &header.zone;
        let n_vars = header.variables.len();
        let per_cell = zone.kind.nodes_per_cell();
        let ndim = zone.kind.ndim();
        let data_count = if with_geometry { zone.cells } else { zone.nodes };

        let ascii = match self.probe {
            Fetched::Line => is_float_list(&self.line),
            Fetched::Binary => false,
            Fetched::Eof => return Err(Error::ShortRead { offset: self.pt0 }),
        };
        debug!(
            "{} data block at byte {}: {n_vars} variables over {data_count} points",
            if ascii { "text" } else { "binary" },
            self.pt0
        );

        // the probe consumed part of the body, start over from pt0
        self.stream.seek(SeekFrom::Start(self.pt0))?;
        self.consumed = self.pt0;

        let (data, connectivity, geometry) = if ascii {
            let data = self.ascii_f32_block(data_count, n_vars)?;
            let connectivity = self.ascii_i32_block(zone.cells, per_cell)?;
            let geometry = with_geometry
                .then(|| self.ascii_f32_block(zone.nodes, ndim))
                .transpose()?;
            (data, connectivity, geometry)
        } else {
            let data = self.binary_f32_block(data_count * n_vars)?;
            let connectivity = self.binary_i32_block(zone.cells * per_cell)?;
            let geometry = with_geometry
                .then(|| self.binary_f32_block(zone.nodes * ndim))
                .transpose()?;
            (data, connectivity, geometry)
        };

        // flat order is point-major, the arrays store one row per variable
        Ok(Mesh {
            data: Array2::from_shape_vec((data_count, n_vars), data)?.reversed_axes(),
            connectivity: Array2::from_shape_vec((zone.cells, per_cell), connectivity)?
                .reversed_axes(),
            geometry: geometry
                .map(|g| Ok::<_, Error>(Array2::from_shape_vec((zone.nodes, ndim), g)?.reversed_axes()))
                .transpose()?,
        })
    }

    /// Read `records` text lines of exactly `width` floats each
    fn ascii_f32_block(&mut self, records: usize, width: usize) -> Result<Vec<f32>> {
        let mut values = Vec::with_capacity(records * width);
        for _ in 0..records {
            values.extend(self.ascii_record(width)?.iter().map(|&v| v as f32));
        }
        Ok(values)
    }

    /// Read `records` text lines of exactly `width` node indices each
    fn ascii_i32_block(&mut self, records: usize, width: usize) -> Result<Vec<i32>> {
        let mut values = Vec::with_capacity(records * width);
        for _ in 0..records {
            values.extend(self.ascii_record(width)?.iter().map(|&v| v as i32));
        }
        Ok(values)
    }

    /// One whitespace-split body line with a fixed value count
    fn ascii_record(&mut self, width: usize) -> Result<Vec<f64>> {
        if self.next_line()? != Fetched::Line {
            return Err(Error::ShortRead {
                offset: self.line_start,
            });
        }
        let values = match float_list(&self.line) {
            Ok((rest, values)) if rest.trim().is_empty() => values,
            _ => {
                return Err(Error::ParseError(f!(
                    "unparsable data line \"{}\"",
                    self.line.trim_end()
                )))
            }
        };
        if values.len() != width {
            return Err(Error::ParseError(f!(
                "expected {width} values per line, found {}",
                values.len()
            )));
        }
        Ok(values)
    }

    /// Fixed-size little-endian f32 read
    fn binary_f32_block(&mut self, count: usize) -> Result<Vec<f32>> {
        let payload = self.binary_bytes(count * 4)?;
        Ok(payload
            .chunks_exact(4)
            .map(|chunk| {
                let mut buffer = [0u8; 4];
                buffer.copy_from_slice(chunk);
                f32::from_le_bytes(buffer)
            })
            .collect())
    }

    /// Fixed-size little-endian i32 read
    fn binary_i32_block(&mut self, count: usize) -> Result<Vec<i32>> {
        let payload = self.binary_bytes(count * 4)?;
        Ok(payload
            .chunks_exact(4)
            .map(|chunk| {
                let mut buffer = [0u8; 4];
                buffer.copy_from_slice(chunk);
                i32::from_le_bytes(buffer)
            })
            .collect())
    }

    fn binary_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        let offset = self.consumed;
        let mut payload = vec![0u8; count];
        self.stream.read_exact(&mut payload).map_err(|source| {
            if source.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::ShortRead { offset }
            } else {
                Error::IOError(source)
            }
        })?;
        self.consumed += count as u64;
        Ok(payload)
    }
}

/// Zone metadata as it accumulates over the `ZONE` lines
#[derive(Default)]
struct ZoneDraft {
    title: String,
    nodes: Option<usize>,
    cells: Option<usize>,
    kind: Option<ZoneKind>,
}

impl ZoneDraft {
    /// Check everything mandatory arrived and build the metadata
    fn finish(self) -> Result<ZoneMeta> {
        let kind = self
            .kind
            .ok_or_else(|| Error::UnsupportedZoneType("no ET/ZONETYPE key".to_string()))?;
        let nodes = self
            .nodes
            .ok_or_else(|| Error::MalformedZoneLine("no NODES/N key".to_string()))?;
        let cells = self
            .cells
            .ok_or_else(|| Error::MalformedZoneLine("no ELEMENTS/E key".to_string()))?;
        Ok(ZoneMeta {
            title: self.title,
            nodes,
            cells,
            kind,
            aux: Vec::new(),
        })
    }
}

/// Fold one line of comma-separated `KEY=VALUE` pairs into the draft
fn parse_zone_pairs(text: &str, draft: &mut ZoneDraft) -> Result<()> {
    for token in split_zone_tokens(text) {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let (key, value) = token
            .split_once('=')
            .ok_or_else(|| Error::MalformedZoneLine(token.to_string()))?;
        let value = value.unquote();
        match key.trim().to_uppercase().as_str() {
            "T" => draft.title = value,
            "NODES" | "N" => draft.nodes = Some(parse_count(token, &value)?),
            "ELEMENTS" | "E" => draft.cells = Some(parse_count(token, &value)?),
            "ET" | "ZONETYPE" => {
                draft.kind = Some(
                    ZoneKind::from_keyword(&value)
                        .ok_or_else(|| Error::UnsupportedZoneType(value.clone()))?,
                )
            }
            other => debug!("ignoring zone key {other}={value}"),
        }
    }
    Ok(())
}

fn parse_count(token: &str, value: &str) -> Result<usize> {
    value
        .parse()
        .map_err(|_| Error::MalformedZoneLine(token.to_string()))
}

/// Parse one `AUXDATA NAME = value` line into a name/value pair
///
/// `ITER` and `NPROC` are numeric by convention, `TIMESIM` hides its value
/// behind an `=`-delimited prefix, everything else is stored verbatim.
fn parse_auxdata(text: &str) -> Result<(String, AuxValue)> {
    let rest = text.get("AUXDATA".len()..).unwrap_or("");
    let (name, value) = rest
        .split_once('=')
        .ok_or_else(|| Error::MalformedZoneLine(text.to_string()))?;
    let name = name.trim().to_uppercase();
    let value = value.unquote();

    let value = match name.as_str() {
        "ITER" | "NPROC" => match value.trim().parse() {
            Ok(number) => AuxValue::Int(number),
            Err(_) => {
                warn!("aux value {name}={value} did not parse as an integer");
                AuxValue::Text(value)
            }
        },
        "TIMESIM" => match value.split_once('=') {
            Some((_, after)) => AuxValue::Text(after.trim().to_string()),
            None => AuxValue::Text(value),
        },
        _ => AuxValue::Text(value),
    };
    Ok((name, value))
}

/// Case-insensitive check for a leading keyword
fn keyword_is(line: &str, keyword: &str) -> bool {
    line.trim_start()
        .get(..keyword.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(keyword))
}

/// Everything after the first `=`, trimmed
fn value_after_equals(line: &str) -> &str {
    line.split_once('=').map(|(_, v)| v).unwrap_or("").trim()
}

/// Split an accumulated `VARIABLES` value on quotes, dropping the separators
fn split_quoted_names(text: &str) -> Vec<String> {
    text.split(['"', '\''])
        .map(str::trim)
        .filter(|piece| {
            !piece.is_empty() && !piece.chars().all(|c| c == ',' || c == '=' || c.is_whitespace())
        })
        .map(str::to_string)
        .collect()
}

/// Split on commas that sit outside quoted values
fn split_zone_tokens(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    for c in text.chars() {
        match quote {
            Some(q) if c == q => {
                quote = None;
                current.push(c);
            }
            Some(_) => current.push(c),
            None => match c {
                '"' | '\'' => {
                    quote = Some(c);
                    current.push(c);
                }
                ',' => tokens.push(std::mem::take(&mut current)),
                _ => current.push(c),
            },
        }
    }
    if !current.trim().is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Parse any number of consecutive doubles
fn float_list(i: &str) -> IResult<&str, Vec<f64>> {
    many1(terminated(double, space0))(i.trim_start())
}

/// Check that every whitespace-separated token on the line is numeric
fn is_float_list(i: &str) -> bool {
    matches!(float_list(i), Ok((rest, _)) if rest.trim().is_empty())
}
