//! Integration tests over synthetic snapshot files

use std::path::{Path, PathBuf};

use mhdtools_snapshot::{
    detect_file_kind, probe_file, read_dataset, read_log, read_snapshot, Error, FileKind,
};
use mhdtools_utils::{f, ValueExt};

use itertools::Itertools;
use rstest::{fixture, rstest};
use tempfile::{tempdir, TempDir};

/// Wrap a payload in the 4-byte Fortran record tags
fn record(buffer: &mut Vec<u8>, payload: &[u8]) {
    let tag = (payload.len() as i32).to_le_bytes();
    buffer.extend_from_slice(&tag);
    buffer.extend_from_slice(payload);
    buffer.extend_from_slice(&tag);
}

/// Space-pad a string record to its fixed width
fn padded(text: &str, width: usize) -> Vec<u8> {
    let mut bytes = text.as_bytes().to_vec();
    bytes.resize(width, b' ');
    bytes
}

fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// A snapshot with known values that can render itself in every variant
#[derive(Clone)]
struct Synthetic {
    headline: String,
    it: i32,
    time: f64,
    ndim: i32,
    nx: Vec<usize>,
    eqpar: Vec<f64>,
    names: String,
    nw: usize,
}

impl Synthetic {
    fn n_points(&self) -> usize {
        self.nx.iter().product()
    }

    fn columns(&self) -> usize {
        self.ndim.unsigned_abs() as usize + self.nw
    }

    /// Deterministic value for every grid point and column
    fn value(&self, point: usize, column: usize) -> f64 {
        0.5 + point as f64 * 0.25 + column as f64 * 10.0
    }

    /// Plain text rendering, 18 bytes per column plus a newline per point
    fn ascii(&self) -> Vec<u8> {
        let mut text = String::new();
        text += &f!("{}\n", self.headline);
        text += &f!(
            "{} {:.4} {} {} {}\n",
            self.it,
            self.time,
            self.ndim,
            self.eqpar.len(),
            self.nw
        );
        text += &f!("{}\n", self.nx.iter().join(" "));
        if !self.eqpar.is_empty() {
            text += &f!("{}\n", self.eqpar.iter().map(|v| f!("{v:.4}")).join(" "));
        }
        text += &f!("{}\n", self.names);
        for point in 0..self.n_points() {
            for column in 0..self.columns() {
                text += &f!("{:>18}", self.value(point, column).sci(10, 2));
            }
            text.push('\n');
        }
        text.into_bytes()
    }

    /// Fortran binary rendering at either precision
    fn binary(&self, real8: bool, width: usize) -> Vec<u8> {
        let float_bytes = |value: f64, buffer: &mut Vec<u8>| {
            if real8 {
                buffer.extend_from_slice(&value.to_le_bytes());
            } else {
                buffer.extend_from_slice(&(value as f32).to_le_bytes());
            }
        };

        let mut buffer = Vec::new();
        record(&mut buffer, &padded(&self.headline, width));

        let mut params = Vec::new();
        params.extend_from_slice(&self.it.to_le_bytes());
        float_bytes(self.time, &mut params);
        params.extend_from_slice(&self.ndim.to_le_bytes());
        params.extend_from_slice(&(self.eqpar.len() as i32).to_le_bytes());
        params.extend_from_slice(&(self.nw as i32).to_le_bytes());
        record(&mut buffer, &params);

        let mut extents = Vec::new();
        for n in &self.nx {
            extents.extend_from_slice(&(*n as i32).to_le_bytes());
        }
        record(&mut buffer, &extents);

        if !self.eqpar.is_empty() {
            let mut eqpar = Vec::new();
            for value in &self.eqpar {
                float_bytes(*value, &mut eqpar);
            }
            record(&mut buffer, &eqpar);
        }

        record(&mut buffer, &padded(&self.names, width));

        // body: the whole x array is one record, every field its own
        let n = self.n_points();
        let ndim = self.ndim.unsigned_abs() as usize;
        let mut x = Vec::new();
        for d in 0..ndim {
            for p in 0..n {
                float_bytes(self.value(p, d), &mut x);
            }
        }
        record(&mut buffer, &x);
        for k in 0..self.nw {
            let mut field = Vec::new();
            for p in 0..n {
                float_bytes(self.value(p, ndim + k), &mut field);
            }
            record(&mut buffer, &field);
        }
        buffer
    }
}

#[fixture]
fn shocktube() -> Synthetic {
    Synthetic {
        headline: "shocktube test".to_string(),
        it: 10,
        time: 0.1,
        ndim: 1,
        nx: vec![5],
        eqpar: vec![1.6667, 0.1],
        names: "x rho v gamma eta".to_string(),
        nw: 2,
    }
}

#[fixture]
fn reconnection() -> Synthetic {
    Synthetic {
        headline: "reconnection 2d".to_string(),
        it: 220,
        time: 1.5,
        ndim: -2,
        nx: vec![4, 3],
        eqpar: Vec::new(),
        names: "x y rho m1 m2 e".to_string(),
        nw: 4,
    }
}

#[fixture]
fn tmp() -> TempDir {
    tempdir().unwrap()
}

// ! Type detection

#[rstest]
#[case(false, 79)] // real4
#[case(true, 79)] // real8
#[case(false, 500)] // real4, extended headline
#[case(true, 500)] // real8, extended headline
fn detect_binary_variants(
    shocktube: Synthetic,
    tmp: TempDir,
    #[case] real8: bool,
    #[case] width: usize,
) {
    let path = write_file(tmp.path(), "run.out", &shocktube.binary(real8, width));
    let kind = detect_file_kind(path).unwrap();
    let expected = if real8 {
        FileKind::Real8 { headline: width }
    } else {
        FileKind::Real4 { headline: width }
    };
    assert_eq!(kind, expected);
}

#[rstest]
fn detect_ascii_and_extensions(shocktube: Synthetic, tmp: TempDir) {
    let ascii = write_file(tmp.path(), "run.out", &shocktube.ascii());
    assert_eq!(detect_file_kind(ascii).unwrap(), FileKind::Ascii);

    let log = write_file(tmp.path(), "run.log", b"title\nt rho\n0.0 1.0\n");
    assert_eq!(detect_file_kind(log).unwrap(), FileKind::Log);

    let dat = write_file(tmp.path(), "cut.dat", b"TITLE = \"cut\"\n");
    assert_eq!(detect_file_kind(dat).unwrap(), FileKind::Tecplot);
}

#[rstest]
fn detect_bad_second_record_is_malformed(tmp: TempDir) {
    // valid headline tag of 79 but a nonsense second record length
    let mut buffer = Vec::new();
    record(&mut buffer, &padded("broken", 79));
    record(&mut buffer, &[0u8; 12]);
    let path = write_file(tmp.path(), "run.out", &buffer);
    assert!(matches!(
        detect_file_kind(path),
        Err(Error::MalformedHeader { .. })
    ));
}

// ! Sizing and direct seeking

#[rstest]
#[case(false)]
#[case(true)]
fn size_formula_matches_concatenation(reconnection: Synthetic, tmp: TempDir, #[case] real8: bool) {
    let one = reconnection.binary(real8, 79);
    let mut three = one.clone();
    three.extend_from_slice(&one);
    three.extend_from_slice(&one);
    let path = write_file(tmp.path(), "run.out", &three);

    let info = probe_file(path).unwrap();
    assert_eq!(info.snapshot_bytes, one.len() as u64);
    assert_eq!(info.n_snapshots, 3);
    assert_eq!(info.bytes, 3 * one.len() as u64);
}

#[rstest]
fn ascii_size_formula_matches_concatenation(shocktube: Synthetic, tmp: TempDir) {
    let one = shocktube.ascii();
    let mut two = one.clone();
    two.extend_from_slice(&one);
    let path = write_file(tmp.path(), "run.out", &two);

    let info = probe_file(path).unwrap();
    assert_eq!(info.snapshot_bytes, one.len() as u64);
    assert_eq!(info.n_snapshots, 2);
}

#[rstest]
fn direct_seek_matches_sequential_headers(shocktube: Synthetic, tmp: TempDir) {
    // three snapshots differing only in iteration and time
    let mut bytes = Vec::new();
    for step in 0..3 {
        let mut snapshot = shocktube.clone();
        snapshot.it = 10 + step;
        snapshot.time = 0.1 * (step + 1) as f64;
        bytes.extend_from_slice(&snapshot.binary(true, 79));
    }
    let path = write_file(tmp.path(), "run.out", &bytes);

    for step in 0..3 {
        let dataset = read_snapshot(&path, step as usize).unwrap();
        assert_eq!(dataset.header.it, 10 + step);
        assert_eq!(dataset.header.time, 0.1 * (step + 1) as f64);
        assert_eq!(dataset.header.headline, "shocktube test");
    }
}

#[rstest]
fn index_out_of_range(shocktube: Synthetic, tmp: TempDir) {
    let path = write_file(tmp.path(), "run.out", &shocktube.binary(true, 79));
    assert!(matches!(
        read_snapshot(path, 1),
        Err(Error::IndexOutOfRange {
            requested: 1,
            available: 1
        })
    ));
}

// ! Header and body decoding

#[rstest]
fn ascii_scenario_shapes_and_values(shocktube: Synthetic, tmp: TempDir) {
    let path = write_file(tmp.path(), "run.out", &shocktube.ascii());
    let dataset = read_snapshot(path, 0).unwrap();

    assert_eq!(dataset.header.ndim, 1);
    assert_eq!(dataset.header.nw, 2);
    assert_eq!(dataset.header.nx, vec![5]);
    assert_eq!(dataset.header.coordinate_names(), ["x"]);
    assert_eq!(dataset.header.field_names(), ["rho", "v"]);
    assert_eq!(dataset.header.parameter_names(), ["gamma", "eta"]);
    assert_eq!(dataset.header.field_index("v"), Some(1));

    let data = dataset.data.as_real8().unwrap();
    assert_eq!(data.x.shape(), [5, 1]);
    assert_eq!(data.w.shape(), [5, 2]);
    for point in 0..5 {
        assert_eq!(data.x[[point, 0]], shocktube.value(point, 0));
        assert_eq!(data.w[[point, 0]], shocktube.value(point, 1));
        assert_eq!(data.w[[point, 1]], shocktube.value(point, 2));
    }
}

#[rstest]
fn real8_binary_decodes_exactly(reconnection: Synthetic, tmp: TempDir) {
    let path = write_file(tmp.path(), "run.out", &reconnection.binary(true, 79));
    let dataset = read_snapshot(path, 0).unwrap();

    // negative ndim on disk flags generalised coordinates
    assert!(dataset.header.gencoord);
    assert_eq!(dataset.header.ndim, 2);
    assert_eq!(dataset.header.nx, vec![4, 3]);

    let data = dataset.data.as_real8().unwrap();
    assert_eq!(data.x.shape(), [4, 3, 2]);
    assert_eq!(data.w.shape(), [4, 3, 4]);
    for j in 0..3 {
        for i in 0..4 {
            let point = i + 4 * j;
            assert_eq!(data.x[[i, j, 0]], reconnection.value(point, 0));
            assert_eq!(data.w[[i, j, 3]], reconnection.value(point, 5));
        }
    }
}

#[rstest]
fn ascii_and_real4_agree(reconnection: Synthetic, tmp: TempDir) {
    let ascii_path = write_file(tmp.path(), "a.out", &reconnection.ascii());
    let real4_path = write_file(tmp.path(), "b.out", &reconnection.binary(false, 79));

    let ascii = read_snapshot(ascii_path, 0).unwrap();
    let real4 = read_snapshot(real4_path, 0).unwrap();

    let a = ascii.data.as_real8().unwrap();
    let b = real4.data.as_real4().unwrap();
    for (lhs, rhs) in a.w.iter().zip(b.w.iter()) {
        let relative = (lhs - *rhs as f64).abs() / lhs.abs().max(1.0);
        assert!(relative < 1e-6, "{lhs} vs {rhs}");
    }
}

#[rstest]
fn extended_headline_decodes(shocktube: Synthetic, tmp: TempDir) {
    let path = write_file(tmp.path(), "run.out", &shocktube.binary(false, 500));
    let dataset = read_snapshot(path, 0).unwrap();
    assert_eq!(
        dataset.info.kind,
        FileKind::Real4 { headline: 500 }
    );
    assert_eq!(dataset.header.headline, "shocktube test");
    assert_eq!(dataset.header.field_names(), ["rho", "v"]);
}

#[rstest]
fn missing_equation_parameter_is_truncated(tmp: TempDir) {
    // header claims neqpar=2, the parameter line only holds one value
    let text = "shocktube test\n10 0.1000 1 2 2\n5\n1.6667\nx rho v gamma eta\n";
    let path = write_file(tmp.path(), "run.out", text.as_bytes());
    assert!(matches!(
        read_snapshot(path, 0),
        Err(Error::TruncatedHeader { .. })
    ));
}

#[rstest]
#[case(0)]
#[case(4)]
fn unsupported_dimensionality_is_rejected(shocktube: Synthetic, tmp: TempDir, #[case] ndim: i32) {
    let mut snapshot = shocktube;
    snapshot.ndim = ndim;
    let path = write_file(tmp.path(), "run.out", &snapshot.ascii());
    assert!(matches!(
        read_snapshot(path, 0),
        Err(Error::UnsupportedDimensionality(found)) if found == ndim
    ));
}

#[rstest]
fn missing_variable_name_is_rejected(shocktube: Synthetic, tmp: TempDir) {
    // one name short of the declared ndim + nw + neqpar
    let mut snapshot = shocktube;
    snapshot.names = "x rho v gamma".to_string();
    let path = write_file(tmp.path(), "run.out", &snapshot.ascii());
    assert!(matches!(read_snapshot(path, 0), Err(Error::ParseError(_))));
}

#[rstest]
#[case(false)]
#[case(true)]
fn surplus_variable_names_are_dropped(shocktube: Synthetic, tmp: TempDir, #[case] binary: bool) {
    let mut snapshot = shocktube;
    snapshot.names = "x rho v gamma eta extra".to_string();
    let bytes = if binary {
        snapshot.binary(true, 79)
    } else {
        snapshot.ascii()
    };
    let path = write_file(tmp.path(), "run.out", &bytes);
    let dataset = read_snapshot(path, 0).unwrap();
    assert_eq!(dataset.header.variables, ["x", "rho", "v", "gamma", "eta"]);
    assert_eq!(dataset.header.parameter_names(), ["gamma", "eta"]);
}

#[rstest]
fn binary_file_ending_mid_header_is_truncated(shocktube: Synthetic, tmp: TempDir) {
    let full = shocktube.binary(true, 79);
    // cut inside the grid extent record
    let path = write_file(tmp.path(), "run.out", &full[..79 + 8 + 24 + 8 + 6]);
    assert!(matches!(
        read_snapshot(path, 0),
        Err(Error::TruncatedHeader { .. })
    ));
}

#[rstest]
fn truncated_body_leaves_no_complete_snapshot(shocktube: Synthetic, tmp: TempDir) {
    let full = shocktube.binary(true, 79);
    let path = write_file(tmp.path(), "run.out", &full[..full.len() - 12]);
    // the sizing pass sees zero complete snapshots in the shortened file
    assert!(matches!(
        read_snapshot(path, 0),
        Err(Error::IndexOutOfRange {
            requested: 0,
            available: 0
        })
    ));
}

#[rstest]
fn corrupt_body_tag_is_malformed(shocktube: Synthetic, tmp: TempDir) {
    // full-length file with the final field record overwritten by garbage,
    // so the record tag no longer matches the declared payload size
    let mut bytes = shocktube.binary(true, 79);
    let len = bytes.len();
    for byte in &mut bytes[len - 48..] {
        *byte = 0xFF;
    }
    let path = write_file(tmp.path(), "run.out", &bytes);
    assert!(matches!(
        read_snapshot(path, 0),
        Err(Error::MalformedHeader { .. })
    ));
}

// ! Pattern resolution

#[rstest]
fn ambiguous_pattern_is_rejected_before_reading(shocktube: Synthetic, tmp: TempDir) {
    write_file(tmp.path(), "run1.out", &shocktube.ascii());
    write_file(tmp.path(), "run2.out", &shocktube.ascii());

    match read_dataset("run?.out", tmp.path(), 0) {
        Err(Error::AmbiguousMatch { matches, .. }) => {
            assert_eq!(matches, vec!["run1.out", "run2.out"]);
        }
        other => panic!("expected AmbiguousMatch, got {other:?}"),
    }
}

#[rstest]
fn no_match_and_single_match(shocktube: Synthetic, tmp: TempDir) {
    write_file(tmp.path(), "run1.out", &shocktube.ascii());

    assert!(matches!(
        read_dataset("*.bin", tmp.path(), 0),
        Err(Error::NoMatch { .. })
    ));

    let dataset = read_dataset("run*.out", tmp.path(), 0).unwrap();
    assert_eq!(dataset.info.name, "run1.out");
    assert_eq!(dataset.header.it, 10);
}

// ! Logfiles

#[rstest]
fn logfile_reads_into_named_columns(tmp: TempDir) {
    let text = "shocktube log\nt rho_max e_tot\n0.0 1.0 2.5\n0.1 1.2 2.4\n0.2 1.5 2.2\n";
    let path = write_file(tmp.path(), "run.log", text.as_bytes());

    let (header, table) = read_log(path).unwrap();
    assert_eq!(header.headline, "shocktube log");
    assert_eq!(header.nw, 3);
    assert_eq!(table.n_entries(), 3);
    assert_eq!(table.data.shape(), [3, 3]);

    let rho = table.column("rho_max").unwrap();
    assert_eq!(rho.to_vec(), vec![1.0, 1.2, 1.5]);
    assert!(table.column("missing").is_none());
}

#[rstest]
fn logfile_is_probed_as_one_unit(tmp: TempDir) {
    let text = "shocktube log\nt rho\n0.0 1.0\n";
    let path = write_file(tmp.path(), "run.log", text.as_bytes());

    let info = probe_file(path).unwrap();
    assert_eq!(info.kind, FileKind::Log);
    assert_eq!(info.n_snapshots, 1);
    assert_eq!(info.snapshot_bytes, info.bytes);
}
