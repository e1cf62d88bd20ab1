use std::{
    fs::{self, File},
    io::{self, BufWriter, StdoutLock, Write as _},
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::Context;
use hamlet_grid::{Grid, Position, Tile};

#[derive(Debug)]
pub enum Output {
    Stdout {
        writer: StdoutLock<'static>,
    },
    File {
        writer: BufWriter<File>,
        path: PathBuf,
    },
}

impl Output {
    pub fn save_json<T>(value: &T, output_path: Option<PathBuf>) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        let mut output = Output::from_output_path(output_path)?;
        output.write_json(value)
    }

    pub fn from_output_path(output_path: Option<PathBuf>) -> anyhow::Result<Self> {
        match output_path {
            Some(path) => Output::open(path),
            None => Ok(Output::stdout()),
        }
    }

    pub fn stdout() -> Self {
        Output::Stdout {
            writer: io::stdout().lock(),
        }
    }

    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Output::File {
            writer: BufWriter::new(file),
            path,
        })
    }

    pub fn display_path(&self) -> String {
        match self {
            Output::Stdout { .. } => "stdout".to_string(),
            Output::File { path, .. } => path.display().to_string(),
        }
    }

    pub fn write_json<T>(&mut self, value: T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        serde_json::to_writer_pretty(&mut *self, &value)
            .with_context(|| format!("Failed to write JSON to {}", self.display_path()))?;
        writeln!(&mut *self).with_context(|| {
            format!("Failed to write newline after JSON to {}", self.display_path())
        })?;
        self.flush()
            .with_context(|| format!("Failed to flush output to {}", self.display_path()))?;
        Ok(())
    }
}

impl io::Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout { writer } => writer.write(buf),
            Output::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout { writer } => writer.flush(),
            Output::File { writer, .. } => writer.flush(),
        }
    }
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;

    let reader = io::BufReader::new(file);
    let value = serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse {} JSON file: {}", file_kind, path.display()))?;

    Ok(value)
}

/// Reads an optional JSON config, falling back to its default.
pub fn read_config<T, P>(file_kind: &str, path: Option<P>) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned + Default,
    P: AsRef<Path>,
{
    path.map_or_else(|| Ok(T::default()), |path| read_json_file(file_kind, path))
}

/// Reads a header-less CSV grid, one tile code per cell.
pub fn read_grid_csv<P>(path: P) -> anyhow::Result<Grid>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open grid file: {}", path.display()))?;

    let mut rows = vec![];
    for (i, record) in reader.records().enumerate() {
        let record =
            record.with_context(|| format!("Failed to read row {} of {}", i + 1, path.display()))?;
        let row = record
            .iter()
            .map(Tile::from_str)
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Invalid tile in row {} of {}", i + 1, path.display()))?;
        rows.push(row);
    }
    Grid::from_rows(&rows).with_context(|| format!("Invalid grid in {}", path.display()))
}

pub fn write_grid_csv<P>(grid: &Grid, path: P) -> anyhow::Result<()>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create grid file: {}", path.display()))?;
    for row in grid.row_slices() {
        writer
            .write_record(row.iter().map(ToString::to_string))
            .with_context(|| format!("Failed to write grid file: {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush grid file: {}", path.display()))?;
    Ok(())
}

/// Every `.csv` file below `dir`, sorted by path.
pub fn find_csv_files<P>(dir: P) -> anyhow::Result<Vec<PathBuf>>
where
    P: AsRef<Path>,
{
    fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> anyhow::Result<()> {
        let entries = fs::read_dir(dir)
            .with_context(|| format!("Failed to read directory: {}", dir.display()))?;
        for entry in entries {
            let path = entry
                .with_context(|| format!("Failed to read directory: {}", dir.display()))?
                .path();
            if path.is_dir() {
                walk(&path, files)?;
            } else if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")) {
                files.push(path);
            }
        }
        Ok(())
    }

    let mut files = vec![];
    walk(dir.as_ref(), &mut files)?;
    files.sort();
    Ok(files)
}

/// Loads every readable CSV grid below `dir`; unreadable files are skipped
/// with a warning.
pub fn load_grid_folder<P>(dir: P) -> anyhow::Result<Vec<Grid>>
where
    P: AsRef<Path>,
{
    let mut grids = vec![];
    for path in find_csv_files(dir)? {
        match read_grid_csv(&path) {
            Ok(grid) => grids.push(grid),
            Err(e) => tracing::warn!("Skipping {}: {e:#}", path.display()),
        }
    }
    Ok(grids)
}

/// Position given on the command line as `ROW,COL`, counting from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OneBasedPosition(pub Position);

impl FromStr for OneBasedPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (row, col) = s
            .split_once(',')
            .ok_or_else(|| format!("expected ROW,COL but got {s:?}"))?;
        let parse = |text: &str| {
            text.trim()
                .parse::<usize>()
                .map_err(|e| format!("invalid coordinate {text:?}: {e}"))
        };
        Position::from_one_based(parse(row)?, parse(col)?)
            .map(Self)
            .ok_or_else(|| format!("coordinates count from 1, got {s:?}"))
    }
}

/// Grid size given on the command line as `ROWSxCOLS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSize {
    pub rows: usize,
    pub cols: usize,
}

impl FromStr for GridSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (rows, cols) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected ROWSxCOLS but got {s:?}"))?;
        let parse = |text: &str| match text.trim().parse::<usize>() {
            Ok(0) => Err(format!("grid sizes start at 1, got {s:?}")),
            Ok(n) => Ok(n),
            Err(e) => Err(format!("invalid size {text:?}: {e}")),
        };
        Ok(Self {
            rows: parse(rows)?,
            cols: parse(cols)?,
        })
    }
}

/// Parses a probability in `[0, 1]`, rejecting NaN and infinities.
pub fn parse_rate(s: &str) -> Result<f32, String> {
    let rate = s
        .trim()
        .parse::<f32>()
        .map_err(|e| format!("invalid rate {s:?}: {e}"))?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(format!("rate must lie in [0, 1], got {s:?}"))
    }
}

pub fn print_grid(grid: &Grid) {
    for row in grid.row_slices() {
        let cells = row
            .iter()
            .map(|tile| {
                let code = tile.to_string();
                format!("{code:>2}")
            })
            .collect::<Vec<_>>();
        eprintln!("  {}", cells.join(" "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rate_rejects_non_finite() {
        assert_eq!(parse_rate("0.25"), Ok(0.25));
        assert_eq!(parse_rate("1"), Ok(1.0));
        for text in ["NaN", "nan", "inf", "-inf", "1.5", "-0.1", "often"] {
            assert!(parse_rate(text).is_err(), "{text} was accepted");
        }
    }

    #[test]
    fn test_parse_grid_size() {
        assert_eq!("3x4".parse::<GridSize>(), Ok(GridSize { rows: 3, cols: 4 }));
        assert_eq!("5X5".parse::<GridSize>(), Ok(GridSize { rows: 5, cols: 5 }));
        assert!("0x3".parse::<GridSize>().is_err());
        assert!("3,4".parse::<GridSize>().is_err());
    }

    #[test]
    fn test_parse_one_based_position() {
        assert_eq!("2, 3".parse::<OneBasedPosition>(), Ok(OneBasedPosition(Position::new(1, 2))));
        assert!("0,1".parse::<OneBasedPosition>().is_err());
        assert!("1".parse::<OneBasedPosition>().is_err());
    }
}
