use std::{
    fs::File,
    io::{self, BufWriter, StdoutLock, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context;
use harprep_pipeline::{dataset::LabelEncoder, features::FeatureTable, recording::Recording};

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
            format!(
                "Failed to write newline after JSON to {}",
                self.display_path()
            )
        })?;
        self.flush()
            .with_context(|| format!("Failed to flush output to {}", self.display_path()))?;
        Ok(())
    }

    /// Write rows as CSV with a header row.
    pub fn write_csv<H, R, I>(&mut self, header: H, rows: I) -> anyhow::Result<()>
    where
        H: IntoIterator,
        H::Item: AsRef<[u8]>,
        I: IntoIterator<Item = R>,
        R: IntoIterator,
        R::Item: AsRef<[u8]>,
    {
        let display_path = self.display_path();
        let mut writer = csv::Writer::from_writer(&mut *self);
        writer
            .write_record(header)
            .with_context(|| format!("Failed to write CSV header to {display_path}"))?;
        for row in rows {
            writer
                .write_record(row)
                .with_context(|| format!("Failed to write CSV row to {display_path}"))?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to flush output to {display_path}"))?;
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
    let value = serde_json::from_reader(reader).with_context(|| {
        format!(
            "Failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })?;

    Ok(value)
}

/// Read a sensor recording from a CSV file
///
/// # Errors
///
/// Returns error if the file cannot be opened or a row is malformed
pub fn read_recording_file<P>(path: P) -> anyhow::Result<Recording>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let recording = Recording::open(path)
        .with_context(|| format!("Failed to read recording file: {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        samples = recording.len(),
        "read recording"
    );
    Ok(recording)
}

/// Write a feature table as CSV, with the activity label and its class index
/// appended to every row
pub fn save_feature_csv(
    table: &FeatureTable,
    encoder: &LabelEncoder,
    output_path: PathBuf,
) -> anyhow::Result<()> {
    let header = table
        .columns
        .iter()
        .map(String::as_str)
        .chain(["activity", "activity_number"]);
    let rows = table
        .rows
        .iter()
        .map(|row| -> anyhow::Result<Vec<String>> {
            let number = encoder.encode(&row.activity)?;
            Ok(row
                .values
                .iter()
                .map(ToString::to_string)
                .chain([row.activity.clone(), number.to_string()])
                .collect())
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let mut output = Output::open(output_path)?;
    output.write_csv(header, rows)?;
    tracing::info!(
        path = %output.display_path(),
        rows = table.len(),
        columns = table.columns.len(),
        "saved feature table"
    );
    Ok(())
}
