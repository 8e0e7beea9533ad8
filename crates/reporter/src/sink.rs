use crate::assembler::{Artifact, ArtifactBody};
use crate::error::ReportError;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Where finished artifacts go. The report never touches the filesystem directly.
pub trait ArtifactSink {
    fn write_text(&mut self, name: &str, content: &str) -> Result<(), ReportError>;
    fn write_image(&mut self, name: &str, svg: &str) -> Result<(), ReportError>;
}

const MAX_RUN_DIRECTORY_ATTEMPTS: u32 = 100;

/// Writes artifacts into a fresh `analysis_<timestamp>` directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// Creates a new `{output_root}/analysis_{timestamp}` directory, and the root if missing.
    ///
    /// The run directory itself must not exist yet: a second run started in the
    /// same second gets `analysis_{timestamp}_2`, then `_3`, and so on.
    pub fn create(output_root: &Path, timestamp: &str) -> Result<Self, ReportError> {
        let directory_error = |path: &Path, source: io::Error| ReportError::OutputDirectory {
            path: path.display().to_string(),
            source,
        };
        fs::create_dir_all(output_root).map_err(|e| directory_error(output_root, e))?;

        let base = format!("analysis_{timestamp}");
        for attempt in 1..=MAX_RUN_DIRECTORY_ATTEMPTS {
            let name = match attempt {
                1 => base.clone(),
                n => format!("{base}_{n}"),
            };
            let dir = output_root.join(name);
            match fs::create_dir(&dir) {
                Ok(()) => return Ok(Self { dir }),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    tracing::warn!(dir = %dir.display(), "Run directory already exists, trying the next suffix.");
                }
                Err(e) => return Err(directory_error(&dir, e)),
            }
        }

        let dir = output_root.join(base);
        Err(directory_error(
            &dir,
            io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{MAX_RUN_DIRECTORY_ATTEMPTS} run directories already exist for this timestamp"),
            ),
        ))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write(&self, name: &str, content: &str) -> Result<(), ReportError> {
        fs::write(self.dir.join(name), content).map_err(|source| ReportError::Io {
            name: name.to_string(),
            source,
        })
    }
}

impl ArtifactSink for DirectorySink {
    fn write_text(&mut self, name: &str, content: &str) -> Result<(), ReportError> {
        self.write(name, content)
    }

    fn write_image(&mut self, name: &str, svg: &str) -> Result<(), ReportError> {
        self.write(name, svg)
    }
}

/// Keeps artifacts in memory, keyed by file name.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub texts: BTreeMap<String, String>,
    pub images: BTreeMap<String, String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every file name written so far, in lexical (and therefore ordinal) order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .texts
            .keys()
            .chain(self.images.keys())
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names
    }
}

impl ArtifactSink for MemorySink {
    fn write_text(&mut self, name: &str, content: &str) -> Result<(), ReportError> {
        self.texts.insert(name.to_string(), content.to_string());
        Ok(())
    }

    fn write_image(&mut self, name: &str, svg: &str) -> Result<(), ReportError> {
        self.images.insert(name.to_string(), svg.to_string());
        Ok(())
    }
}

/// Hands every artifact to `sink`, in order, stopping at the first failure.
pub fn publish(artifacts: &[Artifact], sink: &mut dyn ArtifactSink) -> Result<(), ReportError> {
    let progress_bar = ProgressBar::new(artifacts.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    for artifact in artifacts {
        progress_bar.set_message(artifact.file_name.clone());
        match &artifact.body {
            ArtifactBody::Text(content) => sink.write_text(&artifact.file_name, content)?,
            ArtifactBody::Image { svg, .. } => sink.write_image(&artifact.file_name, svg)?,
        }
        tracing::debug!(file = %artifact.file_name, "Artifact written.");
        progress_bar.inc(1);
    }

    progress_bar.finish_with_message("Report written.");
    tracing::info!(artifacts = artifacts.len(), "Report published.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(file_name: &str, content: &str) -> Artifact {
        Artifact {
            ordinal: 1,
            stem: "analysis_configuration".to_string(),
            file_name: file_name.to_string(),
            body: ArtifactBody::Text(content.to_string()),
        }
    }

    #[test]
    fn directory_sink_creates_timestamped_run_directory() {
        let root = std::env::temp_dir().join(format!("comparator-sink-{}", std::process::id()));
        let mut sink = DirectorySink::create(&root, "2022-01-02_03-04-05").unwrap();

        assert!(sink.dir().ends_with("analysis_2022-01-02_03-04-05"));
        sink.write_text("01-a.txt", "hello").unwrap();
        assert_eq!(fs::read_to_string(sink.dir().join("01-a.txt")).unwrap(), "hello");

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn runs_in_the_same_second_get_separate_directories() {
        let root = std::env::temp_dir().join(format!("comparator-same-second-{}", std::process::id()));
        let mut first = DirectorySink::create(&root, "2022-01-02_03-04-05").unwrap();
        let mut second = DirectorySink::create(&root, "2022-01-02_03-04-05").unwrap();

        assert_ne!(first.dir(), second.dir());
        assert!(second.dir().ends_with("analysis_2022-01-02_03-04-05_2"));

        let name = "01-analysis_configuration_2022-01-02_03-04-05.txt";
        first.write_text(name, "run A").unwrap();
        second.write_text(name, "run B").unwrap();
        assert_eq!(fs::read_to_string(first.dir().join(name)).unwrap(), "run A");
        assert_eq!(fs::read_to_string(second.dir().join(name)).unwrap(), "run B");

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn publish_preserves_order_and_content() {
        let artifacts = vec![text("01-a.txt", "one"), text("02-b.txt", "two")];
        let mut sink = MemorySink::new();

        publish(&artifacts, &mut sink).unwrap();

        assert_eq!(sink.names(), vec!["01-a.txt", "02-b.txt"]);
        assert_eq!(sink.texts["02-b.txt"], "two");
    }

    struct FailingSink;

    impl ArtifactSink for FailingSink {
        fn write_text(&mut self, name: &str, _: &str) -> Result<(), ReportError> {
            Err(ReportError::Io {
                name: name.to_string(),
                source: std::io::Error::other("disk full"),
            })
        }

        fn write_image(&mut self, name: &str, svg: &str) -> Result<(), ReportError> {
            self.write_text(name, svg)
        }
    }

    #[test]
    fn publish_stops_at_first_write_error() {
        let err = publish(&[text("01-a.txt", "one")], &mut FailingSink).unwrap_err();
        assert!(err.to_string().contains("01-a.txt"));
    }
}
