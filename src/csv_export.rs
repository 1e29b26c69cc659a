use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

use crate::records::OfoRecord;
use crate::scrape_error::ScrapeError;

/// Output file name for a category prefix and year label, e.g. `highofo2021.csv`
pub fn export_file_name(prefix: &str, year: &str) -> Result<String, ScrapeError> {
    if year.is_empty() {
        return Err(ScrapeError::Parse("empty year header".to_string()));
    }
    if year.contains(['/', '\\']) || year == ".." {
        return Err(ScrapeError::Parse(format!(
            "year header '{year}' is not usable in a file name"
        )));
    }
    Ok(format!("{prefix}{year}.csv"))
}

/// Give the temporary export the permissions of the file it replaces, or
/// world-readable 0644 for a new export (temp files are created 0600).
fn apply_export_permissions(path: &Path, temp: &NamedTempFile) -> io::Result<()> {
    if let Ok(existing) = fs::metadata(path) {
        return temp.as_file().set_permissions(existing.permissions());
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp.as_file().set_permissions(fs::Permissions::from_mode(0o644))?;
    }
    Ok(())
}

/// Write `records` to `<dir>/<prefix><year>.csv` with a `Stage,Percent,Date` header.
///
/// Rows go to a temporary file in `dir` first, which then replaces any
/// existing export, so a failure never leaves a partial file behind.
#[instrument(skip(records), fields(records = records.len()))]
pub fn write_records(
    dir: &Path,
    prefix: &str,
    year: &str,
    records: &[OfoRecord],
) -> Result<PathBuf, ScrapeError> {
    let path = dir.join(export_file_name(prefix, year)?);

    let temp = NamedTempFile::new_in(dir)?;
    let mut writer = csv::Writer::from_writer(temp);
    if records.is_empty() {
        // serde only emits the header alongside the first record
        writer.write_record(["Stage", "Percent", "Date"])?;
    }
    for record in records {
        writer.serialize(record)?;
    }
    let temp = writer
        .into_inner()
        .map_err(|e| ScrapeError::Write(e.to_string()))?;
    debug!("Wrote {} rows to temporary file", records.len());
    apply_export_permissions(&path, &temp)?;

    temp.persist(&path)
        .map_err(|e| ScrapeError::Write(format!("{}: {}", path.display(), e)))?;
    info!("Exported {} records to {}", records.len(), path.display());

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(stage: &str, percent: &str, date: &str) -> OfoRecord {
        OfoRecord {
            stage: stage.to_string(),
            percent: percent.to_string(),
            date: date.to_string(),
        }
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name("highofo", "2021").unwrap(), "highofo2021.csv");
        assert_eq!(export_file_name("lowofo", "2021").unwrap(), "lowofo2021.csv");
    }

    #[test]
    fn test_export_file_name_rejects_bad_year() {
        assert!(matches!(export_file_name("highofo", ""), Err(ScrapeError::Parse(_))));
        assert!(matches!(
            export_file_name("highofo", "../2021"),
            Err(ScrapeError::Parse(_))
        ));
    }

    #[test]
    fn test_write_records_contents() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![
            record("1", "15", "01/02, 2020"),
            record("2", "30", "01/03, 2020"),
        ];

        let path = write_records(dir.path(), "highofo", "2020", &records).unwrap();
        assert_eq!(path, dir.path().join("highofo2020.csv"));

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "Stage,Percent,Date\n1,15,\"01/02, 2020\"\n2,30,\"01/03, 2020\"\n"
        );
    }

    #[test]
    fn test_write_records_overwrites_existing() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("lowofo2021.csv");
        std::fs::write(&target, "stale contents\n").unwrap();

        write_records(dir.path(), "lowofo", "2021", &[record("Stage1", "10", "03/01, 2021")])
            .unwrap();

        let contents = std::fs::read_to_string(&target).unwrap();
        assert_eq!(contents, "Stage,Percent,Date\nStage1,10,\"03/01, 2021\"\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_new_export_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = write_records(dir.path(), "highofo", "2021", &[]).unwrap();

        let mode = std::fs::metadata(path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[cfg(unix)]
    #[test]
    fn test_overwrite_keeps_existing_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("lowofo2021.csv");
        std::fs::write(&target, "stale contents\n").unwrap();
        std::fs::set_permissions(&target, std::fs::Permissions::from_mode(0o640)).unwrap();

        write_records(dir.path(), "lowofo", "2021", &[record("Stage1", "10", "03/01, 2021")])
            .unwrap();

        let mode = std::fs::metadata(&target).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }

    #[test]
    fn test_write_empty_records_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_records(dir.path(), "highofo", "2022", &[]).unwrap();
        let contents = std::fs::read_to_string(path).unwrap();
        assert_eq!(contents, "Stage,Percent,Date\n");
    }

    #[test]
    fn test_write_records_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let result = write_records(&missing, "highofo", "2022", &[]);
        assert!(matches!(result, Err(ScrapeError::Io(_))));
    }
}
