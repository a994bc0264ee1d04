//! Table persistence.
//!
//! Every output is written in full to `<name>.tmp` beside its target and
//! then renamed over it, so a reader never sees a half-written table and a
//! failed write leaves the previous file in place.

use std::path::{Path, PathBuf};

use road_toll_warehouse_models::Table;
use serde::Serialize;

use crate::WarehouseError;

/// Path of a persisted table.
#[must_use]
pub fn table_path<T: Table>(dir: &Path) -> PathBuf {
    dir.join(format!("{}.csv", T::NAME))
}

/// Writes a table as `<dir>/<T::NAME>.csv`.
///
/// The header comes from [`Table::COLUMNS`] so an empty table still has
/// one.
///
/// # Errors
///
/// Returns [`WarehouseError`] if the file cannot be written or a row cannot
/// be serialized.
pub fn write_table<T: Table>(dir: &Path, rows: &[T]) -> Result<PathBuf, WarehouseError> {
    let path = table_path::<T>(dir);
    let tmp_path = dir.join(format!("{}.csv.tmp", T::NAME));

    let result = write_csv(&tmp_path, T::COLUMNS, rows);
    if let Err(e) = result {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e);
    }
    std::fs::rename(&tmp_path, &path)?;

    log::info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(path)
}

fn write_csv<T: Serialize>(
    path: &Path,
    columns: &[&str],
    rows: &[T],
) -> Result<(), WarehouseError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(columns)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes a value as pretty-printed JSON to `<dir>/<file_name>`.
///
/// # Errors
///
/// Returns [`WarehouseError`] if serialization or the write fails.
pub fn write_json<T: Serialize>(
    dir: &Path,
    file_name: &str,
    value: &T,
) -> Result<PathBuf, WarehouseError> {
    let path = dir.join(file_name);
    let tmp_path = dir.join(format!("{file_name}.tmp"));
    let contents = serde_json::to_string_pretty(value)?;
    std::fs::write(&tmp_path, contents)?;
    std::fs::rename(&tmp_path, &path)?;
    log::info!("Saved {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use road_toll_crash_models::CrashId;
    use road_toll_warehouse_models::{RoadConditionRow, VehicleRow};

    use super::*;

    #[test]
    fn writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let rows = vec![RoadConditionRow {
            crash_id: CrashId(20_101_001),
            speed_limit: Some("100".to_owned()),
            national_road_type: None,
        }];

        let path = write_table(dir.path(), &rows).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "crash_id,speed_limit,national_road_type\n20101001,100,\n"
        );
        assert!(!dir.path().join("road_condition_dimension.csv.tmp").exists());
    }

    #[test]
    fn empty_table_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_table::<VehicleRow>(dir.path(), &[]).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(
            text,
            "crash_id,bus_involvement,heavy_rigid_truck_involvement,articulated_truck_involvement,vehicle_type\n"
        );
    }

    #[test]
    fn overwrites_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let row = |limit: &str| RoadConditionRow {
            crash_id: CrashId(1),
            speed_limit: Some(limit.to_owned()),
            national_road_type: None,
        };
        write_table(dir.path(), &[row("60"), row("80")]).unwrap();
        let path = write_table(dir.path(), &[row("100")]).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains(",100,"));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(write_table::<VehicleRow>(&missing, &[]).is_err());
    }
}
