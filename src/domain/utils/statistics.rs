use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::Result;

/// Column separator of every statistics file.
pub const DELIMITER: u8 = b';';

/// One row of a fitness-history file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FitnessSample {
    pub iteration: usize,
    pub best_fitness: f64,
}

/// Writes `records` as `;`-separated CSV with a header row derived from the field names.
pub fn write_records<T: Serialize>(path: impl AsRef<Path>, records: &[T]) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write_records_to(file, records)?;
    log::info!("Wrote {} records to '{}'.", records.len(), path.as_ref().display());
    Ok(())
}

/// Same as `write_records`, for any writer (stdout, a buffer).
pub fn write_records_to<W: Write, T: Serialize>(writer: W, records: &[T]) -> Result<()> {
    let mut csv_wtr = csv::WriterBuilder::new().delimiter(DELIMITER).from_writer(writer);
    for record in records {
        csv_wtr.serialize(record)?;
    }
    csv_wtr.flush()?;
    Ok(())
}

/// One `Iteration;BestFitness` row per entry of `history`.
pub fn write_fitness_history(path: impl AsRef<Path>, history: &[f64]) -> Result<()> {
    write_records(path, &fitness_samples(history))
}

pub fn fitness_samples(history: &[f64]) -> Vec<FitnessSample> {
    history.iter().enumerate().map(|(iteration, &best_fitness)| FitnessSample { iteration, best_fitness }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_are_semicolon_separated_with_header() {
        let mut buffer = Vec::new();
        write_records_to(&mut buffer, &fitness_samples(&[1.5, 0.25])).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, "Iteration;BestFitness\n0;1.5\n1;0.25\n");
    }

    #[test]
    fn test_empty_history_writes_nothing() {
        let mut buffer = Vec::new();
        write_records_to(&mut buffer, &fitness_samples(&[])).unwrap();
        assert!(buffer.is_empty());
    }
}
