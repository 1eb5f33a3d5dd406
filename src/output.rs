//! Writing of the mapped scores as TSV.

use std::{io::Write, path::Path};

use crate::data::{record::Record, scores::INDEX_FIELD, xref::HGVSP_FIELD};

/// Fields that are used internally and not written.
pub const INTERNAL_FIELDS: &[&str] = &[HGVSP_FIELD, INDEX_FIELD];

/// Prefix that is stripped from column names.
const HGVS_PREFIX: &str = "hgvs_";

/// Output columns, taken from the first record without the internal fields.
pub fn columns(records: &[Record]) -> Vec<String> {
    records
        .first()
        .map(|record| {
            record
                .keys()
                .filter(|key| !INTERNAL_FIELDS.contains(key))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Column name as written to the header, e.g., `pro` for `hgvs_pro`.
pub fn header_name(column: &str) -> &str {
    column.strip_prefix(HGVS_PREFIX).unwrap_or(column)
}

/// Write `records` as TSV to `writer`.
///
/// Values are looked up by column; missing values are written empty and
/// fields that are not a column are ignored.  Nothing is written if there
/// are no records.
///
/// # Errors
///
/// If writing fails.
pub fn write<W>(writer: W, records: &[Record]) -> Result<(), anyhow::Error>
where
    W: Write,
{
    let columns = columns(records);
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(writer);
    if !records.is_empty() {
        csv_writer.write_record(columns.iter().map(|column| header_name(column)))?;
    }
    for record in records {
        csv_writer.write_record(
            columns
                .iter()
                .map(|column| record.get(column).unwrap_or_default()),
        )?;
    }
    csv_writer.flush()?;

    Ok(())
}

/// Write `records` as TSV file.
///
/// # Arguments
///
/// * `path` - Path to the output file.
/// * `records` - The records to write.
///
/// # Errors
///
/// If anything goes wrong, it returns a generic `anyhow::Error`.
pub fn write_file<P>(path: P, records: &[Record]) -> Result<(), anyhow::Error>
where
    P: AsRef<Path>,
{
    if records.is_empty() {
        tracing::warn!("no variants could be mapped, writing empty file");
    }
    let file = std::fs::File::create(path.as_ref())
        .map_err(|e| anyhow::anyhow!("problem creating file {:?}: {}", path.as_ref(), e))?;
    write(std::io::BufWriter::new(file), records)
        .map_err(|e| anyhow::anyhow!("problem writing file {:?}: {}", path.as_ref(), e))
}

#[cfg(test)]
mod test {
    use super::*;

    fn records() -> Vec<Record> {
        vec![
            [
                ("HGVSp", "NP_000001.1:p.Met1Leu"),
                ("chr", "1"),
                ("start", "101"),
                ("hgvs", "NP_000001.1:p.Met1Leu"),
                ("hgvs_pro", "p.Met1Leu"),
                ("score", "1.5"),
                ("index", "1"),
            ]
            .into_iter()
            .collect(),
            [
                ("chr", "X"),
                ("hgvs_pro", "p.Ala2Val"),
                ("score", "-0.25"),
                ("extra", "ignored"),
            ]
            .into_iter()
            .collect(),
        ]
    }

    #[test]
    fn columns_skip_internal() {
        assert_eq!(
            columns(&records()),
            vec!["chr", "start", "hgvs", "hgvs_pro", "score"]
        );
    }

    #[rstest::rstest]
    #[case("hgvs_pro", "pro")]
    #[case("hgvs_nt", "nt")]
    #[case("hgvs", "hgvs")]
    #[case("score_hgvs_x", "score_hgvs_x")]
    fn header_names(#[case] column: &str, #[case] expected: &str) {
        assert_eq!(header_name(column), expected);
    }

    #[test]
    fn write_records() -> Result<(), anyhow::Error> {
        let mut buf = Vec::new();

        write(&mut buf, &records())?;

        assert_eq!(
            String::from_utf8(buf)?,
            "chr\tstart\thgvs\tpro\tscore\n\
             1\t101\tNP_000001.1:p.Met1Leu\tp.Met1Leu\t1.5\n\
             X\t\t\tp.Ala2Val\t-0.25\n"
        );

        Ok(())
    }

    #[test]
    fn write_nothing() -> Result<(), anyhow::Error> {
        let mut buf = Vec::new();

        write(&mut buf, &[])?;

        assert!(buf.is_empty());

        Ok(())
    }

    #[tracing_test::traced_test]
    #[test]
    fn write_file_empty() -> Result<(), anyhow::Error> {
        let tmp_dir = tempfile::TempDir::new()?;
        let path = tmp_dir.path().join("out.tsv");

        write_file(&path, &[])?;

        assert!(path.exists());
        assert_eq!(std::fs::read_to_string(&path)?, "");
        assert!(logs_contain("no variants could be mapped"));

        Ok(())
    }
}
