//! TPC-H flat-file reader
//!
//! `dbgen` writes one `<table>.tbl` file per table: one row per line,
//! columns separated by `|`, usually with a trailing `|`. There is no
//! quoting, so a line is split on the separator and every field is
//! trimmed.

mod rows;

pub use rows::{Customer, LineItem, Nation, Order, Part, PartSupp, Region, Supplier};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{BenchError, Result};

/// The eight TPC-H tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Region,
    Nation,
    Supplier,
    Customer,
    Part,
    PartSupp,
    Orders,
    LineItem,
}

impl Table {
    /// Tables in foreign-key dependency order. Loading in this order
    /// guarantees every relationship endpoint already exists.
    pub const LOAD_ORDER: [Table; 8] = [
        Table::Region,
        Table::Nation,
        Table::Supplier,
        Table::Customer,
        Table::Part,
        Table::PartSupp,
        Table::Orders,
        Table::LineItem,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Table::Region => "region",
            Table::Nation => "nation",
            Table::Supplier => "supplier",
            Table::Customer => "customer",
            Table::Part => "part",
            Table::PartSupp => "partsupp",
            Table::Orders => "orders",
            Table::LineItem => "lineitem",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.tbl", self.name())
    }

    pub fn path(self, data_dir: &Path) -> PathBuf {
        data_dir.join(self.file_name())
    }

    /// Number of columns `dbgen` writes for this table
    pub fn column_count(self) -> usize {
        match self {
            Table::Region => 3,
            Table::Nation => 4,
            Table::Supplier => 7,
            Table::Customer => 8,
            Table::Part => 9,
            Table::PartSupp => 5,
            Table::Orders => 9,
            Table::LineItem => 16,
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Table {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        let wanted = wanted.strip_suffix(".tbl").unwrap_or(&wanted);
        Table::LOAD_ORDER
            .into_iter()
            .find(|t| t.name() == wanted)
            .ok_or_else(|| BenchError::Config(format!("unknown TPC-H table '{s}'")))
    }
}

/// A typed TPC-H row
pub trait TpchRow: Sized {
    const TABLE: Table;

    /// Build the row from the split fields of one line
    fn from_fields(fields: &mut Fields<'_>) -> Result<Self>;
}

/// Cursor over the fields of one line, producing positioned parse errors
pub struct Fields<'a> {
    table: Table,
    line: usize,
    values: Vec<&'a str>,
    next: usize,
}

impl<'a> Fields<'a> {
    /// Split `raw` into fields for `table`. A trailing separator is
    /// accepted; columns beyond the table's width are ignored.
    pub fn split(table: Table, line: usize, raw: &'a str) -> Result<Self> {
        let mut values: Vec<&str> = raw
            .trim_end_matches(['\r', '\n'])
            .split('|')
            .map(str::trim)
            .collect();
        if values.len() > table.column_count() && values.last() == Some(&"") {
            values.pop();
        }
        if values.len() < table.column_count() {
            return Err(BenchError::Parse {
                table,
                line,
                column: values.len() + 1,
                message: format!(
                    "expected {} columns, found {}",
                    table.column_count(),
                    values.len()
                ),
            });
        }
        Ok(Self {
            table,
            line,
            values,
            next: 0,
        })
    }

    fn take(&mut self) -> (usize, &'a str) {
        let column = self.next + 1;
        let value = self.values.get(self.next).copied().unwrap_or("");
        self.next += 1;
        (column, value)
    }

    fn error(&self, column: usize, message: String) -> BenchError {
        BenchError::Parse {
            table: self.table,
            line: self.line,
            column,
            message,
        }
    }

    pub fn int(&mut self) -> Result<i64> {
        let (column, value) = self.take();
        value
            .parse()
            .map_err(|_| self.error(column, format!("'{value}' is not an integer")))
    }

    pub fn float(&mut self) -> Result<f64> {
        let (column, value) = self.take();
        value
            .parse()
            .map_err(|_| self.error(column, format!("'{value}' is not a number")))
    }

    pub fn text(&mut self) -> String {
        self.take().1.to_string()
    }

    pub fn date(&mut self) -> Result<chrono::NaiveDate> {
        let (column, value) = self.take();
        chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map_err(|e| self.error(column, format!("'{value}' is not a YYYY-MM-DD date: {e}")))
    }
}

/// Streaming reader over one `.tbl` file
pub struct TableReader<R, B = BufReader<File>> {
    lines: Lines<B>,
    line: usize,
    _row: PhantomData<R>,
}

impl<R: TpchRow> TableReader<R> {
    /// Open `<data_dir>/<table>.tbl`
    pub fn open(data_dir: &Path) -> Result<Self> {
        let path = R::TABLE.path(data_dir);
        if !path.exists() {
            return Err(BenchError::MissingTable(path.display().to_string()));
        }
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: TpchRow, B: BufRead> TableReader<R, B> {
    pub fn new(reader: B) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
            _row: PhantomData,
        }
    }
}

impl<R: TpchRow, B: BufRead> Iterator for TableReader<R, B> {
    type Item = Result<R>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let raw = match self.lines.next()? {
                Ok(raw) => raw,
                Err(e) => return Some(Err(e.into())),
            };
            self.line += 1;
            if raw.trim().is_empty() {
                continue;
            }
            return Some(
                Fields::split(R::TABLE, self.line, &raw).and_then(|mut f| R::from_fields(&mut f)),
            );
        }
    }
}

/// Read every row of a table into memory
pub fn read_table<R: TpchRow>(data_dir: &Path) -> Result<Vec<R>> {
    TableReader::<R>::open(data_dir)?.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse<R: TpchRow>(input: &str) -> Result<Vec<R>> {
        TableReader::<R, _>::new(Cursor::new(input.to_string())).collect()
    }

    #[test]
    fn test_table_from_str() {
        assert_eq!("lineitem".parse::<Table>().unwrap(), Table::LineItem);
        assert_eq!("PartSupp".parse::<Table>().unwrap(), Table::PartSupp);
        assert_eq!("orders.tbl".parse::<Table>().unwrap(), Table::Orders);
        assert!("order".parse::<Table>().is_err());
    }

    #[test]
    fn test_trailing_separator_is_optional() {
        let with = parse::<Region>("0|AFRICA|lar deposits. blithely final|\n").unwrap();
        let without = parse::<Region>("0|AFRICA|lar deposits. blithely final\n").unwrap();
        assert_eq!(with, without);
        assert_eq!(with[0].name, "AFRICA");
    }

    #[test]
    fn test_blank_lines_are_skipped_and_lines_counted() {
        let err = parse::<Region>("0|AFRICA|x|\n\n1|AMERICA\n").unwrap_err();
        match err {
            BenchError::Parse {
                table,
                line,
                column,
                ..
            } => {
                assert_eq!(table, Table::Region);
                assert_eq!(line, 3);
                assert_eq!(column, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bad_integer_reports_column() {
        let err = parse::<Nation>("x|ALGERIA|0|comment|\n").unwrap_err();
        assert!(matches!(
            err,
            BenchError::Parse {
                line: 1,
                column: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_bad_date_reports_column() {
        let line = "1|36901|O|173665.47|1996-13-02|5-LOW|Clerk#000000951|0|nstructions sleep|\n";
        let err = parse::<Order>(line).unwrap_err();
        assert!(matches!(err, BenchError::Parse { column: 5, .. }));
    }

    #[test]
    fn test_fields_are_trimmed() {
        let rows = parse::<Customer>(
            "1| Customer#000000001 |IVhzIApeRb ot,c,E|15|25-989-741-2988|711.56|BUILDING  |comment|\n",
        )
        .unwrap();
        assert_eq!(rows[0].name, "Customer#000000001");
        assert_eq!(rows[0].mktsegment, "BUILDING");
    }

    #[test]
    fn test_open_missing_table() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_table::<Region>(dir.path()).unwrap_err();
        assert!(matches!(err, BenchError::MissingTable(_)));
    }

    #[test]
    fn test_read_table_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("region.tbl"),
            "0|AFRICA|a|\n1|AMERICA|b|\n2|ASIA|c|\n",
        )
        .unwrap();
        let rows = read_table::<Region>(dir.path()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].regionkey, 2);
    }
}
