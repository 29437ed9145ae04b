use std::{
    fmt::Display,
    fs::File,
    hash::{Hash, Hasher},
    io,
    path::Path,
};

use super::DatasetError;

/// A single table cell
#[derive(Clone, Debug)]
pub enum Value {
    /// An empty cell
    Null,

    /// A whole number
    Integer(i64),

    /// A floating point number
    Real(f64),

    /// Free text
    Text(String),
}

impl Value {
    /// Returns the cell as a float, if it is numeric
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(value) => Some(*value as f64),
            Value::Real(value) => Some(*value),
            _ => None,
        }
    }
}

// Reals compare by bit pattern so that duplicate detection treats NaN like any other value.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a.to_bits() == b.to_bits(),
            (Value::Text(a), Value::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);

        match self {
            Value::Null => {}
            Value::Integer(value) => value.hash(state),
            Value::Real(value) => value.to_bits().hash(state),
            Value::Text(value) => value.hash(state),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Integer(value) => write!(f, "{}", value),
            Value::Real(value) => write!(f, "{}", value),
            Value::Text(value) => write!(f, "{}", value),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

/// The storage type of a column, inferred from its cells
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ColumnType {
    /// Every non-empty cell is a whole number
    Integer,

    /// Every non-empty cell is numeric
    Real,

    /// Anything else
    Text,
}

impl ColumnType {
    /// The SQL type name used when the column is persisted
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        }
    }

    /// Infer the narrowest type that fits every non-empty raw cell
    fn infer<'a>(cells: impl Iterator<Item = &'a str>) -> Self {
        let mut inferred = ColumnType::Integer;

        for cell in cells.filter(|cell| !cell.is_empty()) {
            inferred = match inferred {
                ColumnType::Integer if cell.parse::<i64>().is_ok() => ColumnType::Integer,
                ColumnType::Integer | ColumnType::Real if cell.parse::<f64>().is_ok() => {
                    ColumnType::Real
                }
                _ => return ColumnType::Text,
            };
        }

        inferred
    }

    /// Convert a raw cell, which is known to fit this type
    fn parse(&self, cell: String) -> Value {
        if cell.is_empty() {
            return Value::Null;
        }

        match self {
            ColumnType::Integer => cell.parse().map(Value::Integer).unwrap_or(Value::Text(cell)),
            ColumnType::Real => cell.parse().map(Value::Real).unwrap_or(Value::Text(cell)),
            ColumnType::Text => Value::Text(cell),
        }
    }
}

/// A row-major in-memory table with named columns
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Table {
    /// Column names, in order
    columns: Vec<String>,

    /// Rows, each exactly as wide as `columns`
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Creates an empty table with the given columns
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Creates a table from rows, checking that every row fits the columns
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, DatasetError> {
        let mut table = Self::new(columns);
        table.rows.reserve(rows.len());

        for row in rows {
            table.push_row(row)?;
        }

        Ok(table)
    }

    /// Reads a comma-separated file whose first row is the header
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();

        let file = File::open(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_reader(io::BufReader::new(file))
    }

    /// Reads comma-separated text whose first row is the header
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, DatasetError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut raw: Vec<Vec<String>> = Vec::new();
        for record in reader.records() {
            raw.push(record?.iter().map(str::to_string).collect());
        }

        let types: Vec<ColumnType> = (0..columns.len())
            .map(|index| ColumnType::infer(raw.iter().map(|row| row[index].as_str())))
            .collect();

        let rows = raw
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .zip(&types)
                    .map(|(cell, column_type)| column_type.parse(cell))
                    .collect()
            })
            .collect();

        Ok(Self { columns, rows })
    }

    /// Column names, in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows, in order
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// The number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The position of the first column with the given name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Iterate over the cells of a named column
    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &Value>, DatasetError> {
        let index = self
            .column_index(name)
            .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))?;

        Ok(self.rows.iter().map(move |row| &row[index]))
    }

    /// The type of a column, inferred from its cells
    pub fn column_type(&self, index: usize) -> ColumnType {
        let mut inferred = ColumnType::Integer;

        for row in &self.rows {
            match (&row[index], inferred) {
                (Value::Null, _) | (Value::Integer(_), _) => {}
                (Value::Real(_), ColumnType::Integer) => inferred = ColumnType::Real,
                (Value::Real(_), _) => {}
                (Value::Text(_), _) => return ColumnType::Text,
            }
        }

        inferred
    }

    /// Append a row, which must be as wide as the table
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), DatasetError> {
        if row.len() != self.columns.len() {
            return Err(DatasetError::RowWidth {
                expected: self.columns.len(),
                found: row.len(),
            });
        }

        self.rows.push(row);

        Ok(())
    }

    /// Keep only the rows matching the predicate, in their original order
    pub fn retain_rows(&mut self, keep: impl FnMut(&Vec<Value>) -> bool) {
        self.rows.retain(keep);
    }

    /// Split the table into its columns and rows
    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<Value>>) {
        (self.columns, self.rows)
    }
}
