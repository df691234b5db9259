// Free-format MPS reader.
//
// Supported sections: `NAME`, `OBJSENSE`, `ROWS`, `COLUMNS` (with
// `INTORG`/`INTEND` markers), `RHS`, `RANGES`, `BOUNDS` and `ENDATA`.
// Fields are separated by whitespace, so names must not contain spaces.
//
// Ranged rows with two finite sides are split into a `>=` and a `<=`
// constraint sharing the row name.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::domain::{
    Constraint, ConstraintType, Error, ObjectiveFunction, OptimizationProblem, OptimizationType,
    Result, Variable, VariableType,
};

/// Read an MPS file.
pub fn read(path: impl AsRef<Path>) -> Result<OptimizationProblem> {
    let path = path.as_ref();
    let file = File::open(path)?;
    parse(BufReader::new(file), path)
}

/// Parse MPS text held in memory.
pub fn parse_str(text: &str) -> Result<OptimizationProblem> {
    parse(text.as_bytes(), Path::new("<string>"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Name,
    ObjSense,
    Rows,
    Columns,
    Rhs,
    Ranges,
    Bounds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowKind {
    Le,
    Ge,
    Eq,
}

struct RowData {
    name: String,
    kind: RowKind,
    terms: Vec<(usize, f64)>,
    rhs: f64,
    range: Option<f64>,
}

struct ColumnData {
    name: String,
    cost: f64,
    integer: bool,
    binary: bool,
    lower: f64,
    upper: f64,
}

struct Reader {
    path: PathBuf,
    line: usize,
    name: String,
    sense: OptimizationType,
    objective_row: Option<String>,
    /// Free rows beyond the first `N` row are ignored.
    ignored_rows: Vec<String>,
    rows: Vec<RowData>,
    row_index: HashMap<String, usize>,
    columns: Vec<ColumnData>,
    column_index: HashMap<String, usize>,
    in_integer_block: bool,
    offset: f64,
}

/// Parse MPS text from any buffered reader; `path` is used in error messages.
pub fn parse(reader: impl BufRead, path: &Path) -> Result<OptimizationProblem> {
    let mut r = Reader {
        path: path.to_path_buf(),
        line: 0,
        name: String::new(),
        sense: OptimizationType::Minimize,
        objective_row: None,
        ignored_rows: Vec::new(),
        rows: Vec::new(),
        row_index: HashMap::new(),
        columns: Vec::new(),
        column_index: HashMap::new(),
        in_integer_block: false,
        offset: 0.0,
    };

    let mut section: Option<Section> = None;
    let mut finished = false;

    for line in reader.lines() {
        let line = line?;
        r.line += 1;

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('*') {
            continue;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();

        // Section headers start in the first column
        if !line.starts_with(char::is_whitespace) {
            match fields[0] {
                "NAME" => {
                    r.name = fields.get(1).copied().unwrap_or_default().to_string();
                    section = Some(Section::Name);
                }
                "OBJSENSE" => {
                    if let Some(sense) = fields.get(1) {
                        r.sense = r.parse_sense(sense)?;
                    }
                    section = Some(Section::ObjSense);
                }
                "ROWS" => section = Some(Section::Rows),
                "COLUMNS" => section = Some(Section::Columns),
                "RHS" => section = Some(Section::Rhs),
                "RANGES" => section = Some(Section::Ranges),
                "BOUNDS" => section = Some(Section::Bounds),
                "ENDATA" => {
                    finished = true;
                    break;
                }
                "MAX" | "MAXIMIZE" | "MIN" | "MINIMIZE" if section == Some(Section::ObjSense) => {
                    r.sense = r.parse_sense(fields[0])?;
                }
                other => return Err(r.error(format!("unknown section '{other}'"))),
            }
            continue;
        }

        match section {
            Some(Section::ObjSense) => r.sense = r.parse_sense(fields[0])?,
            Some(Section::Rows) => r.read_row(&fields)?,
            Some(Section::Columns) => r.read_column(&fields)?,
            Some(Section::Rhs) => r.read_rhs(&fields)?,
            Some(Section::Ranges) => r.read_range(&fields)?,
            Some(Section::Bounds) => r.read_bound(&fields)?,
            Some(Section::Name) | None => {
                return Err(r.error("data line outside of a section"));
            }
        }
    }

    if !finished {
        return Err(r.error("missing ENDATA"));
    }
    r.finish()
}

impl Reader {
    fn error(&self, message: impl Into<String>) -> Error {
        Error::Read {
            path: self.path.clone(),
            line: self.line,
            message: message.into(),
        }
    }

    fn parse_sense(&self, field: &str) -> Result<OptimizationType> {
        match field.to_ascii_uppercase().as_str() {
            "MAX" | "MAXIMIZE" => Ok(OptimizationType::Maximize),
            "MIN" | "MINIMIZE" => Ok(OptimizationType::Minimize),
            other => Err(self.error(format!("unknown objective sense '{other}'"))),
        }
    }

    fn number(&self, field: &str) -> Result<f64> {
        field
            .parse::<f64>()
            .map_err(|_| self.error(format!("'{field}' is not a number")))
    }

    fn read_row(&mut self, fields: &[&str]) -> Result<()> {
        let [kind, name] = fields else {
            return Err(self.error("expected '<type> <row>'"));
        };
        let kind = match kind.to_ascii_uppercase().as_str() {
            "N" => {
                if self.objective_row.is_none() {
                    self.objective_row = Some(name.to_string());
                } else {
                    self.ignored_rows.push(name.to_string());
                }
                return Ok(());
            }
            "L" => RowKind::Le,
            "G" => RowKind::Ge,
            "E" => RowKind::Eq,
            other => return Err(self.error(format!("unknown row type '{other}'"))),
        };
        if self.row_index.contains_key(*name) || self.objective_row.as_deref() == Some(*name) {
            return Err(self.error(format!("duplicate row '{name}'")));
        }
        self.row_index.insert(name.to_string(), self.rows.len());
        self.rows.push(RowData {
            name: name.to_string(),
            kind,
            terms: Vec::new(),
            rhs: 0.0,
            range: None,
        });
        Ok(())
    }

    fn read_column(&mut self, fields: &[&str]) -> Result<()> {
        if fields.len() >= 3 && fields[1].trim_matches('\'') == "MARKER" {
            match fields[2].trim_matches('\'') {
                "INTORG" => self.in_integer_block = true,
                "INTEND" => self.in_integer_block = false,
                other => return Err(self.error(format!("unknown marker '{other}'"))),
            }
            return Ok(());
        }
        if fields.len() != 3 && fields.len() != 5 {
            return Err(self.error("expected '<column> <row> <value> [<row> <value>]'"));
        }

        let column = match self.column_index.get(fields[0]) {
            Some(&j) => j,
            None => {
                let j = self.columns.len();
                let integer = self.in_integer_block;
                self.column_index.insert(fields[0].to_string(), j);
                self.columns.push(ColumnData {
                    name: fields[0].to_string(),
                    cost: 0.0,
                    integer,
                    binary: false,
                    lower: 0.0,
                    upper: f64::INFINITY,
                });
                j
            }
        };

        for pair in fields[1..].chunks(2) {
            let value = self.number(pair[1])?;
            let row = pair[0];
            if self.objective_row.as_deref() == Some(row) {
                self.columns[column].cost = value;
            } else if let Some(&i) = self.row_index.get(row) {
                if value != 0.0 {
                    self.rows[i].terms.push((column, value));
                }
            } else if !self.ignored_rows.iter().any(|r| r == row) {
                return Err(self.error(format!("unknown row '{row}'")));
            }
        }
        Ok(())
    }

    /// Row/value pairs of an RHS or RANGES line, skipping the optional set name.
    fn pairs<'f>(&self, fields: &'f [&'f str]) -> Result<&'f [&'f str]> {
        match fields.len() {
            2 | 4 => Ok(fields),
            3 | 5 => Ok(&fields[1..]),
            _ => Err(self.error("expected '[<set>] <row> <value> [<row> <value>]'")),
        }
    }

    fn read_rhs(&mut self, fields: &[&str]) -> Result<()> {
        for pair in self.pairs(fields)?.chunks(2) {
            let value = self.number(pair[1])?;
            let row = pair[0];
            if self.objective_row.as_deref() == Some(row) {
                self.offset = -value;
            } else if let Some(&i) = self.row_index.get(row) {
                self.rows[i].rhs = value;
            } else if !self.ignored_rows.iter().any(|r| r == row) {
                return Err(self.error(format!("unknown row '{row}'")));
            }
        }
        Ok(())
    }

    fn read_range(&mut self, fields: &[&str]) -> Result<()> {
        for pair in self.pairs(fields)?.chunks(2) {
            let value = self.number(pair[1])?;
            let i = *self
                .row_index
                .get(pair[0])
                .ok_or_else(|| self.error(format!("unknown row '{}'", pair[0])))?;
            self.rows[i].range = Some(value);
        }
        Ok(())
    }

    fn read_bound(&mut self, fields: &[&str]) -> Result<()> {
        let kind = fields[0].to_ascii_uppercase();
        let needs_value = matches!(kind.as_str(), "UP" | "LO" | "FX" | "LI" | "UI");

        // Layout: <type> [<set>] <column> [<value>]
        let (column, value) = match (fields.len(), needs_value) {
            (4, _) => (fields[2], Some(fields[3])),
            (3, true) => (fields[1], Some(fields[2])),
            (3, false) if self.column_index.contains_key(fields[1]) && kind == "BV" => {
                (fields[1], Some(fields[2]))
            }
            (3, false) => (fields[2], None),
            (2, false) => (fields[1], None),
            _ => return Err(self.error("expected '<type> [<set>] <column> [<value>]'")),
        };
        let j = *self
            .column_index
            .get(column)
            .ok_or_else(|| self.error(format!("unknown column '{column}'")))?;
        // Always present for the bound types that use it.
        let v = value.map(|v| self.number(v)).transpose()?.unwrap_or_default();

        let col = &mut self.columns[j];
        match kind.as_str() {
            "UP" | "UI" => {
                if kind == "UI" {
                    col.integer = true;
                }
                if v < 0.0 && col.lower == 0.0 && col.integer {
                    col.lower = f64::NEG_INFINITY;
                }
                col.upper = v;
            }
            "LO" | "LI" => {
                col.lower = v;
                if kind == "LI" {
                    col.integer = true;
                }
            }
            "FX" => {
                col.lower = v;
                col.upper = v;
            }
            "FR" => {
                col.lower = f64::NEG_INFINITY;
                col.upper = f64::INFINITY;
            }
            "MI" => col.lower = f64::NEG_INFINITY,
            "PL" => col.upper = f64::INFINITY,
            "BV" => {
                col.binary = true;
                col.lower = 0.0;
                col.upper = 1.0;
            }
            other => return Err(self.error(format!("unknown bound type '{other}'"))),
        }
        Ok(())
    }

    fn finish(self) -> Result<OptimizationProblem> {
        let coefficients = self.columns.iter().map(|c| c.cost).collect();
        let objective =
            ObjectiveFunction::new(self.sense, coefficients).with_offset(self.offset);

        let variables = self
            .columns
            .into_iter()
            .map(|c| {
                let variable_type = if c.binary {
                    VariableType::Binary
                } else if c.integer {
                    VariableType::Integer
                } else {
                    VariableType::Continuous
                };
                Variable {
                    variable_type,
                    lower_bound: c.lower,
                    upper_bound: c.upper,
                    name: c.name,
                }
            })
            .collect();

        let mut problem = OptimizationProblem::new(objective, variables).with_name(self.name);
        for row in self.rows {
            for constraint in row_constraints(row) {
                problem = problem.add_constraint(constraint);
            }
        }
        Ok(problem)
    }
}

/// Turn a row and its optional range into one or two constraints.
fn row_constraints(row: RowData) -> Vec<Constraint> {
    let b = row.rhs;
    let (lhs, rhs) = match (row.kind, row.range) {
        (RowKind::Le, None) => (f64::NEG_INFINITY, b),
        (RowKind::Ge, None) => (b, f64::INFINITY),
        (RowKind::Eq, None) => (b, b),
        (RowKind::Le, Some(r)) => (b - r.abs(), b),
        (RowKind::Ge, Some(r)) => (b, b + r.abs()),
        (RowKind::Eq, Some(r)) if r < 0.0 => (b + r, b),
        (RowKind::Eq, Some(r)) => (b, b + r),
    };

    let make = |kind, bound| Constraint::new(kind, row.terms.clone(), bound).with_name(&row.name);
    if lhs == rhs {
        vec![make(ConstraintType::Equal, rhs)]
    } else {
        let mut constraints = Vec::with_capacity(2);
        if lhs.is_finite() {
            constraints.push(make(ConstraintType::GreaterThanOrEqual, lhs));
        }
        if rhs.is_finite() {
            constraints.push(make(ConstraintType::LessThanOrEqual, rhs));
        }
        constraints
    }
}
