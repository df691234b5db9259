// Typed key/value parameter registry.
//
// Parameters are addressed by slash-separated keys such as
// `limits/nodes` or `branching/mostinf/priority`. Every key is registered
// with a type, a default value and (for numbers) an admissible range.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::domain::{Error, RelaxationBackend, Result};

/// Value of a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Real(f64),
    Str(String),
}

impl ParamValue {
    fn kind(&self) -> &'static str {
        match self {
            ParamValue::Bool(_) => "bool",
            ParamValue::Int(_) => "int",
            ParamValue::Real(_) => "real",
            ParamValue::Str(_) => "string",
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{}", if *v { "TRUE" } else { "FALSE" }),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Real(v) => write!(f, "{}", v),
            ParamValue::Str(v) => write!(f, "\"{}\"", v),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v.into())
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Real(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

#[derive(Debug, Clone)]
struct Param {
    value: ParamValue,
    default: ParamValue,
    min: f64,
    max: f64,
    description: String,
}

/// Parameter registry of a model.
#[derive(Debug, Clone)]
pub struct Params {
    entries: BTreeMap<String, Param>,
}

pub const VERBLEVEL: &str = "display/verblevel";
pub const DISPLAY_FREQ: &str = "display/freq";
pub const NODE_LIMIT: &str = "limits/nodes";
pub const TIME_LIMIT: &str = "limits/time";
pub const GAP_LIMIT: &str = "limits/gap";
pub const FEASTOL: &str = "numerics/feastol";
pub const RANDOM_SEED: &str = "randomization/seed";
pub const MAX_OPEN_NODES: &str = "memory/maxopennodes";
pub const LP_SOLVER: &str = "lp/solver";

/// Value the registry uses for "no limit" on real parameters.
pub const INFINITY: f64 = 1e20;

impl Default for Params {
    fn default() -> Self {
        let mut params = Self {
            entries: BTreeMap::new(),
        };
        params.add_int(VERBLEVEL, "verbosity level (0: none ... 5: full)", 3, 0, 5);
        params.add_int(DISPLAY_FREQ, "progress line every this many nodes", 100, 1, i64::MAX);
        params.add_int(NODE_LIMIT, "maximal number of nodes (-1: unlimited)", -1, -1, i64::MAX);
        params.add_real(TIME_LIMIT, "maximal solving time in seconds", INFINITY, 0.0, INFINITY);
        params.add_real(GAP_LIMIT, "stop when the relative gap drops below this", 0.0, 0.0, INFINITY);
        params.add_real(FEASTOL, "integrality and feasibility tolerance", 1e-6, 1e-12, 1e-1);
        params.add_int(RANDOM_SEED, "global random seed", 0, 0, i64::from(u32::MAX));
        params.add_int(
            MAX_OPEN_NODES,
            "switch to memory-saving node selection above this many open nodes (-1: never)",
            -1,
            -1,
            i64::MAX,
        );
        params.add_str(LP_SOLVER, "LP relaxation backend (highs, cbc)", "highs");
        params
    }
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_bool(&mut self, key: &str, description: &str, default: bool) {
        self.insert(key, description, ParamValue::Bool(default), 0.0, 1.0);
    }

    pub fn add_int(&mut self, key: &str, description: &str, default: i64, min: i64, max: i64) {
        self.insert(key, description, ParamValue::Int(default), min as f64, max as f64);
    }

    pub fn add_real(&mut self, key: &str, description: &str, default: f64, min: f64, max: f64) {
        self.insert(key, description, ParamValue::Real(default), min, max);
    }

    pub fn add_str(&mut self, key: &str, description: &str, default: &str) {
        self.insert(key, description, ParamValue::Str(default.to_string()), 0.0, 0.0);
    }

    fn insert(&mut self, key: &str, description: &str, default: ParamValue, min: f64, max: f64) {
        self.entries.insert(
            key.to_string(),
            Param {
                value: default.clone(),
                default,
                min,
                max,
                description: description.to_string(),
            },
        );
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Set a parameter. Ints are accepted for real parameters.
    pub fn set(&mut self, key: &str, value: impl Into<ParamValue>) -> Result<()> {
        let value = value.into();
        let param = self
            .entries
            .get_mut(key)
            .ok_or_else(|| Error::UnknownParameter(key.to_string()))?;

        let value = match (&param.default, value) {
            (ParamValue::Real(_), ParamValue::Int(v)) => ParamValue::Real(v as f64),
            (default, value) if default.kind() != value.kind() => {
                return Err(Error::invalid_value(
                    key,
                    format!("expected {}, got {}", default.kind(), value.kind()),
                ));
            }
            (_, value) => value,
        };

        let numeric = match &value {
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Real(v) => Some(*v),
            _ => None,
        };
        if let Some(v) = numeric {
            if v.is_nan() || v < param.min || v > param.max {
                return Err(Error::invalid_value(
                    key,
                    format!("{} is outside [{}, {}]", v, param.min, param.max),
                ));
            }
        }
        if key == LP_SOLVER {
            if let ParamValue::Str(s) = &value {
                if RelaxationBackend::from_param(s).is_none() {
                    return Err(Error::invalid_value(key, format!("unknown LP solver '{}'", s)));
                }
            }
        }

        param.value = value;
        Ok(())
    }

    /// Set a parameter from its textual form, as found in settings files.
    pub fn set_from_str(&mut self, key: &str, raw: &str) -> Result<()> {
        let param = self
            .entries
            .get(key)
            .ok_or_else(|| Error::UnknownParameter(key.to_string()))?;
        let raw = raw.trim();
        let value = match param.default {
            ParamValue::Bool(_) => match raw.to_ascii_lowercase().as_str() {
                "true" | "t" | "1" | "yes" => ParamValue::Bool(true),
                "false" | "f" | "0" | "no" => ParamValue::Bool(false),
                _ => return Err(Error::invalid_value(key, format!("'{}' is not a bool", raw))),
            },
            ParamValue::Int(_) => raw
                .parse::<i64>()
                .map(ParamValue::Int)
                .map_err(|e| Error::invalid_value(key, e.to_string()))?,
            ParamValue::Real(_) => raw
                .parse::<f64>()
                .map(ParamValue::Real)
                .map_err(|e| Error::invalid_value(key, e.to_string()))?,
            ParamValue::Str(_) => ParamValue::Str(raw.trim_matches('"').to_string()),
        };
        self.set(key, value)
    }

    /// Read a settings file with one `key = value` per line; `#` starts a comment.
    pub fn read(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        for (i, line) in text.lines().enumerate() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let (key, value) = line.split_once('=').ok_or_else(|| Error::Read {
                path: path.to_path_buf(),
                line: i + 1,
                message: "expected 'key = value'".to_string(),
            })?;
            self.set_from_str(key.trim(), value).map_err(|e| match e {
                Error::UnknownParameter(_) | Error::InvalidParameterValue { .. } => Error::Read {
                    path: path.to_path_buf(),
                    line: i + 1,
                    message: e.to_string(),
                },
                other => other,
            })?;
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<&ParamValue> {
        self.entries
            .get(key)
            .map(|p| &p.value)
            .ok_or_else(|| Error::UnknownParameter(key.to_string()))
    }

    pub fn get_bool(&self, key: &str) -> Result<bool> {
        match self.get(key)? {
            ParamValue::Bool(v) => Ok(*v),
            other => Err(Error::invalid_value(key, format!("is {}, not bool", other.kind()))),
        }
    }

    pub fn get_int(&self, key: &str) -> Result<i64> {
        match self.get(key)? {
            ParamValue::Int(v) => Ok(*v),
            other => Err(Error::invalid_value(key, format!("is {}, not int", other.kind()))),
        }
    }

    pub fn get_real(&self, key: &str) -> Result<f64> {
        match self.get(key)? {
            ParamValue::Real(v) => Ok(*v),
            ParamValue::Int(v) => Ok(*v as f64),
            other => Err(Error::invalid_value(key, format!("is {}, not real", other.kind()))),
        }
    }

    pub fn get_str(&self, key: &str) -> Result<&str> {
        match self.get(key)? {
            ParamValue::Str(v) => Ok(v),
            other => Err(Error::invalid_value(key, format!("is {}, not string", other.kind()))),
        }
    }

    pub fn description(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|p| p.description.as_str())
    }

    /// Parameters whose value differs from the default.
    pub fn changed(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries
            .iter()
            .filter(|(_, p)| p.value != p.default)
            .map(|(k, p)| (k.as_str(), &p.value))
    }

    pub fn reset(&mut self) {
        for p in self.entries.values_mut() {
            p.value = p.default.clone();
        }
    }
}

/// Typed snapshot of the solver parameters, taken when a solve starts.
#[derive(Debug, Clone)]
pub struct Settings {
    pub verblevel: u8,
    pub display_freq: u64,
    pub node_limit: Option<u64>,
    pub time_limit: Option<f64>,
    pub gap_limit: f64,
    pub feastol: f64,
    pub random_seed: u64,
    pub max_open_nodes: Option<usize>,
    pub backend: RelaxationBackend,
}

impl Settings {
    pub fn from_params(params: &Params) -> Result<Self> {
        let node_limit = params.get_int(NODE_LIMIT)?;
        let time_limit = params.get_real(TIME_LIMIT)?;
        let max_open = params.get_int(MAX_OPEN_NODES)?;
        let backend = params.get_str(LP_SOLVER)?;
        Ok(Self {
            verblevel: params.get_int(VERBLEVEL)?.clamp(0, 5) as u8,
            display_freq: params.get_int(DISPLAY_FREQ)?.max(1) as u64,
            node_limit: u64::try_from(node_limit).ok(),
            time_limit: (time_limit < INFINITY).then_some(time_limit),
            gap_limit: params.get_real(GAP_LIMIT)?,
            feastol: params.get_real(FEASTOL)?,
            random_seed: params.get_int(RANDOM_SEED)?.max(0) as u64,
            max_open_nodes: usize::try_from(max_open).ok(),
            backend: RelaxationBackend::from_param(backend)
                .ok_or_else(|| Error::invalid_value(LP_SOLVER, backend.to_string()))?,
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            verblevel: 3,
            display_freq: 100,
            node_limit: None,
            time_limit: None,
            gap_limit: 0.0,
            feastol: 1e-6,
            random_seed: 0,
            max_open_nodes: None,
            backend: RelaxationBackend::Highs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_settings_default() {
        let s = Settings::from_params(&Params::new()).unwrap();
        let d = Settings::default();
        assert_eq!(s.verblevel, d.verblevel);
        assert_eq!(s.node_limit, d.node_limit);
        assert_eq!(s.time_limit, d.time_limit);
        assert_eq!(s.max_open_nodes, d.max_open_nodes);
        assert_eq!(s.backend, d.backend);
    }

    #[test]
    fn test_unknown_and_mistyped_parameters() {
        let mut p = Params::new();
        assert!(matches!(p.set("limits/bogus", 1), Err(Error::UnknownParameter(_))));
        assert!(matches!(
            p.set(NODE_LIMIT, "ten"),
            Err(Error::InvalidParameterValue { .. })
        ));
        assert!(matches!(
            p.set(VERBLEVEL, 9),
            Err(Error::InvalidParameterValue { .. })
        ));
        assert!(p.set(LP_SOLVER, "gurobi").is_err());
    }

    #[test]
    fn test_int_accepted_for_real() {
        let mut p = Params::new();
        p.set(TIME_LIMIT, 60).unwrap();
        assert_eq!(p.get_real(TIME_LIMIT).unwrap(), 60.0);
        assert_eq!(Settings::from_params(&p).unwrap().time_limit, Some(60.0));
    }

    #[test]
    fn test_changed_and_reset() {
        let mut p = Params::new();
        p.set(NODE_LIMIT, 10).unwrap();
        let changed: Vec<_> = p.changed().map(|(k, _)| k.to_string()).collect();
        assert_eq!(changed, vec![NODE_LIMIT.to_string()]);
        p.reset();
        assert_eq!(p.changed().count(), 0);
    }

    #[test]
    fn test_read_settings_file() {
        let path = std::env::temp_dir().join(format!("letsbranch-params-{}.set", std::process::id()));
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "# quiet run").unwrap();
        writeln!(f, "display/verblevel = 0").unwrap();
        writeln!(f, "limits/gap = 0.01   # one percent").unwrap();
        writeln!(f, "lp/solver = \"highs\"").unwrap();
        drop(f);

        let mut p = Params::new();
        p.read(&path).unwrap();
        assert_eq!(p.get_int(VERBLEVEL).unwrap(), 0);
        assert_eq!(p.get_real(GAP_LIMIT).unwrap(), 0.01);

        fs::write(&path, "display/verblevel = 1\nlimits/nodes\n").unwrap();
        let err = p.read(&path).unwrap_err();
        assert!(matches!(err, Error::Read { line: 2, .. }), "{err}");
        fs::remove_file(&path).ok();
    }
}
