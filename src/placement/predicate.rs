//! Placement Predicates
//!
//! A predicate constrains one pool field. Predicates arrive either typed
//! (built from profile provisioning properties) or as operator-prefixed
//! strings such as `">= 10"` or `"<is> true"` (custom profile properties).

use crate::error::{Error, Result};
use crate::model::StoragePoolSpec;
use regex::Regex;
use std::fmt;
use tracing::debug;

/// Tolerance for numeric equality
pub const EPSILON: f64 = 0.000_000_01;

// =============================================================================
// Field Paths
// =============================================================================

/// Fields of `extras.dataStorage`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataStorageField {
    IsSpaceEfficient,
    ProvisioningPolicy,
    RecoveryTimeObjective,
}

/// Fields of `extras.ioConnectivity`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IoConnectivityField {
    AccessProtocol,
    MaxIops,
    MaxBws,
}

/// Pool field a predicate applies to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldPath {
    Id,
    Name,
    DockId,
    StorageType,
    AvailabilityZone,
    TotalCapacity,
    FreeCapacity,
    DataStorage(DataStorageField),
    IoConnectivity(IoConnectivityField),
    /// Vendor attribute in `extras.advanced`; unknown keys land here too
    Advanced(String),
}

const ADVANCED_PREFIX: &str = "extras.advanced.";

impl FieldPath {
    /// Map a dotted key to a field. Never fails: unknown keys are advanced.
    pub fn parse(key: &str) -> Self {
        match key {
            "id" => FieldPath::Id,
            "name" => FieldPath::Name,
            "dockId" => FieldPath::DockId,
            "storageType" => FieldPath::StorageType,
            "availabilityZone" => FieldPath::AvailabilityZone,
            "totalCapacity" => FieldPath::TotalCapacity,
            "freeCapacity" => FieldPath::FreeCapacity,
            "extras.dataStorage.isSpaceEfficient" => {
                FieldPath::DataStorage(DataStorageField::IsSpaceEfficient)
            }
            "extras.dataStorage.provisioningPolicy" => {
                FieldPath::DataStorage(DataStorageField::ProvisioningPolicy)
            }
            "extras.dataStorage.recoveryTimeObjective" => {
                FieldPath::DataStorage(DataStorageField::RecoveryTimeObjective)
            }
            "extras.ioConnectivity.accessProtocol" => {
                FieldPath::IoConnectivity(IoConnectivityField::AccessProtocol)
            }
            "extras.ioConnectivity.maxIOPS" => FieldPath::IoConnectivity(IoConnectivityField::MaxIops),
            "extras.ioConnectivity.maxBWS" => FieldPath::IoConnectivity(IoConnectivityField::MaxBws),
            other => FieldPath::Advanced(
                other.strip_prefix(ADVANCED_PREFIX).unwrap_or(other).to_string(),
            ),
        }
    }

    /// Dotted key for this field
    pub fn key(&self) -> String {
        match self {
            FieldPath::Id => "id".into(),
            FieldPath::Name => "name".into(),
            FieldPath::DockId => "dockId".into(),
            FieldPath::StorageType => "storageType".into(),
            FieldPath::AvailabilityZone => "availabilityZone".into(),
            FieldPath::TotalCapacity => "totalCapacity".into(),
            FieldPath::FreeCapacity => "freeCapacity".into(),
            FieldPath::DataStorage(DataStorageField::IsSpaceEfficient) => {
                "extras.dataStorage.isSpaceEfficient".into()
            }
            FieldPath::DataStorage(DataStorageField::ProvisioningPolicy) => {
                "extras.dataStorage.provisioningPolicy".into()
            }
            FieldPath::DataStorage(DataStorageField::RecoveryTimeObjective) => {
                "extras.dataStorage.recoveryTimeObjective".into()
            }
            FieldPath::IoConnectivity(IoConnectivityField::AccessProtocol) => {
                "extras.ioConnectivity.accessProtocol".into()
            }
            FieldPath::IoConnectivity(IoConnectivityField::MaxIops) => {
                "extras.ioConnectivity.maxIOPS".into()
            }
            FieldPath::IoConnectivity(IoConnectivityField::MaxBws) => {
                "extras.ioConnectivity.maxBWS".into()
            }
            FieldPath::Advanced(k) => format!("{}{}", ADVANCED_PREFIX, k),
        }
    }

    fn is_advanced(&self) -> bool {
        matches!(self, FieldPath::Advanced(_))
    }

    /// Read this field from a pool. `None` only for a missing advanced key.
    pub fn resolve(&self, pool: &StoragePoolSpec) -> Option<FieldValue> {
        let ds = &pool.extras.data_storage;
        let io = &pool.extras.io_connectivity;
        let value = match self {
            FieldPath::Id => FieldValue::Text(pool.id.clone()),
            FieldPath::Name => FieldValue::Text(pool.name.clone()),
            FieldPath::DockId => FieldValue::Text(pool.dock_id.clone()),
            FieldPath::StorageType => FieldValue::Text(pool.storage_type.to_string()),
            FieldPath::AvailabilityZone => FieldValue::Text(pool.availability_zone.clone()),
            FieldPath::TotalCapacity => FieldValue::Number(pool.total_capacity as f64),
            FieldPath::FreeCapacity => FieldValue::Number(pool.free_capacity as f64),
            FieldPath::DataStorage(DataStorageField::IsSpaceEfficient) => {
                FieldValue::Bool(ds.is_space_efficient)
            }
            FieldPath::DataStorage(DataStorageField::ProvisioningPolicy) => FieldValue::Text(
                ds.provisioning_policy.map(|p| p.to_string()).unwrap_or_default(),
            ),
            FieldPath::DataStorage(DataStorageField::RecoveryTimeObjective) => {
                FieldValue::Number(ds.recovery_time_objective as f64)
            }
            FieldPath::IoConnectivity(IoConnectivityField::AccessProtocol) => {
                FieldValue::Text(io.access_protocol.clone())
            }
            FieldPath::IoConnectivity(IoConnectivityField::MaxIops) => {
                FieldValue::Number(io.max_iops as f64)
            }
            FieldPath::IoConnectivity(IoConnectivityField::MaxBws) => {
                FieldValue::Number(io.max_bws as f64)
            }
            FieldPath::Advanced(k) => {
                let raw = pool.extras.advanced.get(k)?;
                FieldValue::Text(match raw {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
            }
        };
        Some(value)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// A pool field value as seen by the predicate evaluator
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Bool(bool),
    Text(String),
}

// =============================================================================
// Operators and Operands
// =============================================================================

/// Comparison applied by a predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Ge,
    Le,
    Eq,
    Ne,
    /// Boolean identity
    Is,
    /// Regular expression match on text
    In,
    /// Equality against any of several values
    Or,
    StrEq,
    StrNe,
    StrLt,
    StrLe,
    StrGt,
    StrGe,
}

impl Operator {
    fn from_token(token: &str) -> Option<Self> {
        let op = match token {
            ">=" => Operator::Ge,
            "<=" => Operator::Le,
            "=" | "==" => Operator::Eq,
            "!=" => Operator::Ne,
            "<is>" => Operator::Is,
            "<in>" => Operator::In,
            "<or>" => Operator::Or,
            "s==" => Operator::StrEq,
            "s!=" => Operator::StrNe,
            "s<" => Operator::StrLt,
            "s<=" => Operator::StrLe,
            "s>" => Operator::StrGt,
            "s>=" => Operator::StrGe,
            _ => return None,
        };
        Some(op)
    }

    /// Token used in the string form of a predicate
    pub fn token(&self) -> &'static str {
        match self {
            Operator::Ge => ">=",
            Operator::Le => "<=",
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Is => "<is>",
            Operator::In => "<in>",
            Operator::Or => "<or>",
            Operator::StrEq => "s==",
            Operator::StrNe => "s!=",
            Operator::StrLt => "s<",
            Operator::StrLe => "s<=",
            Operator::StrGt => "s>",
            Operator::StrGe => "s>=",
        }
    }
}

/// Right-hand side of a predicate
#[derive(Debug, Clone)]
pub enum Operand {
    Number(f64),
    Bool(bool),
    Text(String),
    Pattern(Regex),
    Any(Vec<String>),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Number(n) => write!(f, "{}", n),
            Operand::Bool(b) => write!(f, "{}", b),
            Operand::Text(s) => write!(f, "{}", s),
            Operand::Pattern(re) => write!(f, "{}", re.as_str()),
            Operand::Any(values) => write!(f, "{}", values.join(" <or> ")),
        }
    }
}

// =============================================================================
// Predicate
// =============================================================================

/// One constraint on one pool field
#[derive(Debug, Clone)]
pub struct Predicate {
    pub field: FieldPath,
    pub op: Operator,
    pub operand: Operand,
}

impl Predicate {
    pub fn new(field: FieldPath, op: Operator, operand: Operand) -> Self {
        Self { field, op, operand }
    }

    pub fn ge(field: FieldPath, value: u64) -> Self {
        Self::new(field, Operator::Ge, Operand::Number(value as f64))
    }

    pub fn le(field: FieldPath, value: u64) -> Self {
        Self::new(field, Operator::Le, Operand::Number(value as f64))
    }

    pub fn eq_text(field: FieldPath, value: impl Into<String>) -> Self {
        Self::new(field, Operator::Eq, Operand::Text(value.into()))
    }

    pub fn is(field: FieldPath, value: bool) -> Self {
        Self::new(field, Operator::Is, Operand::Bool(value))
    }

    /// Parse an operator-prefixed predicate string such as `">= 10"`.
    /// Without a recognised operator prefix the whole string is an
    /// equality operand.
    pub fn parse(field: FieldPath, raw: &str) -> Result<Self> {
        let words: Vec<&str> = raw.split_whitespace().collect();
        let Some(first) = words.first() else {
            return Err(Error::predicate(field.key(), raw, "empty predicate"));
        };

        let Some(op) = Operator::from_token(first) else {
            return Ok(Self::new(field, Operator::Eq, Operand::Text(raw.trim().to_string())));
        };

        if op == Operator::Or {
            return Self::parse_or(field, raw, &words);
        }

        if words.len() != 2 {
            return Err(Error::predicate(
                field.key(),
                raw,
                format!("expected `{} <value>`", op.token()),
            ));
        }
        let value = words[1];

        let operand = match op {
            Operator::Ge | Operator::Le => Operand::Number(parse_number(&field, raw, value)?),
            Operator::Eq | Operator::Ne => match value.parse::<f64>() {
                Ok(n) => Operand::Number(n),
                Err(_) => Operand::Text(value.to_string()),
            },
            Operator::Is => Operand::Bool(parse_bool(&field, raw, value)?),
            Operator::In => Operand::Pattern(Regex::new(value).map_err(|e| {
                Error::predicate(field.key(), raw, format!("invalid pattern: {}", e))
            })?),
            _ => Operand::Text(value.to_string()),
        };

        Ok(Self::new(field, op, operand))
    }

    /// `<or> a <or> b ...`: operators and values must alternate
    fn parse_or(field: FieldPath, raw: &str, words: &[&str]) -> Result<Self> {
        if words.len() % 2 != 0 {
            return Err(Error::predicate(
                field.key(),
                raw,
                "<or> and value must appear in pairs",
            ));
        }
        let mut values = Vec::with_capacity(words.len() / 2);
        for pair in words.chunks(2) {
            if pair[0] != "<or>" {
                return Err(Error::predicate(
                    field.key(),
                    raw,
                    "the following operators must be <or>",
                ));
            }
            values.push(pair[1].to_string());
        }
        Ok(Self::new(field, Operator::Or, Operand::Any(values)))
    }

    /// Build from a custom profile property value
    pub fn from_json(field: FieldPath, value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::String(s) => Self::parse(field, s),
            serde_json::Value::Bool(b) => Ok(Self::new(field, Operator::Eq, Operand::Bool(*b))),
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(n) => Ok(Self::new(field, Operator::Eq, Operand::Number(n))),
                None => Err(Error::predicate(field.key(), n.to_string(), "number out of range")),
            },
            other => Err(Error::predicate(
                field.key(),
                other.to_string(),
                "must be a string, number or bool",
            )),
        }
    }

    /// Evaluate against a pool. A missing advanced attribute fails the pool.
    pub fn matches(&self, pool: &StoragePoolSpec) -> Result<bool> {
        match self.field.resolve(pool) {
            Some(value) => self.compare(&value),
            None => {
                debug!(pool = %pool.name, key = %self.field, "pool does not advertise capability");
                Ok(false)
            }
        }
    }

    fn compare(&self, value: &FieldValue) -> Result<bool> {
        match value {
            FieldValue::Number(a) => self.compare_number(*a),
            FieldValue::Bool(a) => self.compare_bool(*a),
            FieldValue::Text(a) => self.compare_text(a),
        }
    }

    fn compare_number(&self, a: f64) -> Result<bool> {
        match self.op {
            Operator::Ge => Ok(a > self.number()? || float_eq(a, self.number()?)),
            Operator::Le => Ok(a < self.number()? || float_eq(a, self.number()?)),
            Operator::Eq => Ok(float_eq(a, self.number()?)),
            Operator::Ne => Ok(!float_eq(a, self.number()?)),
            Operator::Or => {
                for v in self.any_values() {
                    if float_eq(a, parse_number(&self.field, &self.to_string(), v)?) {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            _ => Err(self.not_applicable("number")),
        }
    }

    fn compare_bool(&self, a: bool) -> Result<bool> {
        match self.op {
            Operator::Is | Operator::Eq => Ok(a == self.boolean()?),
            Operator::Ne => Ok(a != self.boolean()?),
            Operator::Or => {
                for v in self.any_values() {
                    if a == parse_bool(&self.field, &self.to_string(), v)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            _ => Err(self.not_applicable("bool")),
        }
    }

    fn compare_text(&self, a: &str) -> Result<bool> {
        let b = self.operand.to_string();
        match self.op {
            Operator::Eq | Operator::StrEq => Ok(a == b),
            Operator::Ne | Operator::StrNe => Ok(a != b),
            Operator::StrLt => Ok(a < b.as_str()),
            Operator::StrLe => Ok(a <= b.as_str()),
            Operator::StrGt => Ok(a > b.as_str()),
            Operator::StrGe => Ok(a >= b.as_str()),
            Operator::Or => Ok(self.any_values().iter().any(|v| v == a)),
            Operator::In => match &self.operand {
                Operand::Pattern(re) => Ok(re.is_match(a)),
                _ => Err(self.not_applicable("text")),
            },
            // Advanced attributes are stored as text; numeric and boolean
            // operators read them as numbers or bools when they parse.
            Operator::Ge | Operator::Le | Operator::Is if self.field.is_advanced() => {
                match self.op {
                    Operator::Is => match a.parse::<bool>() {
                        Ok(v) => self.compare_bool(v),
                        Err(_) => Ok(false),
                    },
                    _ => match a.parse::<f64>() {
                        Ok(v) => self.compare_number(v),
                        Err(_) => Ok(false),
                    },
                }
            }
            _ => Err(self.not_applicable("text")),
        }
    }

    fn number(&self) -> Result<f64> {
        match &self.operand {
            Operand::Number(n) => Ok(*n),
            Operand::Text(s) => parse_number(&self.field, s, s),
            _ => Err(self.not_applicable("number")),
        }
    }

    fn boolean(&self) -> Result<bool> {
        match &self.operand {
            Operand::Bool(b) => Ok(*b),
            Operand::Text(s) => parse_bool(&self.field, s, s),
            _ => Err(self.not_applicable("bool")),
        }
    }

    fn any_values(&self) -> &[String] {
        match &self.operand {
            Operand::Any(values) => values,
            _ => &[],
        }
    }

    fn not_applicable(&self, kind: &str) -> Error {
        Error::predicate(
            self.field.key(),
            self.to_string(),
            format!("operator {} can not be applied to a {} field", self.op.token(), kind),
        )
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.op {
            Operator::Or => write!(f, "<or> {}", self.operand),
            _ => write!(f, "{} {}", self.op.token(), self.operand),
        }
    }
}

fn float_eq(a: f64, b: f64) -> bool {
    (a - b) < EPSILON && (b - a) < EPSILON
}

fn parse_number(field: &FieldPath, raw: &str, value: &str) -> Result<f64> {
    value
        .parse::<f64>()
        .map_err(|_| Error::predicate(field.key(), raw, format!("{} is not a number", value)))
}

fn parse_bool(field: &FieldPath, raw: &str, value: &str) -> Result<bool> {
    value
        .parse::<bool>()
        .map_err(|_| Error::predicate(field.key(), raw, format!("{} is not a bool", value)))
}
