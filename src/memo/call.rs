//! Call Module
//!
//! The arguments of one invocation plus its optional receiver, and the default
//! normalize and key strategies that operate on them.

use serde_json::Value;

static UNDEFINED: Value = Value::Null;

// == Call ==
/// Ordered arguments of a single invocation and the receiver it was made on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Call {
    receiver: Option<Value>,
    args: Vec<Value>,
}

impl Call {
    pub fn new(args: Vec<Value>) -> Self {
        Self {
            receiver: None,
            args,
        }
    }

    /// Attaches the receiver context the call is made on.
    pub fn with_receiver(mut self, receiver: Value) -> Self {
        self.receiver = Some(receiver);
        self
    }

    pub fn receiver(&self) -> Option<&Value> {
        self.receiver.as_ref()
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Returns the argument at `index`, or `Null` past the call's arity.
    pub fn arg(&self, index: usize) -> &Value {
        self.args.get(index).unwrap_or(&UNDEFINED)
    }

    /// Number of arguments actually passed.
    pub fn arity(&self) -> usize {
        self.args.len()
    }

    pub fn into_args(self) -> Vec<Value> {
        self.args
    }

    #[doc(hidden)]
    pub fn __from_json_array(value: Value) -> Self {
        match value {
            Value::Array(args) => Call::new(args),
            other => Call::new(vec![other]),
        }
    }

    // Same receiver, different arguments.
    pub(crate) fn with_args(&self, args: Vec<Value>) -> Self {
        Self {
            receiver: self.receiver.clone(),
            args,
        }
    }
}

impl From<Vec<Value>> for Call {
    fn from(args: Vec<Value>) -> Self {
        Call::new(args)
    }
}

impl<const N: usize> From<[Value; N]> for Call {
    fn from(args: [Value; N]) -> Self {
        Call::new(args.into())
    }
}

/// Builds a [`Call`] from any JSON-convertible expressions.
///
/// ```
/// use lru_cachify::call;
///
/// let call = call![1, "two", {"three": 3}];
/// assert_eq!(call.arity(), 3);
/// ```
#[macro_export]
macro_rules! call {
    ($($args:tt)*) => {
        $crate::memo::Call::__from_json_array($crate::serde_json::json!([$($args)*]))
    };
}

// == Default Strategies ==
/// Identity normalization: the call's arguments, in order, arity preserved.
pub fn identity_normalize(call: &Call) -> Value {
    Value::Array(call.args.clone())
}

/// Structural key: the compact JSON serialization of the key-relevant slice.
///
/// Order and position sensitive. The receiver does not participate. Integral
/// floats are written as integers, so `1.0` and `1` share a key.
pub fn json_key(call: &Call) -> String {
    // Display on a Value cannot fail, unlike serde_json::to_string on arbitrary types
    Value::Array(call.args.iter().map(integral_floats).collect()).to_string()
}

// Floats are only rewritten inside the exactly representable integer range.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

fn integral_floats(value: &Value) -> Value {
    match value {
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < MAX_EXACT_INTEGER => Value::from(f as i64),
            _ => value.clone(),
        },
        Value::Array(items) => Value::Array(items.iter().map(integral_floats).collect()),
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(name, field)| (name.clone(), integral_floats(field)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Names the JSON kind of a value for error messages.
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
