use std::fmt;

/// Payload of a finished scenario or task.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Val {
    #[default]
    None,
    Int(i64),
    String(String),
}

impl fmt::Display for Val {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Val::None => write!(f, "-"),
            Val::Int(i) => write!(f, "{}", i),
            Val::String(s) => write!(f, "{}", s),
        }
    }
}
