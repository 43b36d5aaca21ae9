use crate::statistics::{Statistics, Summary};

/// A supported statistics operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Mean,
    Median,
    Mode,
    All,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Mean,
        Operation::Median,
        Operation::Mode,
        Operation::All,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Mean => "mean",
            Operation::Median => "median",
            Operation::Mode => "mode",
            Operation::All => "all",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of running one operation over a list of numbers.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Mean(f64),
    Median(f64),
    Mode(Vec<f64>),
    All(Summary),
}

impl Outcome {
    pub fn operation(&self) -> Operation {
        match self {
            Outcome::Mean(_) => Operation::Mean,
            Outcome::Median(_) => Operation::Median,
            Outcome::Mode(_) => Operation::Mode,
            Outcome::All(_) => Operation::All,
        }
    }
}

pub fn evaluate(op: Operation, values: &[f64]) -> Outcome {
    match op {
        Operation::Mean => Outcome::Mean(Statistics::mean(values)),
        Operation::Median => Outcome::Median(Statistics::median(values)),
        Operation::Mode => Outcome::Mode(Statistics::mode(values)),
        Operation::All => Outcome::All(Statistics::summary(values)),
    }
}
