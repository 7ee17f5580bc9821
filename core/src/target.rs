use std::fmt;

/// Which half of a request a validator or actor is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Labels,
    Data,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Labels => f.write_str("labels"),
            Target::Data => f.write_str("data"),
        }
    }
}

/// The request halves a leaf can be configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accepts {
    pub labels: bool,
    pub data: bool,
}

impl Accepts {
    pub const ANY: Accepts = Accepts {
        labels: true,
        data: true,
    };
    pub const DATA: Accepts = Accepts {
        labels: false,
        data: true,
    };

    pub fn allows(&self, target: Target) -> bool {
        match target {
            Target::Labels => self.labels,
            Target::Data => self.data,
        }
    }

    /// What both `self` and `other` accept.
    pub fn and(self, other: Accepts) -> Accepts {
        Accepts {
            labels: self.labels && other.labels,
            data: self.data && other.data,
        }
    }
}
