use std::fmt;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The state of a machine as reported by its provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MachineState {
    /// The machine does not exist yet.
    NotCreated,

    /// The machine exists and is powered off.
    PowerOff,

    /// The machine is running.
    Running,

    /// The machine is suspended.
    Saved,

    /// The machine stopped unexpectedly.
    Aborted,

    /// A provider specific state.
    Other(String),
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl MachineState {
    /// The state id as used in messages.
    pub fn id(&self) -> &str {
        match self {
            Self::NotCreated => "not_created",
            Self::PowerOff => "poweroff",
            Self::Running => "running",
            Self::Saved => "saved",
            Self::Aborted => "aborted",
            Self::Other(id) => id,
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl From<&str> for MachineState {
    fn from(id: &str) -> Self {
        match id {
            "not_created" => Self::NotCreated,
            "poweroff" => Self::PowerOff,
            "running" => Self::Running,
            "saved" => Self::Saved,
            "aborted" => Self::Aborted,
            other => Self::Other(other.to_string()),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
