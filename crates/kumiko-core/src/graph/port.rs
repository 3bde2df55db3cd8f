//! Inlets and outlets.
//!
//! An inlet declares a [`Polarity`] and what it accepts (messages, signals, or
//! both). An outlet produces either messages or a signal. A connection is valid
//! when the inlet accepts what the outlet produces.

/// Whether a message arriving at an inlet triggers output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Polarity {
    /// Arrival triggers output.
    #[default]
    Hot,
    /// Arrival only updates state.
    Cold,
}

/// What a port carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    /// Control messages only.
    Control,
    /// Audio-rate signal only.
    Signal,
    /// Either (inlets only).
    Both,
}

impl PortKind {
    /// Short name for listings.
    pub fn name(self) -> &'static str {
        match self {
            PortKind::Control => "control",
            PortKind::Signal => "signal",
            PortKind::Both => "both",
        }
    }
}

/// An input port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inlet {
    kind: PortKind,
    polarity: Polarity,
    description: String,
}

impl Inlet {
    /// A hot message inlet.
    pub fn control(description: impl Into<String>) -> Self {
        Self::new(PortKind::Control, description)
    }

    /// A signal inlet.
    pub fn signal(description: impl Into<String>) -> Self {
        Self::new(PortKind::Signal, description)
    }

    /// An inlet taking a signal or messages.
    pub fn both(description: impl Into<String>) -> Self {
        Self::new(PortKind::Both, description)
    }

    fn new(kind: PortKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            polarity: Polarity::Hot,
            description: description.into(),
        }
    }

    /// Marks the inlet cold.
    #[must_use]
    pub fn cold(mut self) -> Self {
        self.polarity = Polarity::Cold;
        self
    }

    /// What the inlet accepts.
    pub fn kind(&self) -> PortKind {
        self.kind
    }

    /// Hot or cold.
    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// True for hot inlets.
    pub fn is_hot(&self) -> bool {
        self.polarity == Polarity::Hot
    }

    /// Human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// True if control messages may arrive here.
    pub fn accepts_control(&self) -> bool {
        matches!(self.kind, PortKind::Control | PortKind::Both)
    }

    /// True if a signal connection may end here.
    pub fn accepts_signal(&self) -> bool {
        matches!(self.kind, PortKind::Signal | PortKind::Both)
    }

    /// True if this inlet accepts what `outlet` produces.
    pub fn accepts(&self, outlet: &Outlet) -> bool {
        if outlet.is_signal() {
            self.accepts_signal()
        } else {
            self.accepts_control()
        }
    }
}

/// An output port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outlet {
    signal: bool,
    description: String,
}

impl Outlet {
    /// A message outlet.
    pub fn control(description: impl Into<String>) -> Self {
        Self {
            signal: false,
            description: description.into(),
        }
    }

    /// A signal outlet.
    pub fn signal(description: impl Into<String>) -> Self {
        Self {
            signal: true,
            description: description.into(),
        }
    }

    /// True for signal outlets.
    pub fn is_signal(&self) -> bool {
        self.signal
    }

    /// What the outlet produces.
    pub fn kind(&self) -> PortKind {
        if self.signal {
            PortKind::Signal
        } else {
            PortKind::Control
        }
    }

    /// Human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }
}
