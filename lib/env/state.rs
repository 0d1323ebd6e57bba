//! Load flags and per-subsystem load state.

use crate::error::{MtbError, MtbResult};
use bitflags::bitflags;
use serde::Serialize;
use std::fmt;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

bitflags! {
    /// Subsystems requested from [`ModusToolboxEnvironment::load`](super::ModusToolboxEnvironment::load).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LoadFlags: u8 {
        const APP_INFO      = 0b00000001;
        const MANIFEST_DATA = 0b00000010;
        const PACKS         = 0b00000100;
        const TOOLS         = 0b00001000;
        const DEVICE_DB     = 0b00010000;
        /// Reload requested subsystems that are already loaded.
        const RELOAD        = 0b00100000;
        const ALL           = 0b00011111;
    }
}

/// One loadable subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Subsystem {
    Packs,
    AppInfo,
    Tools,
    ManifestData,
    DeviceDb,
}

/// Load state of one subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubsystemState {
    #[default]
    NotRequested,
    Requested,
    Loading,
    Loaded,
    Failed,
}

/// Load state of every subsystem.
///
/// States change only through [`transition`](Self::transition).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadState {
    states: [SubsystemState; 5],
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Subsystem {
    /// Every subsystem, packs first, then by load priority.
    pub const ALL: [Subsystem; 5] = [
        Subsystem::Packs,
        Subsystem::AppInfo,
        Subsystem::Tools,
        Subsystem::ManifestData,
        Subsystem::DeviceDb,
    ];

    /// Flag selecting this subsystem.
    pub fn flag(self) -> LoadFlags {
        match self {
            Self::Packs => LoadFlags::PACKS,
            Self::AppInfo => LoadFlags::APP_INFO,
            Self::Tools => LoadFlags::TOOLS,
            Self::ManifestData => LoadFlags::MANIFEST_DATA,
            Self::DeviceDb => LoadFlags::DEVICE_DB,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl SubsystemState {
    /// Whether moving from `self` to `to` is allowed.
    pub fn can_transition(self, to: Self) -> bool {
        use SubsystemState::*;
        matches!(
            (self, to),
            (NotRequested | Loaded | Failed, Requested)
                | (Requested, Loading | NotRequested)
                | (Loading, Loaded | Failed)
                | (Loaded | Failed, NotRequested)
        )
    }
}

impl LoadState {
    /// Create a state with nothing requested.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of a subsystem.
    pub fn get(&self, subsystem: Subsystem) -> SubsystemState {
        self.states[subsystem.index()]
    }

    /// Move a subsystem to a new state.
    pub fn transition(&mut self, subsystem: Subsystem, to: SubsystemState) -> MtbResult<()> {
        let from = self.get(subsystem);
        if !from.can_transition(to) {
            return Err(MtbError::InvalidState {
                subsystem: subsystem.to_string(),
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        tracing::trace!("{}: {} -> {}", subsystem, from, to);
        self.states[subsystem.index()] = to;
        Ok(())
    }

    /// Subsystems that are loaded.
    pub fn has(&self) -> LoadFlags {
        self.flags_in(SubsystemState::Loaded)
    }

    /// Subsystems requested but not yet started.
    pub fn wants(&self) -> LoadFlags {
        self.flags_in(SubsystemState::Requested)
    }

    /// Subsystems currently loading.
    pub fn loading(&self) -> LoadFlags {
        self.flags_in(SubsystemState::Loading)
    }

    pub fn is_loading(&self) -> bool {
        !self.loading().is_empty()
    }

    /// Discard every loaded subsystem after a failed load.
    ///
    /// Subsystems still loading end up `Failed`, everything else ends up
    /// `NotRequested` so that nothing reports as loaded.
    pub fn reset_after_failure(&mut self) -> MtbResult<()> {
        for subsystem in Subsystem::ALL {
            match self.get(subsystem) {
                SubsystemState::Loading => self.transition(subsystem, SubsystemState::Failed)?,
                SubsystemState::Requested | SubsystemState::Loaded => {
                    self.transition(subsystem, SubsystemState::NotRequested)?
                }
                SubsystemState::NotRequested | SubsystemState::Failed => {}
            }
        }
        Ok(())
    }

    fn flags_in(&self, state: SubsystemState) -> LoadFlags {
        Subsystem::ALL
            .iter()
            .filter(|s| self.get(**s) == state)
            .fold(LoadFlags::empty(), |acc, s| acc | s.flag())
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Packs => write!(f, "packs"),
            Self::AppInfo => write!(f, "appInfo"),
            Self::Tools => write!(f, "tools"),
            Self::ManifestData => write!(f, "manifestData"),
            Self::DeviceDb => write!(f, "deviceDB"),
        }
    }
}

impl fmt::Display for SubsystemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRequested => write!(f, "not-requested"),
            Self::Requested => write!(f, "requested"),
            Self::Loading => write!(f, "loading"),
            Self::Loaded => write!(f, "loaded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_transitions() {
        let mut state = LoadState::new();
        state.transition(Subsystem::Tools, SubsystemState::Requested).unwrap();
        assert_eq!(state.wants(), LoadFlags::TOOLS);

        state.transition(Subsystem::Tools, SubsystemState::Loading).unwrap();
        assert!(state.is_loading());

        state.transition(Subsystem::Tools, SubsystemState::Loaded).unwrap();
        assert_eq!(state.has(), LoadFlags::TOOLS);
        assert!(!state.is_loading());

        state.transition(Subsystem::Tools, SubsystemState::Requested).unwrap();
    }

    #[test]
    fn test_illegal_transitions() {
        let mut state = LoadState::new();
        let err = state
            .transition(Subsystem::Packs, SubsystemState::Loaded)
            .unwrap_err();
        assert!(matches!(err, MtbError::InvalidState { .. }));
        assert!(err.to_string().contains("not-requested -> loaded"));
        assert_eq!(state.get(Subsystem::Packs), SubsystemState::NotRequested);

        state.transition(Subsystem::Packs, SubsystemState::Requested).unwrap();
        assert!(state.transition(Subsystem::Packs, SubsystemState::Failed).is_err());
    }

    #[test]
    fn test_reset_after_failure() {
        let mut state = LoadState::new();
        for (subsystem, target) in [
            (Subsystem::Packs, SubsystemState::Loaded),
            (Subsystem::Tools, SubsystemState::Loading),
        ] {
            state.transition(subsystem, SubsystemState::Requested).unwrap();
            state.transition(subsystem, SubsystemState::Loading).unwrap();
            if target == SubsystemState::Loaded {
                state.transition(subsystem, SubsystemState::Loaded).unwrap();
            }
        }
        state.transition(Subsystem::DeviceDb, SubsystemState::Requested).unwrap();

        state.reset_after_failure().unwrap();
        assert!(state.has().is_empty());
        assert!(state.wants().is_empty());
        assert_eq!(state.get(Subsystem::Tools), SubsystemState::Failed);
        assert_eq!(state.get(Subsystem::Packs), SubsystemState::NotRequested);
    }
}
