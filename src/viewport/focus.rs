// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Disview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of disview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use smol_str::SmolStr;

use crate::engine::{AnalysisEngine, EngineError};
use crate::model::Address;

use super::fanout::FocusChanged;
use super::parser::parse_line_address;

/// Last resolved focus. The function name starts empty and only changes when the owning
/// function of a newly resolved address differs from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusState {
    last_address: Option<Address>,
    last_function: SmolStr,
}

impl FocusState {
    pub fn last_address(&self) -> Option<Address> {
        self.last_address
    }

    pub fn last_function(&self) -> &str {
        &self.last_function
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusOutcome {
    /// The line has no address; nothing changed.
    Ignored,
    /// Same owning function as before: only per-address panels need work.
    SameFunction(FocusChanged),
    /// A different owning function: every panel needs work.
    FunctionChanged(FocusChanged),
}

impl FocusOutcome {
    pub fn event(&self) -> Option<&FocusChanged> {
        match self {
            Self::Ignored => None,
            Self::SameFunction(event) | Self::FunctionChanged(event) => Some(event),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FocusTracker {
    state: FocusState,
    force_full: bool,
}

impl FocusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FocusState {
        &self.state
    }

    /// Makes the next resolved focus a function change even if the function is the same,
    /// e.g. after the analysis under it changed.
    pub fn invalidate(&mut self) {
        self.force_full = true;
    }

    /// Resolves the line under the cursor. State is only updated once every engine query for
    /// this line succeeded.
    pub fn track<E>(
        &mut self,
        engine: &mut E,
        line: Option<&str>,
    ) -> Result<FocusOutcome, EngineError>
    where
        E: AnalysisEngine + ?Sized,
    {
        let Some(line) = line else {
            return Ok(FocusOutcome::Ignored);
        };
        let Some(address) = parse_line_address(line) else {
            return Ok(FocusOutcome::Ignored);
        };

        engine.reposition_cursor(address)?;
        let function = SmolStr::new(engine.function_name_at(address)?);

        self.state.last_address = Some(address);
        let event = FocusChanged {
            address,
            function: function.clone(),
            line: line.to_owned(),
        };

        if !self.force_full && self.state.last_function == function {
            return Ok(FocusOutcome::SameFunction(event));
        }

        log::debug!(
            "focus: function {:?} -> {:?} at {address}",
            self.state.last_function,
            function
        );
        self.state.last_function = function;
        self.force_full = false;
        Ok(FocusOutcome::FunctionChanged(event))
    }
}

#[cfg(test)]
mod tests {
    use super::{FocusOutcome, FocusTracker};
    use crate::engine::fixture::tests::tiny_program;
    use crate::engine::{AnalysisEngine, FixtureEngine};
    use crate::model::Address;

    fn line(engine: &mut FixtureEngine, address: u64) -> String {
        engine.disassemble_single(Address::new(address)).expect("line")
    }

    #[test]
    fn starts_with_empty_function() {
        let tracker = FocusTracker::new();
        assert_eq!(tracker.state().last_function(), "");
        assert_eq!(tracker.state().last_address(), None);
    }

    #[test]
    fn same_function_moves_are_deduplicated() {
        let mut engine = FixtureEngine::new(tiny_program());
        let mut tracker = FocusTracker::new();

        let first = line(&mut engine, 0x1000);
        let second = line(&mut engine, 0x1004);
        let outcome = tracker.track(&mut engine, Some(&first)).expect("track");
        assert!(matches!(outcome, FocusOutcome::FunctionChanged(_)));

        let outcome = tracker.track(&mut engine, Some(&second)).expect("track");
        let FocusOutcome::SameFunction(event) = outcome else {
            panic!("expected same-function outcome, got {outcome:?}");
        };
        assert_eq!(event.address, Address::new(0x1004));
        assert_eq!(tracker.state().last_address(), Some(Address::new(0x1004)));
    }

    #[test]
    fn crossing_into_another_function_is_a_change() {
        let mut engine = FixtureEngine::new(tiny_program());
        let mut tracker = FocusTracker::new();
        let main_line = line(&mut engine, 0x1000);
        let helper_line = line(&mut engine, 0x2000);

        tracker.track(&mut engine, Some(&main_line)).expect("track");
        let outcome = tracker.track(&mut engine, Some(&helper_line)).expect("track");
        assert!(matches!(outcome, FocusOutcome::FunctionChanged(ref e) if e.function == "helper"));
        assert_eq!(tracker.state().last_function(), "helper");
    }

    #[test]
    fn lines_without_address_leave_state_alone() {
        let mut engine = FixtureEngine::new(tiny_program());
        let mut tracker = FocusTracker::new();
        let main_line = line(&mut engine, 0x1000);
        tracker.track(&mut engine, Some(&main_line)).expect("track");
        let before = tracker.state().clone();

        for probe in [Some(";-- helper:"), Some(""), None] {
            let outcome = tracker.track(&mut engine, probe).expect("track");
            assert_eq!(outcome, FocusOutcome::Ignored);
        }
        assert_eq!(tracker.state(), &before);
    }

    #[test]
    fn invalidate_forces_one_full_change() {
        let mut engine = FixtureEngine::new(tiny_program());
        let mut tracker = FocusTracker::new();
        let main_line = line(&mut engine, 0x1000);
        tracker.track(&mut engine, Some(&main_line)).expect("track");

        tracker.invalidate();
        let outcome = tracker.track(&mut engine, Some(&main_line)).expect("track");
        assert!(matches!(outcome, FocusOutcome::FunctionChanged(_)));
        let outcome = tracker.track(&mut engine, Some(&main_line)).expect("track");
        assert!(matches!(outcome, FocusOutcome::SameFunction(_)));
    }
}
