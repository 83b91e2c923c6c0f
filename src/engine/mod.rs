// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Disview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of disview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The analysis engine seam.
//!
//! The viewport core never decodes instructions itself; it asks an [`AnalysisEngine`] for text,
//! symbols, references and metrics. The engine carries its own "current address" cursor, so any
//! query that depends on a specific location must be preceded by
//! [`AnalysisEngine::reposition_cursor`] and call order within a refresh pass matters.

pub mod demo;
pub mod fixture;

use thiserror::Error;

use crate::model::{Address, FunctionRecord, RefDirection, RefEdge};

pub use demo::demo_program;
pub use fixture::{FixtureEngine, Function, Instruction, Program, Section};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("analysis engine failure: {0}")]
    Failure(String),
    #[error("address {0} is outside the loaded program")]
    OutOfRange(Address),
}

/// Synchronous query interface to the binary analysis backend.
///
/// Empty strings and empty lists are "engine misses" and are normal; an `Err` means the engine
/// itself failed and is reported to the user once.
pub trait AnalysisEngine {
    /// Up to `count` instruction lines starting at the current cursor.
    fn disassemble_batch(&mut self, count: usize) -> Result<String, EngineError>;

    fn reposition_cursor(&mut self, address: Address) -> Result<(), EngineError>;

    /// Owning function label, or an empty string when the address is not inside a function.
    fn function_name_at(&mut self, address: Address) -> Result<String, EngineError>;

    /// Structured info when `address` is a known function entry.
    fn function_at(&mut self, address: Address) -> Result<Option<FunctionRecord>, EngineError>;

    fn decompile(&mut self, function_name: &str) -> Result<String, EngineError>;

    fn cross_references(
        &mut self,
        address: Address,
        direction: RefDirection,
    ) -> Result<Vec<RefEdge>, EngineError>;

    /// One rendered line for the instruction at `address`.
    fn disassemble_single(&mut self, address: Address) -> Result<String, EngineError>;

    /// Control-transfer target of a rendered instruction line, if it has one.
    fn jump_target(&mut self, instruction_line: &str) -> Result<Option<Address>, EngineError>;

    /// `label: value` lines describing the location (section, permissions, symbol).
    fn offset_info(&mut self, address: Address) -> Result<String, EngineError>;

    /// `mnemonic: description` for the instruction at `address`; empty when unknown.
    fn opcode_description(&mut self, _address: Address) -> Result<String, EngineError> {
        Ok(String::new())
    }

    fn cyclomatic_complexity(&mut self, address: Address) -> Result<u64, EngineError>;

    fn basic_block_count(&mut self, address: Address) -> Result<u64, EngineError>;

    fn exit_block_count(&mut self, address: Address) -> Result<u64, EngineError>;

    fn simplified_graph(&mut self, function_name: &str) -> Result<String, EngineError>;

    fn entry_address(&self) -> Option<Address> {
        None
    }

    /// Every known function, for name lookup.
    fn functions(&self) -> Vec<FunctionRecord> {
        Vec::new()
    }
}

impl<E: AnalysisEngine + ?Sized> AnalysisEngine for Box<E> {
    fn disassemble_batch(&mut self, count: usize) -> Result<String, EngineError> {
        (**self).disassemble_batch(count)
    }

    fn reposition_cursor(&mut self, address: Address) -> Result<(), EngineError> {
        (**self).reposition_cursor(address)
    }

    fn function_name_at(&mut self, address: Address) -> Result<String, EngineError> {
        (**self).function_name_at(address)
    }

    fn function_at(&mut self, address: Address) -> Result<Option<FunctionRecord>, EngineError> {
        (**self).function_at(address)
    }

    fn decompile(&mut self, function_name: &str) -> Result<String, EngineError> {
        (**self).decompile(function_name)
    }

    fn cross_references(
        &mut self,
        address: Address,
        direction: RefDirection,
    ) -> Result<Vec<RefEdge>, EngineError> {
        (**self).cross_references(address, direction)
    }

    fn disassemble_single(&mut self, address: Address) -> Result<String, EngineError> {
        (**self).disassemble_single(address)
    }

    fn jump_target(&mut self, instruction_line: &str) -> Result<Option<Address>, EngineError> {
        (**self).jump_target(instruction_line)
    }

    fn offset_info(&mut self, address: Address) -> Result<String, EngineError> {
        (**self).offset_info(address)
    }

    fn opcode_description(&mut self, address: Address) -> Result<String, EngineError> {
        (**self).opcode_description(address)
    }

    fn cyclomatic_complexity(&mut self, address: Address) -> Result<u64, EngineError> {
        (**self).cyclomatic_complexity(address)
    }

    fn basic_block_count(&mut self, address: Address) -> Result<u64, EngineError> {
        (**self).basic_block_count(address)
    }

    fn exit_block_count(&mut self, address: Address) -> Result<u64, EngineError> {
        (**self).exit_block_count(address)
    }

    fn simplified_graph(&mut self, function_name: &str) -> Result<String, EngineError> {
        (**self).simplified_graph(function_name)
    }

    fn entry_address(&self) -> Option<Address> {
        (**self).entry_address()
    }

    fn functions(&self) -> Vec<FunctionRecord> {
        (**self).functions()
    }
}
