// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Disview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of disview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::VecDeque;
use std::path::Path;

use rstest::rstest;

use disview::config::ViewportConfig;
use disview::engine::{AnalysisEngine, EngineError, FixtureEngine};
use disview::model::{Address, FunctionRecord, RefDirection, RefEdge};
use disview::viewport::{parse_line_address, CursorPos, ViewportEngine, ViewportEvent};

const BASE: u64 = 0x1000;
const STRIDE: u64 = 0x10;
const SEPARATOR: &str = "──────────";

/// A flat image of `count` equally sized instructions inside one function.
///
/// `batch_limits` caps the size of successive batches so a scenario can script exactly what
/// each fetch returns. `separator_after` emits a rule line after that instruction index.
struct LinearEngine {
    count: usize,
    cursor: Address,
    batch_limits: VecDeque<usize>,
    separator_after: Option<usize>,
    fail_batches: bool,
    batches: usize,
}

impl LinearEngine {
    fn new(count: usize) -> Self {
        Self {
            count,
            cursor: Address::new(BASE),
            batch_limits: VecDeque::new(),
            separator_after: None,
            fail_batches: false,
            batches: 0,
        }
    }

    fn with_batch_limits(mut self, limits: &[usize]) -> Self {
        self.batch_limits = limits.iter().copied().collect();
        self
    }

    fn with_separator_after(mut self, index: usize) -> Self {
        self.separator_after = Some(index);
        self
    }

    fn index_of(&self, address: Address) -> Option<usize> {
        let offset = address.offset_from(Address::new(BASE))?;
        if offset % STRIDE != 0 {
            return None;
        }
        let index = (offset / STRIDE) as usize;
        (index < self.count).then_some(index)
    }

    fn line(index: usize) -> String {
        format!("0x{:x}: mov eax, {index}", BASE + index as u64 * STRIDE)
    }
}

impl AnalysisEngine for LinearEngine {
    fn disassemble_batch(&mut self, count: usize) -> Result<String, EngineError> {
        if self.fail_batches {
            return Err(EngineError::Failure("batch unavailable".to_owned()));
        }
        self.batches += 1;
        let Some(start) = self.index_of(self.cursor) else {
            return Ok(String::new());
        };
        let limit = self.batch_limits.pop_front().unwrap_or(count).min(count);
        let end = (start + limit).min(self.count);

        let mut out = String::new();
        for index in start..end {
            out.push_str(&Self::line(index));
            out.push('\n');
            if self.separator_after == Some(index) {
                out.push_str(SEPARATOR);
                out.push('\n');
            }
        }
        Ok(out)
    }

    fn reposition_cursor(&mut self, address: Address) -> Result<(), EngineError> {
        self.cursor = address;
        Ok(())
    }

    fn function_name_at(&mut self, address: Address) -> Result<String, EngineError> {
        Ok(match self.index_of(address) {
            Some(_) => "fcn.00001000".to_owned(),
            None => String::new(),
        })
    }

    fn function_at(&mut self, _address: Address) -> Result<Option<FunctionRecord>, EngineError> {
        Ok(None)
    }

    fn decompile(&mut self, _function_name: &str) -> Result<String, EngineError> {
        Ok(String::new())
    }

    fn cross_references(
        &mut self,
        _address: Address,
        _direction: RefDirection,
    ) -> Result<Vec<RefEdge>, EngineError> {
        Ok(Vec::new())
    }

    fn disassemble_single(&mut self, address: Address) -> Result<String, EngineError> {
        Ok(self.index_of(address).map(Self::line).unwrap_or_default())
    }

    fn jump_target(&mut self, _instruction_line: &str) -> Result<Option<Address>, EngineError> {
        Ok(None)
    }

    fn offset_info(&mut self, address: Address) -> Result<String, EngineError> {
        Ok(format!("section: .text\noffset: {address}"))
    }

    fn cyclomatic_complexity(&mut self, _address: Address) -> Result<u64, EngineError> {
        Ok(1)
    }

    fn basic_block_count(&mut self, _address: Address) -> Result<u64, EngineError> {
        Ok(1)
    }

    fn exit_block_count(&mut self, _address: Address) -> Result<u64, EngineError> {
        Ok(1)
    }

    fn simplified_graph(&mut self, _function_name: &str) -> Result<String, EngineError> {
        Ok(String::new())
    }

    fn entry_address(&self) -> Option<Address> {
        Some(Address::new(BASE))
    }
}

fn config(batch_size: usize, pass_cap: usize) -> ViewportConfig {
    ViewportConfig::default()
        .with_batch_size(batch_size)
        .expect("batch size")
        .with_pass_cap(pass_cap)
        .expect("pass cap")
}

#[test]
fn scrolling_near_end_appends_the_next_batch_without_its_duplicate_line() {
    // 17 lines cover 0x1000..=0x1100; the follow-up batch restarts at 0x1100 and brings 50 more.
    let engine = LinearEngine::new(67).with_batch_limits(&[17, 51]);
    let mut view = ViewportEngine::new(engine, config(200, 10));
    view.set_viewport_height(10);
    view.seek(Address::new(BASE));

    assert_eq!(view.viewport().line_count(), 17);
    assert_eq!(view.viewport().last_line_address(), Some(Address::new(0x1100)));

    view.scroll_to(5);

    let viewport = view.viewport();
    assert_eq!(viewport.line_count(), 67);
    assert_eq!(viewport.anchor(), Some(Address::new(BASE)));
    assert_eq!(viewport.scroll_top(), 5);
    assert_eq!(
        viewport
            .lines()
            .iter()
            .filter(|line| parse_line_address(line) == Some(Address::new(0x1100)))
            .count(),
        1
    );
    assert_eq!(viewport.last_line_address(), Some(Address::new(0x1420)));
}

#[test]
fn scrolling_far_from_end_does_not_fetch() {
    let mut view = ViewportEngine::new(LinearEngine::new(500), config(100, 10));
    view.set_viewport_height(10);
    view.seek(Address::new(BASE));
    let fetches = view.pagination().total_fetches();

    view.scroll_to(20);

    assert_eq!(view.viewport().scroll_top(), 20);
    assert_eq!(view.pagination().total_fetches(), fetches);
    assert_eq!(view.viewport().line_count(), 100);
}

#[test]
fn pagination_stops_at_end_of_image() {
    let mut view = ViewportEngine::new(LinearEngine::new(30), config(20, 10));
    view.set_viewport_height(10);
    view.seek(Address::new(BASE));
    assert_eq!(view.viewport().line_count(), 20);

    view.scroll_to(10);
    assert_eq!(view.viewport().line_count(), 30);

    let fetches = view.pagination().total_fetches();
    view.scroll_to(20);
    assert_eq!(view.viewport().line_count(), 30);
    assert_eq!(view.viewport().scroll_top(), 20);
    assert_eq!(view.pagination().total_fetches(), fetches + 1);
}

#[rstest]
#[case(1)]
#[case(3)]
#[case(7)]
fn pagination_fetches_are_bounded_by_pass_cap(#[case] pass_cap: usize) {
    // Two-line batches add one line per pass, so the viewport never stops being near its end.
    let mut view = ViewportEngine::new(LinearEngine::new(100_000), config(2, pass_cap));
    view.set_viewport_height(50);
    view.seek(Address::new(BASE));
    assert_eq!(view.viewport().line_count(), 2 + pass_cap);

    let before = view.pagination().total_fetches();
    view.set_viewport_height(49);
    assert_eq!(
        view.pagination().total_fetches() - before,
        pass_cap as u64
    );
    assert_eq!(view.viewport().line_count(), 2 + 2 * pass_cap);
}

#[rstest]
#[case(0x1000)]
#[case(0x1230)]
#[case(0x1ff0)]
fn refresh_anchors_first_line_at_seek_target(#[case] target: u64) {
    let mut view = ViewportEngine::new(LinearEngine::new(256), config(40, 3));
    view.set_viewport_height(10);
    view.seek(Address::new(target));

    let first = view.viewport().lines().first().expect("first line");
    assert_eq!(parse_line_address(first), Some(Address::new(target)));
    assert_eq!(view.viewport().anchor(), Some(Address::new(target)));
    assert_eq!(view.viewport().cursor(), CursorPos::TOP);
    assert_eq!(view.viewport().scroll_top(), 0);
}

#[test]
fn cursor_on_separator_line_leaves_focus_and_panels_untouched() {
    let engine = LinearEngine::new(40).with_separator_after(3);
    let mut view = ViewportEngine::new(engine, config(20, 10));
    view.set_viewport_height(10);
    view.seek(Address::new(BASE));
    assert_eq!(view.viewport().lines()[4], SEPARATOR);

    view.move_cursor_to(CursorPos::new(3, 0));
    let focus = view.focus_state().clone();
    let rev = view.panels().rev();
    let stats = view.stats();
    view.drain_events();

    view.move_cursor_to(CursorPos::new(4, 0));

    assert_eq!(view.viewport().cursor().line, 4);
    assert_eq!(view.focus_state(), &focus);
    assert_eq!(view.panels().rev(), rev);
    assert_eq!(view.stats().full_fan_outs, stats.full_fan_outs);
    assert_eq!(view.stats().light_fan_outs, stats.light_fan_outs);
    assert_eq!(view.stats().focus_passes, stats.focus_passes + 1);
    assert!(view.drain_events().is_empty());
}

#[test]
fn failed_refresh_reattaches_channels_and_reports_notice() {
    let mut view = ViewportEngine::new(LinearEngine::new(40), config(20, 10));
    view.set_viewport_height(10);
    view.setup();
    view.drain_events();
    view.engine_mut().fail_batches = true;

    view.refresh();

    let channels = view.channels();
    assert!(channels.is_idle());
    assert_eq!(channels.detach_count(), channels.reattach_count());
    let notices: Vec<_> = view
        .drain_events()
        .into_iter()
        .filter(|event| matches!(event, ViewportEvent::Notice(_)))
        .collect();
    assert_eq!(notices.len(), 1);

    view.engine_mut().fail_batches = false;
    view.refresh();
    assert!(view.channels().is_idle());
    assert_eq!(view.viewport().anchor(), Some(Address::new(BASE)));
}

#[test]
fn jump_preview_follows_call_into_loaded_program() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/tiny_program.json");
    let program = disview::store::load_program(&path).expect("load tiny program");
    let mut view = ViewportEngine::new(FixtureEngine::new(program), ViewportConfig::default());
    view.set_viewport_height(20);
    view.setup();

    let line = view
        .viewport()
        .find_address(Address::new(0x100c))
        .expect("call line");
    view.move_cursor_to(CursorPos::new(line, 0));

    let preview = view.panels().jump_preview().expect("jump preview");
    assert_eq!(preview.target, Address::new(0x2000));
    let highlight = preview.highlight.expect("highlighted target line");
    assert_eq!(
        parse_line_address(&preview.lines[highlight]),
        Some(Address::new(0x2000))
    );
    assert_eq!(view.focus_state().last_function(), "main");

    assert!(view.follow_jump());
    assert_eq!(view.viewport().anchor(), Some(Address::new(0x2000)));
    assert_eq!(view.focus_state().last_function(), "helper");
    assert!(view.seek_back());
    assert_eq!(view.viewport().anchor(), Some(Address::new(0x1000)));
}

#[rstest]
#[case("0x1000", "0x00001000")]
#[case("0X00401A2b", "0x00401a2b")]
#[case("deadbeef", "0xdeadbeef")]
#[case("0x123456789a", "0x123456789a")]
fn addresses_render_in_canonical_form(#[case] raw: &str, #[case] rendered: &str) {
    let address: Address = raw.parse().expect("address");
    assert_eq!(address.to_string(), rendered);
    assert_eq!(rendered.parse::<Address>().expect("reparse"), address);
    assert_eq!(parse_line_address(&format!("{rendered}  90  nop")), Some(address));
}
