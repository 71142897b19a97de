// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use crate::moves::Move;

/// Limits under which a search runs: a wall-clock budget, a depth cap,
/// and an optional externally owned stop flag. The search polls the
/// budget and the flag every 1024 nodes; either one tripping aborts the
/// current iteration and the best move from the last completed iteration
/// is returned.
#[derive(Clone)]
pub struct SearchConfig {
    pub search_time: Duration,
    pub max_depth: i32,
    pub stop_signal: Option<Arc<AtomicBool>>,
}

impl Default for SearchConfig {
    fn default() -> SearchConfig {
        SearchConfig {
            search_time: Duration::from_millis(1000),
            max_depth: 64,
            stop_signal: None,
        }
    }
}

/// A progress report emitted after each completed iteration of the
/// iterative-deepening loop.
#[derive(Clone, Debug, Default)]
pub struct SearchInfo {
    pub depth: i32,
    pub score: i32,
    pub nodes: u64,
    pub time_ms: u64,
    pub pv: Vec<Move>,
}

pub type InfoCallback = Box<dyn FnMut(&SearchInfo) + Send>;
