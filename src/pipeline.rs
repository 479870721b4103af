//! Bounded-concurrency completion pipeline.
//!
//! A fixed-size worker pool drains the distinct-fragment-text queue. Each
//! distinct text is claimed by exactly one worker, so writes to the result
//! mapping never race on the same key. The final mapping is independent of
//! completion order; a single failed item aborts the whole stage with no
//! partial result.

use crate::exemplar::Exemplar;
use crate::oracle::{CompletionOracle, OracleError};
use crate::prompt;
use std::collections::{HashMap, HashSet};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;

pub const DEFAULT_CONCURRENCY: usize = 8;

/// Map every distinct fragment text to its oracle-generated replacement.
///
/// Dispatches up to `concurrency` requests in flight at any time. On the
/// first fatal oracle error the remaining workers stop claiming work and the
/// error is propagated; the mapping is all-or-nothing.
pub fn run(
    distinct: &HashSet<String>,
    exemplar: &Exemplar,
    oracle: &dyn CompletionOracle,
    concurrency: usize,
) -> Result<HashMap<String, String>, OracleError> {
    let items: Vec<&str> = distinct.iter().map(String::as_str).collect();
    let total = items.len();
    if total == 0 {
        return Ok(HashMap::new());
    }

    let next = AtomicUsize::new(0);
    let completed = AtomicUsize::new(0);
    let failed = AtomicBool::new(false);
    let results: Mutex<HashMap<String, String>> = Mutex::new(HashMap::with_capacity(total));
    let first_error: Mutex<Option<OracleError>> = Mutex::new(None);

    let workers = concurrency.clamp(1, total);
    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| loop {
                if failed.load(Ordering::SeqCst) {
                    break;
                }
                let index = next.fetch_add(1, Ordering::SeqCst);
                if index >= total {
                    break;
                }

                let text = items[index];
                let request = prompt::make_prompt(text, exemplar);
                match oracle.complete(&request) {
                    Ok(replacement) => {
                        results
                            .lock()
                            .expect("pipeline result mutex poisoned")
                            .insert(text.to_string(), replacement);
                        let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                        print_progress(done, total);
                    }
                    Err(error) => {
                        failed.store(true, Ordering::SeqCst);
                        let mut slot = first_error
                            .lock()
                            .expect("pipeline error mutex poisoned");
                        if slot.is_none() {
                            *slot = Some(error);
                        }
                        break;
                    }
                }
            });
        }
    });

    println!();

    if let Some(error) = first_error
        .into_inner()
        .expect("pipeline error mutex poisoned")
    {
        return Err(error);
    }

    Ok(results
        .into_inner()
        .expect("pipeline result mutex poisoned"))
}

fn print_progress(done: usize, total: usize) {
    print!("\r  {done}/{total} completions");
    let _ = io::stdout().flush();
}
