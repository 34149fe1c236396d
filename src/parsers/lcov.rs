/// Parser for the LCOV `.info` format.
///
/// Reference: https://ltp.sourceforge.net/coverage/lcov/geninfo.1.php
///
/// Key records:
///   TN:<test name>
///   SF:<absolute path to source file>
///   FN:<line>,<function name>
///   FNDA:<execution count>,<function name>
///   FNF:<number of functions found>
///   FNH:<number of functions hit>
///   DA:<line number>,<execution count>[,<checksum>]
///   BRDA:<line>,<block>,<branch>,<taken>   ("-" means 0)
///   BRF:<branches found>
///   BRH:<branches hit>
///   LF:<lines found>
///   LH:<lines hit>
///   end_of_record
use std::collections::HashMap;
use std::io::BufRead;

use super::Parser;
use crate::error::{CommenterError, Result};
use crate::model::*;

/// LCOV format parser.
pub struct LcovParser;

impl Parser for LcovParser {
    fn parse(&self, input: &[u8]) -> Result<CoverageReport> {
        parse(input)
    }
}

/// Parse LCOV format coverage data from raw bytes.
pub fn parse(input: &[u8]) -> Result<CoverageReport> {
    let mut report = CoverageReport::new();
    parse_streaming_reader(&mut &*input, &mut |record| {
        report.records.push(record);
        Ok(())
    })?;
    Ok(report)
}

/// Summary counters as declared by the report. When a counter is missing it
/// is derived from the detail lines instead.
#[derive(Default)]
struct Declared {
    lines_found: Option<u64>,
    lines_hit: Option<u64>,
    branches_found: Option<u64>,
    branches_hit: Option<u64>,
    functions_found: Option<u64>,
    functions_hit: Option<u64>,
}

/// Record being accumulated between `SF:` and `end_of_record`.
struct Pending {
    record: CoverageRecord,
    declared: Declared,
    // name -> start line, from FN records
    fn_defs: HashMap<String, Option<u32>>,
}

impl Pending {
    fn new(path: &str) -> Self {
        Self {
            record: CoverageRecord::new(path.to_string()),
            declared: Declared::default(),
            fn_defs: HashMap::new(),
        }
    }

    fn finish(self) -> Result<CoverageRecord> {
        let Pending {
            mut record,
            declared,
            fn_defs,
        } = self;

        let derived_lines = Counts::new(
            record.line_details.iter().filter(|l| l.hit_count > 0).count() as u64,
            record.line_details.len() as u64,
        );
        let derived_branches = Counts::new(
            record.branch_details.iter().filter(|b| b.taken > 0).count() as u64,
            record.branch_details.len() as u64,
        );
        let derived_functions = Counts::new(
            record
                .function_details
                .iter()
                .filter(|f| f.hit_count > 0)
                .count() as u64,
            fn_defs.len().max(record.function_details.len()) as u64,
        );

        record.lines = Counts::new(
            declared.lines_hit.unwrap_or(derived_lines.hit),
            declared.lines_found.unwrap_or(derived_lines.found),
        );
        record.branches = Counts::new(
            declared.branches_hit.unwrap_or(derived_branches.hit),
            declared.branches_found.unwrap_or(derived_branches.found),
        );
        record.functions = Counts::new(
            declared.functions_hit.unwrap_or(derived_functions.hit),
            declared.functions_found.unwrap_or(derived_functions.found),
        );

        for (category, counts) in [
            ("lines", record.lines),
            ("branches", record.branches),
            ("functions", record.functions),
        ] {
            if counts.hit > counts.found {
                return Err(CommenterError::Parse {
                    path: record.path.clone(),
                    message: format!(
                        "{} {} hit but only {} found",
                        counts.hit, category, counts.found
                    ),
                });
            }
        }

        Ok(record)
    }
}

fn parse_count(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

/// Streaming LCOV parser. Calls `emit` once per `end_of_record`.
/// Reads line-by-line from a buffered reader so the full input need
/// not be in memory at once.
fn parse_streaming_reader(
    reader: &mut dyn BufRead,
    emit: &mut dyn FnMut(CoverageRecord) -> Result<()>,
) -> Result<()> {
    let mut current: Option<Pending> = None;

    let mut raw_line = String::new();
    let mut line_number = 0usize;
    loop {
        raw_line.clear();
        let n = reader
            .read_line(&mut raw_line)
            .map_err(|e| CommenterError::Parse {
                path: "<lcov>".to_string(),
                message: format!("line {}: {}", line_number + 1, e),
            })?;
        if n == 0 {
            break; // EOF
        }
        line_number += 1;

        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if line == "end_of_record" {
            if let Some(pending) = current.take() {
                emit(pending.finish()?)?;
            }
            continue;
        }

        let (tag, value) = match line.split_once(':') {
            Some(pair) => pair,
            None => continue,
        };

        if tag == "SF" {
            // A new SF without end_of_record closes the previous file.
            if let Some(pending) = current.take() {
                emit(pending.finish()?)?;
            }
            current = Some(Pending::new(value));
            continue;
        }

        let Some(pending) = current.as_mut() else {
            continue; // TN and anything outside a record
        };

        match tag {
            "FN" => {
                // FN:<line>,<function_name>
                if let Some((line_str, name)) = value.split_once(',') {
                    let start_line = line_str.parse::<u32>().ok();
                    pending.fn_defs.insert(name.to_string(), start_line);
                }
            }
            "FNDA" => {
                // FNDA:<execution_count>,<function_name>
                if let Some((count_str, name)) = value.split_once(',') {
                    let hit_count = count_str.parse::<u64>().unwrap_or(0);
                    let start_line = pending.fn_defs.get(name).copied().flatten();
                    pending.record.function_details.push(FunctionDetail {
                        name: name.to_string(),
                        start_line,
                        hit_count,
                    });
                }
            }
            "DA" => {
                // DA:<line_number>,<execution_count>[,<checksum>]
                // Negative counts mark non-instrumentable lines.
                let parts: Vec<&str> = value.splitn(3, ',').collect();
                if parts.len() >= 2 {
                    if let Ok(line_number) = parts[0].parse::<u32>() {
                        if let Ok(count) = parts[1].parse::<i64>() {
                            if count >= 0 {
                                pending.record.line_details.push(LineDetail {
                                    line_number,
                                    hit_count: count as u64,
                                });
                            }
                        }
                    }
                }
            }
            "BRDA" => {
                // BRDA:<line>,<block>,<branch>,<taken>
                let parts: Vec<&str> = value.splitn(4, ',').collect();
                if parts.len() == 4 {
                    if let Ok(line_number) = parts[0].parse::<u32>() {
                        let taken = if parts[3] == "-" {
                            0
                        } else {
                            parts[3].parse::<u64>().unwrap_or(0)
                        };
                        pending.record.branch_details.push(BranchDetail {
                            line_number,
                            block: parts[1].parse().unwrap_or(0),
                            branch: parts[2].parse().unwrap_or(0),
                            taken,
                        });
                    }
                }
            }
            "LF" => pending.declared.lines_found = parse_count(value),
            "LH" => pending.declared.lines_hit = parse_count(value),
            "BRF" => pending.declared.branches_found = parse_count(value),
            "BRH" => pending.declared.branches_hit = parse_count(value),
            "FNF" => pending.declared.functions_found = parse_count(value),
            "FNH" => pending.declared.functions_hit = parse_count(value),
            _ => {}
        }
    }

    // Handle case where file ends without end_of_record
    if let Some(pending) = current.take() {
        emit(pending.finish()?)?;
    }

    Ok(())
}
