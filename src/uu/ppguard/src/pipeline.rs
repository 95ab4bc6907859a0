// This file is part of the ppguard package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

//! The filter pipeline for one input/output pair: read lines, optionally
//! select a line range, run the configured stages, write lines.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};

use log::info;
use rand::rngs::SmallRng;
use regex::Regex;

use crate::error::{LineResult, PpguardError};
use crate::mid::MidStage;
use crate::post::PostStage;
use crate::pre::PreStage;
use crate::settings::{Settings, NULL_SINK};

/// Emit only the lines whose zero-based index lies strictly inside one of
/// the configured `(upper, lower)` pairs.
pub struct RangeSelect<I> {
    input: I,
    ranges: Vec<(i64, i64)>,
    index: i64,
}

impl<I> RangeSelect<I> {
    pub fn new(input: I, ranges: Vec<(i64, i64)>) -> Self {
        Self {
            input,
            ranges,
            index: 0,
        }
    }
}

impl<I: Iterator<Item = LineResult>> Iterator for RangeSelect<I> {
    type Item = LineResult;

    fn next(&mut self) -> Option<LineResult> {
        loop {
            let item = self.input.next()?;
            if item.is_err() {
                return Some(item);
            }
            let index = self.index;
            self.index += 1;
            if self
                .ranges
                .iter()
                .any(|&(upper, lower)| lower < index && index < upper)
            {
                return Some(item);
            }
        }
    }
}

fn open_input(path: &str) -> io::Result<Box<dyn BufRead + Send>> {
    if path == "-" {
        Ok(Box::new(BufReader::new(io::stdin())))
    } else {
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }
}

fn open_output(path: &str) -> io::Result<Box<dyn Write + Send>> {
    match path {
        "-" => Ok(Box::new(io::stdout())),
        NULL_SINK => Ok(Box::new(io::sink())),
        _ => Ok(Box::new(File::create(path)?)),
    }
}

/// Run the configured stage composition for one pair.
pub fn filter(
    input: &str,
    output: &str,
    settings: &Settings,
    rgx: &Regex,
    rng: SmallRng,
) -> Result<(), PpguardError> {
    info!("start filtering: {input} -> {output}");
    let reader = open_input(input)?;
    let mut writer = open_output(output)?;
    let mut stream: Box<dyn Iterator<Item = LineResult>> =
        Box::new(ppcore::lines::lines(reader).map(|r| r.map_err(PpguardError::from)));
    if let Some(ranges) = &settings.ranges {
        stream = Box::new(RangeSelect::new(stream, ranges.clone()));
    }
    if settings.stages.pre {
        stream = Box::new(PreStage::new(stream, rgx.clone(), rng));
    }
    if settings.stages.mid {
        stream = Box::new(MidStage::new(
            stream,
            settings.command.clone(),
            settings.queue_size,
            settings.poll,
            settings.timeout,
        ));
    }
    if settings.stages.post {
        stream = Box::new(PostStage::new(stream));
    }
    for item in stream {
        writer.write_all(item?.as_bytes())?;
    }
    writer.flush()?;
    info!("end filtering: {input} -> {output}");
    Ok(())
}
