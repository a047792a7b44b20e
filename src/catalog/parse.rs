use crate::catalog::{FilterFlags, FilterSpec, Pads};
use crate::graph::MediaType;
use anyhow::{Context, anyhow, bail};
use regex::Regex;
use std::fs;

/// Parse the table printed by `ffmpeg -filters` into filter specs.
///
/// Expected rows (after the legend):
/// flags  name  inputs->outputs  description...
///
/// Example:
///  TSC crop              V->V       Crop the input video.
///  ... split             V->N       Pass on the input to N video outputs.
///  ... nullsink          V->|       Do absolutely nothing with the input video.
pub fn parse_filters_text(text: &str) -> anyhow::Result<Vec<FilterSpec>> {
    // 1) flags: three columns, `.` when unset
    // 2) name
    // 3) input pads, 4) output pads: V/A per pad, N dynamic, | none
    // 5) description: rest of line
    const ROW_RE: &str = r"^\s*([T.][S.][C.])\s+(\S+)\s+([AVN|]+)->([AVN|]+)\s*(.*?)\s*$";
    let re = Regex::new(ROW_RE)?;

    let mut out = Vec::new();
    let mut in_table = false;
    for (lineno, line) in text.lines().enumerate() {
        let lno = lineno + 1;
        if line.trim().is_empty() {
            continue;
        }

        let caps = match re.captures(line) {
            Some(c) => c,
            // Legend and banner lines precede the table.
            None if !in_table => continue,
            None => bail!("filter list parse error at line {}: cannot parse {:?}", lno, line),
        };
        in_table = true;

        let field = |i: usize, what: &str| {
            caps.get(i)
                .map(|m| m.as_str())
                .ok_or_else(|| anyhow!("filter list parse error at line {}: missing {}", lno, what))
        };

        let flags = field(1, "flags")?;
        let name = field(2, "name")?;
        let inputs = parse_pads(field(3, "inputs")?)
            .with_context(|| format!("bad input pads for {} at line {}", name, lno))?;
        let outputs = parse_pads(field(4, "outputs")?)
            .with_context(|| format!("bad output pads for {} at line {}", name, lno))?;

        out.push(FilterSpec {
            name: name.to_string(),
            description: field(5, "description")?.to_string(),
            inputs,
            outputs,
            flags: FilterFlags {
                timeline: flags.starts_with('T'),
                slice_threads: flags.as_bytes().get(1) == Some(&b'S'),
                command: flags.ends_with('C'),
            },
        });
    }

    if out.is_empty() {
        bail!("filter list contained no filters");
    }
    Ok(out)
}

pub fn parse_filters_file(path: &str) -> anyhow::Result<Vec<FilterSpec>> {
    let text = fs::read_to_string(path).with_context(|| format!("read filter list {}", path))?;
    parse_filters_text(&text).with_context(|| format!("parse filter list {}", path))
}

/// Parse "VV", "N" or "|" into pads.
fn parse_pads(s: &str) -> anyhow::Result<Pads> {
    match s {
        "|" => return Ok(Pads::None),
        "N" => return Ok(Pads::Dynamic),
        _ => {}
    }
    let mut pads = Vec::with_capacity(s.len());
    for c in s.chars() {
        pads.push(match c {
            'V' => MediaType::Video,
            'A' => MediaType::Audio,
            other => bail!("unexpected pad marker {:?} in {:?}", other, s),
        });
    }
    Ok(Pads::Fixed(pads))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "\
Filters:
  T.. = Timeline support
  .S. = Slice threading
  ..C = Command support
  A = Audio input/output
  V = Video input/output
  N = Dynamic number and/or type of input/output
  | = Source or sink filter
 ... abench            A->A       Benchmark part of a filtergraph.
 TSC crop              V->V       Crop the input video.
 ... split             V->N       Pass on the input to N video outputs.
 T.C overlay           VV->V      Overlay a video source on top of the input.
 ... nullsink          V->|       Do absolutely nothing with the input video.
 ... color             |->V       Provide an uniformly colored input.
";

    #[test]
    fn parses_rows_after_legend() {
        let specs = parse_filters_text(SAMPLE).unwrap();
        let names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["abench", "crop", "split", "overlay", "nullsink", "color"]);

        let overlay = &specs[3];
        assert_eq!(
            overlay.inputs,
            Pads::Fixed(vec![MediaType::Video, MediaType::Video])
        );
        assert!(overlay.flags.timeline && overlay.flags.command && !overlay.flags.slice_threads);
        assert_eq!(specs[2].outputs, Pads::Dynamic);
        assert_eq!(specs[4].outputs, Pads::None);
        assert_eq!(specs[5].inputs, Pads::None);
        assert_eq!(specs[1].description, "Crop the input video.");
    }

    #[test]
    fn garbage_inside_table_is_an_error() {
        let text = format!("{}this is not a row\n", SAMPLE);
        let err = parse_filters_text(&text).unwrap_err();
        assert!(err.to_string().contains("line 15"));
    }

    #[test]
    fn empty_listing_is_an_error() {
        assert!(parse_filters_text("Filters:\n").is_err());
    }
}
