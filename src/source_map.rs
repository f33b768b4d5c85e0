use sourcemap::{SourceMap, SourceMapBuilder};
use swc_core::common::SourceMapper;

use crate::codegen::Mapping;

/// A version 3 source map of one worklet, without `sourcesContent`.
pub struct WorkletSourceMap(SourceMap);

impl WorkletSourceMap {
  /**
   * Maps the printed worklet text back to positions in `source`.
   *
   * `mappings` are the positions recorded while printing, `mapper` resolves them to lines and
   * columns of the original file.
   */
  pub fn new(source: &str, mappings: &[Mapping], mapper: &dyn SourceMapper) -> WorkletSourceMap {
    let mut segments: Vec<(u32, u32, u32, u32)> = mappings
      .iter()
      .map(|mapping| {
        let loc = mapper.lookup_char_pos(mapping.original);
        (
          mapping.line,
          mapping.col,
          loc.line.saturating_sub(1) as u32,
          loc.col.0 as u32,
        )
      })
      .collect();

    segments.sort_by_key(|&(line, col, ..)| (line, col));
    segments.dedup_by_key(|&mut (line, col, ..)| (line, col));

    let mut builder = SourceMapBuilder::new(None);
    let source = builder.add_source(source);
    for (line, col, original_line, original_col) in segments {
      builder.add_raw(line, col, original_line, original_col, Some(source), None, false);
    }

    WorkletSourceMap(builder.into_sourcemap())
  }

  pub fn to_json(&self) -> String {
    let mut buf = vec![];
    match self.0.to_writer(&mut buf) {
      Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
      Err(_) => String::new(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use swc_core::common::{sync::Lrc, BytePos, FileName, SourceMap};

  #[test]
  fn maps_generated_columns_to_original_lines() {
    let cm: Lrc<SourceMap> = Default::default();
    let file = cm.new_source_file(
      Lrc::new(FileName::Custom("input.js".into())),
      "let a;\nfunction f() {}\n".into(),
    );
    let start = file.start_pos;

    let map = WorkletSourceMap::new(
      "/app/input.js",
      &[
        Mapping {
          original: start + BytePos(16),
          line: 0,
          col: 9,
        },
        Mapping {
          original: start + BytePos(7),
          line: 0,
          col: 0,
        },
        Mapping {
          original: start + BytePos(8),
          line: 0,
          col: 0,
        },
      ],
      &*cm,
    );

    assert_eq!(
      map.to_json(),
      r#"{"version":3,"sources":["/app/input.js"],"names":[],"mappings":"AACA,SAAS"}"#
    );
  }

  #[test]
  fn later_lines_are_separated_by_semicolons() {
    let cm: Lrc<SourceMap> = Default::default();
    let file = cm.new_source_file(
      Lrc::new(FileName::Custom("input.js".into())),
      "a;\nb;\n".into(),
    );

    let map = WorkletSourceMap::new(
      "input.js",
      &[Mapping {
        original: file.start_pos + BytePos(3),
        line: 1,
        col: 2,
      }],
      &*cm,
    );

    assert!(map.to_json().contains(r#""mappings":";EACA""#));
  }
}
