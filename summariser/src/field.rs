use crate::error::AnalysisError;
use log::trace;
use std::io::BufRead as _;
use std::path::Path;

/// Header keyword that precedes the value list and must not open the data block
const INTERNAL_FIELD: &str = "internalField";
const BLOCK_OPEN: char = '(';
const BLOCK_CLOSE: char = ')';
const TERMINATOR: char = ';';

/// The values read from one field file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedField {
    /// One value per cell, in file order
    pub values: Vec<f64>,
    /// Lines inside the data block that did not hold a finite number
    pub skipped_lines: usize,
}

impl ParsedField {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Read the value list of a field file from the given reader.
///
/// The list starts after the first line containing `(` and ends at the next line containing `)`.
/// Each line in between holds one number, optionally followed by `;`. Anything else in the block
/// is skipped and counted.
pub fn parse_field<R: std::io::Read>(reader: R) -> std::io::Result<ParsedField> {
    let mut parsed = ParsedField::default();
    let mut in_data = false;

    for line in std::io::BufReader::new(reader).lines() {
        let line = line?;

        if !in_data {
            if line.contains(INTERNAL_FIELD) {
                continue;
            }
            if line.contains(BLOCK_OPEN) {
                in_data = true;
            }
            continue;
        }

        if line.contains(BLOCK_CLOSE) {
            break;
        }

        match parse_value(&line) {
            Some(value) => parsed.values.push(value),
            None => {
                trace!("Skipping unreadable data line: {line:?}");
                parsed.skipped_lines += 1;
            }
        }
    }

    Ok(parsed)
}

/// Read the value list of the field file at `path`
pub fn parse_field_file(path: &Path) -> Result<ParsedField, AnalysisError> {
    let file = std::fs::File::open(path).map_err(AnalysisError::io(path))?;
    parse_field(file).map_err(AnalysisError::io(path))
}

fn parse_value(line: &str) -> Option<f64> {
    let token = line.trim();
    let token = token.trim_end_matches(TERMINATOR).trim_end();

    token.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELD_FILE: &str = r#"/*--------------------------------*- C++ -*----------------------------------*\
  =========                 |
  \\      /  F ield         | OpenFOAM: The Open Source CFD Toolbox
\*---------------------------------------------------------------------------*/
FoamFile
{
    version     2.0;
    format      ascii;
    class       volScalarField;
    location    "0.0001";
    object      cem;
}
// * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * //

dimensions      [0 0 -1 0 0 0 0];

internalField   nonuniform List<scalar>
4
(
-120.5
3.25e+02
0
-1e-08
)
;
"#;

    #[test]
    fn reads_values_between_markers() -> anyhow::Result<()> {
        let parsed = parse_field(FIELD_FILE.as_bytes())?;
        assert_eq!(parsed.values, vec![-120.5, 325.0, 0.0, -1e-8]);
        assert_eq!(parsed.skipped_lines, 0);
        Ok(())
    }

    #[test]
    fn skips_malformed_lines_in_order() -> anyhow::Result<()> {
        let parsed = parse_field("(\n1.5;\nabc\n-3.2;\n)\n".as_bytes())?;
        assert_eq!(parsed.values, vec![1.5, -3.2]);
        assert_eq!(parsed.skipped_lines, 1);
        Ok(())
    }

    #[test]
    fn repeated_terminators_are_stripped() -> anyhow::Result<()> {
        let parsed = parse_field("(\n1.5;;\n-2 ;;\n;\n)\n".as_bytes())?;
        assert_eq!(parsed.values, vec![1.5, -2.0]);
        assert_eq!(parsed.skipped_lines, 1);
        Ok(())
    }

    #[test]
    fn blank_lines_and_non_finite_values_are_skipped() -> anyhow::Result<()> {
        let parsed = parse_field("(\n\n2\nnan\ninf;\n  4 ;\n)\n".as_bytes())?;
        assert_eq!(parsed.values, vec![2.0, 4.0]);
        assert_eq!(parsed.skipped_lines, 3);
        Ok(())
    }

    #[test]
    fn adjacent_markers_give_empty_sample() -> anyhow::Result<()> {
        let parsed = parse_field("internalField nonuniform List<scalar> 0\n(\n)\n;\n".as_bytes())?;
        assert!(parsed.is_empty());
        assert_eq!(parsed.skipped_lines, 0);
        Ok(())
    }

    #[test]
    fn uniform_field_has_no_block() -> anyhow::Result<()> {
        let parsed = parse_field("dimensions [0 0 -1 0 0 0 0];\ninternalField uniform 0;\n".as_bytes())?;
        assert!(parsed.is_empty());
        Ok(())
    }

    #[test]
    fn header_line_with_parenthesis_does_not_open_block() -> anyhow::Result<()> {
        let parsed = parse_field("internalField nonuniform List<scalar> (\n2\n(\n7;\n)\n".as_bytes())?;
        assert_eq!(parsed.values, vec![7.0]);
        Ok(())
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = parse_field_file(Path::new("/definitely/not/here/cem"));
        assert!(matches!(result, Err(AnalysisError::Io { .. })));
    }
}
