//! Consistency checks for the chemistry inputs of a pyJac-coupled case.
//!
//! Each check reads one input and reports what it found. Nothing is shared between checks, so
//! they can be run in any order and on any subset of the inputs.

use anyhow::Context;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};

/// Headers pyJac generates for a mechanism
pub const PYJAC_HEADERS: [&str; 4] = ["chem_utils.h", "dydt.h", "jacob.h", "mechanism.h"];

/// Number of species names echoed back in listings
const LISTING_LIMIT: usize = 10;
/// Number of offending species echoed back in warnings
const WARNING_LIMIT: usize = 5;

/// The OpenFOAM dictionary header, which looks like a species block but is not one
const FOAM_FILE_HEADER: &str = "FoamFile";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReactionFinding {
    pub path: PathBuf,
    pub exists: bool,
    /// Declared by `elements <n>`
    pub elements: Option<usize>,
    /// Declared by `species <n>`
    pub species: Option<usize>,
    /// Names listed in `species <n> ( ... );`
    pub species_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThermoFinding {
    pub path: PathBuf,
    pub exists: bool,
    pub species: Vec<String>,
    pub missing_transport: Vec<String>,
    pub missing_elements: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PyjacFinding {
    pub dir: PathBuf,
    pub exists: bool,
    /// Each expected header and whether it was found
    pub headers: Vec<(String, bool)>,
    /// `#define NSP <n>` from `mechanism.h`
    pub nsp: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MechanismReport {
    pub reactions: ReactionFinding,
    pub thermo: ThermoFinding,
    pub pyjac: Option<PyjacFinding>,
}

impl MechanismReport {
    /// Disagreements between the species counts of the inputs that were found
    pub fn mismatches(&self) -> Vec<String> {
        let mut mismatches = Vec::new();
        let Some(declared) = self.reactions.species else {
            return mismatches;
        };

        if let Some(nsp) = self.pyjac.as_ref().and_then(|p| p.nsp) {
            if nsp != declared {
                mismatches.push(format!(
                    "Reaction file declares {declared} species but pyJac was generated for {nsp}"
                ));
            }
        }
        if self.thermo.exists && self.thermo.species.len() != declared {
            mismatches.push(format!(
                "Reaction file declares {declared} species but the thermo file defines {}",
                self.thermo.species.len()
            ));
        }

        mismatches
    }
}

/// Run every check for a case
pub fn diagnose(
    reactions: &Path,
    thermo: &Path,
    pyjac_dir: Option<&Path>,
) -> anyhow::Result<MechanismReport> {
    Ok(MechanismReport {
        reactions: check_reaction_file(reactions).context("Reaction file check")?,
        thermo: check_thermo_file(thermo).context("Thermo file check")?,
        pyjac: pyjac_dir
            .map(check_pyjac_headers)
            .transpose()
            .context("pyJac header check")?,
    })
}

/// Read the element and species declarations of a reaction mechanism file
pub fn check_reaction_file(path: &Path) -> anyhow::Result<ReactionFinding> {
    let mut finding = ReactionFinding {
        path: path.to_path_buf(),
        exists: path.exists(),
        elements: None,
        species: None,
        species_names: Vec::new(),
    };
    if !finding.exists {
        return Ok(finding);
    }

    let content = std::fs::read_to_string(path)?;

    finding.elements = first_count(&Regex::new(r"elements\s+(\d+)")?, &content);
    finding.species = first_count(&Regex::new(r"species\s+(\d+)")?, &content);

    if finding.species.is_some() {
        let list = Regex::new(r"(?s)species\s+\d+\s*\((.*?)\);")?;
        let word = Regex::new(r"\w+")?;
        if let Some(captures) = list.captures(&content) {
            finding.species_names = word
                .find_iter(&captures[1])
                .map(|m| m.as_str().to_string())
                .collect();
        }
    }

    Ok(finding)
}

/// List the species blocks of a thermophysical properties file and flag incomplete ones
pub fn check_thermo_file(path: &Path) -> anyhow::Result<ThermoFinding> {
    let mut finding = ThermoFinding {
        path: path.to_path_buf(),
        exists: path.exists(),
        species: Vec::new(),
        missing_transport: Vec::new(),
        missing_elements: Vec::new(),
    };
    if !finding.exists {
        return Ok(finding);
    }

    let content = std::fs::read_to_string(path)?;
    let header = Regex::new(r"(?m)^([A-Z][A-Za-z0-9()]*)\s*\{")?;
    let block_end = Regex::new(r"(?m)^\}")?;

    for captures in header.captures_iter(&content) {
        let name = &captures[1];
        if name == FOAM_FILE_HEADER {
            continue;
        }

        // A block without a closing brace runs to the end of the file
        let start = captures.get(0).map(|m| m.end()).unwrap_or(content.len());
        let end = block_end
            .find_at(&content, start)
            .map(|m| m.start())
            .unwrap_or(content.len());
        let block = &content[start..end];

        if !block.contains("transport") {
            finding.missing_transport.push(name.to_string());
        }
        if !block.contains("elements") {
            finding.missing_elements.push(name.to_string());
        }
        finding.species.push(name.to_string());
    }

    Ok(finding)
}

/// Check that the pyJac headers are present and read the species count they were built for
pub fn check_pyjac_headers(dir: &Path) -> anyhow::Result<PyjacFinding> {
    let mut finding = PyjacFinding {
        dir: dir.to_path_buf(),
        exists: dir.is_dir(),
        headers: Vec::new(),
        nsp: None,
    };
    if !finding.exists {
        return Ok(finding);
    }

    for header in PYJAC_HEADERS {
        let header_path = dir.join(header);
        let present = header_path.is_file();
        if present && header == "mechanism.h" {
            let content = std::fs::read_to_string(&header_path)?;
            finding.nsp = first_count(&Regex::new(r"#define\s+NSP\s+(\d+)")?, &content);
        }
        finding.headers.push((header.to_string(), present));
    }

    Ok(finding)
}

fn first_count(pattern: &Regex, content: &str) -> Option<usize> {
    pattern
        .captures(content)
        .and_then(|c| c[1].parse::<usize>().ok())
}

/// Write the findings to `path` as pretty JSON, replacing any earlier file
pub fn write_diagnostics_file(report: &MechanismReport, path: &Path) -> anyhow::Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(&mut file, report)?;
    file.write_all(b"\n")?;
    Ok(())
}

/// Load findings written by [write_diagnostics_file]
pub fn load_diagnostics_file(path: &Path) -> anyhow::Result<MechanismReport> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let report = serde_json::from_reader(std::io::BufReader::new(file))?;
    Ok(report)
}

/// Render the findings together with remediation advice
pub fn render_diagnostics(report: &MechanismReport) -> Result<String, std::fmt::Error> {
    let rule = "=".repeat(60);
    let mut out = String::new();

    writeln!(out, "{rule}")?;
    writeln!(out, "pyJac / OpenFOAM integration diagnostics")?;
    writeln!(out, "{rule}")?;

    let reactions = &report.reactions;
    writeln!(out, "\nReaction file: {}", reactions.path.display())?;
    if !reactions.exists {
        writeln!(out, "  [missing] file does not exist")?;
    } else {
        match reactions.elements {
            Some(n) => writeln!(out, "  [ok] elements: {n}")?,
            None => writeln!(out, "  [missing] no element declaration found")?,
        }
        match reactions.species {
            Some(n) => {
                writeln!(out, "  [ok] species: {n}")?;
                if !reactions.species_names.is_empty() {
                    writeln!(
                        out,
                        "  [ok] first species: {}",
                        head(&reactions.species_names, LISTING_LIMIT)
                    )?;
                }
            }
            None => writeln!(out, "  [missing] no species declaration found")?,
        }
    }

    let thermo = &report.thermo;
    writeln!(out, "\nThermophysical properties file: {}", thermo.path.display())?;
    if !thermo.exists {
        writeln!(out, "  [missing] file does not exist")?;
    } else {
        writeln!(out, "  [ok] species defined: {}", thermo.species.len())?;
        writeln!(out, "  [ok] first species: {}", head(&thermo.species, LISTING_LIMIT))?;
        flag_species(&mut out, &thermo.missing_transport, "transport properties")?;
        flag_species(&mut out, &thermo.missing_elements, "element definitions")?;
    }

    match &report.pyjac {
        Some(pyjac) => {
            writeln!(out, "\npyJac headers: {}", pyjac.dir.display())?;
            if !pyjac.exists {
                writeln!(out, "  [missing] include directory does not exist")?;
            }
            for (header, present) in &pyjac.headers {
                let status = if *present { "ok" } else { "missing" };
                writeln!(out, "  [{status}] {header}")?;
            }
            if let Some(nsp) = pyjac.nsp {
                writeln!(out, "    pyJac NSP (species): {nsp}")?;
            }
        }
        None => writeln!(out, "\npyJac headers: not checked, no include directory given")?,
    }

    let mismatches = report.mismatches();
    if !mismatches.is_empty() {
        writeln!(out)?;
        for mismatch in &mismatches {
            writeln!(out, "  [mismatch] {mismatch}")?;
        }
    }

    writeln!(out, "\n{rule}")?;
    writeln!(out, "Suggestions")?;
    writeln!(out, "{rule}")?;
    write!(out, "{ADVICE}")?;

    Ok(out)
}

fn flag_species(out: &mut String, species: &[String], what: &str) -> std::fmt::Result {
    if species.is_empty() {
        writeln!(out, "  [ok] all species have {what}")
    } else {
        writeln!(
            out,
            "  [warn] {} species lack {what}: {}",
            species.len(),
            head(species, WARNING_LIMIT)
        )
    }
}

fn head(names: &[String], limit: usize) -> String {
    names.iter().take(limit).cloned().collect::<Vec<_>>().join(", ")
}

const ADVICE: &str = "
1. Keep the pyJac mechanism consistent with the OpenFOAM configuration:
   - the species counts must match
   - the element counts must match

2. On Dimix errors:
   - switch the transport model to 'const' or 'polynomial'
   - make sure every species has complete transport properties

3. Regenerate the pyJac sources from the case's mechanism directory (./runCmake.sh)

4. Check the environment:
   echo $FOAM_USER_LIBBIN
   ls -la $FOAM_USER_LIBBIN/libcemaPyjacChemistryModel*
";

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const REACTIONS: &str = r#"elements 4 ( O H N Ar );

species 5
(
    H2
    O2
    H2O
    OH
    N2
);

reactions
{
}
"#;

    const THERMO: &str = r#"FoamFile
{
    version     2.0;
}

H2
{
    specie { molWeight 2.01594; }
    elements { H 2; }
    transport { As 6.36e-07; }
}

O2 {
    specie { molWeight 31.9988; }
    elements { O 2; }
}

OH
{
    specie { molWeight 17.0074; }
    transport { As 1.67e-06; }
}
"#;

    #[test]
    fn reads_reaction_declarations() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("reactions");
        fs::write(&path, REACTIONS)?;

        let finding = check_reaction_file(&path)?;
        assert!(finding.exists);
        assert_eq!(finding.elements, Some(4));
        assert_eq!(finding.species, Some(5));
        assert_eq!(finding.species_names, vec!["H2", "O2", "H2O", "OH", "N2"]);
        Ok(())
    }

    #[test]
    fn missing_inputs_are_reported_not_errors() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let report = diagnose(
            &dir.path().join("reactions"),
            &dir.path().join("thermo"),
            Some(&dir.path().join("pyjacInclude")),
        )?;

        assert!(!report.reactions.exists);
        assert!(!report.thermo.exists);
        assert_eq!(report.pyjac.as_ref().map(|p| p.exists), Some(false));
        assert!(report.mismatches().is_empty());
        assert!(render_diagnostics(&report)?.contains("file does not exist"));
        Ok(())
    }

    #[test]
    fn flags_incomplete_thermo_blocks() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("thermo");
        fs::write(&path, THERMO)?;

        let finding = check_thermo_file(&path)?;
        assert_eq!(finding.species, vec!["H2", "O2", "OH"]);
        assert_eq!(finding.missing_transport, vec!["O2"]);
        assert_eq!(finding.missing_elements, vec!["OH"]);
        Ok(())
    }

    #[test]
    fn reads_pyjac_species_count() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("mechanism.h"), "#ifndef MECHANISM_h\n#define NSP 53\n#define FWD_RATES 325\n")?;
        fs::write(dir.path().join("dydt.h"), "")?;

        let finding = check_pyjac_headers(dir.path())?;
        assert_eq!(finding.nsp, Some(53));
        assert_eq!(
            finding.headers,
            vec![
                ("chem_utils.h".to_string(), false),
                ("dydt.h".to_string(), true),
                ("jacob.h".to_string(), false),
                ("mechanism.h".to_string(), true),
            ]
        );
        Ok(())
    }

    #[test]
    fn species_count_mismatches() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let reactions = dir.path().join("reactions");
        let thermo = dir.path().join("thermo");
        let pyjac = dir.path().join("pyjacInclude");
        fs::write(&reactions, REACTIONS)?;
        fs::write(&thermo, THERMO)?;
        fs::create_dir(&pyjac)?;
        fs::write(pyjac.join("mechanism.h"), "#define NSP 53\n")?;

        let report = diagnose(&reactions, &thermo, Some(&pyjac))?;
        let mismatches = report.mismatches();
        assert_eq!(mismatches.len(), 2);
        assert!(mismatches[0].contains("generated for 53"));
        assert!(mismatches[1].contains("thermo file defines 3"));

        let text = render_diagnostics(&report)?;
        assert!(text.contains("[warn] 1 species lack transport properties: O2"));
        assert!(text.contains("pyJac NSP (species): 53"));
        Ok(())
    }

    #[test]
    fn findings_survive_a_json_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let reactions = dir.path().join("reactions");
        let thermo = dir.path().join("thermo");
        fs::write(&reactions, REACTIONS)?;
        fs::write(&thermo, THERMO)?;
        let report = diagnose(&reactions, &thermo, Some(&dir.path().join("pyjacInclude")))?;

        let path = dir.path().join("diagnostics.json");
        write_diagnostics_file(&report, &path)?;
        let loaded = load_diagnostics_file(&path)?;

        pretty_assertions::assert_eq!(report, loaded);
        assert_eq!(loaded.thermo.missing_elements, vec!["OH"]);
        Ok(())
    }
}
