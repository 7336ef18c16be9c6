//! Output format selection and report printing.

use std::fmt;
use std::io::Write;

use anyhow::Result;
use chrono::Utc;

use crate::k8s::report::{self, VulnerabilityReport, VulnerabilityReportList};
use crate::output::table;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// kubectl-style table (default)
    Table,
    /// Table with extra columns
    Wide,
    Json,
    Yaml,
    /// `<resource>.<group>/<name>` per line
    Name,
}

impl OutputFormat {
    const ALLOWED: &'static str = "json,name,table,wide,yaml";
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "" | "table" => Ok(OutputFormat::Table),
            "wide" => Ok(OutputFormat::Wide),
            "json" => Ok(OutputFormat::Json),
            "yaml" => Ok(OutputFormat::Yaml),
            "name" => Ok(OutputFormat::Name),
            _ => Err(format!(
                "unable to match a printer suitable for the output format \"{}\", allowed formats are: {}",
                s,
                OutputFormat::ALLOWED
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Wide => write!(f, "wide"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Yaml => write!(f, "yaml"),
            OutputFormat::Name => write!(f, "name"),
        }
    }
}

/// Prints vulnerability reports in a chosen format.
#[derive(Debug, Clone)]
pub struct Printer {
    format: OutputFormat,
    color: bool,
}

impl Printer {
    /// Create a printer for `format`. An empty format selects the table.
    pub fn new(format: &str) -> Result<Self, String> {
        Ok(Self {
            format: format.parse()?,
            color: false,
        })
    }

    /// Enable colored severity counts in table output.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Print `reports` found in `namespace` to `out`.
    ///
    /// Notices that are not objects, such as the empty-table message, go to
    /// `status` so piped output stays clean.
    pub fn print<W: Write, S: Write>(
        &self,
        reports: &[VulnerabilityReport],
        namespace: &str,
        out: &mut W,
        status: &mut S,
    ) -> Result<()> {
        match self.format {
            OutputFormat::Table | OutputFormat::Wide => {
                let wide = self.format == OutputFormat::Wide;
                match table::render(reports, wide, self.color, Utc::now()) {
                    Some(rendered) => writeln!(out, "{}", rendered.trim_end_matches('\n'))?,
                    None => {
                        writeln!(status, "No resources found in {} namespace.", namespace)?;
                        status.flush()?;
                    }
                }
            }
            OutputFormat::Json => {
                let list = VulnerabilityReportList::new(reports);
                serde_json::to_writer_pretty(&mut *out, &list)?;
                writeln!(out)?;
            }
            OutputFormat::Yaml => {
                let list = VulnerabilityReportList::new(reports);
                out.write_all(serde_yaml::to_string(&list)?.as_bytes())?;
            }
            OutputFormat::Name => {
                for r in reports {
                    writeln!(
                        out,
                        "{}.{}/{}",
                        report::KIND.to_lowercase(),
                        report::GROUP,
                        r.name()
                    )?;
                }
            }
        }

        out.flush()?;
        Ok(())
    }
}
