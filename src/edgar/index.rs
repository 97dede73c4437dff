//! Company filing index and filing lookup

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fmt;

/// SEC Central Index Key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cik(u64);

impl Cik {
    const WIDTH: usize = 10;

    /// Parse a caller-supplied identifier, with or without leading zeros.
    /// A single leading `+` is accepted.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
        let invalid = || Error::InvalidIdentifier {
            cik: input.to_string(),
        };

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let value: u64 = digits.parse().map_err(|_| invalid())?;
        if value >= 10u64.pow(Self::WIDTH as u32) {
            return Err(invalid());
        }

        Ok(Self(value))
    }

    /// Zero-padded form used by the submissions endpoint
    pub fn padded(&self) -> String {
        format!("{:0width$}", self.0, width = Self::WIDTH)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Numeric form used in archive paths
impl fmt::Display for Cik {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Immutable lookup request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingQuery {
    pub cik: Cik,
    pub year: i32,
    pub form_type: String,
}

impl FilingQuery {
    pub fn new(company_id: &str, year: i32, form_type: impl Into<String>) -> Result<Self> {
        Ok(Self {
            cik: Cik::parse(company_id)?,
            year,
            form_type: form_type.into(),
        })
    }
}

/// Submissions document, reduced to the parts the lookup needs
#[derive(Debug, Deserialize)]
struct Submissions {
    filings: Filings,
}

#[derive(Debug, Deserialize)]
struct Filings {
    recent: FilingIndex,
}

/// Recent filings of one company as parallel sequences.
///
/// Position `i` across all four sequences describes one filing. EDGAR lists
/// newest filings first; nothing here relies on or checks that order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilingIndex {
    #[serde(rename = "accessionNumber", default)]
    pub accession_numbers: Vec<String>,
    #[serde(rename = "form", default)]
    pub forms: Vec<String>,
    #[serde(rename = "filingDate", default)]
    pub filing_dates: Vec<String>,
    #[serde(rename = "primaryDocument", default)]
    pub primary_documents: Vec<String>,
}

/// First index entry satisfying a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingMatch {
    pub position: usize,
    pub accession_number: String,
    pub form: String,
    pub filing_date: String,
    pub primary_document: String,
}

impl FilingMatch {
    pub fn accession_without_dashes(&self) -> String {
        self.accession_number.replace('-', "")
    }
}

impl FilingIndex {
    /// Parse a submissions JSON body and validate the index layout
    pub fn from_submissions_json(body: &[u8]) -> Result<Self> {
        let submissions: Submissions = serde_json::from_slice(body)?;
        let index = submissions.filings.recent;
        index.validate()?;
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.accession_numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accession_numbers.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        let lengths = [
            self.accession_numbers.len(),
            self.forms.len(),
            self.filing_dates.len(),
            self.primary_documents.len(),
        ];
        if lengths.iter().any(|&len| len != lengths[0]) {
            return Err(Error::MalformedIndex {
                reason: format!(
                    "sequence lengths differ (accessionNumber={}, form={}, filingDate={}, primaryDocument={})",
                    lengths[0], lengths[1], lengths[2], lengths[3]
                ),
            });
        }
        Ok(())
    }

    /// Earliest position whose form equals the query's form type and whose
    /// filing date starts with the query's year
    pub fn find(&self, query: &FilingQuery) -> Option<FilingMatch> {
        let year = query.year.to_string();

        (0..self.len())
            .find(|&i| {
                self.forms.get(i).is_some_and(|f| *f == query.form_type)
                    && self
                        .filing_dates
                        .get(i)
                        .is_some_and(|d| d.starts_with(&year))
            })
            .and_then(|i| {
                Some(FilingMatch {
                    position: i,
                    accession_number: self.accession_numbers.get(i)?.clone(),
                    form: self.forms.get(i)?.clone(),
                    filing_date: self.filing_dates.get(i)?.clone(),
                    primary_document: self.primary_documents.get(i)?.clone(),
                })
            })
    }
}

/// `{base}/CIK{padded}.json`
pub fn submissions_url(base: &str, cik: Cik) -> Result<String> {
    join_url(base, &[&format!("CIK{}.json", cik.padded())])
}

/// `{base}/{numeric cik}/{accession without dashes}/{document}`
///
/// The primary document may sit in a subfolder of the filing
/// (`xslF345X05/form4.xml`); each folder becomes its own path segment.
pub fn document_url(base: &str, cik: Cik, filing: &FilingMatch) -> Result<String> {
    let document: Vec<&str> = filing
        .primary_document
        .split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .collect();
    if document.is_empty() {
        return Err(Error::MalformedIndex {
            reason: format!(
                "filing {} has no primary document",
                filing.accession_number
            ),
        });
    }

    let cik = cik.to_string();
    let accession = filing.accession_without_dashes();
    let mut segments = vec![cik.as_str(), accession.as_str()];
    segments.extend(document);
    join_url(base, &segments)
}

fn join_url(base: &str, segments: &[&str]) -> Result<String> {
    let mut url = url::Url::parse(base).map_err(|e| Error::InvalidUrl {
        reason: format!("{}: {}", base, e),
    })?;

    url.path_segments_mut()
        .map_err(|_| Error::InvalidUrl {
            reason: format!("{} cannot be a base URL", base),
        })?
        .pop_if_empty()
        .extend(segments);

    Ok(url.to_string())
}
